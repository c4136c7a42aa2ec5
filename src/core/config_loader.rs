//! Configuration file loader for doc-publisher
//!
//! This module provides configuration loading, merging, validation and
//! resolution into [`PublisherSettings`].

use super::config::*;
use crate::core::error::PublishError;
use crate::security::credentials::{SftpCredentials, StorageCredentials};
use regex::Regex;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use tokio::fs;

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".doc-publisher.yaml";

/// Environment variable pattern (${VAR_NAME})
static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is a valid regex")
});

/// Configuration load options
#[derive(Debug, Clone, Default)]
pub struct ConfigLoadOptions {
    /// Project path to load config from
    pub project_path: PathBuf,

    /// Explicit config file, replaces the project config lookup
    pub config_file: Option<PathBuf>,

    /// Skip ~/.doc-publisher.yaml
    pub skip_global: bool,

    /// Environment variables
    pub env: HashMap<String, String>,
}

/// Configuration validation result
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationResult {
    pub valid: bool,
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationWarning>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Field path (e.g., "storage.bucket")
    pub field: String,
    pub message: String,
}

/// Configuration validation warning
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. Environment variables
    /// 2. Project config (./.doc-publisher.yaml, or the explicit file)
    /// 3. Global config (~/.doc-publisher.yaml)
    /// 4. Default values
    pub async fn load(options: ConfigLoadOptions) -> Result<PublisherConfig, PublishError> {
        let mut configs: Vec<PublisherConfig> = vec![PublisherConfig::default()];

        if !options.skip_global
            && let Some(global_config) = Self::load_global_config(&options.env).await?
        {
            configs.push(global_config);
        }

        let project_config = match &options.config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(PublishError::ConfigError(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Self::load_config_file(path).await?
            }
            None => Self::load_config_file(&options.project_path.join(CONFIG_FILENAME)).await?,
        };
        if let Some(project_config) = project_config {
            configs.push(project_config);
        }

        if let Some(env_config) = Self::load_env_config(&options.env) {
            configs.push(env_config);
        }

        let merged_config = Self::merge_configs(configs);

        Ok(Self::expand_env_vars(merged_config, &options.env))
    }

    /// Load global configuration from ~/.doc-publisher.yaml
    async fn load_global_config(
        env: &HashMap<String, String>,
    ) -> Result<Option<PublisherConfig>, PublishError> {
        let home_dir = match env.get("HOME").cloned().or_else(|| env::var("HOME").ok()) {
            Some(home) => home,
            None => return Ok(None),
        };

        Self::load_config_file(&PathBuf::from(home_dir).join(CONFIG_FILENAME)).await
    }

    /// Load configuration from YAML file
    fn load_config_file(
        file_path: &Path,
    ) -> std::pin::Pin<
        Box<
            dyn std::future::Future<Output = Result<Option<PublisherConfig>, PublishError>>
                + Send
                + '_,
        >,
    > {
        Box::pin(async move {
            if !file_path.exists() {
                return Ok(None);
            }

            let content = fs::read_to_string(file_path).await.map_err(|e| {
                PublishError::ConfigError(format!(
                    "Failed to read config file {}: {}",
                    file_path.display(),
                    e
                ))
            })?;

            let config: PublisherConfig = serde_yaml::from_str(&content).map_err(|e| {
                PublishError::ConfigError(format!("Failed to parse YAML config: {}", e))
            })?;

            tracing::debug!(path = %file_path.display(), "loaded config file");

            if let Some(extends_path) = &config.extends {
                let base_path = file_path
                    .parent()
                    .ok_or_else(|| {
                        PublishError::ConfigError("Invalid config file path".to_string())
                    })?
                    .join(extends_path);

                if let Some(base_config) = Self::load_config_file(&base_path).await? {
                    return Ok(Some(Self::merge_configs(vec![base_config, config])));
                }
            }

            Ok(Some(config))
        })
    }

    /// Load configuration from environment variables
    fn load_env_config(env: &HashMap<String, String>) -> Option<PublisherConfig> {
        let mut config = PublisherConfig::default();
        let mut has_changes = false;

        if let Some(value) = env.get("DOC_PUBLISHER_ENV") {
            match Environment::parse(value) {
                Some(environment) => {
                    config.environment = Some(environment);
                    has_changes = true;
                }
                None => tracing::warn!(value = %value, "ignoring unknown DOC_PUBLISHER_ENV"),
            }
        }

        let mut storage = StorageConfig::default();
        if let Some(bucket) = env.get("DOC_PUBLISHER_BUCKET") {
            storage.bucket = Some(bucket.clone());
        }
        if let Some(access_key) = env.get("AWS_ACCESS_KEY_ID") {
            storage.access_key = Some(access_key.clone());
        }
        if let Some(secret_key) = env.get("AWS_SECRET_ACCESS_KEY") {
            storage.secret_key = Some(secret_key.clone());
        }
        if storage != StorageConfig::default() {
            config.storage = Some(storage);
            has_changes = true;
        }

        let mut sftp = SftpConfig::default();
        if let Some(host) = env.get("DOC_PUBLISHER_SFTP_HOST") {
            sftp.host = Some(host.clone());
        }
        if let Some(username) = env.get("DOC_PUBLISHER_SFTP_USER") {
            sftp.username = Some(username.clone());
        }
        if let Some(password) = env.get("DOC_PUBLISHER_SFTP_PASSWORD") {
            sftp.password = Some(password.clone());
        }
        if sftp != SftpConfig::default() {
            config.sftp = Some(sftp);
            has_changes = true;
        }

        if has_changes { Some(config) } else { None }
    }

    /// Merge multiple configurations, later entries win
    pub fn merge_configs(configs: Vec<PublisherConfig>) -> PublisherConfig {
        let mut result = PublisherConfig::default();

        for config in configs {
            Self::merge_into(&mut result, config);
        }

        result
    }

    /// Merge source config into target, field by field
    fn merge_into(target: &mut PublisherConfig, source: PublisherConfig) {
        if !source.version.is_empty() {
            target.version = source.version;
        }

        if source.extends.is_some() {
            target.extends = source.extends;
        }

        if source.environment.is_some() {
            target.environment = source.environment;
        }

        if let Some(src) = source.storage {
            let dst = target.storage.get_or_insert_with(StorageConfig::default);
            merge_field(&mut dst.bucket, src.bucket);
            merge_field(&mut dst.access_key, src.access_key);
            merge_field(&mut dst.secret_key, src.secret_key);
            merge_field(&mut dst.sync_command, src.sync_command);
            merge_field(&mut dst.timeout_secs, src.timeout_secs);
        }

        if let Some(src) = source.sftp {
            let dst = target.sftp.get_or_insert_with(SftpConfig::default);
            merge_field(&mut dst.host, src.host);
            merge_field(&mut dst.port, src.port);
            merge_field(&mut dst.username, src.username);
            merge_field(&mut dst.password, src.password);
            merge_field(&mut dst.publish_dir, src.publish_dir);
        }

        if let Some(src) = source.retry {
            let dst = target.retry.get_or_insert_with(RetryConfig::default);
            merge_field(&mut dst.sync_attempts, src.sync_attempts);
            merge_field(&mut dst.transfer_attempts, src.transfer_attempts);
        }

        if let Some(src) = source.notifications {
            let dst = target
                .notifications
                .get_or_insert_with(NotificationsConfig::default);
            merge_field(&mut dst.enabled, src.enabled);
            merge_field(&mut dst.endpoint, src.endpoint);
            merge_field(&mut dst.sender, src.sender);
        }

        if let Some(src) = source.store {
            let dst = target.store.get_or_insert_with(StoreConfig::default);
            merge_field(&mut dst.path, src.path);
        }

        if source.security.is_some() {
            target.security = source.security;
        }
    }

    /// Expand `${VAR}` references in string settings
    ///
    /// Respects `security.envVarExpansion.allowedPrefixes` if configured.
    fn expand_env_vars(mut config: PublisherConfig, env: &HashMap<String, String>) -> PublisherConfig {
        let expansion = config
            .security
            .as_ref()
            .and_then(|s| s.env_var_expansion.clone())
            .unwrap_or_default();

        if !expansion.enabled.unwrap_or(true) {
            return config;
        }

        let prefixes = expansion.allowed_prefixes;
        let expand = |value: &mut Option<String>| {
            if let Some(current) = value.as_deref() {
                *value = Some(Self::expand_string(current, env, &prefixes));
            }
        };

        if let Some(storage) = &mut config.storage {
            expand(&mut storage.bucket);
            expand(&mut storage.access_key);
            expand(&mut storage.secret_key);
            expand(&mut storage.sync_command);
        }

        if let Some(sftp) = &mut config.sftp {
            expand(&mut sftp.host);
            expand(&mut sftp.username);
            expand(&mut sftp.password);
            expand(&mut sftp.publish_dir);
        }

        if let Some(notifications) = &mut config.notifications {
            expand(&mut notifications.endpoint);
            expand(&mut notifications.sender);
        }

        if let Some(store) = &mut config.store {
            expand(&mut store.path);
        }

        config
    }

    /// Expand environment variables in a single string
    fn expand_string(
        input: &str,
        env: &HashMap<String, String>,
        allowed_prefixes: &Option<Vec<String>>,
    ) -> String {
        let mut result = input.to_string();

        for cap in ENV_VAR_PATTERN.captures_iter(input) {
            let var_name = &cap[1];

            if let Some(prefixes) = allowed_prefixes
                && !prefixes.iter().any(|prefix| var_name.starts_with(prefix))
            {
                tracing::warn!(
                    variable = var_name,
                    "environment variable not allowed by prefix whitelist, skipping"
                );
                continue;
            }

            match env.get(var_name) {
                Some(value) => {
                    result = result.replace(&format!("${{{}}}", var_name), value);
                }
                None => tracing::warn!(variable = var_name, "environment variable not found"),
            }
        }

        result
    }

    /// Validate configuration
    pub fn validate(config: &PublisherConfig) -> ConfigValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if config.version.is_empty() {
            errors.push(ConfigValidationError {
                field: "version".to_string(),
                message: "Version is required".to_string(),
            });
        } else if config.version != "1.0" {
            warnings.push(ConfigValidationWarning {
                field: "version".to_string(),
                message: format!("Unknown version: {}", config.version),
                suggestion: Some("Currently supported version is \"1.0\" only".to_string()),
            });
        }

        let storage = config.storage.clone().unwrap_or_default();
        require(&mut errors, "storage.bucket", &storage.bucket);
        require(&mut errors, "storage.accessKey", &storage.access_key);
        require(&mut errors, "storage.secretKey", &storage.secret_key);
        if let Some(command) = &storage.sync_command
            && !crate::security::SafeCommandExecutor::is_allowed(command)
        {
            errors.push(ConfigValidationError {
                field: "storage.syncCommand".to_string(),
                message: format!("'{}' is not an allowed sync executable", command),
            });
        }

        let sftp = config.sftp.clone().unwrap_or_default();
        require(&mut errors, "sftp.host", &sftp.host);
        require(&mut errors, "sftp.username", &sftp.username);
        require(&mut errors, "sftp.password", &sftp.password);

        if let Some(retry) = &config.retry {
            for (field, value) in [
                ("retry.syncAttempts", retry.sync_attempts),
                ("retry.transferAttempts", retry.transfer_attempts),
            ] {
                if value == Some(0) {
                    errors.push(ConfigValidationError {
                        field: field.to_string(),
                        message: "At least one attempt is required".to_string(),
                    });
                }
            }
        }

        let notifications = config.notifications.clone().unwrap_or_default();
        if !config.environment().is_production_like() {
            warnings.push(ConfigValidationWarning {
                field: "environment".to_string(),
                message: "Notifications are never sent in development".to_string(),
                suggestion: None,
            });
        } else if notifications.enabled.unwrap_or(true) && notifications.endpoint.is_none() {
            warnings.push(ConfigValidationWarning {
                field: "notifications.endpoint".to_string(),
                message: "No mail relay endpoint, subscribers will not be notified".to_string(),
                suggestion: Some("Set notifications.endpoint".to_string()),
            });
        }

        ConfigValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Validate and resolve into the settings the pipeline runs on
    pub fn resolve(config: &PublisherConfig) -> Result<PublisherSettings, PublishError> {
        let validation = Self::validate(config);
        if !validation.valid {
            return Err(PublishError::ConfigError(Self::format_validation_result(
                &validation,
            )));
        }

        let storage = config.storage.clone().unwrap_or_default();
        let sftp = config.sftp.clone().unwrap_or_default();
        let retry = config.retry.clone().unwrap_or_default();
        let notifications = config.notifications.clone().unwrap_or_default();
        let environment = config.environment();

        let notifications = match (notifications.enabled.unwrap_or(true), notifications.endpoint) {
            (true, Some(endpoint)) if environment.is_production_like() => {
                Some(NotificationSettings {
                    endpoint,
                    sender: notifications.sender,
                })
            }
            _ => None,
        };

        Ok(PublisherSettings {
            environment,
            storage: StorageSettings {
                bucket: storage.bucket.unwrap_or_default(),
                credentials: StorageCredentials::new(
                    storage.access_key.unwrap_or_default(),
                    storage.secret_key.unwrap_or_default(),
                ),
                sync_command: storage
                    .sync_command
                    .unwrap_or_else(|| DEFAULT_SYNC_COMMAND.to_string()),
                timeout: storage.timeout_secs.map(Duration::from_secs),
            },
            sftp: SftpSettings {
                credentials: SftpCredentials::new(
                    sftp.host.unwrap_or_default(),
                    sftp.port.unwrap_or(DEFAULT_SFTP_PORT),
                    sftp.username.unwrap_or_default(),
                    sftp.password.unwrap_or_default(),
                ),
                publish_dir: sftp
                    .publish_dir
                    .unwrap_or_else(|| DEFAULT_PUBLISH_DIR.to_string()),
            },
            sync_attempts: retry.sync_attempts.unwrap_or(DEFAULT_ATTEMPTS),
            transfer_attempts: retry.transfer_attempts.unwrap_or(DEFAULT_ATTEMPTS),
            notifications,
            store_path: config.store_path(),
        })
    }

    /// Format validation result as human-readable string
    pub fn format_validation_result(result: &ConfigValidationResult) -> String {
        let mut lines = Vec::new();

        if result.valid {
            lines.push("Configuration validation succeeded".to_string());
        } else {
            lines.push("Configuration has errors".to_string());
        }

        for error in &result.errors {
            lines.push(format!("  - [{}] {}", error.field, error.message));
        }

        for warning in &result.warnings {
            lines.push(format!("  ! [{}] {}", warning.field, warning.message));
            if let Some(suggestion) = &warning.suggestion {
                lines.push(format!("    Suggestion: {}", suggestion));
            }
        }

        lines.join("\n")
    }
}

fn merge_field<T>(target: &mut Option<T>, source: Option<T>) {
    if source.is_some() {
        *target = source;
    }
}

fn require(errors: &mut Vec<ConfigValidationError>, field: &str, value: &Option<String>) {
    let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) else {
        errors.push(ConfigValidationError {
            field: field.to_string(),
            message: format!("{} is required", field),
        });
        return;
    };

    // Expansion leaves unset variables in place
    if let Some(cap) = ENV_VAR_PATTERN.captures(value) {
        errors.push(ConfigValidationError {
            field: field.to_string(),
            message: format!("{} references unset {}", field, &cap[0]),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    fn complete_config() -> PublisherConfig {
        PublisherConfig {
            storage: Some(StorageConfig {
                bucket: Some("docs".to_string()),
                access_key: Some("AKIAEXAMPLE".to_string()),
                secret_key: Some("secret-access-key".to_string()),
                ..Default::default()
            }),
            sftp: Some(SftpConfig {
                host: Some("files.example.com".to_string()),
                username: Some("publisher".to_string()),
                password: Some("hunter2".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_env_config() {
        let mut env = HashMap::new();
        env.insert("DOC_PUBLISHER_ENV".to_string(), "development".to_string());
        env.insert("DOC_PUBLISHER_BUCKET".to_string(), "docs".to_string());
        env.insert("DOC_PUBLISHER_SFTP_HOST".to_string(), "files.example.com".to_string());

        let config = ConfigLoader::load_env_config(&env).unwrap();

        assert_eq!(config.environment, Some(Environment::Development));
        assert_eq!(config.storage.unwrap().bucket.as_deref(), Some("docs"));
        assert_eq!(config.sftp.unwrap().host.as_deref(), Some("files.example.com"));
    }

    #[test]
    fn test_load_env_config_without_variables() {
        assert!(ConfigLoader::load_env_config(&HashMap::new()).is_none());
    }

    #[test]
    fn test_expand_string() {
        let mut env = HashMap::new();
        env.insert("AWS_SECRET_ACCESS_KEY".to_string(), "secret123".to_string());

        let result = ConfigLoader::expand_string("${AWS_SECRET_ACCESS_KEY}", &env, &None);

        assert_eq!(result, "secret123");
    }

    #[test]
    fn test_expand_string_with_allowed_prefixes() {
        let mut env = HashMap::new();
        env.insert("AWS_SECRET_ACCESS_KEY".to_string(), "secret123".to_string());
        env.insert("OTHER_SECRET".to_string(), "forbidden".to_string());

        let allowed_prefixes = Some(vec!["AWS_".to_string()]);
        let result = ConfigLoader::expand_string(
            "${AWS_SECRET_ACCESS_KEY}-${OTHER_SECRET}",
            &env,
            &allowed_prefixes,
        );

        assert_eq!(result, "secret123-${OTHER_SECRET}");
    }

    #[test]
    fn test_merge_configs_field_by_field() {
        let base = PublisherConfig {
            sftp: Some(SftpConfig {
                host: Some("old.example.com".to_string()),
                username: Some("publisher".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = PublisherConfig {
            sftp: Some(SftpConfig {
                host: Some("new.example.com".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let merged = ConfigLoader::merge_configs(vec![base, overlay]);
        let sftp = merged.sftp.unwrap();

        assert_eq!(sftp.host.as_deref(), Some("new.example.com"));
        assert_eq!(sftp.username.as_deref(), Some("publisher"));
    }

    #[test]
    fn test_validate_reports_missing_destinations() {
        let result = ConfigLoader::validate(&PublisherConfig::default());

        assert!(!result.valid);
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"storage.bucket"));
        assert!(fields.contains(&"sftp.host"));
        assert!(fields.contains(&"sftp.username"));
    }

    #[test]
    fn test_validate_rejects_unlisted_sync_command() {
        let mut config = complete_config();
        config.storage.as_mut().unwrap().sync_command = Some("/usr/bin/curl".to_string());

        let result = ConfigLoader::validate(&config);

        assert!(!result.valid);
        assert_eq!(result.errors[0].field, "storage.syncCommand");
    }

    #[test]
    fn test_validate_development_warning() {
        let mut config = complete_config();
        config.environment = Some(Environment::Development);

        let result = ConfigLoader::validate(&config);

        assert!(result.valid);
        assert_eq!(result.warnings[0].field, "environment");
    }

    #[test]
    fn test_resolve_applies_defaults() {
        let settings = ConfigLoader::resolve(&complete_config()).unwrap();

        assert_eq!(settings.storage.bucket, "docs");
        assert_eq!(settings.storage.sync_command, DEFAULT_SYNC_COMMAND);
        assert_eq!(settings.storage.credentials.secret_key.expose_secret(), "secret-access-key");
        assert_eq!(settings.sftp.publish_dir, DEFAULT_PUBLISH_DIR);
        assert_eq!(settings.sftp.credentials.port, DEFAULT_SFTP_PORT);
        assert_eq!(settings.sync_attempts, 10);
        assert_eq!(settings.transfer_attempts, 10);
        assert!(settings.notifications.is_none());
    }

    #[test]
    fn test_resolve_drops_notifications_in_development() {
        let mut config = complete_config();
        config.environment = Some(Environment::Development);
        config.notifications = Some(NotificationsConfig {
            enabled: Some(true),
            endpoint: Some("https://mail.example.com/send".to_string()),
            sender: None,
        });

        let settings = ConfigLoader::resolve(&config).unwrap();
        assert!(settings.notifications.is_none());

        config.environment = Some(Environment::Staging);
        let settings = ConfigLoader::resolve(&config).unwrap();
        assert!(settings.notifications.is_some());
    }

    #[test]
    fn test_resolve_invalid_config_is_config_error() {
        let result = ConfigLoader::resolve(&PublisherConfig::default());
        assert!(matches!(result, Err(PublishError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_load_project_file_with_env_expansion() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            r#"
version: "1.0"
storage:
  bucket: docs
  accessKey: AKIAEXAMPLE
  secretKey: ${AWS_SECRET_ACCESS_KEY}
sftp:
  host: files.example.com
  username: publisher
  password: ${DOC_PUBLISHER_SFTP_PASSWORD}
"#,
        )
        .unwrap();

        let mut env = HashMap::new();
        env.insert("AWS_SECRET_ACCESS_KEY".to_string(), "from-env".to_string());
        env.insert("DOC_PUBLISHER_SFTP_PASSWORD".to_string(), "sftp-pass".to_string());

        let config = ConfigLoader::load(ConfigLoadOptions {
            project_path: temp_dir.path().to_path_buf(),
            config_file: None,
            skip_global: true,
            env,
        })
        .await
        .unwrap();

        let storage = config.storage.unwrap();
        assert_eq!(storage.bucket.as_deref(), Some("docs"));
        // AWS_SECRET_ACCESS_KEY also overrides through the environment layer
        assert_eq!(storage.secret_key.as_deref(), Some("from-env"));
        assert_eq!(config.sftp.unwrap().password.as_deref(), Some("sftp-pass"));
    }

    #[test]
    fn test_validate_rejects_unexpanded_placeholders() {
        let result = ConfigLoader::validate(&PublisherConfig::template());

        assert!(!result.valid);
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["storage.accessKey", "storage.secretKey", "sftp.password"]
        );
        assert_eq!(
            result.errors[1].message,
            "storage.secretKey references unset ${AWS_SECRET_ACCESS_KEY}"
        );
    }

    #[tokio::test]
    async fn test_resolve_init_template_without_env_fails() {
        let temp_dir = TempDir::new().unwrap();
        let yaml = serde_yaml::to_string(&PublisherConfig::template()).unwrap();
        std::fs::write(temp_dir.path().join(CONFIG_FILENAME), yaml).unwrap();

        let config = ConfigLoader::load(ConfigLoadOptions {
            project_path: temp_dir.path().to_path_buf(),
            config_file: None,
            skip_global: true,
            env: HashMap::new(),
        })
        .await
        .unwrap();

        match ConfigLoader::resolve(&config) {
            Err(PublishError::ConfigError(message)) => {
                assert!(message.contains("${AWS_SECRET_ACCESS_KEY}"));
                assert!(message.contains("${DOC_PUBLISHER_SFTP_PASSWORD}"));
            }
            other => panic!("expected a config error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_load_missing_explicit_file_fails() {
        let temp_dir = TempDir::new().unwrap();

        let result = ConfigLoader::load(ConfigLoadOptions {
            project_path: temp_dir.path().to_path_buf(),
            config_file: Some(temp_dir.path().join("missing.yaml")),
            skip_global: true,
            env: HashMap::new(),
        })
        .await;

        assert!(matches!(result, Err(PublishError::ConfigError(_))));
    }

    #[test]
    fn test_format_validation_result() {
        let result = ConfigLoader::validate(&PublisherConfig::default());
        let formatted = ConfigLoader::format_validation_result(&result);

        assert!(formatted.contains("Configuration has errors"));
        assert!(formatted.contains("[storage.bucket]"));
    }
}
