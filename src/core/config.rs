//! Configuration structures for doc-publisher
//!
//! `PublisherConfig` mirrors the YAML file: every field is optional so that
//! layers (defaults, global file, project file, environment) can be merged.
//! `PublisherSettings` is the resolved, validated form the pipeline runs on.

use crate::security::credentials::{SftpCredentials, StorageCredentials};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SYNC_COMMAND: &str = "s3cmd";
pub const DEFAULT_PUBLISH_DIR: &str = "public_html";
pub const DEFAULT_SFTP_PORT: u16 = 22;
pub const DEFAULT_ATTEMPTS: u32 = 10;
pub const DEFAULT_STORE_PATH: &str = "doc-publisher.json";

/// Root configuration object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublisherConfig {
    /// Schema version (required)
    pub version: String,

    /// Extend from base configuration file (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Deployment environment, controls notification dispatch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,

    /// Object storage destination
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,

    /// SFTP destination for the archive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sftp: Option<SftpConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotificationsConfig>,

    /// Artifact store location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityConfig>,
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Staging,
    Development,
}

impl Environment {
    /// Subscribers are only notified from production-like environments
    pub fn is_production_like(&self) -> bool {
        !matches!(self, Self::Development)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" | "dev" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Object storage configuration
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", rename = "accessKey")]
    pub access_key: Option<String>,

    /// Environment variable expansion supported, e.g. `${AWS_SECRET_ACCESS_KEY}`
    #[serde(skip_serializing_if = "Option::is_none", rename = "secretKey")]
    pub secret_key: Option<String>,

    /// Path to the sync executable (default: "s3cmd")
    #[serde(skip_serializing_if = "Option::is_none", rename = "syncCommand")]
    pub sync_command: Option<String>,

    /// Kill a single sync attempt after this many seconds
    #[serde(skip_serializing_if = "Option::is_none", rename = "timeoutSecs")]
    pub timeout_secs: Option<u64>,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket", &self.bucket)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("sync_command", &self.sync_command)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// SFTP destination configuration
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SftpConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Remote directory archives are written into (default: "public_html")
    #[serde(skip_serializing_if = "Option::is_none", rename = "publishDir")]
    pub publish_dir: Option<String>,
}

impl fmt::Debug for SftpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SftpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("publish_dir", &self.publish_dir)
            .finish()
    }
}

/// Retry budgets
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    #[serde(skip_serializing_if = "Option::is_none", rename = "syncAttempts")]
    pub sync_attempts: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none", rename = "transferAttempts")]
    pub transfer_attempts: Option<u32>,
}

/// Notification settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotificationsConfig {
    /// Enable notifications (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Mail relay endpoint receiving one JSON request per publish
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Sender address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
}

/// Artifact store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Security configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SecurityConfig {
    #[serde(skip_serializing_if = "Option::is_none", rename = "envVarExpansion")]
    pub env_var_expansion: Option<EnvVarExpansionConfig>,
}

/// Environment variable expansion configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnvVarExpansionConfig {
    /// Enable environment variable expansion (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Allowed environment variable prefixes (default: all)
    #[serde(skip_serializing_if = "Option::is_none", rename = "allowedPrefixes")]
    pub allowed_prefixes: Option<Vec<String>>,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            extends: None,
            environment: None,
            storage: None,
            sftp: None,
            retry: None,
            notifications: None,
            store: None,
            security: Some(SecurityConfig {
                env_var_expansion: Some(EnvVarExpansionConfig {
                    enabled: Some(true),
                    allowed_prefixes: None,
                }),
            }),
        }
    }
}

impl PublisherConfig {
    /// Template written by `doc-publisher init`
    pub fn template() -> Self {
        Self {
            environment: Some(Environment::Production),
            storage: Some(StorageConfig {
                bucket: Some("my-docs-bucket".to_string()),
                access_key: Some("${AWS_ACCESS_KEY_ID}".to_string()),
                secret_key: Some("${AWS_SECRET_ACCESS_KEY}".to_string()),
                sync_command: Some(DEFAULT_SYNC_COMMAND.to_string()),
                timeout_secs: None,
            }),
            sftp: Some(SftpConfig {
                host: Some("files.example.com".to_string()),
                port: Some(DEFAULT_SFTP_PORT),
                username: Some("publisher".to_string()),
                password: Some("${DOC_PUBLISHER_SFTP_PASSWORD}".to_string()),
                publish_dir: Some(DEFAULT_PUBLISH_DIR.to_string()),
            }),
            retry: Some(RetryConfig {
                sync_attempts: Some(DEFAULT_ATTEMPTS),
                transfer_attempts: Some(DEFAULT_ATTEMPTS),
            }),
            store: Some(StoreConfig {
                path: Some(DEFAULT_STORE_PATH.to_string()),
            }),
            ..Default::default()
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment.unwrap_or_default()
    }

    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(
            self.store
                .as_ref()
                .and_then(|s| s.path.as_deref())
                .unwrap_or(DEFAULT_STORE_PATH),
        )
    }
}

/// Fully resolved settings for one publisher process
#[derive(Debug, Clone)]
pub struct PublisherSettings {
    pub environment: Environment,
    pub storage: StorageSettings,
    pub sftp: SftpSettings,
    pub sync_attempts: u32,
    pub transfer_attempts: u32,
    /// `None` when notifications are disabled or no endpoint is configured
    pub notifications: Option<NotificationSettings>,
    pub store_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub bucket: String,
    pub credentials: StorageCredentials,
    pub sync_command: String,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct SftpSettings {
    pub credentials: SftpCredentials,
    pub publish_dir: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSettings {
    pub endpoint: String,
    pub sender: Option<String>,
}
