//! Object Store Syncer - Mirrors a generated directory into a bucket prefix
//!
//! The sync itself is delegated to a [`SyncPrimitive`]; the syncer owns path
//! normalization and the bounded retry loop around it. [`S3cmdSync`] is the
//! production primitive, running the `s3cmd` tool through the whitelisted
//! [`SafeCommandExecutor`].

use crate::core::error::{PublishError, SyncError};
use crate::core::retry::{RetryError, RetryManager, RetryPolicy};
use crate::core::traits::{SyncPrimitive, SyncRequest};
use crate::security::command_executor::{CommandError, SafeCommandExecutor};
use crate::security::credentials::{StorageCredentials, mask_in};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::path::{MAIN_SEPARATOR, Path};
use std::sync::Arc;

/// Mirrors local directories into one bucket
pub struct ObjectStoreSyncer {
    primitive: Arc<dyn SyncPrimitive>,
    bucket: String,
    retry: RetryManager,
}

impl ObjectStoreSyncer {
    /// Create a syncer making at most `max_attempts` immediate attempts per sync
    pub fn new(primitive: Arc<dyn SyncPrimitive>, bucket: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            primitive,
            bucket: bucket.into(),
            retry: RetryManager::new(RetryPolicy::immediate(max_attempts)),
        }
    }

    /// Append a trailing separator so the directory's contents, not the
    /// directory itself, land under the remote prefix
    pub fn normalize_source_dir(local_dir: &Path) -> String {
        let dir = local_dir.to_string_lossy();
        if dir.ends_with('/') || dir.ends_with(MAIN_SEPARATOR) {
            dir.into_owned()
        } else {
            format!("{}{}", dir, MAIN_SEPARATOR)
        }
    }

    /// Final path segment of `local_dir` with a trailing `/`
    ///
    /// ```
    /// use doc_publisher::destinations::ObjectStoreSyncer;
    /// use std::path::Path;
    ///
    /// assert_eq!(
    ///     ObjectStoreSyncer::remote_prefix(Path::new("/data/42/")).as_deref(),
    ///     Some("42/")
    /// );
    /// ```
    pub fn remote_prefix(local_dir: &Path) -> Option<String> {
        local_dir
            .file_name()
            .map(|name| format!("{}/", name.to_string_lossy()))
    }

    /// Mirror `local_dir` into the configured bucket under the prefix derived
    /// from its last path segment
    ///
    /// Returns the number of attempts it took.
    pub async fn sync_directory(&self, local_dir: &Path) -> Result<u32, PublishError> {
        let prefix = Self::remote_prefix(local_dir).ok_or_else(|| {
            PublishError::ConfigError(format!(
                "Cannot derive a remote prefix from {}",
                local_dir.display()
            ))
        })?;

        self.sync(local_dir, &self.bucket, &prefix).await
    }

    /// Mirror `local_dir` into `bucket` under `remote_prefix`
    ///
    /// Every `SyncError::NonZeroStatus` is retried, up to the attempt budget,
    /// with no delay between attempts.
    pub async fn sync(
        &self,
        local_dir: &Path,
        bucket: &str,
        remote_prefix: &str,
    ) -> Result<u32, PublishError> {
        let request = SyncRequest::mirror(
            Self::normalize_source_dir(local_dir),
            bucket,
            remote_prefix.to_string(),
        );

        tracing::info!(
            source = %request.source_dir,
            destination = %request.destination_uri(),
            "syncing directory to object storage"
        );

        let result = self
            .retry
            .retry(SyncError::is_retryable, |attempt| {
                let request = &request;
                async move {
                    tracing::debug!(attempt, "running sync");
                    self.primitive.sync(request).await.map(|()| attempt)
                }
            })
            .await;

        result.map_err(|error| {
            let attempts = error.attempts();
            if let RetryError::Exhausted { last, .. } = &error {
                tracing::error!(attempts, error = %last, "object storage sync retries exhausted");
            }
            PublishError::SyncFailed {
                attempts,
                source: error.into_inner(),
            }
        })
    }
}

/// [`SyncPrimitive`] backed by the `s3cmd` command line tool
pub struct S3cmdSync {
    executor: SafeCommandExecutor,
    program: String,
    credentials: StorageCredentials,
}

impl S3cmdSync {
    pub fn new(
        executor: SafeCommandExecutor,
        program: impl Into<String>,
        credentials: StorageCredentials,
    ) -> Self {
        Self {
            executor,
            program: program.into(),
            credentials,
        }
    }

    /// Build the argument vector for one sync run
    pub fn build_args(&self, request: &SyncRequest) -> Vec<String> {
        let mut args = vec![
            "sync".to_string(),
            format!("--access_key={}", self.credentials.access_key),
            format!(
                "--secret_key={}",
                self.credentials.secret_key.expose_secret()
            ),
            "--quiet".to_string(),
        ];

        if request.delete_removed {
            args.push("--delete-removed".to_string());
        }
        if !request.preserve_attributes {
            args.push("--no-preserve".to_string());
        }
        if request.reduced_redundancy {
            args.push("--reduced-redundancy".to_string());
        }
        if request.public_read {
            args.push("--acl-public".to_string());
        }

        args.push(request.source_dir.clone());
        args.push(request.destination_uri());
        args
    }

    /// Loggable command line with the secret key masked
    fn describe(&self, args: &[String]) -> String {
        let command = format!("{} {}", self.program, args.join(" "));
        mask_in(&command, self.credentials.secret_key.expose_secret())
    }

    /// Classify an executor failure. A run killed at the timeout counts as a
    /// failed run and is retried; anything that kept it from starting is not.
    fn command_failure(&self, error: CommandError, args: &[String]) -> SyncError {
        match error {
            CommandError::Timeout(timeout) => SyncError::NonZeroStatus {
                status: format!("timed out after {:?}", timeout),
                command: self.describe(args),
            },
            other => SyncError::Launch(other),
        }
    }
}

#[async_trait]
impl SyncPrimitive for S3cmdSync {
    async fn sync(&self, request: &SyncRequest) -> Result<(), SyncError> {
        let args = self.build_args(request);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

        let output = self
            .executor
            .execute(&self.program, &arg_refs)
            .await
            .map_err(|e| self.command_failure(e, &args))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            tracing::debug!(
                stderr = %mask_in(stderr.trim(), self.credentials.secret_key.expose_secret()),
                "sync command reported an error"
            );
        }

        Err(SyncError::NonZeroStatus {
            status: output.status.to_string(),
            command: self.describe(&args),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails with a non-zero status for the first `failures` calls
    struct FlakySync {
        failures: u32,
        calls: AtomicU32,
        requests: Mutex<Vec<SyncRequest>>,
    }

    impl FlakySync {
        fn new(failures: u32) -> Arc<Self> {
            Arc::new(Self {
                failures,
                calls: AtomicU32::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SyncPrimitive for FlakySync {
        async fn sync(&self, request: &SyncRequest) -> Result<(), SyncError> {
            self.requests.lock().unwrap().push(request.clone());
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(SyncError::NonZeroStatus {
                    status: "exit status: 1".to_string(),
                    command: "s3cmd sync".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    struct UnlaunchableSync {
        calls: AtomicU32,
    }

    #[async_trait]
    impl SyncPrimitive for UnlaunchableSync {
        async fn sync(&self, _request: &SyncRequest) -> Result<(), SyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SyncError::Launch(CommandError::ExecutionFailed(
                "No such file or directory".to_string(),
            )))
        }
    }

    #[test]
    fn test_normalize_source_dir() {
        let expected = format!("/data/42{}", MAIN_SEPARATOR);
        assert_eq!(
            ObjectStoreSyncer::normalize_source_dir(Path::new("/data/42")),
            expected
        );
        assert_eq!(
            ObjectStoreSyncer::normalize_source_dir(Path::new("/data/42/")),
            "/data/42/"
        );
    }

    #[test]
    fn test_remote_prefix() {
        assert_eq!(
            ObjectStoreSyncer::remote_prefix(Path::new("/data/42")).as_deref(),
            Some("42/")
        );
        assert_eq!(
            ObjectStoreSyncer::remote_prefix(Path::new("/data/42/")).as_deref(),
            Some("42/")
        );
        assert_eq!(ObjectStoreSyncer::remote_prefix(Path::new("/")), None);
    }

    #[tokio::test]
    async fn test_sync_succeeds_first_attempt() {
        let primitive = FlakySync::new(0);
        let syncer = ObjectStoreSyncer::new(primitive.clone(), "docs", 10);

        let attempts = syncer.sync_directory(Path::new("/data/42")).await.unwrap();

        assert_eq!(attempts, 1);
        let requests = primitive.requests.lock().unwrap();
        assert_eq!(requests[0].destination_uri(), "s3://docs/42/");
        assert!(requests[0].source_dir.ends_with(MAIN_SEPARATOR));
        assert!(requests[0].delete_removed);
        assert!(!requests[0].preserve_attributes);
        assert!(requests[0].public_read);
    }

    #[tokio::test]
    async fn test_sync_retries_each_failure_until_success() {
        for failures in [1u32, 4, 9] {
            let primitive = FlakySync::new(failures);
            let syncer = ObjectStoreSyncer::new(primitive.clone(), "docs", 10);

            let attempts = syncer.sync_directory(Path::new("/data/42")).await.unwrap();

            assert_eq!(attempts, failures + 1);
            assert_eq!(primitive.calls.load(Ordering::SeqCst), failures + 1);
        }
    }

    #[tokio::test]
    async fn test_sync_gives_up_after_ten_attempts() {
        let primitive = FlakySync::new(u32::MAX);
        let syncer = ObjectStoreSyncer::new(primitive.clone(), "docs", 10);

        let result = syncer.sync_directory(Path::new("/data/42")).await;

        match result {
            Err(PublishError::SyncFailed { attempts, source }) => {
                assert_eq!(attempts, 10);
                assert!(matches!(source, SyncError::NonZeroStatus { .. }));
            }
            other => panic!("expected SyncFailed, got {:?}", other),
        }
        assert_eq!(primitive.calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_launch_failure_is_not_retried() {
        let primitive = Arc::new(UnlaunchableSync {
            calls: AtomicU32::new(0),
        });
        let syncer = ObjectStoreSyncer::new(primitive.clone(), "docs", 10);

        let result = syncer.sync_directory(Path::new("/data/42")).await;

        assert!(matches!(
            result,
            Err(PublishError::SyncFailed {
                attempts: 1,
                source: SyncError::Launch(_)
            })
        ));
        assert_eq!(primitive.calls.load(Ordering::SeqCst), 1);
    }

    fn s3cmd() -> S3cmdSync {
        S3cmdSync::new(
            SafeCommandExecutor::new(std::env::temp_dir()).unwrap(),
            "s3cmd",
            StorageCredentials::new("AKIAEXAMPLE", "wJalrXUtnFEMIK7MDENG"),
        )
    }

    #[test]
    fn test_s3cmd_args() {
        let request = SyncRequest::mirror("/data/42/".to_string(), "docs", "42/".to_string());

        let args = s3cmd().build_args(&request);

        assert_eq!(
            args,
            vec![
                "sync",
                "--access_key=AKIAEXAMPLE",
                "--secret_key=wJalrXUtnFEMIK7MDENG",
                "--quiet",
                "--delete-removed",
                "--no-preserve",
                "--reduced-redundancy",
                "--acl-public",
                "/data/42/",
                "s3://docs/42/",
            ]
        );
    }

    #[test]
    fn test_s3cmd_description_masks_secret() {
        let sync = s3cmd();
        let request = SyncRequest::mirror("/data/42/".to_string(), "docs", "42/".to_string());

        let description = sync.describe(&sync.build_args(&request));

        assert!(!description.contains("wJalrXUtnFEMIK7MDENG"));
        assert!(description.contains("--secret_key=wJa...ENG"));
        assert!(description.starts_with("s3cmd sync"));
    }

    #[test]
    fn test_s3cmd_timeout_is_retryable_failed_run() {
        let sync = s3cmd();
        let request = SyncRequest::mirror("/data/42/".to_string(), "docs", "42/".to_string());
        let args = sync.build_args(&request);

        let error = sync.command_failure(CommandError::Timeout(Duration::from_secs(300)), &args);

        assert!(error.is_retryable());
        match error {
            SyncError::NonZeroStatus { status, command } => {
                assert_eq!(status, "timed out after 300s");
                assert!(command.contains("--secret_key=wJa...ENG"));
                assert!(!command.contains("wJalrXUtnFEMIK7MDENG"));
            }
            other => panic!("expected NonZeroStatus, got {:?}", other),
        }
    }

    #[test]
    fn test_s3cmd_execution_failure_is_not_retryable() {
        let sync = s3cmd();

        let error = sync.command_failure(
            CommandError::ExecutionFailed("permission denied".to_string()),
            &[],
        );

        assert!(!error.is_retryable());
        assert!(matches!(
            error,
            SyncError::Launch(CommandError::ExecutionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_s3cmd_missing_binary_is_launch_error() {
        let sync = S3cmdSync::new(
            SafeCommandExecutor::new(std::env::temp_dir()).unwrap(),
            "/nonexistent/tools/s3cmd",
            StorageCredentials::new("AKIAEXAMPLE", "wJalrXUtnFEMIK7MDENG"),
        );
        let request = SyncRequest::mirror("/data/42/".to_string(), "docs", "42/".to_string());

        let result = sync.sync(&request).await;

        assert!(matches!(result, Err(SyncError::Launch(_))));
    }
}
