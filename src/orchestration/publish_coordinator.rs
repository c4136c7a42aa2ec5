//! Publish Coordinator - Runs the publish pipeline for one artifact
//!
//! Manages the complete publishing workflow:
//! - Artifact lookup and single-flight protection
//! - Precondition validation
//! - Object storage sync, then archive transfer
//! - Recording the publish time (the durability point)
//! - Best-effort cleanup and subscriber notification
//!
//! Everything before the durability point is a hard precondition and fails
//! the call. Cleanup and notification failures are only reported.

use crate::core::config::Environment;
use crate::core::error::{PublishError, RepositoryError};
use crate::core::traits::{
    Artifact, ArtifactId, ArtifactRepository, CleanupAgent, NotificationDispatcher,
};
use crate::destinations::{ObjectStoreSyncer, SecureFileTransfer};
use crate::orchestration::single_flight::SingleFlight;
use crate::validation::PreconditionValidator;
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Outcome of a best-effort step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffectOutcome {
    Done,
    Skipped(&'static str),
    Failed(String),
}

impl fmt::Display for SideEffectOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done => write!(f, "done"),
            Self::Skipped(reason) => write!(f, "skipped ({})", reason),
            Self::Failed(error) => write!(f, "failed: {}", error),
        }
    }
}

/// Report of one successful publish
#[derive(Debug, Clone)]
pub struct PublishReport {
    /// The artifact as persisted, `uploaded_at` set
    pub artifact: Artifact,
    pub sync_attempts: u32,
    pub transfer_attempts: u32,
    pub remote_archive: String,
    pub cleanup: SideEffectOutcome,
    pub notification: SideEffectOutcome,
    pub duration: Duration,
}

/// Sequences the publish pipeline
pub struct PublishCoordinator {
    repository: Arc<dyn ArtifactRepository>,
    validator: PreconditionValidator,
    syncer: ObjectStoreSyncer,
    transfer: SecureFileTransfer,
    cleanup: Arc<dyn CleanupAgent>,
    notifier: Option<Arc<dyn NotificationDispatcher>>,
    environment: Environment,
    guard: Arc<SingleFlight>,
}

impl PublishCoordinator {
    /// Create a coordinator for the production environment with no notifier
    pub fn new(
        repository: Arc<dyn ArtifactRepository>,
        syncer: ObjectStoreSyncer,
        transfer: SecureFileTransfer,
        cleanup: Arc<dyn CleanupAgent>,
        guard: Arc<SingleFlight>,
    ) -> Self {
        Self {
            repository,
            validator: PreconditionValidator::new(),
            syncer,
            transfer,
            cleanup,
            notifier: None,
            environment: Environment::default(),
            guard,
        }
    }

    pub fn with_notifier(mut self, notifier: Option<Arc<dyn NotificationDispatcher>>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn guard(&self) -> &Arc<SingleFlight> {
        &self.guard
    }

    /// Resolve an id and check its preconditions without publishing
    pub async fn check(&self, id: ArtifactId) -> Result<Artifact, PublishError> {
        let artifact = self.find(id).await?;
        self.validator.validate(&artifact).await?;
        Ok(artifact)
    }

    /// Look up an artifact in the repository
    pub async fn find(&self, id: ArtifactId) -> Result<Artifact, PublishError> {
        self.repository.find(id).await.map_err(|e| match e {
            RepositoryError::NotFound(id) => PublishError::NotFound { id },
            other => PublishError::Repository(other),
        })
    }

    /// Publish the artifact with the given id and return it updated
    pub async fn publish(&self, id: ArtifactId) -> Result<Artifact, PublishError> {
        self.publish_with_report(id).await.map(|report| report.artifact)
    }

    /// Publish the artifact with the given id
    pub async fn publish_with_report(&self, id: ArtifactId) -> Result<PublishReport, PublishError> {
        let artifact = self.find(id).await?;
        self.publish_artifact(artifact).await
    }

    /// Publish an artifact that has already been loaded
    pub async fn publish_artifact(&self, artifact: Artifact) -> Result<PublishReport, PublishError> {
        let span = tracing::info_span!("publish", artifact_id = %artifact.id);
        self.run(artifact).instrument(span).await
    }

    async fn run(&self, mut artifact: Artifact) -> Result<PublishReport, PublishError> {
        let start_time = Instant::now();

        // Held until this future completes or is dropped
        let _permit = self.guard.acquire(artifact.id)?;

        // A publish that finished while we waited for the guard may have set it
        let current = self.find(artifact.id).await?;
        if current.uploaded_at.is_some() {
            artifact.uploaded_at = current.uploaded_at;
        }

        self.validator.validate(&artifact).await?;

        let sync_attempts = self.syncer.sync_directory(&artifact.local_path).await?;
        tracing::info!(attempts = sync_attempts, "directory synced");

        if !tokio::fs::try_exists(&artifact.archive_path)
            .await
            .unwrap_or(false)
        {
            return Err(PublishError::MissingArchive {
                name: artifact.name.clone(),
                path: artifact.archive_path.clone(),
            });
        }

        let receipt = self.transfer.upload(&artifact.archive_path).await?;
        tracing::info!(
            attempts = receipt.attempts,
            remote = %receipt.remote_path,
            "archive uploaded"
        );

        if !artifact.mark_uploaded(Utc::now()) {
            tracing::info!("artifact was already published, keeping original upload time");
        }
        self.repository
            .save(&artifact)
            .await
            .map_err(|source| PublishError::PersistFailed {
                name: artifact.name.clone(),
                source,
            })?;

        let cleanup = self.run_cleanup(&artifact).await;
        let notification = self.run_notification(&artifact).await;

        let duration = start_time.elapsed();
        tracing::info!(
            duration_ms = duration.as_millis() as u64,
            cleanup = %cleanup,
            notification = %notification,
            "artifact published"
        );

        Ok(PublishReport {
            artifact,
            sync_attempts,
            transfer_attempts: receipt.attempts,
            remote_archive: receipt.remote_path,
            cleanup,
            notification,
            duration,
        })
    }

    async fn run_cleanup(&self, artifact: &Artifact) -> SideEffectOutcome {
        match self.cleanup.delete_files(artifact).await {
            Ok(()) => SideEffectOutcome::Done,
            Err(e) => {
                let message = format!("{:#}", e);
                tracing::warn!(error = %message, "cleanup failed, artifact stays published");
                SideEffectOutcome::Failed(message)
            }
        }
    }

    async fn run_notification(&self, artifact: &Artifact) -> SideEffectOutcome {
        if !self.environment.is_production_like() {
            return SideEffectOutcome::Skipped("non-production environment");
        }
        let Some(notifier) = &self.notifier else {
            return SideEffectOutcome::Skipped("no notifier configured");
        };

        match Self::notify(notifier.as_ref(), artifact).await {
            Ok(0) => SideEffectOutcome::Skipped("no pending subscriptions"),
            Ok(recipients) => {
                tracing::info!(recipients, "subscribers notified");
                SideEffectOutcome::Done
            }
            Err(e) => {
                let message = format!("{:#}", e);
                tracing::warn!(error = %message, "notification failed, artifact stays published");
                SideEffectOutcome::Failed(message)
            }
        }
    }

    /// Send to pending subscribers, then clear them. Returns the recipient count.
    async fn notify(
        notifier: &dyn NotificationDispatcher,
        artifact: &Artifact,
    ) -> anyhow::Result<usize> {
        let recipients = notifier.subscriptions_for(artifact).await?;
        if recipients.is_empty() {
            return Ok(0);
        }

        notifier.send(artifact, &recipients).await?;
        notifier.clear_subscriptions(artifact).await?;
        Ok(recipients.len())
    }
}
