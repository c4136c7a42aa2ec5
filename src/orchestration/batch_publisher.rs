//! Batch Publisher - Publishes several artifacts concurrently
//!
//! Features:
//! - Concurrency control through a semaphore
//! - Duplicate ids in one batch are published once
//! - Per-artifact reporting; one failure never stops the others

use crate::core::traits::ArtifactId;
use crate::orchestration::publish_coordinator::{PublishCoordinator, PublishReport};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Batch publishing options
#[derive(Debug, Clone)]
pub struct BatchPublishOptions {
    /// Maximum concurrent publishes (default: 3)
    pub max_concurrency: usize,
}

impl Default for BatchPublishOptions {
    fn default() -> Self {
        Self { max_concurrency: 3 }
    }
}

/// Batch publish result
#[derive(Debug, Default)]
pub struct BatchPublishResult {
    /// Reports of the artifacts that were published
    pub succeeded: BTreeMap<ArtifactId, PublishReport>,

    /// Failed artifacts with error messages
    pub failed: BTreeMap<ArtifactId, String>,
}

impl BatchPublishResult {
    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// BatchPublisher - Runs the publish pipeline for many artifacts
pub struct BatchPublisher {
    coordinator: Arc<PublishCoordinator>,
}

impl BatchPublisher {
    pub fn new(coordinator: Arc<PublishCoordinator>) -> Self {
        Self { coordinator }
    }

    /// Publish every id in `ids`
    ///
    /// # Errors
    ///
    /// Fails only when `ids` is empty; per-artifact failures are reported in
    /// the result.
    pub async fn publish_all(
        &self,
        ids: Vec<ArtifactId>,
        options: BatchPublishOptions,
    ) -> Result<BatchPublishResult, anyhow::Error> {
        if ids.is_empty() {
            return Err(anyhow::anyhow!("At least one artifact id must be specified"));
        }

        let mut seen = HashSet::new();
        let ids: Vec<ArtifactId> = ids
            .into_iter()
            .filter(|id| {
                let first = seen.insert(*id);
                if !first {
                    tracing::warn!(artifact_id = %id, "duplicate id in batch, publishing once");
                }
                first
            })
            .collect();

        tracing::info!(
            count = ids.len(),
            max_concurrency = options.max_concurrency,
            "batch publishing"
        );

        let semaphore = Arc::new(Semaphore::new(options.max_concurrency.max(1)));
        let mut tasks = Vec::new();

        for id in ids {
            let semaphore = Arc::clone(&semaphore);
            let coordinator = Arc::clone(&self.coordinator);

            let task = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| anyhow::anyhow!("batch semaphore closed: {}", e))?;
                coordinator
                    .publish_with_report(id)
                    .await
                    .map_err(anyhow::Error::from)
            });

            tasks.push((id, task));
        }

        let mut result = BatchPublishResult::default();

        for (id, task) in tasks {
            match task.await {
                Ok(Ok(report)) => {
                    result.succeeded.insert(id, report);
                }
                Ok(Err(e)) => {
                    tracing::warn!(artifact_id = %id, error = %e, "publish failed");
                    result.failed.insert(id, e.to_string());
                }
                Err(e) => {
                    tracing::warn!(artifact_id = %id, error = %e, "publish task failed");
                    result.failed.insert(id, format!("Task failed: {}", e));
                }
            }
        }

        Ok(result)
    }
}
