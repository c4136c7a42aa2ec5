//! JSON file artifact store
//!
//! Holds artifacts and their pending notification subscriptions in one JSON
//! document. The file is re-read on every operation so records written by
//! the generating process are picked up, and every write goes through a
//! temp file and a rename.

use crate::core::error::RepositoryError;
use crate::core::traits::{Artifact, ArtifactId, ArtifactRepository, NotificationSubscription};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

/// On-disk layout of the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub artifacts: Vec<Artifact>,

    #[serde(default)]
    pub subscriptions: Vec<NotificationSubscription>,
}

/// Artifact store backed by a JSON file
#[derive(Debug)]
pub struct JsonArtifactStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl JsonArtifactStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All artifacts, in file order
    pub async fn list(&self) -> Result<Vec<Artifact>, RepositoryError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.artifacts)
    }

    /// Insert or replace an artifact record
    pub async fn insert(&self, artifact: Artifact) -> Result<(), RepositoryError> {
        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;

        match data.artifacts.iter_mut().find(|a| a.id == artifact.id) {
            Some(existing) => *existing = artifact,
            None => data.artifacts.push(artifact),
        }

        self.write(&data).await
    }

    /// Subscribe `email` to the publish of `artifact_id`
    pub async fn add_subscription(
        &self,
        artifact_id: ArtifactId,
        email: impl Into<String>,
    ) -> Result<(), RepositoryError> {
        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;

        data.subscriptions.push(NotificationSubscription {
            artifact_id,
            email: email.into(),
        });

        self.write(&data).await
    }

    /// Pending recipients for `artifact_id`, in subscription order
    pub async fn subscriptions_for(
        &self,
        artifact_id: ArtifactId,
    ) -> Result<Vec<String>, RepositoryError> {
        let _guard = self.lock.lock().await;
        let data = self.load().await?;

        Ok(data
            .subscriptions
            .into_iter()
            .filter(|s| s.artifact_id == artifact_id)
            .map(|s| s.email)
            .collect())
    }

    /// Delete every subscription of `artifact_id`, returning how many there were
    pub async fn clear_subscriptions(
        &self,
        artifact_id: ArtifactId,
    ) -> Result<usize, RepositoryError> {
        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;

        let before = data.subscriptions.len();
        data.subscriptions.retain(|s| s.artifact_id != artifact_id);
        let removed = before - data.subscriptions.len();

        if removed > 0 {
            self.write(&data).await?;
        }
        Ok(removed)
    }

    async fn load(&self) -> Result<StoreData, RepositoryError> {
        if !fs::try_exists(&self.path).await? {
            return Ok(StoreData::default());
        }

        let content = fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(StoreData::default());
        }

        Ok(serde_json::from_str(&content)?)
    }

    /// Save data to file (atomic operation)
    async fn write(&self, data: &StoreData) -> Result<(), RepositoryError> {
        let json = serde_json::to_string_pretty(data)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        // Atomic write: write to temp file, then rename
        let temp_file = self.path.with_extension("json.tmp");
        fs::write(&temp_file, json).await?;
        fs::rename(&temp_file, &self.path).await?;

        Ok(())
    }
}

#[async_trait]
impl ArtifactRepository for JsonArtifactStore {
    async fn find(&self, id: ArtifactId) -> Result<Artifact, RepositoryError> {
        let _guard = self.lock.lock().await;

        self.load()
            .await?
            .artifacts
            .into_iter()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn save(&self, artifact: &Artifact) -> Result<(), RepositoryError> {
        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;

        let existing = data
            .artifacts
            .iter_mut()
            .find(|a| a.id == artifact.id)
            .ok_or(RepositoryError::NotFound(artifact.id))?;
        *existing = artifact.clone();

        self.write(&data).await
    }
}
