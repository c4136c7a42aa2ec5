//! Core types and collaborator traits for publishing
//!
//! This module defines the artifact data model and the seams the publish
//! pipeline talks through: the artifact store, the object storage sync
//! primitive, the SFTP client, and the best-effort cleanup and
//! notification collaborators.

use crate::core::error::{RepositoryError, SyncError, TransferError};
use crate::security::credentials::SftpCredentials;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ============================================================================
// Artifacts
// ============================================================================

/// Identifier of a generated document collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(pub u64);

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ArtifactId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ArtifactId)
    }
}

/// Generation lifecycle of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationState {
    Generating,
    Ready,
}

/// A generated document collection: a content directory plus its archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: ArtifactId,
    /// Human-readable label, used in error messages
    pub name: String,
    pub local_path: PathBuf,
    pub archive_path: PathBuf,
    pub generation_state: GenerationState,
    /// Set once both destinations hold the artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl Artifact {
    pub fn is_ready(&self) -> bool {
        self.generation_state == GenerationState::Ready
    }

    pub fn is_published(&self) -> bool {
        self.uploaded_at.is_some()
    }

    /// Record the upload time.
    ///
    /// The first recorded time wins; returns `false` if the artifact was
    /// already marked as uploaded.
    pub fn mark_uploaded(&mut self, at: DateTime<Utc>) -> bool {
        if self.uploaded_at.is_some() {
            return false;
        }
        self.uploaded_at = Some(at);
        true
    }
}

/// A recipient waiting to hear that an artifact was published
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSubscription {
    pub artifact_id: ArtifactId,
    pub email: String,
}

// ============================================================================
// Artifact store
// ============================================================================

/// Resolves artifacts and persists their state changes
#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    /// Load an artifact, failing with [`RepositoryError::NotFound`] if absent
    async fn find(&self, id: ArtifactId) -> Result<Artifact, RepositoryError>;

    /// Persist the artifact, replacing any stored record with the same id
    async fn save(&self, artifact: &Artifact) -> Result<(), RepositoryError>;
}

// ============================================================================
// Object storage
// ============================================================================

/// One mirrored sync of a local directory into a bucket prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    /// Local directory, always ending with a separator so that its contents
    /// land directly under `prefix`
    pub source_dir: String,
    pub bucket: String,
    /// Remote prefix, always ending with `/`
    pub prefix: String,
    /// Remove remote objects that no longer exist locally
    pub delete_removed: bool,
    pub preserve_attributes: bool,
    /// Storage class hint, ignored by backends without one
    pub reduced_redundancy: bool,
    pub public_read: bool,
}

impl SyncRequest {
    /// Mirrored sync with the publishing defaults
    pub fn mirror(source_dir: String, bucket: &str, prefix: String) -> Self {
        Self {
            source_dir,
            bucket: bucket.to_string(),
            prefix,
            delete_removed: true,
            preserve_attributes: false,
            reduced_redundancy: true,
            public_read: true,
        }
    }

    pub fn destination_uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.prefix)
    }
}

/// The external operation that performs one mirrored sync
///
/// Implementations run the sync exactly once per call; retrying is the
/// caller's business.
#[async_trait]
pub trait SyncPrimitive: Send + Sync {
    async fn sync(&self, request: &SyncRequest) -> Result<(), SyncError>;
}

// ============================================================================
// SFTP
// ============================================================================

/// Opens authenticated sessions against the file host
#[async_trait]
pub trait SftpConnector: Send + Sync {
    async fn connect(
        &self,
        credentials: &SftpCredentials,
    ) -> Result<Box<dyn SftpSession>, TransferError>;
}

/// An open, authenticated SFTP session
#[async_trait]
pub trait SftpSession: Send + Sync {
    /// Write `local` to `remote`, overwriting any existing remote file
    async fn upload(&self, local: &Path, remote: &str) -> Result<(), TransferError>;

    /// Close the session. Never fails; teardown problems are only logged.
    async fn disconnect(&self);
}

// ============================================================================
// Best-effort collaborators
// ============================================================================

/// Removes local artifact files once they are safely remoted
#[async_trait]
pub trait CleanupAgent: Send + Sync {
    async fn delete_files(&self, artifact: &Artifact) -> anyhow::Result<()>;
}

/// Tells subscribers an artifact has been published
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Pending recipient addresses, in subscription order
    async fn subscriptions_for(&self, artifact: &Artifact) -> anyhow::Result<Vec<String>>;

    async fn send(&self, artifact: &Artifact, recipients: &[String]) -> anyhow::Result<()>;

    async fn clear_subscriptions(&self, artifact: &Artifact) -> anyhow::Result<()>;
}
