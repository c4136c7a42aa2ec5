//! Error handling for document-collection publishing
//!
//! `PublishError` is the terminal taxonomy surfaced to callers of the
//! publish pipeline. The component errors (`SyncError`, `TransferError`,
//! `RepositoryError`) are the sub-errors the retry loops and the store
//! produce; they only reach the caller wrapped inside a terminal kind.

use crate::core::traits::ArtifactId;
use crate::security::command_executor::CommandError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for publish operations
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Artifact {id} not found")]
    NotFound { id: ArtifactId },

    #[error("Artifact {id} is already being published")]
    AlreadyInProgress { id: ArtifactId },

    #[error("{name} is not generated yet")]
    NotReady { name: String },

    #[error("{name} local path doesn't exist or is empty")]
    MissingContent { name: String },

    #[error("{name} archive doesn't exist: {}", path.display())]
    MissingArchive { name: String, path: PathBuf },

    #[error("Object storage sync failed after {attempts} attempt(s): {source}")]
    SyncFailed {
        attempts: u32,
        #[source]
        source: SyncError,
    },

    #[error("Archive transfer failed after {attempts} attempt(s): {source}")]
    TransferFailed {
        attempts: u32,
        #[source]
        source: TransferError,
    },

    #[error("Failed to record {name} as published: {source}")]
    PersistFailed {
        name: String,
        #[source]
        source: RepositoryError,
    },

    #[error("Artifact store error: {0}")]
    Repository(#[source] RepositoryError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl PublishError {
    /// Check if retrying the whole pipeline later may succeed
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::NotFound { .. } | Self::ConfigError(_) | Self::Repository(_)
        )
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::NotFound { .. } => vec!["Check the artifact id against the artifact store"],
            Self::AlreadyInProgress { .. } => {
                vec!["Wait for the running publish of this artifact to finish"]
            }
            Self::NotReady { .. } => vec!["Wait for generation to complete, then publish again"],
            Self::MissingContent { .. } => vec![
                "Regenerate the document collection",
                "Check that the local path points at the generated directory",
            ],
            Self::MissingArchive { .. } => vec![
                "Regenerate the archive",
                "The bucket is already in sync; publishing again only re-uploads the archive",
            ],
            Self::SyncFailed { .. } => vec![
                "Check the object storage credentials and bucket name",
                "Check that the sync command is installed and executable",
                "Check network connectivity",
            ],
            Self::TransferFailed { .. } => vec![
                "Check the SFTP host, username and password",
                "Check network connectivity to the file host",
            ],
            Self::PersistFailed { .. } => vec![
                "Both destinations are up to date; fix the artifact store and publish again",
            ],
            Self::Repository(_) => vec!["Check that the artifact store file is readable"],
            Self::ConfigError(_) => vec!["Run `doc-publisher init` and review .doc-publisher.yaml"],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AlreadyInProgress { .. } => "ALREADY_IN_PROGRESS",
            Self::NotReady { .. } => "NOT_READY",
            Self::MissingContent { .. } => "MISSING_CONTENT",
            Self::MissingArchive { .. } => "MISSING_ARCHIVE",
            Self::SyncFailed { .. } => "SYNC_FAILED",
            Self::TransferFailed { .. } => "TRANSFER_FAILED",
            Self::PersistFailed { .. } => "PERSIST_FAILED",
            Self::Repository(_) => "REPOSITORY_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
        }
    }
}

/// Failure of a single object storage sync attempt
#[derive(Error, Debug)]
pub enum SyncError {
    /// The sync primitive ran and reported failure. Retryable.
    #[error("Sync ended with non-success status: {status}, command: {command}")]
    NonZeroStatus { status: String, command: String },

    /// The sync primitive could not be started at all
    #[error("Sync command could not be run: {0}")]
    Launch(#[from] CommandError),
}

impl SyncError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NonZeroStatus { .. })
    }
}

/// Failure while talking to the SFTP host
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("I/O error during transfer: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session disconnected: {0}")]
    Disconnected(String),

    #[error("Could not connect to {host}: {message}")]
    Connect { host: String, message: String },

    #[error("Authentication failed for user {username}")]
    Authentication { username: String },

    #[error("SFTP error: {0}")]
    Protocol(String),
}

impl TransferError {
    /// Low-level I/O failures and dropped sessions are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Disconnected(_))
    }
}

/// Failure of the artifact store
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Artifact {0} not found")]
    NotFound(ArtifactId),

    #[error("Artifact store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Artifact store is corrupted: {0}")]
    Corrupted(#[from] serde_json::Error),
}
