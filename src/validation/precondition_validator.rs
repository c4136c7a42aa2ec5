//! Precondition Validator - Checks an artifact is ready to be published
//!
//! Both checks are local: nothing here touches the network, and a failing
//! artifact is reported before any destination is contacted.

use crate::core::error::PublishError;
use crate::core::traits::Artifact;
use std::path::Path;
use tokio::fs;

/// Validator for the publish preconditions of an artifact
#[derive(Debug, Clone, Copy, Default)]
pub struct PreconditionValidator;

impl PreconditionValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate that `artifact` is generated and has local content
    ///
    /// # Errors
    ///
    /// - `PublishError::NotReady` - generation has not completed
    /// - `PublishError::MissingContent` - the local directory is missing or empty
    pub async fn validate(&self, artifact: &Artifact) -> Result<(), PublishError> {
        if !artifact.is_ready() {
            return Err(PublishError::NotReady {
                name: artifact.name.clone(),
            });
        }

        if !Self::has_entries(&artifact.local_path).await {
            return Err(PublishError::MissingContent {
                name: artifact.name.clone(),
            });
        }

        tracing::debug!(artifact_id = %artifact.id, "preconditions satisfied");
        Ok(())
    }

    /// True when `dir` is a readable directory with at least one entry
    async fn has_entries(dir: &Path) -> bool {
        match fs::read_dir(dir).await {
            Ok(mut entries) => matches!(entries.next_entry().await, Ok(Some(_))),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::{ArtifactId, GenerationState};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn artifact(local_path: PathBuf, generation_state: GenerationState) -> Artifact {
        Artifact {
            id: ArtifactId(42),
            name: "Q1-Docs".to_string(),
            archive_path: local_path.with_extension("zip"),
            local_path,
            generation_state,
            uploaded_at: None,
        }
    }

    #[tokio::test]
    async fn test_ready_artifact_with_content_passes() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("index.html"), "<html></html>").unwrap();

        let result = PreconditionValidator::new()
            .validate(&artifact(temp_dir.path().to_path_buf(), GenerationState::Ready))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_generating_artifact_is_not_ready() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("index.html"), "<html></html>").unwrap();

        let result = PreconditionValidator::new()
            .validate(&artifact(
                temp_dir.path().to_path_buf(),
                GenerationState::Generating,
            ))
            .await;

        match result {
            Err(e @ PublishError::NotReady { .. }) => {
                assert_eq!(e.to_string(), "Q1-Docs is not generated yet")
            }
            other => panic!("expected NotReady, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_not_ready_wins_over_missing_content() {
        let result = PreconditionValidator::new()
            .validate(&artifact(
                PathBuf::from("/nonexistent/42"),
                GenerationState::Generating,
            ))
            .await;

        assert!(matches!(result, Err(PublishError::NotReady { .. })));
    }

    #[tokio::test]
    async fn test_missing_directory_is_missing_content() {
        let temp_dir = TempDir::new().unwrap();

        let result = PreconditionValidator::new()
            .validate(&artifact(temp_dir.path().join("42"), GenerationState::Ready))
            .await;

        assert!(matches!(result, Err(PublishError::MissingContent { .. })));
    }

    #[tokio::test]
    async fn test_empty_directory_is_missing_content() {
        let temp_dir = TempDir::new().unwrap();

        let result = PreconditionValidator::new()
            .validate(&artifact(temp_dir.path().to_path_buf(), GenerationState::Ready))
            .await;

        match result {
            Err(e @ PublishError::MissingContent { .. }) => assert_eq!(
                e.to_string(),
                "Q1-Docs local path doesn't exist or is empty"
            ),
            other => panic!("expected MissingContent, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_regular_file_is_missing_content() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("42");
        std::fs::write(&file, "not a directory").unwrap();

        let result = PreconditionValidator::new()
            .validate(&artifact(file, GenerationState::Ready))
            .await;

        assert!(matches!(result, Err(PublishError::MissingContent { .. })));
    }
}
