//! Local file cleanup after a successful publish

use crate::core::traits::{Artifact, CleanupAgent};
use anyhow::Context;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;
use walkdir::WalkDir;

/// Deletes an artifact's content directory and archive from local disk
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCleanupAgent;

impl FsCleanupAgent {
    pub fn new() -> Self {
        Self
    }

    /// Number of regular files under `dir`
    fn count_files(dir: &Path) -> usize {
        WalkDir::new(dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .count()
    }
}

#[async_trait]
impl CleanupAgent for FsCleanupAgent {
    async fn delete_files(&self, artifact: &Artifact) -> anyhow::Result<()> {
        let local_path = artifact.local_path.clone();
        let files = tokio::task::spawn_blocking(move || Self::count_files(&local_path))
            .await
            .unwrap_or(0);

        match tokio::fs::remove_dir_all(&artifact.local_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to remove {}", artifact.local_path.display())
                });
            }
        }

        match tokio::fs::remove_file(&artifact.archive_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to remove {}", artifact.archive_path.display())
                });
            }
        }

        tracing::info!(artifact_id = %artifact.id, files, "local files deleted");
        Ok(())
    }
}
