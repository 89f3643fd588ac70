use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::models::IndexCheckpoint;
use crate::BoardRagError;
use crate::Result;

/// JSON file holding the index high-water mark
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty checkpoint
    pub fn load(&self) -> Result<IndexCheckpoint> {
        if !self.path.exists() {
            debug!("No checkpoint at {}, starting fresh", self.path.display());
            return Ok(IndexCheckpoint::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let checkpoint = serde_json::from_str(&content)?;
        Ok(checkpoint)
    }

    /// Forget all progress; the next run starts from an empty checkpoint
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Removed checkpoint {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BoardRagError::IndexWrite(format!(
                "Failed to remove checkpoint {}: {e}",
                self.path.display()
            ))),
        }
    }

    /// Write through a temp file and rename so readers never see a torn file
    pub fn save(&self, checkpoint: &IndexCheckpoint) -> Result<()> {
        let json = serde_json::to_string_pretty(checkpoint)?;
        let tmp = self.path.with_extension("json.tmp");

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&tmp, json)
            .and_then(|()| std::fs::rename(&tmp, &self.path))
            .map_err(|e| {
                BoardRagError::IndexWrite(format!(
                    "Failed to write checkpoint {}: {e}",
                    self.path.display()
                ))
            })
    }
}
