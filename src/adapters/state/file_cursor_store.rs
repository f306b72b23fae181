//! JSON-file backed poll cursor.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::errors::{AdapterError, AdapterResult};
use crate::domain::ports::CursorStore;

/// On-disk shape of the last-run record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastRun {
    #[serde(default)]
    pub max_alert_id: u64,
}

/// Stores `{"max_alert_id": N}` in a file.
///
/// A missing file reads as cursor 0. Writes go to a sibling temp file
/// that is then renamed over the target.
#[derive(Debug, Clone)]
pub struct FileCursorStore {
    path: PathBuf,
}

impl FileCursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CursorStore for FileCursorStore {
    async fn load(&self) -> AdapterResult<u64> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(AdapterError::State(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };

        if raw.trim().is_empty() {
            return Ok(0);
        }

        let last_run: LastRun = serde_json::from_str(&raw).map_err(|e| {
            AdapterError::State(format!("corrupt cursor file {}: {e}", self.path.display()))
        })?;
        debug!(cursor = last_run.max_alert_id, path = %self.path.display(), "loaded poll cursor");
        Ok(last_run.max_alert_id)
    }

    async fn save(&self, cursor: u64) -> AdapterResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AdapterError::State(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let body = serde_json::to_vec(&LastRun {
            max_alert_id: cursor,
        })?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| AdapterError::State(format!("failed to write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            AdapterError::State(format!("failed to replace {}: {e}", self.path.display()))
        })?;

        debug!(cursor, path = %self.path.display(), "saved poll cursor");
        Ok(())
    }
}
