//! Last-good pattern snapshot
//! Remote pattern rows are persisted locally (MessagePack) so a later remote outage
//! can still be served with real data before resorting to the hardcoded fallback.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::loader::{IntentPatternRow, PatternScope};
use crate::error::{AsoError, AsoResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SnapshotFile {
    entries: BTreeMap<String, SnapshotEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotEntry {
    saved_at: DateTime<Utc>,
    rows: Vec<IntentPatternRow>,
}

/// Snapshot file manager
pub struct PatternSnapshotStore {
    path: PathBuf,
}

impl PatternSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> AsoResult<SnapshotFile> {
        if !self.path.exists() {
            return Ok(SnapshotFile::default());
        }
        let data = tokio::fs::read(&self.path).await?;
        rmp_serde::from_slice(&data)
            .map_err(|e| AsoError::MsgPackError(format!("Snapshot decode failed: {}", e)))
    }

    /// Rows saved for `scope`, if any
    pub async fn load(&self, scope: &PatternScope) -> AsoResult<Option<Vec<IntentPatternRow>>> {
        let file = self.read_file().await?;
        let entry = file.entries.get(&scope.cache_key());
        if let Some(entry) = entry {
            debug!(
                "Loaded pattern snapshot for [{}]: {} rows saved at {}",
                scope.cache_key(),
                entry.rows.len(),
                entry.saved_at
            );
        }
        Ok(entry.map(|e| e.rows.clone()))
    }

    /// Replace the rows saved for `scope`
    pub async fn save(&self, scope: &PatternScope, rows: &[IntentPatternRow]) -> AsoResult<()> {
        // An unreadable snapshot is replaced rather than blocking the save
        let mut file = self.read_file().await.unwrap_or_default();
        file.entries.insert(
            scope.cache_key(),
            SnapshotEntry {
                saved_at: Utc::now(),
                rows: rows.to_vec(),
            },
        );

        let data = rmp_serde::to_vec_named(&file)
            .map_err(|e| AsoError::MsgPackError(format!("Snapshot encode failed: {}", e)))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, &data).await?;
        debug!("Pattern snapshot written: {} bytes", data.len());
        Ok(())
    }

    pub async fn clear(&self) -> AsoResult<()> {
        if self.path.exists() {
            tokio::fs::remove_file(&self.path).await?;
        }
        Ok(())
    }
}
