//! Per-connection history of calls, persisted as JSON

use crate::call::CallRecord;
use querydeck_core::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Call history store, one file per connection
#[derive(Debug, Clone)]
pub struct CallLog {
    dir: PathBuf,
}

impl CallLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, connection_id: &str) -> PathBuf {
        let file_name: String = connection_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }

    /// Records logged for a connection, oldest first. Missing log is empty.
    pub async fn load(&self, connection_id: &str) -> Result<Vec<CallRecord>> {
        let path = self.path(connection_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let records: Vec<CallRecord> = serde_json::from_slice(&bytes)?;
        debug!(
            "Loaded {} call records for connection {}",
            records.len(),
            connection_id
        );
        Ok(records)
    }

    /// Replace the log of a connection
    pub async fn save(&self, connection_id: &str, records: &[CallRecord]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path(connection_id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(records)?).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(
            "Saved {} call records for connection {}",
            records.len(),
            connection_id
        );
        Ok(())
    }

    /// Ids of every connection with a log, sorted
    pub async fn connection_ids(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub async fn remove(&self, connection_id: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path(connection_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
