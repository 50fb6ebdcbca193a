//! Durable, chunked on-disk copy of a drained result
//!
//! Layout of `<archive_dir>/<call id>/`:
//!
//! ```text
//! header.json     column names
//! meta.json       result metadata
//! row_0.json      rows [0, chunk_size)
//! row_1.json      rows [chunk_size, 2 * chunk_size)
//! ...
//! manifest.json   row and chunk counts, written last
//! ```
//!
//! The manifest is the completion marker: a directory without one is the
//! leftover of an interrupted write and is neither served nor trusted.

use crate::config::EngineConfig;
use crate::result::CallResult;
use futures::stream::{self, StreamExt, TryStreamExt};
use querydeck_core::{ChannelStream, DataError, Header, Meta, Result, ResultStream, Row};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const HEADER_FILE: &str = "header.json";
const META_FILE: &str = "meta.json";
const MANIFEST_FILE: &str = "manifest.json";

fn chunk_file(index: usize) -> String {
    format!("row_{}.json", index)
}

/// Call ids name a directory under the archive root, so they are limited to
/// ASCII letters, digits, `-` and `_`
pub fn validate_call_id(call_id: &str) -> Result<()> {
    let valid = !call_id.is_empty()
        && call_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(DataError::invalid_configuration(format!(
            "Invalid call id '{}'",
            call_id
        )));
    }
    Ok(())
}

/// Completion marker and reading plan of an archive
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
struct Manifest {
    rows: usize,
    chunks: usize,
    chunk_size: usize,
}

/// On-disk archive of one call's result
#[derive(Debug)]
pub struct Archive {
    call_id: String,
    dir: PathBuf,
    chunk_size: usize,
    parallelism: usize,
    read_timeout: Duration,
    channel_capacity: usize,
    filled: AtomicBool,
}

impl Archive {
    /// Handle for the archive of `call_id`, probing the disk for a complete copy
    pub fn new(config: &EngineConfig, call_id: &str) -> Result<Self> {
        validate_call_id(call_id)?;
        Ok(Self::open(config, call_id.to_string()))
    }

    /// Handle for a freshly generated call id
    pub(crate) fn for_call(config: &EngineConfig, call_id: Uuid) -> Self {
        Self::open(config, call_id.to_string())
    }

    fn open(config: &EngineConfig, call_id: String) -> Self {
        let dir = config.archive_dir().join(&call_id);
        let filled = dir.join(MANIFEST_FILE).is_file();

        Self {
            call_id,
            dir,
            chunk_size: config.archive_chunk_size.max(1),
            parallelism: config.archive_parallelism.max(1),
            read_timeout: config.archive_read_timeout(),
            channel_capacity: config.archive_channel_capacity,
            filled: AtomicBool::new(filled),
        }
    }

    /// True when a complete copy exists on disk
    pub fn is_filled(&self) -> bool {
        self.filled.load(Ordering::SeqCst)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a drained result. Does nothing if the archive is already complete.
    pub async fn set_result(&self, result: &CallResult) -> Result<()> {
        if self.is_filled() {
            debug!("Archive for call {} already exists", self.call_id);
            return Ok(());
        }

        if tokio::fs::try_exists(&self.dir).await? {
            warn!(
                "Removing incomplete archive for call {} at {}",
                self.call_id,
                self.dir.display()
            );
            tokio::fs::remove_dir_all(&self.dir).await?;
        }
        tokio::fs::create_dir_all(&self.dir).await?;

        write_json(&self.dir.join(HEADER_FILE), &result.header()).await?;
        write_json(&self.dir.join(META_FILE), &result.meta()).await?;

        let rows = result.rows(0, -1).await?;
        let writes: Vec<_> = rows
            .chunks(self.chunk_size)
            .enumerate()
            .map(|(index, chunk)| {
                let path = self.dir.join(chunk_file(index));
                let chunk = chunk.to_vec();
                async move { write_json(&path, &chunk).await }
            })
            .collect();
        let chunks = writes.len();

        stream::iter(writes)
            .buffer_unordered(self.parallelism)
            .try_collect::<Vec<()>>()
            .await
            .map_err(|e| {
                error!("Failed to write archive chunk for call {}: {}", self.call_id, e);
                e
            })?;

        let manifest = Manifest {
            rows: rows.len(),
            chunks,
            chunk_size: self.chunk_size,
        };
        let tmp = self.dir.join(format!("{}.tmp", MANIFEST_FILE));
        write_json(&tmp, &manifest).await?;
        tokio::fs::rename(&tmp, self.dir.join(MANIFEST_FILE)).await?;

        self.filled.store(true, Ordering::SeqCst);
        info!(
            "Archived call {}: {} rows in {} chunks",
            self.call_id, manifest.rows, manifest.chunks
        );
        Ok(())
    }

    /// Lazily stream the archived rows back, chunk by chunk
    pub async fn get_result(&self) -> Result<Box<dyn ResultStream>> {
        if !self.is_filled() {
            return Err(DataError::ArchiveNotFound(self.call_id.clone()));
        }

        let header: Header = read_json(&self.dir.join(HEADER_FILE)).await?;
        let meta: Meta = read_json(&self.dir.join(META_FILE)).await?;
        let manifest: Manifest = read_json(&self.dir.join(MANIFEST_FILE)).await?;

        let (sender, stream) =
            ChannelStream::channel(header, meta, self.channel_capacity, self.read_timeout);

        let dir = self.dir.clone();
        let call_id = self.call_id.clone();
        tokio::spawn(async move {
            let mut sent = 0;
            for index in 0..manifest.chunks {
                let rows: Vec<Row> = match read_json(&dir.join(chunk_file(index))).await {
                    Ok(rows) => rows,
                    Err(e) => {
                        error!("Failed to read archive chunk {} of call {}: {}", index, call_id, e);
                        let _ = sender.send(Err(e)).await;
                        return;
                    }
                };

                for row in rows {
                    if sender.send(Ok(row)).await.is_err() {
                        debug!("Archive reader for call {} closed early", call_id);
                        return;
                    }
                    sent += 1;
                }
            }

            if sent != manifest.rows {
                let _ = sender
                    .send(Err(DataError::SerializationError(format!(
                        "archive of call {} holds {} rows, manifest says {}",
                        call_id, sent, manifest.rows
                    ))))
                    .await;
            }
        });

        Ok(Box::new(stream))
    }

    /// Delete the archive from disk
    pub async fn remove(&self) -> Result<()> {
        self.filled.store(false, Ordering::SeqCst);
        if tokio::fs::try_exists(&self.dir).await? {
            tokio::fs::remove_dir_all(&self.dir).await?;
            debug!("Removed archive for call {}", self.call_id);
        }
        Ok(())
    }
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
