//! Thread-safe, incrementally filled result buffer
//!
//! A [`CallResult`] drains a [`ResultStream`] into memory exactly once while
//! serving range reads concurrently. Readers asking for rows that have not
//! been produced yet wait until they exist, the stream is fully drained, or
//! the wait times out.
//!
//! Ranges follow slice conventions with sign based addressing from the end:
//! `-1` is one past the last row, so `rows(0, -1)` returns everything and
//! `rows(-3, -1)` returns the last two rows.

use crate::config::{DEFAULT_ROWS_POLL_INTERVAL_MS, DEFAULT_ROWS_TIMEOUT_MS};
use querydeck_core::{
    DataError, FormatOptions, Formatter, Header, Meta, Result, ResultStream, Row,
};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Default)]
struct ResultState {
    header: Header,
    meta: Meta,
    rows: Vec<Row>,
    /// A stream was attached and has not failed
    is_filled: bool,
    /// No more rows will arrive
    is_drained: bool,
}

/// In-memory, incrementally filled buffer of a call's rows
pub struct CallResult {
    /// Held for the whole drain so only one stream fills the buffer at a time
    fill_lock: Mutex<()>,
    state: RwLock<ResultState>,
    poll_interval: Duration,
    wait_timeout: Duration,
}

impl Default for CallResult {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_ROWS_POLL_INTERVAL_MS),
            Duration::from_millis(DEFAULT_ROWS_TIMEOUT_MS),
        )
    }
}

impl CallResult {
    pub fn new(poll_interval: Duration, wait_timeout: Duration) -> Self {
        Self {
            fill_lock: Mutex::new(()),
            state: RwLock::new(ResultState::default()),
            poll_interval,
            wait_timeout,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ResultState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ResultState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drain `stream` into the buffer.
    ///
    /// Header and metadata are captured before the first row is read, then
    /// `on_fill_start` runs and rows are appended one by one. The stream is
    /// closed on every exit path. On a stream error the rows read so far stay
    /// visible but the result no longer counts as filled.
    pub async fn set_stream<F>(
        &self,
        mut stream: Box<dyn ResultStream>,
        on_fill_start: F,
    ) -> Result<()>
    where
        F: FnOnce() + Send,
    {
        let _fill = self.fill_lock.lock().await;

        *self.write() = ResultState {
            header: stream.header(),
            meta: stream.meta(),
            rows: Vec::new(),
            is_filled: true,
            is_drained: false,
        };

        on_fill_start();

        let outcome = self.drain(stream.as_mut()).await;
        stream.close().await;

        let mut state = self.write();
        state.is_drained = true;
        match outcome {
            Ok(count) => {
                debug!("Result drained: {} rows", count);
                Ok(())
            }
            Err(e) => {
                warn!("Result drain failed after {} rows: {}", state.rows.len(), e);
                state.is_filled = false;
                Err(e)
            }
        }
    }

    async fn drain(&self, stream: &mut dyn ResultStream) -> Result<usize> {
        let mut count = 0;
        while let Some(row) = stream.next().await? {
            self.write().rows.push(row);
            count += 1;
        }
        Ok(count)
    }

    /// Mark the buffer as complete without attaching a stream, so readers of
    /// a call that never produced rows stop waiting.
    pub(crate) fn finish_empty(&self) {
        let mut state = self.write();
        state.is_drained = true;
    }

    /// Rows in `[from, to)`, waiting for them if the stream is still draining
    pub async fn rows(&self, from: i64, to: i64) -> Result<Vec<Row>> {
        self.rows_from(from, to).await.map(|(_, rows)| rows)
    }

    /// Like [`rows`](Self::rows), also returning the absolute start index
    async fn rows_from(&self, from: i64, to: i64) -> Result<(usize, Vec<Row>)> {
        validate_range(from, to)?;

        let deadline = Instant::now() + self.wait_timeout;
        loop {
            {
                let state = self.read();
                if let Some((start, end)) =
                    resolve_range(from, to, state.rows.len(), state.is_drained)
                {
                    return Ok((start, state.rows[start..end].to_vec()));
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(DataError::timeout(
                    format!("waiting for rows {}..{}", from, to),
                    self.wait_timeout,
                ));
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    /// Format a range of rows with the given formatter
    pub async fn format(&self, formatter: &dyn Formatter, from: i64, to: i64) -> Result<Vec<u8>> {
        let (chunk_start, rows) = self.rows_from(from, to).await?;
        let (header, meta) = {
            let state = self.read();
            (state.header.clone(), state.meta.clone())
        };

        let options = FormatOptions {
            schema_type: meta.schema_type,
            chunk_start,
        };
        formatter.format(&header, &rows, &options)
    }

    /// Number of rows produced so far
    pub fn len(&self) -> usize {
        self.read().rows.len()
    }

    pub fn header(&self) -> Header {
        self.read().header.clone()
    }

    pub fn meta(&self) -> Meta {
        self.read().meta.clone()
    }

    /// True when no stream filled this buffer successfully. A query that
    /// returned zero rows is not empty in this sense.
    pub fn is_empty(&self) -> bool {
        !self.read().is_filled
    }

    /// True once no further rows will be appended
    pub fn is_drained(&self) -> bool {
        self.read().is_drained
    }

    /// Reset the buffer for re-use, waiting for a running drain to finish
    pub async fn wipe(&self) {
        let _fill = self.fill_lock.lock().await;
        *self.write() = ResultState::default();
    }
}

fn validate_range(from: i64, to: i64) -> Result<()> {
    let valid = match (from >= 0, to >= 0) {
        (true, true) | (false, false) => from <= to,
        // from an offset to a position counted from the end
        (true, false) => true,
        (false, true) => false,
    };

    if valid {
        Ok(())
    } else {
        Err(DataError::InvalidRange { from, to })
    }
}

/// Resolve a validated range against the current length. `None` means more
/// rows are needed before the range can be served.
fn resolve_range(from: i64, to: i64, len: usize, drained: bool) -> Option<(usize, usize)> {
    let len_i = len as i64;

    if to >= 0 {
        if !drained && len_i < to {
            return None;
        }
        let start = from.min(len_i) as usize;
        let end = to.min(len_i) as usize;
        return Some((start, end));
    }

    // the end is only known once the stream is drained
    if !drained {
        return None;
    }

    let absolute = |i: i64| -> usize {
        let idx = if i < 0 { len_i + i + 1 } else { i };
        idx.clamp(0, len_i) as usize
    };
    let end = absolute(to);
    let start = absolute(from).min(end);
    Some((start, end))
}
