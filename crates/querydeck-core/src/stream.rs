//! Reusable `ResultStream` implementations
//!
//! - [`VecStream`] serves rows that are already in memory.
//! - [`ChannelStream`] decouples a producer task from consumption through a
//!   bounded channel. The producer sends rows (or an error) and drops its
//!   sender when done; the consumer gives up when no item arrives within the
//!   per-item timeout.

use crate::error::{DataError, Result};
use crate::traits::ResultStream;
use crate::types::{Header, Meta, Row};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc;

/// In-memory result stream
pub struct VecStream {
    header: Header,
    meta: Meta,
    rows: VecDeque<Row>,
}

impl VecStream {
    pub fn new(header: Header, meta: Meta, rows: Vec<Row>) -> Self {
        Self {
            header,
            meta,
            rows: rows.into(),
        }
    }
}

#[async_trait]
impl ResultStream for VecStream {
    fn meta(&self) -> Meta {
        self.meta.clone()
    }

    fn header(&self) -> Header {
        self.header.clone()
    }

    async fn next(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.pop_front())
    }

    async fn close(&mut self) {
        self.rows.clear();
    }
}

/// Sending half handed to the producer of a [`ChannelStream`]
pub type RowSender = mpsc::Sender<Result<Row>>;

/// Result stream fed by a background producer over a bounded channel
pub struct ChannelStream {
    header: Header,
    meta: Meta,
    receiver: mpsc::Receiver<Result<Row>>,
    item_timeout: Duration,
    finished: bool,
}

impl ChannelStream {
    /// Create a stream and the sender its producer writes into
    pub fn channel(
        header: Header,
        meta: Meta,
        capacity: usize,
        item_timeout: Duration,
    ) -> (RowSender, Self) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let stream = Self {
            header,
            meta,
            receiver,
            item_timeout,
            finished: false,
        };
        (sender, stream)
    }
}

#[async_trait]
impl ResultStream for ChannelStream {
    fn meta(&self) -> Meta {
        self.meta.clone()
    }

    fn header(&self) -> Header {
        self.header.clone()
    }

    async fn next(&mut self) -> Result<Option<Row>> {
        if self.finished {
            return Ok(None);
        }

        match tokio::time::timeout(self.item_timeout, self.receiver.recv()).await {
            Ok(Some(Ok(row))) => Ok(Some(row)),
            Ok(Some(Err(e))) => {
                self.finished = true;
                Err(e)
            }
            Ok(None) => {
                self.finished = true;
                Ok(None)
            }
            Err(_) => {
                self.finished = true;
                Err(DataError::timeout(
                    "waiting for next row from producer",
                    self.item_timeout,
                ))
            }
        }
    }

    async fn close(&mut self) {
        self.finished = true;
        // unblock the producer, then discard whatever it already queued
        self.receiver.close();
        while self.receiver.try_recv().is_ok() {}
    }
}
