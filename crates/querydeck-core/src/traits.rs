use crate::error::Result;
use crate::types::*;
use async_trait::async_trait;
use downcast_rs::{impl_downcast, Downcast};
use tokio_util::sync::CancellationToken;

/// Pull-based, single pass iterator over the rows of one query
///
/// Header and metadata are available before the first row is pulled and
/// never change afterwards.
#[async_trait]
pub trait ResultStream: Send {
    /// Metadata describing the shape of the rows
    fn meta(&self) -> Meta;

    /// Column names
    fn header(&self) -> Header;

    /// Pull the next row. `Ok(None)` means the stream is exhausted.
    async fn next(&mut self) -> Result<Option<Row>>;

    /// Release the underlying cursor/connection resources
    async fn close(&mut self);
}

/// Core trait that every database adapter implements
#[async_trait]
pub trait Driver: Send + Sync + Downcast {
    /// Start executing a query and return its result stream.
    /// Implementations are expected to abort when `cancel` fires.
    async fn query(&self, cancel: CancellationToken, query: &str)
        -> Result<Box<dyn ResultStream>>;

    /// Schema/table/view tree for display
    async fn structure(&self) -> Result<Vec<Structure>>;

    /// Close the connection gracefully
    async fn close(&self);

    /// Database switching capability, if the backend has one
    fn as_database_switcher(&self) -> Option<&dyn DatabaseSwitcher> {
        None
    }
}

impl_downcast!(Driver);

/// Optional capability for backends hosting several databases per connection
#[async_trait]
pub trait DatabaseSwitcher: Send + Sync {
    /// Make `name` the active database for subsequent queries
    async fn select_database(&self, name: &str) -> Result<()>;

    /// Returns the current database and all available ones
    async fn list_databases(&self) -> Result<(String, Vec<String>)>;
}

/// Renders a slice of rows into bytes (table, CSV, JSON, ...)
pub trait Formatter: Send + Sync {
    fn format(&self, header: &[String], rows: &[Row], options: &FormatOptions) -> Result<Vec<u8>>;
}
