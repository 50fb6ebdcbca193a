//! # querydeck-core
//!
//! Contracts shared by the querydeck engine and the database adapters.
//!
//! The engine never talks to a database directly. Each backend (SQL,
//! document, key-value, columnar, cloud warehouse) is wrapped in an adapter
//! implementing a small set of traits:
//!
//! - **Driver**: executes a query and hands back a result stream, lists the
//!   schema structure and closes the connection
//! - **DatabaseSwitcher**: optional capability for backends with several
//!   databases per connection
//! - **ResultStream**: pull-based single pass iterator over rows
//! - **Formatter**: renders rows into bytes (table, CSV, JSON)
//!
//! Adapters are registered with a [`DriverRegistry`] that is built once at
//! startup and passed explicitly to whoever opens connections.
//!
//! ## Example
//!
//! ```rust
//! use querydeck_core::{ConnectionParams, DriverRegistry};
//!
//! # async fn example() -> querydeck_core::Result<()> {
//! let registry = DriverRegistry::new();
//! // registry.register(Arc::new(PostgresFactory)).await;
//!
//! let params = ConnectionParams::new("postgres", r#"postgres://app:{{ env "PGPASS" }}@localhost/db"#)
//!     .with_name("local");
//! let expanded = params.expand()?;
//!
//! if registry.has_type(&expanded.driver_type).await {
//!     let _driver = registry.connect(&expanded.driver_type, &expanded.url).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod params;
pub mod registry;
pub mod stream;
pub mod traits;
pub mod types;

// Re-export commonly used items
pub use error::{DataError, Result};
pub use params::ConnectionParams;
pub use registry::{DriverFactory, DriverRegistry};
pub use stream::{ChannelStream, RowSender, VecStream};
pub use traits::{DatabaseSwitcher, Driver, Formatter, ResultStream};
pub use types::{
    FormatOptions, Header, Meta, Row, SchemaType, Structure, StructureType, Value,
};
