//! # querydeck-engine
//!
//! Executes queries through a [`querydeck_core::Driver`], buffers their rows
//! incrementally and archives complete results to disk.
//!
//! - **Connection**: a driver bound to its (expanded) connection parameters
//! - **Call**: one execution of a query with an observable lifecycle
//! - **CallResult**: in-memory row buffer serving range reads while it fills
//! - **Archive**: chunked on-disk copy of a result, reloadable after restart
//! - **Handler**: owns connections, indexes calls and persists call history

pub mod archive;
pub mod call;
pub mod call_log;
pub mod config;
pub mod connection;
pub mod handler;
pub mod result;

pub use archive::{validate_call_id, Archive};
pub use call::{Call, CallRecord, CallState, OnEvent};
pub use call_log::CallLog;
pub use config::EngineConfig;
pub use connection::Connection;
pub use handler::{EventSink, Handler};
pub use result::CallResult;
