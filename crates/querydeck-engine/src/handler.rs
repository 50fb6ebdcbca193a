//! Connection and call bookkeeping for a front-end
//!
//! The handler is the single owner of connections. It indexes every call by
//! id, forwards state changes to an [`EventSink`], persists each
//! connection's call history on terminal transitions and restores that
//! history, as cold calls, when the connection is created again.

use crate::call::{Call, CallRecord, CallState, OnEvent};
use crate::call_log::CallLog;
use crate::config::EngineConfig;
use crate::connection::Connection;
use querydeck_core::{
    ConnectionParams, DataError, DriverRegistry, Formatter, Result, Structure,
};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// Receives call state changes, e.g. to refresh an editor view
pub trait EventSink: Send + Sync {
    fn call_state_changed(&self, connection_id: &str, state: CallState, call: &Call);
}

struct ConnectionEntry {
    connection: Arc<Connection>,
    /// Oldest first
    calls: Vec<Arc<Call>>,
}

struct HandlerState {
    config: Arc<EngineConfig>,
    call_log: CallLog,
    connections: RwLock<HashMap<String, ConnectionEntry>>,
    /// call id -> connection id
    call_index: RwLock<HashMap<String, String>>,
    /// Serializes call log writes so the newest snapshot lands last
    log_lock: Mutex<()>,
}

impl HandlerState {
    async fn persist_call_log(&self, connection_id: &str) {
        let _guard = self.log_lock.lock().await;

        let records: Vec<CallRecord> = match self.connections.read().await.get(connection_id) {
            Some(entry) => entry.calls.iter().map(|call| call.to_record()).collect(),
            None => return,
        };

        if let Err(e) = self.call_log.save(connection_id, &records).await {
            error!(
                "Failed to save call log for connection {}: {}",
                connection_id, e
            );
        }
    }
}

/// Owner of connections and their calls
pub struct Handler {
    state: Arc<HandlerState>,
    registry: Arc<DriverRegistry>,
    formatters: HashMap<String, Arc<dyn Formatter>>,
    sink: Option<Arc<dyn EventSink>>,
}

impl Handler {
    pub fn new(config: Arc<EngineConfig>, registry: Arc<DriverRegistry>) -> Self {
        let call_log = CallLog::new(config.call_log_dir());
        Self {
            state: Arc::new(HandlerState {
                config,
                call_log,
                connections: RwLock::new(HashMap::new()),
                call_index: RwLock::new(HashMap::new()),
                log_lock: Mutex::new(()),
            }),
            registry,
            formatters: HashMap::new(),
            sink: None,
        }
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_formatter(mut self, name: impl Into<String>, formatter: Arc<dyn Formatter>) -> Self {
        self.formatters.insert(name.into(), formatter);
        self
    }

    pub fn config(&self) -> &Arc<EngineConfig> {
        &self.state.config
    }

    fn on_event(&self, connection_id: &str) -> OnEvent {
        let state: Weak<HandlerState> = Arc::downgrade(&self.state);
        let sink = self.sink.clone();
        let connection_id = connection_id.to_string();

        Arc::new(move |call_state: CallState, call: &Call| {
            if let Some(sink) = &sink {
                sink.call_state_changed(&connection_id, call_state, call);
            }

            if !call_state.is_terminal() {
                return;
            }
            let (Some(state), Ok(runtime)) =
                (state.upgrade(), tokio::runtime::Handle::try_current())
            else {
                return;
            };
            let connection_id = connection_id.clone();
            runtime.spawn(async move { state.persist_call_log(&connection_id).await });
        })
    }

    /// Open a connection and restore its call history. Returns its id.
    pub async fn create_connection(&self, params: ConnectionParams) -> Result<String> {
        let connection =
            Connection::connect(&self.registry, params, self.state.config.clone()).await?;
        let connection_id = connection.id().to_string();
        self.add_connection(connection).await?;
        Ok(connection_id)
    }

    /// Register an already built connection and restore its call history
    pub async fn add_connection(&self, connection: Connection) -> Result<()> {
        let connection_id = connection.id().to_string();

        let records = self.state.call_log.load(&connection_id).await.unwrap_or_else(|e| {
            warn!(
                "Ignoring unreadable call log of connection {}: {}",
                connection_id, e
            );
            Vec::new()
        });
        let on_event = self.on_event(&connection_id);
        let calls: Vec<Arc<Call>> = records
            .into_iter()
            .filter_map(|record| {
                let call_id = record.id.clone();
                match Call::from_record(record, &self.state.config, Some(on_event.clone())) {
                    Ok(call) => Some(call),
                    Err(e) => {
                        warn!(
                            "Skipping call {:?} of connection {}: {}",
                            call_id, connection_id, e
                        );
                        None
                    }
                }
            })
            .collect();
        debug!(
            "Restored {} calls for connection {}",
            calls.len(),
            connection_id
        );

        {
            let mut index = self.state.call_index.write().await;
            for call in &calls {
                index.insert(call.id().to_string(), connection_id.clone());
            }
        }

        let replaced = self.state.connections.write().await.insert(
            connection_id.clone(),
            ConnectionEntry {
                connection: Arc::new(connection),
                calls,
            },
        );
        if let Some(old) = replaced {
            warn!("Replacing existing connection {}", connection_id);
            old.connection.close().await;
        }

        info!("Added connection {}", connection_id);
        Ok(())
    }

    pub async fn connections(&self) -> Vec<Arc<Connection>> {
        self.state
            .connections
            .read()
            .await
            .values()
            .map(|entry| entry.connection.clone())
            .collect()
    }

    pub async fn connection(&self, connection_id: &str) -> Result<Arc<Connection>> {
        self.state
            .connections
            .read()
            .await
            .get(connection_id)
            .map(|entry| entry.connection.clone())
            .ok_or_else(|| DataError::not_found(format!("connection {}", connection_id)))
    }

    /// Persist the call history, close the driver and forget the connection
    pub async fn remove_connection(&self, connection_id: &str) -> Result<()> {
        self.state.persist_call_log(connection_id).await;

        let entry = self
            .state
            .connections
            .write()
            .await
            .remove(connection_id)
            .ok_or_else(|| DataError::not_found(format!("connection {}", connection_id)))?;

        {
            let mut index = self.state.call_index.write().await;
            for call in &entry.calls {
                index.remove(call.id());
            }
        }

        entry.connection.close().await;
        info!("Removed connection {}", connection_id);
        Ok(())
    }

    /// Start a query on a connection
    pub async fn connection_execute(&self, connection_id: &str, query: &str) -> Result<Arc<Call>> {
        let on_event = self.on_event(connection_id);

        let call = {
            let mut connections = self.state.connections.write().await;
            let entry = connections
                .get_mut(connection_id)
                .ok_or_else(|| DataError::not_found(format!("connection {}", connection_id)))?;

            let call = entry.connection.execute(query, Some(on_event));
            entry.calls.push(call.clone());
            call
        };

        self.state
            .call_index
            .write()
            .await
            .insert(call.id().to_string(), connection_id.to_string());
        Ok(call)
    }

    /// Calls of a connection, oldest first
    pub async fn connection_calls(&self, connection_id: &str) -> Result<Vec<Arc<Call>>> {
        self.state
            .connections
            .read()
            .await
            .get(connection_id)
            .map(|entry| entry.calls.clone())
            .ok_or_else(|| DataError::not_found(format!("connection {}", connection_id)))
    }

    pub async fn connection_structure(&self, connection_id: &str) -> Result<Vec<Structure>> {
        self.connection(connection_id).await?.get_structure().await
    }

    pub async fn connection_select_database(&self, connection_id: &str, name: &str) -> Result<()> {
        self.connection(connection_id)
            .await?
            .select_database(name)
            .await
    }

    pub async fn connection_list_databases(
        &self,
        connection_id: &str,
    ) -> Result<(String, Vec<String>)> {
        self.connection(connection_id).await?.list_databases().await
    }

    pub async fn call(&self, call_id: &str) -> Result<Arc<Call>> {
        let connection_id = self
            .state
            .call_index
            .read()
            .await
            .get(call_id)
            .cloned()
            .ok_or_else(|| DataError::not_found(format!("call {}", call_id)))?;

        self.state
            .connections
            .read()
            .await
            .get(&connection_id)
            .and_then(|entry| entry.calls.iter().find(|call| call.id() == call_id).cloned())
            .ok_or_else(|| DataError::not_found(format!("call {}", call_id)))
    }

    pub async fn call_cancel(&self, call_id: &str) -> Result<()> {
        self.call(call_id).await?.cancel();
        Ok(())
    }

    /// Format rows `[from, to)` of a call's result and write them out
    pub async fn call_store_result<W>(
        &self,
        call_id: &str,
        format: &str,
        from: i64,
        to: i64,
        writer: &mut W,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let formatter = self
            .formatters
            .get(format)
            .cloned()
            .ok_or_else(|| DataError::not_found(format!("formatter {}", format)))?;

        let result = self.call(call_id).await?.get_result().await?;
        let bytes = result.format(formatter.as_ref(), from, to).await?;

        writer.write_all(&bytes).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Forget a call and delete its archive. The call's background task is
    /// allowed to finish first so its archive is not written after removal.
    pub async fn call_purge(&self, call_id: &str) -> Result<()> {
        let call = self.call(call_id).await?;
        call.cancel();
        call.finished().await;

        let connection_id = self.state.call_index.write().await.remove(call_id);
        if let Some(connection_id) = &connection_id {
            if let Some(entry) = self.state.connections.write().await.get_mut(connection_id) {
                entry.calls.retain(|c| c.id() != call_id);
            }
        }

        call.archive().remove().await?;
        if let Some(connection_id) = connection_id {
            self.state.persist_call_log(&connection_id).await;
        }

        info!("Purged call {}", call_id);
        Ok(())
    }

    /// Persist every call log and close all connections
    pub async fn close(&self) {
        let ids: Vec<String> = self.state.connections.read().await.keys().cloned().collect();
        for id in ids {
            if let Err(e) = self.remove_connection(&id).await {
                warn!("Failed to close connection {}: {}", id, e);
            }
        }
    }
}
