use crate::call::{Call, OnEvent};
use crate::config::EngineConfig;
use querydeck_core::{ConnectionParams, DataError, Driver, DriverRegistry, Result, Structure};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// A driver bound to its connection parameters
///
/// Keeps both the raw parameters (returned to callers for editing) and the
/// expanded ones (used to reach the database).
pub struct Connection {
    params: ConnectionParams,
    expanded: ConnectionParams,
    driver: Arc<dyn Driver>,
    config: Arc<EngineConfig>,
}

impl Connection {
    /// Bind an already opened driver. A blank id is replaced with a UUID.
    pub fn new(
        params: ConnectionParams,
        driver: Arc<dyn Driver>,
        config: Arc<EngineConfig>,
    ) -> Result<Self> {
        let (params, expanded) = prepare(params)?;

        Ok(Self {
            params,
            expanded,
            driver,
            config,
        })
    }

    /// Expand the parameters and open a driver through the registry
    pub async fn connect(
        registry: &DriverRegistry,
        params: ConnectionParams,
        config: Arc<EngineConfig>,
    ) -> Result<Self> {
        let (params, expanded) = prepare(params)?;

        let driver = registry
            .connect(&expanded.driver_type, &expanded.url)
            .await?;
        info!(
            "Connected {} ({}) as {}",
            expanded.name, expanded.driver_type, expanded.id
        );

        Ok(Self {
            params,
            expanded,
            driver,
            config,
        })
    }

    pub fn id(&self) -> &str {
        &self.params.id
    }

    /// Parameters as supplied, placeholders intact
    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Parameters with placeholders resolved
    pub fn expanded_params(&self) -> &ConnectionParams {
        &self.expanded
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    pub fn config(&self) -> &Arc<EngineConfig> {
        &self.config
    }

    /// Start executing `query`; the returned call is already `Executing`
    pub fn execute(&self, query: &str, on_event: Option<OnEvent>) -> Arc<Call> {
        debug!("Executing on connection {}: {}", self.id(), query);

        let driver = self.driver.clone();
        let owned = query.to_string();
        Call::from_executor(
            move |cancel| async move { driver.query(cancel, &owned).await },
            query,
            &self.config,
            on_event,
        )
    }

    /// Structure tree, never empty
    pub async fn get_structure(&self) -> Result<Vec<Structure>> {
        let structure = self.driver.structure().await?;
        if structure.is_empty() {
            return Ok(vec![Structure::no_schema()]);
        }
        Ok(structure)
    }

    pub async fn select_database(&self, name: &str) -> Result<()> {
        let switcher = self
            .driver
            .as_database_switcher()
            .ok_or(DataError::DatabaseSwitchingNotSupported)?;
        switcher.select_database(name).await
    }

    /// Returns the current database and all available ones
    pub async fn list_databases(&self) -> Result<(String, Vec<String>)> {
        let switcher = self
            .driver
            .as_database_switcher()
            .ok_or(DataError::DatabaseSwitchingNotSupported)?;
        switcher.list_databases().await
    }

    pub async fn close(&self) {
        debug!("Closing connection {}", self.id());
        self.driver.close().await;
    }
}

/// Assign an id when blank and resolve placeholders
fn prepare(mut params: ConnectionParams) -> Result<(ConnectionParams, ConnectionParams)> {
    if params.id.trim().is_empty() {
        params.id = Uuid::new_v4().to_string();
    }
    let expanded = params.expand()?;
    Ok((params, expanded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::CallState;
    use async_trait::async_trait;
    use querydeck_core::{DatabaseSwitcher, Meta, ResultStream, StructureType, VecStream};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    #[derive(Default)]
    struct EchoDriver {
        structure: Vec<Structure>,
        closed: AtomicBool,
    }

    #[async_trait]
    impl Driver for EchoDriver {
        async fn query(
            &self,
            _cancel: CancellationToken,
            query: &str,
        ) -> Result<Box<dyn ResultStream>> {
            Ok(Box::new(VecStream::new(
                vec!["query".into()],
                Meta::default(),
                vec![vec![json!(query)]],
            )))
        }

        async fn structure(&self) -> Result<Vec<Structure>> {
            Ok(self.structure.clone())
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    struct SwitchingDriver {
        current: Mutex<String>,
    }

    #[async_trait]
    impl Driver for SwitchingDriver {
        async fn query(
            &self,
            _cancel: CancellationToken,
            _query: &str,
        ) -> Result<Box<dyn ResultStream>> {
            Err(DataError::QueryFailed("not used".into()))
        }

        async fn structure(&self) -> Result<Vec<Structure>> {
            Ok(vec![])
        }

        async fn close(&self) {}

        fn as_database_switcher(&self) -> Option<&dyn DatabaseSwitcher> {
            Some(self)
        }
    }

    #[async_trait]
    impl DatabaseSwitcher for SwitchingDriver {
        async fn select_database(&self, name: &str) -> Result<()> {
            *self.current.lock().unwrap() = name.to_string();
            Ok(())
        }

        async fn list_databases(&self) -> Result<(String, Vec<String>)> {
            let current = self.current.lock().unwrap().clone();
            Ok((current, vec!["main".into(), "analytics".into()]))
        }
    }

    fn config(dir: &TempDir) -> Arc<EngineConfig> {
        Arc::new(EngineConfig::with_state_dir(dir.path()))
    }

    #[tokio::test]
    async fn test_blank_id_is_generated() {
        let dir = TempDir::new().unwrap();
        let params = ConnectionParams::new("echo", "echo://").with_name("local");
        let conn = Connection::new(params, Arc::new(EchoDriver::default()), config(&dir)).unwrap();

        assert!(Uuid::parse_str(conn.id()).is_ok());
        assert_eq!(conn.expanded_params().id, conn.id());
    }

    #[tokio::test]
    async fn test_raw_and_expanded_params() {
        let dir = TempDir::new().unwrap();
        std::env::set_var("QUERYDECK_CONN_TEST_HOST", "db.internal");
        let params =
            ConnectionParams::new("echo", r#"echo://{{ env "QUERYDECK_CONN_TEST_HOST" }}"#)
                .with_id("c1");
        let conn = Connection::new(params, Arc::new(EchoDriver::default()), config(&dir)).unwrap();

        assert_eq!(conn.id(), "c1");
        assert!(conn.params().url.contains("{{"));
        assert_eq!(conn.expanded_params().url, "echo://db.internal");
    }

    #[tokio::test]
    async fn test_execute_runs_query_through_driver() {
        let dir = TempDir::new().unwrap();
        let conn = Connection::new(
            ConnectionParams::new("echo", "echo://"),
            Arc::new(EchoDriver::default()),
            config(&dir),
        )
        .unwrap();

        let call = conn.execute("select 42", None);
        assert_eq!(call.wait().await, CallState::Archived);

        let rows = call.get_result().await.unwrap().rows(0, -1).await.unwrap();
        assert_eq!(rows, vec![vec![json!("select 42")]]);
    }

    #[tokio::test]
    async fn test_empty_structure_gets_placeholder() {
        let dir = TempDir::new().unwrap();
        let conn = Connection::new(
            ConnectionParams::new("echo", "echo://"),
            Arc::new(EchoDriver::default()),
            config(&dir),
        )
        .unwrap();

        let structure = conn.get_structure().await.unwrap();
        assert_eq!(structure, vec![Structure::no_schema()]);
        assert_eq!(structure[0].structure_type, StructureType::None);
    }

    #[tokio::test]
    async fn test_structure_passthrough_and_close() {
        let dir = TempDir::new().unwrap();
        let driver = Arc::new(EchoDriver {
            structure: vec![Structure::new("users", "public", StructureType::Table)],
            ..Default::default()
        });
        let conn = Connection::new(
            ConnectionParams::new("echo", "echo://"),
            driver.clone(),
            config(&dir),
        )
        .unwrap();

        assert_eq!(conn.get_structure().await.unwrap()[0].name, "users");
        conn.close().await;
        assert!(driver.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_database_switching_not_supported() {
        let dir = TempDir::new().unwrap();
        let conn = Connection::new(
            ConnectionParams::new("echo", "echo://"),
            Arc::new(EchoDriver::default()),
            config(&dir),
        )
        .unwrap();

        assert!(matches!(
            conn.select_database("other").await,
            Err(DataError::DatabaseSwitchingNotSupported)
        ));
        assert!(matches!(
            conn.list_databases().await,
            Err(DataError::DatabaseSwitchingNotSupported)
        ));
    }

    #[tokio::test]
    async fn test_database_switching() {
        let dir = TempDir::new().unwrap();
        let driver = SwitchingDriver {
            current: Mutex::new("main".into()),
        };
        let conn = Connection::new(
            ConnectionParams::new("switch", "switch://"),
            Arc::new(driver),
            config(&dir),
        )
        .unwrap();

        conn.select_database("analytics").await.unwrap();
        let (current, available) = conn.list_databases().await.unwrap();
        assert_eq!(current, "analytics");
        assert_eq!(available, vec!["main".to_string(), "analytics".to_string()]);
    }
}
