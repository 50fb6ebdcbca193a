use crate::error::{DataError, Result};
use crate::traits::Driver;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Factory trait for creating drivers from a connection url
#[async_trait]
pub trait DriverFactory: Send + Sync {
    /// Canonical driver type this factory handles
    fn driver_type(&self) -> &'static str;

    /// Additional names the type may be referred to by (e.g. "pg" for postgres)
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Open a driver for the given (already expanded) url
    async fn connect(&self, url: &str) -> Result<Arc<dyn Driver>>;
}

/// Registry of driver factories keyed by type and alias
///
/// Built once at startup and passed to whoever creates connections.
pub struct DriverRegistry {
    factories: Arc<RwLock<HashMap<String, Arc<dyn DriverFactory>>>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self {
            factories: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a factory under its type and all of its aliases
    pub async fn register(&self, factory: Arc<dyn DriverFactory>) {
        let mut factories = self.factories.write().await;

        let names =
            std::iter::once(factory.driver_type()).chain(factory.aliases().iter().copied());
        for name in names {
            if factories.contains_key(name) {
                warn!("Overwriting existing driver factory for type: {}", name);
            }
            factories.insert(name.to_string(), factory.clone());
        }

        debug!("Registered driver factory: {}", factory.driver_type());
    }

    /// Create a driver for `driver_type`, connecting to `url`
    pub async fn connect(&self, driver_type: &str, url: &str) -> Result<Arc<dyn Driver>> {
        let factory = self
            .factories
            .read()
            .await
            .get(driver_type)
            .cloned()
            .ok_or_else(|| {
                DataError::invalid_configuration(format!(
                    "No driver registered for type: {}",
                    driver_type
                ))
            })?;

        debug!("Connecting driver of type: {}", driver_type);
        factory.connect(url).await
    }

    /// Check if a type or alias is registered
    pub async fn has_type(&self, driver_type: &str) -> bool {
        self.factories.read().await.contains_key(driver_type)
    }

    /// List registered types and aliases
    pub async fn list_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.factories.read().await.keys().cloned().collect();
        types.sort();
        types
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ResultStream;
    use crate::types::Structure;
    use tokio_util::sync::CancellationToken;

    struct NullDriver;

    #[async_trait]
    impl Driver for NullDriver {
        async fn query(
            &self,
            _cancel: CancellationToken,
            _query: &str,
        ) -> Result<Box<dyn ResultStream>> {
            Err(DataError::QueryFailed("null driver".into()))
        }

        async fn structure(&self) -> Result<Vec<Structure>> {
            Ok(vec![])
        }

        async fn close(&self) {}
    }

    struct NullFactory;

    #[async_trait]
    impl DriverFactory for NullFactory {
        fn driver_type(&self) -> &'static str {
            "null"
        }

        fn aliases(&self) -> &'static [&'static str] {
            &["nil"]
        }

        async fn connect(&self, url: &str) -> Result<Arc<dyn Driver>> {
            if url.is_empty() {
                return Err(DataError::ConnectionFailed("empty url".into()));
            }
            Ok(Arc::new(NullDriver))
        }
    }

    #[tokio::test]
    async fn test_register_with_aliases() {
        let registry = DriverRegistry::new();
        assert!(registry.list_types().await.is_empty());

        registry.register(Arc::new(NullFactory)).await;

        assert!(registry.has_type("null").await);
        assert!(registry.has_type("nil").await);
        assert_eq!(registry.list_types().await, vec!["nil", "null"]);
    }

    #[tokio::test]
    async fn test_connect_unknown_type() {
        let registry = DriverRegistry::new();
        let err = registry.connect("postgres", "x").await.err().unwrap();
        assert!(matches!(err, DataError::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn test_connect_via_alias_and_factory_error() {
        let registry = DriverRegistry::new();
        registry.register(Arc::new(NullFactory)).await;

        let driver = registry.connect("nil", "anything").await.unwrap();
        assert!(driver.as_database_switcher().is_none());
        assert!(driver.is::<NullDriver>());

        let err = registry.connect("null", "").await.err().unwrap();
        assert!(matches!(err, DataError::ConnectionFailed(_)));
    }
}
