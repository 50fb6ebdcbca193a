use thiserror::Error;

/// Unified error type for drivers, result buffers and archives
#[derive(Error, Debug)]
pub enum DataError {
    /// Connection failed (bad URL, authentication, network, etc.)
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed inside the driver
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Requested row range cannot be served
    #[error("Invalid range: from {from} to {to}")]
    InvalidRange { from: i64, to: i64 },

    /// A blocking read gave up waiting
    #[error("Timeout exceeded after {after_ms}ms: {operation}")]
    Timeout { operation: String, after_ms: u64 },

    /// Driver has no database switching capability
    #[error("Database switching not supported by this driver")]
    DatabaseSwitchingNotSupported,

    /// No durable archive exists for the call
    #[error("Archive not found for call: {0}")]
    ArchiveNotFound(String),

    /// Connection, call or formatter not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation not supported by this backend
    #[error("Operation not supported: {0}")]
    OperationNotSupported(String),

    /// Invalid configuration or connection parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DataError {
    /// Create a "not found" error with custom message
    pub fn not_found(msg: impl Into<String>) -> Self {
        DataError::NotFound(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        DataError::InvalidConfiguration(msg.into())
    }

    /// Create a timeout error for the given operation
    pub fn timeout(operation: impl Into<String>, after: std::time::Duration) -> Self {
        DataError::Timeout {
            operation: operation.into(),
            after_ms: after.as_millis() as u64,
        }
    }

    /// Returns true for timeout errors
    pub fn is_timeout(&self) -> bool {
        matches!(self, DataError::Timeout { .. })
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
