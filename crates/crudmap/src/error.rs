//! Error types for crudmap

use std::time::Duration;
use thiserror::Error;

/// Error type produced by a database driver behind the [`crate::driver`] seam.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for crudmap operations
pub type CrudResult<T> = Result<T, CrudError>;

/// Error types for statement building and execution
#[derive(Debug, Error)]
pub enum CrudError {
    /// Missing or invalid input, detected before any connection is acquired
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The connector could not produce a connection
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<DriverError>,
    },

    /// Prepare/execute failed. Carries the SQL text and argument count, never the values.
    #[error("Execution error ({param_count} params) for `{sql}`: {source}")]
    Execution {
        sql: String,
        param_count: usize,
        #[source]
        source: DriverError,
    },

    /// Reading result metadata or a row value failed
    #[error("Mapping error on column '{column}': {message}")]
    Mapping { column: String, message: String },

    /// The caller-supplied timeout elapsed
    #[error("Query timeout after {after:?} for `{sql}`")]
    Timeout { sql: String, after: Duration },
}

impl CrudError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a connection error from a driver failure
    pub fn connection(source: DriverError) -> Self {
        Self::Connection {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create an execution error for `sql`
    pub fn execution(sql: impl Into<String>, param_count: usize, source: DriverError) -> Self {
        Self::Execution {
            sql: sql.into(),
            param_count,
            source,
        }
    }

    /// Create a mapping error for a specific column
    pub fn mapping(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Mapping {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution { .. })
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
