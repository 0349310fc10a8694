use crate::stmt::Dialect;
use chrono::{FixedOffset, Offset, Utc};
use std::time::Duration;

/// UTC+08:00, the offset stamps are taken in unless configured otherwise.
pub fn default_time_zone() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).unwrap_or_else(|| Utc.fix())
}

/// Configuration for [`crate::Database`].
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Placeholder syntax override. `None` uses [`crate::Connector::dialect`].
    pub dialect: Option<Dialect>,
    /// Default per-call timeout. `None` means wait as long as the driver does.
    pub query_timeout: Option<Duration>,
    /// Truncate SQL in log events (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
    /// Offset of the default clock used for `createtime` / `modifiedtime`.
    pub time_zone: FixedOffset,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dialect: None,
            query_timeout: None,
            max_sql_length: Some(200),
            time_zone: default_time_zone(),
        }
    }
}

impl DatabaseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a placeholder syntax regardless of the connector.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Set the default query timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.query_timeout = Some(duration);
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Log SQL text without truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub fn time_zone(mut self, offset: FixedOffset) -> Self {
        self.time_zone = offset;
        self
    }
}

/// Per-call execution options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecOptions {
    /// Overrides [`DatabaseConfig::query_timeout`] for this call.
    pub timeout: Option<Duration>,
}

impl ExecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}
