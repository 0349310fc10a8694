//! Connection and statement lifecycle.
//!
//! Each call on [`Database`] builds its statement, opens its own connection, runs exactly
//! one statement, and releases the connection before returning, on success and on every
//! error path. Nothing about an in-flight call is stored on the `Database` itself, so one
//! instance can be shared freely between tasks.

use crate::clock::{Clock, SystemClock};
use crate::columns::{ColumnValues, Conditions};
use crate::config::{DatabaseConfig, ExecOptions};
use crate::driver::{Connection, Connector};
use crate::error::{CrudError, CrudResult};
use crate::mapper::{RowStream, collect_rows};
use crate::row::ResultSet;
use crate::stmt::{self, BuildContext, BuildStatement, Dialect, Statement};
use crate::value::Value;
use std::future::Future;
use std::sync::Arc;

/// Result of [`Database::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Rows produced by a query.
    Rows(ResultSet),
    /// Affected-row count of a mutation.
    Affected(u64),
}

impl Outcome {
    pub fn rows(self) -> Option<ResultSet> {
        match self {
            Outcome::Rows(rs) => Some(rs),
            Outcome::Affected(_) => None,
        }
    }

    pub fn affected(&self) -> Option<u64> {
        match self {
            Outcome::Affected(n) => Some(*n),
            Outcome::Rows(_) => None,
        }
    }
}

/// Truncate a string to at most `max` bytes on a char boundary.
fn truncate_sql_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Builds statements and runs them on a fresh connection per call.
///
/// # Example
///
/// ```ignore
/// use crudmap::{ColumnMap, Database, PgConnector};
///
/// let db = Database::new(PgConnector::from_url(&url)?);
/// db.insert("users", ColumnMap::new().with("name", "alice")).await?;
/// let rows = db.select("users", ["id", "name"], Some(ColumnMap::new().with("name", "alice"))).await?;
/// ```
pub struct Database<C> {
    connector: C,
    config: DatabaseConfig,
    clock: Arc<dyn Clock>,
}

impl<C: Connector> Database<C> {
    pub fn new(connector: C) -> Self {
        Self::with_config(connector, DatabaseConfig::default())
    }

    pub fn with_config(connector: C, config: DatabaseConfig) -> Self {
        let clock = Arc::new(SystemClock::new(config.time_zone));
        Self {
            connector,
            config,
            clock,
        }
    }

    /// Replace the clock used for `createtime` / `modifiedtime`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Placeholder syntax in use: the configured override, else the connector's own.
    pub fn dialect(&self) -> Dialect {
        self.config
            .dialect
            .unwrap_or_else(|| self.connector.dialect())
    }

    /// Build a statement with this database's dialect and clock without running it.
    pub fn build(&self, builder: &impl BuildStatement) -> CrudResult<Statement> {
        builder.build(&BuildContext::new(self.dialect(), self.clock.as_ref()))
    }

    // ==================== Execute and map ====================

    /// Build and run a statement, returning rows for queries and a count otherwise.
    pub async fn run(&self, builder: &impl BuildStatement) -> CrudResult<Outcome> {
        self.run_with(builder, ExecOptions::default()).await
    }

    pub async fn run_with(
        &self,
        builder: &impl BuildStatement,
        opts: ExecOptions,
    ) -> CrudResult<Outcome> {
        let stmt = self.build(builder)?;
        if stmt.kind().returns_rows() {
            self.fetch_statement(&stmt, opts).await.map(Outcome::Rows)
        } else {
            self.execute_statement(&stmt, opts).await.map(Outcome::Affected)
        }
    }

    /// Build and run a query, reading every row.
    pub async fn fetch(&self, builder: &impl BuildStatement) -> CrudResult<ResultSet> {
        self.fetch_with(builder, ExecOptions::default()).await
    }

    pub async fn fetch_with(
        &self,
        builder: &impl BuildStatement,
        opts: ExecOptions,
    ) -> CrudResult<ResultSet> {
        let stmt = self.build(builder)?;
        self.fetch_statement(&stmt, opts).await
    }

    /// Build and run a mutation, returning the affected-row count.
    pub async fn execute(&self, builder: &impl BuildStatement) -> CrudResult<u64> {
        self.execute_with(builder, ExecOptions::default()).await
    }

    pub async fn execute_with(
        &self,
        builder: &impl BuildStatement,
        opts: ExecOptions,
    ) -> CrudResult<u64> {
        let stmt = self.build(builder)?;
        self.execute_statement(&stmt, opts).await
    }

    /// Build and start a query, mapping rows as they are polled.
    ///
    /// The returned stream owns the connection and releases it when it ends, fails, or is
    /// dropped; [`RowStream::collect_all`] and [`RowStream::close`] release it through
    /// [`Connection::close`]. The timeout applies to starting the query only.
    pub async fn stream(
        &self,
        builder: &impl BuildStatement,
    ) -> CrudResult<RowStream<C::Connection>> {
        self.stream_with(builder, ExecOptions::default()).await
    }

    pub async fn stream_with(
        &self,
        builder: &impl BuildStatement,
        opts: ExecOptions,
    ) -> CrudResult<RowStream<C::Connection>> {
        let stmt = self.build(builder)?;
        self.log_statement(&stmt);

        let mut conn = self.acquire().await?;
        let started = self
            .with_timeout(&stmt, opts, async {
                conn.query(stmt.sql(), stmt.params())
                    .await
                    .map_err(|e| CrudError::execution(stmt.sql(), stmt.param_count(), e))
            })
            .await;

        match started {
            Ok(results) => Ok(RowStream::new(conn, results, &stmt)),
            Err(e) => {
                self.release(conn).await;
                Err(e)
            }
        }
    }

    // ==================== Convenience ====================

    /// `SELECT * FROM table`
    pub async fn select_all(&self, table: &str) -> CrudResult<ResultSet> {
        self.fetch(&stmt::select_all(table)).await
    }

    /// `SELECT columns FROM table [WHERE ...]`
    pub async fn select<I, S>(
        &self,
        table: &str,
        columns: I,
        conditions: Option<Conditions>,
    ) -> CrudResult<ResultSet>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = stmt::select(table, columns);
        if let Some(conditions) = conditions {
            builder = builder.filter(conditions);
        }
        self.fetch(&builder).await
    }

    /// Insert one row, stamping `createtime` and `modifiedtime`.
    pub async fn insert(&self, table: &str, values: ColumnValues) -> CrudResult<u64> {
        self.execute(&stmt::insert(table, values)).await
    }

    /// Update rows, stamping `modifiedtime`. `None` updates every row.
    pub async fn update(
        &self,
        table: &str,
        values: ColumnValues,
        conditions: Option<Conditions>,
    ) -> CrudResult<u64> {
        let mut builder = stmt::update(table, values);
        if let Some(conditions) = conditions {
            builder = builder.filter(conditions);
        }
        self.execute(&builder).await
    }

    /// Delete matching rows. An empty condition set is rejected.
    pub async fn delete(&self, table: &str, conditions: Conditions) -> CrudResult<u64> {
        self.execute(&stmt::delete(table, conditions)).await
    }

    /// Delete every row of `table`.
    pub async fn delete_all(&self, table: &str) -> CrudResult<u64> {
        self.execute(&stmt::delete_all(table)).await
    }

    /// Run caller-written SQL and read every row.
    pub async fn query_sql(&self, sql: &str, params: Vec<Value>) -> CrudResult<ResultSet> {
        self.fetch(&stmt::raw(sql, params)?).await
    }

    /// Run caller-written SQL and return the affected-row count.
    pub async fn execute_sql(&self, sql: &str, params: Vec<Value>) -> CrudResult<u64> {
        self.execute(&stmt::raw(sql, params)?).await
    }

    // ==================== Lifecycle ====================

    async fn fetch_statement(&self, stmt: &Statement, opts: ExecOptions) -> CrudResult<ResultSet> {
        self.log_statement(stmt);

        let mut conn = self.acquire().await?;
        let result = self
            .with_timeout(stmt, opts, async {
                let results = conn
                    .query(stmt.sql(), stmt.params())
                    .await
                    .map_err(|e| CrudError::execution(stmt.sql(), stmt.param_count(), e))?;
                collect_rows(results, stmt).await
            })
            .await;
        self.release(conn).await;

        if let Ok(rs) = &result {
            tracing::debug!(target: "crudmap.session", rows = rs.len(), "query complete");
        }
        result
    }

    async fn execute_statement(&self, stmt: &Statement, opts: ExecOptions) -> CrudResult<u64> {
        self.log_statement(stmt);

        let mut conn = self.acquire().await?;
        let result = self
            .with_timeout(stmt, opts, async {
                conn.execute(stmt.sql(), stmt.params())
                    .await
                    .map_err(|e| CrudError::execution(stmt.sql(), stmt.param_count(), e))
            })
            .await;
        self.release(conn).await;

        if let Ok(affected) = result {
            tracing::debug!(target: "crudmap.session", affected, "statement complete");
        }
        result
    }

    async fn acquire(&self) -> CrudResult<C::Connection> {
        match self.connector.connect().await {
            Ok(conn) => {
                tracing::debug!(target: "crudmap.session", "connection acquired");
                Ok(conn)
            }
            Err(e) => {
                tracing::error!(target: "crudmap.session", error = %e, "connect failed");
                Err(CrudError::connection(e))
            }
        }
    }

    /// Close `conn`. A failure here is logged and never replaces the call's own outcome.
    async fn release(&self, conn: C::Connection) {
        match conn.close().await {
            Ok(()) => tracing::debug!(target: "crudmap.session", "connection released"),
            Err(e) => {
                tracing::warn!(target: "crudmap.session", error = %e, "failed to release connection")
            }
        }
    }

    async fn with_timeout<T, F>(&self, stmt: &Statement, opts: ExecOptions, fut: F) -> CrudResult<T>
    where
        F: Future<Output = CrudResult<T>>,
    {
        match opts.timeout.or(self.config.query_timeout) {
            Some(after) => tokio::time::timeout(after, fut).await.map_err(|_| {
                tracing::warn!(target: "crudmap.session", ?after, "query timed out");
                CrudError::Timeout {
                    sql: stmt.sql().to_string(),
                    after,
                }
            })?,
            None => fut.await,
        }
    }

    fn log_statement(&self, stmt: &Statement) {
        let sql = match self.config.max_sql_length {
            Some(max) if stmt.sql().len() > max => {
                format!("{}...", truncate_sql_bytes(stmt.sql(), max))
            }
            _ => stmt.sql().to_string(),
        };
        tracing::debug!(
            target: "crudmap.sql",
            kind = ?stmt.kind(),
            param_count = stmt.param_count(),
            sql = %sql,
            "executing statement"
        );
    }
}

impl<C> std::fmt::Debug for Database<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
