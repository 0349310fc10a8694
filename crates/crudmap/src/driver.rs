//! The seam between crudmap and a concrete database client.
//!
//! A driver supplies a [`Connector`] that opens connections, and a [`Connection`] that
//! prepares a statement, binds an ordered argument list, and either streams result rows
//! or reports an affected-row count. Drivers report failures as [`DriverError`]; the
//! session layer decides which [`crate::CrudError`] kind a failure becomes based on the
//! phase it happened in.

use crate::stmt::Dialect;
use crate::value::Value;
use futures_core::Stream;
use futures_util::stream::{BoxStream, StreamExt};
use std::future::Future;
use std::sync::Arc;

pub use crate::error::DriverError;

/// A row as delivered by the driver, read by column position.
pub trait RawRow: Send {
    fn value_at(&self, index: usize) -> Result<Value, DriverError>;
}

impl RawRow for Vec<Value> {
    fn value_at(&self, index: usize) -> Result<Value, DriverError> {
        self.get(index)
            .cloned()
            .ok_or_else(|| format!("column index {index} out of range ({})", self.len()).into())
    }
}

/// Column metadata plus the not-yet-consumed row stream of an executing query.
///
/// The row stream must not borrow the connection; it is consumed while the connection is
/// still held, or handed to a [`crate::RowStream`] that keeps the connection alive.
pub struct ResultStream<R> {
    columns: Vec<String>,
    rows: BoxStream<'static, Result<R, DriverError>>,
}

impl<R> ResultStream<R> {
    pub fn new<S>(columns: Vec<String>, rows: S) -> Self
    where
        S: Stream<Item = Result<R, DriverError>> + Send + 'static,
    {
        Self {
            columns,
            rows: rows.boxed(),
        }
    }

    /// Column names in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn into_parts(self) -> (Vec<String>, BoxStream<'static, Result<R, DriverError>>) {
        (self.columns, self.rows)
    }
}

impl<R> std::fmt::Debug for ResultStream<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStream")
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

/// A single open connection, owned by exactly one call at a time.
pub trait Connection: Send {
    type Row: RawRow + 'static;

    /// Prepare `sql`, bind `params` in order, and start reading results.
    fn query(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<ResultStream<Self::Row>, DriverError>> + Send;

    /// Prepare `sql`, bind `params` in order, and return the affected-row count.
    fn execute(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<u64, DriverError>> + Send;

    /// Release the connection. The default implementation simply drops it.
    fn close(self) -> impl Future<Output = Result<(), DriverError>> + Send
    where
        Self: Sized,
    {
        drop(self);
        async { Ok::<(), DriverError>(()) }
    }
}

/// Opens connections. Driver loading and transport belong to the implementation.
pub trait Connector: Send + Sync {
    type Connection: Connection;

    fn connect(&self) -> impl Future<Output = Result<Self::Connection, DriverError>> + Send;

    /// Placeholder syntax the server accepts.
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }
}

impl<C: Connector> Connector for Arc<C> {
    type Connection = C::Connection;

    fn connect(&self) -> impl Future<Output = Result<Self::Connection, DriverError>> + Send {
        (**self).connect()
    }

    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }
}

impl<C: Connector> Connector for &C {
    type Connection = C::Connection;

    fn connect(&self) -> impl Future<Output = Result<Self::Connection, DriverError>> + Send {
        (**self).connect()
    }

    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }
}
