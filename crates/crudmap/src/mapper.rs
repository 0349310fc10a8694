//! Row mapping: driver rows into ordered [`Row`]s.
//!
//! A value that fails to decode is a [`CrudError::Mapping`] naming its column. A failure
//! of the row stream itself (connection lost, statement aborted mid-way) is reported as
//! [`CrudError::Execution`] with the statement's SQL and argument count.

use crate::driver::{Connection, DriverError, RawRow, ResultStream};
use crate::error::{CrudError, CrudResult};
use crate::row::{ResultSet, Row};
use crate::stmt::Statement;
use futures_core::Stream;
use futures_util::stream::{BoxStream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Read every value of `raw` by position.
pub fn map_row<R: RawRow + ?Sized>(columns: &Arc<[String]>, raw: &R) -> CrudResult<Row> {
    let mut values = Vec::with_capacity(columns.len());
    for (index, column) in columns.iter().enumerate() {
        let value = raw
            .value_at(index)
            .map_err(|e| CrudError::mapping(column, e.to_string()))?;
        values.push(value);
    }
    Ok(Row::new(Arc::clone(columns), values))
}

/// Drain `stream`, produced by `stmt`, into a [`ResultSet`].
///
/// Column names are taken from the metadata once, before the first row. Any read failure
/// discards the rows mapped so far.
pub async fn collect_rows<R: RawRow>(
    stream: ResultStream<R>,
    stmt: &Statement,
) -> CrudResult<ResultSet> {
    let (columns, mut rows) = stream.into_parts();
    let columns: Arc<[String]> = columns.into();

    let mut mapped = Vec::new();
    while let Some(raw) = rows.next().await {
        let raw = raw.map_err(|e| CrudError::execution(stmt.sql(), stmt.param_count(), e))?;
        mapped.push(map_row(&columns, &raw)?);
    }

    Ok(ResultSet::new(columns, mapped))
}

/// Lazily mapped rows that own the connection they are read from.
///
/// When polled as a [`Stream`], the connection is dropped as soon as the stream ends,
/// fails, or is itself dropped; [`Connection::close`] is not awaited on that path. Use
/// [`RowStream::collect_all`] or [`RowStream::close`] to release it through the driver.
/// After an error the stream yields nothing further.
#[must_use = "streams do nothing unless polled"]
pub struct RowStream<C: Connection> {
    conn: Option<Box<C>>,
    columns: Arc<[String]>,
    rows: BoxStream<'static, Result<C::Row, DriverError>>,
    sql: String,
    param_count: usize,
}

impl<C: Connection> RowStream<C> {
    pub(crate) fn new(conn: C, stream: ResultStream<C::Row>, stmt: &Statement) -> Self {
        let (columns, rows) = stream.into_parts();
        Self {
            conn: Some(Box::new(conn)),
            columns: columns.into(),
            rows,
            sql: stmt.sql().to_string(),
            param_count: stmt.param_count(),
        }
    }

    /// Column names in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether the underlying connection is still held.
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Drain the remaining rows into a [`ResultSet`], then close the connection.
    pub async fn collect_all(mut self) -> CrudResult<ResultSet> {
        let mut mapped = Vec::new();
        let mut outcome = Ok(());
        if self.conn.is_some() {
            while let Some(raw) = self.rows.next().await {
                match raw
                    .map_err(|e| self.stream_failure(e))
                    .and_then(|raw| map_row(&self.columns, &raw))
                {
                    Ok(row) => mapped.push(row),
                    Err(e) => {
                        outcome = Err(e);
                        break;
                    }
                }
            }
        }
        let columns = Arc::clone(&self.columns);
        self.close().await;
        outcome.map(|()| ResultSet::new(columns, mapped))
    }

    /// Stop reading and release the connection through [`Connection::close`].
    ///
    /// A close failure is logged and otherwise ignored.
    pub async fn close(mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        match (*conn).close().await {
            Ok(()) => tracing::debug!(target: "crudmap.session", "connection released by row stream"),
            Err(e) => tracing::warn!(
                target: "crudmap.session",
                error = %e,
                "failed to release connection"
            ),
        }
    }

    fn stream_failure(&self, err: DriverError) -> CrudError {
        CrudError::execution(self.sql.as_str(), self.param_count, err)
    }

    fn finish(&mut self) {
        if self.conn.take().is_some() {
            tracing::debug!(target: "crudmap.session", "connection released by row stream");
        }
    }
}

impl<C: Connection> Stream for RowStream<C> {
    type Item = CrudResult<Row>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.conn.is_none() {
            return Poll::Ready(None);
        }

        match this.rows.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(raw))) => {
                let mapped = map_row(&this.columns, &raw);
                if mapped.is_err() {
                    this.finish();
                }
                Poll::Ready(Some(mapped))
            }
            Poll::Ready(Some(Err(e))) => {
                let err = this.stream_failure(e);
                this.finish();
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.finish();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
