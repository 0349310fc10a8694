//! In-memory driver for exercising the session layer without a server.
//!
//! Understands exactly the statement shapes the builders emit with `?` placeholders.

#![allow(dead_code)]

use crudmap::{Connection, Connector, DriverError, ResultStream, Value};
use futures_util::stream;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Record = Vec<(String, Value)>;

#[derive(Default)]
pub struct Shared {
    tables: Mutex<HashMap<String, Vec<Record>>>,
    executed: Mutex<Vec<String>>,
    pub open: AtomicUsize,
    pub connects: AtomicUsize,
    /// Connections released through `Connection::close` rather than a plain drop.
    pub closes: AtomicUsize,
    pub fail_connect: AtomicBool,
    pub fail_statements: AtomicBool,
    /// Yield a read error after this many rows (0 = disabled).
    pub fail_read_after: AtomicUsize,
    pub delay_ms: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct MemoryConnector {
    pub shared: Arc<Shared>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_connections(&self) -> usize {
        self.shared.open.load(Ordering::SeqCst)
    }

    pub fn total_connects(&self) -> usize {
        self.shared.connects.load(Ordering::SeqCst)
    }

    pub fn closed_connections(&self) -> usize {
        self.shared.closes.load(Ordering::SeqCst)
    }

    pub fn executed(&self) -> Vec<String> {
        self.shared.executed.lock().unwrap().clone()
    }

    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.shared
            .tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

impl Connector for MemoryConnector {
    type Connection = MemoryConnection;

    async fn connect(&self) -> Result<MemoryConnection, DriverError> {
        if self.shared.fail_connect.load(Ordering::SeqCst) {
            return Err("connection refused".into());
        }
        self.shared.connects.fetch_add(1, Ordering::SeqCst);
        self.shared.open.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryConnection {
            shared: Arc::clone(&self.shared),
        })
    }
}

pub struct MemoryConnection {
    shared: Arc<Shared>,
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.shared.open.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MemoryConnection {
    async fn prelude(&self, sql: &str) -> Result<(), DriverError> {
        self.shared.executed.lock().unwrap().push(sql.to_string());
        let delay = self.shared.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }
        if self.shared.fail_statements.load(Ordering::SeqCst) {
            return Err("syntax error at or near \"?\"".into());
        }
        Ok(())
    }
}

struct Params<'a> {
    values: &'a [Value],
    next: usize,
}

impl Params<'_> {
    fn take(&mut self) -> Result<Value, DriverError> {
        let v = self
            .values
            .get(self.next)
            .cloned()
            .ok_or("not enough parameters")?;
        self.next += 1;
        Ok(v)
    }

    fn finish(&self) -> Result<(), DriverError> {
        if self.next != self.values.len() {
            return Err(format!("{} params bound, {} used", self.values.len(), self.next).into());
        }
        Ok(())
    }
}

fn parse_where(clause: Option<&str>, params: &mut Params<'_>) -> Result<Vec<(String, Value)>, DriverError> {
    let Some(clause) = clause else {
        return Ok(Vec::new());
    };
    clause
        .split(" AND ")
        .map(|cond| -> Result<(String, Value), DriverError> {
            if let Some(col) = cond.strip_suffix(" IS NULL") {
                Ok((col.to_string(), Value::Null))
            } else if let Some(col) = cond.strip_suffix(" = ?") {
                Ok((col.to_string(), params.take()?))
            } else {
                Err(format!("unsupported condition: {cond}").into())
            }
        })
        .collect()
}

fn matches(record: &Record, conds: &[(String, Value)]) -> bool {
    conds.iter().all(|(col, want)| {
        record
            .iter()
            .find(|(c, _)| c == col)
            .map(|(_, v)| v)
            .unwrap_or(&Value::Null)
            == want
    })
}

fn split_where(s: &str) -> (&str, Option<&str>) {
    match s.split_once(" WHERE ") {
        Some((head, tail)) => (head, Some(tail)),
        None => (s, None),
    }
}

impl Connection for MemoryConnection {
    type Row = Vec<Value>;

    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<ResultStream<Vec<Value>>, DriverError> {
        self.prelude(sql).await?;
        let mut params = Params { values: params, next: 0 };

        let body = sql.strip_prefix("SELECT ").ok_or("only SELECT is supported")?;
        let (projection, rest) = body.split_once(" FROM ").ok_or("missing FROM")?;
        let (table, where_clause) = split_where(rest);
        let conds = parse_where(where_clause, &mut params)?;
        params.finish()?;

        let tables = self.shared.tables.lock().unwrap();
        let records: Vec<Record> = tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| matches(r, &conds)).cloned().collect())
            .unwrap_or_default();
        drop(tables);

        let columns: Vec<String> = if projection == "*" {
            records
                .first()
                .map(|r| r.iter().map(|(c, _)| c.clone()).collect())
                .unwrap_or_default()
        } else {
            projection.split(", ").map(str::to_string).collect()
        };

        let fail_after = self.shared.fail_read_after.load(Ordering::SeqCst);
        let mut out: Vec<Result<Vec<Value>, DriverError>> = Vec::new();
        for (i, record) in records.iter().enumerate() {
            if fail_after > 0 && i == fail_after {
                out.push(Err("connection reset while reading".into()));
                break;
            }
            let values = columns
                .iter()
                .map(|c| {
                    record
                        .iter()
                        .find(|(name, _)| name == c)
                        .map(|(_, v)| v.clone())
                        .unwrap_or(Value::Null)
                })
                .collect();
            out.push(Ok(values));
        }

        Ok(ResultStream::new(columns, stream::iter(out)))
    }

    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DriverError> {
        self.prelude(sql).await?;
        let mut params = Params { values: params, next: 0 };
        let mut tables = self.shared.tables.lock().unwrap();

        let affected = if let Some(rest) = sql.strip_prefix("INSERT INTO ") {
            let (table, rest) = rest.split_once(" (").ok_or("missing column list")?;
            let (cols, _) = rest.split_once(") VALUES").ok_or("missing VALUES")?;
            let mut record = Record::new();
            for col in cols.split(", ") {
                record.push((col.to_string(), params.take()?));
            }
            tables.entry(table.to_string()).or_default().push(record);
            1
        } else if let Some(rest) = sql.strip_prefix("UPDATE ") {
            let (table, rest) = rest.split_once(" SET ").ok_or("missing SET")?;
            let (assigns, where_clause) = split_where(rest);
            let mut sets = Vec::new();
            for assign in assigns.split(", ") {
                let col = assign.strip_suffix(" = ?").ok_or("unsupported assignment")?;
                sets.push((col.to_string(), params.take()?));
            }
            let conds = parse_where(where_clause, &mut params)?;
            let mut n = 0;
            for record in tables.entry(table.to_string()).or_default() {
                if !matches(record, &conds) {
                    continue;
                }
                for (col, value) in &sets {
                    match record.iter_mut().find(|(c, _)| c == col) {
                        Some(slot) => slot.1 = value.clone(),
                        None => record.push((col.clone(), value.clone())),
                    }
                }
                n += 1;
            }
            n
        } else if let Some(rest) = sql.strip_prefix("DELETE FROM ") {
            let (table, where_clause) = split_where(rest);
            let conds = parse_where(where_clause, &mut params)?;
            let rows = tables.entry(table.to_string()).or_default();
            let before = rows.len();
            rows.retain(|r| !matches(r, &conds));
            (before - rows.len()) as u64
        } else {
            return Err(format!("unsupported statement: {sql}").into());
        };

        params.finish()?;
        Ok(affected)
    }

    async fn close(self) -> Result<(), DriverError> {
        self.shared.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
