//! Statement builders for parameterized CRUD SQL.
//!
//! Every builder produces a [`Statement`]: SQL text with positional placeholders plus the
//! ordered argument list. Values never appear in the text; only validated identifiers do.
//!
//! ```ignore
//! use crudmap::{stmt, ColumnMap};
//!
//! // SELECT name, email FROM users WHERE id = ?
//! let q = stmt::select("users", ["name", "email"]).eq("id", 7);
//!
//! // INSERT INTO users (name, createtime, modifiedtime) VALUES (?, ?, ?)
//! let ins = stmt::insert("users", ColumnMap::new().with("name", "alice"));
//!
//! // UPDATE users SET name = ?, modifiedtime = ? WHERE id = ?
//! let upd = stmt::update("users", ColumnMap::new().with("name", "bob")).eq("id", 7);
//!
//! // DELETE FROM users WHERE id = ?
//! let del = stmt::delete("users", ColumnMap::new().with("id", 7));
//! ```

mod delete;
mod insert;
mod select;
mod update;
mod writer;

pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use select::SelectBuilder;
pub use update::UpdateBuilder;

use crate::clock::Clock;
use crate::columns::{ColumnValues, Conditions};
use crate::error::{CrudError, CrudResult};
use crate::value::Value;

/// Column stamped with the build time on INSERT. Never touched by UPDATE.
pub const CREATE_TIME_COLUMN: &str = "createtime";

/// Column stamped with the build time on INSERT and on every UPDATE.
pub const MODIFIED_TIME_COLUMN: &str = "modifiedtime";

/// Placeholder syntax of the target database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// `?` placeholders (MySQL, SQLite).
    #[default]
    MySql,
    /// `$1`, `$2`, ... placeholders (PostgreSQL).
    Postgres,
}

/// The type of SQL operation a statement performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    /// Caller-supplied SQL that is not one of the above.
    Other,
}

impl StatementKind {
    /// Detect the statement kind from leading SQL keyword.
    pub fn from_sql(sql: &str) -> Self {
        let keyword = sql
            .trim_start_matches(|c: char| c.is_whitespace() || c == '(')
            .split(|c: char| !c.is_ascii_alphabetic())
            .next()
            .unwrap_or("");

        match keyword.to_ascii_uppercase().as_str() {
            "SELECT" | "WITH" | "SHOW" | "VALUES" | "DESCRIBE" | "EXPLAIN" => Self::Select,
            "INSERT" | "REPLACE" => Self::Insert,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            _ => Self::Other,
        }
    }

    /// Whether executing this kind yields a result stream rather than an affected-row count.
    pub fn returns_rows(self) -> bool {
        matches!(self, Self::Select)
    }
}

/// A built statement: SQL text and its aligned argument list.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    kind: StatementKind,
    sql: String,
    params: Vec<Value>,
}

impl Statement {
    pub(crate) fn new(kind: StatementKind, sql: String, params: Vec<Value>) -> Self {
        Self { kind, sql, params }
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }
}

/// Inputs a builder may need beyond its own state.
#[derive(Clone, Copy)]
pub struct BuildContext<'a> {
    pub dialect: Dialect,
    pub clock: &'a dyn Clock,
}

impl<'a> BuildContext<'a> {
    pub fn new(dialect: Dialect, clock: &'a dyn Clock) -> Self {
        Self { dialect, clock }
    }
}

/// Anything that can produce a [`Statement`].
///
/// Building validates inputs and fails with [`CrudError::Configuration`] before any
/// connection is involved.
pub trait BuildStatement: Sync {
    fn build(&self, ctx: &BuildContext<'_>) -> CrudResult<Statement>;
}

impl BuildStatement for Statement {
    fn build(&self, _ctx: &BuildContext<'_>) -> CrudResult<Statement> {
        Ok(self.clone())
    }
}

/// `SELECT <columns> FROM <table>`; add conditions with [`SelectBuilder::filter`] / `eq`.
pub fn select<I, S>(table: &str, columns: I) -> SelectBuilder
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    SelectBuilder::new(table, columns)
}

/// `SELECT * FROM <table>`.
pub fn select_all(table: &str) -> SelectBuilder {
    SelectBuilder::all(table)
}

/// `INSERT INTO <table> (...) VALUES (...)` with `createtime` and `modifiedtime` stamped.
pub fn insert(table: &str, values: ColumnValues) -> InsertBuilder {
    InsertBuilder::new(table, values)
}

/// `UPDATE <table> SET ...` with `modifiedtime` stamped; add conditions with
/// [`UpdateBuilder::filter`] / `eq`.
pub fn update(table: &str, values: ColumnValues) -> UpdateBuilder {
    UpdateBuilder::new(table, values)
}

/// `DELETE FROM <table> WHERE ...`. An empty condition set fails to build.
pub fn delete(table: &str, conditions: Conditions) -> DeleteBuilder {
    DeleteBuilder::new(table, conditions)
}

/// `DELETE FROM <table>` with no WHERE clause: removes every row.
pub fn delete_all(table: &str) -> DeleteBuilder {
    DeleteBuilder::all(table)
}

/// Caller-written SQL with an ordered argument list.
///
/// The text is used as-is and must already contain placeholders in the syntax of the
/// target database.
pub fn raw<I, V>(sql: &str, params: I) -> CrudResult<Statement>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    if sql.trim().is_empty() {
        return Err(CrudError::configuration("SQL text cannot be empty"));
    }
    Ok(Statement::new(
        StatementKind::from_sql(sql),
        sql.to_string(),
        params.into_iter().map(Into::into).collect(),
    ))
}
