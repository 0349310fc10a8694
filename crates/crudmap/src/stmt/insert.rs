//! INSERT builder.

use super::writer::SqlWriter;
use super::{
    BuildContext, BuildStatement, CREATE_TIME_COLUMN, MODIFIED_TIME_COLUMN, Statement,
    StatementKind,
};
use crate::columns::ColumnValues;
use crate::error::{CrudError, CrudResult};
use crate::ident::Ident;
use crate::value::Value;

/// INSERT builder for a single row.
///
/// Appends `createtime` and `modifiedtime`, both bound to the same instant read once from
/// the clock at build time.
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table: String,
    values: ColumnValues,
}

impl InsertBuilder {
    pub fn new(table: &str, values: ColumnValues) -> Self {
        Self {
            table: table.to_string(),
            values,
        }
    }

    /// Set a column value.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.values.set(column, value);
        self
    }
}

/// Validate a caller column and reject the stamp columns the builders own.
pub(super) fn writable_column(column: &str) -> CrudResult<Ident> {
    let ident = Ident::parse("column", column)?;
    if ident.eq_ignore_case(CREATE_TIME_COLUMN) || ident.eq_ignore_case(MODIFIED_TIME_COLUMN) {
        return Err(CrudError::configuration(format!(
            "column '{ident}' is stamped automatically and cannot be set"
        )));
    }
    Ok(ident)
}

impl BuildStatement for InsertBuilder {
    fn build(&self, ctx: &BuildContext<'_>) -> CrudResult<Statement> {
        let table = Ident::parse("table", &self.table)?;
        if self.values.is_empty() {
            return Err(CrudError::configuration(format!(
                "insert into {table} needs at least one column value"
            )));
        }

        let columns = self
            .values
            .columns()
            .map(writable_column)
            .collect::<CrudResult<Vec<_>>>()?;

        let now = ctx.clock.now();
        let mut w = SqlWriter::new(ctx.dialect);

        w.push("INSERT INTO ").push(table.as_str()).push(" (");
        for column in &columns {
            w.push(column.as_str()).push(", ");
        }
        w.push(CREATE_TIME_COLUMN)
            .push(", ")
            .push(MODIFIED_TIME_COLUMN)
            .push(") VALUES (");
        for value in self.values.values() {
            w.push_bind(value.clone()).push(", ");
        }
        w.push_bind(Value::Timestamp(now))
            .push(", ")
            .push_bind(Value::Timestamp(now))
            .push(")");

        Ok(w.finish(StatementKind::Insert))
    }
}
