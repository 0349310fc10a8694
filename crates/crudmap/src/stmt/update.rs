//! UPDATE builder.

use super::insert::writable_column;
use super::writer::SqlWriter;
use super::{BuildContext, BuildStatement, MODIFIED_TIME_COLUMN, Statement, StatementKind};
use crate::columns::{ColumnValues, Conditions};
use crate::error::{CrudError, CrudResult};
use crate::ident::Ident;
use crate::value::Value;

/// UPDATE builder.
///
/// Always sets `modifiedtime` to the build time and never writes `createtime`.
/// Without conditions every row is updated.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    table: String,
    values: ColumnValues,
    conditions: Option<Conditions>,
}

impl UpdateBuilder {
    pub fn new(table: &str, values: ColumnValues) -> Self {
        Self {
            table: table.to_string(),
            values,
            conditions: None,
        }
    }

    /// Set a column value.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.values.set(column, value);
        self
    }

    /// Restrict to rows matching every condition. Replaces earlier conditions.
    pub fn filter(mut self, conditions: Conditions) -> Self {
        self.conditions = Some(conditions);
        self
    }

    /// Add WHERE: column = value
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .get_or_insert_with(Conditions::new)
            .set(column, value);
        self
    }
}

impl BuildStatement for UpdateBuilder {
    fn build(&self, ctx: &BuildContext<'_>) -> CrudResult<Statement> {
        let table = Ident::parse("table", &self.table)?;
        if self.values.is_empty() {
            return Err(CrudError::configuration(format!(
                "update of {table} needs at least one column value"
            )));
        }

        let now = ctx.clock.now();
        let mut w = SqlWriter::new(ctx.dialect);

        w.push("UPDATE ").push(table.as_str()).push(" SET ");
        for (column, value) in self.values.iter() {
            let column = writable_column(column)?;
            w.push(column.as_str()).push(" = ").push_bind(value.clone()).push(", ");
        }
        w.push(MODIFIED_TIME_COLUMN)
            .push(" = ")
            .push_bind(Value::Timestamp(now));

        if let Some(conditions) = &self.conditions {
            w.push_where(conditions)?;
        }

        Ok(w.finish(StatementKind::Update))
    }
}
