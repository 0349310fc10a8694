//! SELECT builder.

use super::writer::SqlWriter;
use super::{BuildContext, BuildStatement, Statement, StatementKind};
use crate::columns::Conditions;
use crate::error::{CrudError, CrudResult};
use crate::ident::Ident;
use crate::value::Value;

#[derive(Debug, Clone)]
enum Projection {
    Star,
    Columns(Vec<String>),
}

/// SELECT query builder.
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    table: String,
    projection: Projection,
    conditions: Option<Conditions>,
}

impl SelectBuilder {
    /// Project the listed columns, in the given order.
    pub fn new<I, S>(table: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            table: table.to_string(),
            projection: Projection::Columns(
                columns.into_iter().map(|c| c.as_ref().to_string()).collect(),
            ),
            conditions: None,
        }
    }

    /// Project `*`.
    pub fn all(table: &str) -> Self {
        Self {
            table: table.to_string(),
            projection: Projection::Star,
            conditions: None,
        }
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

impl BuildStatement for SelectBuilder {
    fn build(&self, ctx: &BuildContext<'_>) -> CrudResult<Statement> {
        let table = Ident::parse("table", &self.table)?;
        let mut w = SqlWriter::new(ctx.dialect);

        w.push("SELECT ");
        match &self.projection {
            Projection::Star => {
                w.push("*");
            }
            Projection::Columns(columns) => {
                if columns.is_empty() {
                    return Err(CrudError::configuration(format!(
                        "select from {table} needs at least one column"
                    )));
                }
                for (i, column) in columns.iter().enumerate() {
                    let column = Ident::parse("column", column)?;
                    if i > 0 {
                        w.push(", ");
                    }
                    w.push(column.as_str());
                }
            }
        }
        w.push(" FROM ").push(table.as_str());

        if let Some(conditions) = &self.conditions {
            w.push_where(conditions)?;
        }

        Ok(w.finish(StatementKind::Select))
    }
}
