//! DELETE builder.

use super::writer::SqlWriter;
use super::{BuildContext, BuildStatement, Statement, StatementKind};
use crate::columns::Conditions;
use crate::error::CrudResult;
use crate::ident::Ident;
use crate::value::Value;

#[derive(Debug, Clone)]
enum DeleteScope {
    Matching(Conditions),
    AllRows,
}

/// DELETE builder.
///
/// A builder made with [`DeleteBuilder::new`] must carry at least one condition or it
/// fails to build; removing every row takes [`DeleteBuilder::all`].
#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    table: String,
    scope: DeleteScope,
}

impl DeleteBuilder {
    pub fn new(table: &str, conditions: Conditions) -> Self {
        Self {
            table: table.to_string(),
            scope: DeleteScope::Matching(conditions),
        }
    }

    /// Delete every row of `table`.
    pub fn all(table: &str) -> Self {
        Self {
            table: table.to_string(),
            scope: DeleteScope::AllRows,
        }
    }

    /// Add WHERE: column = value. Narrows a delete-all builder to matching rows.
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        match &mut self.scope {
            DeleteScope::Matching(conditions) => conditions.set(column, value),
            DeleteScope::AllRows => {
                self.scope = DeleteScope::Matching(Conditions::new().with(column, value));
            }
        }
        self
    }

    /// Whether this builder removes every row.
    pub fn is_delete_all(&self) -> bool {
        matches!(self.scope, DeleteScope::AllRows)
    }
}

impl BuildStatement for DeleteBuilder {
    fn build(&self, ctx: &BuildContext<'_>) -> CrudResult<Statement> {
        let table = Ident::parse("table", &self.table)?;
        let mut w = SqlWriter::new(ctx.dialect);

        w.push("DELETE FROM ").push(table.as_str());
        if let DeleteScope::Matching(conditions) = &self.scope {
            w.push_where(conditions)?;
        }

        Ok(w.finish(StatementKind::Delete))
    }
}
