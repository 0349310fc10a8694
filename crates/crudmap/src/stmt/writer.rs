use super::{Dialect, Statement, StatementKind};
use crate::columns::Conditions;
use crate::error::{CrudError, CrudResult};
use crate::ident::Ident;
use crate::value::Value;
use std::fmt::Write as _;

/// Accumulates SQL text and arguments; every bound value gets its placeholder here.
pub(super) struct SqlWriter {
    dialect: Dialect,
    sql: String,
    params: Vec<Value>,
}

impl SqlWriter {
    pub(super) fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::with_capacity(64),
            params: Vec::new(),
        }
    }

    pub(super) fn push(&mut self, s: &str) -> &mut Self {
        self.sql.push_str(s);
        self
    }

    /// Append a placeholder and record `value` as its argument.
    pub(super) fn push_bind(&mut self, value: Value) -> &mut Self {
        self.params.push(value);
        match self.dialect {
            Dialect::MySql => self.sql.push('?'),
            Dialect::Postgres => {
                let _ = write!(self.sql, "${}", self.params.len());
            }
        }
        self
    }

    /// Append `" WHERE a = ? AND b IS NULL ..."` for a non-empty condition set.
    pub(super) fn push_where(&mut self, conditions: &Conditions) -> CrudResult<&mut Self> {
        if conditions.is_empty() {
            return Err(CrudError::configuration(
                "condition set is empty; omit it to target every row",
            ));
        }

        self.push(" WHERE ");
        for (i, (column, value)) in conditions.iter().enumerate() {
            let column = Ident::parse("condition column", column)?;
            if i > 0 {
                self.push(" AND ");
            }
            self.push(column.as_str());
            if value.is_null() {
                self.push(" IS NULL");
            } else {
                self.push(" = ").push_bind(value.clone());
            }
        }
        Ok(self)
    }

    pub(super) fn finish(self, kind: StatementKind) -> Statement {
        Statement::new(kind, self.sql, self.params)
    }
}
