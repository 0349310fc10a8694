//! Table and column name validation.
//!
//! Identifiers are the only caller input spliced into statement text, so they are
//! restricted to plain, optionally dotted names:
//!
//! - each part matches `[A-Za-z_][A-Za-z0-9_$]*`
//! - parts are joined by `.` (e.g. `shop.orders`), with no empty parts
//!
//! Quoting is not supported; a name that needs quoting is rejected.

use crate::error::{CrudError, CrudResult};
use std::fmt;

/// A validated table or column name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(String);

impl Ident {
    /// Parse and validate an identifier. `what` names the role in error messages
    /// (e.g. "table", "column").
    pub fn parse(what: &str, s: &str) -> CrudResult<Self> {
        if s.is_empty() {
            return Err(CrudError::configuration(format!("{what} name cannot be empty")));
        }

        for part in s.split('.') {
            if part.is_empty() {
                return Err(CrudError::configuration(format!(
                    "{what} name '{s}' has an empty part"
                )));
            }
            let mut chars = part.chars();
            let first_ok = chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
            if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
                return Err(CrudError::configuration(format!(
                    "invalid {what} name '{s}'"
                )));
            }
        }

        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive name comparison.
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ident {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
