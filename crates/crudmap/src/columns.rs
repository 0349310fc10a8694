//! Named column values with a fixed iteration order.
//!
//! The same structure backs both the values written by INSERT/UPDATE and the equality
//! conditions of a WHERE clause. Iteration follows insertion order; setting a column a
//! second time replaces its value without moving it. Builders walk the map once and emit
//! placeholders and arguments from that single pass, so positions always line up.
//!
//! Column names are matched ASCII case-insensitively, as SQL identifiers are; the first
//! spelling used for a column is the one kept.

use crate::value::Value;

/// Insertion-ordered mapping from column name to [`Value`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMap {
    entries: Vec<(String, Value)>,
}

/// Values to write, keyed by column.
pub type ColumnValues = ColumnMap;

/// Equality conditions combined with AND.
pub type Conditions = ColumnMap;

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`ColumnMap::set`].
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case(column))
    }

    /// Set `column` to `value`, replacing an existing entry in place.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.position(column) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((column.to_string(), value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.position(column).map(|i| &self.entries[i].1)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let pos = self.position(column)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for ColumnMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ColumnMap::new();
        map.extend(iter);
        map
    }
}

impl<K: AsRef<str>, V: Into<Value>> Extend<(K, V)> for ColumnMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k.as_ref(), v);
        }
    }
}

impl<K: AsRef<str>, V: Into<Value>, const N: usize> From<[(K, V); N]> for ColumnMap {
    fn from(arr: [(K, V); N]) -> Self {
        arr.into_iter().collect()
    }
}

impl IntoIterator for ColumnMap {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
