//! Mapped rows and materialized result sets.

use crate::value::Value;
use std::sync::Arc;

/// One result record: column name and value pairs in result-metadata order.
///
/// Duplicate column names are kept; name lookups return the first match and
/// [`Row::get_all`] returns every match.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// `values` must be aligned with `columns`.
    pub(crate) fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value at a column position.
    pub fn get_at(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// First value whose column is named `column`.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// Every value whose column is named `column`, in column order.
    pub fn get_all<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.iter().filter(move |(c, _)| *c == column).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }

    pub fn into_pairs(self) -> Vec<(String, Value)> {
        self.columns.iter().cloned().zip(self.values).collect()
    }

    /// Render as a JSON object. With duplicate column names the last value wins, so use
    /// [`Row::iter`] when duplicates matter.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(self.len());
        for (column, value) in self.iter() {
            map.insert(column.to_string(), value.to_json());
        }
        serde_json::Value::Object(map)
    }
}

/// A fully read query result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    columns: Arc<[String]>,
    rows: Vec<Row>,
}

impl ResultSet {
    pub(crate) fn new(columns: Arc<[String]>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Column names from the result metadata, available even with zero rows.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Render as a JSON array of objects.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.rows.iter().map(Row::to_json).collect())
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Arc<[String]> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn duplicate_columns_are_kept() {
        let row = Row::new(
            cols(&["id", "name", "id"]),
            vec![Value::Int(1), Value::from("a"), Value::Int(2)],
        );
        assert_eq!(row.len(), 3);
        assert_eq!(row.get("id"), Some(&Value::Int(1)));
        let ids: Vec<_> = row.get_all("id").cloned().collect();
        assert_eq!(ids, vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(row.get_at(2), Some(&Value::Int(2)));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn pairs_preserve_order() {
        let row = Row::new(cols(&["b", "a"]), vec![Value::Null, Value::Bool(true)]);
        assert_eq!(
            row.into_pairs(),
            vec![
                ("b".to_string(), Value::Null),
                ("a".to_string(), Value::Bool(true))
            ]
        );
    }

    #[test]
    fn empty_result_keeps_columns() {
        let rs = ResultSet::new(cols(&["id"]), Vec::new());
        assert!(rs.is_empty());
        assert_eq!(rs.columns(), ["id".to_string()]);
        assert_eq!(rs.to_json(), serde_json::json!([]));
    }

    #[test]
    fn json_shape() {
        let c = cols(&["id", "name"]);
        let rs = ResultSet::new(
            c.clone(),
            vec![Row::new(c, vec![Value::Int(1), Value::from("x")])],
        );
        assert_eq!(rs.to_json(), serde_json::json!([{"id": 1, "name": "x"}]));
    }
}
