use crate::error::{CursorError, Result};
use crate::types::SqlValue;

/// A single row of a result set.
/// Columns keep the order the backend returned them in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<(String, SqlValue)>,
}

impl Row {
    /// Creates a new Row from column names and values.
    pub fn new(columns: &[String], values: Vec<SqlValue>) -> Self {
        let values = columns
            .iter()
            .zip(values)
            .map(|(col, val)| (col.clone(), val))
            .collect();
        Self { values }
    }

    /// Gets a value by column name.
    pub fn get(&self, column: &str) -> Result<&SqlValue> {
        self.value(column)
            .ok_or_else(|| CursorError::ColumnNotFound(column.to_string()))
    }

    /// Gets a value by column name, if present.
    pub fn value(&self, column: &str) -> Option<&SqlValue> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    /// The first value by column order.
    pub fn first(&self) -> Option<&SqlValue> {
        self.values.first().map(|(_, v)| v)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.value(column).is_some()
    }

    /// Sets a column. An existing column keeps its position, a new one is appended.
    pub fn insert(&mut self, column: impl Into<String>, value: SqlValue) {
        let column = column.into();
        match self.values.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.values.push((column, value)),
        }
    }

    /// Removes a column, returning its value.
    pub fn remove(&mut self, column: &str) -> Option<SqlValue> {
        let index = self.values.iter().position(|(name, _)| name == column)?;
        Some(self.values.remove(index).1)
    }

    /// Returns all column names in this row.
    pub fn columns(&self) -> Vec<&str> {
        self.values.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.values.iter().map(|(name, v)| (name.as_str(), v))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut SqlValue)> {
        self.values.iter_mut().map(|(name, v)| (name.as_str(), v))
    }

    pub fn into_values(self) -> Vec<SqlValue> {
        self.values.into_iter().map(|(_, v)| v).collect()
    }

    /// Returns the number of columns in this row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, SqlValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, SqlValue)>>(iter: I) -> Self {
        let mut row = Row::default();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}
