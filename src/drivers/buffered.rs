use crate::traits::ResultHandle;
use crate::types::{Row, SqlValue};

/// A native-style result over rows a bridge has already buffered.
///
/// Behaves like the buffered result of a client library: a forward-reading
/// row pointer that can be moved with `data_seek`.
#[derive(Debug, Clone, Default)]
pub struct BufferedResult {
    rows: Vec<Row>,
    pointer: usize,
    freed: bool,
}

impl BufferedResult {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            pointer: 0,
            freed: false,
        }
    }

    /// Builds rows from column names and value lists in column order.
    pub fn from_columns(columns: &[String], rows: Vec<Vec<SqlValue>>) -> Self {
        Self::new(rows.into_iter().map(|values| Row::new(columns, values)).collect())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_freed(&self) -> bool {
        self.freed
    }
}

impl ResultHandle for BufferedResult {
    fn fetch_assoc(&mut self) -> Option<Row> {
        let row = self.rows.get(self.pointer).cloned()?;
        self.pointer += 1;
        Some(row)
    }

    fn data_seek(&mut self, row: usize) -> bool {
        if self.freed || row >= self.rows.len() {
            return false;
        }
        self.pointer = row;
        true
    }

    fn free(&mut self) {
        self.rows.clear();
        self.pointer = 0;
        self.freed = true;
    }
}
