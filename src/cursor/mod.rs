//! The result cursor: one sequential, seekable view over whatever a driver
//! bridge handed back for a completed statement.
//!
//! A cursor is created empty by the query runner, populated through the
//! `set_*` methods, then iterated by the caller. The first row is only
//! read when something asks for it.

mod backend;
mod normalize;

pub use backend::RawResult;
pub use normalize::{Diagnostic, LIMIT_OFFSET_COLUMN, NATIONAL_COLUMN_PREFIX};

use crate::charset::CharacterSet;
use crate::config::{BackendKind, CursorConfig, DbKind, DriverQuirks};
use crate::error::{CursorError, Result};
use crate::types::{Row, SqlValue};
use backend::BackendAdapter;
use normalize::Normalizer;

/// A completed statement's result set.
///
/// # Example
/// ```
/// use unicursor::{BackendKind, CursorConfig, DbKind, RawResult, ResultCursor, Row, SqlValue};
///
/// let mut cursor = ResultCursor::new(CursorConfig::new(DbKind::Sqlite, BackendKind::InMemoryArray));
/// let rows: Vec<Row> = (1..=3)
///     .map(|id| [("id", SqlValue::Int32(id))].into_iter().collect())
///     .collect();
/// cursor.set_result(RawResult::Rows(rows)).unwrap();
/// cursor.set_returned_rows(3);
///
/// assert_eq!(cursor.fetch_scalar().unwrap(), SqlValue::Int32(1));
/// assert_eq!(cursor.fetch_all_rows().unwrap().len(), 3);
/// ```
#[derive(Debug)]
pub struct ResultCursor {
    db_kind: DbKind,
    backend_kind: BackendKind,
    character_set: Option<CharacterSet>,
    quirks: DriverQuirks,
    backend: BackendAdapter,
    sql: String,
    untranslated_sql: Option<String>,
    returned_rows: usize,
    affected_rows: u64,
    auto_incremented_value: Option<i64>,
    pointer: Option<usize>,
    current_row: Option<Row>,
    diagnostics: Vec<Diagnostic>,
}

impl ResultCursor {
    /// Creates an empty cursor. Non-buffering backends are read from a
    /// row array from here on.
    pub fn new(config: CursorConfig) -> Self {
        let backend_kind = config.backend_kind.normalize();
        if backend_kind != config.backend_kind {
            tracing::debug!(
                requested = %config.backend_kind,
                backend = %backend_kind,
                "backend cannot buffer results, reading from a row array instead"
            );
        }

        let character_set = match config.character_set {
            Some(charset) if config.db_kind != DbKind::SqlServer => {
                tracing::debug!(
                    db = %config.db_kind,
                    charset = %charset,
                    "character set ignored outside SQL Server"
                );
                None
            }
            other => other,
        };

        Self {
            db_kind: config.db_kind,
            backend_kind: config.backend_kind,
            character_set,
            quirks: config.quirks,
            backend: BackendAdapter::new(backend_kind),
            sql: String::new(),
            untranslated_sql: None,
            returned_rows: 0,
            affected_rows: 0,
            auto_incremented_value: None,
            pointer: None,
            current_row: None,
            diagnostics: Vec::new(),
        }
    }

    /// Hands the raw result to the cursor, which owns it from here on.
    /// A previously attached result is released first.
    pub fn set_result(&mut self, result: RawResult) -> Result<()> {
        self.backend.attach(result)?;
        self.pointer = None;
        self.current_row = None;
        Ok(())
    }

    /// Sets the number of rows available. Any non-zero count marks the
    /// statement as a read, so the affected row count is reset.
    pub fn set_returned_rows(&mut self, returned_rows: usize) {
        self.returned_rows = returned_rows;
        if returned_rows > 0 {
            self.affected_rows = 0;
        }
    }

    /// Sets the number of rows a write statement touched.
    pub fn set_affected_rows(&mut self, affected_rows: u64) {
        self.affected_rows = affected_rows;
    }

    /// Zero means the statement generated no value.
    pub fn set_auto_incremented_value(&mut self, value: i64) {
        self.auto_incremented_value = (value != 0).then_some(value);
    }

    /// Sets the statement text as it was sent to the server.
    pub fn set_sql(&mut self, sql: impl Into<String>) {
        self.sql = sql.into();
    }

    /// Sets the statement as written, before dialect translation.
    pub fn set_untranslated_sql(&mut self, sql: impl Into<String>) {
        self.untranslated_sql = Some(sql.into());
    }

    /// The database family the result came from.
    pub fn db_kind(&self) -> DbKind {
        self.db_kind
    }

    /// The backend the cursor was created for.
    pub fn backend_kind(&self) -> BackendKind {
        self.backend_kind
    }

    /// The number of rows a write statement touched. Zero for reads.
    pub fn count_affected_rows(&self) -> u64 {
        self.affected_rows
    }

    /// The number of rows the statement returned.
    pub fn count_returned_rows(&self) -> usize {
        self.returned_rows
    }

    /// The key generated by an insert, if any.
    pub fn auto_incremented_value(&self) -> Option<i64> {
        self.auto_incremented_value
    }

    /// The statement text as sent to the server.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The statement as written, if it was translated before running.
    pub fn untranslated_sql(&self) -> Option<&str> {
        self.untranslated_sql.as_deref()
    }

    /// The backend-native result. Reading from or moving a native handle
    /// directly desynchronizes it from the cursor position.
    pub fn raw_result(&self) -> Option<&RawResult> {
        self.backend.result()
    }

    /// Mutable access to the backend-native result. See `raw_result`.
    pub fn raw_result_mut(&mut self) -> Option<&mut RawResult> {
        self.backend.result_mut()
    }

    /// Driver-defect notices recorded while decoding rows.
    ///
    /// Each distinct notice is kept once, however many rows raise it.
    /// Every occurrence is still logged as a warning.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Drains the recorded notices.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Fails with `NoRows` when the statement neither returned nor affected rows.
    pub fn require_rows(&self, message: Option<&str>) -> Result<()> {
        if self.returned_rows == 0 && self.affected_rows == 0 {
            let message = message.unwrap_or("No rows were returned or affected by the query");
            return Err(CursorError::NoRows(message.to_string()));
        }
        Ok(())
    }

    /// Whether `current` would return a row. An unprimed cursor with rows is valid.
    pub fn is_valid(&self) -> bool {
        if self.returned_rows == 0 {
            return false;
        }
        match self.pointer {
            None => true,
            Some(position) => position < self.returned_rows,
        }
    }

    /// Returns the current row, reading the first row on first use.
    pub fn current(&mut self) -> Result<&Row> {
        if self.returned_rows == 0 {
            return Err(no_rows());
        }
        if !self.is_valid() {
            return Err(CursorError::NoRemaining("There are no remaining rows".to_string()));
        }
        let position = self.prime()?;
        self.current_row
            .as_ref()
            .ok_or(CursorError::RowUnavailable { row: position })
    }

    /// Moves to the next row. Moving past the last row is not an error;
    /// the cursor just stops being valid.
    pub fn advance(&mut self) -> Result<()> {
        let position = self.prime()?;
        let next = (position + 1).min(self.returned_rows);
        self.pointer = Some(next);
        if next < self.returned_rows {
            self.materialize(next);
        } else {
            self.current_row = None;
        }
        Ok(())
    }

    /// The zero-based position of the current row.
    pub fn key(&mut self) -> Result<usize> {
        self.prime()
    }

    /// Seeks back to the first row. A result without rows is left as is.
    pub fn restart(&mut self) {
        if let Err(err) = self.seek(0) {
            tracing::debug!(error = %err, "rewind ignored");
        }
    }

    /// Positions the cursor on `row` and reads it.
    pub fn seek(&mut self, row: i64) -> Result<()> {
        if self.returned_rows == 0 {
            return Err(no_rows());
        }
        let target = usize::try_from(row)
            .ok()
            .filter(|target| *target < self.returned_rows)
            .ok_or(CursorError::RowOutOfRange {
                row,
                count: self.returned_rows,
            })?;

        self.pointer = Some(target);
        if !self.backend.seek_to(target) {
            self.current_row = None;
            return Err(CursorError::SeekFailed { row: target });
        }
        self.materialize(target);
        Ok(())
    }

    /// Returns the current row and moves past it.
    pub fn fetch_row(&mut self) -> Result<Row> {
        let row = self.current()?.clone();
        self.advance()?;
        Ok(row)
    }

    /// Returns the first column of the current row and moves past it.
    pub fn fetch_scalar(&mut self) -> Result<SqlValue> {
        let row = self.fetch_row()?;
        Ok(row.into_values().into_iter().next().unwrap_or(SqlValue::Null))
    }

    /// Like `fetch_row`, but reports the end of the result as `None`
    /// instead of an error. A result without rows yields `None` at once.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        if !self.is_valid() {
            return Ok(None);
        }
        self.fetch_row().map(Some)
    }

    /// Reads every row from the first one on, leaving the cursor exhausted.
    ///
    /// Fails with `NoRows` for a result without rows; check
    /// `count_returned_rows` first when that case is expected.
    pub fn fetch_all_rows(&mut self) -> Result<Vec<Row>> {
        self.seek(0)?;
        Rows::new(self).collect()
    }

    /// Iterates from the first row, like `restart` followed by repeated `next_row`.
    pub fn rows(&mut self) -> Rows<'_> {
        self.restart();
        Rows::new(self)
    }

    fn prime(&mut self) -> Result<usize> {
        if let Some(position) = self.pointer {
            return Ok(position);
        }
        if self.returned_rows == 0 {
            return Err(no_rows());
        }
        self.pointer = Some(0);
        self.materialize(0);
        Ok(0)
    }

    fn materialize(&mut self, position: usize) {
        let normalizer = Normalizer {
            db_kind: self.db_kind,
            backend_kind: self.backend.kind(),
            character_set: self.character_set,
            quirks: self.quirks,
            sql: &self.sql,
            untranslated_sql: self.untranslated_sql.as_deref(),
        };
        let mut found = Vec::new();
        let raw = self.backend.fetch_row_at(position);
        self.current_row = raw.map(|row| normalizer.apply(row, &mut found));

        for diagnostic in found {
            if !self.diagnostics.contains(&diagnostic) {
                self.diagnostics.push(diagnostic);
            }
        }
    }
}

fn no_rows() -> CursorError {
    CursorError::NoRows("The query did not return any rows".to_string())
}

/// Iterator over the remaining rows of a cursor.
/// Stops after the first error.
pub struct Rows<'a> {
    cursor: &'a mut ResultCursor,
    done: bool,
}

impl<'a> Rows<'a> {
    fn new(cursor: &'a mut ResultCursor) -> Self {
        Self {
            cursor,
            done: false,
        }
    }
}

impl Iterator for Rows<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.cursor.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<'a> IntoIterator for &'a mut ResultCursor {
    type Item = Result<Row>;
    type IntoIter = Rows<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::traits::ResultHandle;

    fn id_rows(ids: &[i32]) -> Vec<Row> {
        ids.iter()
            .map(|id| [("id", SqlValue::Int32(*id))].into_iter().collect())
            .collect()
    }

    fn array_cursor(ids: &[i32]) -> ResultCursor {
        let mut cursor =
            ResultCursor::new(CursorConfig::new(DbKind::MySql, BackendKind::InMemoryArray));
        cursor.set_result(RawResult::Rows(id_rows(ids))).unwrap();
        cursor.set_returned_rows(ids.len());
        cursor
    }

    /// A native handle that counts frees and can refuse to seek.
    struct CountingHandle {
        rows: Vec<Row>,
        pointer: usize,
        frees: Arc<AtomicUsize>,
        refuse_seek: bool,
    }

    impl CountingHandle {
        fn new(ids: &[i32], frees: Arc<AtomicUsize>) -> Self {
            Self {
                rows: id_rows(ids),
                pointer: 0,
                frees,
                refuse_seek: false,
            }
        }
    }

    impl ResultHandle for CountingHandle {
        fn fetch_assoc(&mut self) -> Option<Row> {
            let row = self.rows.get(self.pointer).cloned();
            self.pointer += 1;
            row
        }

        fn data_seek(&mut self, row: usize) -> bool {
            if self.refuse_seek || row >= self.rows.len() {
                return false;
            }
            self.pointer = row;
            true
        }

        fn free(&mut self) {
            self.frees.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn native_cursor(kind: BackendKind, handle: CountingHandle) -> ResultCursor {
        let rows = handle.rows.len();
        let mut cursor = ResultCursor::new(CursorConfig::new(DbKind::MySql, kind));
        cursor.set_result(RawResult::Handle(Box::new(handle))).unwrap();
        cursor.set_returned_rows(rows);
        cursor
    }

    #[test]
    fn test_empty_result_contract() {
        let mut cursor = array_cursor(&[]);

        assert!(!cursor.is_valid());
        assert!(cursor.current().unwrap_err().is_no_rows());
        assert!(cursor.key().unwrap_err().is_no_rows());
        assert!(cursor.seek(0).unwrap_err().is_no_rows());
        assert!(cursor.seek(-1).unwrap_err().is_no_rows());
        assert!(cursor.advance().unwrap_err().is_no_rows());
        cursor.restart();
        assert!(cursor.fetch_all_rows().unwrap_err().is_no_rows());
        assert_eq!(cursor.next_row().unwrap(), None);
        assert_eq!(cursor.rows().count(), 0);
    }

    #[test]
    fn test_lazy_priming() {
        let mut cursor = array_cursor(&[1, 2]);

        assert!(cursor.is_valid());
        assert_eq!(cursor.key().unwrap(), 0);
        assert_eq!(cursor.current().unwrap().get("id").unwrap(), &SqlValue::Int32(1));
    }

    #[test]
    fn test_fetch_row_drains_then_exhausts() {
        let mut cursor = array_cursor(&[1, 2, 3]);

        for id in 1..=3 {
            let row = cursor.fetch_row().unwrap();
            assert_eq!(row.get("id").unwrap(), &SqlValue::Int32(id));
        }
        assert!(!cursor.is_valid());
        assert!(cursor.fetch_row().unwrap_err().is_exhausted());
        assert!(cursor.current().unwrap_err().is_exhausted());
        assert_eq!(cursor.key().unwrap(), 3);
    }

    #[test]
    fn test_advance_past_end_is_not_an_error() {
        let mut cursor = array_cursor(&[1]);

        cursor.advance().unwrap();
        cursor.advance().unwrap();
        assert_eq!(cursor.key().unwrap(), 1);
        assert!(!cursor.is_valid());
    }

    #[test]
    fn test_seek_repositions() {
        let mut cursor = array_cursor(&[10, 20, 30]);

        cursor.seek(2).unwrap();
        assert_eq!(cursor.key().unwrap(), 2);
        assert_eq!(cursor.current().unwrap().get("id").unwrap(), &SqlValue::Int32(30));

        cursor.seek(1).unwrap();
        assert_eq!(cursor.fetch_scalar().unwrap(), SqlValue::Int32(20));
        assert_eq!(cursor.fetch_scalar().unwrap(), SqlValue::Int32(30));
    }

    #[test]
    fn test_seek_out_of_range() {
        let mut cursor = array_cursor(&[1, 2, 3]);

        for row in [-1, 3] {
            match cursor.seek(row).unwrap_err() {
                CursorError::RowOutOfRange { row: r, count } => {
                    assert_eq!(r, row);
                    assert_eq!(count, 3);
                }
                other => panic!("Expected RowOutOfRange, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_fetch_scalar_sequence() {
        let mut cursor = array_cursor(&[1, 2, 3]);

        assert_eq!(cursor.fetch_scalar().unwrap(), SqlValue::Int32(1));
        assert_eq!(cursor.fetch_scalar().unwrap(), SqlValue::Int32(2));
        assert_eq!(cursor.fetch_scalar().unwrap(), SqlValue::Int32(3));
        assert!(cursor.fetch_scalar().unwrap_err().is_exhausted());
    }

    #[test]
    fn test_fetch_scalar_uses_column_order() {
        let row: Row = [("z", SqlValue::from("first")), ("a", SqlValue::from("second"))]
            .into_iter()
            .collect();
        let mut cursor =
            ResultCursor::new(CursorConfig::new(DbKind::Postgres, BackendKind::InMemoryArray));
        cursor.set_result(RawResult::Rows(vec![row])).unwrap();
        cursor.set_returned_rows(1);

        assert_eq!(cursor.fetch_scalar().unwrap(), SqlValue::from("first"));
    }

    #[test]
    fn test_fetch_all_rows_resets_and_exhausts() {
        let mut cursor = array_cursor(&[1, 2, 3]);
        cursor.fetch_row().unwrap();

        let rows = cursor.fetch_all_rows().unwrap();
        assert_eq!(rows, id_rows(&[1, 2, 3]));
        assert!(!cursor.is_valid());

        assert_eq!(cursor.fetch_all_rows().unwrap().len(), 3);
    }

    #[test]
    fn test_rows_iterator_rewinds() {
        let mut cursor = array_cursor(&[1, 2]);
        cursor.fetch_row().unwrap();
        cursor.fetch_row().unwrap();

        let ids: Vec<SqlValue> = (&mut cursor)
            .into_iter()
            .map(|row| row.unwrap().get("id").unwrap().clone())
            .collect();
        assert_eq!(ids, vec![SqlValue::Int32(1), SqlValue::Int32(2)]);
    }

    #[test]
    fn test_returned_rows_resets_affected_rows() {
        let mut cursor = array_cursor(&[]);

        cursor.set_affected_rows(3);
        cursor.set_returned_rows(0);
        assert_eq!(cursor.count_affected_rows(), 3);

        cursor.set_returned_rows(5);
        assert_eq!(cursor.count_affected_rows(), 0);

        cursor.set_affected_rows(3);
        assert_eq!(cursor.count_affected_rows(), 3);
        cursor.set_returned_rows(0);
        assert_eq!(cursor.count_affected_rows(), 3);
    }

    #[test]
    fn test_require_rows() {
        let mut cursor = array_cursor(&[]);
        match cursor.require_rows(None).unwrap_err() {
            CursorError::NoRows(msg) => {
                assert_eq!(msg, "No rows were returned or affected by the query")
            }
            other => panic!("Expected NoRows, got {other:?}"),
        }
        match cursor.require_rows(Some("user not found")).unwrap_err() {
            CursorError::NoRows(msg) => assert_eq!(msg, "user not found"),
            other => panic!("Expected NoRows, got {other:?}"),
        }

        for (returned, affected) in [(0, 7), (3, 0), (3, 3)] {
            cursor.set_returned_rows(returned);
            cursor.set_affected_rows(affected);
            cursor.require_rows(None).unwrap();
        }
    }

    #[test]
    fn test_auto_incremented_zero_is_absent() {
        let mut cursor = array_cursor(&[]);
        cursor.set_auto_incremented_value(0);
        assert_eq!(cursor.auto_incremented_value(), None);
        cursor.set_auto_incremented_value(42);
        assert_eq!(cursor.auto_incremented_value(), Some(42));
    }

    #[test]
    fn test_non_buffering_backend_reads_arrays() {
        for kind in [BackendKind::Odbc, BackendKind::Pdo, BackendKind::SqlSrv] {
            let mut cursor = ResultCursor::new(CursorConfig::new(DbKind::SqlServer, kind));
            assert_eq!(cursor.backend_kind(), kind);

            cursor.set_result(RawResult::Rows(id_rows(&[7]))).unwrap();
            cursor.set_returned_rows(1);
            assert_eq!(cursor.fetch_scalar().unwrap(), SqlValue::Int32(7));
        }
    }

    #[test]
    fn test_mismatched_result_is_rejected() {
        let mut cursor = array_cursor(&[]);
        let frees = Arc::new(AtomicUsize::new(0));
        let err = cursor
            .set_result(RawResult::Handle(Box::new(CountingHandle::new(&[1], frees))))
            .unwrap_err();
        assert!(matches!(err, CursorError::Configuration(_)));

        let mut cursor = ResultCursor::new(CursorConfig::new(DbKind::MySql, BackendKind::MySql));
        let err = cursor.set_result(RawResult::Rows(Vec::new())).unwrap_err();
        assert!(matches!(err, CursorError::Configuration(_)));
    }

    #[test]
    fn test_native_handle_seek_and_stream() {
        let frees = Arc::new(AtomicUsize::new(0));
        let mut cursor =
            native_cursor(BackendKind::MySqlImproved, CountingHandle::new(&[1, 2, 3], frees));

        assert_eq!(cursor.fetch_scalar().unwrap(), SqlValue::Int32(1));
        cursor.seek(2).unwrap();
        assert_eq!(cursor.fetch_scalar().unwrap(), SqlValue::Int32(3));
        let all: Vec<SqlValue> = cursor
            .fetch_all_rows()
            .unwrap()
            .into_iter()
            .map(|row| row.get("id").unwrap().clone())
            .collect();
        assert_eq!(all, vec![SqlValue::Int32(1), SqlValue::Int32(2), SqlValue::Int32(3)]);
    }

    #[test]
    fn test_backend_seek_failure() {
        let frees = Arc::new(AtomicUsize::new(0));
        let mut handle = CountingHandle::new(&[1, 2], frees);
        handle.refuse_seek = true;
        let mut cursor = native_cursor(BackendKind::Postgres, handle);

        match cursor.seek(1).unwrap_err() {
            CursorError::SeekFailed { row } => assert_eq!(row, 1),
            other => panic!("Expected SeekFailed, got {other:?}"),
        }
        assert!(matches!(
            cursor.current().unwrap_err(),
            CursorError::RowUnavailable { row: 1 }
        ));
        cursor.restart();
    }

    #[test]
    fn test_short_backend_result_is_reported() {
        let frees = Arc::new(AtomicUsize::new(0));
        let handle = CountingHandle::new(&[1], frees);
        let mut cursor = ResultCursor::new(CursorConfig::new(DbKind::MySql, BackendKind::MySql));
        cursor.set_result(RawResult::Handle(Box::new(handle))).unwrap();
        cursor.set_returned_rows(2);

        assert_eq!(cursor.fetch_scalar().unwrap(), SqlValue::Int32(1));
        assert!(matches!(
            cursor.current().unwrap_err(),
            CursorError::RowUnavailable { row: 1 }
        ));
    }

    #[test]
    fn test_handle_released_exactly_once() {
        let frees = Arc::new(AtomicUsize::new(0));
        {
            let mut cursor = native_cursor(
                BackendKind::Postgres,
                CountingHandle::new(&[1, 2], Arc::clone(&frees)),
            );
            cursor.fetch_row().unwrap();
        }
        assert_eq!(frees.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_replacing_handle_releases_previous() {
        let frees = Arc::new(AtomicUsize::new(0));
        let mut cursor = native_cursor(
            BackendKind::SqlServerLegacy,
            CountingHandle::new(&[1], Arc::clone(&frees)),
        );
        cursor
            .set_result(RawResult::Handle(Box::new(CountingHandle::new(
                &[2],
                Arc::clone(&frees),
            ))))
            .unwrap();
        assert_eq!(frees.load(Ordering::SeqCst), 1);
        assert_eq!(cursor.fetch_scalar().unwrap(), SqlValue::Int32(2));

        drop(cursor);
        assert_eq!(frees.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_sqlite_handle_is_not_freed() {
        let frees = Arc::new(AtomicUsize::new(0));
        let cursor = native_cursor(
            BackendKind::Sqlite,
            CountingHandle::new(&[1], Arc::clone(&frees)),
        );
        drop(cursor);
        assert_eq!(frees.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_national_column_through_cursor() {
        let row: Row = [("__flourish_mssqln_name", SqlValue::from(vec![0x41u8, 0x00]))]
            .into_iter()
            .collect();
        let mut cursor =
            ResultCursor::new(CursorConfig::new(DbKind::SqlServer, BackendKind::InMemoryArray));
        cursor.set_sql("SELECT CAST(name AS VARBINARY(MAX)) AS __flourish_mssqln_name FROM t");
        cursor.set_result(RawResult::Rows(vec![row])).unwrap();
        cursor.set_returned_rows(1);

        let row = cursor.fetch_row().unwrap();
        assert_eq!(row.get("name").unwrap(), &SqlValue::from("A"));
        assert!(!row.contains("__flourish_mssqln_name"));
    }

    #[test]
    fn test_dblib_single_space_through_cursor() {
        let frees = Arc::new(AtomicUsize::new(0));
        let mut handle = CountingHandle::new(&[], frees);
        handle.rows = vec![[("note", SqlValue::from(" "))].into_iter().collect()];
        let config = CursorConfig::new(DbKind::SqlServer, BackendKind::SqlServerLegacy)
            .with_quirks(DriverQuirks { dblib: true });
        let mut cursor = ResultCursor::new(config);
        cursor.set_result(RawResult::Handle(Box::new(handle))).unwrap();
        cursor.set_returned_rows(1);

        let row = cursor.fetch_row().unwrap();
        assert_eq!(row.get("note").unwrap(), &SqlValue::from(""));
        let diagnostics = cursor.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].column(), "note");
        assert!(cursor.diagnostics().is_empty());
    }

    #[test]
    fn test_repeated_diagnostics_are_kept_once() {
        let long_name = "c".repeat(30);
        let rows: Vec<Row> = (0..500)
            .map(|i| {
                [
                    (long_name.as_str(), SqlValue::Int32(i)),
                    ("note", SqlValue::from(" ")),
                ]
                .into_iter()
                .collect()
            })
            .collect();
        let frees = Arc::new(AtomicUsize::new(0));
        let mut handle = CountingHandle::new(&[], frees);
        handle.rows = rows;
        let config = CursorConfig::new(DbKind::SqlServer, BackendKind::SqlServerLegacy)
            .with_quirks(DriverQuirks { dblib: true });
        let mut cursor = ResultCursor::new(config);
        cursor.set_result(RawResult::Handle(Box::new(handle))).unwrap();
        cursor.set_returned_rows(500);

        for _ in 0..3 {
            assert_eq!(cursor.fetch_all_rows().unwrap().len(), 500);
        }
        cursor.seek(42).unwrap();

        assert_eq!(
            cursor.diagnostics(),
            &[
                Diagnostic::ColumnNameMayBeTruncated {
                    column: long_name.clone()
                },
                Diagnostic::SingleSpaceConverted {
                    column: "note".to_string()
                },
            ]
        );
        assert_eq!(cursor.take_diagnostics().len(), 2);
        cursor.restart();
        assert_eq!(cursor.diagnostics().len(), 2);
    }

    #[test]
    fn test_oem_character_set_through_cursor() {
        let config = CursorConfig::new(DbKind::SqlServer, BackendKind::InMemoryArray)
            .with_character_set("CP850")
            .unwrap();
        let mut cursor = ResultCursor::new(config);
        let row: Row = [("city", SqlValue::from(vec![0x4du8, 0x81, 0x6e, 0x9b]))]
            .into_iter()
            .collect();
        cursor.set_result(RawResult::Rows(vec![row])).unwrap();
        cursor.set_returned_rows(1);

        let row = cursor.fetch_row().unwrap();
        assert_eq!(row.get("city").unwrap(), &SqlValue::from("Münø"));
    }

    #[test]
    fn test_character_set_ignored_outside_sql_server() {
        let config = CursorConfig::new(DbKind::MySql, BackendKind::InMemoryArray)
            .with_character_set("windows-1252")
            .unwrap();
        let mut cursor = ResultCursor::new(config);
        let row: Row = [("city", SqlValue::from(vec![0x4du8, 0xfc]))].into_iter().collect();
        cursor.set_result(RawResult::Rows(vec![row.clone()])).unwrap();
        cursor.set_returned_rows(1);

        assert_eq!(cursor.fetch_row().unwrap(), row);
    }
}
