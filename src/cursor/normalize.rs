//! Per-row decoding applied before a row becomes current.
//!
//! Only SQL Server results are touched. Rows from every other database
//! family pass through unchanged.

use std::fmt;

use encoding_rs::UTF_16LE;

use crate::charset::CharacterSet;
use crate::config::{BackendKind, DbKind, DriverQuirks};
use crate::types::{Row, SqlValue};

/// Column prefix marking a national (UCS-2) column that was cast to binary
/// so the legacy bridge would return it intact.
pub const NATIONAL_COLUMN_PREFIX: &str = "__flourish_mssqln_";

/// Row-number column added when LIMIT/OFFSET was emulated with ROW_NUMBER().
pub const LIMIT_OFFSET_COLUMN: &str = "__flourish_limit_offset_row_num";

const DBLIB_NAME_LIMIT: usize = 30;
const DBLIB_VALUE_LIMIT: usize = 256;

/// A non-fatal observation made while decoding a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A single space was turned back into the empty string it stood for.
    SingleSpaceConverted { column: String },
    /// The column name is exactly at the dblib name limit.
    ColumnNameMayBeTruncated { column: String },
    /// The value is exactly at the dblib value limit.
    ValueMayBeTruncated { column: String },
}

impl Diagnostic {
    pub fn column(&self) -> &str {
        match self {
            Diagnostic::SingleSpaceConverted { column }
            | Diagnostic::ColumnNameMayBeTruncated { column }
            | Diagnostic::ValueMayBeTruncated { column } => column,
        }
    }

    /// Upstream bug report describing the driver defect.
    pub fn reference(&self) -> &'static str {
        match self {
            Diagnostic::SingleSpaceConverted { .. } => "http://bugs.php.net/bug.php?id=26315",
            Diagnostic::ColumnNameMayBeTruncated { .. } => "http://bugs.php.net/bug.php?id=23990",
            Diagnostic::ValueMayBeTruncated { .. } => "http://bugs.php.net/bug.php?id=37757",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::SingleSpaceConverted { column } => write!(
                f,
                "A single space was detected in column {column} and was converted into an empty string - see {}",
                self.reference()
            ),
            Diagnostic::ColumnNameMayBeTruncated { column } => write!(
                f,
                "The column name {column} is exactly {DBLIB_NAME_LIMIT} characters long and may be truncated - see {}",
                self.reference()
            ),
            Diagnostic::ValueMayBeTruncated { column } => write!(
                f,
                "The value of column {column} is exactly {DBLIB_VALUE_LIMIT} bytes long and may be truncated - see {}",
                self.reference()
            ),
        }
    }
}

/// The decoding rules that apply to one cursor.
pub(crate) struct Normalizer<'a> {
    pub db_kind: DbKind,
    pub backend_kind: BackendKind,
    pub character_set: Option<CharacterSet>,
    pub quirks: DriverQuirks,
    pub sql: &'a str,
    pub untranslated_sql: Option<&'a str>,
}

impl Normalizer<'_> {
    pub(crate) fn apply(&self, mut row: Row, diagnostics: &mut Vec<Diagnostic>) -> Row {
        if self.db_kind != DbKind::SqlServer {
            return row;
        }

        if self.backend_kind == BackendKind::SqlServerLegacy {
            if self.quirks.dblib {
                fix_dblib_row(&mut row, diagnostics);
            }
            if self.untranslated_sql.is_some() {
                row.remove(LIMIT_OFFSET_COLUMN);
            }
        }

        if let Some(charset) = self.character_set {
            transcode_row(&mut row, charset);
        }

        if self.sql.contains(NATIONAL_COLUMN_PREFIX) {
            decode_national_columns(&mut row);
        }

        row
    }
}

fn fix_dblib_row(row: &mut Row, diagnostics: &mut Vec<Diagnostic>) {
    let mut found = Vec::new();

    for (column, value) in row.iter_mut() {
        let single_space = match &mut *value {
            SqlValue::Text(s) if s.as_str() == " " => {
                s.clear();
                true
            }
            SqlValue::Bytes(b) if b.as_slice() == b" " => {
                b.clear();
                true
            }
            _ => false,
        };
        if single_space {
            found.push(Diagnostic::SingleSpaceConverted {
                column: column.to_string(),
            });
        }
        if column.len() == DBLIB_NAME_LIMIT {
            found.push(Diagnostic::ColumnNameMayBeTruncated {
                column: column.to_string(),
            });
        }
        if value.as_bytes().map(<[u8]>::len) == Some(DBLIB_VALUE_LIMIT) {
            found.push(Diagnostic::ValueMayBeTruncated {
                column: column.to_string(),
            });
        }
    }

    for diagnostic in &found {
        tracing::warn!(
            column = diagnostic.column(),
            reference = diagnostic.reference(),
            "{diagnostic}"
        );
    }
    diagnostics.extend(found);
}

/// Decodes undecoded character data from the connection charset.
/// National columns are left alone; they are decoded separately.
fn transcode_row(row: &mut Row, charset: CharacterSet) {
    for (column, value) in row.iter_mut() {
        if column.starts_with(NATIONAL_COLUMN_PREFIX) {
            continue;
        }
        let SqlValue::Bytes(bytes) = &*value else {
            continue;
        };
        let (text, had_errors) = charset.decode(bytes);
        if had_errors {
            tracing::warn!(
                column,
                charset = %charset,
                "malformed bytes replaced while transcoding column"
            );
        }
        *value = SqlValue::Text(text.into_owned());
    }
}

fn decode_national_columns(row: &mut Row) {
    let national: Vec<String> = row
        .columns()
        .into_iter()
        .filter(|column| column.starts_with(NATIONAL_COLUMN_PREFIX))
        .map(str::to_string)
        .collect();

    for column in national {
        let Some(value) = row.remove(&column) else {
            continue;
        };
        let decoded = match value {
            SqlValue::Bytes(bytes) => {
                let (text, had_errors) = UTF_16LE.decode_without_bom_handling(&bytes);
                if had_errors {
                    tracing::warn!(
                        column = column.as_str(),
                        "malformed UCS-2 data replaced while decoding"
                    );
                }
                SqlValue::Text(text.into_owned())
            }
            other => other,
        };
        row.insert(&column[NATIONAL_COLUMN_PREFIX.len()..], decoded);
    }
}
