//! Cursor construction options.
//!
//! Database families and backend kinds are closed sets. The string forms
//! accepted by the `FromStr` impls are the names query runners have
//! historically used for them.

use std::fmt;
use std::str::FromStr;

use crate::charset::CharacterSet;
use crate::error::{CursorError, Result};

/// The logical database family a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbKind {
    SqlServer,
    MySql,
    Postgres,
    Sqlite,
}

impl DbKind {
    pub const ALL: [DbKind; 4] = [
        DbKind::SqlServer,
        DbKind::MySql,
        DbKind::Postgres,
        DbKind::Sqlite,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DbKind::SqlServer => "mssql",
            DbKind::MySql => "mysql",
            DbKind::Postgres => "postgresql",
            DbKind::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for DbKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DbKind {
    type Err = CursorError;

    fn from_str(s: &str) -> Result<Self> {
        DbKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| invalid("database type", s, DbKind::ALL.map(DbKind::name)))
    }
}

/// The driver bridge that produced a result handle.
///
/// `Odbc`, `Pdo` and `SqlSrv` cannot hand back a buffered result; a cursor
/// asked for one of them reads from an in-memory row array instead, so
/// their results must be attached as `RawResult::Rows`. The cursor still
/// reports the kind it was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    SqlServerLegacy,
    MySql,
    MySqlImproved,
    Postgres,
    Sqlite,
    InMemoryArray,
    Odbc,
    Pdo,
    SqlSrv,
}

impl BackendKind {
    pub const ALL: [BackendKind; 9] = [
        BackendKind::InMemoryArray,
        BackendKind::SqlServerLegacy,
        BackendKind::MySql,
        BackendKind::MySqlImproved,
        BackendKind::Postgres,
        BackendKind::Sqlite,
        BackendKind::Odbc,
        BackendKind::Pdo,
        BackendKind::SqlSrv,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BackendKind::SqlServerLegacy => "mssql",
            BackendKind::MySql => "mysql",
            BackendKind::MySqlImproved => "mysqli",
            BackendKind::Postgres => "pgsql",
            BackendKind::Sqlite => "sqlite",
            BackendKind::InMemoryArray => "array",
            BackendKind::Odbc => "odbc",
            BackendKind::Pdo => "pdo",
            BackendKind::SqlSrv => "sqlsrv",
        }
    }

    /// Whether the bridge can return a buffered, seekable result.
    pub fn is_buffered(self) -> bool {
        !matches!(self, BackendKind::Odbc | BackendKind::Pdo | BackendKind::SqlSrv)
    }

    /// Maps non-buffering bridges onto the in-memory array backend.
    pub fn normalize(self) -> BackendKind {
        if self.is_buffered() {
            self
        } else {
            BackendKind::InMemoryArray
        }
    }

    /// Whether results from this backend hold a resource that must be freed.
    pub fn needs_release(self) -> bool {
        !matches!(self, BackendKind::Sqlite | BackendKind::InMemoryArray)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = CursorError;

    fn from_str(s: &str) -> Result<Self> {
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| {
                invalid("database extension", s, BackendKind::ALL.map(BackendKind::name))
            })
    }
}

fn invalid<const N: usize>(what: &str, value: &str, valid: [&str; N]) -> CursorError {
    CursorError::Configuration(format!(
        "The {what} specified, {value}, is invalid. Must be one of: {}.",
        valid.join(", ")
    ))
}

/// Known defects of the bridge in use, resolved once by the caller and
/// handed to every cursor it creates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverQuirks {
    /// The SQL Server bridge is built on FreeTDS/dblib, which turns empty
    /// strings into a single space and truncates long names and values.
    pub dblib: bool,
}

impl DriverQuirks {
    pub fn none() -> Self {
        Self::default()
    }

    /// Probes the bridge's module info for a FreeTDS build.
    /// Non-Windows hosts never load the affected bridge.
    pub fn detect(is_windows: bool, module_info: &str) -> Self {
        let dblib = is_windows && module_info.to_ascii_lowercase().contains("freetds");
        Self { dblib }
    }

    pub fn for_current_platform(module_info: &str) -> Self {
        Self::detect(cfg!(windows), module_info)
    }
}

/// Everything a cursor needs to know at construction.
#[derive(Debug, Clone)]
pub struct CursorConfig {
    pub db_kind: DbKind,
    pub backend_kind: BackendKind,
    pub character_set: Option<CharacterSet>,
    pub quirks: DriverQuirks,
}

impl CursorConfig {
    pub fn new(db_kind: DbKind, backend_kind: BackendKind) -> Self {
        Self {
            db_kind,
            backend_kind,
            character_set: None,
            quirks: DriverQuirks::none(),
        }
    }

    /// Builds a config from the historical string names.
    ///
    /// # Example
    /// ```
    /// use unicursor::{BackendKind, CursorConfig, DbKind};
    ///
    /// let config = CursorConfig::parse("mssql", "mssql").unwrap();
    /// assert_eq!(config.db_kind, DbKind::SqlServer);
    /// assert_eq!(config.backend_kind, BackendKind::SqlServerLegacy);
    /// assert!(CursorConfig::parse("oracle", "oci8").is_err());
    /// ```
    pub fn parse(db_kind: &str, backend_kind: &str) -> Result<Self> {
        Ok(Self::new(db_kind.parse()?, backend_kind.parse()?))
    }

    /// Sets the charset SQL Server character data arrives in.
    /// Accepts WHATWG labels such as `windows-1252`, `ISO-8859-1` and
    /// OEM code pages such as `CP850`.
    pub fn with_character_set(mut self, label: &str) -> Result<Self> {
        let charset = CharacterSet::for_label(label).ok_or_else(|| {
            CursorError::Configuration(format!("The character set specified, {label}, is invalid"))
        })?;
        self.character_set = Some(charset);
        Ok(self)
    }

    pub fn with_quirks(mut self, quirks: DriverQuirks) -> Self {
        self.quirks = quirks;
        self
    }
}
