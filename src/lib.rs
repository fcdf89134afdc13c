//! unicursor - one seekable row cursor over many database drivers
//!
//! Query runners execute a statement, then hand the driver's native result
//! (or an array of rows, for drivers that cannot buffer) to a
//! [`ResultCursor`]. Callers read every backend through the same contract.
//!
//! # Example
//! ```ignore
//! use unicursor::Client;
//!
//! let client = Client::connect("postgres://localhost/mydb").await?;
//! let mut cursor = client
//!     .query("SELECT id, name FROM users WHERE name = $1", &["John".into()])
//!     .await?;
//!
//! while let Some(row) = cursor.next_row()? {
//!     let id = row.get("id")?;
//!     let name = row.get("name")?;
//! }
//! ```

pub mod charset;
pub mod config;
pub mod cursor;
pub mod drivers;
pub mod error;
pub mod traits;
pub mod types;

mod client;

// Re-export main types for convenient access
pub use charset::CharacterSet;
pub use client::Client;
pub use config::{BackendKind, CursorConfig, DbKind, DriverQuirks};
pub use cursor::{Diagnostic, RawResult, ResultCursor, Rows};
pub use error::{CursorError, Result};
pub use traits::{DatabaseDriver, ResultHandle};
pub use types::{Row, SqlValue};
