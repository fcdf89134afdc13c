use async_trait::async_trait;

use crate::cursor::ResultCursor;
use crate::error::Result;
use crate::types::SqlValue;

/// Trait for database driver implementations.
/// Drivers are responsible for:
/// - Connecting to the database
/// - Converting SqlValue parameters to native types
/// - Executing statements and handing back a populated ResultCursor
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Execute a SQL statement with the given parameters.
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<ResultCursor>;
}
