use async_trait::async_trait;
use std::error::Error;

use tokio_postgres::types::{FromSql, ToSql, Type};
use tokio_postgres::{Client, NoTls};
use tokio_stream::StreamExt;

use crate::config::{BackendKind, CursorConfig, DbKind};
use crate::cursor::{RawResult, ResultCursor};
use crate::error::{CursorError, Result};
use crate::traits::{DatabaseDriver, ResultHandle};
use crate::types::{Row, SqlValue};

/// PostgreSQL driver implementation using tokio-postgres.
pub struct TokioPostgresDriver {
    client: Client,
}

impl TokioPostgresDriver {
    /// Connect to a PostgreSQL database.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(connection_string, NoTls)
            .await
            .map_err(|e| CursorError::ConnectionFailed(e.to_string()))?;

        // Spawn the connection handler
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "PostgreSQL connection error");
            }
        });

        Ok(Self { client })
    }
}

#[async_trait]
impl DatabaseDriver for TokioPostgresDriver {
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<ResultCursor> {
        // Convert SqlValue params to tokio-postgres compatible types
        let converted_params: Vec<Box<dyn ToSql + Sync + Send>> =
            params.iter().map(sql_value_to_tosql).collect();

        let param_refs: Vec<&(dyn ToSql + Sync)> = converted_params
            .iter()
            .map(|b| b.as_ref() as &(dyn ToSql + Sync))
            .collect();

        let stream = self
            .client
            .query_raw(sql, param_refs.iter().copied())
            .await
            .map_err(|e| CursorError::QueryFailed(e.to_string()))?;
        let mut stream = std::pin::pin!(stream);

        let mut rows = Vec::new();
        while let Some(row) = stream.next().await {
            rows.push(row.map_err(|e| CursorError::QueryFailed(e.to_string()))?);
        }
        let affected_rows = stream.rows_affected().unwrap_or(0);

        tracing::debug!(
            rows = rows.len(),
            affected_rows,
            "postgres statement complete"
        );

        let returned_rows = rows.len();
        let mut cursor =
            ResultCursor::new(CursorConfig::new(DbKind::Postgres, BackendKind::Postgres));
        cursor.set_result(RawResult::Handle(Box::new(PgResultHandle::new(rows))))?;
        cursor.set_sql(sql);
        cursor.set_affected_rows(affected_rows);
        cursor.set_returned_rows(returned_rows);
        Ok(cursor)
    }
}

/// A buffered Postgres result. Rows stay in wire form until fetched.
pub struct PgResultHandle {
    rows: Vec<tokio_postgres::Row>,
    pointer: usize,
}

impl PgResultHandle {
    pub fn new(rows: Vec<tokio_postgres::Row>) -> Self {
        Self { rows, pointer: 0 }
    }
}

impl ResultHandle for PgResultHandle {
    fn fetch_assoc(&mut self) -> Option<Row> {
        let row = self.rows.get(self.pointer)?;
        self.pointer += 1;

        let columns: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
        let values = (0..columns.len()).map(|i| row_value(row, i)).collect();
        Some(Row::new(&columns, values))
    }

    fn data_seek(&mut self, row: usize) -> bool {
        if row >= self.rows.len() {
            return false;
        }
        self.pointer = row;
        true
    }

    fn free(&mut self) {
        self.rows = Vec::new();
        self.pointer = 0;
    }
}

/// Convert a SqlValue to a boxed ToSql trait object.
fn sql_value_to_tosql(value: &SqlValue) -> Box<dyn ToSql + Sync + Send> {
    match value {
        SqlValue::Null => Box::new(None::<String>),
        SqlValue::Text(s) => Box::new(s.clone()),
        SqlValue::Int32(i) => Box::new(*i),
        SqlValue::Int64(i) => Box::new(*i),
        SqlValue::Float64(f) => Box::new(*f),
        SqlValue::Bool(b) => Box::new(*b),
        SqlValue::Bytes(b) => Box::new(b.clone()),
    }
}

/// Convert a row value at a given index to a SqlValue.
///
/// Each attempt fails with a type mismatch unless the column type matches,
/// so the first successful one decides the variant.
fn row_value(row: &tokio_postgres::Row, index: usize) -> SqlValue {
    if let Ok(val) = row.try_get::<_, Option<i16>>(index) {
        return val.map(i32::from).into();
    }
    if let Ok(val) = row.try_get::<_, Option<i32>>(index) {
        return val.into();
    }
    if let Ok(val) = row.try_get::<_, Option<i64>>(index) {
        return val.into();
    }
    if let Ok(val) = row.try_get::<_, Option<String>>(index) {
        return val.into();
    }
    if let Ok(val) = row.try_get::<_, Option<bool>>(index) {
        return val.into();
    }
    if let Ok(val) = row.try_get::<_, Option<f64>>(index) {
        return val.into();
    }
    if let Ok(val) = row.try_get::<_, Option<f32>>(index) {
        return val.map(f64::from).into();
    }
    if let Ok(val) = row.try_get::<_, Option<Vec<u8>>>(index) {
        return val.into();
    }

    match row.try_get::<_, Option<WireValue>>(index) {
        Ok(val) => {
            tracing::debug!(
                column = row.columns()[index].name(),
                pg_type = %row.columns()[index].type_(),
                "no native mapping for column type, returning wire bytes"
            );
            val.map(|wire| wire.0).into()
        }
        Err(e) => {
            tracing::warn!(
                column = row.columns()[index].name(),
                error = %e,
                "column could not be read, returning NULL"
            );
            SqlValue::Null
        }
    }
}

/// A column value in its binary wire form, for types without a native mapping
/// (NUMERIC, timestamps, uuid, json and the like).
struct WireValue(Vec<u8>);

impl<'a> FromSql<'a> for WireValue {
    fn from_sql(
        _ty: &Type,
        raw: &'a [u8],
    ) -> std::result::Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(WireValue(raw.to_vec()))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}
