//! Relational database boundary.
//!
//! Repositories talk to [`Database`] through named prepared statements and a
//! small [`SqlValue`] vocabulary; [`postgres`] provides the tokio-postgres
//! implementation used by the inventory binary.

pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::ApiError;

/// A statement prepared on every new connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prepared {
    pub name: &'static str,
    pub sql: &'static str,
}

/// A parameter or column value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Float(f64),
}

impl SqlValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            SqlValue::Float(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("no prepared statement named {0:?}")]
    UnknownStatement(String),
    #[error("column {index} has unsupported type {type_name}")]
    UnsupportedColumn { index: usize, type_name: String },
    #[error("could not read database credentials: {0}")]
    Credentials(#[source] ApiError),
    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),
}

/// Prepared-statement execute and single-row query.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run a statement; returns the number of rows affected.
    async fn execute(&self, statement: &str, params: &[SqlValue]) -> Result<u64, DatabaseError>;

    /// Run a query expected to return at most one row.
    async fn query_row(
        &self,
        statement: &str,
        params: &[SqlValue],
    ) -> Result<Option<Vec<SqlValue>>, DatabaseError>;
}
