//! Error types for PostgreSQL operations.

use thiserror::Error;

/// Result type for PostgreSQL operations.
pub type PgResult<T> = Result<T, PgError>;

/// Errors that can occur in the session layer.
#[derive(Error, Debug)]
pub enum PgError {
    /// Connection pool error.
    #[error("pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// PostgreSQL error.
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Query execution error.
    #[error("query error: {0}")]
    Query(String),
}

impl PgError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a query error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    /// The SQLSTATE code of the underlying database error, if any.
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Self::Postgres(err) => err.code().map(|c| c.code()),
            _ => None,
        }
    }

    /// Whether this is the duplicate-database error raised by
    /// `CREATE DATABASE` when the target already exists.
    pub fn is_duplicate_database(&self) -> bool {
        self.sqlstate() == Some("42P04")
    }
}

impl From<PgError> for morm_migrate::MigrateError {
    fn from(err: PgError) -> Self {
        morm_migrate::MigrateError::database(err.to_string())
    }
}
