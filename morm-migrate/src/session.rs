//! The database session seam.
//!
//! The engine never talks to a driver directly; it consumes a [`Session`]
//! that can run SQL and control the outer transaction. `morm-postgres`
//! implements it over a pooled connection, tests implement it with a
//! scripted fake.

use async_trait::async_trait;

use crate::error::MigrateResult;

/// One result row: ordered, optionally-null text values.
///
/// Catalog reads only need text; the driver renders every value with its
/// textual representation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlRow {
    values: Vec<Option<String>>,
}

impl SqlRow {
    /// A row from its values.
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self { values }
    }

    /// The value at `index`, if present and non-null.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    /// The value at `index` parsed as `T`; `None` on null or parse failure.
    pub fn parse<T: std::str::FromStr>(&self, index: usize) -> Option<T> {
        self.get(index).and_then(|v| v.parse().ok())
    }

    /// Number of values in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<const N: usize> From<[Option<&str>; N]> for SqlRow {
    fn from(values: [Option<&str>; N]) -> Self {
        Self::new(values.into_iter().map(|v| v.map(String::from)).collect())
    }
}

/// A database session: statement execution plus transaction control.
///
/// Every method is a suspension point; the engine is single-task
/// cooperative and issues statements strictly sequentially.
#[async_trait]
pub trait Session: Send {
    /// Execute a statement, returning the affected row count.
    async fn execute(&mut self, sql: &str) -> MigrateResult<u64>;

    /// Run a query, returning all rows as text.
    async fn query(&mut self, sql: &str) -> MigrateResult<Vec<SqlRow>>;

    /// Open the outer transaction.
    async fn begin(&mut self) -> MigrateResult<()>;

    /// Commit the outer transaction.
    async fn commit(&mut self) -> MigrateResult<()>;

    /// Roll back the outer transaction.
    async fn rollback(&mut self) -> MigrateResult<()>;
}
