//! Connection and transaction wrappers.

use std::sync::Arc;

use async_trait::async_trait;
use deadpool_postgres::Object;
use morm_migrate::{MigrateResult, Session, SqlRow};
use tokio_postgres::{Row, SimpleQueryMessage};
use tracing::debug;

use crate::error::PgResult;
use crate::statement::PreparedStatementCache;

/// A pooled PostgreSQL connection with statement caching.
pub struct PgConnection {
    client: Object,
    statement_cache: Arc<PreparedStatementCache>,
}

impl PgConnection {
    pub(crate) fn new(client: Object, statement_cache: Arc<PreparedStatementCache>) -> Self {
        Self {
            client,
            statement_cache,
        }
    }

    /// Execute a parameterized query and return all rows.
    pub async fn query(
        &self,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> PgResult<Vec<Row>> {
        debug!(sql = %sql, "executing query");
        let stmt = self.statement_cache.get_or_prepare(&self.client, sql).await?;
        let rows = self.client.query(&stmt, params).await?;
        Ok(rows)
    }

    /// Execute a parameterized query and return zero or one row.
    pub async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> PgResult<Option<Row>> {
        let stmt = self.statement_cache.get_or_prepare(&self.client, sql).await?;
        let row = self.client.query_opt(&stmt, params).await?;
        Ok(row)
    }

    /// Execute a parameterized statement and return the affected row count.
    pub async fn execute(
        &self,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> PgResult<u64> {
        debug!(sql = %sql, "executing statement");
        let stmt = self.statement_cache.get_or_prepare(&self.client, sql).await?;
        let count = self.client.execute(&stmt, params).await?;
        Ok(count)
    }

    /// Execute a batch of statements in a single round-trip.
    pub async fn batch_execute(&self, sql: &str) -> PgResult<()> {
        debug!(sql = %sql, "executing batch");
        self.client.batch_execute(sql).await?;
        Ok(())
    }

    /// Begin a driver-managed transaction.
    pub async fn transaction(&mut self) -> PgResult<PgTransaction<'_>> {
        debug!("beginning transaction");
        let txn = self.client.transaction().await?;
        Ok(PgTransaction {
            txn,
            statement_cache: self.statement_cache.clone(),
        })
    }
}

/// The engine-facing session: text-mode execution plus transaction
/// control over the same underlying connection.
#[async_trait]
impl Session for PgConnection {
    async fn execute(&mut self, sql: &str) -> MigrateResult<u64> {
        let messages = self
            .client
            .simple_query(sql)
            .await
            .map_err(crate::error::PgError::from)?;
        let affected = messages
            .iter()
            .filter_map(|m| match m {
                SimpleQueryMessage::CommandComplete(count) => Some(*count),
                _ => None,
            })
            .sum();
        Ok(affected)
    }

    async fn query(&mut self, sql: &str) -> MigrateResult<Vec<SqlRow>> {
        let messages = self
            .client
            .simple_query(sql)
            .await
            .map_err(crate::error::PgError::from)?;
        let rows = messages
            .into_iter()
            .filter_map(|m| match m {
                SimpleQueryMessage::Row(row) => Some(SqlRow::new(
                    (0..row.len())
                        .map(|i| row.get(i).map(String::from))
                        .collect(),
                )),
                _ => None,
            })
            .collect();
        Ok(rows)
    }

    async fn begin(&mut self) -> MigrateResult<()> {
        self.client
            .batch_execute("BEGIN")
            .await
            .map_err(crate::error::PgError::from)?;
        Ok(())
    }

    async fn commit(&mut self) -> MigrateResult<()> {
        self.client
            .batch_execute("COMMIT")
            .await
            .map_err(crate::error::PgError::from)?;
        Ok(())
    }

    async fn rollback(&mut self) -> MigrateResult<()> {
        self.client
            .batch_execute("ROLLBACK")
            .await
            .map_err(crate::error::PgError::from)?;
        Ok(())
    }
}

/// A driver-managed transaction for caller code run via the declaration
/// API's `transaction` entry point.
pub struct PgTransaction<'a> {
    txn: deadpool_postgres::Transaction<'a>,
    statement_cache: Arc<PreparedStatementCache>,
}

impl PgTransaction<'_> {
    /// Execute a parameterized query and return all rows.
    pub async fn query(
        &self,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> PgResult<Vec<Row>> {
        let stmt = self
            .statement_cache
            .get_or_prepare_in_txn(&self.txn, sql)
            .await?;
        let rows = self.txn.query(&stmt, params).await?;
        Ok(rows)
    }

    /// Execute a parameterized statement and return the affected row count.
    pub async fn execute(
        &self,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> PgResult<u64> {
        let stmt = self
            .statement_cache
            .get_or_prepare_in_txn(&self.txn, sql)
            .await?;
        let count = self.txn.execute(&stmt, params).await?;
        Ok(count)
    }

    /// Run a batch of statements.
    pub async fn batch_execute(&self, sql: &str) -> PgResult<()> {
        self.txn.batch_execute(sql).await?;
        Ok(())
    }

    /// Commit the transaction.
    pub async fn commit(self) -> PgResult<()> {
        debug!("committing transaction");
        self.txn.commit().await?;
        Ok(())
    }

    /// Roll back the transaction.
    pub async fn rollback(self) -> PgResult<()> {
        debug!("rolling back transaction");
        self.txn.rollback().await?;
        Ok(())
    }
}
