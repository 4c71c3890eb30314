//! Prepared statement caching.

use std::collections::HashMap;

use deadpool_postgres::{Object, Transaction};
use parking_lot::RwLock;
use tokio_postgres::Statement;
use tracing::debug;

use crate::error::PgResult;

/// A cache tracking which statements have been prepared, keyed by SQL.
///
/// Statements themselves live server-side per connection; this cache only
/// bounds how many distinct SQL texts are kept hot before eviction.
pub struct PreparedStatementCache {
    max_size: usize,
    prepared: RwLock<HashMap<String, ()>>,
}

impl PreparedStatementCache {
    /// A cache with the given maximum number of tracked statements.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            prepared: RwLock::new(HashMap::new()),
        }
    }

    /// Get or prepare a statement on a pooled connection.
    pub async fn get_or_prepare(&self, client: &Object, sql: &str) -> PgResult<Statement> {
        self.track(sql);
        let statement = client.prepare_cached(sql).await?;
        Ok(statement)
    }

    /// Get or prepare a statement within a transaction.
    pub async fn get_or_prepare_in_txn(
        &self,
        txn: &Transaction<'_>,
        sql: &str,
    ) -> PgResult<Statement> {
        self.track(sql);
        let statement = txn.prepare_cached(sql).await?;
        Ok(statement)
    }

    fn track(&self, sql: &str) {
        if self.prepared.read().contains_key(sql) {
            debug!(sql = %sql, "statement already tracked");
            return;
        }
        let mut prepared = self.prepared.write();
        if prepared.len() >= self.max_size {
            let evict: Vec<String> = prepared.keys().take(prepared.len() / 2).cloned().collect();
            for key in evict {
                prepared.remove(&key);
            }
            debug!(remaining = prepared.len(), "statement cache evicted");
        }
        prepared.insert(sql.to_string(), ());
    }

    /// Drop all tracked statements.
    pub fn clear(&self) {
        self.prepared.write().clear();
    }

    /// Number of tracked statements.
    pub fn len(&self) -> usize {
        self.prepared.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
