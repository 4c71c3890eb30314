//! Shared execution context threaded through the engine phases.

use tracing::debug;

use crate::error::MigrateResult;
use crate::event::{EventKind, MigrationEvent};
use crate::session::{Session, SqlRow};

/// Execution context for one reconciliation run.
///
/// Wraps the session so every statement is logged into the report, and
/// collects the structured event stream.
pub struct MigrationCtx<'a> {
    session: &'a mut dyn Session,
    /// Events in emission order.
    pub events: Vec<MigrationEvent>,
    /// Executed statements in execution order.
    pub statements: Vec<String>,
}

impl<'a> MigrationCtx<'a> {
    /// A context over the given session.
    pub fn new(session: &'a mut dyn Session) -> Self {
        Self {
            session,
            events: Vec::new(),
            statements: Vec::new(),
        }
    }

    /// Execute a DDL/DML statement, recording it.
    pub async fn execute(&mut self, sql: &str) -> MigrateResult<u64> {
        debug!(sql = %sql, "executing");
        self.statements.push(sql.to_string());
        self.session.execute(sql).await
    }

    /// Run a catalog query.
    pub async fn query(&mut self, sql: &str) -> MigrateResult<Vec<SqlRow>> {
        debug!(sql = %sql, "querying");
        self.session.query(sql).await
    }

    /// Open the outer transaction.
    pub async fn begin(&mut self) -> MigrateResult<()> {
        self.session.begin().await
    }

    /// Commit the outer transaction.
    pub async fn commit(&mut self) -> MigrateResult<()> {
        self.session.commit().await
    }

    /// Roll back the outer transaction.
    pub async fn rollback(&mut self) -> MigrateResult<()> {
        self.session.rollback().await
    }

    /// Record a structured event.
    pub fn record(
        &mut self,
        section: &str,
        subject: impl Into<smol_str::SmolStr>,
        action: impl Into<String>,
        kind: EventKind,
    ) {
        self.events
            .push(MigrationEvent::new(section, subject, action, kind));
    }
}
