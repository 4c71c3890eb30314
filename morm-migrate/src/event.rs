//! Structured events emitted during reconciliation.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Classification of a reconciliation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Informational; nothing changed.
    Info,
    /// A schema change was applied.
    Change,
    /// A change was refused by a data-loss guard.
    Blocked,
    /// A failure that aborts the run.
    Error,
}

/// One structured log event.
///
/// `section` names the engine phase (`"enum"`, `"table"`, `"index"`,
/// `"junction"`, ...), `subject` the object acted on, `action` what
/// happened to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationEvent {
    pub section: SmolStr,
    pub subject: SmolStr,
    pub action: String,
    pub kind: EventKind,
}

impl MigrationEvent {
    /// Create an event.
    pub fn new(
        section: impl Into<SmolStr>,
        subject: impl Into<SmolStr>,
        action: impl Into<String>,
        kind: EventKind,
    ) -> Self {
        Self {
            section: section.into(),
            subject: subject.into(),
            action: action.into(),
            kind,
        }
    }
}

/// Outcome of a `migrate` call: a success flag, the event stream, and the
/// DDL statements that were executed (or computed, under dry-run).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Whether the run committed.
    pub success: bool,
    /// Structured events in emission order.
    pub events: Vec<MigrationEvent>,
    /// Executed DDL statements in execution order.
    pub statements: Vec<String>,
}

impl MigrationReport {
    /// Number of events of the given kind.
    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    /// Whether any schema change was applied.
    pub fn has_changes(&self) -> bool {
        self.count(EventKind::Change) > 0
    }

    /// A one-line human-readable summary.
    pub fn summary(&self) -> String {
        let changes = self.count(EventKind::Change);
        let blocked = self.count(EventKind::Blocked);
        let errors = self.count(EventKind::Error);
        let status = if self.success { "ok" } else { "aborted" };
        let mut parts = vec![format!("{changes} changes")];
        if blocked > 0 {
            parts.push(format!("{blocked} blocked"));
        }
        if errors > 0 {
            parts.push(format!("{errors} errors"));
        }
        format!("{status}: {}", parts.join(", "))
    }
}
