//! # morm-migrate
//!
//! Reconciliation engine for the morm declarative migration system.
//!
//! The engine compares a normalized declaration (models + enum registry,
//! from `morm-schema`) against the live PostgreSQL catalog and issues the
//! minimum correct DDL sequence inside one outer transaction. Data is
//! never lost unless the caller passes the explicit reset flag.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐    ┌───────────────┐    ┌──────────────┐
//! │ Declaration │───▶│  Reconciler   │───▶│ Enum migrator│
//! └─────────────┘    │ (outer txn)   │    ├──────────────┤
//!                    │               │───▶│ Table differ │ per model,
//! ┌─────────────┐    │               │    │ + alter      │ topo order
//! │   Session   │◀──▶│               │    ├──────────────┤
//! └─────────────┘    │               │───▶│ Index / junc │
//!                    └───────────────┘    └──────────────┘
//! ```
//!
//! Every phase reads the catalog state it needs fresh, computes a minimal
//! statement set, and records structured [`MigrationEvent`]s. Blocking
//! conditions (type change or column drop on populated data, enum value
//! removal while in use, ...) abort the run and roll everything back.
//!
//! ## Example
//!
//! ```rust,ignore
//! use morm_migrate::{MigrateOptions, Reconciler};
//!
//! let engine = Reconciler::new();
//! let report = engine
//!     .migrate(&mut session, &registry, &mut models, &MigrateOptions::new())
//!     .await;
//! println!("{}", report.summary());
//! ```

pub mod alter;
pub mod context;
pub mod engine;
pub mod enums;
pub mod error;
pub mod event;
pub mod indexes;
pub mod introspect;
pub mod junction;
pub mod session;
pub mod sql;
pub mod table;

pub use context::MigrationCtx;
pub use engine::{MigrateOptions, Reconciler};
pub use error::{MigrateError, MigrateResult};
pub use event::{EventKind, MigrationEvent, MigrationReport};
pub use introspect::{ColumnInfo, ConstraintInfo, ConstraintKind, EnumUsage, IndexInfo, TableCounts};
pub use junction::{junction_specs, JunctionSpec};
pub use session::{Session, SqlRow};
