//! # morm — declarative schema migrations for PostgreSQL
//!
//! morm reconciles a live PostgreSQL database against a declarative
//! schema: models (tables), enumerated types, per-column constraints,
//! indexes and many-to-many relations. Each `migrate` call computes and
//! applies the minimum correct DDL sequence inside a single transaction,
//! and never loses data unless the explicit reset flag authorizes it.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use morm::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), morm::MormError> {
//!     let db = morm::init("postgresql://localhost/app", Default::default()).await?;
//!
//!     db.enums(vec![EnumDef::new("USER_ROLE", vec!["ADMIN", "STUDENT"])]);
//!
//!     db.model(
//!         ModelConfig::new("users")
//!             .column(
//!                 ColumnConfig::new("id", "uuid")
//!                     .primary()
//!                     .default_value(DefaultValue::call("uuid")),
//!             )
//!             .column(
//!                 ColumnConfig::new("role", "USER_ROLE")
//!                     .default_value(DefaultValue::text("ADMIN")),
//!             )
//!             .column(ColumnConfig::new("email", "text").unique())
//!             .index("email"),
//!     );
//!
//!     db.model(
//!         ModelConfig::new("post")
//!             .column(
//!                 ColumnConfig::new("id", "uuid")
//!                     .primary()
//!                     .default_value(DefaultValue::call("uuid")),
//!             )
//!             .column(
//!                 ColumnConfig::new("user_id", "uuid")
//!                     .references(ReferenceConfig::new("users", "id", "one-to-many")),
//!             ),
//!     );
//!
//!     let report = db.migrate(MigrateOptions::new()).await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Crates
//!
//! - [`morm_schema`] — declaration AST, validation, CHECK expressions,
//!   enum registry, relation graph
//! - [`morm_migrate`] — the reconciliation engine
//! - [`morm_postgres`] — connection pool, configuration, session layer

mod client;

pub use client::{init, InitOptions, Morm, MormError, MormResult, TransactionOptions};

pub use morm_migrate::{EventKind, MigrateOptions, MigrationEvent, MigrationReport};
pub use morm_postgres::{PgConfig, PgPool, PoolConfig};
pub use morm_schema::ast::{ColumnConfig, DefaultValue, ModelConfig, ReferenceConfig, SanitizeMode};
pub use morm_schema::{EnumDef, EnumRegistry, SchemaError};

/// Commonly used types, for glob import.
pub mod prelude {
    pub use crate::client::{init, InitOptions, Morm, MormError, TransactionOptions};
    pub use morm_migrate::{MigrateOptions, MigrationReport};
    pub use morm_schema::ast::{
        ColumnConfig, DefaultValue, ModelConfig, ReferenceConfig, SanitizeMode,
    };
    pub use morm_schema::EnumDef;
}
