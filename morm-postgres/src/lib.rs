//! # morm-postgres
//!
//! PostgreSQL session layer for the morm migration engine.
//!
//! Provides URL-based configuration, a deadpool-backed connection pool
//! with prepared-statement caching, the database-creation bootstrap, and
//! the [`morm_migrate::Session`] implementation the engine drives.

pub mod config;
pub mod connection;
pub mod error;
pub mod pool;
pub mod statement;

pub use config::{PgConfig, SslMode};
pub use connection::{PgConnection, PgTransaction};
pub use error::{PgError, PgResult};
pub use pool::{ensure_database, PgPool, PoolConfig};
pub use statement::PreparedStatementCache;
