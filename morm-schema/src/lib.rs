//! # morm-schema
//!
//! Declaration AST, validation and normalization for the morm migration
//! engine.
//!
//! This crate provides:
//! - A typed declaration API: [`ModelConfig`], [`ColumnConfig`], enum
//!   registrations
//! - Canonical type names and surface-string canonicalization
//! - A CHECK expression mini-language translated to SQL
//! - Default-value validation against column types
//! - The global [`EnumRegistry`]
//! - Relation resolution and topological table ordering
//!
//! ## Example
//!
//! ```rust
//! use morm_schema::ast::{ColumnConfig, DefaultValue, ModelConfig};
//! use morm_schema::{normalize_model, EnumDef, EnumRegistry};
//!
//! let mut registry = EnumRegistry::new();
//! registry.register(EnumDef::new("USER_ROLE", vec!["ADMIN", "STUDENT"]));
//!
//! let config = ModelConfig::new("users")
//!     .column(
//!         ColumnConfig::new("id", "uuid")
//!             .primary()
//!             .default_value(DefaultValue::call("uuid")),
//!     )
//!     .column(ColumnConfig::new("role", "USER_ROLE").default_value(DefaultValue::text("ADMIN")));
//!
//! let model = normalize_model(&config, &registry);
//! assert!(model.is_valid());
//! assert_eq!(model.primary_key(), "id");
//! ```

pub mod ast;
pub mod check;
pub mod defaults;
pub mod error;
pub mod graph;
pub mod registry;
pub mod types;
pub mod validator;

pub use ast::{Column, ColumnConfig, Model, ModelConfig};
pub use error::{SchemaError, SchemaResult};
pub use registry::{EnumDef, EnumRegistry};
pub use types::{CanonicalType, ScalarType, TypeName};
pub use validator::normalize_model;
