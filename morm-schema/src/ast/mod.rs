//! Declaration AST for the morm schema.
//!
//! The caller builds [`ModelConfig`]s and enum registrations; validation
//! turns them into normalized [`Model`]s consumed by the migration engine.

mod column;
mod model;
mod relation;
mod value;

pub use column::{Column, ColumnConfig};
pub use model::{Model, ModelConfig};
pub use relation::{FkAction, Reference, ReferenceConfig, RelationDescriptor, RelationKind};
pub use value::{DefaultValue, SanitizeMode};
