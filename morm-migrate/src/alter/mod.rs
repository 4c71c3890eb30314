//! Alter sub-phases for one existing table.
//!
//! The table differ runs these in a fixed order: column names, primary
//! key, types, nullability, uniqueness, foreign keys, CHECK constraints,
//! defaults. Each phase reads the live state it needs, computes a minimal
//! statement set, and either applies it or fails the whole model with a
//! data-loss guard.

pub mod check;
pub mod default;
pub mod fk;
pub mod name;
pub mod nullity;
pub mod primary_key;
pub mod types;
pub mod unique;

pub(crate) const SECTION: &str = "table";
