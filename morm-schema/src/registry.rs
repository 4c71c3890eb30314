//! The global enum registry.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::SchemaError;

/// An enum registration as declared by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDef {
    /// Enum type name.
    pub name: String,
    /// Ordered values.
    pub values: Vec<String>,
}

impl EnumDef {
    /// An enum with the given name and ordered values.
    pub fn new(name: impl Into<String>, values: Vec<impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Insertion-ordered registry of enum types, keyed by case-folded name.
///
/// Registration conflicts accumulate rather than abort; the reconciler
/// refuses to run while any error is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnumRegistry {
    entries: IndexMap<SmolStr, Vec<String>>,
    errors: Vec<SchemaError>,
}

impl EnumRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an enum declaration.
    ///
    /// Identical (name, values) pairs are a no-op. The same name with a
    /// different value list, or a different name with an identical value
    /// list, records an error.
    pub fn register(&mut self, def: EnumDef) {
        let name = SmolStr::new(def.name.trim().to_uppercase());
        if let Some(existing) = self.entries.get(&name) {
            if existing != &def.values {
                self.errors.push(SchemaError::EnumRedefined {
                    name: name.to_string(),
                });
            }
            return;
        }
        if let Some((other, _)) = self.entries.iter().find(|(_, values)| **values == def.values) {
            self.errors.push(SchemaError::EnumDuplicateValues {
                first: other.to_string(),
                second: name.to_string(),
            });
            return;
        }
        self.entries.insert(name, def.values);
    }

    /// Values for a registered enum, by case-folded name.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .get(name.to_uppercase().as_str())
            .map(Vec::as_slice)
    }

    /// Whether an enum with this name is registered.
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name.to_uppercase().as_str())
    }

    /// All registered enums in registration order.
    pub fn all(&self) -> impl Iterator<Item = (&SmolStr, &Vec<String>)> {
        self.entries.iter()
    }

    /// Registration errors accumulated so far.
    pub fn errors(&self) -> &[SchemaError] {
        &self.errors
    }

    /// Number of registered enums.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
