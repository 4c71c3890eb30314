//! Relation graph construction, validation and topological ordering.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::ast::{Model, RelationDescriptor};
use crate::error::SchemaError;

/// Resolve every declared reference across the models, annotate each model
/// with its incoming and outgoing relations, and return the table creation
/// order.
///
/// Dependency edges run target → source for every non-self column-backed
/// relation (the referenced table must exist before the referencing one).
/// Many-to-many relations contribute no edges; their junction tables are
/// synthesized after all base tables. Ordering is Kahn's algorithm with an
/// alphabetical tiebreak, so the result is deterministic.
pub fn resolve(models: &mut IndexMap<SmolStr, Model>) -> Result<Vec<SmolStr>, Vec<SchemaError>> {
    let mut errors = Vec::new();

    // Snapshot the references so annotation can borrow mutably afterwards.
    let mut resolved: Vec<(SmolStr, SmolStr, crate::ast::Reference)> = Vec::new();
    for model in models.values() {
        for column in model.columns.values() {
            let Some(reference) = &column.reference else {
                continue;
            };
            let Some(target) = models.get(&reference.table) else {
                errors.push(SchemaError::RelationTargetMissing {
                    model: model.table.to_string(),
                    column: column.name.to_string(),
                    target: reference.table.to_string(),
                });
                continue;
            };
            let Some(target_column) = target.column(&reference.column) else {
                errors.push(SchemaError::RelationColumnMissing {
                    model: model.table.to_string(),
                    column: column.name.to_string(),
                    target: reference.table.to_string(),
                    target_column: reference.column.to_string(),
                });
                continue;
            };
            if column.ty.base != target_column.ty.base {
                errors.push(SchemaError::RelationTypeMismatch {
                    model: model.table.to_string(),
                    column: column.name.to_string(),
                    source_type: column.ty.label(),
                    target_type: target_column.ty.label(),
                });
                continue;
            }
            resolved.push((model.table.clone(), column.name.clone(), reference.clone()));
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    for model in models.values_mut() {
        model.outgoing.clear();
        model.incoming.clear();
    }
    for (source, column, reference) in &resolved {
        let is_self = *source == reference.table;
        let descriptor = RelationDescriptor {
            kind: reference.kind,
            table: reference.table.clone(),
            column: column.clone(),
            is_self,
        };
        if let Some(model) = models.get_mut(source) {
            model.outgoing.push(descriptor.clone());
        }
        if let Some(target) = models.get_mut(&reference.table) {
            target.incoming.push(RelationDescriptor {
                kind: reference.kind,
                table: source.clone(),
                column: column.clone(),
                is_self,
            });
        }
    }

    let order = topo_sort(models, &resolved)?;
    debug!(order = ?order, "relation graph resolved");
    Ok(order)
}

fn topo_sort(
    models: &IndexMap<SmolStr, Model>,
    resolved: &[(SmolStr, SmolStr, crate::ast::Reference)],
) -> Result<Vec<SmolStr>, Vec<SchemaError>> {
    let mut in_degree: HashMap<&SmolStr, usize> = models.keys().map(|k| (k, 0)).collect();
    let mut edges: HashMap<&SmolStr, Vec<&SmolStr>> = HashMap::new();
    let mut seen: HashSet<(&SmolStr, &SmolStr)> = HashSet::new();

    for (source, _, reference) in resolved {
        if !reference.kind.is_column_backed() || *source == reference.table {
            continue;
        }
        let Some((target, _)) = models.get_key_value(&reference.table) else {
            continue;
        };
        if seen.insert((target, source)) {
            edges.entry(target).or_default().push(source);
            *in_degree.get_mut(source).expect("source is a model") += 1;
        }
    }

    // Alphabetical tiebreak keeps the order deterministic when several
    // nodes reach zero degree together.
    let mut ready: Vec<&SmolStr> = in_degree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(k, _)| *k)
        .collect();
    ready.sort();

    let mut order = Vec::with_capacity(models.len());
    while let Some(&table) = ready.first() {
        ready.remove(0);
        order.push(table.clone());
        if let Some(dependents) = edges.get(table) {
            for dependent in dependents {
                let degree = in_degree.get_mut(dependent).expect("dependent is a model");
                *degree -= 1;
                if *degree == 0 {
                    let at = ready.partition_point(|t| *t < *dependent);
                    ready.insert(at, dependent);
                }
            }
        }
    }

    if order.len() != models.len() {
        let mut cyclic: Vec<String> = in_degree
            .into_iter()
            .filter(|(_, d)| *d > 0)
            .map(|(k, _)| k.to_string())
            .collect();
        cyclic.sort();
        return Err(vec![SchemaError::CyclicRelations { tables: cyclic }]);
    }
    Ok(order)
}
