//! Phase 6: foreign keys on renamed columns.
//!
//! A column rename keeps its foreign-key constraint but leaves it under
//! the old canonical name. For every renamed column that declares a
//! reference, the constraint is dropped and recreated as
//! `<table>_<column>_fkey` with the declared actions.

use morm_schema::Model;

use super::SECTION;
use crate::context::MigrationCtx;
use crate::error::MigrateResult;
use crate::event::EventKind;
use crate::introspect::{table_constraints, ConstraintKind};
use crate::sql::{fk_name, quote_ident};

pub async fn run(ctx: &mut MigrationCtx<'_>, model: &Model) -> MigrateResult<()> {
    let table = model.table().to_string();
    let renamed: Vec<_> = model
        .physical_columns()
        .filter(|c| {
            c.renamed
                && c.reference
                    .as_ref()
                    .is_some_and(|r| r.kind.is_column_backed())
        })
        .collect();
    if renamed.is_empty() {
        return Ok(());
    }

    let constraints = table_constraints(ctx, &table).await?;
    for column in renamed {
        let reference = column.reference.as_ref().expect("filtered above");
        for constraint in constraints.iter().filter(|c| {
            c.kind == ConstraintKind::ForeignKey && c.columns == [column.name.to_string()]
        }) {
            ctx.execute(&format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                quote_ident(&table),
                quote_ident(&constraint.name)
            ))
            .await?;
        }
        ctx.execute(&format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE {} ON UPDATE {}",
            quote_ident(&table),
            quote_ident(&fk_name(&table, &column.name)),
            quote_ident(&column.name),
            quote_ident(&reference.table),
            quote_ident(&reference.column),
            reference.on_delete.as_sql(),
            reference.on_update.as_sql()
        ))
        .await?;
        ctx.record(
            SECTION,
            format!("{table}.{}", column.name),
            "foreign key recreated after rename",
            EventKind::Change,
        );
    }
    Ok(())
}
