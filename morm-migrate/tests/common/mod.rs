//! In-memory database fake for reconciliation tests.
//!
//! Implements [`Session`] over a small catalog model: it answers the
//! engine's introspection queries from in-memory state and applies the
//! engine's DDL statements back onto it. Unknown SQL is an error, so any
//! statement the engine emits outside its documented surface fails the
//! test immediately.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use indexmap::IndexMap;
use morm_migrate::{MigrateError, MigrateResult, Session, SqlRow};

#[derive(Debug, Clone, Default)]
pub struct FakeDb {
    pub tables: IndexMap<String, FakeTable>,
    pub enums: IndexMap<String, Vec<String>>,
    pub extensions: BTreeSet<String>,
    pub functions: BTreeSet<String>,
    pub triggers: BTreeSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeTable {
    pub columns: Vec<FakeColumn>,
    pub constraints: Vec<FakeConstraint>,
    pub indexes: Vec<FakeIndex>,
    pub row_count: i64,
    /// NULL rows per column; columns absent here hold no NULLs.
    pub nulls: HashMap<String, i64>,
}

#[derive(Debug, Clone)]
pub struct FakeColumn {
    pub name: String,
    pub udt_name: String,
    pub not_null: bool,
    pub default: Option<String>,
    pub identity: bool,
}

#[derive(Debug, Clone)]
pub struct FakeConstraint {
    pub name: String,
    pub kind: char,
    pub columns: Vec<String>,
    pub definition: String,
    pub ref_table: Option<String>,
    pub ref_columns: Vec<String>,
    pub on_delete: Option<char>,
    pub on_update: Option<char>,
}

#[derive(Debug, Clone)]
pub struct FakeIndex {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
    pub primary: bool,
}

impl FakeTable {
    pub fn with_rows(mut self, rows: i64) -> Self {
        self.row_count = rows;
        self
    }

    pub fn column(mut self, name: &str, udt: &str) -> Self {
        self.columns.push(FakeColumn {
            name: name.to_string(),
            udt_name: udt.to_string(),
            not_null: false,
            default: None,
            identity: false,
        });
        self
    }

    pub fn primary_key(mut self, table: &str, column: &str) -> Self {
        if let Some(col) = self.columns.iter_mut().find(|c| c.name == column) {
            col.not_null = true;
        }
        self.constraints.push(FakeConstraint {
            name: format!("{table}_pkey"),
            kind: 'p',
            columns: vec![column.to_string()],
            definition: format!("PRIMARY KEY (\"{column}\")"),
            ref_table: None,
            ref_columns: Vec::new(),
            on_delete: None,
            on_update: None,
        });
        self.indexes.push(FakeIndex {
            name: format!("{table}_pkey"),
            columns: vec![column.to_string()],
            unique: true,
            primary: true,
        });
        self
    }

    pub fn constraint(&self, name: &str) -> Option<&FakeConstraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    pub fn get_column(&self, name: &str) -> Option<&FakeColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Default)]
pub struct FakeSession {
    pub db: FakeDb,
    snapshot: Option<FakeDb>,
    pub executed: Vec<String>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_db(db: FakeDb) -> Self {
        Self {
            db,
            ..Self::default()
        }
    }

    /// Executed statements matching a prefix.
    pub fn statements_with(&self, prefix: &str) -> Vec<&String> {
        self.executed
            .iter()
            .filter(|s| s.starts_with(prefix))
            .collect()
    }

    fn apply(&mut self, sql: &str) -> MigrateResult<u64> {
        let db = &mut self.db;

        if sql.starts_with("SET LOCAL") {
            return Ok(0);
        }
        if let Some(rest) = sql.strip_prefix("CREATE OR REPLACE FUNCTION ") {
            let name: String = rest.chars().take_while(|c| *c != '(').collect();
            db.functions.insert(name);
            return Ok(0);
        }
        if let Some(rest) = sql.strip_prefix("CREATE EXTENSION IF NOT EXISTS ") {
            db.extensions.insert(unquote_ident(rest));
            return Ok(0);
        }
        if let Some(rest) = sql.strip_prefix("DROP EXTENSION IF EXISTS ") {
            let name = unquote_ident(rest.trim_end_matches(" CASCADE"));
            db.extensions.remove(&name);
            return Ok(0);
        }
        if let Some(rest) = sql.strip_prefix("CREATE TYPE ") {
            let (name, tail) = take_quoted(rest);
            let body = tail
                .trim_start_matches(" AS ENUM (")
                .trim_end_matches(')');
            let values = body
                .split(", ")
                .map(|v| v.trim_matches('\'').to_string())
                .collect();
            db.enums.insert(name, values);
            return Ok(0);
        }
        if let Some(rest) = sql.strip_prefix("DROP TYPE IF EXISTS ") {
            let name = unquote_ident(rest.trim_end_matches(" CASCADE"));
            db.enums.shift_remove(&name);
            return Ok(0);
        }
        if let Some(rest) = sql.strip_prefix("DROP TYPE ") {
            db.enums.shift_remove(&unquote_ident(rest));
            return Ok(0);
        }
        if let Some(rest) = sql.strip_prefix("ALTER TYPE ") {
            let (name, tail) = take_quoted(rest);
            if let Some(target) = tail.strip_prefix(" RENAME TO ") {
                let values = db.enums.shift_remove(&name).unwrap_or_default();
                let new_name = unquote_ident(target);
                // Columns of this type follow the rename, in both the
                // scalar and the `_`-prefixed array spelling.
                let array_name = format!("_{name}");
                for table in db.tables.values_mut() {
                    for column in &mut table.columns {
                        if column.udt_name == name {
                            column.udt_name = new_name.clone();
                        } else if column.udt_name == array_name {
                            column.udt_name = format!("_{new_name}");
                        }
                    }
                }
                db.enums.insert(new_name, values);
                return Ok(0);
            }
            if let Some(spec) = tail.strip_prefix(" ADD VALUE IF NOT EXISTS ") {
                let values = db.enums.get_mut(&name).expect("enum exists");
                let mut parts = spec.splitn(2, ' ');
                let value = parts
                    .next()
                    .unwrap_or_default()
                    .trim_matches('\'')
                    .to_string();
                if values.contains(&value) {
                    return Ok(0);
                }
                match parts.next() {
                    Some(anchor_spec) if anchor_spec.starts_with("BEFORE ") => {
                        let anchor = anchor_spec.trim_start_matches("BEFORE ").trim_matches('\'');
                        let at = values.iter().position(|v| v == anchor).unwrap_or(0);
                        values.insert(at, value);
                    }
                    Some(anchor_spec) if anchor_spec.starts_with("AFTER ") => {
                        let anchor = anchor_spec.trim_start_matches("AFTER ").trim_matches('\'');
                        let at = values
                            .iter()
                            .position(|v| v == anchor)
                            .map_or(values.len(), |i| i + 1);
                        values.insert(at, value);
                    }
                    _ => values.push(value),
                }
                return Ok(0);
            }
            return Err(MigrateError::database(format!("unsupported ALTER TYPE: {sql}")));
        }
        if let Some(rest) = sql.strip_prefix("CREATE TABLE ") {
            let (name, tail) = take_quoted(rest);
            let body = tail
                .trim_start_matches(" (")
                .trim_end_matches(')')
                .trim_end_matches('\n');
            let mut table = FakeTable::default();
            for fragment in body.split(",\n    ") {
                let fragment = fragment.trim();
                if fragment.is_empty() {
                    continue;
                }
                apply_fragment(&mut table, &name, fragment);
            }
            db.tables.insert(name, table);
            return Ok(0);
        }
        if let Some(rest) = sql.strip_prefix("DROP TABLE IF EXISTS ") {
            let name = unquote_ident(rest.trim_end_matches(" CASCADE"));
            db.tables.shift_remove(&name);
            return Ok(0);
        }
        if let Some(rest) = sql.strip_prefix("ALTER TABLE ") {
            let (name, tail) = take_quoted(rest);
            return apply_alter_table(db, &name, tail.trim_start());
        }
        if let Some(rest) = sql.strip_prefix("CREATE INDEX ") {
            let (index, tail) = take_quoted(rest);
            let (table, cols) = take_quoted(tail.trim_start_matches(" ON "));
            let column = unquote_ident(cols.trim_start_matches(" (").trim_end_matches(')'));
            let table = db
                .tables
                .get_mut(&table)
                .ok_or_else(|| MigrateError::database(format!("no table for index {index}")))?;
            table.indexes.push(FakeIndex {
                name: index,
                columns: vec![column],
                unique: false,
                primary: false,
            });
            return Ok(0);
        }
        if let Some(rest) = sql.strip_prefix("DROP INDEX ") {
            let name = unquote_ident(rest);
            for table in db.tables.values_mut() {
                table.indexes.retain(|i| i.name != name);
            }
            return Ok(0);
        }
        if let Some(rest) = sql.strip_prefix("DROP TRIGGER IF EXISTS ") {
            let (name, _) = take_quoted(rest);
            db.triggers.remove(&name);
            return Ok(0);
        }
        if let Some(rest) = sql.strip_prefix("CREATE TRIGGER ") {
            let (name, _) = take_quoted(rest);
            db.triggers.insert(name);
            return Ok(0);
        }
        if let Some(rest) = sql.strip_prefix("DELETE FROM ") {
            let name = unquote_ident(rest);
            let table = db
                .tables
                .get_mut(&name)
                .ok_or_else(|| MigrateError::database(format!("no table {name}")))?;
            let deleted = table.row_count;
            table.row_count = 0;
            table.nulls.clear();
            return Ok(deleted as u64);
        }
        if let Some(rest) = sql.strip_prefix("UPDATE ") {
            // Only the NOT NULL backfill form is emitted.
            let (name, tail) = take_quoted(rest);
            let (column, _) = take_quoted(tail.trim_start_matches(" SET "));
            if let Some(table) = db.tables.get_mut(&name) {
                table.nulls.remove(&column);
            }
            return Ok(0);
        }

        Err(MigrateError::database(format!("unsupported statement: {sql}")))
    }
}

fn apply_alter_table(db: &mut FakeDb, table_name: &str, action: &str) -> MigrateResult<u64> {
    if let Some(rest) = action.strip_prefix("RENAME TO ") {
        let new_name = unquote_ident(rest);
        if let Some(table) = db.tables.shift_remove(table_name) {
            db.tables.insert(new_name, table);
        }
        return Ok(0);
    }

    let table = db
        .tables
        .get_mut(table_name)
        .ok_or_else(|| MigrateError::database(format!("no table {table_name}")))?;

    if let Some(rest) = action.strip_prefix("RENAME COLUMN ") {
        let (old, tail) = take_quoted(rest);
        let new = unquote_ident(tail.trim_start_matches(" TO "));
        for column in &mut table.columns {
            if column.name == old {
                column.name = new.clone();
            }
        }
        // Constraint and index key columns track the rename; names do not.
        for constraint in &mut table.constraints {
            for col in &mut constraint.columns {
                if *col == old {
                    *col = new.clone();
                }
            }
        }
        for index in &mut table.indexes {
            for col in &mut index.columns {
                if *col == old {
                    *col = new.clone();
                }
            }
        }
        if let Some(nulls) = table.nulls.remove(&old) {
            table.nulls.insert(new, nulls);
        }
        return Ok(0);
    }
    if let Some(fragment) = action.strip_prefix("ADD COLUMN ") {
        apply_fragment(table, table_name, fragment);
        let added = table.columns.last().expect("fragment adds a column");
        // A nullable column without default starts NULL in every row.
        if !added.not_null && added.default.is_none() && table.row_count > 0 {
            let name = added.name.clone();
            let rows = table.row_count;
            table.nulls.insert(name, rows);
        }
        return Ok(0);
    }
    if let Some(rest) = action.strip_prefix("DROP COLUMN ") {
        let name = unquote_ident(rest);
        table.columns.retain(|c| c.name != name);
        table.constraints.retain(|c| !c.columns.contains(&name));
        table.indexes.retain(|i| !i.columns.contains(&name));
        return Ok(0);
    }
    if let Some(rest) = action.strip_prefix("ADD PRIMARY KEY (") {
        let column = unquote_ident(rest.trim_end_matches(')'));
        if let Some(col) = table.columns.iter_mut().find(|c| c.name == column) {
            col.not_null = true;
        }
        table.constraints.push(FakeConstraint {
            name: format!("{table_name}_pkey"),
            kind: 'p',
            columns: vec![column.clone()],
            definition: format!("PRIMARY KEY (\"{column}\")"),
            ref_table: None,
            ref_columns: Vec::new(),
            on_delete: None,
            on_update: None,
        });
        table.indexes.push(FakeIndex {
            name: format!("{table_name}_pkey"),
            columns: vec![column],
            unique: true,
            primary: true,
        });
        return Ok(0);
    }
    if let Some(rest) = action.strip_prefix("DROP CONSTRAINT ") {
        let name = unquote_ident(rest);
        table.constraints.retain(|c| c.name != name);
        table.indexes.retain(|i| i.name != name);
        return Ok(0);
    }
    if let Some(rest) = action.strip_prefix("ADD CONSTRAINT ") {
        let (name, tail) = take_quoted(rest);
        let tail = tail.trim_start();
        if let Some(spec) = tail.strip_prefix("UNIQUE (") {
            let column = unquote_ident(spec.trim_end_matches(')'));
            table.indexes.push(FakeIndex {
                name: name.clone(),
                columns: vec![column.clone()],
                unique: true,
                primary: false,
            });
            table.constraints.push(FakeConstraint {
                name,
                kind: 'u',
                columns: vec![column.clone()],
                definition: format!("UNIQUE (\"{column}\")"),
                ref_table: None,
                ref_columns: Vec::new(),
                on_delete: None,
                on_update: None,
            });
            return Ok(0);
        }
        if let Some(spec) = tail.strip_prefix("CHECK (") {
            let expr = spec.strip_suffix(')').unwrap_or(spec);
            let (column, _) = name
                .strip_prefix(&format!("{table_name}_"))
                .and_then(|s| s.strip_suffix("_check"))
                .map(|c| (c.to_string(), ()))
                .unwrap_or_default();
            table.constraints.push(FakeConstraint {
                name,
                kind: 'c',
                columns: vec![column],
                definition: format!("CHECK (({expr}))"),
                ref_table: None,
                ref_columns: Vec::new(),
                on_delete: None,
                on_update: None,
            });
            return Ok(0);
        }
        if let Some(spec) = tail.strip_prefix("FOREIGN KEY (") {
            let (column, rest) = take_quoted(spec);
            let rest = rest.trim_start_matches(") REFERENCES ");
            let (ref_table, rest) = take_quoted(rest);
            let (ref_column, rest) = take_quoted(rest.trim_start_matches('('));
            let actions = rest.trim_start_matches(paren_or_space);
            let (on_delete, on_update) = parse_actions(actions);
            table.constraints.push(FakeConstraint {
                name,
                kind: 'f',
                columns: vec![column],
                definition: String::new(),
                ref_table: Some(ref_table),
                ref_columns: vec![ref_column],
                on_delete,
                on_update,
            });
            return Ok(0);
        }
        return Err(MigrateError::database(format!(
            "unsupported ADD CONSTRAINT on {table_name}: {tail}"
        )));
    }
    if let Some(rest) = action.strip_prefix("ALTER COLUMN ") {
        let (column_name, tail) = take_quoted(rest);
        let tail = tail.trim_start();
        let column = table
            .columns
            .iter_mut()
            .find(|c| c.name == column_name)
            .ok_or_else(|| MigrateError::database(format!("no column {column_name}")))?;
        if let Some(spec) = tail.strip_prefix("TYPE ") {
            let type_sql = spec.split(" USING ").next().unwrap_or(spec);
            column.udt_name = sql_type_to_udt(type_sql);
            return Ok(0);
        }
        if tail == "SET NOT NULL" {
            column.not_null = true;
            return Ok(0);
        }
        if tail == "DROP NOT NULL" {
            column.not_null = false;
            return Ok(0);
        }
        if let Some(expr) = tail.strip_prefix("SET DEFAULT ") {
            column.default = Some(expr.to_string());
            return Ok(0);
        }
        if tail == "DROP DEFAULT" {
            column.default = None;
            return Ok(0);
        }
    }

    Err(MigrateError::database(format!(
        "unsupported ALTER TABLE on {table_name}: {action}"
    )))
}

/// Apply one column fragment (or table-level PRIMARY KEY line) from a
/// CREATE TABLE body or an ADD COLUMN statement.
fn apply_fragment(table: &mut FakeTable, table_name: &str, fragment: &str) {
    if let Some(spec) = fragment.strip_prefix("PRIMARY KEY (") {
        let columns: Vec<String> = spec
            .trim_end_matches(')')
            .split(", ")
            .map(unquote_ident)
            .collect();
        for name in &columns {
            if let Some(col) = table.columns.iter_mut().find(|c| &c.name == name) {
                col.not_null = true;
            }
        }
        table.constraints.push(FakeConstraint {
            name: format!("{table_name}_pkey"),
            kind: 'p',
            columns: columns.clone(),
            definition: String::new(),
            ref_table: None,
            ref_columns: Vec::new(),
            on_delete: None,
            on_update: None,
        });
        table.indexes.push(FakeIndex {
            name: format!("{table_name}_pkey"),
            columns,
            unique: true,
            primary: true,
        });
        return;
    }

    let (name, rest) = take_quoted(fragment);
    let rest = rest.trim_start();

    // The type token: quoted enum or a single scalar word, either with an
    // optional [] suffix.
    let (type_sql, rest) = if rest.starts_with('"') {
        let (enum_name, tail) = take_quoted(rest);
        let (suffix, tail) = if let Some(t) = tail.strip_prefix("[]") {
            ("[]", t)
        } else {
            ("", tail)
        };
        (format!("\"{enum_name}\"{suffix}"), tail)
    } else {
        let token: String = rest.chars().take_while(|c| !c.is_whitespace()).collect();
        let tail = &rest[token.len()..];
        (token, tail)
    };
    let udt = sql_type_to_udt(&type_sql);

    let identity = rest.starts_with(" GENERATED ALWAYS AS IDENTITY");
    let primary = rest.contains(" PRIMARY KEY");
    let not_null = rest.contains(" NOT NULL") || primary || identity;
    let unique = rest.contains(" UNIQUE");

    let mut default = None;
    if let Some(at) = rest.find(" DEFAULT ") {
        let expr = &rest[at + " DEFAULT ".len()..];
        let end = expr
            .find(" CHECK (")
            .or_else(|| expr.find(" REFERENCES \""))
            .unwrap_or(expr.len());
        default = Some(expr[..end].to_string());
    }

    if let Some(at) = rest.find(" CHECK (") {
        let expr = &rest[at + " CHECK (".len()..];
        let end = expr.find(" REFERENCES \"").unwrap_or(expr.len());
        let expr = expr[..end].trim_end();
        let expr = expr.strip_suffix(')').unwrap_or(expr);
        table.constraints.push(FakeConstraint {
            name: format!("{table_name}_{name}_check"),
            kind: 'c',
            columns: vec![name.clone()],
            definition: format!("CHECK (({expr}))"),
            ref_table: None,
            ref_columns: Vec::new(),
            on_delete: None,
            on_update: None,
        });
    }

    if let Some(at) = rest.find(" REFERENCES \"") {
        let spec = &rest[at + " REFERENCES ".len()..];
        let (ref_table, tail) = take_quoted(spec);
        let (ref_column, tail) = take_quoted(tail.trim_start_matches('('));
        let (on_delete, on_update) = parse_actions(tail.trim_start_matches(paren_or_space));
        table.constraints.push(FakeConstraint {
            name: format!("{table_name}_{name}_fkey"),
            kind: 'f',
            columns: vec![name.clone()],
            definition: String::new(),
            ref_table: Some(ref_table),
            ref_columns: vec![ref_column],
            on_delete,
            on_update,
        });
    }

    if primary {
        table.constraints.push(FakeConstraint {
            name: format!("{table_name}_pkey"),
            kind: 'p',
            columns: vec![name.clone()],
            definition: String::new(),
            ref_table: None,
            ref_columns: Vec::new(),
            on_delete: None,
            on_update: None,
        });
        table.indexes.push(FakeIndex {
            name: format!("{table_name}_pkey"),
            columns: vec![name.clone()],
            unique: true,
            primary: true,
        });
    }
    if unique && !primary {
        table.constraints.push(FakeConstraint {
            name: format!("{table_name}_{name}_key"),
            kind: 'u',
            columns: vec![name.clone()],
            definition: String::new(),
            ref_table: None,
            ref_columns: Vec::new(),
            on_delete: None,
            on_update: None,
        });
        table.indexes.push(FakeIndex {
            name: format!("{table_name}_{name}_key"),
            columns: vec![name.clone()],
            unique: true,
            primary: false,
        });
    }

    table.columns.push(FakeColumn {
        name,
        udt_name: udt,
        not_null,
        default,
        identity,
    });
}

fn parse_actions(spec: &str) -> (Option<char>, Option<char>) {
    let action_code = |action: &str| match action.trim() {
        "CASCADE" => Some('c'),
        "SET NULL" => Some('n'),
        "SET DEFAULT" => Some('d'),
        "RESTRICT" => Some('r'),
        "NO ACTION" => Some('a'),
        _ => None,
    };
    let mut on_delete = None;
    let mut on_update = None;
    if let Some(at) = spec.find("ON DELETE ") {
        let tail = &spec[at + "ON DELETE ".len()..];
        let end = tail.find(" ON UPDATE ").unwrap_or(tail.len());
        on_delete = action_code(&tail[..end]);
    }
    if let Some(at) = spec.find("ON UPDATE ") {
        on_update = action_code(&spec[at + "ON UPDATE ".len()..]);
    }
    (on_delete, on_update)
}

/// Strip the `) ` left between the referenced column and the action list.
fn paren_or_space(c: char) -> bool {
    c == ')' || c == ' '
}

fn sql_type_to_udt(type_sql: &str) -> String {
    let (base, array) = match type_sql.strip_suffix("[]") {
        Some(base) => (base, true),
        None => (type_sql, false),
    };
    let udt = if let Some(enum_name) = base.strip_prefix('"') {
        enum_name.trim_end_matches('"').to_string()
    } else {
        match base {
            "TEXT" => "text",
            "INTEGER" => "int4",
            "SMALLINT" => "int2",
            "BIGINT" => "int8",
            "NUMERIC" => "numeric",
            "BOOLEAN" => "bool",
            "UUID" => "uuid",
            "JSON" => "json",
            "JSONB" => "jsonb",
            "DATE" => "date",
            "TIME" => "time",
            "TIMETZ" => "timetz",
            "TIMESTAMP" => "timestamp",
            "TIMESTAMPTZ" => "timestamptz",
            other => other,
        }
        .to_string()
    };
    if array {
        format!("_{udt}")
    } else {
        udt
    }
}

fn unquote_ident(text: &str) -> String {
    text.trim().trim_matches('"').to_string()
}

/// Read a leading double-quoted identifier; returns (name, rest).
fn take_quoted(text: &str) -> (String, &str) {
    let text = text.trim_start();
    let inner = text.strip_prefix('"').unwrap_or(text);
    match inner.find('"') {
        Some(end) => (inner[..end].to_string(), &inner[end + 1..]),
        None => {
            let end = inner.find(' ').unwrap_or(inner.len());
            (inner[..end].to_string(), &inner[end..])
        }
    }
}

fn extract_literal(sql: &str, after: &str) -> Option<String> {
    let at = sql.find(after)? + after.len();
    let rest = &sql[at..];
    let start = rest.find('\'')? + 1;
    let end = rest[start..].find('\'')? + start;
    Some(rest[start..end].to_string())
}

#[async_trait]
impl Session for FakeSession {
    async fn execute(&mut self, sql: &str) -> MigrateResult<u64> {
        self.executed.push(sql.to_string());
        self.apply(sql)
    }

    async fn query(&mut self, sql: &str) -> MigrateResult<Vec<SqlRow>> {
        let db = &self.db;

        if sql.starts_with("SELECT tablename FROM pg_tables") {
            let mut names: Vec<&String> = db.tables.keys().collect();
            names.sort();
            return Ok(names
                .into_iter()
                .map(|n| SqlRow::new(vec![Some(n.clone())]))
                .collect());
        }
        if sql.starts_with("SELECT column_name, udt_name") {
            let table = extract_literal(sql, "table_name = ")
                .ok_or_else(|| MigrateError::database("missing table literal"))?;
            let Some(table) = db.tables.get(&table) else {
                return Ok(Vec::new());
            };
            return Ok(table
                .columns
                .iter()
                .map(|c| {
                    SqlRow::new(vec![
                        Some(c.name.clone()),
                        Some(c.udt_name.clone()),
                        Some(if c.not_null { "NO" } else { "YES" }.to_string()),
                        c.default.clone(),
                        Some(if c.identity { "YES" } else { "NO" }.to_string()),
                    ])
                })
                .collect());
        }
        if sql.starts_with("SELECT c.conname") {
            let table = extract_literal(sql, "rel.relname = ")
                .ok_or_else(|| MigrateError::database("missing table literal"))?;
            let Some(table) = db.tables.get(&table) else {
                return Ok(Vec::new());
            };
            return Ok(table
                .constraints
                .iter()
                .map(|c| {
                    SqlRow::new(vec![
                        Some(c.name.clone()),
                        Some(c.kind.to_string()),
                        Some(c.definition.clone()),
                        Some(c.columns.join(",")),
                        c.ref_table.clone(),
                        if c.ref_columns.is_empty() {
                            None
                        } else {
                            Some(c.ref_columns.join(","))
                        },
                        c.on_delete.map(|a| a.to_string()),
                        c.on_update.map(|a| a.to_string()),
                    ])
                })
                .collect());
        }
        if sql.starts_with("SELECT i.relname") {
            let table = extract_literal(sql, "t.relname = ")
                .ok_or_else(|| MigrateError::database("missing table literal"))?;
            let Some(table) = db.tables.get(&table) else {
                return Ok(Vec::new());
            };
            return Ok(table
                .indexes
                .iter()
                .map(|i| {
                    SqlRow::new(vec![
                        Some(i.name.clone()),
                        Some(i.columns.join(",")),
                        Some(if i.unique { "t" } else { "f" }.to_string()),
                        Some(if i.primary { "t" } else { "f" }.to_string()),
                    ])
                })
                .collect());
        }
        if sql.starts_with("SELECT t.typname") {
            let mut rows = Vec::new();
            let mut names: Vec<&String> = db.enums.keys().collect();
            names.sort();
            for name in names {
                for value in &db.enums[name] {
                    rows.push(SqlRow::new(vec![
                        Some(name.clone()),
                        Some(value.clone()),
                    ]));
                }
            }
            return Ok(rows);
        }
        if sql.starts_with("SELECT table_name, column_name") {
            let scalar = extract_literal(sql, "udt_name IN (")
                .ok_or_else(|| MigrateError::database("missing enum literal"))?;
            let array = format!("_{scalar}");
            let mut rows = Vec::new();
            for (table_name, table) in &db.tables {
                for column in &table.columns {
                    if column.udt_name == scalar || column.udt_name == array {
                        rows.push(SqlRow::new(vec![
                            Some(table_name.clone()),
                            Some(column.name.clone()),
                            Some(column.udt_name.clone()),
                        ]));
                    }
                }
            }
            return Ok(rows);
        }
        if sql.starts_with("SELECT extname") {
            return Ok(db
                .extensions
                .iter()
                .map(|e| SqlRow::new(vec![Some(e.clone())]))
                .collect());
        }
        if let Some(rest) = sql.strip_prefix("SELECT count(*) FROM ") {
            let name = unquote_ident(rest);
            let table = db
                .tables
                .get(&name)
                .ok_or_else(|| MigrateError::database(format!("no table {name}")))?;
            return Ok(vec![SqlRow::new(vec![Some(table.row_count.to_string())])]);
        }
        if let Some(rest) = sql.strip_prefix("SELECT count(") {
            let (column, tail) = take_quoted(rest);
            let table_name = unquote_ident(tail.trim_start_matches(") FROM "));
            let table = db
                .tables
                .get(&table_name)
                .ok_or_else(|| MigrateError::database(format!("no table {table_name}")))?;
            let nulls = table.nulls.get(&column).copied().unwrap_or(0);
            return Ok(vec![SqlRow::new(vec![Some(
                (table.row_count - nulls).to_string(),
            )])]);
        }

        Err(MigrateError::database(format!("unsupported query: {sql}")))
    }

    async fn begin(&mut self) -> MigrateResult<()> {
        self.executed.push("BEGIN".to_string());
        self.snapshot = Some(self.db.clone());
        Ok(())
    }

    async fn commit(&mut self) -> MigrateResult<()> {
        self.executed.push("COMMIT".to_string());
        self.snapshot = None;
        Ok(())
    }

    async fn rollback(&mut self) -> MigrateResult<()> {
        self.executed.push("ROLLBACK".to_string());
        if let Some(snapshot) = self.snapshot.take() {
            self.db = snapshot;
        }
        Ok(())
    }
}
