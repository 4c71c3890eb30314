//! CHECK expression mini-language.
//!
//! Columns declare CHECK constraints in a small JS-like boolean expression
//! language. [`translate`] turns a source expression into an equivalent SQL
//! expression; [`normalize`] reduces SQL constraint text to a comparable
//! form so reconciliation can tell whether the database constraint already
//! matches the declaration.

mod lexer;
mod parser;

pub use lexer::{Lexer, Token};
pub use parser::Parser;

/// Failure to tokenize or parse a CHECK expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckError {
    message: String,
}

impl CheckError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for CheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CheckError {}

/// Translate a CHECK expression into a SQL expression.
pub fn translate(source: &str) -> Result<String, CheckError> {
    Parser::translate(source)
}

/// Normalize SQL constraint text for comparison.
///
/// The catalog re-prints constraints with its own whitespace, casing,
/// grouping parentheses and literal casts (`'ADMIN'::text`), so equality
/// is decided on a reduced form: casts and parentheses stripped, case
/// folded, whitespace removed.
pub fn normalize(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_whitespace() || c == '(' || c == ')' {
            continue;
        }
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            // Skip the cast target: an optionally quoted identifier,
            // possibly with an array suffix.
            while let Some(&next) = chars.peek() {
                if next.is_alphanumeric() || matches!(next, '_' | '"' | '[' | ']') {
                    chars.next();
                } else {
                    break;
                }
            }
            continue;
        }
        out.extend(c.to_lowercase());
    }
    out
}
