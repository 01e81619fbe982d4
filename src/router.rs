//! Statement classification.
//!
//! `INSERT INTO <database>.<line protocol>` statements are writes; every
//! other statement is forwarded verbatim to the query endpoint. The body of
//! an insert is not validated here, the server is the validator.

use std::sync::LazyLock;

use regex::Regex;

static INSERT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:INSERT\s+INTO)\s+([a-zA-Z0-9_\-]+)\.(?s:(.*))")
        .expect("insert pattern is valid")
});

/// Execution path chosen for a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind<'a> {
    /// Line-protocol write to `database`.
    Insert { database: &'a str, body: &'a str },
    /// Anything else, sent to the query endpoint unchanged.
    Generic { text: &'a str },
}

/// Classifies raw statement text.
pub fn classify(text: &str) -> StatementKind<'_> {
    match INSERT_RE.captures(text) {
        Some(caps) => match (caps.get(1), caps.get(2)) {
            (Some(db), Some(body)) => StatementKind::Insert {
                database: db.as_str(),
                body: body.as_str(),
            },
            _ => StatementKind::Generic { text },
        },
        None => StatementKind::Generic { text },
    }
}
