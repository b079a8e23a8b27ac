//! Parsed operations and their classification.
//!
//! A statement is parsed into exactly one [`ParsedOperation`]; the classifier
//! maps it to the [`OperationKind`] that selects its dispatch path.

mod classifier;
mod parser;

pub use classifier::classify;
pub use parser::{OperationParser, DEFAULT_DIALECT};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The structured form of one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedOperation {
    /// A mutating write into a sink table; deferred until end of script.
    Insert(InsertOperation),
    /// A session option assignment.
    SetConfig(SetOperation),
    /// A request to print a query plan.
    Explain(ExplainOperation),
    /// Table DDL.
    CreateTable(CreateTableOperation),
    /// Any other operation, executed immediately.
    Other(OtherOperation),
}

impl ParsedOperation {
    /// Returns the statement text this operation was parsed from.
    pub fn sql(&self) -> &str {
        match self {
            Self::Insert(op) => &op.sql,
            Self::SetConfig(op) => &op.sql,
            Self::Explain(op) => &op.sql,
            Self::CreateTable(op) => &op.sql,
            Self::Other(op) => &op.sql,
        }
    }

    /// Returns the dispatch kind of this operation.
    pub fn kind(&self) -> OperationKind {
        classify(self)
    }
}

/// `INSERT INTO <target> ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOperation {
    pub sql: String,
    /// Target table as written in the statement.
    pub target: String,
}

/// `SET [key [= value]]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetOperation {
    pub sql: String,
    pub key: Option<String>,
    pub value: Option<String>,
}

impl SetOperation {
    /// Returns the key/value pair when both are present.
    pub fn assignment(&self) -> Option<(&str, &str)> {
        match (&self.key, &self.value) {
            (Some(key), Some(value)) => Some((key.as_str(), value.as_str())),
            _ => None,
        }
    }
}

/// `EXPLAIN <statement>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplainOperation {
    pub sql: String,
    /// The explained statement, rendered back to SQL.
    pub explained: String,
}

/// `CREATE TABLE ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableOperation {
    pub sql: String,
}

/// Anything without special handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherOperation {
    pub sql: String,
    /// Leading keyword of the statement, upper-cased (e.g. `DROP`).
    pub keyword: String,
}

/// Dispatch path selected for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Insert,
    SetConfig,
    Explain,
    CreateTable,
    Other,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => write!(f, "INSERT"),
            Self::SetConfig => write!(f, "SET"),
            Self::Explain => write!(f, "EXPLAIN"),
            Self::CreateTable => write!(f, "CREATE TABLE"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}
