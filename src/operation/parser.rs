//! Statement parsing.
//!
//! `SET` commands are recognised textually, since option keys such as
//! `execution.runtime-mode` are not valid SQL identifiers. Every other
//! statement is parsed with sqlparser-rs using the configured dialect.

use std::sync::OnceLock;

use regex::Regex;
use sqlparser::ast::Statement;
use sqlparser::dialect::dialect_from_str;
use sqlparser::parser::Parser;

use crate::error::{Result, SubmitError};

use super::{
    CreateTableOperation, ExplainOperation, InsertOperation, OtherOperation, ParsedOperation,
    SetOperation,
};

/// Dialect used when nothing else is configured.
pub const DEFAULT_DIALECT: &str = "sqlite";

fn set_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)^SET(?:\s+(?P<key>[^=]*?)\s*(?:=\s*(?P<value>.*?))?)?\s*$")
            .expect("set pattern is a valid regex")
    })
}

/// Parses single statements into operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationParser {
    dialect: String,
}

impl Default for OperationParser {
    fn default() -> Self {
        Self {
            dialect: DEFAULT_DIALECT.to_string(),
        }
    }
}

impl OperationParser {
    /// Creates a parser for the named sqlparser dialect (e.g. "sqlite", "postgres").
    pub fn new(dialect: &str) -> Result<Self> {
        let dialect = dialect.trim().to_lowercase();
        if dialect_from_str(&dialect).is_none() {
            return Err(SubmitError::config(format!(
                "Unknown SQL dialect '{dialect}'"
            )));
        }
        Ok(Self { dialect })
    }

    /// Returns the dialect name.
    pub fn dialect(&self) -> &str {
        &self.dialect
    }

    /// Parses one statement.
    pub fn parse(&self, sql: &str) -> Result<ParsedOperation> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(SubmitError::parse("Empty statement"));
        }

        if let Some(set) = parse_set(sql) {
            return Ok(ParsedOperation::SetConfig(set));
        }

        let dialect = dialect_from_str(&self.dialect)
            .ok_or_else(|| SubmitError::parse(format!("Unknown SQL dialect '{}'", self.dialect)))?;
        let mut statements = Parser::parse_sql(&*dialect, sql)
            .map_err(|e| SubmitError::parse(format!("SQL parse error: {e}")))?;

        if statements.len() != 1 {
            return Err(SubmitError::parse(format!(
                "Expected a single statement, found {}",
                statements.len()
            )));
        }

        let operation = match statements.remove(0) {
            Statement::Insert(insert) => ParsedOperation::Insert(InsertOperation {
                sql: sql.to_string(),
                target: insert.table_name.to_string(),
            }),
            Statement::Explain { statement, .. } => ParsedOperation::Explain(ExplainOperation {
                sql: sql.to_string(),
                explained: statement.to_string(),
            }),
            Statement::CreateTable { .. } => {
                ParsedOperation::CreateTable(CreateTableOperation {
                    sql: sql.to_string(),
                })
            }
            _ => ParsedOperation::Other(OtherOperation {
                sql: sql.to_string(),
                keyword: leading_keyword(sql),
            }),
        };

        Ok(operation)
    }
}

/// Recognises `SET`, `SET key` and `SET key = value`.
fn parse_set(sql: &str) -> Option<SetOperation> {
    let captures = set_pattern().captures(sql)?;
    let part = |name: &str| {
        captures
            .name(name)
            .map(|m| unquote(m.as_str()))
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    Some(SetOperation {
        sql: sql.to_string(),
        key: part("key"),
        value: part("value"),
    })
}

/// Trims and removes one layer of matching single or double quotes.
fn unquote(s: &str) -> &str {
    let s = s.trim();
    for quote in ['\'', '"'] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return s[1..s.len() - 1].trim();
        }
    }
    s
}

fn leading_keyword(sql: &str) -> String {
    sql.split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_uppercase()
}
