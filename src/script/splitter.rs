//! Line-oriented statement splitting.
//!
//! Comment stripping is purely textual: a `--` inside a string literal still
//! starts a comment, and a `;` is only a terminator when it ends a line.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::{ExecutionMode, SplitScript};

const COMMENT_MARKER: &str = "--";
const TERMINATOR: char = ';';

/// Matches `SET execution.runtime-mode = BATCH` with optional quotes, any case.
fn batch_mode_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)^SET\s+['"]?execution\.runtime-mode['"]?\s*=\s*['"]?batch['"]?$"#)
            .expect("batch mode pattern is a valid regex")
    })
}

/// Removes everything from the first `--` to the end of the line.
pub fn strip_line_comment(line: &str) -> &str {
    match line.find(COMMENT_MARKER) {
        Some(index) => &line[..index],
        None => line,
    }
}

/// Splits a script into terminated statements and infers its execution mode.
///
/// Each line is comment-stripped and trimmed; blank lines are dropped. A line
/// ending with `;` closes the current statement, which is cut at the first `;`
/// on that line. Content after the last terminator is silently discarded.
pub fn split_script(script: &str) -> SplitScript {
    let mut statements = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();

    for raw_line in script.lines() {
        let line = strip_line_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        if line.ends_with(TERMINATOR) {
            let head = match line.find(TERMINATOR) {
                Some(index) => line[..index].trim(),
                None => line,
            };
            if !head.is_empty() {
                buffer.push(head);
            }
            if !buffer.is_empty() {
                statements.push(buffer.join("\n"));
            }
            buffer.clear();
        } else {
            buffer.push(line);
        }
    }

    if !buffer.is_empty() {
        debug!(
            lines = buffer.len(),
            "Dropping trailing content without a terminator"
        );
    }

    let mode = infer_mode(&statements);
    SplitScript { statements, mode }
}

/// Returns true if the statement is exactly the batch runtime-mode switch.
pub fn is_batch_mode_statement(statement: &str) -> bool {
    batch_mode_pattern().is_match(statement.trim())
}

/// Infers the mode for a whole script.
///
/// The first batch runtime-mode statement wins; nothing after it is examined,
/// so a later switch back to streaming has no effect on the inferred mode.
pub fn infer_mode<S: AsRef<str>>(statements: &[S]) -> ExecutionMode {
    match statements
        .iter()
        .position(|statement| is_batch_mode_statement(statement.as_ref()))
    {
        Some(index) => {
            debug!(statement = index + 1, "Batch runtime mode requested");
            ExecutionMode::Batch
        }
        None => ExecutionMode::Streaming,
    }
}
