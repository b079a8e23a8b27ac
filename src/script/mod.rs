//! Script splitting and execution mode inference.
//!
//! Turns a raw multi-statement SQL script into ordered statements and decides
//! whether the whole script runs in streaming or batch mode.

mod splitter;

pub use splitter::{infer_mode, is_batch_mode_statement, split_script, strip_line_comment};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution mode applied uniformly to one script run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Unbounded execution; the default when nothing asks for batch.
    #[default]
    Streaming,
    /// Bounded execution, selected by `SET execution.runtime-mode = BATCH`.
    Batch,
}

impl ExecutionMode {
    /// Returns the value used for the `execution.runtime-mode` option.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Streaming => "streaming",
            Self::Batch => "batch",
        }
    }

    /// Returns true for streaming mode.
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming)
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Streaming => write!(f, "STREAMING"),
            Self::Batch => write!(f, "BATCH"),
        }
    }
}

/// The output of splitting one script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitScript {
    /// Statements in document order, without terminators or comments.
    pub statements: Vec<String>,
    /// The single mode inferred for the whole script.
    pub mode: ExecutionMode,
}

impl SplitScript {
    /// Returns true if the script produced no statements.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Joins the statements back into script text, one terminated statement per line group.
    pub fn to_script(&self) -> String {
        self.statements
            .iter()
            .map(|statement| format!("{statement};\n"))
            .collect()
    }
}
