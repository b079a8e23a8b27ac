//! Structural classification of parsed operations.

use super::{OperationKind, ParsedOperation};

/// Maps an operation to its dispatch path by variant alone.
pub fn classify(operation: &ParsedOperation) -> OperationKind {
    match operation {
        ParsedOperation::Insert(_) => OperationKind::Insert,
        ParsedOperation::SetConfig(_) => OperationKind::SetConfig,
        ParsedOperation::Explain(_) => OperationKind::Explain,
        ParsedOperation::CreateTable(_) => OperationKind::CreateTable,
        ParsedOperation::Other(_) => OperationKind::Other,
    }
}
