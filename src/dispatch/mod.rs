//! Statement dispatch for sql-submit.
//!
//! Drives a split script through the engine one statement at a time,
//! deferring inserts and submitting them together at the end.

pub mod runner;

pub use runner::{PendingMutations, RunOutcome, ScriptRunner, StatementFailure};
