//! Script execution with fail-fast error handling.
//!
//! Statements run strictly in order. Inserts are deferred and submitted as
//! one combined unit after the last statement; an EXPLAIN ends the run early;
//! the first failure aborts everything that follows.

use tracing::{debug, error, info};

use crate::engine::{ExecutionResult, SqlEngine, RUNTIME_MODE_KEY};
use crate::error::{Result, SubmitError};
use crate::operation::{classify, InsertOperation, ParsedOperation};
use crate::script::ExecutionMode;

/// Runs split statements against an engine.
pub struct ScriptRunner<'a> {
    engine: &'a mut dyn SqlEngine,
}

impl<'a> ScriptRunner<'a> {
    /// Creates a new runner.
    pub fn new(engine: &'a mut dyn SqlEngine) -> Self {
        Self { engine }
    }

    /// Runs every statement in order and returns the terminal outcome.
    pub async fn run(&mut self, statements: &[String], mode: ExecutionMode) -> RunOutcome {
        info!("------------------ {mode} job ------------------");
        self.engine.mutate_config(RUNTIME_MODE_KEY, mode.as_str());

        let mut pending = PendingMutations::default();
        for statement in statements {
            match self.step(statement, &mut pending).await {
                Ok(None) => {}
                Ok(Some(plan)) => {
                    info!("------------------ SQL Explain ------------------\n{statement}");
                    info!("{plan}");
                    if !pending.is_empty() {
                        debug!(inserts = pending.len(), "Discarding deferred inserts");
                    }
                    return RunOutcome::ExplainRequested {
                        statement: statement.clone(),
                        plan,
                    };
                }
                Err(err) => {
                    error!(category = err.category(), "{err}");
                    return RunOutcome::Aborted(StatementFailure::new(statement.clone(), err));
                }
            }
        }

        self.flush(pending).await
    }

    /// Parses and routes one statement. Returns the plan text for EXPLAIN.
    async fn step(
        &mut self,
        statement: &str,
        pending: &mut PendingMutations,
    ) -> Result<Option<String>> {
        let operation = self.engine.parse(statement)?;
        info!(kind = %classify(&operation), "{statement}");

        match operation {
            ParsedOperation::Insert(insert) => {
                debug!(sink = %insert.target, "Deferring insert");
                pending.push(insert);
            }
            ParsedOperation::SetConfig(set) => match set.assignment() {
                Some((key, value)) => self.engine.mutate_config(key, value),
                None => debug!("Ignoring SET without key and value: {}", set.sql),
            },
            ParsedOperation::Explain(_) => {
                let result = self.engine.execute_immediate(&operation).await?;
                return plan_text(&result).map(Some);
            }
            ParsedOperation::CreateTable(_) | ParsedOperation::Other(_) => {
                let result = self.engine.execute_immediate(&operation).await?;
                debug!(
                    rows = result.rows.len(),
                    affected = result.rows_affected,
                    elapsed_ms = result.execution_time.as_millis() as u64,
                    "Statement executed"
                );
            }
        }

        Ok(None)
    }

    /// Submits deferred inserts as one unit, if there are any.
    async fn flush(&mut self, pending: PendingMutations) -> RunOutcome {
        if pending.is_empty() {
            info!("No insert statements to submit");
            return RunOutcome::Completed(None);
        }

        info!(inserts = pending.len(), "Submitting inserts as one job");
        match self.engine.execute_combined(pending.as_slice()).await {
            Ok(result) => RunOutcome::Completed(Some(result)),
            Err(err) => {
                error!(category = err.category(), "{err}");
                RunOutcome::Aborted(StatementFailure::new(pending.combined_sql(), err))
            }
        }
    }
}

/// The first field of the first row is the plan.
fn plan_text(result: &ExecutionResult) -> Result<String> {
    result
        .first_value()
        .filter(|value| !value.is_null())
        .map(|value| value.to_display_string())
        .ok_or_else(|| SubmitError::execution("EXPLAIN returned no plan"))
}

/// Inserts accumulated across a script, in document order.
#[derive(Debug, Default)]
pub struct PendingMutations {
    inserts: Vec<InsertOperation>,
}

impl PendingMutations {
    pub fn push(&mut self, insert: InsertOperation) {
        self.inserts.push(insert);
    }

    pub fn len(&self) -> usize {
        self.inserts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty()
    }

    pub fn as_slice(&self) -> &[InsertOperation] {
        &self.inserts
    }

    /// All insert statements as one script, for error reports.
    pub fn combined_sql(&self) -> String {
        self.inserts
            .iter()
            .map(|insert| format!("{};", insert.sql))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// How a script run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every statement ran; carries the combined insert result, if any inserts were deferred.
    Completed(Option<ExecutionResult>),
    /// An EXPLAIN statement ended the run.
    ExplainRequested { statement: String, plan: String },
    /// A statement failed; nothing after it ran.
    Aborted(StatementFailure),
}

impl RunOutcome {
    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed(_) | Self::ExplainRequested { .. } => 0,
            Self::Aborted(_) => 1,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code() == 0
    }
}

/// A failed statement together with its error.
#[derive(Debug)]
pub struct StatementFailure {
    pub statement: String,
    pub error: SubmitError,
}

impl StatementFailure {
    pub fn new(statement: impl Into<String>, error: SubmitError) -> Self {
        Self {
            statement: statement.into(),
            error,
        }
    }

    /// The statement with 1-based line numbers (`1: SELECT ...`).
    pub fn numbered_lines(&self) -> Vec<String> {
        self.statement
            .split('\n')
            .enumerate()
            .map(|(index, line)| format!("{}: {}", index + 1, line))
            .collect()
    }
}
