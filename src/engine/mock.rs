//! Mock engine for testing.
//!
//! Parses with the real operation parser but executes nothing; every call
//! across the engine boundary is recorded in order.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{ColumnInfo, ExecutionResult, JobSummary, RuntimeConfig, SinkWrite, SqlEngine, Value};
use crate::error::{Result, SubmitError};
use crate::operation::{InsertOperation, OperationKind, OperationParser, ParsedOperation};

/// One call made to the mock engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Parse(String),
    Execute(OperationKind, String),
    Combined(Vec<String>),
    SetConfig(String, String),
}

/// An engine that records calls and fails on request.
pub struct MockEngine {
    parser: OperationParser,
    config: RuntimeConfig,
    calls: Mutex<Vec<EngineCall>>,
    fail_patterns: Vec<String>,
    explain_plan: bool,
}

impl MockEngine {
    /// Creates a mock engine with empty runtime options.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::new())
    }

    /// Creates a mock engine with the given runtime options.
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            parser: OperationParser::default(),
            config,
            calls: Mutex::new(Vec::new()),
            fail_patterns: Vec::new(),
            explain_plan: true,
        }
    }

    /// Makes executions fail when the SQL contains `pattern`.
    pub fn fail_on(mut self, pattern: impl Into<String>) -> Self {
        self.fail_patterns.push(pattern.into());
        self
    }

    /// Makes EXPLAIN return an empty result instead of a plan row.
    pub fn without_plan(mut self) -> Self {
        self.explain_plan = false;
        self
    }

    /// Returns every recorded call, oldest first.
    pub fn calls(&self) -> Vec<EngineCall> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns the statements passed to `parse`.
    pub fn parsed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Parse(sql) => Some(sql),
                _ => None,
            })
            .collect()
    }

    /// Returns each combined submission's statements.
    pub fn combined_submissions(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Combined(statements) => Some(statements),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: EngineCall) {
        match self.calls.lock() {
            Ok(mut calls) => calls.push(call),
            Err(poisoned) => poisoned.into_inner().push(call),
        }
    }

    fn check_failure(&self, sql: &str) -> Result<()> {
        match self.fail_patterns.iter().find(|p| sql.contains(p.as_str())) {
            Some(pattern) => Err(SubmitError::execution(format!(
                "Mock failure on '{pattern}'"
            ))),
            None => Ok(()),
        }
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SqlEngine for MockEngine {
    fn parse(&self, statement: &str) -> Result<ParsedOperation> {
        self.record(EngineCall::Parse(statement.to_string()));
        self.parser.parse(statement)
    }

    async fn execute_immediate(&mut self, operation: &ParsedOperation) -> Result<ExecutionResult> {
        self.record(EngineCall::Execute(
            operation.kind(),
            operation.sql().to_string(),
        ));
        self.check_failure(operation.sql())?;

        match operation {
            ParsedOperation::Explain(explain) if self.explain_plan => Ok(ExecutionResult::with_data(
                vec![ColumnInfo::new("plan", "TEXT")],
                vec![vec![Value::String(format!("== Plan ==\n{}", explain.explained))]],
            )),
            _ => Ok(ExecutionResult::new().with_execution_time(Duration::from_millis(1))),
        }
    }

    async fn execute_combined(&mut self, inserts: &[InsertOperation]) -> Result<ExecutionResult> {
        self.record(EngineCall::Combined(
            inserts.iter().map(|insert| insert.sql.clone()).collect(),
        ));
        for insert in inserts {
            self.check_failure(&insert.sql)?;
        }

        let job = JobSummary {
            name: self
                .config
                .job_name(inserts.iter().map(|i| i.target.as_str())),
            mode: self.config.mode(),
            sinks: inserts
                .iter()
                .map(|insert| SinkWrite {
                    table: insert.target.clone(),
                    rows_affected: 1,
                })
                .collect(),
        };
        Ok(ExecutionResult {
            rows_affected: job.rows_written(),
            job: Some(job),
            ..ExecutionResult::default()
        })
    }

    fn mutate_config(&mut self, key: &str, value: &str) {
        self.record(EngineCall::SetConfig(key.to_string(), value.to_string()));
        self.config.set(key, value);
    }

    fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
