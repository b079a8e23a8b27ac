//! Execution engine boundary.
//!
//! The dispatcher talks to the SQL engine only through the [`SqlEngine`]
//! trait: parse one statement, execute it, submit the deferred inserts as one
//! unit, and mutate session options.

mod mock;
mod runtime;
mod sqlite;
mod types;

pub use mock::{EngineCall, MockEngine};
pub use runtime::{RuntimeConfig, PIPELINE_NAME_KEY, RUNTIME_MODE_KEY, SQL_DIALECT_KEY};
pub use sqlite::SqliteEngine;
pub use types::{ColumnInfo, ExecutionResult, JobSummary, Row, SinkWrite, Value};

use crate::config::EngineConfig;
use crate::error::{Result, SubmitError};
use crate::operation::{InsertOperation, ParsedOperation};
use async_trait::async_trait;

/// Creates an engine for the configured target.
///
/// Only SQLite URLs (`sqlite::memory:`, `sqlite://path/to.db`) are supported.
pub async fn connect(config: &EngineConfig, runtime: RuntimeConfig) -> Result<Box<dyn SqlEngine>> {
    if !config.database.starts_with("sqlite:") {
        return Err(SubmitError::config(format!(
            "Unsupported engine database '{}'. Expected a sqlite: URL",
            config.database
        )));
    }
    let engine = SqliteEngine::connect(&config.database, &config.dialect, runtime).await?;
    Ok(Box::new(engine))
}

/// Trait defining the narrow interface to the SQL engine.
#[async_trait]
pub trait SqlEngine: Send + Sync {
    /// Parses one statement, consulting the current runtime options.
    fn parse(&self, statement: &str) -> Result<ParsedOperation>;

    /// Executes one operation right away.
    async fn execute_immediate(&mut self, operation: &ParsedOperation) -> Result<ExecutionResult>;

    /// Submits all deferred inserts as one unit, in order.
    async fn execute_combined(&mut self, inserts: &[InsertOperation]) -> Result<ExecutionResult>;

    /// Sets a session option read by later parse and execute calls.
    fn mutate_config(&mut self, key: &str, value: &str);

    /// Returns the current session options.
    fn config(&self) -> &RuntimeConfig;

    /// Releases engine resources.
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_rejects_non_sqlite() {
        let config = EngineConfig {
            database: "postgres://localhost/db".to_string(),
            ..EngineConfig::default()
        };
        let result = connect(&config, RuntimeConfig::new()).await;
        assert!(matches!(result, Err(SubmitError::Config(_))));
    }

    #[tokio::test]
    async fn test_connect_in_memory() {
        let engine = connect(&EngineConfig::default(), RuntimeConfig::new())
            .await
            .unwrap();
        assert!(engine.config().is_empty());
        engine.close().await.unwrap();
    }
}
