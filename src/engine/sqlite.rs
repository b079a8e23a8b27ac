//! SQLite-backed engine.
//!
//! Runs operations against a sqlx SQLite pool holding a single connection,
//! so an in-memory database lives for the whole script run.

use std::str::FromStr;
use std::time::Instant;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Row as SqlxRow, TypeInfo, ValueRef};
use tracing::{debug, info};

use super::{
    ColumnInfo, ExecutionResult, JobSummary, Row, RuntimeConfig, SinkWrite, SqlEngine, Value,
    SQL_DIALECT_KEY,
};
use crate::error::{Result, SubmitError};
use crate::operation::{ExplainOperation, InsertOperation, OperationParser, ParsedOperation};

/// Keywords of statements that produce a result set.
const QUERY_KEYWORDS: &[&str] = &["SELECT", "WITH", "VALUES", "PRAGMA", "SHOW"];

/// Engine executing statements on SQLite through sqlx.
pub struct SqliteEngine {
    pool: SqlitePool,
    parser: OperationParser,
    config: RuntimeConfig,
}

impl SqliteEngine {
    /// Connects to the database URL, parsing statements with the given dialect.
    pub async fn connect(url: &str, dialect: &str, config: RuntimeConfig) -> Result<Self> {
        let parser = OperationParser::new(dialect)?;
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| SubmitError::config(format!("Invalid engine database '{url}': {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| SubmitError::execution(format!("Failed to open {url}: {e}")))?;

        info!("Engine connected to {url} (dialect: {})", parser.dialect());
        Ok(Self {
            pool,
            parser,
            config,
        })
    }

    /// Opens a private in-memory database.
    pub async fn in_memory(config: RuntimeConfig) -> Result<Self> {
        Self::connect("sqlite::memory:", crate::operation::DEFAULT_DIALECT, config).await
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn run_query(&self, sql: &str) -> Result<ExecutionResult> {
        let start = Instant::now();
        let rows: Vec<SqliteRow> = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(format_execution_error)?;

        let columns = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                    .collect()
            })
            .unwrap_or_default();
        let rows = rows.iter().map(convert_row).collect();

        Ok(ExecutionResult::with_data(columns, rows).with_execution_time(start.elapsed()))
    }

    async fn run_update(&self, sql: &str) -> Result<ExecutionResult> {
        let start = Instant::now();
        let done = sqlx::query(sql)
            .execute(&self.pool)
            .await
            .map_err(format_execution_error)?;

        Ok(ExecutionResult {
            rows_affected: done.rows_affected(),
            execution_time: start.elapsed(),
            ..ExecutionResult::default()
        })
    }

    /// Renders `EXPLAIN QUERY PLAN` into a single-row, single-column result.
    async fn explain(&self, explain: &ExplainOperation) -> Result<ExecutionResult> {
        let start = Instant::now();
        let sql = format!("EXPLAIN QUERY PLAN {}", explain.explained);
        let rows: Vec<SqliteRow> = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(format_execution_error)?;

        let mut nodes = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: i64 = row.try_get_unchecked("id").map_err(format_execution_error)?;
            let parent: i64 = row
                .try_get_unchecked("parent")
                .map_err(format_execution_error)?;
            let detail: String = row
                .try_get_unchecked("detail")
                .map_err(format_execution_error)?;
            nodes.push(PlanNode { id, parent, detail });
        }

        let plan = render_plan(&nodes);
        Ok(ExecutionResult::with_data(
            vec![ColumnInfo::new("plan", "TEXT")],
            vec![vec![Value::String(plan)]],
        )
        .with_execution_time(start.elapsed()))
    }

    fn active_parser(&self) -> Result<OperationParser> {
        match self.config.get(SQL_DIALECT_KEY) {
            Some(dialect) if !dialect.eq_ignore_ascii_case("default") => {
                OperationParser::new(dialect).map_err(|_| {
                    SubmitError::parse(format!(
                        "Unknown SQL dialect '{dialect}' in {SQL_DIALECT_KEY}"
                    ))
                })
            }
            _ => Ok(self.parser.clone()),
        }
    }
}

#[async_trait]
impl SqlEngine for SqliteEngine {
    fn parse(&self, statement: &str) -> Result<ParsedOperation> {
        self.active_parser()?.parse(statement)
    }

    async fn execute_immediate(&mut self, operation: &ParsedOperation) -> Result<ExecutionResult> {
        match operation {
            ParsedOperation::Explain(explain) => self.explain(explain).await,
            // Session options change through `mutate_config` only.
            ParsedOperation::SetConfig(set) => Err(SubmitError::execution(format!(
                "SET is not executable, apply it with mutate_config: {}",
                set.sql
            ))),
            ParsedOperation::Insert(insert) => self.run_update(&insert.sql).await,
            ParsedOperation::CreateTable(create) => self.run_update(&create.sql).await,
            ParsedOperation::Other(other) if QUERY_KEYWORDS.contains(&other.keyword.as_str()) => {
                self.run_query(&other.sql).await
            }
            ParsedOperation::Other(other) => self.run_update(&other.sql).await,
        }
    }

    async fn execute_combined(&mut self, inserts: &[InsertOperation]) -> Result<ExecutionResult> {
        let start = Instant::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| SubmitError::execution(format!("Failed to begin insert job: {e}")))?;

        let mut sinks = Vec::with_capacity(inserts.len());
        for insert in inserts {
            let done = sqlx::query(&insert.sql)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    SubmitError::execution(format!(
                        "Insert into {} failed: {}",
                        insert.target,
                        describe_sqlx_error(&e)
                    ))
                })?;
            debug!(sink = %insert.target, rows = done.rows_affected(), "Sink write applied");
            sinks.push(SinkWrite {
                table: insert.target.clone(),
                rows_affected: done.rows_affected(),
            });
        }

        tx.commit()
            .await
            .map_err(|e| SubmitError::execution(format!("Failed to commit insert job: {e}")))?;

        let job = JobSummary {
            name: self
                .config
                .job_name(inserts.iter().map(|i| i.target.as_str())),
            mode: self.config.mode(),
            sinks,
        };
        Ok(ExecutionResult {
            rows_affected: job.rows_written(),
            execution_time: start.elapsed(),
            job: Some(job),
            ..ExecutionResult::default()
        })
    }

    fn mutate_config(&mut self, key: &str, value: &str) {
        debug!(key, value, "Runtime option set");
        self.config.set(key, value);
    }

    fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

struct PlanNode {
    id: i64,
    parent: i64,
    detail: String,
}

/// Renders plan rows as an indented tree; children follow their parent.
fn render_plan(nodes: &[PlanNode]) -> String {
    let mut depths: Vec<(i64, usize)> = Vec::with_capacity(nodes.len());
    let mut plan = String::from("== Physical Execution Plan ==");

    for node in nodes {
        let depth = depths
            .iter()
            .find(|(id, _)| *id == node.parent)
            .map(|(_, depth)| depth + 1)
            .unwrap_or(0);
        depths.push((node.id, depth));

        plan.push('\n');
        plan.push_str(&"   ".repeat(depth));
        plan.push_str("+- ");
        plan.push_str(&node.detail);
    }

    plan
}

fn convert_row(row: &SqliteRow) -> Row {
    (0..row.len()).map(|index| convert_value(row, index)).collect()
}

/// Converts by the value's storage class, not the declared column type.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let type_name = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_uppercase(),
        Err(_) => return Value::Null,
    };

    match type_name.as_str() {
        "INTEGER" => row
            .try_get_unchecked::<i64, _>(index)
            .map(Value::Int)
            .unwrap_or(Value::Null),
        "REAL" => row
            .try_get_unchecked::<f64, _>(index)
            .map(Value::Float)
            .unwrap_or(Value::Null),
        "BLOB" => row
            .try_get_unchecked::<Vec<u8>, _>(index)
            .map(Value::Bytes)
            .unwrap_or(Value::Null),
        _ => row
            .try_get_unchecked::<String, _>(index)
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

fn describe_sqlx_error(error: &sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    }
}

fn format_execution_error(error: sqlx::Error) -> SubmitError {
    SubmitError::execution(describe_sqlx_error(&error))
}
