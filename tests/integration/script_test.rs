//! End-to-end script execution tests.
//!
//! Splits a script, runs it through the dispatcher and checks what the
//! SQLite engine ended up with.

use pretty_assertions::assert_eq;
use sql_submit::config::SessionDefaults;
use sql_submit::dispatch::{RunOutcome, ScriptRunner};
use sql_submit::engine::{RuntimeConfig, SqlEngine, SqliteEngine, Value, RUNTIME_MODE_KEY};
use sql_submit::script::{split_script, ExecutionMode};

/// Splits and runs a script on a fresh in-memory engine.
async fn run_script(script: &str) -> (SqliteEngine, RunOutcome) {
    let split = split_script(script);
    let runtime = RuntimeConfig::for_mode(split.mode, &SessionDefaults::default());
    let mut engine = SqliteEngine::in_memory(runtime).await.unwrap();
    let outcome = ScriptRunner::new(&mut engine)
        .run(&split.statements, split.mode)
        .await;
    (engine, outcome)
}

async fn count(engine: &SqliteEngine, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(engine.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_streaming_script_with_multiple_sinks() {
    let script = r#"
-- sources and sinks
CREATE TABLE orders (id INTEGER, amount INTEGER);
CREATE TABLE audit (id INTEGER);
CREATE TABLE totals (amount INTEGER);

INSERT INTO orders VALUES (1, 10), (2, 20);
INSERT INTO audit
SELECT 1;
"#;
    let (engine, outcome) = run_script(script).await;

    let RunOutcome::Completed(Some(result)) = outcome else {
        panic!("expected a combined job, got {outcome:?}");
    };
    let job = result.job.unwrap();
    assert_eq!(job.name, "insert-into_orders,audit");
    assert_eq!(job.mode, ExecutionMode::Streaming);
    assert_eq!(job.rows_written(), 3);
    assert_eq!(count(&engine, "orders").await, 2);
    assert_eq!(count(&engine, "audit").await, 1);
    assert_eq!(count(&engine, "totals").await, 0);
}

#[tokio::test]
async fn test_batch_mode_inferred_from_script() {
    let script = "\
SET 'execution.runtime-mode' = 'batch';
CREATE TABLE t (id INTEGER);
SET pipeline.name = nightly-load;
INSERT INTO t VALUES (1);
";
    let (engine, outcome) = run_script(script).await;

    assert_eq!(engine.config().get(RUNTIME_MODE_KEY), Some("batch"));
    let RunOutcome::Completed(Some(result)) = outcome else {
        panic!("expected a combined job, got {outcome:?}");
    };
    let job = result.job.unwrap();
    assert_eq!(job.mode, ExecutionMode::Batch);
    assert_eq!(job.name, "nightly-load");
}

#[tokio::test]
async fn test_invalid_statement_aborts_before_later_inserts() {
    let script = "\
CREATE TABLE t (id INTEGER);
CREATE TABLE t (id INTEGER);
INSERT INTO t VALUES (1);
";
    let (engine, outcome) = run_script(script).await;

    let RunOutcome::Aborted(failure) = &outcome else {
        panic!("expected abort, got {outcome:?}");
    };
    assert_eq!(failure.statement, "CREATE TABLE t (id INTEGER)");
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(count(&engine, "t").await, 0);
}

#[tokio::test]
async fn test_failed_insert_rolls_back_whole_job() {
    let script = "\
CREATE TABLE a (id INTEGER);
INSERT INTO a VALUES (1);
INSERT INTO missing VALUES (2);
";
    let (engine, outcome) = run_script(script).await;

    let RunOutcome::Aborted(failure) = outcome else {
        panic!("expected abort");
    };
    assert_eq!(
        failure.numbered_lines(),
        vec![
            "1: INSERT INTO a VALUES (1);",
            "2: INSERT INTO missing VALUES (2);",
        ]
    );
    assert!(failure.error.to_string().contains("missing"));
    assert_eq!(count(&engine, "a").await, 0);
}

#[tokio::test]
async fn test_explain_short_circuits_run() {
    let script = "\
CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT);
INSERT INTO t VALUES (1, 'a');
EXPLAIN SELECT name FROM t WHERE id = 1;
INSERT INTO t VALUES (2, 'b');
";
    let (engine, outcome) = run_script(script).await;

    let RunOutcome::ExplainRequested { statement, plan } = &outcome else {
        panic!("expected explain, got {outcome:?}");
    };
    assert_eq!(statement, "EXPLAIN SELECT name FROM t WHERE id = 1");
    assert!(plan.starts_with("== Physical Execution Plan =="));
    assert!(plan.contains("t"));
    assert_eq!(outcome.exit_code(), 0);
    // The deferred insert was never submitted.
    assert_eq!(count(&engine, "t").await, 0);
}

#[tokio::test]
async fn test_script_without_inserts_completes_empty() {
    let script = "CREATE TABLE t (id INTEGER);\nSELECT * FROM t;\n";
    let (_engine, outcome) = run_script(script).await;
    assert!(matches!(outcome, RunOutcome::Completed(None)));
}

#[tokio::test]
async fn test_unterminated_trailing_statement_is_dropped() {
    let script = "CREATE TABLE t (id INTEGER);\nINSERT INTO t VALUES (1)";
    let (engine, outcome) = run_script(script).await;
    assert!(matches!(outcome, RunOutcome::Completed(None)));
    assert_eq!(count(&engine, "t").await, 0);
}

#[tokio::test]
async fn test_in_script_set_overrides_session_default() {
    let script = "SET table.local-time-zone = UTC;\nCREATE TABLE t (id INTEGER);\n";
    let (engine, outcome) = run_script(script).await;
    assert!(outcome.is_success());
    assert_eq!(engine.config().get("table.local-time-zone"), Some("UTC"));
}

#[tokio::test]
async fn test_query_results_are_typed() {
    let mut engine = SqliteEngine::in_memory(RuntimeConfig::new()).await.unwrap();
    let operation = engine.parse("SELECT 1 AS n, 'x' AS s, NULL AS z").unwrap();
    let result = engine.execute_immediate(&operation).await.unwrap();
    assert_eq!(
        result.rows,
        vec![vec![
            Value::Int(1),
            Value::String("x".to_string()),
            Value::Null
        ]]
    );
}
