//! Script source tests: reading, joining and splitting.

use std::io::Write;

use pretty_assertions::assert_eq;
use sql_submit::cli::Cli;
use sql_submit::script::{split_script, ExecutionMode};
use tempfile::NamedTempFile;

use clap::Parser;

fn temp_script(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_ddl_and_dml_are_split_as_one_script() {
    let ddl = temp_script("CREATE TABLE t (id INTEGER);\n-- trailing comment");
    let dml = temp_script("SET execution.runtime-mode = batch;\nINSERT INTO t VALUES (1);\n");
    let cli = Cli::parse_from([
        "sql-submit",
        "--ddl",
        ddl.path().to_str().unwrap(),
        "--dml",
        dml.path().to_str().unwrap(),
    ]);

    let script = cli.script_sources().unwrap().read_script().await.unwrap();
    let split = split_script(&script);

    assert_eq!(
        split.statements,
        vec![
            "CREATE TABLE t (id INTEGER)",
            "SET execution.runtime-mode = batch",
            "INSERT INTO t VALUES (1)",
        ]
    );
    assert_eq!(split.mode, ExecutionMode::Batch);
}

#[tokio::test]
async fn test_missing_source_reports_path() {
    let cli = Cli::parse_from(["sql-submit", "--sql", "/nonexistent/job.sql"]);
    let err = cli
        .script_sources()
        .unwrap()
        .read_script()
        .await
        .unwrap_err();
    assert_eq!(err.category(), "Source Error");
}
