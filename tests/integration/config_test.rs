//! Session option precedence, from built-in defaults up to in-script SET.

use std::io::Write;

use clap::Parser;
use pretty_assertions::assert_eq;
use sql_submit::cli::Cli;
use sql_submit::dispatch::ScriptRunner;
use sql_submit::engine::{self, RuntimeConfig};
use sql_submit::script::split_script;
use tempfile::NamedTempFile;

const CONFIG: &str = r#"
[engine]
database = "sqlite:///nonexistent/warehouse.db"
dialect = "postgres"

[session.common]
"table.local-time-zone" = "UTC"
"execution.checkpointing.interval" = "5min"
"pipeline.name" = "from-file"

[session.streaming]
"execution.checkpointing.min-pause" = "20s"
"#;

fn config_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_option_precedence_chain() {
    let file = config_file();
    let cli = Cli::parse_from([
        "sql-submit",
        "--sql",
        "job.sql",
        "--config",
        file.path().to_str().unwrap(),
        "--database",
        "sqlite::memory:",
        "--dialect",
        "sqlite",
        "--set",
        "execution.checkpointing.interval=30s",
        "--set",
        "pipeline.name=from-cli",
    ]);
    let config = cli.load_config().unwrap();
    assert_eq!(config.engine.database, "sqlite::memory:");
    assert_eq!(config.engine.dialect, "sqlite");

    let split = split_script("SET pipeline.name = from-script;\nCREATE TABLE t (id INTEGER);\n");
    let runtime = RuntimeConfig::for_mode(split.mode, &config.session);

    // Built-in defaults survive where nothing overrides them.
    assert_eq!(runtime.get("restart-strategy"), Some("failure-rate"));
    // The file beats built-in defaults, in both sections.
    assert_eq!(runtime.get("table.local-time-zone"), Some("UTC"));
    assert_eq!(runtime.get("execution.checkpointing.min-pause"), Some("20s"));
    // --set beats the file.
    assert_eq!(runtime.get("execution.checkpointing.interval"), Some("30s"));
    assert_eq!(runtime.get("pipeline.name"), Some("from-cli"));

    let mut engine = engine::connect(&config.engine, runtime).await.unwrap();
    let outcome = ScriptRunner::new(engine.as_mut())
        .run(&split.statements, split.mode)
        .await;
    assert!(outcome.is_success());

    // In-script SET beats everything.
    assert_eq!(engine.config().get("pipeline.name"), Some("from-script"));
    assert_eq!(engine.config().get("execution.checkpointing.interval"), Some("30s"));
    engine.close().await.unwrap();
}

#[test]
fn test_missing_config_file_keeps_cli_overrides() {
    let cli = Cli::parse_from([
        "sql-submit",
        "--sql",
        "job.sql",
        "--config",
        "/nonexistent/sql-submit/config.toml",
        "-D",
        "restart-strategy=none",
    ]);
    let config = cli.load_config().unwrap();
    assert_eq!(
        config.session.overrides.get("restart-strategy").map(String::as_str),
        Some("none")
    );
    assert!(config.session.common.is_empty());
}
