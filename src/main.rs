//! sql-submit - submit multi-statement SQL scripts as one job.

use sql_submit::cli::{Cli, OutputFormat};
use sql_submit::dispatch::{RunOutcome, ScriptRunner};
use sql_submit::engine::{self, ExecutionResult, RuntimeConfig};
use sql_submit::error::{Result, SubmitError};
use sql_submit::logging;
use sql_submit::script::split_script;
use std::io::Write;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    match &cli.log_file {
        Some(path) => logging::init_file_logging(path, cli.verbose),
        None => logging::init_stderr_logging(cli.verbose),
    }

    let code = match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(category = e.category(), "{e}");
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: &Cli) -> Result<i32> {
    let output = cli.parse_output_format()?;
    let sources = cli.script_sources()?;

    let config = cli.load_config()?;

    let script = sources.read_script().await?;
    let split = split_script(&script);
    if split.is_empty() {
        warn!("Script contains no statements");
    }
    info!(
        statements = split.statements.len(),
        "Execution mode: {}", split.mode
    );

    let runtime = RuntimeConfig::for_mode(split.mode, &config.session);
    let mut engine = engine::connect(&config.engine, runtime).await?;

    let outcome = ScriptRunner::new(engine.as_mut())
        .run(&split.statements, split.mode)
        .await;
    engine.close().await?;

    report(&outcome, output, &mut std::io::stdout().lock())?;
    Ok(outcome.exit_code())
}

/// Writes the outcome to `out`: the summary, the plan, or the failed SQL.
fn report(outcome: &RunOutcome, output: OutputFormat, out: &mut impl Write) -> Result<()> {
    let lines = match outcome {
        RunOutcome::Completed(None) => Vec::new(),
        RunOutcome::Completed(Some(result)) => match output {
            OutputFormat::Text => summary_lines(result),
            OutputFormat::Json => vec![serde_json::to_string_pretty(result)
                .map_err(|e| SubmitError::internal(format!("Failed to encode result: {e}")))?],
        },
        RunOutcome::ExplainRequested { plan, .. } => vec![plan.clone()],
        RunOutcome::Aborted(failure) => {
            error!("------------------ Error SQL ------------------");
            failure.numbered_lines()
        }
    };

    for line in lines {
        writeln!(out, "{line}")
            .map_err(|e| SubmitError::internal(format!("Failed to write output: {e}")))?;
    }
    Ok(())
}

fn summary_lines(result: &ExecutionResult) -> Vec<String> {
    let Some(job) = &result.job else {
        return vec![format!("{} rows affected", result.rows_affected)];
    };
    let mut lines = vec![format!(
        "Job '{}' finished ({}): {} rows written",
        job.name,
        job.mode,
        job.rows_written()
    )];
    lines.extend(
        job.sinks
            .iter()
            .map(|sink| format!("  {}: {} rows", sink.table, sink.rows_affected)),
    );
    lines
}
