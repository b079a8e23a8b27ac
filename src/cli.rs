//! Command-line argument parsing for sql-submit.
//!
//! Uses clap to parse the script sources and engine overrides.

use crate::config::Config;
use crate::error::{Result, SubmitError};
use crate::source::{ScriptSource, ScriptSources};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Output format for the job summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable summary lines.
    #[default]
    Text,
    /// The full execution result as JSON.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// Submit a multi-statement SQL script, batching its inserts into one job.
#[derive(Parser, Debug)]
#[command(name = "sql-submit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQL script (path, file:// or http(s):// URL)
    #[arg(long, value_name = "SOURCE", conflicts_with_all = ["ddl", "dml"])]
    pub sql: Option<String>,

    /// DDL script, run before --dml
    #[arg(long, value_name = "SOURCE", requires = "dml")]
    pub ddl: Option<String>,

    /// DML script, run after --ddl
    #[arg(long, value_name = "SOURCE", requires = "ddl")]
    pub dml: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Engine database URL (overrides config)
    #[arg(long, value_name = "URL", env = "SQL_SUBMIT_DATABASE")]
    pub database: Option<String>,

    /// SQL dialect used to parse statements (overrides config)
    #[arg(long, value_name = "NAME")]
    pub dialect: Option<String>,

    /// Session option applied before the script runs (repeatable)
    #[arg(short = 'D', long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Output format for the job summary
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Write logs to a file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(Config::default_path)
    }

    /// Loads the config file and applies the command-line overrides.
    ///
    /// `--set` entries land above every config layer; `--database` and
    /// `--dialect` replace the file's engine settings.
    pub fn load_config(&self) -> Result<Config> {
        let config_path = self.config_path();
        info!("Loading config from: {}", config_path.display());
        let mut config = Config::load_from_file(&config_path)?;
        config.apply_overrides(&self.set)?;
        if let Some(database) = &self.database {
            config.engine.database = database.clone();
        }
        if let Some(dialect) = &self.dialect {
            config.engine.dialect = dialect.clone();
        }
        Ok(config)
    }

    /// Resolves the script sources from --sql or --ddl/--dml.
    pub fn script_sources(&self) -> Result<ScriptSources> {
        match (&self.sql, &self.ddl, &self.dml) {
            (Some(sql), None, None) => Ok(ScriptSources::Single(ScriptSource::parse(sql)?)),
            (None, Some(ddl), Some(dml)) => Ok(ScriptSources::Split {
                ddl: ScriptSource::parse(ddl)?,
                dml: ScriptSource::parse(dml)?,
            }),
            _ => Err(SubmitError::config(
                "Provide a script with --sql, or both --ddl and --dml",
            )),
        }
    }

    /// Parses the output format from the --output argument.
    pub fn parse_output_format(&self) -> Result<OutputFormat> {
        self.output.parse().map_err(SubmitError::config)
    }
}
