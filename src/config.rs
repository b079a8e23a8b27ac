//! Configuration management for sql-submit.
//!
//! Handles loading configuration from TOML files: the engine target, the
//! parser dialect, and the session options applied before a script runs.

use crate::error::{Result, SubmitError};
use crate::script::ExecutionMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Engine target.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Session option defaults.
    #[serde(default)]
    pub session: SessionDefaults,
}

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// sqlx SQLite URL the engine executes against.
    #[serde(default = "default_database")]
    pub database: String,

    /// sqlparser dialect name (e.g. "sqlite", "postgres", "mysql").
    #[serde(default = "default_dialect")]
    pub dialect: String,
}

fn default_database() -> String {
    "sqlite::memory:".to_string()
}

fn default_dialect() -> String {
    crate::operation::DEFAULT_DIALECT.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            dialect: default_dialect(),
        }
    }
}

/// Session options from the config file, by execution mode.
///
/// These sit above the built-in defaults from [`builtin_options`]; `--set`
/// overrides sit above both.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionDefaults {
    /// Applied in both modes.
    #[serde(default)]
    pub common: BTreeMap<String, String>,

    /// Applied only in streaming mode.
    #[serde(default)]
    pub streaming: BTreeMap<String, String>,

    /// Applied only in batch mode.
    #[serde(default)]
    pub batch: BTreeMap<String, String>,

    /// `--set` overrides; never read from the file.
    #[serde(skip)]
    pub overrides: BTreeMap<String, String>,
}

impl SessionDefaults {
    /// The file section for the given mode.
    pub fn for_mode(&self, mode: ExecutionMode) -> &BTreeMap<String, String> {
        match mode {
            ExecutionMode::Streaming => &self.streaming,
            ExecutionMode::Batch => &self.batch,
        }
    }
}

fn options(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Built-in session options for a mode, before any config is applied.
pub fn builtin_options(mode: ExecutionMode) -> BTreeMap<String, String> {
    let mut builtin = options(&[
        ("table.local-time-zone", "+08:00"),
        ("table.dynamic-table-options.enabled", "true"),
        ("restart-strategy", "failure-rate"),
        ("restart-strategy.failure-rate.delay", "10s"),
        ("restart-strategy.failure-rate.failure-rate-interval", "5min"),
        ("restart-strategy.failure-rate.max-failures-per-interval", "3"),
    ]);
    if mode.is_streaming() {
        builtin.extend(options(&[
            ("state.backend.incremental", "true"),
            ("execution.checkpointing.interval", "2min"),
            ("execution.checkpointing.min-pause", "10s"),
            (
                "execution.checkpointing.externalized-checkpoint-retention",
                "RETAIN_ON_CANCELLATION",
            ),
        ]));
    }
    builtin
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sql-submit")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file; a missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| SubmitError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            SubmitError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Records `key=value` overrides, applied above every config layer.
    pub fn apply_overrides(&mut self, overrides: &[String]) -> Result<()> {
        for entry in overrides {
            let (key, value) = entry.split_once('=').ok_or_else(|| {
                SubmitError::config(format!("Invalid --set '{entry}'. Expected KEY=VALUE"))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(SubmitError::config(format!(
                    "Invalid --set '{entry}'. Key must not be empty"
                )));
            }
            self.session
                .overrides
                .insert(key.to_string(), value.trim().to_string());
        }
        Ok(())
    }
}
