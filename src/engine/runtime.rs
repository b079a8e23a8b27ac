//! Session-scoped runtime options.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::{builtin_options, SessionDefaults};
use crate::script::ExecutionMode;

/// Option holding the script's execution mode.
pub const RUNTIME_MODE_KEY: &str = "execution.runtime-mode";
/// Option naming the combined insert job.
pub const PIPELINE_NAME_KEY: &str = "pipeline.name";
/// Option overriding the parser dialect for later statements.
pub const SQL_DIALECT_KEY: &str = "table.sql-dialect";

/// Mutable key/value store read by the engine at parse and execution time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuntimeConfig {
    options: BTreeMap<String, String>,
}

impl RuntimeConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the starting configuration for a run in the given mode.
    ///
    /// Layers, lowest first: built-in defaults, the file's `common` and mode
    /// sections, then `--set` overrides. The mode key always wins.
    pub fn for_mode(mode: ExecutionMode, session: &SessionDefaults) -> Self {
        let mut config = Self::new();
        config.extend(&builtin_options(mode));
        config.extend(&session.common);
        config.extend(session.for_mode(mode));
        config.extend(&session.overrides);
        config.set(RUNTIME_MODE_KEY, mode.as_str());
        config
    }

    /// Sets an option, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.options.insert(key.into(), value.into());
    }

    /// Returns the value of an option.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Copies every option from the map.
    pub fn extend(&mut self, options: &BTreeMap<String, String>) {
        for (key, value) in options {
            self.set(key.clone(), value.clone());
        }
    }

    /// Returns the mode recorded under `execution.runtime-mode`.
    pub fn mode(&self) -> ExecutionMode {
        match self.get(RUNTIME_MODE_KEY) {
            Some(mode) if mode.eq_ignore_ascii_case("batch") => ExecutionMode::Batch,
            _ => ExecutionMode::Streaming,
        }
    }

    /// Name for a combined insert job: `pipeline.name`, else derived from the sinks.
    pub fn job_name<'a>(&self, targets: impl IntoIterator<Item = &'a str>) -> String {
        match self.get(PIPELINE_NAME_KEY) {
            Some(name) => name.to_string(),
            None => {
                let targets: Vec<&str> = targets.into_iter().collect();
                format!("insert-into_{}", targets.join(","))
            }
        }
    }

    /// Iterates options in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streaming_defaults() {
        let config = RuntimeConfig::for_mode(ExecutionMode::Streaming, &SessionDefaults::default());
        assert_eq!(config.get(RUNTIME_MODE_KEY), Some("streaming"));
        assert_eq!(config.get("execution.checkpointing.interval"), Some("2min"));
        assert_eq!(config.get("restart-strategy"), Some("failure-rate"));
        assert_eq!(config.get("table.local-time-zone"), Some("+08:00"));
    }

    #[test]
    fn test_batch_defaults_skip_checkpointing() {
        let config = RuntimeConfig::for_mode(ExecutionMode::Batch, &SessionDefaults::default());
        assert_eq!(config.get(RUNTIME_MODE_KEY), Some("batch"));
        assert_eq!(config.get("execution.checkpointing.interval"), None);
        assert_eq!(config.get("table.dynamic-table-options.enabled"), Some("true"));
    }

    #[test]
    fn test_set_overwrites() {
        let mut config = RuntimeConfig::new();
        assert!(config.is_empty());
        config.set(PIPELINE_NAME_KEY, "a");
        config.set(PIPELINE_NAME_KEY, "b");
        assert_eq!(config.get(PIPELINE_NAME_KEY), Some("b"));
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn test_mode_reads_runtime_mode_key() {
        let mut config = RuntimeConfig::new();
        assert_eq!(config.mode(), ExecutionMode::Streaming);
        config.set(RUNTIME_MODE_KEY, "BATCH");
        assert_eq!(config.mode(), ExecutionMode::Batch);
    }

    #[test]
    fn test_job_name() {
        let mut config = RuntimeConfig::new();
        assert_eq!(config.job_name(["sink_a", "sink_b"]), "insert-into_sink_a,sink_b");
        config.set(PIPELINE_NAME_KEY, "nightly");
        assert_eq!(config.job_name(["sink_a"]), "nightly");
    }

    #[test]
    fn test_mode_key_wins_over_defaults() {
        let mut defaults = SessionDefaults::default();
        defaults
            .common
            .insert(RUNTIME_MODE_KEY.to_string(), "streaming".to_string());
        let config = RuntimeConfig::for_mode(ExecutionMode::Batch, &defaults);
        assert_eq!(config.get(RUNTIME_MODE_KEY), Some("batch"));
    }

    #[test]
    fn test_file_common_beats_builtin_mode_defaults() {
        let mut session = SessionDefaults::default();
        session.common.insert(
            "execution.checkpointing.interval".to_string(),
            "5min".to_string(),
        );
        let config = RuntimeConfig::for_mode(ExecutionMode::Streaming, &session);
        assert_eq!(config.get("execution.checkpointing.interval"), Some("5min"));
        assert_eq!(config.get("execution.checkpointing.min-pause"), Some("10s"));
    }

    #[test]
    fn test_file_mode_section_beats_file_common() {
        let mut session = SessionDefaults::default();
        session
            .common
            .insert("table.local-time-zone".to_string(), "UTC".to_string());
        session
            .batch
            .insert("table.local-time-zone".to_string(), "+01:00".to_string());
        let batch = RuntimeConfig::for_mode(ExecutionMode::Batch, &session);
        assert_eq!(batch.get("table.local-time-zone"), Some("+01:00"));
        let streaming = RuntimeConfig::for_mode(ExecutionMode::Streaming, &session);
        assert_eq!(streaming.get("table.local-time-zone"), Some("UTC"));
    }

    #[test]
    fn test_cli_overrides_beat_every_config_layer() {
        let mut config = crate::config::Config::default();
        config.session.streaming.insert(
            "execution.checkpointing.interval".to_string(),
            "1min".to_string(),
        );
        config
            .apply_overrides(&[
                "execution.checkpointing.interval=30s".to_string(),
                "restart-strategy=none".to_string(),
            ])
            .unwrap();

        let runtime = RuntimeConfig::for_mode(ExecutionMode::Streaming, &config.session);
        assert_eq!(runtime.get("execution.checkpointing.interval"), Some("30s"));
        assert_eq!(runtime.get("restart-strategy"), Some("none"));
    }
}
