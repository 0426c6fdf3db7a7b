//! Configuration loading for arrangement evaluation runs.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/arrange-eval/config.toml` (system)
//! 2. `~/.config/arrange-eval/config.toml` (user)
//! 3. `./arrange-eval.toml` (local override, replaced by an explicit path)
//! 4. Environment variables (`ARRANGE_EVAL_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [paths]
//! report_dir = "~/runs/eval"
//!
//! [telemetry]
//! log_level = "debug"
//!
//! [evaluation]
//! drum_distribution = [0.4, 0.0, 0.05, 0.05, 0.02, 0.0, 0.3, 0.0, 0.08, 0.07, 0.02, 0.01]
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use sections::{EvaluationConfig, PathsConfig, TelemetryConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Number of values in a drum distribution.
pub const DRUM_DISTRIBUTION_LEN: usize = 12;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete evaluation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EvalConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

impl EvalConfig {
    /// Load configuration and report which files and variables contributed.
    ///
    /// `config_path` replaces the local override when it exists.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = EvalConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            let file_config = loader::load_from_file(&path)?;
            config = loader::merge_configs(config, file_config);
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// The configured reference as a fixed-size array, if one was given.
    pub fn drum_distribution(&self) -> Option<[f64; DRUM_DISTRIBUTION_LEN]> {
        self.evaluation
            .drum_distribution
            .as_deref()
            .and_then(|values| values.try_into().ok())
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# Arrangement evaluation configuration\n\n");

        output.push_str("[paths]\n");
        output.push_str(&format!(
            "report_dir = \"{}\"\n",
            self.paths.report_dir.display()
        ));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.telemetry.log_level));

        output.push_str("\n[evaluation]\n");
        match &self.evaluation.drum_distribution {
            Some(values) => {
                let rendered: Vec<String> = values.iter().map(|v| format!("{v:?}")).collect();
                output.push_str(&format!("drum_distribution = [{}]\n", rendered.join(", ")));
            }
            None => output.push_str("# drum_distribution = built-in corpus reference\n"),
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EvalConfig::default();
        assert_eq!(config.paths.report_dir, PathBuf::from("evaluation"));
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.drum_distribution().is_none());
    }

    #[test]
    fn test_to_toml_roundtrips() {
        let mut config = EvalConfig::default();
        config.evaluation.drum_distribution = Some(vec![1.0; DRUM_DISTRIBUTION_LEN]);
        let toml = config.to_toml();
        assert!(toml.contains("[paths]"));
        assert!(toml.contains("[telemetry]"));
        assert!(toml.contains("drum_distribution = [1.0, 1.0"));

        let parsed: EvalConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_to_toml_without_reference() {
        let toml = EvalConfig::default().to_toml();
        assert!(toml.contains("# drum_distribution"));
        let parsed: EvalConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, EvalConfig::default());
    }

    #[test]
    fn test_drum_distribution_wrong_length_is_none() {
        let mut config = EvalConfig::default();
        config.evaluation.drum_distribution = Some(vec![0.5, 0.5]);
        assert!(config.drum_distribution().is_none());
    }

    #[test]
    fn test_load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[telemetry]\nlog_level = \"trace\"\n").unwrap();

        let (config, sources) = EvalConfig::load_with_sources_from(Some(&path)).unwrap();
        assert!(sources.files.contains(&path));
        // RUST_LOG in the test environment may override the file.
        if !sources.env_overrides.iter().any(|v| v.ends_with("LOG_LEVEL") || v == "RUST_LOG") {
            assert_eq!(config.telemetry.log_level, "trace");
        }
    }
}
