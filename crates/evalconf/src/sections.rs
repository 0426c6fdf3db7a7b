//! Configuration sections.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the evaluation report is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root directory for report files (IMTest/, IRTest/, DPTest/).
    /// Default: ./evaluation
    #[serde(default = "PathsConfig::default_report_dir")]
    pub report_dir: PathBuf,
}

impl PathsConfig {
    fn default_report_dir() -> PathBuf {
        PathBuf::from("evaluation")
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            report_dir: Self::default_report_dir(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter (trace, debug, info, warn, error, or an EnvFilter directive).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

/// Evaluation parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Reference drum distribution over 12 beat positions.
    /// Default: the built-in corpus distribution.
    #[serde(default)]
    pub drum_distribution: Option<Vec<f64>>,
}
