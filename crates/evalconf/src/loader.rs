//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, EvalConfig, EvaluationConfig, PathsConfig, TelemetryConfig};
use crate::DRUM_DISTRIBUTION_LEN;
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
/// Returns paths in load order (system, user, local/cli).
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/arrange-eval/config.toml");
    if system.exists() {
        files.push(system);
    }

    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("arrange-eval/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("arrange-eval.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Load config from a TOML file.
pub fn load_from_file(path: &Path) -> Result<EvalConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_toml(&contents, path)
}

fn parse_toml(contents: &str, path: &Path) -> Result<EvalConfig, ConfigError> {
    let parse_error = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let table: toml::Table = contents
        .parse()
        .map_err(|e: toml::de::Error| parse_error(e.to_string()))?;

    let mut config = EvalConfig::default();

    if let Some(paths) = table.get("paths").and_then(|v| v.as_table()) {
        if let Some(v) = paths.get("report_dir").and_then(|v| v.as_str()) {
            config.paths.report_dir = expand_path(v);
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("log_level").and_then(|v| v.as_str()) {
            config.telemetry.log_level = v.to_string();
        }
    }

    if let Some(evaluation) = table.get("evaluation").and_then(|v| v.as_table()) {
        if let Some(values) = evaluation.get("drum_distribution") {
            let values = values
                .as_array()
                .ok_or_else(|| parse_error("drum_distribution must be an array".to_string()))?;
            let parsed = values
                .iter()
                .map(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
                .collect::<Option<Vec<f64>>>()
                .ok_or_else(|| parse_error("drum_distribution must contain numbers".to_string()))?;
            if parsed.len() != DRUM_DISTRIBUTION_LEN {
                return Err(parse_error(format!(
                    "drum_distribution needs {DRUM_DISTRIBUTION_LEN} values, found {}",
                    parsed.len()
                )));
            }
            config.evaluation.drum_distribution = Some(parsed);
        }
    }

    Ok(config)
}

/// Merge two configs, with non-default values in `overlay` taking precedence.
pub fn merge_configs(base: EvalConfig, overlay: EvalConfig) -> EvalConfig {
    EvalConfig {
        paths: PathsConfig {
            report_dir: if overlay.paths.report_dir != PathsConfig::default().report_dir {
                overlay.paths.report_dir
            } else {
                base.paths.report_dir
            },
        },
        telemetry: TelemetryConfig {
            log_level: if overlay.telemetry.log_level != TelemetryConfig::default().log_level {
                overlay.telemetry.log_level
            } else {
                base.telemetry.log_level
            },
        },
        evaluation: EvaluationConfig {
            drum_distribution: overlay
                .evaluation
                .drum_distribution
                .or(base.evaluation.drum_distribution),
        },
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut EvalConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |key| env::var(key).ok());
}

fn apply_overrides_from(
    config: &mut EvalConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("ARRANGE_EVAL_REPORT_DIR") {
        config.paths.report_dir = expand_path(&v);
        sources.env_overrides.push("ARRANGE_EVAL_REPORT_DIR".to_string());
    }

    if let Some(v) = lookup("ARRANGE_EVAL_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("ARRANGE_EVAL_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }

    if let Some(v) = lookup("ARRANGE_EVAL_DRUM_DISTRIBUTION") {
        let parsed: Result<Vec<f64>, _> = v.split(',').map(|s| s.trim().parse::<f64>()).collect();
        if let Ok(values) = parsed {
            if values.len() == DRUM_DISTRIBUTION_LEN {
                config.evaluation.drum_distribution = Some(values);
                sources
                    .env_overrides
                    .push("ARRANGE_EVAL_DRUM_DISTRIBUTION".to_string());
            }
        }
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // Handle $VAR/rest/of/path
        if let Some(slash_pos) = stripped.find('/') {
            let var_name = &stripped[..slash_pos];
            if let Ok(var_value) = env::var(var_name) {
                PathBuf::from(var_value).join(&stripped[slash_pos + 1..])
            } else {
                PathBuf::from(path)
            }
        } else {
            env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path))
        }
    } else {
        PathBuf::from(path)
    }
}
