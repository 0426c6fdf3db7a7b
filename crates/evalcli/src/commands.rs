//! CLI command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use arrange_eval::{Error as EvalError, Evaluator, SampleScore};
use evalconf::{ConfigSources, EvalConfig};
use tracing::{debug, info, warn};

use crate::input::{collect_inputs, SampleFile};
use crate::output::{write_report, NamedScore};

pub struct ScoreOptions {
    pub inputs: Vec<PathBuf>,
    pub report_dir: Option<PathBuf>,
    pub no_report: bool,
    pub quiet: bool,
    pub json: bool,
}

fn build_evaluator(config: &EvalConfig) -> Result<Evaluator> {
    match config.drum_distribution() {
        Some(reference) => {
            info!(?reference, "using configured drum reference");
            Evaluator::with_reference(reference).context("invalid drum_distribution in config")
        }
        None => Ok(Evaluator::new()),
    }
}

/// Corpus totals; the DP part is absent when no drum hit was ever counted.
fn total_score(evaluator: &Evaluator) -> Result<SampleScore> {
    match evaluator.aggregate_score() {
        Ok(aggregate) => Ok(SampleScore {
            im: aggregate.im,
            ir: aggregate.ir,
            dp: Some(aggregate.dp),
        }),
        Err(EvalError::EmptyDistribution) => {
            warn!("no drum hits in any complete window, DP total skipped");
            Ok(SampleScore {
                im: evaluator.im_observations().score()?,
                ir: evaluator.ir_observations().score()?,
                dp: None,
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Score every sample file and print per-sample and total scores.
pub fn score(config: &EvalConfig, options: ScoreOptions) -> Result<()> {
    let files = collect_inputs(&options.inputs)?;
    info!(files = files.len(), "scoring samples");

    let mut evaluator = build_evaluator(config)?;
    let mut scores = Vec::with_capacity(files.len());

    for path in &files {
        let mut sample = SampleFile::read(path)?
            .into_sample(path)
            .with_context(|| format!("loading sample {}", path.display()))?;
        let score = evaluator
            .process(&mut sample)
            .with_context(|| format!("scoring {}", path.display()))?;

        if !options.quiet && !options.json {
            println!("{}\n", score.labelled(sample.label()));
        }
        scores.push(NamedScore {
            name: sample.label().to_string(),
            score,
        });
    }

    let total = total_score(&evaluator)?;
    if options.json {
        println!("{}", serde_json::to_string_pretty(&total)?);
    } else {
        println!("{}", total.labelled("Total"));
    }

    if !options.no_report {
        let dir = options
            .report_dir
            .unwrap_or_else(|| config.paths.report_dir.clone());
        for path in write_report(&dir, &evaluator.report(), &total, &scores)? {
            debug!(path = %path.display(), "report file written");
        }
    }

    info!(
        samples = evaluator.samples_processed(),
        drum_skipped = evaluator.drum_skipped(),
        "evaluation complete"
    );
    Ok(())
}

/// Print the effective configuration and where it came from.
pub fn show_config(config: &EvalConfig, sources: &ConfigSources) {
    if sources.files.is_empty() {
        println!("# No config files found, using defaults");
    }
    for file in &sources.files {
        println!("# Loaded from: {}", file.display());
    }
    for var in &sources.env_overrides {
        println!("# Overridden by: ${var}");
    }
    println!();
    print!("{}", config.to_toml());
}

/// Load configuration; an explicitly given path must exist.
pub fn load_config(path: Option<&Path>) -> Result<(EvalConfig, ConfigSources)> {
    if let Some(path) = path {
        if !path.exists() {
            anyhow::bail!("config file not found: {}", path.display());
        }
    }
    EvalConfig::load_with_sources_from(path).context("loading configuration")
}
