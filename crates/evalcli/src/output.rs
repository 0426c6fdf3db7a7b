//! Report files for the plotting collaborator.
//!
//! Layout under the report directory:
//!
//! ```text
//! IMTest/observations.json   instrument-match y_true / y_pred + confusion counts
//! IRTest/observations.json   instrument-response y_true / y_pred + confusion counts
//! DPTest/distribution.json   drum counts, distribution, reference
//! report.json                everything above plus per-sample and total scores
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use arrange_eval::{ConfusionCounts, EvaluationReport, Observations, SampleScore};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct NamedScore {
    pub name: String,
    pub score: SampleScore,
}

#[derive(Serialize)]
struct ObservationFile<'a> {
    confusion: ConfusionCounts,
    #[serde(flatten)]
    observations: &'a Observations,
}

#[derive(Serialize)]
struct DistributionFile<'a> {
    counts: &'a [u64],
    distribution: Option<&'a [f64]>,
    reference: &'a [f64],
}

#[derive(Serialize)]
struct FullReport<'a> {
    total: &'a SampleScore,
    samples: &'a [NamedScore],
    #[serde(flatten)]
    report: &'a EvaluationReport,
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("writing {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("writing {}", path.display()))
}

/// Write all report files, returning the paths written.
pub fn write_report(
    dir: &Path,
    report: &EvaluationReport,
    total: &SampleScore,
    samples: &[NamedScore],
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for (subdir, observations, confusion) in [
        ("IMTest", &report.instrument_match, report.im_confusion()?),
        ("IRTest", &report.instrument_response, report.ir_confusion()?),
    ] {
        let test_dir = dir.join(subdir);
        fs::create_dir_all(&test_dir)
            .with_context(|| format!("creating {}", test_dir.display()))?;
        let path = test_dir.join("observations.json");
        write_json(
            &path,
            &ObservationFile {
                confusion,
                observations,
            },
        )?;
        written.push(path);
    }

    let dp_dir = dir.join("DPTest");
    fs::create_dir_all(&dp_dir).with_context(|| format!("creating {}", dp_dir.display()))?;
    let path = dp_dir.join("distribution.json");
    write_json(
        &path,
        &DistributionFile {
            counts: &report.drum_counts,
            distribution: report.drum_distribution.as_deref(),
            reference: &report.reference_distribution,
        },
    )?;
    written.push(path);

    let path = dir.join("report.json");
    write_json(
        &path,
        &FullReport {
            total,
            samples,
            report,
        },
    )?;
    written.push(path);

    info!(dir = %dir.display(), files = written.len(), "report written");
    Ok(written)
}
