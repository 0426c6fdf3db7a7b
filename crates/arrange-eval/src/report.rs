//! Plain-data snapshot of an evaluation run and text rendering of scores.
//!
//! The snapshot carries what chart rendering needs (confusion matrices and
//! curves from the IM/IR sequences, a bar chart from the drum distribution)
//! without doing any rendering itself.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::evaluator::{AggregateScore, Evaluator, Observations, SampleScore};
use crate::scoring::{ClassificationScore, ConfusionCounts, DistributionScore};
use crate::tables::{track_infos, InstrumentClass, TrackInfo, BEAT_POSITIONS};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Class order of each timestep's IM observations
    pub classes: Vec<InstrumentClass>,
    pub tracks: Vec<TrackInfo>,
    pub samples_processed: usize,
    pub drum_skipped: usize,
    pub instrument_match: Observations,
    pub instrument_response: Observations,
    pub drum_counts: [u64; BEAT_POSITIONS],
    /// `None` until at least one drum hit has been counted
    pub drum_distribution: Option<Vec<f64>>,
    pub reference_distribution: [f64; BEAT_POSITIONS],
}

impl EvaluationReport {
    pub fn from_evaluator(evaluator: &Evaluator) -> Self {
        Self {
            classes: InstrumentClass::ALL.to_vec(),
            tracks: track_infos(),
            samples_processed: evaluator.samples_processed(),
            drum_skipped: evaluator.drum_skipped(),
            instrument_match: evaluator.im_observations().clone(),
            instrument_response: evaluator.ir_observations().clone(),
            drum_counts: *evaluator.drum_counts(),
            drum_distribution: evaluator.drum_distribution(),
            reference_distribution: *evaluator.reference(),
        }
    }

    /// Fails with [`Error::LengthMismatch`](crate::Error::LengthMismatch)
    /// for a deserialized report whose sequences are not paired.
    pub fn im_confusion(&self) -> Result<ConfusionCounts> {
        confusion(&self.instrument_match)
    }

    pub fn ir_confusion(&self) -> Result<ConfusionCounts> {
        confusion(&self.instrument_response)
    }
}

fn confusion(observations: &Observations) -> Result<ConfusionCounts> {
    ConfusionCounts::from_observations(observations.y_true(), observations.y_pred())
}

impl fmt::Display for ClassificationScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Accuracy: {}, Precision: {}, Recall: {}, F1 Score: {}",
            self.accuracy, self.precision, self.recall, self.f1
        )
    }
}

impl fmt::Display for DistributionScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Jensen-Shannon Divergence: {}, Earth Mover's Distance: {}, Cosine Similarity: {}",
            self.divergence, self.earth_mover, self.cosine
        )
    }
}

/// Scores labelled with the sample (or corpus) they belong to.
pub struct Labelled<'a, T> {
    label: &'a str,
    score: &'a T,
}

impl SampleScore {
    pub fn labelled<'a>(&'a self, label: &'a str) -> Labelled<'a, SampleScore> {
        Labelled { label, score: self }
    }
}

impl AggregateScore {
    pub fn labelled<'a>(&'a self, label: &'a str) -> Labelled<'a, AggregateScore> {
        Labelled { label, score: self }
    }
}

fn write_blocks(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    im: &ClassificationScore,
    ir: &ClassificationScore,
    dp: Option<&DistributionScore>,
) -> fmt::Result {
    writeln!(f, "[{label} IM Test Score]")?;
    writeln!(f, "{im}")?;
    writeln!(f)?;
    writeln!(f, "[{label} IR Test Score]")?;
    writeln!(f, "{ir}")?;
    writeln!(f)?;
    writeln!(f, "[{label} DP Test Score]")?;
    match dp {
        Some(dp) => write!(f, "{dp}"),
        None => write!(f, "skipped (no drum hits in a complete window)"),
    }
}

impl fmt::Display for Labelled<'_, SampleScore> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_blocks(f, self.label, &self.score.im, &self.score.ir, self.score.dp.as_ref())
    }
}

impl fmt::Display for Labelled<'_, AggregateScore> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_blocks(f, self.label, &self.score.im, &self.score.ir, Some(&self.score.dp))
    }
}
