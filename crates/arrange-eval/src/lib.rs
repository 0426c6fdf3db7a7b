//! Scoring generated multi-track arrangements against ground-truth
//! instrument-class activity.
//!
//! A [`Sample`] wraps one generated piece: its note-activity tensor
//! `(17 tracks, 128 pitches, T)` and the ground-truth instrument-class
//! tensor `(5 classes, T)`. An [`Evaluator`] runs three tests per sample
//! and keeps corpus-wide accumulators:
//!
//! - **IM** (instrument match): per timestep and class, did a track of that
//!   class play when the ground truth says the class is active?
//! - **IR** (instrument response): per timestep, did anything play when
//!   anything was expected?
//! - **DP** (drum pattern): how does the drum onset histogram over 12
//!   beat positions compare with the reference distribution?
//!
//! ```rust
//! use arrange_eval::{Evaluator, InstrumentActivity, NoteActivity, Sample};
//!
//! let inst = InstrumentActivity::from_rows(vec![vec![1.0; 24]; 5]).unwrap();
//! let notes = NoteActivity::silent(24).unwrap();
//! let mut sample = Sample::new(&inst, &notes, Some("demo".into())).unwrap();
//!
//! let mut evaluator = Evaluator::new();
//! let score = evaluator.process(&mut sample).unwrap();
//! assert!(score.dp.is_none());
//! ```

pub mod evaluator;
pub mod report;
pub mod sample;
pub mod scoring;
pub mod tables;
pub mod tensor;

pub use evaluator::{AggregateScore, Evaluator, Observations, SampleContribution, SampleScore};
pub use report::EvaluationReport;
pub use sample::Sample;
pub use scoring::{
    classification_score, distribution_similarity, normalize, ClassificationScore,
    ConfusionCounts, DistributionScore,
};
pub use tables::{InstrumentClass, TrackInfo, DRUM_DISTRIBUTION, TRACK_TO_INSTRUMENT};
pub use tensor::{InstrumentActivity, NoteActivity};

/// Errors from building samples and computing scores.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{tensor} tensor has shape {found}, expected {expected}")]
    Shape {
        tensor: &'static str,
        expected: String,
        found: String,
    },

    #[error(
        "timestep mismatch: instrument-class tensor has {inst_class}, note tensor has {note_activity}"
    )]
    TimestepMismatch {
        inst_class: usize,
        note_activity: usize,
    },

    #[error("sample has no timesteps")]
    EmptySample,

    #[error("sequence length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("cannot score an empty sequence")]
    EmptySequence,

    #[error("invalid distribution: {0}")]
    InvalidDistribution(String),

    #[error("distribution sums to zero")]
    EmptyDistribution,

    #[error("sample {name} has already been scored")]
    AlreadyScored { name: String },
}

pub type Result<T> = std::result::Result<T, Error>;
