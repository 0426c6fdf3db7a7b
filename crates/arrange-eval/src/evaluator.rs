//! Per-sample tests and corpus-wide accumulation.
//!
//! Each processed sample runs the instrument-match (IM), instrument-response
//! (IR) and drum-pattern (DP) tests in that order. The observations they
//! produce are collected into a [`SampleContribution`] first and merged into
//! the accumulators as a unit, so a failing sample never leaves a partial
//! update behind. Merging only happens through [`Evaluator::process`] and
//! [`Evaluator::process_all`], which also record the score on the sample.
//!
//! The aggregate score is a recomputation over everything accumulated, not
//! an average of per-sample scores.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::report::EvaluationReport;
use crate::sample::Sample;
use crate::scoring::{
    classification_score, distribution_similarity, normalize, ClassificationScore,
    DistributionScore,
};
use crate::tables::{BEAT_POSITIONS, DRUM_DISTRIBUTION, INSTRUMENT_CLASSES, TRACK_TO_INSTRUMENT};
use crate::{Error, Result};

/// Parallel ground-truth / prediction sequences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observations {
    y_true: Vec<bool>,
    y_pred: Vec<bool>,
}

impl Observations {
    pub fn y_true(&self) -> &[bool] {
        &self.y_true
    }

    pub fn y_pred(&self) -> &[bool] {
        &self.y_pred
    }

    pub fn push(&mut self, truth: bool, pred: bool) {
        self.y_true.push(truth);
        self.y_pred.push(pred);
    }

    pub fn extend(&mut self, other: &Observations) {
        self.y_true.extend_from_slice(&other.y_true);
        self.y_pred.extend_from_slice(&other.y_pred);
    }

    pub fn len(&self) -> usize {
        self.y_true.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y_true.is_empty()
    }

    pub fn score(&self) -> Result<ClassificationScore> {
        classification_score(&self.y_true, &self.y_pred)
    }
}

/// Scores of one sample. `dp` is `None` when the drum track gave nothing
/// to compare.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleScore {
    pub im: ClassificationScore,
    pub ir: ClassificationScore,
    pub dp: Option<DistributionScore>,
}

/// Corpus-level scores over every sample processed so far.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateScore {
    pub im: ClassificationScore,
    pub ir: ClassificationScore,
    pub dp: DistributionScore,
}

/// Everything one sample adds to the accumulators, plus its own scores.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleContribution {
    im: Observations,
    ir: Observations,
    drum_counts: Option<[u64; BEAT_POSITIONS]>,
    score: SampleScore,
}

impl SampleContribution {
    pub fn im(&self) -> &Observations {
        &self.im
    }

    pub fn ir(&self) -> &Observations {
        &self.ir
    }

    /// `None` when the DP test was skipped
    pub fn drum_counts(&self) -> Option<&[u64; BEAT_POSITIONS]> {
        self.drum_counts.as_ref()
    }

    pub fn score(&self) -> &SampleScore {
        &self.score
    }
}

/// Instrument-match observations: one per (timestep, class).
pub fn instrument_match(sample: &Sample) -> Observations {
    let mut observations = Observations::default();
    for t in 0..sample.timesteps() {
        let mut predicted = [false; INSTRUMENT_CLASSES];
        for (track, &active) in sample.tracks_at(t).iter().enumerate() {
            predicted[TRACK_TO_INSTRUMENT[track].index()] |= active;
        }
        for (&truth, pred) in sample.inst_class_at(t).iter().zip(predicted) {
            observations.push(truth, pred);
        }
    }
    observations
}

/// Instrument-response observations: one per timestep.
pub fn instrument_response(sample: &Sample) -> Observations {
    let mut observations = Observations::default();
    for t in 0..sample.timesteps() {
        let expected = sample.inst_class_at(t).iter().any(|a| *a);
        let responded = sample.tracks_at(t).iter().any(|a| *a);
        observations.push(expected, responded);
    }
    observations
}

/// Drum hits per beat position over whole 12-step windows.
///
/// Returns `None` when the drum track never sounds. A trailing partial
/// window is ignored.
pub fn drum_pattern_counts(sample: &Sample) -> Option<[u64; BEAT_POSITIONS]> {
    let drums: Vec<bool> = sample.drum_track().collect();
    if !drums.iter().any(|hit| *hit) {
        return None;
    }

    let mut counts = [0u64; BEAT_POSITIONS];
    for window in drums.chunks_exact(BEAT_POSITIONS) {
        for (position, &hit) in window.iter().enumerate() {
            if hit {
                counts[position] += 1;
            }
        }
    }
    Some(counts)
}

fn counts_as_f64(counts: &[u64; BEAT_POSITIONS]) -> [f64; BEAT_POSITIONS] {
    counts.map(|c| c as f64)
}

/// Runs the three tests and owns the corpus-wide accumulators.
#[derive(Debug, Clone)]
pub struct Evaluator {
    reference: [f64; BEAT_POSITIONS],
    im: Observations,
    ir: Observations,
    drum_counts: [u64; BEAT_POSITIONS],
    samples_processed: usize,
    drum_skipped: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    /// Evaluator comparing drum patterns against [`DRUM_DISTRIBUTION`].
    pub fn new() -> Self {
        Self {
            reference: DRUM_DISTRIBUTION,
            im: Observations::default(),
            ir: Observations::default(),
            drum_counts: [0; BEAT_POSITIONS],
            samples_processed: 0,
            drum_skipped: 0,
        }
    }

    /// Evaluator with a different reference drum distribution.
    ///
    /// The reference must be finite, non-negative and have a positive sum.
    pub fn with_reference(reference: [f64; BEAT_POSITIONS]) -> Result<Self> {
        normalize(&reference)?;
        Ok(Self {
            reference,
            ..Self::new()
        })
    }

    /// Score one sample, fold it into the accumulators and record the score
    /// on the sample.
    ///
    /// A sample can only be processed once; a second call fails with
    /// [`Error::AlreadyScored`] and leaves the accumulators alone.
    pub fn process(&mut self, sample: &mut Sample) -> Result<SampleScore> {
        if sample.score.is_some() {
            return Err(Error::AlreadyScored {
                name: sample.label().to_string(),
            });
        }

        let contribution = self.evaluate(sample)?;
        Ok(self.commit(sample, contribution))
    }

    /// Process a batch of samples as one unit.
    ///
    /// Every sample is evaluated before anything is merged, so a failure
    /// leaves the accumulators and all sample scores untouched. Scores come
    /// back in slice order.
    pub fn process_all(&mut self, samples: &mut [Sample]) -> Result<Vec<SampleScore>> {
        if let Some(scored) = samples.iter().find(|s| s.score.is_some()) {
            return Err(Error::AlreadyScored {
                name: scored.label().to_string(),
            });
        }

        let contributions = samples
            .iter()
            .map(|sample| self.evaluate(sample))
            .collect::<Result<Vec<_>>>()?;

        Ok(samples
            .iter_mut()
            .zip(contributions)
            .map(|(sample, contribution)| self.commit(sample, contribution))
            .collect())
    }

    /// Run IM, IR and DP on a sample without touching the accumulators or
    /// the sample's score.
    pub fn evaluate(&self, sample: &Sample) -> Result<SampleContribution> {
        let im = instrument_match(sample);
        let im_score = im.score()?;
        debug!(sample = sample.label(), observations = im.len(), "IM test");

        let ir = instrument_response(sample);
        let ir_score = ir.score()?;
        debug!(sample = sample.label(), observations = ir.len(), "IR test");

        let (drum_counts, dp_score) = match drum_pattern_counts(sample) {
            Some(counts) if counts.iter().any(|c| *c > 0) => {
                let score = distribution_similarity(&self.reference, &counts_as_f64(&counts))?;
                debug!(sample = sample.label(), ?counts, "DP test");
                (Some(counts), Some(score))
            }
            Some(_) => {
                warn!(
                    sample = sample.label(),
                    "DP test skipped, drum hits only in trailing partial window"
                );
                (None, None)
            }
            None => {
                warn!(sample = sample.label(), "DP test skipped, drum track silent");
                (None, None)
            }
        };

        Ok(SampleContribution {
            im,
            ir,
            drum_counts,
            score: SampleScore {
                im: im_score,
                ir: ir_score,
                dp: dp_score,
            },
        })
    }

    /// Merge a contribution and record its score on the sample it came from.
    fn commit(&mut self, sample: &mut Sample, contribution: SampleContribution) -> SampleScore {
        let score = contribution.score;
        self.merge(contribution);
        sample.score = Some(score);

        info!(
            sample = sample.label(),
            timesteps = sample.timesteps(),
            im_f1 = score.im.f1,
            ir_f1 = score.ir.f1,
            dp_divergence = score.dp.map(|dp| dp.divergence),
            "sample evaluated"
        );
        score
    }

    fn merge(&mut self, contribution: SampleContribution) {
        self.im.extend(&contribution.im);
        self.ir.extend(&contribution.ir);
        match contribution.drum_counts {
            Some(counts) => {
                for (total, count) in self.drum_counts.iter_mut().zip(counts) {
                    *total += count;
                }
            }
            None => self.drum_skipped += 1,
        }
        self.samples_processed += 1;
    }

    /// Recompute IM, IR and DP over the whole corpus processed so far.
    ///
    /// Fails with [`Error::EmptySequence`] before any sample is processed
    /// and with [`Error::EmptyDistribution`] when no drum hit was counted.
    pub fn aggregate_score(&self) -> Result<AggregateScore> {
        let im = self.im.score()?;
        let ir = self.ir.score()?;
        let distribution = normalize(&counts_as_f64(&self.drum_counts))?;
        let dp = distribution_similarity(&self.reference, &distribution)?;
        Ok(AggregateScore { im, ir, dp })
    }

    pub fn im_observations(&self) -> &Observations {
        &self.im
    }

    pub fn ir_observations(&self) -> &Observations {
        &self.ir
    }

    pub fn drum_counts(&self) -> &[u64; BEAT_POSITIONS] {
        &self.drum_counts
    }

    /// Accumulated drum counts as a distribution, `None` while empty.
    pub fn drum_distribution(&self) -> Option<Vec<f64>> {
        normalize(&counts_as_f64(&self.drum_counts)).ok()
    }

    pub fn reference(&self) -> &[f64; BEAT_POSITIONS] {
        &self.reference
    }

    pub fn samples_processed(&self) -> usize {
        self.samples_processed
    }

    /// Samples whose DP test produced no result.
    pub fn drum_skipped(&self) -> usize {
        self.drum_skipped
    }

    /// Snapshot of the accumulators for the plotting collaborator.
    pub fn report(&self) -> EvaluationReport {
        EvaluationReport::from_evaluator(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{DRUM_TRACK, TRACKS};
    use crate::tensor::{InstrumentActivity, NoteActivity};
    use pretty_assertions::assert_eq;

    fn sample_from(inst: &InstrumentActivity, notes: &NoteActivity, name: &str) -> Sample {
        Sample::new(inst, notes, Some(name.to_string())).unwrap()
    }

    /// Drum hits at the given timesteps, everything else silent.
    fn drum_sample(timesteps: usize, hits: &[usize]) -> Sample {
        let mut notes = NoteActivity::silent(timesteps).unwrap();
        let mut inst = InstrumentActivity::silent(timesteps).unwrap();
        for &t in hits {
            notes.set(DRUM_TRACK, 36, t, 1.0);
            inst.set(0, t, 1.0);
        }
        sample_from(&inst, &notes, "drums")
    }

    /// A pseudo-random arrangement so aggregate tests see mixed results.
    fn mixed_sample(timesteps: usize, seed: usize) -> Sample {
        let mut notes = NoteActivity::silent(timesteps).unwrap();
        let mut inst = InstrumentActivity::silent(timesteps).unwrap();
        for t in 0..timesteps {
            for track in 0..TRACKS {
                if (t * 7 + track * 3 + seed) % 5 == 0 {
                    notes.set(track, 40 + track, t, 0.8);
                }
            }
            for class in 0..INSTRUMENT_CLASSES {
                if (t + class * 2 + seed) % 3 == 0 {
                    inst.set(class, t, 1.0);
                }
            }
        }
        sample_from(&inst, &notes, &format!("mixed-{seed}"))
    }

    #[test]
    fn im_perfect_when_every_class_expected_and_played() {
        let timesteps = 16;
        let mut notes = NoteActivity::silent(timesteps).unwrap();
        for t in 0..timesteps {
            for track in 0..TRACKS {
                notes.set(track, 60, t, 1.0);
            }
        }
        let inst = InstrumentActivity::from_rows(vec![vec![1.0; timesteps]; 5]).unwrap();
        let mut sample = sample_from(&inst, &notes, "full");

        let score = Evaluator::new().process(&mut sample).unwrap();
        assert_eq!(
            score.im,
            ClassificationScore {
                accuracy: 1.0,
                precision: 1.0,
                recall: 1.0,
                f1: 1.0
            }
        );
    }

    #[test]
    fn im_maps_tracks_onto_classes() {
        // Only a Synth Pad (Chord) and Bass play at t=0.
        let mut notes = NoteActivity::silent(1).unwrap();
        notes.set(12, 50, 0, 1.0);
        notes.set(5, 30, 0, 1.0);
        let mut inst = InstrumentActivity::silent(1).unwrap();
        inst.set(3, 0, 1.0);
        inst.set(2, 0, 1.0);
        let observations = instrument_match(&sample_from(&inst, &notes, "pad"));

        assert_eq!(observations.y_true, vec![false, false, true, true, false]);
        assert_eq!(observations.y_pred, vec![false, true, false, true, false]);
    }

    #[test]
    fn ir_silent_sample_is_perfect() {
        let mut sample = sample_from(
            &InstrumentActivity::silent(20).unwrap(),
            &NoteActivity::silent(20).unwrap(),
            "silence",
        );
        let score = Evaluator::new().process(&mut sample).unwrap();
        assert_eq!(score.ir.precision, 1.0);
        assert_eq!(score.ir.recall, 1.0);
        assert_eq!(score.ir.accuracy, 1.0);
    }

    #[test]
    fn ir_one_observation_per_timestep() {
        let mut notes = NoteActivity::silent(3).unwrap();
        notes.set(7, 64, 2, 1.0);
        let mut inst = InstrumentActivity::silent(3).unwrap();
        inst.set(1, 1, 1.0);
        let observations = instrument_response(&sample_from(&inst, &notes, "ir"));
        assert_eq!(observations.y_true, vec![false, true, false]);
        assert_eq!(observations.y_pred, vec![false, false, true]);
    }

    #[test]
    fn dp_two_windows_on_the_downbeat() {
        let sample = drum_sample(24, &[0, 12]);
        let counts = drum_pattern_counts(&sample).unwrap();
        assert_eq!(counts, [2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

        let distribution = normalize(&counts_as_f64(&counts)).unwrap();
        assert_eq!(distribution[0], 1.0);
        assert!(distribution[1..].iter().all(|p| *p == 0.0));
    }

    #[test]
    fn dp_silent_drums_leave_accumulator_alone() {
        let mut evaluator = Evaluator::new();
        let mut first = drum_sample(24, &[0, 6, 12, 18]);
        evaluator.process(&mut first).unwrap();
        let before = *evaluator.drum_counts();

        let mut silent = drum_sample(24, &[]);
        let score = evaluator.process(&mut silent).unwrap();

        assert!(score.dp.is_none());
        assert_eq!(*evaluator.drum_counts(), before);
        assert_eq!(evaluator.drum_skipped(), 1);
        assert_eq!(evaluator.samples_processed(), 2);
    }

    #[test]
    fn dp_trailing_remainder_is_ignored() {
        let base = drum_sample(24, &[0, 3, 12, 15]);
        for extra in 1..12 {
            let trailing: Vec<usize> = (24..24 + extra).collect();
            let mut hits = vec![0, 3, 12, 15];
            hits.extend(&trailing);
            let extended = drum_sample(24 + extra, &hits);
            assert_eq!(drum_pattern_counts(&base), drum_pattern_counts(&extended));

            let evaluator = Evaluator::new();
            assert_eq!(
                evaluator.evaluate(&base).unwrap().drum_counts,
                evaluator.evaluate(&extended).unwrap().drum_counts
            );
        }
    }

    #[test]
    fn dp_hits_only_in_remainder_give_no_result() {
        let mut evaluator = Evaluator::new();
        let mut sample = drum_sample(15, &[13]);
        let score = evaluator.process(&mut sample).unwrap();
        assert!(score.dp.is_none());
        assert_eq!(*evaluator.drum_counts(), [0; BEAT_POSITIONS]);
    }

    #[test]
    fn dp_matches_reference_shape() {
        // Mirror the reference: heavy on positions 0 and 6.
        let evaluator = Evaluator::new();
        let good = drum_sample(48, &[0, 6, 12, 18, 24, 30, 36, 42]);
        let bad = drum_sample(48, &[1, 7, 13, 19, 25, 31, 37, 43]);
        let good_dp = evaluator.evaluate(&good).unwrap().score.dp.unwrap();
        let bad_dp = evaluator.evaluate(&bad).unwrap().score.dp.unwrap();
        assert!(good_dp.divergence < bad_dp.divergence);
        assert!(good_dp.cosine > bad_dp.cosine);
    }

    #[test]
    fn process_twice_is_rejected() {
        let mut evaluator = Evaluator::new();
        let mut sample = mixed_sample(24, 1);
        let first = evaluator.process(&mut sample).unwrap();
        let im_len = evaluator.im_observations().len();

        let err = evaluator.process(&mut sample).unwrap_err();
        assert!(matches!(err, Error::AlreadyScored { ref name } if name == "mixed-1"));
        assert_eq!(evaluator.im_observations().len(), im_len);
        assert_eq!(evaluator.samples_processed(), 1);
        assert_eq!(sample.score(), Some(&first));
    }

    #[test]
    fn aggregate_is_corpus_level_recomputation() {
        let mut evaluator = Evaluator::new();
        let mut samples: Vec<Sample> = (0..4).map(|seed| mixed_sample(30 + seed * 5, seed)).collect();

        let mut im = Observations::default();
        let mut ir = Observations::default();
        let mut counts = [0u64; BEAT_POSITIONS];
        for sample in &mut samples {
            im.extend(&instrument_match(sample));
            ir.extend(&instrument_response(sample));
            if let Some(c) = drum_pattern_counts(sample) {
                for (total, n) in counts.iter_mut().zip(c) {
                    *total += n;
                }
            }
            evaluator.process(sample).unwrap();
        }

        let aggregate = evaluator.aggregate_score().unwrap();
        assert_eq!(aggregate.im, classification_score(&im.y_true, &im.y_pred).unwrap());
        assert_eq!(aggregate.ir, classification_score(&ir.y_true, &ir.y_pred).unwrap());
        assert_eq!(*evaluator.drum_counts(), counts);

        let expected_dp = distribution_similarity(
            &DRUM_DISTRIBUTION,
            &normalize(&counts_as_f64(&counts)).unwrap(),
        )
        .unwrap();
        assert_eq!(aggregate.dp, expected_dp);
    }

    #[test]
    fn aggregate_is_not_an_average() {
        let mut evaluator = Evaluator::new();
        // Short perfect sample, long bad sample.
        let mut perfect = drum_sample(12, &[0]);
        let mut noisy = {
            let mut notes = NoteActivity::silent(60).unwrap();
            for t in 0..60 {
                notes.set(1, 60, t, 1.0);
            }
            sample_from(&InstrumentActivity::silent(60).unwrap(), &notes, "noisy")
        };
        let a = evaluator.process(&mut perfect).unwrap();
        let b = evaluator.process(&mut noisy).unwrap();

        let aggregate = evaluator.aggregate_score().unwrap();
        let mean = (a.ir.accuracy + b.ir.accuracy) / 2.0;
        assert!((aggregate.ir.accuracy - mean).abs() > 0.1);
        assert!((aggregate.ir.accuracy - 12.0 / 72.0).abs() < 1e-9);
    }

    #[test]
    fn aggregate_before_any_sample_fails() {
        let evaluator = Evaluator::new();
        assert!(matches!(evaluator.aggregate_score(), Err(Error::EmptySequence)));
        assert!(evaluator.drum_distribution().is_none());
    }

    #[test]
    fn aggregate_without_drum_hits_fails() {
        let mut evaluator = Evaluator::new();
        let mut silent = drum_sample(24, &[]);
        evaluator.process(&mut silent).unwrap();
        assert!(matches!(
            evaluator.aggregate_score(),
            Err(Error::EmptyDistribution)
        ));
    }

    #[test]
    fn custom_reference_is_validated() {
        assert!(Evaluator::with_reference([0.0; BEAT_POSITIONS]).is_err());

        let mut reference = [0.0; BEAT_POSITIONS];
        reference[0] = 1.0;
        let mut evaluator = Evaluator::with_reference(reference).unwrap();
        let mut sample = drum_sample(24, &[0, 12]);
        let dp = evaluator.process(&mut sample).unwrap().dp.unwrap();
        assert!(dp.divergence.abs() < 1e-9);
        assert!((dp.cosine - 1.0).abs() < 1e-9);
    }

    #[test]
    fn process_all_matches_sequential_processing() {
        let samples: Vec<Sample> = (0..3).map(|seed| mixed_sample(36, seed)).collect();

        let mut sequential = Evaluator::new();
        let mut expected = Vec::new();
        for sample in &samples {
            let mut sample = sample.clone();
            expected.push(sequential.process(&mut sample).unwrap());
        }

        let mut batch = Evaluator::new();
        let mut batch_samples = samples.clone();
        let scores = batch.process_all(&mut batch_samples).unwrap();

        assert_eq!(scores, expected);
        assert_eq!(batch.im_observations(), sequential.im_observations());
        assert_eq!(batch.ir_observations(), sequential.ir_observations());
        assert_eq!(batch.drum_counts(), sequential.drum_counts());
        assert_eq!(batch.samples_processed(), 3);
        assert!(batch_samples.iter().all(|s| s.score().is_some()));
    }

    #[test]
    fn process_all_rejects_a_scored_sample_before_merging() {
        let mut evaluator = Evaluator::new();
        let mut samples = vec![mixed_sample(24, 0), mixed_sample(24, 1)];
        evaluator.process(&mut samples[1]).unwrap();
        let im_len = evaluator.im_observations().len();

        let err = evaluator.process_all(&mut samples).unwrap_err();
        assert!(matches!(err, Error::AlreadyScored { ref name } if name == "mixed-1"));
        assert_eq!(evaluator.samples_processed(), 1);
        assert_eq!(evaluator.im_observations().len(), im_len);
        assert!(samples[0].score().is_none());
    }

    #[test]
    fn evaluate_does_not_count_the_sample() {
        let mut evaluator = Evaluator::new();
        let mut sample = drum_sample(24, &[0, 12]);

        let preview = evaluator.evaluate(&sample).unwrap();
        let again = evaluator.evaluate(&sample).unwrap();
        assert_eq!(preview, again);
        assert_eq!(preview.drum_counts(), Some(&[2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        assert_eq!(preview.im().len(), 24 * INSTRUMENT_CLASSES);
        assert_eq!(preview.ir().len(), 24);
        assert_eq!(evaluator.samples_processed(), 0);
        assert!(evaluator.im_observations().is_empty());
        assert!(sample.score().is_none());

        let score = evaluator.process(&mut sample).unwrap();
        assert_eq!(&score, preview.score());
        assert!(evaluator.process(&mut sample).is_err());
        assert_eq!(evaluator.samples_processed(), 1);
        assert_eq!(evaluator.drum_counts()[0], 2);
        assert_eq!(evaluator.ir_observations().len(), 24);
    }
}
