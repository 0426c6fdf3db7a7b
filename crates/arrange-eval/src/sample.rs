use crate::evaluator::SampleScore;
use crate::tables::{DRUM_TRACK, INSTRUMENT_CLASSES, PITCHES, TRACKS};
use crate::tensor::{InstrumentActivity, NoteActivity};
use crate::{Error, Result};

/// One generated piece in the timestep-major shape the tests read.
///
/// Built once from the raw tensors; the transpose and the per-track
/// "any pitch sounding" collapse happen here so the tests only do lookups.
#[derive(Debug, Clone)]
pub struct Sample {
    name: Option<String>,
    inst_class: Vec<[bool; INSTRUMENT_CLASSES]>,
    track_active: Vec<[bool; TRACKS]>,
    pub(crate) score: Option<SampleScore>,
}

impl Sample {
    pub fn new(
        inst_class: &InstrumentActivity,
        notes: &NoteActivity,
        name: Option<String>,
    ) -> Result<Self> {
        if inst_class.timesteps() != notes.timesteps() {
            return Err(Error::TimestepMismatch {
                inst_class: inst_class.timesteps(),
                note_activity: notes.timesteps(),
            });
        }
        let timesteps = inst_class.timesteps();
        if timesteps == 0 {
            return Err(Error::EmptySample);
        }

        let mut truth = vec![[false; INSTRUMENT_CLASSES]; timesteps];
        for (t, row) in truth.iter_mut().enumerate() {
            for (class, active) in row.iter_mut().enumerate() {
                *active = inst_class.get(class, t) != 0.0;
            }
        }

        let mut track_active = vec![[false; TRACKS]; timesteps];
        for track in 0..TRACKS {
            for pitch in 0..PITCHES {
                for (t, &value) in notes.row(track, pitch).iter().enumerate() {
                    if value != 0.0 {
                        track_active[t][track] = true;
                    }
                }
            }
        }

        Ok(Self {
            name,
            inst_class: truth,
            track_active,
            score: None,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name for log lines and error messages.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    pub fn timesteps(&self) -> usize {
        self.inst_class.len()
    }

    /// Ground-truth class flags at `timestep`.
    pub fn inst_class_at(&self, timestep: usize) -> &[bool; INSTRUMENT_CLASSES] {
        &self.inst_class[timestep]
    }

    /// Which tracks sound at `timestep`.
    pub fn tracks_at(&self, timestep: usize) -> &[bool; TRACKS] {
        &self.track_active[timestep]
    }

    pub fn drum_track(&self) -> impl Iterator<Item = bool> + '_ {
        self.track_active.iter().map(|tracks| tracks[DRUM_TRACK])
    }

    /// Scores set by [`Evaluator::process`](crate::Evaluator::process).
    pub fn score(&self) -> Option<&SampleScore> {
        self.score.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_pitches_per_track() {
        let mut notes = NoteActivity::silent(4).unwrap();
        notes.set(3, 10, 1, 0.2);
        notes.set(3, 90, 1, 0.9);
        notes.set(0, 36, 3, 1.0);
        let sample = Sample::new(&InstrumentActivity::silent(4).unwrap(), &notes, None).unwrap();

        assert_eq!(sample.timesteps(), 4);
        assert!(sample.tracks_at(1)[3]);
        assert_eq!(sample.tracks_at(1).iter().filter(|a| **a).count(), 1);
        assert!(sample.tracks_at(0).iter().all(|a| !a));
        assert_eq!(sample.drum_track().collect::<Vec<_>>(), vec![false, false, false, true]);
    }

    #[test]
    fn ground_truth_nonzero_is_active() {
        let mut inst = InstrumentActivity::silent(2).unwrap();
        inst.set(1, 0, 0.3);
        inst.set(4, 1, 1.0);
        let sample = Sample::new(&inst, &NoteActivity::silent(2).unwrap(), Some("x".into())).unwrap();

        assert_eq!(sample.inst_class_at(0), &[false, true, false, false, false]);
        assert_eq!(sample.inst_class_at(1), &[false, false, false, false, true]);
        assert_eq!(sample.name(), Some("x"));
        assert!(sample.score().is_none());
    }

    #[test]
    fn negative_intensity_counts_as_active() {
        let mut notes = NoteActivity::silent(1).unwrap();
        notes.set(16, 0, 0, -1.0);
        let sample = Sample::new(&InstrumentActivity::silent(1).unwrap(), &notes, None).unwrap();
        assert!(sample.tracks_at(0)[16]);
    }

    #[test]
    fn rejects_timestep_mismatch() {
        let err = Sample::new(&InstrumentActivity::silent(8).unwrap(), &NoteActivity::silent(9).unwrap(), None)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::TimestepMismatch {
                inst_class: 8,
                note_activity: 9
            }
        ));
    }

    #[test]
    fn rejects_empty_sample() {
        let err = Sample::new(&InstrumentActivity::silent(0).unwrap(), &NoteActivity::silent(0).unwrap(), None)
            .unwrap_err();
        assert!(matches!(err, Error::EmptySample));
    }
}
