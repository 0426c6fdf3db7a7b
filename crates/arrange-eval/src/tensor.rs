//! Dense input tensors handed over by the decoding stage.
//!
//! Both tensors are stored flat in their source orientation (timestep is the
//! innermost axis). [`Sample`](crate::Sample) transposes them once.

use crate::tables::{INSTRUMENT_CLASSES, PITCHES, TRACKS};
use crate::{Error, Result};

/// `rows * timesteps` values, or a shape error when that overflows.
fn flat_len(tensor: &'static str, rows: usize, timesteps: usize) -> Result<usize> {
    rows.checked_mul(timesteps).ok_or_else(|| Error::Shape {
        tensor,
        expected: format!("at most {} timesteps", usize::MAX / rows),
        found: format!("{timesteps} timesteps"),
    })
}

/// Ground-truth instrument-class activity, shape `(5, T)`.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentActivity {
    timesteps: usize,
    values: Vec<f32>,
}

impl InstrumentActivity {
    /// Build from one row per instrument class.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        if rows.len() != INSTRUMENT_CLASSES {
            return Err(Error::Shape {
                tensor: "instrument-class",
                expected: format!("({INSTRUMENT_CLASSES}, T)"),
                found: format!("({}, ..)", rows.len()),
            });
        }

        let timesteps = rows[0].len();
        let mut values = Vec::with_capacity(INSTRUMENT_CLASSES * timesteps);
        for (class, row) in rows.into_iter().enumerate() {
            if row.len() != timesteps {
                return Err(Error::Shape {
                    tensor: "instrument-class",
                    expected: format!("({INSTRUMENT_CLASSES}, {timesteps})"),
                    found: format!("row {class} with {} timesteps", row.len()),
                });
            }
            values.extend(row);
        }

        Ok(Self { timesteps, values })
    }

    /// Build from a class-major buffer of `5 * timesteps` values.
    pub fn from_flat(values: Vec<f32>, timesteps: usize) -> Result<Self> {
        if values.len() != flat_len("instrument-class", INSTRUMENT_CLASSES, timesteps)? {
            return Err(Error::Shape {
                tensor: "instrument-class",
                expected: format!("({INSTRUMENT_CLASSES}, {timesteps})"),
                found: format!("{} values", values.len()),
            });
        }
        Ok(Self { timesteps, values })
    }

    /// All-zero ground truth.
    pub fn silent(timesteps: usize) -> Result<Self> {
        let len = flat_len("instrument-class", INSTRUMENT_CLASSES, timesteps)?;
        Ok(Self {
            timesteps,
            values: vec![0.0; len],
        })
    }

    pub fn timesteps(&self) -> usize {
        self.timesteps
    }

    /// Panics if `class` or `timestep` is out of range.
    pub fn get(&self, class: usize, timestep: usize) -> f32 {
        assert!(class < INSTRUMENT_CLASSES && timestep < self.timesteps);
        self.values[class * self.timesteps + timestep]
    }

    /// Panics if `class` or `timestep` is out of range.
    pub fn set(&mut self, class: usize, timestep: usize, value: f32) {
        assert!(class < INSTRUMENT_CLASSES && timestep < self.timesteps);
        self.values[class * self.timesteps + timestep] = value;
    }
}

/// Generated note intensities, shape `(17, 128, T)`.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteActivity {
    timesteps: usize,
    values: Vec<f32>,
}

impl NoteActivity {
    /// Build from `[track][pitch][timestep]` nested rows.
    pub fn from_rows(tracks: Vec<Vec<Vec<f32>>>) -> Result<Self> {
        if tracks.len() != TRACKS {
            return Err(Error::Shape {
                tensor: "note",
                expected: format!("({TRACKS}, {PITCHES}, T)"),
                found: format!("({}, ..)", tracks.len()),
            });
        }

        let timesteps = tracks[0].first().map(Vec::len).unwrap_or(0);
        let mut values = Vec::with_capacity(TRACKS * PITCHES * timesteps);
        for (track, pitches) in tracks.into_iter().enumerate() {
            if pitches.len() != PITCHES {
                return Err(Error::Shape {
                    tensor: "note",
                    expected: format!("({TRACKS}, {PITCHES}, {timesteps})"),
                    found: format!("track {track} with {} pitches", pitches.len()),
                });
            }
            for (pitch, row) in pitches.into_iter().enumerate() {
                if row.len() != timesteps {
                    return Err(Error::Shape {
                        tensor: "note",
                        expected: format!("({TRACKS}, {PITCHES}, {timesteps})"),
                        found: format!(
                            "track {track} pitch {pitch} with {} timesteps",
                            row.len()
                        ),
                    });
                }
                values.extend(row);
            }
        }

        Ok(Self { timesteps, values })
    }

    /// Build from a track-major, then pitch-major buffer.
    pub fn from_flat(values: Vec<f32>, timesteps: usize) -> Result<Self> {
        if values.len() != flat_len("note", TRACKS * PITCHES, timesteps)? {
            return Err(Error::Shape {
                tensor: "note",
                expected: format!("({TRACKS}, {PITCHES}, {timesteps})"),
                found: format!("{} values", values.len()),
            });
        }
        Ok(Self { timesteps, values })
    }

    /// No notes at all.
    pub fn silent(timesteps: usize) -> Result<Self> {
        let len = flat_len("note", TRACKS * PITCHES, timesteps)?;
        Ok(Self {
            timesteps,
            values: vec![0.0; len],
        })
    }

    pub fn timesteps(&self) -> usize {
        self.timesteps
    }

    fn offset(&self, track: usize, pitch: usize, timestep: usize) -> usize {
        assert!(track < TRACKS && pitch < PITCHES && timestep < self.timesteps);
        (track * PITCHES + pitch) * self.timesteps + timestep
    }

    /// Panics if any index is out of range.
    pub fn get(&self, track: usize, pitch: usize, timestep: usize) -> f32 {
        self.values[self.offset(track, pitch, timestep)]
    }

    /// Panics if any index is out of range.
    pub fn set(&mut self, track: usize, pitch: usize, timestep: usize, value: f32) {
        let offset = self.offset(track, pitch, timestep);
        self.values[offset] = value;
    }

    /// Intensities of one (track, pitch) row over time.
    pub(crate) fn row(&self, track: usize, pitch: usize) -> &[f32] {
        let start = (track * PITCHES + pitch) * self.timesteps;
        &self.values[start..start + self.timesteps]
    }
}
