use serde::{Deserialize, Serialize};

/// Number of track categories in a generated arrangement.
pub const TRACKS: usize = 17;

/// MIDI pitch range per track.
pub const PITCHES: usize = 128;

/// Number of coarse instrument classes in the ground truth.
pub const INSTRUMENT_CLASSES: usize = 5;

/// Length of the rhythmic window used by the drum-pattern test.
pub const BEAT_POSITIONS: usize = 12;

/// Track index holding the drum kit.
pub const DRUM_TRACK: usize = 0;

/// Coarse role a track plays in the arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentClass {
    Drum,
    Bass,
    Melodic,
    Chord,
    Synths,
}

impl InstrumentClass {
    pub const ALL: [InstrumentClass; INSTRUMENT_CLASSES] = [
        Self::Drum,
        Self::Bass,
        Self::Melodic,
        Self::Chord,
        Self::Synths,
    ];

    /// Row of this class in the instrument-class tensor.
    pub fn index(&self) -> usize {
        match self {
            Self::Drum => 0,
            Self::Bass => 1,
            Self::Melodic => 2,
            Self::Chord => 3,
            Self::Synths => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drum => "Drum",
            Self::Bass => "Bass",
            Self::Melodic => "Melodic",
            Self::Chord => "Chord",
            Self::Synths => "Synths",
        }
    }
}

impl std::fmt::Display for InstrumentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name and first GM program number of each track category.
pub const TRACKS_INFO: [(&str, u8); TRACKS] = [
    ("Drums", 0),
    ("Piano", 0),
    ("Chromatic Percussion", 8),
    ("Organ", 16),
    ("Guitar", 24),
    ("Bass", 32),
    ("Strings", 40),
    ("Ensemble", 48),
    ("Brass", 56),
    ("Reed", 64),
    ("Pipe", 72),
    ("Synth Lead", 80),
    ("Synth Pad", 88),
    ("Synth Effects", 96),
    ("Ethnic", 104),
    ("Percussive", 112),
    ("Sound Effects", 120),
];

/// Instrument class each track contributes to.
pub const TRACK_TO_INSTRUMENT: [InstrumentClass; TRACKS] = {
    use InstrumentClass::*;
    [
        Drum,    // Drums
        Melodic, // Piano
        Drum,    // Chromatic Percussion
        Chord,   // Organ
        Melodic, // Guitar
        Bass,    // Bass
        Melodic, // Strings
        Chord,   // Ensemble
        Melodic, // Brass
        Melodic, // Reed
        Melodic, // Pipe
        Melodic, // Synth Lead
        Chord,   // Synth Pad
        Synths,  // Synth Effects
        Melodic, // Ethnic
        Drum,    // Percussive
        Synths,  // Sound Effects
    ]
};

/// Reference drum-hit distribution over the 12 beat positions, measured
/// on the training corpus.
pub const DRUM_DISTRIBUTION: [f64; BEAT_POSITIONS] = [
    0.3739603, 0.00369717, 0.05161105, 0.05632562, 0.02407182, 0.00486619, 0.30184058,
    0.00466669, 0.08540609, 0.06848897, 0.01867757, 0.00638795,
];

/// One track category as listed in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub name: String,
    /// First GM program of the category
    pub program: u8,
    pub class: InstrumentClass,
}

/// All tracks in tensor order.
pub fn track_infos() -> Vec<TrackInfo> {
    TRACKS_INFO
        .iter()
        .zip(TRACK_TO_INSTRUMENT)
        .map(|(&(name, program), class)| TrackInfo {
            name: name.to_string(),
            program,
            class,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_indices_follow_tensor_rows() {
        for (row, class) in InstrumentClass::ALL.iter().enumerate() {
            assert_eq!(class.index(), row);
        }
    }

    #[test]
    fn drum_tracks_map_to_drum_class() {
        assert_eq!(TRACK_TO_INSTRUMENT[DRUM_TRACK], InstrumentClass::Drum);
        assert_eq!(TRACK_TO_INSTRUMENT[15], InstrumentClass::Drum);
        assert_eq!(TRACK_TO_INSTRUMENT[5], InstrumentClass::Bass);
    }

    #[test]
    fn track_infos_pair_names_with_classes() {
        let tracks = track_infos();
        assert_eq!(tracks.len(), TRACKS);
        assert_eq!(
            tracks[12],
            TrackInfo {
                name: "Synth Pad".to_string(),
                program: 88,
                class: InstrumentClass::Chord,
            }
        );
        assert_eq!(tracks[16].program, 120);
    }

    #[test]
    fn every_class_has_a_track() {
        for class in InstrumentClass::ALL {
            assert!(TRACK_TO_INSTRUMENT.contains(&class), "{class} has no track");
        }
    }

    #[test]
    fn reference_distribution_sums_to_one() {
        let total: f64 = DRUM_DISTRIBUTION.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
    }
}
