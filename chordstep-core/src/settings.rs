use serde::{Deserialize, Serialize};

use chordstep_types::{ChordSpec, FingeringKey, Hand, InversionKind, TrainerError, TrainerResult, TraversalMode};

use crate::generator::MAX_OCTAVE_RANGE;

/// Caller-enforced bounds. Values outside them are rejected, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub min_tempo: u16,
    pub max_tempo: u16,
    pub max_octave_range: u8,
    pub max_subdivisions: u8,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min_tempo: 20,
            max_tempo: 240,
            max_octave_range: MAX_OCTAVE_RANGE,
            max_subdivisions: 8,
        }
    }
}

impl Limits {
    pub fn check_tempo(&self, bpm: u16) -> TrainerResult<()> {
        if bpm == 0 || bpm < self.min_tempo || bpm > self.max_tempo {
            return Err(TrainerError::invalid(format!(
                "tempo {} outside {}..={}",
                bpm, self.min_tempo, self.max_tempo
            )));
        }
        Ok(())
    }

    pub fn check_subdivisions(&self, subdivisions: u8) -> TrainerResult<()> {
        if subdivisions > self.max_subdivisions {
            return Err(TrainerError::invalid(format!(
                "subdivisions {} exceeds maximum of {}",
                subdivisions, self.max_subdivisions
            )));
        }
        Ok(())
    }

    pub fn check_octave_range(&self, octave_range: u8) -> TrainerResult<()> {
        let max = self.max_octave_range.min(MAX_OCTAVE_RANGE);
        if octave_range < 1 || octave_range > max {
            return Err(TrainerError::invalid(format!(
                "octave range {} outside 1..={}",
                octave_range, max
            )));
        }
        Ok(())
    }
}

/// Complete trainer configuration, passed explicitly into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerSettings {
    pub chord: ChordSpec,
    pub octave_range: u8,
    pub hand: Hand,
    pub mode: TraversalMode,
    pub tempo_bpm: u16,
    /// 0 means chord changes only, no metronome sub-ticks.
    pub subdivisions: u8,
    pub show_fingering: bool,
}

impl Default for TrainerSettings {
    fn default() -> Self {
        Self {
            chord: ChordSpec::default(),
            octave_range: 1,
            hand: Hand::Right,
            mode: TraversalMode::Forward,
            tempo_bpm: 60,
            subdivisions: 4,
            show_fingering: true,
        }
    }
}

impl TrainerSettings {
    pub fn validate(&self, limits: &Limits) -> TrainerResult<()> {
        limits.check_octave_range(self.octave_range)?;
        limits.check_tempo(self.tempo_bpm)?;
        limits.check_subdivisions(self.subdivisions)?;
        Ok(())
    }

    pub fn fingering_key(&self, inversion: InversionKind) -> FingeringKey {
        FingeringKey::new(self.hand, self.chord.quality, inversion)
    }

    /// True when `other` needs a new sequence and walker rather than an
    /// in-place edit.
    pub fn needs_regeneration(&self, other: &TrainerSettings) -> bool {
        self.chord != other.chord
            || self.octave_range != other.octave_range
            || self.hand != other.hand
            || self.mode != other.mode
    }
}
