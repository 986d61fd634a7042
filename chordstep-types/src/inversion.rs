use serde::{Deserialize, Serialize};

use crate::chord::{ChordSpec, Key};
use crate::error::{TrainerError, TrainerResult};

/// Which chord tone sits at the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InversionKind {
    Root,
    First,
    Second,
}

impl InversionKind {
    /// Emission order within one octave.
    pub const ALL: [InversionKind; 3] =
        [InversionKind::Root, InversionKind::First, InversionKind::Second];

    pub fn name(&self) -> &'static str {
        match self {
            InversionKind::Root => "Root Position",
            InversionKind::First => "First Inversion",
            InversionKind::Second => "Second Inversion",
        }
    }

    /// Rotate a root-position triad `[r, r+i2, r+i3]` into this inversion.
    pub fn voice(&self, root_position: [u8; 3]) -> [u8; 3] {
        let [r, third, fifth] = root_position;
        match self {
            InversionKind::Root => [r, third, fifth],
            InversionKind::First => [third, fifth, r + 12],
            InversionKind::Second => [fifth, r + 12, third + 12],
        }
    }
}

/// One stop in the practice sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InversionDescriptor {
    /// Absolute pitch numbers, lowest first.
    pub pitches: [u8; 3],
    pub inversion: InversionKind,
    pub octave: i8,
    pub chord: ChordSpec,
    pub label: String,
}

impl InversionDescriptor {
    /// Pitch classes, sorted, for comparing voicings independent of octave.
    pub fn pitch_classes(&self) -> [u8; 3] {
        let mut classes = self.pitches.map(|p| p % 12);
        classes.sort_unstable();
        classes
    }

    /// e.g. `Octave: C3`
    pub fn octave_display(&self) -> String {
        format!("Octave: C{}", self.octave)
    }

    /// Note names for each pitch, without octave numbers.
    pub fn note_names(&self) -> [&'static str; 3] {
        self.pitches.map(|p| Key::from_pitch(p).name())
    }
}

/// How the walker moves through the sequence on each downbeat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalMode {
    #[default]
    Forward,
    Backward,
    PingPong,
}

impl TraversalMode {
    pub fn name(&self) -> &'static str {
        match self {
            TraversalMode::Forward => "Forward",
            TraversalMode::Backward => "Backward",
            TraversalMode::PingPong => "Ping-Pong",
        }
    }

    pub fn parse(s: &str) -> TrainerResult<TraversalMode> {
        match s.to_ascii_lowercase().as_str() {
            "forward" | "up" => Ok(TraversalMode::Forward),
            "backward" | "down" => Ok(TraversalMode::Backward),
            "pingpong" | "ping-pong" | "up-down" => Ok(TraversalMode::PingPong),
            _ => Err(TrainerError::invalid(format!("unknown traversal mode '{}'", s))),
        }
    }
}
