//! Events handed to the render and audio collaborators.

use std::time::Duration;

use serde::Serialize;

use crate::fingering::FingeringKey;
use crate::inversion::InversionDescriptor;

/// Metronome click strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickAccent {
    /// Accompanies a chord change.
    Accented,
    /// Subdivision between chord changes.
    Plain,
}

/// Everything a renderer needs to show and sound one inversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordCue {
    pub descriptor: InversionDescriptor,
    pub fingering_key: FingeringKey,
    /// Present only when fingering display is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingers: Option<[u8; 3]>,
}

impl ChordCue {
    pub fn new(descriptor: InversionDescriptor, fingering_key: FingeringKey, show_fingering: bool) -> Self {
        let fingers = show_fingering.then(|| fingering_key.fingers());
        Self { descriptor, fingering_key, fingers }
    }

    pub fn pitches(&self) -> [u8; 3] {
        self.descriptor.pitches
    }
}

/// Output of a running practice session.
///
/// `at` is the logical time the event was due, measured from the same
/// origin the caller uses for `now`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TrainerEvent {
    Chord { cue: ChordCue, at: Duration },
    Click { accent: ClickAccent, at: Duration },
}

impl TrainerEvent {
    pub fn at(&self) -> Duration {
        match self {
            TrainerEvent::Chord { at, .. } | TrainerEvent::Click { at, .. } => *at,
        }
    }

    pub fn is_chord(&self) -> bool {
        matches!(self, TrainerEvent::Chord { .. })
    }
}
