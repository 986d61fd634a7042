//! Clock command and feedback types for the clock thread.
//!
//! Every control command carries a reply channel; `ClockHandle` blocks on it,
//! so by the time a call returns the clock thread has applied it and no
//! firing of the previous schedule can follow.

use std::sync::mpsc::Sender;
use std::time::Duration;

use chordstep_core::TrainerSettings;
use chordstep_types::{ChordCue, TrainerError, TrainerEvent, TrainerResult};

use super::telemetry::LatenessSummary;

/// Commands sent from the main thread to the clock thread.
#[derive(Debug)]
pub enum ClockCmd {
    Configure {
        settings: TrainerSettings,
        reply: Sender<TrainerResult<Option<ChordCue>>>,
    },
    Play {
        reply: Sender<TrainerResult<()>>,
    },
    Pause {
        reply: Sender<()>,
    },
    Restart {
        reply: Sender<TrainerResult<()>>,
    },
    SetTempo {
        bpm: u16,
        reply: Sender<TrainerResult<()>>,
    },
    NudgeTempo {
        delta: i32,
        reply: Sender<TrainerResult<u16>>,
    },
    SetSubdivisions {
        subdivisions: u8,
        reply: Sender<TrainerResult<()>>,
    },
    SetShowFingering {
        show: bool,
        reply: Sender<Option<ChordCue>>,
    },
    QuerySettings {
        reply: Sender<TrainerSettings>,
    },
    QueryPracticeTime {
        day: u64,
        reply: Sender<Duration>,
    },
    Shutdown,
}

/// Updates sent from the clock thread back to the main thread.
#[derive(Debug, Clone, PartialEq)]
pub enum ClockFeedback {
    Event(TrainerEvent),
    PlayingChanged(bool),
    TempoChanged(u16),
    /// Firing lateness over the last reporting window.
    Telemetry(LatenessSummary),
}

/// Error from a `ClockHandle` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    /// The clock thread has exited.
    Disconnected,
    Trainer(TrainerError),
}

impl From<TrainerError> for ClockError {
    fn from(e: TrainerError) -> Self {
        Self::Trainer(e)
    }
}

impl std::fmt::Display for ClockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "clock thread disconnected"),
            Self::Trainer(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ClockError {}
