//! # chordstep-audio
//!
//! Real-time host for a practice session: a dedicated clock thread that
//! sleeps until the scheduler's next firing, plus the main-thread
//! [`ClockHandle`] that controls it. Chord cues and metronome clicks come
//! back as [`ClockFeedback`] for the rendering and sound collaborators.

pub mod clock_thread;
pub mod commands;
pub mod handle;
pub mod telemetry;

pub use clock_thread::ClockSession;
pub use commands::{ClockCmd, ClockError, ClockFeedback};
pub use handle::{ClockHandle, ClockReadState};
pub use telemetry::{LatenessSummary, LatenessWindow};
