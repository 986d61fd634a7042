//! # chordstep-core
//!
//! Inversion sequencing and tempo-synchronised scheduling for the chordstep
//! practice trainer, independent of any UI, audio backend or timer thread.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use chordstep_core::config::Config;
//! use chordstep_core::session::PracticeSession;
//! use chordstep_core::store::MemoryPracticeStore;
//!
//! let config = Config::load_from(None);
//! let mut session =
//!     PracticeSession::new(config.defaults(), config.limits(), MemoryPracticeStore::new()).unwrap();
//!
//! // The first cue is emitted synchronously at play time.
//! let first = session.play(Duration::ZERO).unwrap();
//! assert_eq!(first.len(), 1);
//!
//! // Drive the clock with monotonic time; one beat at 60 bpm is 1000 ms.
//! let events = session.poll(Duration::from_millis(1000));
//! assert!(events.iter().any(|e| e.is_chord()));
//! ```
//!
//! ## Module Overview
//!
//! - [`generator`]: `generate()` turns a chord and octave range into a `Sequence`
//! - [`walker`]: `SequenceWalker`, forward / backward / ping-pong cursor
//! - [`scheduler`]: `SubdivisionScheduler`, the phase-preserving periodic clock
//! - [`session`]: `PracticeSession`, the single configuration entry point
//! - [`settings`]: `TrainerSettings` and caller-enforced `Limits`
//! - [`config`]: TOML configuration (embedded defaults + user override)
//! - [`store`]: `PracticeStore` persistence collaborator (memory and JSON file)
//! - [`practice_timer`]: per-session practice time accumulation

pub mod config;
pub mod generator;
pub mod practice_timer;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod store;
pub mod walker;

pub use generator::{generate, Sequence};
pub use scheduler::{Firing, FiringKind, SubdivisionScheduler};
pub use session::PracticeSession;
pub use settings::{Limits, TrainerSettings};
pub use walker::{SequenceWalker, TravelDirection};
