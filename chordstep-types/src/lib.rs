//! # chordstep-types
//!
//! Shared type definitions for the chordstep inversion trainer: chords,
//! inversion descriptors, fingering lookups and the events emitted to
//! rendering and audio collaborators.

mod chord;
mod error;
mod event;
mod fingering;
mod inversion;

pub use chord::{ChordQuality, ChordSpec, Key};
pub use error::{TrainerError, TrainerResult};
pub use event::{ChordCue, ClickAccent, TrainerEvent};
pub use fingering::{FingeringKey, Hand};
pub use inversion::{InversionDescriptor, InversionKind, TraversalMode};
