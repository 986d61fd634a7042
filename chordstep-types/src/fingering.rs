use serde::{Deserialize, Serialize};

use crate::chord::ChordQuality;
use crate::error::{TrainerError, TrainerResult};
use crate::inversion::InversionKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    #[default]
    Right,
    Left,
}

impl Hand {
    pub fn name(&self) -> &'static str {
        match self {
            Hand::Right => "right",
            Hand::Left => "left",
        }
    }

    pub fn parse(s: &str) -> TrainerResult<Hand> {
        match s.to_ascii_lowercase().as_str() {
            "right" | "r" => Ok(Hand::Right),
            "left" | "l" => Ok(Hand::Left),
            _ => Err(TrainerError::invalid(format!("unknown hand '{}'", s))),
        }
    }
}

/// Lookup key into the fingering table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FingeringKey {
    pub hand: Hand,
    pub quality: ChordQuality,
    pub inversion: InversionKind,
}

impl FingeringKey {
    pub fn new(hand: Hand, quality: ChordQuality, inversion: InversionKind) -> Self {
        Self { hand, quality, inversion }
    }

    /// Finger numbers (1 = thumb), one per pitch, lowest pitch first.
    ///
    /// Major and minor triads currently share the same patterns.
    pub fn fingers(&self) -> [u8; 3] {
        match (self.hand, self.inversion) {
            (Hand::Right, InversionKind::Root) => [1, 3, 5],
            (Hand::Right, InversionKind::First) => [1, 2, 5],
            (Hand::Right, InversionKind::Second) => [1, 3, 5],
            (Hand::Left, InversionKind::Root) => [5, 3, 1],
            (Hand::Left, InversionKind::First) => [5, 3, 1],
            (Hand::Left, InversionKind::Second) => [5, 2, 1],
        }
    }
}
