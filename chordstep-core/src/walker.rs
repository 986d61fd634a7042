//! Stateful cursor over a generated [`Sequence`].

use chordstep_types::{InversionDescriptor, TraversalMode};

use crate::generator::Sequence;

/// Travel direction, consulted only by ping-pong traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TravelDirection {
    #[default]
    Ascending,
    Descending,
}

/// Walker position state. The walker remembers where it is and which way
/// ping-pong is travelling, never which mode it was last advanced with.
#[derive(Debug, Clone)]
pub struct SequenceWalker {
    sequence: Sequence,
    index: usize,
    direction: TravelDirection,
}

impl SequenceWalker {
    pub fn new(sequence: Sequence) -> Self {
        Self {
            sequence,
            index: 0,
            direction: TravelDirection::Ascending,
        }
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn direction(&self) -> TravelDirection {
        self.direction
    }

    /// The stop currently at rest. `None` while the sequence is empty.
    pub fn current(&self) -> Option<&InversionDescriptor> {
        self.sequence.get(self.index)
    }

    /// Move one step according to `mode` and return the new stop.
    pub fn advance(&mut self, mode: TraversalMode) -> Option<&InversionDescriptor> {
        let len = self.sequence.len();
        if len == 0 {
            return None;
        }

        match mode {
            TraversalMode::Forward => {
                self.index = (self.index + 1) % len;
            }
            TraversalMode::Backward => {
                self.index = (self.index + len - 1) % len;
            }
            TraversalMode::PingPong => {
                if len < 2 {
                    self.index = 0;
                } else {
                    match self.direction {
                        TravelDirection::Ascending => {
                            self.index += 1;
                            if self.index >= len {
                                self.index = len - 2;
                                self.direction = TravelDirection::Descending;
                            }
                        }
                        TravelDirection::Descending => {
                            if self.index == 0 {
                                self.index = 1;
                                self.direction = TravelDirection::Ascending;
                            } else {
                                self.index -= 1;
                            }
                        }
                    }
                }
            }
        }

        self.sequence.get(self.index)
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.direction = TravelDirection::Ascending;
    }
}
