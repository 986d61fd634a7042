//! Inversion generator: chord + octave range in, ordered practice sequence out.

use chordstep_types::{ChordSpec, InversionDescriptor, InversionKind, TrainerError, TrainerResult};

/// Octave label of the first stop in every sequence.
pub const BASE_OCTAVE: i8 = 3;
/// Pitch number of C in the base octave.
pub const BASE_PITCH: u8 = 60;
/// Hard ceiling keeping every generated pitch inside 0..=127.
pub const MAX_OCTAVE_RANGE: u8 = 4;

/// Ordered, read-only list of inversions for one configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    stops: Vec<InversionDescriptor>,
}

impl Sequence {
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&InversionDescriptor> {
        self.stops.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InversionDescriptor> {
        self.stops.iter()
    }
}

impl From<Vec<InversionDescriptor>> for Sequence {
    fn from(stops: Vec<InversionDescriptor>) -> Self {
        Self { stops }
    }
}

/// Generate root, first and second inversion for each octave, ascending from
/// [`BASE_OCTAVE`].
pub fn generate(chord: ChordSpec, octave_range: u8) -> TrainerResult<Sequence> {
    if octave_range < 1 {
        return Err(TrainerError::invalid("octave range must be at least 1"));
    }
    if octave_range > MAX_OCTAVE_RANGE {
        return Err(TrainerError::invalid(format!(
            "octave range {} exceeds maximum of {}",
            octave_range, MAX_OCTAVE_RANGE
        )));
    }

    let [third, fifth] = chord.quality.intervals();
    let mut stops = Vec::with_capacity(octave_range as usize * 3);

    for step in 0..octave_range {
        let octave = BASE_OCTAVE + step as i8;
        let root = BASE_PITCH + chord.root.semitone() + 12 * step;
        let root_position = [root, root + third, root + fifth];

        for kind in InversionKind::ALL {
            stops.push(InversionDescriptor {
                pitches: kind.voice(root_position),
                inversion: kind,
                octave,
                chord,
                label: format!("{} - {}", chord.display_name(), kind.name()),
            });
        }
    }

    log::debug!(target: "generator", "{}: {} stops over {} octave(s)", chord.symbol(), stops.len(), octave_range);
    Ok(Sequence::from(stops))
}
