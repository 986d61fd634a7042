use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{TrainerError, TrainerResult};

/// Chord-select symbol: root letter, optional accidental, optional minor suffix.
static CHORD_SYMBOL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-G])(#|b|s)?(m)?$").expect("chord symbol pattern is valid")
});

/// Musical key (pitch class)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

impl Key {
    pub const ALL: [Key; 12] = [
        Key::C,
        Key::Cs,
        Key::D,
        Key::Ds,
        Key::E,
        Key::F,
        Key::Fs,
        Key::G,
        Key::Gs,
        Key::A,
        Key::As,
        Key::B,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Key::C => "C",
            Key::Cs => "C#",
            Key::D => "D",
            Key::Ds => "D#",
            Key::E => "E",
            Key::F => "F",
            Key::Fs => "F#",
            Key::G => "G",
            Key::Gs => "G#",
            Key::A => "A",
            Key::As => "A#",
            Key::B => "B",
        }
    }

    /// Semitones above C.
    pub fn semitone(&self) -> u8 {
        match self {
            Key::C => 0,
            Key::Cs => 1,
            Key::D => 2,
            Key::Ds => 3,
            Key::E => 4,
            Key::F => 5,
            Key::Fs => 6,
            Key::G => 7,
            Key::Gs => 8,
            Key::A => 9,
            Key::As => 10,
            Key::B => 11,
        }
    }

    /// Key for an absolute pitch number.
    pub fn from_pitch(pitch: u8) -> Key {
        Key::ALL[(pitch % 12) as usize]
    }

    /// Parse a root name. Sharps may be spelled `#` or `s`, flats `b`.
    pub fn parse(s: &str) -> TrainerResult<Key> {
        let key = match s {
            "C" | "B#" => Key::C,
            "C#" | "Cs" | "Db" => Key::Cs,
            "D" => Key::D,
            "D#" | "Ds" | "Eb" => Key::Ds,
            "E" | "Fb" => Key::E,
            "F" | "E#" => Key::F,
            "F#" | "Fs" | "Gb" => Key::Fs,
            "G" => Key::G,
            "G#" | "Gs" | "Ab" => Key::Gs,
            "A" => Key::A,
            "A#" | "As" | "Bb" => Key::As,
            "B" | "Cb" => Key::B,
            _ => return Err(TrainerError::unknown_chord(format!("unrecognised root '{}'", s))),
        };
        Ok(key)
    }
}

/// Triad quality. Only major and minor triads are modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChordQuality {
    Major,
    Minor,
}

impl ChordQuality {
    /// Semitone offsets of the third and fifth above the root.
    pub fn intervals(&self) -> [u8; 2] {
        match self {
            ChordQuality::Major => [4, 7],
            ChordQuality::Minor => [3, 7],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChordQuality::Major => "Major",
            ChordQuality::Minor => "Minor",
        }
    }

    pub fn parse(s: &str) -> TrainerResult<ChordQuality> {
        match s.to_ascii_lowercase().as_str() {
            "major" => Ok(ChordQuality::Major),
            "minor" => Ok(ChordQuality::Minor),
            _ => Err(TrainerError::unknown_chord(format!("unrecognised quality '{}'", s))),
        }
    }
}

/// The chord being practised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChordSpec {
    pub root: Key,
    pub quality: ChordQuality,
}

impl ChordSpec {
    pub fn new(root: Key, quality: ChordQuality) -> Self {
        Self { root, quality }
    }

    /// Build from separately supplied root and quality names.
    pub fn from_names(root: &str, quality: &str) -> TrainerResult<Self> {
        Ok(Self::new(Key::parse(root)?, ChordQuality::parse(quality)?))
    }

    /// Parse a chord-select symbol such as `C`, `F#`, `Bbm` or `Am`.
    pub fn parse_symbol(symbol: &str) -> TrainerResult<Self> {
        let caps = CHORD_SYMBOL
            .captures(symbol.trim())
            .ok_or_else(|| TrainerError::unknown_chord(format!("unrecognised chord '{}'", symbol)))?;
        let letter = caps.get(1).map_or("", |m| m.as_str());
        let accidental = caps.get(2).map_or("", |m| m.as_str());
        let root = Key::parse(&format!("{}{}", letter, accidental))?;
        let quality = if caps.get(3).is_some() {
            ChordQuality::Minor
        } else {
            ChordQuality::Major
        };
        Ok(Self::new(root, quality))
    }

    /// Chord-select symbol, e.g. `C#m`.
    pub fn symbol(&self) -> String {
        match self.quality {
            ChordQuality::Major => self.root.name().to_string(),
            ChordQuality::Minor => format!("{}m", self.root.name()),
        }
    }

    /// Display name, e.g. `A Minor`.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.root.name(), self.quality.name())
    }
}

impl Default for ChordSpec {
    fn default() -> Self {
        Self::new(Key::C, ChordQuality::Major)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_parse_accepts_sharps_and_flats() {
        assert_eq!(Key::parse("C#").unwrap(), Key::Cs);
        assert_eq!(Key::parse("Db").unwrap(), Key::Cs);
        assert_eq!(Key::parse("Fs").unwrap(), Key::Fs);
        assert_eq!(Key::parse("Bb").unwrap(), Key::As);
        assert!(matches!(Key::parse("H"), Err(TrainerError::UnknownChord(_))));
        assert!(Key::parse("").is_err());
    }

    #[test]
    fn key_semitones_cover_octave() {
        for (i, key) in Key::ALL.iter().enumerate() {
            assert_eq!(key.semitone() as usize, i);
            assert_eq!(Key::from_pitch(60 + i as u8), *key);
        }
    }

    #[test]
    fn quality_parse_is_case_insensitive() {
        assert_eq!(ChordQuality::parse("Major").unwrap(), ChordQuality::Major);
        assert_eq!(ChordQuality::parse("MINOR").unwrap(), ChordQuality::Minor);
        assert!(matches!(
            ChordQuality::parse("diminished"),
            Err(TrainerError::UnknownChord(_))
        ));
    }

    #[test]
    fn quality_intervals() {
        assert_eq!(ChordQuality::Major.intervals(), [4, 7]);
        assert_eq!(ChordQuality::Minor.intervals(), [3, 7]);
    }

    #[test]
    fn parse_symbol_major_and_minor() {
        let c = ChordSpec::parse_symbol("C").unwrap();
        assert_eq!(c, ChordSpec::new(Key::C, ChordQuality::Major));

        let am = ChordSpec::parse_symbol("Am").unwrap();
        assert_eq!(am, ChordSpec::new(Key::A, ChordQuality::Minor));

        let bbm = ChordSpec::parse_symbol("Bbm").unwrap();
        assert_eq!(bbm, ChordSpec::new(Key::As, ChordQuality::Minor));

        let fs = ChordSpec::parse_symbol(" F# ").unwrap();
        assert_eq!(fs.root, Key::Fs);
    }

    #[test]
    fn parse_symbol_rejects_garbage() {
        for bad in ["", "c", "Cmaj7", "X", "C##", "Amm"] {
            assert!(
                matches!(ChordSpec::parse_symbol(bad), Err(TrainerError::UnknownChord(_))),
                "expected rejection of {:?}",
                bad
            );
        }
    }

    #[test]
    fn symbol_and_display_name() {
        let spec = ChordSpec::new(Key::Cs, ChordQuality::Minor);
        assert_eq!(spec.symbol(), "C#m");
        assert_eq!(spec.display_name(), "C# Minor");
        assert_eq!(ChordSpec::default().display_name(), "C Major");
    }

    #[test]
    fn from_names() {
        let spec = ChordSpec::from_names("Eb", "major").unwrap();
        assert_eq!(spec.root, Key::Ds);
        assert!(ChordSpec::from_names("Eb", "augmented").is_err());
    }
}
