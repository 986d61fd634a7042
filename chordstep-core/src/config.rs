use std::path::{Path, PathBuf};

use serde::Deserialize;

use chordstep_types::{ChordSpec, Hand, TraversalMode};

use crate::settings::{Limits, TrainerSettings};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    defaults: DefaultsConfig,
    #[serde(default)]
    limits: LimitsConfig,
}

#[derive(Deserialize, Default)]
struct DefaultsConfig {
    chord: Option<String>,
    octave_range: Option<u8>,
    hand: Option<String>,
    mode: Option<String>,
    tempo: Option<u16>,
    subdivisions: Option<u8>,
    show_fingering: Option<bool>,
}

#[derive(Deserialize, Default)]
struct LimitsConfig {
    min_tempo: Option<u16>,
    max_tempo: Option<u16>,
    max_octave_range: Option<u8>,
    max_subdivisions: Option<u8>,
}

pub struct Config {
    defaults: DefaultsConfig,
    limits: LimitsConfig,
}

impl Config {
    /// Embedded defaults merged with the user's config file, if any.
    pub fn load() -> Self {
        Self::load_from(user_config_path().as_deref())
    }

    pub fn load_from(user_path: Option<&Path>) -> Self {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");

        if let Some(path) = user_path {
            if path.exists() {
                match std::fs::read_to_string(path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => {
                            merge_defaults(&mut base.defaults, user.defaults);
                            merge_limits(&mut base.limits, user.limits);
                        }
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config {
            defaults: base.defaults,
            limits: base.limits,
        }
    }

    pub fn limits(&self) -> Limits {
        let fallback = Limits::default();
        Limits {
            min_tempo: self.limits.min_tempo.unwrap_or(fallback.min_tempo),
            max_tempo: self.limits.max_tempo.unwrap_or(fallback.max_tempo),
            max_octave_range: self
                .limits
                .max_octave_range
                .unwrap_or(fallback.max_octave_range),
            max_subdivisions: self
                .limits
                .max_subdivisions
                .unwrap_or(fallback.max_subdivisions),
        }
    }

    /// Default trainer settings. Unparseable entries fall back to built-ins;
    /// range checking is left to the session.
    pub fn defaults(&self) -> TrainerSettings {
        let fallback = TrainerSettings::default();
        TrainerSettings {
            chord: self
                .defaults
                .chord
                .as_deref()
                .and_then(|s| ChordSpec::parse_symbol(s).ok())
                .unwrap_or(fallback.chord),
            octave_range: self.defaults.octave_range.unwrap_or(fallback.octave_range),
            hand: self
                .defaults
                .hand
                .as_deref()
                .and_then(|s| Hand::parse(s).ok())
                .unwrap_or(fallback.hand),
            mode: self
                .defaults
                .mode
                .as_deref()
                .and_then(|s| TraversalMode::parse(s).ok())
                .unwrap_or(fallback.mode),
            tempo_bpm: self.defaults.tempo.unwrap_or(fallback.tempo_bpm),
            subdivisions: self.defaults.subdivisions.unwrap_or(fallback.subdivisions),
            show_fingering: self
                .defaults
                .show_fingering
                .unwrap_or(fallback.show_fingering),
        }
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("chordstep").join("config.toml"))
}

fn merge_defaults(base: &mut DefaultsConfig, user: DefaultsConfig) {
    if user.chord.is_some() {
        base.chord = user.chord;
    }
    if user.octave_range.is_some() {
        base.octave_range = user.octave_range;
    }
    if user.hand.is_some() {
        base.hand = user.hand;
    }
    if user.mode.is_some() {
        base.mode = user.mode;
    }
    if user.tempo.is_some() {
        base.tempo = user.tempo;
    }
    if user.subdivisions.is_some() {
        base.subdivisions = user.subdivisions;
    }
    if user.show_fingering.is_some() {
        base.show_fingering = user.show_fingering;
    }
}

fn merge_limits(base: &mut LimitsConfig, user: LimitsConfig) {
    if user.min_tempo.is_some() {
        base.min_tempo = user.min_tempo;
    }
    if user.max_tempo.is_some() {
        base.max_tempo = user.max_tempo;
    }
    if user.max_octave_range.is_some() {
        base.max_octave_range = user.max_octave_range;
    }
    if user.max_subdivisions.is_some() {
        base.max_subdivisions = user.max_subdivisions;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chordstep_types::{ChordQuality, Key};

    #[test]
    fn test_load_embedded_config() {
        let config = Config::load_from(None);
        let defaults = config.defaults();
        assert_eq!(defaults.chord, ChordSpec::new(Key::C, ChordQuality::Major));
        assert_eq!(defaults.octave_range, 1);
        assert_eq!(defaults.hand, Hand::Right);
        assert_eq!(defaults.mode, TraversalMode::Forward);
        assert_eq!(defaults.tempo_bpm, 60);
        assert_eq!(defaults.subdivisions, 4);
        assert!(defaults.show_fingering);

        let limits = config.limits();
        assert_eq!(limits.min_tempo, 20);
        assert_eq!(limits.max_tempo, 240);
        assert_eq!(limits.max_octave_range, 4);
        assert_eq!(limits.max_subdivisions, 8);
        assert!(defaults.validate(&limits).is_ok());
    }

    #[test]
    fn test_user_config_overrides_selected_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[defaults]\nchord = \"Ebm\"\nmode = \"pingpong\"\ntempo = 96\n\n[limits]\nmax_tempo = 160\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&path));
        let defaults = config.defaults();
        assert_eq!(defaults.chord, ChordSpec::new(Key::Ds, ChordQuality::Minor));
        assert_eq!(defaults.mode, TraversalMode::PingPong);
        assert_eq!(defaults.tempo_bpm, 96);
        assert_eq!(defaults.subdivisions, 4);
        assert_eq!(config.limits().max_tempo, 160);
        assert_eq!(config.limits().min_tempo, 20);
    }

    #[test]
    fn test_malformed_user_config_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[defaults\ntempo = ").unwrap();

        let config = Config::load_from(Some(&path));
        assert_eq!(config.defaults().tempo_bpm, 60);
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[defaults]\nchord = \"H7\"\nhand = \"both\"\n").unwrap();

        let defaults = Config::load_from(Some(&path)).defaults();
        assert_eq!(defaults.chord, ChordSpec::default());
        assert_eq!(defaults.hand, Hand::Right);
    }

    #[test]
    fn test_missing_user_file_uses_embedded() {
        let config = Config::load_from(Some(Path::new("/nonexistent/chordstep/config.toml")));
        assert_eq!(config.defaults(), TrainerSettings::default());
    }
}
