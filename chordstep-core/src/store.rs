//! Practice persistence: last-used tempo per (chord, hand) and accumulated
//! practice time per day.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use chordstep_types::{ChordSpec, Hand};

const SECS_PER_DAY: u64 = 86_400;

/// Days since the Unix epoch, used as the practice-time bucket.
pub fn day_index(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO).as_secs() / SECS_PER_DAY
}

pub fn today() -> u64 {
    day_index(SystemTime::now())
}

/// Key-value collaborator the session reads tempos from and writes practice
/// data to. Implementations must not fail playback; errors are theirs to log.
pub trait PracticeStore {
    fn tempo_for(&self, chord: ChordSpec, hand: Hand) -> Option<u16>;
    fn save_tempo(&mut self, chord: ChordSpec, hand: Hand, bpm: u16);
    fn add_practice_time(&mut self, day: u64, elapsed: Duration);
    fn practice_time(&self, day: u64) -> Duration;
}

impl<T: PracticeStore + ?Sized> PracticeStore for Box<T> {
    fn tempo_for(&self, chord: ChordSpec, hand: Hand) -> Option<u16> {
        (**self).tempo_for(chord, hand)
    }
    fn save_tempo(&mut self, chord: ChordSpec, hand: Hand, bpm: u16) {
        (**self).save_tempo(chord, hand, bpm)
    }
    fn add_practice_time(&mut self, day: u64, elapsed: Duration) {
        (**self).add_practice_time(day, elapsed)
    }
    fn practice_time(&self, day: u64) -> Duration {
        (**self).practice_time(day)
    }
}

fn tempo_key(chord: ChordSpec, hand: Hand) -> String {
    format!("{}:{}", chord.symbol(), hand.name())
}

/// Serialized store contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeRecord {
    #[serde(default)]
    pub tempos: BTreeMap<String, u16>,
    /// Milliseconds practised, keyed by day index.
    #[serde(default)]
    pub daily_millis: BTreeMap<u64, u64>,
}

impl PracticeRecord {
    fn tempo_for(&self, chord: ChordSpec, hand: Hand) -> Option<u16> {
        self.tempos.get(&tempo_key(chord, hand)).copied()
    }

    fn save_tempo(&mut self, chord: ChordSpec, hand: Hand, bpm: u16) {
        self.tempos.insert(tempo_key(chord, hand), bpm);
    }

    fn add_practice_time(&mut self, day: u64, elapsed: Duration) {
        let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let total = self.daily_millis.entry(day).or_insert(0);
        *total = total.saturating_add(millis);
    }

    fn practice_time(&self, day: u64) -> Duration {
        Duration::from_millis(self.daily_millis.get(&day).copied().unwrap_or(0))
    }
}

/// In-memory store, used by tests and `--no-save` runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryPracticeStore {
    record: PracticeRecord,
}

impl MemoryPracticeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PracticeStore for MemoryPracticeStore {
    fn tempo_for(&self, chord: ChordSpec, hand: Hand) -> Option<u16> {
        self.record.tempo_for(chord, hand)
    }

    fn save_tempo(&mut self, chord: ChordSpec, hand: Hand, bpm: u16) {
        self.record.save_tempo(chord, hand, bpm);
    }

    fn add_practice_time(&mut self, day: u64, elapsed: Duration) {
        self.record.add_practice_time(day, elapsed);
    }

    fn practice_time(&self, day: u64) -> Duration {
        self.record.practice_time(day)
    }
}

/// Error from reading or writing the JSON store file.
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// JSON file store. Every mutation is written through immediately.
#[derive(Debug, Clone)]
pub struct JsonPracticeStore {
    path: PathBuf,
    record: PracticeRecord,
}

impl JsonPracticeStore {
    /// Open the store at the default location.
    pub fn load() -> Self {
        Self::open(Self::storage_path())
    }

    /// Open the store at `path`. A missing or malformed file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let record = match Self::read(&path) {
            Ok(record) => record,
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                PracticeRecord::default()
            }
            Err(e) => {
                log::warn!(target: "store", "ignoring unreadable store {}: {}", path.display(), e);
                PracticeRecord::default()
            }
        };
        Self { path, record }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self) -> &PracticeRecord {
        &self.record
    }

    fn read(path: &Path) -> Result<PracticeRecord, StoreError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn try_save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.record)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn save(&self) {
        if let Err(e) = self.try_save() {
            log::warn!(target: "store", "could not write {}: {}", self.path.display(), e);
        }
    }

    fn storage_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chordstep")
            .join("practice.json")
    }
}

impl PracticeStore for JsonPracticeStore {
    fn tempo_for(&self, chord: ChordSpec, hand: Hand) -> Option<u16> {
        self.record.tempo_for(chord, hand)
    }

    fn save_tempo(&mut self, chord: ChordSpec, hand: Hand, bpm: u16) {
        if self.record.tempo_for(chord, hand) == Some(bpm) {
            return;
        }
        self.record.save_tempo(chord, hand, bpm);
        self.save();
    }

    fn add_practice_time(&mut self, day: u64, elapsed: Duration) {
        if elapsed.as_millis() == 0 {
            return;
        }
        self.record.add_practice_time(day, elapsed);
        self.save();
    }

    fn practice_time(&self, day: u64) -> Duration {
        self.record.practice_time(day)
    }
}
