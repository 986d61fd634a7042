use std::fs::File;
use std::io::Write;
use std::time::{Duration, Instant};

use chordstep_audio::{ClockFeedback, ClockHandle, ClockSession};
use chordstep_core::config::Config;
use chordstep_core::store::{today, JsonPracticeStore, MemoryPracticeStore, PracticeStore};
use chordstep_core::{PracticeSession, TrainerSettings};
use chordstep_types::{
    ChordCue, ChordSpec, Hand, TrainerError, TrainerEvent, TrainerResult, TraversalMode,
};

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("chordstep")
        .join("chordstep.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path).or_else(|_| File::create("/tmp/chordstep.log")) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("chordstep: logging disabled ({})", e);
            return;
        }
    };

    if let Err(e) = WriteLogger::init(log_level, Config::default(), log_file) {
        eprintln!("chordstep: logging disabled ({})", e);
        return;
    }

    log::info!("chordstep starting (log level: {:?})", log_level);
}

/// Options that only affect the command-line run, not the session.
struct RunOptions {
    beats: Option<usize>,
    save: bool,
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn parse_number<T: std::str::FromStr>(args: &[String], flag: &str) -> TrainerResult<Option<T>> {
    match flag_value(args, flag) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| TrainerError::invalid(format!("{} expects a number, got '{}'", flag, raw))),
        None => Ok(None),
    }
}

/// Apply command-line flags on top of the configured defaults.
fn parse_args(args: &[String], mut settings: TrainerSettings) -> TrainerResult<(TrainerSettings, RunOptions)> {
    if let Some(symbol) = flag_value(args, "--chord") {
        settings.chord = ChordSpec::parse_symbol(symbol)?;
    }
    if let Some(hand) = flag_value(args, "--hand") {
        settings.hand = Hand::parse(hand)?;
    }
    if let Some(mode) = flag_value(args, "--mode") {
        settings.mode = TraversalMode::parse(mode)?;
    }
    if let Some(octaves) = parse_number(args, "--octaves")? {
        settings.octave_range = octaves;
    }
    if let Some(bpm) = parse_number(args, "--tempo")? {
        settings.tempo_bpm = bpm;
    }
    if let Some(subdivisions) = parse_number(args, "--subdivisions")? {
        settings.subdivisions = subdivisions;
    }
    if args.iter().any(|a| a == "--no-fingering") {
        settings.show_fingering = false;
    } else if args.iter().any(|a| a == "--fingering") {
        settings.show_fingering = true;
    }

    let options = RunOptions {
        beats: parse_number(args, "--beats")?,
        save: !args.iter().any(|a| a == "--no-save"),
    };
    Ok((settings, options))
}

fn cue_line(cue: &ChordCue) -> String {
    let descriptor = &cue.descriptor;
    let notes = descriptor.note_names().join(" ");
    let pitches = descriptor
        .pitches
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    let mut line = format!(
        "{}  {}  {}  ({})",
        descriptor.label,
        descriptor.octave_display(),
        notes,
        pitches
    );
    if let Some(fingers) = cue.fingers {
        line.push_str(&format!(
            "  {}: {}-{}-{}",
            cue.fingering_key.hand.name(),
            fingers[0],
            fingers[1],
            fingers[2]
        ));
    }
    line
}

/// Downbeats needed to visit every stop once in `mode` and come back.
fn full_pass(len: usize, mode: TraversalMode) -> usize {
    match mode {
        TraversalMode::Forward | TraversalMode::Backward => len,
        TraversalMode::PingPong => (2 * len.saturating_sub(1)).max(1),
    }
}

/// Upper bound on wall time for `beats` downbeats, with slack for startup.
fn run_budget(beat: Duration, beats: usize) -> Duration {
    let beats = u32::try_from(beats).unwrap_or(u32::MAX).saturating_add(2);
    beat.saturating_mul(beats).saturating_add(Duration::from_secs(2))
}

fn format_practice_time(time: Duration) -> String {
    let secs = time.as_secs();
    format!("{}m {:02}s", secs / 60, secs % 60)
}

fn run(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let limits = config.limits();
    let (settings, options) = parse_args(args, config.defaults())?;

    let store: Box<dyn PracticeStore + Send> = if options.save {
        Box::new(JsonPracticeStore::load())
    } else {
        Box::new(MemoryPracticeStore::new())
    };
    let session: ClockSession = PracticeSession::new(settings, limits, store)?;

    let settings = *session.settings();
    let beats = options
        .beats
        .unwrap_or_else(|| full_pass(session.walker().sequence().len(), settings.mode));
    let beat = Duration::from_secs_f64(60.0 / f64::from(settings.tempo_bpm));
    // No deadline when the budget is too large to represent.
    let deadline = Instant::now().checked_add(run_budget(beat, beats));

    println!(
        "{} | {} octave(s) | {} | {} bpm x {}",
        settings.chord.display_name(),
        settings.octave_range,
        settings.mode.name(),
        settings.tempo_bpm,
        settings.subdivisions
    );

    let mut handle = ClockHandle::spawn(session);
    handle.play()?;

    // The first cue arrives at play time; each later one is a downbeat.
    let mut downbeats: Option<usize> = None;
    let stdout = std::io::stdout();
    while downbeats.map_or(true, |n| n < beats) && deadline.map_or(true, |d| Instant::now() < d) {
        let Some(feedback) = handle.recv_feedback_timeout(Duration::from_millis(100)) else {
            continue;
        };
        let mut out = stdout.lock();
        match feedback {
            ClockFeedback::Event(TrainerEvent::Chord { cue, .. }) => {
                downbeats = Some(downbeats.map_or(0, |n| n + 1));
                let _ = writeln!(out);
                let _ = write!(out, "{}  ", cue_line(&cue));
            }
            ClockFeedback::Event(TrainerEvent::Click { .. }) => {
                let _ = write!(out, ".");
            }
            ClockFeedback::Telemetry(summary) if summary.late_count > 0 => {
                log::debug!("{} late firings (p95 {}us)", summary.late_count, summary.p95_late_us);
            }
            _ => {}
        }
        let _ = out.flush();
    }
    println!();

    handle.pause()?;
    let practiced = handle.practice_time(today())?;
    println!("Practiced today: {}", format_practice_time(practiced));
    Ok(())
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    init_logging(verbose);

    if let Err(e) = run(&args) {
        log::error!("{}", e);
        eprintln!("chordstep: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chordstep_types::{ChordQuality, Key};

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("chordstep")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn flags_override_defaults() {
        let (settings, options) = parse_args(
            &args(&[
                "--chord", "F#m", "--octaves", "2", "--hand", "left", "--mode", "pingpong",
                "--tempo", "90", "--subdivisions", "3", "--no-fingering", "--beats", "12",
                "--no-save",
            ]),
            TrainerSettings::default(),
        )
        .unwrap();
        assert_eq!(settings.chord, ChordSpec::new(Key::Fs, ChordQuality::Minor));
        assert_eq!(settings.octave_range, 2);
        assert_eq!(settings.hand, Hand::Left);
        assert_eq!(settings.mode, TraversalMode::PingPong);
        assert_eq!(settings.tempo_bpm, 90);
        assert_eq!(settings.subdivisions, 3);
        assert!(!settings.show_fingering);
        assert_eq!(options.beats, Some(12));
        assert!(!options.save);
    }

    #[test]
    fn no_flags_keeps_defaults() {
        let (settings, options) = parse_args(&args(&[]), TrainerSettings::default()).unwrap();
        assert_eq!(settings, TrainerSettings::default());
        assert_eq!(options.beats, None);
        assert!(options.save);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(parse_args(&args(&["--tempo", "fast"]), TrainerSettings::default()).is_err());
        assert!(parse_args(&args(&["--chord", "H"]), TrainerSettings::default()).is_err());
        assert!(parse_args(&args(&["--mode", "sideways"]), TrainerSettings::default()).is_err());
    }

    #[test]
    fn full_pass_covers_each_mode() {
        assert_eq!(full_pass(6, TraversalMode::Forward), 6);
        assert_eq!(full_pass(6, TraversalMode::Backward), 6);
        assert_eq!(full_pass(6, TraversalMode::PingPong), 10);
        assert_eq!(full_pass(1, TraversalMode::PingPong), 1);
    }

    #[test]
    fn run_budget_saturates_for_huge_beat_counts() {
        let beat = Duration::from_millis(500);
        assert_eq!(run_budget(beat, 4), Duration::from_secs(5));
        assert!(run_budget(beat, u32::MAX as usize) > Duration::from_secs(1 << 31));
        assert_eq!(run_budget(Duration::MAX, usize::MAX), Duration::MAX);

        let (_, options) =
            parse_args(&args(&["--beats", "4294967295"]), TrainerSettings::default()).unwrap();
        assert_eq!(options.beats, Some(4_294_967_295));
    }

    #[test]
    fn practice_time_formatting() {
        assert_eq!(format_practice_time(Duration::from_secs(65)), "1m 05s");
        assert_eq!(format_practice_time(Duration::ZERO), "0m 00s");
    }
}
