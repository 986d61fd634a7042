//! Practice session: owns the walker, scheduler, practice timer and store,
//! and is the single entry point for every configuration change.

use std::time::Duration;

use chordstep_types::{ChordCue, ClickAccent, TrainerError, TrainerEvent, TrainerResult};

use crate::generator::generate;
use crate::practice_timer::PracticeTimer;
use crate::scheduler::{Firing, FiringKind, SubdivisionScheduler};
use crate::settings::{Limits, TrainerSettings};
use crate::store::{today, PracticeStore};
use crate::walker::SequenceWalker;

pub struct PracticeSession<S: PracticeStore> {
    settings: TrainerSettings,
    limits: Limits,
    walker: SequenceWalker,
    scheduler: SubdivisionScheduler,
    timer: PracticeTimer,
    store: S,
}

impl<S: PracticeStore> PracticeSession<S> {
    /// Build an idle session. A tempo stored for the chord and hand replaces
    /// `settings.tempo_bpm` when it is within `limits`.
    pub fn new(settings: TrainerSettings, limits: Limits, store: S) -> TrainerResult<Self> {
        let settings = with_stored_tempo(settings, &limits, &store);
        settings.validate(&limits)?;
        let sequence = generate(settings.chord, settings.octave_range)?;

        log::info!(
            target: "session",
            "session ready: {} x{} octaves, {} hand, {} bpm",
            settings.chord.display_name(),
            settings.octave_range,
            settings.hand.name(),
            settings.tempo_bpm
        );

        Ok(Self {
            settings,
            limits,
            walker: SequenceWalker::new(sequence),
            scheduler: SubdivisionScheduler::new(),
            timer: PracticeTimer::new(),
            store,
        })
    }

    pub fn settings(&self) -> &TrainerSettings {
        &self.settings
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn walker(&self) -> &SequenceWalker {
        &self.walker
    }

    pub fn scheduler(&self) -> &SubdivisionScheduler {
        &self.scheduler
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.scheduler.next_due()
    }

    /// Time played since the last play/restart, not yet flushed to the store.
    pub fn session_elapsed(&self, now: Duration) -> Duration {
        self.timer.elapsed(now)
    }

    /// The stop at rest, decorated for rendering.
    pub fn current_cue(&self) -> Option<ChordCue> {
        self.walker.current().map(|d| {
            ChordCue::new(
                d.clone(),
                self.settings.fingering_key(d.inversion),
                self.settings.show_fingering,
            )
        })
    }

    /// Apply a full configuration. Chord, octave range, hand or mode changes
    /// stop playback and start a fresh walker; tempo and subdivision changes
    /// alone are applied live. On error nothing changes.
    pub fn configure(&mut self, settings: TrainerSettings, now: Duration) -> TrainerResult<Option<ChordCue>> {
        let pair_changed =
            settings.chord != self.settings.chord || settings.hand != self.settings.hand;
        let settings = if pair_changed {
            with_stored_tempo(settings, &self.limits, &self.store)
        } else {
            settings
        };
        settings.validate(&self.limits)?;

        if self.settings.needs_regeneration(&settings) {
            let sequence = generate(settings.chord, settings.octave_range)?;
            self.pause(now);
            self.walker = SequenceWalker::new(sequence);
            log::info!(
                target: "session",
                "reconfigured: {} x{} octaves, {} hand, {}",
                settings.chord.display_name(),
                settings.octave_range,
                settings.hand.name(),
                settings.mode.name()
            );
        } else {
            self.retime(settings.tempo_bpm, settings.subdivisions, now)?;
        }

        self.settings = settings;
        self.store
            .save_tempo(settings.chord, settings.hand, settings.tempo_bpm);
        Ok(self.current_cue())
    }

    /// Start playback. The current stop is emitted immediately; the clock's
    /// first chord change comes one beat later. No-op while playing.
    pub fn play(&mut self, now: Duration) -> TrainerResult<Vec<TrainerEvent>> {
        if self.scheduler.is_running() {
            return Ok(Vec::new());
        }
        let cue = self
            .current_cue()
            .ok_or_else(|| TrainerError::invalid("no inversions to play"))?;

        self.scheduler
            .start(self.settings.tempo_bpm, self.settings.subdivisions, now)?;
        self.timer.start(now);
        log::debug!(target: "session", "play at {:?} from index {}", now, self.walker.index());

        Ok(vec![TrainerEvent::Chord { cue, at: now }])
    }

    /// Stop playback, keep the walker position, and flush practice time and
    /// tempo to the store. Idempotent.
    pub fn pause(&mut self, now: Duration) {
        if !self.scheduler.is_running() {
            return;
        }
        self.scheduler.stop();
        let elapsed = self.timer.take(now);
        self.store.add_practice_time(today(), elapsed);
        self.store
            .save_tempo(self.settings.chord, self.settings.hand, self.settings.tempo_bpm);
        log::debug!(target: "session", "paused after {:?}", elapsed);
    }

    /// Pause, rewind to the first stop, and play again.
    pub fn restart(&mut self, now: Duration) -> TrainerResult<Vec<TrainerEvent>> {
        self.pause(now);
        self.walker.reset();
        self.play(now)
    }

    pub fn set_tempo(&mut self, bpm: u16, now: Duration) -> TrainerResult<()> {
        self.limits.check_tempo(bpm)?;
        self.retime(bpm, self.settings.subdivisions, now)?;
        self.settings.tempo_bpm = bpm;
        self.store
            .save_tempo(self.settings.chord, self.settings.hand, bpm);
        Ok(())
    }

    /// Step the tempo by `delta` bpm. Steps that would leave the limits are
    /// rejected and the tempo stays put.
    pub fn nudge_tempo(&mut self, delta: i32, now: Duration) -> TrainerResult<u16> {
        let bpm = i32::from(self.settings.tempo_bpm)
            .checked_add(delta)
            .and_then(|target| u16::try_from(target).ok())
            .ok_or_else(|| {
                TrainerError::invalid(format!(
                    "tempo {} {:+} out of range",
                    self.settings.tempo_bpm, delta
                ))
            })?;
        self.set_tempo(bpm, now)?;
        Ok(bpm)
    }

    pub fn set_subdivisions(&mut self, subdivisions: u8, now: Duration) -> TrainerResult<()> {
        self.limits.check_subdivisions(subdivisions)?;
        self.retime(self.settings.tempo_bpm, subdivisions, now)?;
        self.settings.subdivisions = subdivisions;
        Ok(())
    }

    /// Re-arm the running clock, but only when the timing actually changes;
    /// re-arming restarts the current period from `now`.
    fn retime(&mut self, tempo_bpm: u16, subdivisions: u8, now: Duration) -> TrainerResult<()> {
        if !self.scheduler.is_running()
            || (self.scheduler.tempo(), self.scheduler.subdivisions()) == (tempo_bpm, subdivisions)
        {
            return Ok(());
        }
        self.scheduler.reconfigure(tempo_bpm, subdivisions, now)
    }

    /// Toggle finger numbers on cues. Does not move the walker.
    pub fn set_show_fingering(&mut self, show: bool) -> Option<ChordCue> {
        self.settings.show_fingering = show;
        self.current_cue()
    }

    /// Fire everything due at or before `now`.
    pub fn poll(&mut self, now: Duration) -> Vec<TrainerEvent> {
        let firings = self.scheduler.poll(now, &mut self.walker, self.settings.mode);
        let mut events = Vec::with_capacity(firings.len() * 2);
        for firing in firings {
            self.push_events(firing, &mut events);
        }
        events
    }

    fn push_events(&self, firing: Firing, events: &mut Vec<TrainerEvent>) {
        let at = firing.due;
        match firing.kind {
            FiringKind::Downbeat(descriptor) => {
                if let Some(d) = descriptor {
                    let key = self.settings.fingering_key(d.inversion);
                    let cue = ChordCue::new(d, key, self.settings.show_fingering);
                    events.push(TrainerEvent::Chord { cue, at });
                }
                events.push(TrainerEvent::Click {
                    accent: ClickAccent::Accented,
                    at,
                });
            }
            FiringKind::SubTick => events.push(TrainerEvent::Click {
                accent: ClickAccent::Plain,
                at,
            }),
        }
    }
}

fn with_stored_tempo<S: PracticeStore>(
    mut settings: TrainerSettings,
    limits: &Limits,
    store: &S,
) -> TrainerSettings {
    if let Some(bpm) = store.tempo_for(settings.chord, settings.hand) {
        if limits.check_tempo(bpm).is_ok() {
            settings.tempo_bpm = bpm;
        } else {
            log::warn!(target: "session", "stored tempo {} outside limits, ignoring", bpm);
        }
    }
    settings
}
