//! Subdivision scheduler: a single periodic clock that advances the walker on
//! downbeats and produces metronome sub-ticks in between.
//!
//! The scheduler never reads a wall clock. Callers pass a monotonic `now`
//! (time since an origin of their choosing) to every call, and [`poll`]
//! fires everything that has come due. This keeps firings strictly serial
//! and makes timing fully reproducible in tests.
//!
//! [`poll`]: SubdivisionScheduler::poll

use std::time::Duration;

use chordstep_types::{InversionDescriptor, TrainerError, TrainerResult, TraversalMode};

use crate::walker::SequenceWalker;

const NANOS_PER_MINUTE: u64 = 60_000_000_000;
/// Most beats' worth of overdue firings one poll will replay.
const MAX_CATCH_UP_CYCLES: u64 = 8;

/// Armed periodic job. Only created by `start`/`reconfigure` and dropped by
/// `stop`/`reconfigure`, so at most one schedule is ever live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PeriodicJob {
    period: Duration,
    next_due: Duration,
}

impl PeriodicJob {
    fn arm(period: Duration, now: Duration) -> Self {
        Self {
            period,
            next_due: now + period,
        }
    }
}

/// What a single firing did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FiringKind {
    /// The walker advanced. `None` when the walker has nothing to show.
    Downbeat(Option<InversionDescriptor>),
    SubTick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Firing {
    /// Logical time the firing was due.
    pub due: Duration,
    pub kind: FiringKind,
}

impl Firing {
    pub fn is_downbeat(&self) -> bool {
        matches!(self.kind, FiringKind::Downbeat(_))
    }
}

/// Period of one clock tick. `subdivisions == 0` means the plain beat period.
pub fn tick_period(tempo_bpm: u16, subdivisions: u8) -> TrainerResult<Duration> {
    if tempo_bpm == 0 {
        return Err(TrainerError::invalid("tempo must be positive"));
    }
    let divisor = tempo_bpm as u64 * subdivisions.max(1) as u64;
    Ok(Duration::from_nanos(NANOS_PER_MINUTE / divisor))
}

/// Idle/Running clock state machine.
#[derive(Debug, Clone, Default)]
pub struct SubdivisionScheduler {
    tempo_bpm: u16,
    subdivisions: u8,
    phase: u8,
    job: Option<PeriodicJob>,
}

impl SubdivisionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.job.is_some()
    }

    pub fn tempo(&self) -> u16 {
        self.tempo_bpm
    }

    pub fn subdivisions(&self) -> u8 {
        self.subdivisions
    }

    /// Position in the subdivision cycle of the next firing.
    pub fn phase(&self) -> u8 {
        self.phase
    }

    pub fn period(&self) -> Option<Duration> {
        self.job.map(|job| job.period)
    }

    /// When the next firing is due, if running.
    pub fn next_due(&self) -> Option<Duration> {
        self.job.map(|job| job.next_due)
    }

    /// Arm the clock. The caller is expected to have displayed the walker's
    /// current stop already, so with subdivisions the first firing is a
    /// sub-tick rather than an immediate chord change.
    ///
    /// Starting a running scheduler re-arms it from scratch.
    pub fn start(&mut self, tempo_bpm: u16, subdivisions: u8, now: Duration) -> TrainerResult<()> {
        let period = tick_period(tempo_bpm, subdivisions)?;
        if self.job.is_some() {
            log::debug!(target: "scheduler", "start while running, re-arming");
        }

        self.tempo_bpm = tempo_bpm;
        self.subdivisions = subdivisions;
        self.phase = if subdivisions == 0 { 0 } else { 1 % subdivisions };
        self.job = Some(PeriodicJob::arm(period, now));

        log::debug!(
            target: "scheduler",
            "started: {} bpm, {} subdivisions, period {:?}",
            tempo_bpm,
            subdivisions,
            period
        );
        Ok(())
    }

    /// Change tempo and/or subdivisions while running, keeping the position
    /// in the subdivision cycle. The next firing happens one new period after
    /// `now`. A no-op when idle.
    pub fn reconfigure(&mut self, tempo_bpm: u16, subdivisions: u8, now: Duration) -> TrainerResult<()> {
        let period = tick_period(tempo_bpm, subdivisions)?;
        if self.job.take().is_none() {
            log::debug!(target: "scheduler", "reconfigure while idle ignored");
            return Ok(());
        }

        self.phase = match (self.subdivisions, subdivisions) {
            (_, 0) => 0,
            (0, new) => 1 % new,
            (_, new) => self.phase % new,
        };
        self.tempo_bpm = tempo_bpm;
        self.subdivisions = subdivisions;
        self.job = Some(PeriodicJob::arm(period, now));

        log::debug!(
            target: "scheduler",
            "reconfigured: {} bpm, {} subdivisions, phase {}",
            tempo_bpm,
            subdivisions,
            self.phase
        );
        Ok(())
    }

    /// Cancel the schedule. Idempotent.
    pub fn stop(&mut self) {
        if self.job.take().is_some() {
            log::debug!(target: "scheduler", "stopped");
        }
        self.phase = 0;
    }

    /// Fire every tick due at or before `now`, in order.
    ///
    /// Downbeats advance `walker` using `mode`. When the caller falls behind,
    /// overdue firings are delivered back to back with their original due
    /// times. A backlog longer than [`MAX_CATCH_UP_CYCLES`] beats is first
    /// cut down by dropping whole beats, which leaves the phase unchanged.
    pub fn poll(
        &mut self,
        now: Duration,
        walker: &mut SequenceWalker,
        mode: TraversalMode,
    ) -> Vec<Firing> {
        let mut firings = Vec::new();
        let Some(mut job) = self.job else {
            return firings;
        };
        self.skip_stalled_cycles(&mut job, now);

        while job.next_due <= now {
            let due = job.next_due;
            let kind = if self.subdivisions == 0 || self.phase == 0 {
                FiringKind::Downbeat(walker.advance(mode).cloned())
            } else {
                FiringKind::SubTick
            };
            if self.subdivisions > 0 {
                self.phase = (self.phase + 1) % self.subdivisions;
            }
            firings.push(Firing { due, kind });
            job.next_due += job.period;
        }

        self.job = Some(job);
        firings
    }

    fn skip_stalled_cycles(&self, job: &mut PeriodicJob, now: Duration) {
        if job.next_due > now {
            return;
        }
        let cycle = job.period.as_nanos() * u128::from(self.subdivisions.max(1));
        if cycle == 0 {
            return;
        }
        let behind = (now - job.next_due).as_nanos() / cycle + 1;
        let skip = behind.saturating_sub(u128::from(MAX_CATCH_UP_CYCLES));
        if skip == 0 {
            return;
        }
        let jump = u64::try_from(skip * cycle).unwrap_or(u64::MAX);
        job.next_due += Duration::from_nanos(jump);
        log::warn!(
            target: "scheduler",
            "clock stalled, dropped {} beat(s) of overdue firings",
            skip
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate;
    use chordstep_types::ChordSpec;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn walker() -> SequenceWalker {
        SequenceWalker::new(generate(ChordSpec::default(), 2).unwrap())
    }

    fn downbeat_times(firings: &[Firing]) -> Vec<Duration> {
        firings.iter().filter(|f| f.is_downbeat()).map(|f| f.due).collect()
    }

    #[test]
    fn tick_period_values() {
        assert_eq!(tick_period(60, 4).unwrap(), ms(250));
        assert_eq!(tick_period(60, 0).unwrap(), ms(1000));
        assert_eq!(tick_period(120, 1).unwrap(), ms(500));
        assert!(matches!(tick_period(0, 4), Err(TrainerError::InvalidConfiguration(_))));
    }

    #[test]
    fn first_firing_is_sub_tick_and_downbeat_lands_on_the_beat() {
        let mut sched = SubdivisionScheduler::new();
        let mut w = walker();
        sched.start(60, 4, Duration::ZERO).unwrap();
        assert_eq!(sched.phase(), 1);
        assert_eq!(sched.next_due(), Some(ms(250)));

        let firings = sched.poll(ms(250), &mut w, TraversalMode::Forward);
        assert_eq!(firings.len(), 1);
        assert_eq!(firings[0].kind, FiringKind::SubTick);
        assert_eq!(w.index(), 0);

        let firings = sched.poll(ms(1000), &mut w, TraversalMode::Forward);
        assert_eq!(firings.len(), 3);
        assert_eq!(firings[2].due, ms(1000));
        match &firings[2].kind {
            FiringKind::Downbeat(Some(d)) => assert_eq!(d.pitches, [64, 67, 72]),
            other => panic!("expected downbeat, got {:?}", other),
        }
        assert_eq!(w.index(), 1);
    }

    #[test]
    fn beat_only_mode_fires_downbeat_every_period() {
        let mut sched = SubdivisionScheduler::new();
        let mut w = walker();
        sched.start(120, 0, Duration::ZERO).unwrap();
        let firings = sched.poll(ms(2000), &mut w, TraversalMode::Forward);
        assert_eq!(firings.len(), 4);
        assert!(firings.iter().all(Firing::is_downbeat));
        assert_eq!(downbeat_times(&firings), vec![ms(500), ms(1000), ms(1500), ms(2000)]);
        assert_eq!(w.index(), 4);
    }

    #[test]
    fn single_subdivision_still_delays_first_chord_change() {
        let mut sched = SubdivisionScheduler::new();
        let mut w = walker();
        sched.start(60, 1, Duration::ZERO).unwrap();
        assert_eq!(sched.phase(), 0);
        let firings = sched.poll(ms(1000), &mut w, TraversalMode::Forward);
        assert!(firings[0].is_downbeat());
        assert_eq!(firings[0].due, ms(1000));
    }

    #[test]
    fn poll_before_due_fires_nothing() {
        let mut sched = SubdivisionScheduler::new();
        let mut w = walker();
        sched.start(60, 4, Duration::ZERO).unwrap();
        assert!(sched.poll(ms(249), &mut w, TraversalMode::Forward).is_empty());
    }

    #[test]
    fn reconfigure_preserves_phase() {
        let mut sched = SubdivisionScheduler::new();
        let mut w = walker();
        sched.start(60, 4, Duration::ZERO).unwrap();
        sched.poll(ms(500), &mut w, TraversalMode::Forward);
        assert_eq!(sched.phase(), 3);

        sched.reconfigure(120, 4, ms(600)).unwrap();
        assert_eq!(sched.phase(), 3);
        assert_eq!(sched.period(), Some(ms(125)));
        assert_eq!(sched.next_due(), Some(ms(725)));

        let firings = sched.poll(ms(850), &mut w, TraversalMode::Forward);
        assert_eq!(firings.len(), 2);
        assert_eq!(firings[0].kind, FiringKind::SubTick);
        assert!(firings[1].is_downbeat());
        assert_eq!(w.index(), 1);
    }

    #[test]
    fn reconfigure_does_not_advance_at_the_change() {
        let mut sched = SubdivisionScheduler::new();
        let mut w = walker();
        sched.start(60, 4, Duration::ZERO).unwrap();
        // Phase 0 pending: the very next firing is a downbeat.
        sched.poll(ms(750), &mut w, TraversalMode::Forward);
        assert_eq!(sched.phase(), 0);
        assert_eq!(w.index(), 0);

        sched.reconfigure(90, 4, ms(800)).unwrap();
        assert_eq!(w.index(), 0);
        assert!(sched.poll(ms(800), &mut w, TraversalMode::Forward).is_empty());
    }

    #[test]
    fn reconfigure_from_beat_only_starts_phase_at_one() {
        let mut sched = SubdivisionScheduler::new();
        let mut w = walker();
        sched.start(60, 0, Duration::ZERO).unwrap();
        sched.reconfigure(60, 4, ms(100)).unwrap();
        assert_eq!(sched.phase(), 1);
        let firings = sched.poll(ms(350), &mut w, TraversalMode::Forward);
        assert_eq!(firings[0].kind, FiringKind::SubTick);
    }

    #[test]
    fn reconfigure_to_beat_only_ignores_phase() {
        let mut sched = SubdivisionScheduler::new();
        let mut w = walker();
        sched.start(60, 4, Duration::ZERO).unwrap();
        sched.reconfigure(60, 0, ms(100)).unwrap();
        assert_eq!(sched.phase(), 0);
        let firings = sched.poll(ms(1100), &mut w, TraversalMode::Forward);
        assert_eq!(firings.len(), 1);
        assert!(firings[0].is_downbeat());
    }

    #[test]
    fn reconfigure_wraps_phase_into_smaller_cycle() {
        let mut sched = SubdivisionScheduler::new();
        let mut w = walker();
        sched.start(60, 4, Duration::ZERO).unwrap();
        sched.poll(ms(500), &mut w, TraversalMode::Forward);
        assert_eq!(sched.phase(), 3);
        sched.reconfigure(60, 2, ms(500)).unwrap();
        assert_eq!(sched.phase(), 1);
    }

    #[test]
    fn reconfigure_while_idle_is_a_no_op() {
        let mut sched = SubdivisionScheduler::new();
        sched.reconfigure(100, 4, ms(10)).unwrap();
        assert!(!sched.is_running());
        assert!(sched.next_due().is_none());
    }

    #[test]
    fn reconfigure_rejects_zero_tempo_and_keeps_schedule() {
        let mut sched = SubdivisionScheduler::new();
        sched.start(60, 4, Duration::ZERO).unwrap();
        assert!(sched.reconfigure(0, 4, ms(10)).is_err());
        assert!(sched.is_running());
        assert_eq!(sched.tempo(), 60);
        assert_eq!(sched.next_due(), Some(ms(250)));
    }

    #[test]
    fn start_rejects_zero_tempo() {
        let mut sched = SubdivisionScheduler::new();
        assert!(matches!(
            sched.start(0, 4, Duration::ZERO),
            Err(TrainerError::InvalidConfiguration(_))
        ));
        assert!(!sched.is_running());
    }

    #[test]
    fn stop_cancels_and_is_idempotent() {
        let mut sched = SubdivisionScheduler::new();
        let mut w = walker();
        sched.start(60, 4, Duration::ZERO).unwrap();
        sched.poll(ms(250), &mut w, TraversalMode::Forward);
        sched.stop();
        sched.stop();
        assert!(!sched.is_running());
        assert_eq!(sched.phase(), 0);
        assert!(sched.poll(ms(10_000), &mut w, TraversalMode::Forward).is_empty());
        assert_eq!(w.index(), 0);
    }

    #[test]
    fn downbeat_count_scales_with_tempo() {
        // Ten seconds at 60 bpm, then ten at 120 bpm.
        let mut sched = SubdivisionScheduler::new();
        let mut w = walker();
        sched.start(60, 4, Duration::ZERO).unwrap();
        let mut before = Vec::new();
        for t in (100..=10_000).step_by(100) {
            before.extend(sched.poll(ms(t), &mut w, TraversalMode::Forward));
        }
        assert_eq!(before.iter().filter(|f| f.is_downbeat()).count(), 10);

        sched.reconfigure(120, 4, ms(10_000)).unwrap();
        let mut after = Vec::new();
        for t in (10_100..=20_000).step_by(100) {
            after.extend(sched.poll(ms(t), &mut w, TraversalMode::Forward));
        }
        assert_eq!(after.iter().filter(|f| f.is_downbeat()).count(), 20);

        let mut times = downbeat_times(&before);
        times.extend(downbeat_times(&after));
        for pair in times.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn short_backlog_is_replayed_in_full() {
        let mut sched = SubdivisionScheduler::new();
        let mut w = walker();
        sched.start(60, 4, Duration::ZERO).unwrap();
        let firings = sched.poll(ms(8_000), &mut w, TraversalMode::Forward);
        assert_eq!(firings.len(), 32);
        assert_eq!(downbeat_times(&firings).len(), 8);
        assert_eq!(sched.next_due(), Some(ms(8_250)));
    }

    #[test]
    fn long_stall_drops_whole_beats_and_keeps_phase() {
        let mut sched = SubdivisionScheduler::new();
        let mut w = walker();
        sched.start(240, 8, Duration::ZERO).unwrap();
        sched.poll(ms(100), &mut w, TraversalMode::Forward);
        let phase = sched.phase();
        assert_eq!(phase, 4);

        let hour = Duration::from_secs(3_600);
        let firings = sched.poll(hour, &mut w, TraversalMode::Forward);
        assert!(firings.len() <= (MAX_CATCH_UP_CYCLES * 8) as usize);
        assert!(downbeat_times(&firings).len() <= MAX_CATCH_UP_CYCLES as usize);
        assert!(firings.iter().all(|f| f.due <= hour));
        for pair in firings.windows(2) {
            assert_eq!(pair[1].due - pair[0].due, ms(31) + Duration::from_micros(250));
        }
        // The replayed firings start where the cycle left off.
        assert_eq!(firings[0].kind, FiringKind::SubTick);
        assert!(firings[4].is_downbeat());

        let next = sched.next_due().unwrap();
        assert!(next > hour && next - hour <= ms(32));
        assert_eq!(sched.poll(next, &mut w, TraversalMode::Forward).len(), 1);
    }

    #[test]
    fn empty_walker_yields_downbeat_without_descriptor() {
        let mut sched = SubdivisionScheduler::new();
        let mut w = SequenceWalker::new(Default::default());
        sched.start(60, 0, Duration::ZERO).unwrap();
        let firings = sched.poll(ms(1000), &mut w, TraversalMode::Forward);
        assert_eq!(firings[0].kind, FiringKind::Downbeat(None));
    }
}
