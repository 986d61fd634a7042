use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use chordstep_core::store::PracticeStore;
use chordstep_core::PracticeSession;
use chordstep_types::TrainerEvent;

use super::commands::{ClockCmd, ClockFeedback};
use super::telemetry::LatenessWindow;

/// Session type owned by the clock thread.
pub type ClockSession = PracticeSession<Box<dyn PracticeStore + Send>>;

/// Longest wait between polls when nothing is due soon.
const IDLE_INTERVAL: Duration = Duration::from_millis(50);
/// Lateness tolerated before a firing counts as late.
const LATE_BUDGET: Duration = Duration::from_millis(5);
const TELEMETRY_INTERVAL: Duration = Duration::from_secs(5);

pub(crate) struct ClockThread {
    session: ClockSession,
    cmd_rx: Receiver<ClockCmd>,
    feedback_tx: Sender<ClockFeedback>,
    /// Origin of the session's monotonic timeline
    origin: Instant,
    lateness: LatenessWindow,
    last_telemetry_emit: Instant,
}

impl ClockThread {
    pub(crate) fn new(
        session: ClockSession,
        cmd_rx: Receiver<ClockCmd>,
        feedback_tx: Sender<ClockFeedback>,
    ) -> Self {
        Self {
            session,
            cmd_rx,
            feedback_tx,
            origin: Instant::now(),
            lateness: LatenessWindow::new(LATE_BUDGET),
            last_telemetry_emit: Instant::now(),
        }
    }

    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    /// Wait until the next firing is due (or a command arrives), then fire.
    pub(crate) fn run(mut self) {
        loop {
            let timeout = self.time_until_due();

            crossbeam_channel::select! {
                recv(self.cmd_rx) -> result => {
                    match result {
                        Ok(cmd) => {
                            if self.handle_cmd(cmd) {
                                break;
                            }
                        }
                        Err(_) => break, // Disconnected
                    }
                }
                default(timeout) => {}
            }

            self.fire_due();
            self.maybe_emit_telemetry();
        }

        let now = self.now();
        self.session.pause(now);
        log::info!(target: "clock", "clock thread exiting");
    }

    fn time_until_due(&self) -> Duration {
        match self.session.next_due() {
            Some(due) => due.saturating_sub(self.now()).min(IDLE_INTERVAL),
            None => IDLE_INTERVAL,
        }
    }

    fn fire_due(&mut self) {
        let now = self.now();
        let events = self.session.poll(now);
        self.lateness.record_events(&events, now);
        self.send_events(events);
    }

    fn maybe_emit_telemetry(&mut self) {
        if self.last_telemetry_emit.elapsed() < TELEMETRY_INTERVAL || self.lateness.is_empty() {
            return;
        }
        self.last_telemetry_emit = Instant::now();
        let summary = self.lateness.take_summary();
        if summary.late_count > 0 {
            log::debug!(
                target: "clock",
                "{} of {} firings late (max {}us)",
                summary.late_count,
                summary.firings,
                summary.max_late_us
            );
        }
        self.send(ClockFeedback::Telemetry(summary));
    }

    fn send(&self, feedback: ClockFeedback) {
        // Receiver gone means the handle is shutting down; nothing to report to.
        let _ = self.feedback_tx.send(feedback);
    }

    fn send_events(&self, events: Vec<TrainerEvent>) {
        for event in events {
            self.send(ClockFeedback::Event(event));
        }
    }

    /// Apply one command. Returns true when the thread should exit.
    fn handle_cmd(&mut self, cmd: ClockCmd) -> bool {
        // Deliver anything already due under the old schedule first.
        self.fire_due();

        let was_playing = self.session.is_playing();
        let old_tempo = self.session.settings().tempo_bpm;
        let now = self.now();

        match cmd {
            ClockCmd::Configure { settings, reply } => {
                let _ = reply.send(self.session.configure(settings, now));
            }
            ClockCmd::Play { reply } => {
                let result = self.session.play(now).map(|events| self.send_events(events));
                let _ = reply.send(result);
            }
            ClockCmd::Pause { reply } => {
                self.session.pause(now);
                let _ = reply.send(());
            }
            ClockCmd::Restart { reply } => {
                let result = self.session.restart(now).map(|events| self.send_events(events));
                let _ = reply.send(result);
            }
            ClockCmd::SetTempo { bpm, reply } => {
                let _ = reply.send(self.session.set_tempo(bpm, now));
            }
            ClockCmd::NudgeTempo { delta, reply } => {
                let _ = reply.send(self.session.nudge_tempo(delta, now));
            }
            ClockCmd::SetSubdivisions { subdivisions, reply } => {
                let _ = reply.send(self.session.set_subdivisions(subdivisions, now));
            }
            ClockCmd::SetShowFingering { show, reply } => {
                let _ = reply.send(self.session.set_show_fingering(show));
            }
            ClockCmd::QuerySettings { reply } => {
                let _ = reply.send(*self.session.settings());
            }
            ClockCmd::QueryPracticeTime { day, reply } => {
                let _ = reply.send(self.session.store().practice_time(day));
            }
            ClockCmd::Shutdown => return true,
        }

        let playing = self.session.is_playing();
        if playing != was_playing {
            log::info!(target: "clock", "playing: {}", playing);
            self.send(ClockFeedback::PlayingChanged(playing));
        }
        let tempo = self.session.settings().tempo_bpm;
        if tempo != old_tempo {
            self.send(ClockFeedback::TempoChanged(tempo));
        }
        false
    }
}
