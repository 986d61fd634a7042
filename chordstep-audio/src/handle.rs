//! ClockHandle: main-thread interface to the clock thread.
//!
//! Owns the command and feedback channels. The practice session, its
//! scheduler and all firing happen on the clock thread.

use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender as CrossbeamSender;

use chordstep_core::TrainerSettings;
use chordstep_types::{ChordCue, TrainerResult};

use super::clock_thread::{ClockSession, ClockThread};
use super::commands::{ClockCmd, ClockError, ClockFeedback};

/// Last values reported by the clock thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockReadState {
    pub playing: bool,
    pub tempo_bpm: u16,
}

pub struct ClockHandle {
    cmd_tx: CrossbeamSender<ClockCmd>,
    feedback_rx: Receiver<ClockFeedback>,
    read_state: ClockReadState,
    join_handle: Option<JoinHandle<()>>,
}

impl ClockHandle {
    /// Move `session` onto a new clock thread.
    pub fn spawn(session: ClockSession) -> Self {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let (feedback_tx, feedback_rx) = mpsc::channel();
        let read_state = ClockReadState {
            playing: session.is_playing(),
            tempo_bpm: session.settings().tempo_bpm,
        };

        let join_handle = thread::Builder::new()
            .name("chordstep-clock".into())
            .spawn(move || {
                ClockThread::new(session, cmd_rx, feedback_tx).run();
            })
            .map_err(|e| log::error!(target: "clock", "could not spawn clock thread: {}", e))
            .ok();

        Self {
            cmd_tx,
            feedback_rx,
            read_state,
            join_handle,
        }
    }

    pub fn read_state(&self) -> ClockReadState {
        self.read_state
    }

    /// Send a command and block until the clock thread replies.
    fn request<T>(&self, make: impl FnOnce(mpsc::Sender<T>) -> ClockCmd) -> Result<T, ClockError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.cmd_tx
            .send(make(reply_tx))
            .map_err(|_| ClockError::Disconnected)?;
        reply_rx.recv().map_err(|_| ClockError::Disconnected)
    }

    fn request_result<T>(
        &self,
        make: impl FnOnce(mpsc::Sender<TrainerResult<T>>) -> ClockCmd,
    ) -> Result<T, ClockError> {
        Ok(self.request(make)??)
    }

    pub fn configure(&self, settings: TrainerSettings) -> Result<Option<ChordCue>, ClockError> {
        self.request_result(|reply| ClockCmd::Configure { settings, reply })
    }

    pub fn play(&self) -> Result<(), ClockError> {
        self.request_result(|reply| ClockCmd::Play { reply })
    }

    /// Stop firing. Once this returns, no further chord or click of the
    /// stopped schedule will be produced.
    pub fn pause(&self) -> Result<(), ClockError> {
        self.request(|reply| ClockCmd::Pause { reply })
    }

    pub fn restart(&self) -> Result<(), ClockError> {
        self.request_result(|reply| ClockCmd::Restart { reply })
    }

    pub fn set_tempo(&self, bpm: u16) -> Result<(), ClockError> {
        self.request_result(|reply| ClockCmd::SetTempo { bpm, reply })
    }

    pub fn nudge_tempo(&self, delta: i32) -> Result<u16, ClockError> {
        self.request_result(|reply| ClockCmd::NudgeTempo { delta, reply })
    }

    pub fn set_subdivisions(&self, subdivisions: u8) -> Result<(), ClockError> {
        self.request_result(|reply| ClockCmd::SetSubdivisions { subdivisions, reply })
    }

    pub fn set_show_fingering(&self, show: bool) -> Result<Option<ChordCue>, ClockError> {
        self.request(|reply| ClockCmd::SetShowFingering { show, reply })
    }

    pub fn settings(&self) -> Result<TrainerSettings, ClockError> {
        self.request(|reply| ClockCmd::QuerySettings { reply })
    }

    pub fn practice_time(&self, day: u64) -> Result<Duration, ClockError> {
        self.request(|reply| ClockCmd::QueryPracticeTime { day, reply })
    }

    pub fn drain_feedback(&mut self) -> Vec<ClockFeedback> {
        let mut out = Vec::new();
        while let Ok(msg) = self.feedback_rx.try_recv() {
            self.apply_feedback(&msg);
            out.push(msg);
        }
        out
    }

    /// Block up to `timeout` for the next feedback message.
    pub fn recv_feedback_timeout(&mut self, timeout: Duration) -> Option<ClockFeedback> {
        let msg = self.feedback_rx.recv_timeout(timeout).ok()?;
        self.apply_feedback(&msg);
        Some(msg)
    }

    fn apply_feedback(&mut self, feedback: &ClockFeedback) {
        match feedback {
            ClockFeedback::PlayingChanged(playing) => self.read_state.playing = *playing,
            ClockFeedback::TempoChanged(bpm) => self.read_state.tempo_bpm = *bpm,
            ClockFeedback::Event(_) | ClockFeedback::Telemetry(_) => {}
        }
    }
}

impl Drop for ClockHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(ClockCmd::Shutdown);
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.join();
        }
    }
}
