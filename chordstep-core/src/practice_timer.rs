use std::time::Duration;

/// Measures time spent playing in the current session.
#[derive(Debug, Clone, Default)]
pub struct PracticeTimer {
    started_at: Option<Duration>,
    accumulated: Duration,
}

impl PracticeTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn start(&mut self, now: Duration) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    /// Elapsed session time so far, including the running stretch.
    pub fn elapsed(&self, now: Duration) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |t| now.saturating_sub(t))
    }

    /// Stop and hand back everything accumulated, zeroing the timer.
    pub fn take(&mut self, now: Duration) -> Duration {
        let total = self.elapsed(now);
        self.started_at = None;
        self.accumulated = Duration::ZERO;
        total
    }
}
