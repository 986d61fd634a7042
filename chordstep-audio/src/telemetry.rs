//! Firing lateness: how long after its due time each scheduler firing
//! actually reached the clock thread's feedback channel.
//!
//! Samples go into a fixed histogram, so recording never allocates and the
//! p95 is read off bucket bounds rather than a sorted buffer.

use std::time::Duration;

use chordstep_types::TrainerEvent;

/// Upper bound (inclusive, microseconds) of each histogram bucket.
const BUCKET_BOUNDS_US: [u32; 10] = [
    250, 500, 1_000, 2_000, 5_000, 10_000, 20_000, 50_000, 100_000, u32::MAX,
];

/// One reporting window of lateness figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatenessSummary {
    pub firings: u32,
    pub avg_late_us: u32,
    pub max_late_us: u32,
    /// Bucket bound below which 95% of firings landed.
    pub p95_late_us: u32,
    /// Firings later than the budget.
    pub late_count: u32,
}

#[derive(Debug, Default)]
pub struct LatenessWindow {
    buckets: [u32; BUCKET_BOUNDS_US.len()],
    firings: u32,
    total_us: u64,
    max_us: u32,
    late_count: u32,
    budget_us: u32,
}

impl LatenessWindow {
    pub fn new(budget: Duration) -> Self {
        Self {
            budget_us: micros(budget),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.firings == 0
    }

    /// Record the firings behind `events`, delivered at `now`. A chord and
    /// its accented click share one due time and count as one firing.
    pub fn record_events(&mut self, events: &[TrainerEvent], now: Duration) {
        let mut last_due = None;
        for event in events {
            let due = event.at();
            if last_due != Some(due) {
                self.record(now.saturating_sub(due));
                last_due = Some(due);
            }
        }
    }

    pub fn record(&mut self, lateness: Duration) {
        let us = micros(lateness);
        let bucket = BUCKET_BOUNDS_US
            .iter()
            .position(|&bound| us <= bound)
            .unwrap_or(BUCKET_BOUNDS_US.len() - 1);
        self.buckets[bucket] += 1;
        self.firings = self.firings.saturating_add(1);
        self.total_us += u64::from(us);
        self.max_us = self.max_us.max(us);
        if us > self.budget_us {
            self.late_count += 1;
        }
    }

    /// Summarize and start a fresh window.
    pub fn take_summary(&mut self) -> LatenessSummary {
        if self.is_empty() {
            return LatenessSummary::default();
        }
        let summary = LatenessSummary {
            firings: self.firings,
            avg_late_us: (self.total_us / u64::from(self.firings)) as u32,
            max_late_us: self.max_us,
            p95_late_us: self.percentile_bound(95),
            late_count: self.late_count,
        };
        *self = Self::new(Duration::from_micros(u64::from(self.budget_us)));
        summary
    }

    fn percentile_bound(&self, pct: u64) -> u32 {
        let needed = (u64::from(self.firings) * pct).div_ceil(100);
        let mut seen = 0u64;
        for (count, bound) in self.buckets.iter().zip(BUCKET_BOUNDS_US) {
            seen += u64::from(*count);
            if seen >= needed {
                return bound.min(self.max_us);
            }
        }
        self.max_us
    }
}

fn micros(d: Duration) -> u32 {
    u32::try_from(d.as_micros()).unwrap_or(u32::MAX)
}
