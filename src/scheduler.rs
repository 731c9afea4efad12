//! Report cadence against the monotonic clock.
//!
//! ```text
//!   start₀            start₁                      start₂
//!     │◀── interval ──▶│◀── interval ──▶│ overdue  │
//!     ●────────────────●────────────────┼──────────●
//!                                    due here   runs once,
//!                                               next due = start₂ + interval
//! ```
//!
//! Spacing is measured between cycle *starts*, so a slow POST never
//! shortens the gap to the next attempt.  An overdue cycle runs once; there
//! is no catch-up burst for the cycles that were missed.  The interval is
//! read on every check, so a provisioning session that changes it takes
//! effect relative to the last start.

use core::time::Duration;

use log::debug;

#[derive(Debug, Clone, Default)]
pub struct ReportSchedule {
    /// `now_ms` of the last cycle start.  `None` until the first cycle,
    /// which is due immediately.
    last_start_ms: Option<u64>,
}

impl ReportSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a cycle may start at `now_ms`.
    pub fn is_due(&self, now_ms: u64, interval: Duration) -> bool {
        self.remaining_ms(now_ms, interval) == 0
    }

    /// Milliseconds until the next cycle is due; zero if due now.
    pub fn remaining_ms(&self, now_ms: u64, interval: Duration) -> u64 {
        let Some(last) = self.last_start_ms else {
            return 0;
        };
        let due = last.saturating_add(interval_ms(interval));
        due.saturating_sub(now_ms)
    }

    /// Record that a cycle started at `now_ms`.
    pub fn mark_started(&mut self, now_ms: u64) {
        if let Some(last) = self.last_start_ms {
            debug!("Scheduler: cycle start, {} ms after previous", now_ms - last);
        }
        self.last_start_ms = Some(now_ms);
    }
}

fn interval_ms(interval: Duration) -> u64 {
    u64::try_from(interval.as_millis()).unwrap_or(u64::MAX)
}
