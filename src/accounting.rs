//! Byte and time bookkeeping shared by every tick and controller call.
//!
//! Timestamps handed in are raw [`Clock`](crate::Clock) readings in seconds. Internally the
//! pacer works on an *active* timeline in whole nanoseconds: zero at construction, frozen
//! while paused. Anchors, tick deadlines and the last activity all live on that timeline,
//! which is what lets pauses and rate changes compose without extra bookkeeping.

use std::time::Duration;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Start, pause and activity timestamps of one stream.
#[derive(Debug, Clone)]
pub(crate) struct TimeAccounting {
    start: f64,
    paused_total: f64,
    pause_start: Option<f64>,
    last_activity: u64,
}

impl TimeAccounting {
    pub fn new(start: f64) -> Self {
        Self {
            start,
            paused_total: 0.0,
            pause_start: None,
            last_activity: 0,
        }
    }

    /// Active nanoseconds at clock time `now`: wall time since start minus every paused
    /// interval, including the one in progress.
    pub fn active_nanos(&self, now: f64) -> u64 {
        let now = self.pause_start.unwrap_or(now);
        let active = now - self.start - self.paused_total;
        (active.max(0.0) * NANOS_PER_SEC).round() as u64
    }

    pub fn is_paused(&self) -> bool {
        self.pause_start.is_some()
    }

    pub fn pause(&mut self, now: f64) {
        if self.pause_start.is_none() {
            self.pause_start = Some(now);
        }
    }

    /// Closes the current paused interval and returns its length.
    pub fn resume(&mut self, now: f64) -> Duration {
        match self.pause_start.take() {
            Some(since) => {
                let paused = (now - since).max(0.0);
                self.paused_total += paused;
                Duration::from_secs_f64(paused)
            }
            None => Duration::ZERO,
        }
    }

    pub fn paused_total(&self) -> Duration {
        Duration::from_secs_f64(self.paused_total)
    }

    pub fn record_activity(&mut self, active: u64) {
        self.last_activity = active;
    }

    /// Active time between the start and the last delivered chunk.
    pub fn total_time(&self) -> Duration {
        Duration::from_nanos(self.last_activity)
    }
}

/// Point of the expected-bytes curve from which the current rate extrapolates.
///
/// `expected(t) = expected_bytes + round(rate * (t - timestamp))` for any active time `t`
/// after the anchor. An anchor is never edited; a rate change builds a new one from the
/// value of the old curve at the moment of the change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RateAnchor {
    expected_bytes: u64,
    timestamp: u64,
    rate: f64,
}

impl RateAnchor {
    pub fn new(rate: f64, timestamp: u64) -> Self {
        Self {
            expected_bytes: 0,
            timestamp,
            rate,
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn is_unlimited(&self) -> bool {
        self.rate == 0.0
    }

    /// Bytes that should have been emitted by active time `now`, saturating at `u64::MAX`.
    pub fn expected_at(&self, now: u64) -> u64 {
        let since = now.saturating_sub(self.timestamp) as f64 / NANOS_PER_SEC;
        // float to int casts saturate
        self.expected_bytes
            .saturating_add((self.rate * since).round() as u64)
    }

    /// The anchor continuing this curve at `now` with a new slope.
    ///
    /// Unlimited mode has no curve to continue, so leaving it starts from what was actually
    /// delivered.
    pub fn rebase(&self, rate: f64, now: u64, passed: u64) -> Self {
        let expected_bytes = if self.is_unlimited() {
            passed
        } else {
            self.expected_at(now)
        };
        Self {
            expected_bytes,
            timestamp: now,
            rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: u64 = 1_000_000_000;

    #[test]
    fn active_time_excludes_pauses() {
        let mut time = TimeAccounting::new(10.0);
        assert_eq!(2 * SEC, time.active_nanos(12.0));

        time.pause(12.0);
        assert!(time.is_paused());
        // frozen while paused
        assert_eq!(2 * SEC, time.active_nanos(15.0));
        assert_eq!(Duration::from_secs(3), time.resume(15.0));
        assert_eq!(3 * SEC, time.active_nanos(16.0));

        time.pause(16.0);
        time.resume(17.5);
        assert_eq!(Duration::from_secs_f64(4.5), time.paused_total());
        assert_eq!(3 * SEC, time.active_nanos(17.5));
    }

    #[test]
    fn resume_without_pause_changes_nothing() {
        let mut time = TimeAccounting::new(0.0);
        assert_eq!(Duration::ZERO, time.resume(5.0));
        assert_eq!(5 * SEC, time.active_nanos(5.0));
    }

    #[test]
    fn rebase_keeps_the_curve_continuous() {
        let anchor = RateAnchor::new(2048.0, 0);
        assert_eq!(2048, anchor.expected_at(SEC));

        let slower = anchor.rebase(1024.0, SEC, 2000);
        assert_eq!(anchor.expected_at(SEC), slower.expected_at(SEC));
        assert_eq!(2048 + 1024, slower.expected_at(2 * SEC));
        assert_eq!(1024.0, slower.rate());
    }

    #[test]
    fn leaving_unlimited_anchors_at_delivered_bytes() {
        let anchor = RateAnchor::new(0.0, 0);
        let paced = anchor.rebase(100.0, 5 * SEC, 777);
        assert_eq!(777, paced.expected_at(5 * SEC));
        assert_eq!(877, paced.expected_at(6 * SEC));
    }

    #[test]
    fn expected_before_anchor_is_clamped() {
        let anchor = RateAnchor::new(100.0, SEC).rebase(100.0, SEC, 0);
        assert_eq!(anchor.expected_at(0), anchor.expected_at(SEC));
    }

    #[test]
    fn huge_rates_saturate() {
        let anchor = RateAnchor::new(1000.0, 0).rebase(1e300, SEC, 0);
        assert_eq!(1000, anchor.expected_at(SEC));
        assert_eq!(u64::MAX, anchor.expected_at(2 * SEC));

        let rebased = anchor.rebase(f64::MAX, 3 * SEC, 0);
        assert_eq!(u64::MAX, rebased.expected_at(3 * SEC));
        assert_eq!(u64::MAX, rebased.expected_at(4 * SEC));
    }
}
