use std::time::Duration;

use bytes::Bytes;
use likely_stable::unlikely;
use tracing::{debug, trace};

use crate::accounting::{RateAnchor, TimeAccounting};
use crate::buffer::ByteBuffer;
use crate::config::{check_period, check_rate};
use crate::{Clock, PaceConfig, PaceError, StdClock};

/// Externally visible lifecycle of a [`Pacer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting input and emitting on every trigger.
    Running,
    /// Emission suspended; paused time does not count as active time.
    Paused,
    /// Input ended; the remaining bytes are still emitted at the configured rate.
    Draining,
    /// Every byte was delivered and the end was reported.
    Terminated,
    /// Torn down by [`Pacer::destroy`]; nothing is ever delivered again.
    Destroyed,
}

/// What should wake the emission loop up next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Unlimited mode: the next write.
    Readable,
    /// Paced mode: the next period boundary, this far from now.
    After(Duration),
}

/// Outcome of one emission attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    /// Bytes to hand to the consumer.
    Data(Bytes),
    /// The input ended and was fully delivered. Reported exactly once.
    End,
    /// Nothing to deliver yet.
    Wait(Trigger),
    /// Suspended until [`Pacer::resume`].
    Paused,
    /// Terminated or destroyed; there will never be anything to deliver.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Open,
    Terminated,
    Destroyed,
}

/// Paces a byte stream at a bounded long-run average rate.
///
/// Bytes written by the producer are queued and handed back by [`tick`](Self::tick) in
/// bursts, one burst per period, sized so that the cumulative output follows
/// `rate * active_time`. A rate of zero turns the pacer into a passthrough that returns
/// everything queued on each tick.
///
/// The pacer performs no I/O and never sleeps. Whoever drives it calls `tick` and honors the
/// returned [`Trigger`]; [`futures::paced`](crate::futures::paced) does exactly that on top
/// of tokio timers.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use tempo_stream::{ManualClock, PaceConfig, Pacer, Tick, Trigger};
///
/// let clock = Arc::new(ManualClock::default());
/// let mut pacer = Pacer::with_clock(PaceConfig::per_second(1000.0), Arc::clone(&clock)).unwrap();
/// pacer.write(vec![0u8; 250]).unwrap();
/// pacer.end();
///
/// // first burst is one period (100ms) away
/// assert_eq!(Tick::Wait(Trigger::After(Duration::from_millis(100))), pacer.tick());
/// clock.advance_ms(100);
/// match pacer.tick() {
///     Tick::Data(chunk) => assert_eq!(100, chunk.len()),
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub struct Pacer<C = StdClock> {
    clock: C,
    buffer: ByteBuffer,
    time: TimeAccounting,
    anchor: RateAnchor,
    period: Duration,
    passed: u64,
    /// Active time of the next paced tick, in nanoseconds.
    next_tick: u64,
    lifecycle: Lifecycle,
}

impl Pacer<StdClock> {
    /// Creates a pacer timed by the standard library clock.
    pub fn new(config: PaceConfig) -> Result<Self, PaceError> {
        Self::with_clock(config, StdClock::default())
    }
}

impl<C: Clock> Pacer<C> {
    pub fn with_clock(config: PaceConfig, clock: C) -> Result<Self, PaceError> {
        config.validate()?;
        let start = clock.now();
        debug!(rate = config.rate, period = ?config.period, "creating pacer");
        Ok(Self {
            clock,
            buffer: ByteBuffer::new(),
            time: TimeAccounting::new(start),
            anchor: RateAnchor::new(config.rate, 0),
            period: config.period,
            passed: 0,
            next_tick: period_nanos(config.period),
            lifecycle: Lifecycle::Open,
        })
    }

    /// Queues bytes for emission.
    ///
    /// Writing after [`end`](Self::end) is rejected with [`PaceError::WriteAfterEnd`];
    /// writing to a destroyed pacer silently does nothing.
    pub fn write(&mut self, bytes: impl Into<Bytes>) -> Result<(), PaceError> {
        match self.lifecycle {
            Lifecycle::Destroyed => Ok(()),
            Lifecycle::Terminated => Err(PaceError::WriteAfterEnd),
            Lifecycle::Open if self.buffer.is_ended() => Err(PaceError::WriteAfterEnd),
            Lifecycle::Open => {
                self.buffer.write(bytes.into());
                Ok(())
            }
        }
    }

    /// Signals that the producer is done. Queued bytes keep flowing at the current rate and
    /// [`Tick::End`] follows the last of them.
    pub fn end(&mut self) {
        if self.lifecycle != Lifecycle::Open || self.buffer.is_ended() {
            return;
        }
        debug!(buffered = self.buffer.len(), "input ended, draining");
        self.buffer.signal_end();
    }

    /// Drops every queued byte and closes the pacer for good. Safe to call in any state.
    pub fn destroy(&mut self) {
        if self.lifecycle == Lifecycle::Destroyed {
            return;
        }
        debug!(
            discarded = self.buffer.len(),
            passed = self.passed,
            "destroying pacer"
        );
        self.buffer.clear();
        self.lifecycle = Lifecycle::Destroyed;
    }

    pub fn pause(&mut self) {
        let now = self.clock.now();
        self.pause_at(now)
    }

    /// Suspends emission at clock time `now`. No-op when already paused or closed.
    pub fn pause_at(&mut self, now: f64) {
        if self.lifecycle != Lifecycle::Open || self.time.is_paused() {
            return;
        }
        debug!(passed = self.passed, "pausing");
        self.time.pause(now);
    }

    pub fn resume(&mut self) {
        let now = self.clock.now();
        self.resume_at(now)
    }

    /// Resumes emission at clock time `now`. No-op unless paused.
    ///
    /// Paced ticks pick up where the active timeline stopped; in unlimited mode anything
    /// written during the pause is due on the very next tick.
    pub fn resume_at(&mut self, now: f64) {
        if self.lifecycle != Lifecycle::Open || !self.time.is_paused() {
            return;
        }
        let paused = self.time.resume(now);
        debug!(?paused, total_paused = ?self.time.paused_total(), "resuming");
    }

    pub fn set_rate(&mut self, rate: f64) -> Result<(), PaceError> {
        let now = self.clock.now();
        self.set_rate_at(rate, now)
    }

    /// Changes the rate at clock time `now` without a discontinuity.
    ///
    /// The expected-bytes curve is re-anchored at its current value, so the new rate only
    /// governs bytes owed from `now` on. While paused the active timeline is frozen and the
    /// new rate effectively starts at the resume.
    pub fn set_rate_at(&mut self, rate: f64, now: f64) -> Result<(), PaceError> {
        check_rate(rate)?;
        if self.lifecycle == Lifecycle::Destroyed {
            return Ok(());
        }
        let active = self.time.active_nanos(now);
        let was_unlimited = self.anchor.is_unlimited();
        self.anchor = self.anchor.rebase(rate, active, self.passed);
        if was_unlimited && !self.anchor.is_unlimited() {
            // switching to timer-driven mode, evaluate right away
            self.next_tick = active;
        }
        debug!(
            rate,
            expected = self.anchor.expected_at(active),
            passed = self.passed,
            "rate changed"
        );
        Ok(())
    }

    pub fn set_period(&mut self, period: Duration) -> Result<(), PaceError> {
        let now = self.clock.now();
        self.set_period_at(period, now)
    }

    /// Changes the tick cadence. Byte accounting is time based and is left untouched; the
    /// pending tick moves to the next boundary of the new period.
    pub fn set_period_at(&mut self, period: Duration, now: f64) -> Result<(), PaceError> {
        check_period(period)?;
        if self.lifecycle == Lifecycle::Destroyed {
            return Ok(());
        }
        self.period = period;
        let active = self.time.active_nanos(now);
        self.next_tick = active + self.until_next_boundary(active);
        debug!(?period, "period changed");
        Ok(())
    }

    pub fn tick(&mut self) -> Tick {
        let now = self.clock.now();
        self.tick_at(now)
    }

    /// Attempts one emission at clock time `now`.
    ///
    /// In paced mode this is a no-op returning [`Tick::Wait`] until the pending period
    /// boundary is reached; calling it early or often is harmless. Bytes are only taken out
    /// of the queue when returned, so a consumer that stops calling simply leaves them
    /// queued for a later, larger burst.
    pub fn tick_at(&mut self, now: f64) -> Tick {
        if unlikely(self.lifecycle != Lifecycle::Open) {
            return Tick::Closed;
        }
        if self.time.is_paused() {
            return Tick::Paused;
        }
        let active = self.time.active_nanos(now);

        if self.anchor.is_unlimited() {
            return match self.buffer.read_all() {
                Some(chunk) => self.emit(chunk, active),
                None if self.buffer.is_finished() => self.finish(),
                None => Tick::Wait(Trigger::Readable),
            };
        }

        if self.buffer.is_finished() {
            return self.finish();
        }
        if active < self.next_tick {
            return Tick::Wait(Trigger::After(Duration::from_nanos(
                self.next_tick - active,
            )));
        }

        let wait = self.until_next_boundary(active);
        self.next_tick = active + wait;
        let until_next = Duration::from_nanos(wait);

        let expected = self.anchor.expected_at(active);
        let due = expected.saturating_sub(self.passed);
        if due == 0 {
            trace!(expected, passed = self.passed, "nothing due");
            return Tick::Wait(Trigger::After(until_next));
        }
        let due = usize::try_from(due).unwrap_or(usize::MAX);
        match self.buffer.read(due) {
            Some(chunk) => {
                trace!(due, emitted = chunk.len(), next = ?until_next, "tick");
                self.emit(chunk, active)
            }
            None => {
                trace!(due, "input not keeping up");
                Tick::Wait(Trigger::After(until_next))
            }
        }
    }

    /// Current rate in bytes per second. Still reports the last rate after a destroy.
    pub fn rate(&self) -> f64 {
        self.anchor.rate()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether emission is suspended. Always `false` once destroyed; use
    /// [`phase`](Self::phase) to tell a destroyed pacer from a live one.
    pub fn stream_paused(&self) -> bool {
        self.lifecycle != Lifecycle::Destroyed && self.time.is_paused()
    }

    /// Lifecycle as seen from outside; [`Phase::Destroyed`] is the authoritative sign of a
    /// torn-down pacer.
    pub fn phase(&self) -> Phase {
        match self.lifecycle {
            Lifecycle::Destroyed => Phase::Destroyed,
            Lifecycle::Terminated => Phase::Terminated,
            Lifecycle::Open if self.time.is_paused() => Phase::Paused,
            Lifecycle::Open if self.buffer.is_ended() => Phase::Draining,
            Lifecycle::Open => Phase::Running,
        }
    }

    /// Active time the data flowed: from construction to the last delivered chunk, paused
    /// intervals excluded.
    pub fn total_time(&self) -> Result<Duration, PaceError> {
        if self.lifecycle == Lifecycle::Destroyed {
            return Err(PaceError::Destroyed);
        }
        Ok(self.time.total_time())
    }

    /// Whether [`write`](Self::write) would queue bytes: not ended, terminated or destroyed.
    pub fn accepts_input(&self) -> bool {
        self.lifecycle == Lifecycle::Open && !self.buffer.is_ended()
    }

    /// Total bytes delivered so far.
    pub fn passed_bytes(&self) -> u64 {
        self.passed
    }

    /// Bytes written but not delivered yet.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Cumulative bytes the current rate allows by clock time `now`.
    pub fn expected_bytes_at(&self, now: f64) -> u64 {
        self.anchor.expected_at(self.time.active_nanos(now))
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn emit(&mut self, chunk: Bytes, active: u64) -> Tick {
        self.passed += chunk.len() as u64;
        self.time.record_activity(active);
        Tick::Data(chunk)
    }

    fn finish(&mut self) -> Tick {
        self.lifecycle = Lifecycle::Terminated;
        debug!(
            passed = self.passed,
            total_time = ?self.time.total_time(),
            "drained"
        );
        Tick::End
    }

    /// Nanoseconds to the next multiple of the period on the active timeline, so late ticks
    /// do not accumulate drift.
    fn until_next_boundary(&self, active: u64) -> u64 {
        let period = period_nanos(self.period);
        period - active % period
    }
}

fn period_nanos(period: Duration) -> u64 {
    u64::try_from(period.as_nanos()).unwrap_or(u64::MAX)
}
