use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Monotonic time source driving a [`Pacer`](crate::Pacer).
///
/// Every timestamp the pacer stores (start, anchor, last activity, pause start) is a value
/// returned by this trait. Implementations must never go backwards.
pub trait Clock {
    /// Seconds elapsed since an arbitrary, fixed origin.
    fn now(&self) -> f64;
}

/// Wall clock backed by [`std::time::Instant`].
///
/// This is the default clock of [`Pacer`](crate::Pacer) and is appropriate outside of an
/// async runtime or when the runtime's clock is never paused.
#[derive(Clone)]
pub struct StdClock {
    origin: std::time::Instant,
}

impl Default for StdClock {
    fn default() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

impl Clock for StdClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock backed by [`tokio::time::Instant`].
///
/// Use this with the async adapters: when the runtime clock is paused (for instance under
/// `#[tokio::test(start_paused = true)]`) pacing follows the virtual time and stays
/// deterministic.
#[cfg(feature = "tokio")]
#[derive(Clone)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

#[cfg(feature = "tokio")]
impl Default for TokioClock {
    fn default() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

#[cfg(feature = "tokio")]
impl Clock for TokioClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Precise clock reading the TSC through `quanta`.
#[cfg(feature = "quanta")]
#[derive(Clone)]
pub struct QuantaClock {
    origin: quanta::Instant,
}

#[cfg(feature = "quanta")]
impl Default for QuantaClock {
    fn default() -> Self {
        Self::new(quanta::Clock::new())
    }
}

#[cfg(feature = "quanta")]
impl QuantaClock {
    pub fn new(clock: quanta::Clock) -> Self {
        Self {
            origin: clock.now(),
        }
    }
}

#[cfg(feature = "quanta")]
impl Clock for QuantaClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Coarse `quanta` clock, refreshed by quanta's upkeep thread.
///
/// Reads are cheap but only as fresh as the upkeep interval. With a 100ms pacing period an
/// upkeep interval of one millisecond is more than enough; make sure the upkeep thread is
/// running or the pacer will never see time advance.
#[cfg(feature = "quanta")]
#[derive(Clone)]
pub struct FastClock {
    clock: quanta::Clock,
    origin: quanta::Instant,
}

#[cfg(feature = "quanta")]
impl Default for FastClock {
    fn default() -> Self {
        Self::new(quanta::Clock::new())
    }
}

#[cfg(feature = "quanta")]
impl FastClock {
    pub fn new(clock: quanta::Clock) -> Self {
        let origin = clock.recent();
        Self { clock, origin }
    }
}

#[cfg(feature = "quanta")]
impl Clock for FastClock {
    fn now(&self) -> f64 {
        (self.clock.recent() - self.origin).as_secs_f64()
    }
}

/// Hand-driven clock for tests and simulations.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use tempo_stream::{Clock, ManualClock};
///
/// let clock = Arc::new(ManualClock::default());
/// clock.advance(Duration::from_millis(250));
/// assert_eq!(0.25, clock.now());
/// ```
#[derive(Default)]
pub struct ManualClock {
    now: Mutex<f64>,
}

impl ManualClock {
    pub fn new(now: f64) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Jumps to an absolute time, in seconds.
    pub fn set(&self, now: f64) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, delta: Duration) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) += delta.as_secs_f64();
    }

    pub fn advance_ms(&self, millis: u64) {
        self.advance(Duration::from_millis(millis))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> f64 {
        (**self).now()
    }
}
