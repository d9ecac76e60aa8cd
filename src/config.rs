use std::num::NonZeroU64;
use std::time::Duration;

use crate::PaceError;

const DEFAULT_PERIOD: Duration = Duration::from_millis(100);

/// Rate and burst period of a paced stream.
///
/// The rate is the long-run average output in bytes per second; `0` disables pacing and
/// turns the stream into a plain passthrough. The period is the spacing between bursts
/// while pacing is enabled.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use nonzero_ext::nonzero;
/// use tempo_stream::PaceConfig;
///
/// let config = PaceConfig::per_second(250_000.0).with_period_ms(nonzero!(50u64));
/// assert_eq!(250_000.0, config.rate_per_second());
/// assert_eq!(Duration::from_millis(50), config.period());
///
/// // unlimited passthrough, 100ms period
/// let config = PaceConfig::default();
/// assert!(config.is_unlimited());
/// ```
#[derive(Clone, Copy, PartialEq)]
pub struct PaceConfig {
    pub(crate) rate: f64,
    pub(crate) period: Duration,
}

impl std::fmt::Debug for PaceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PaceConfig(rate_per_second={}, period={:?})",
            self.rate, self.period
        )
    }
}

impl Default for PaceConfig {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl PaceConfig {
    /// No pacing: bytes are forwarded as soon as they are written.
    pub const fn unlimited() -> Self {
        Self {
            rate: 0.0,
            period: DEFAULT_PERIOD,
        }
    }

    /// Paces at `rate` bytes per second with the default 100ms period.
    ///
    /// The value is checked by [`validate`](Self::validate) when the pacer is built.
    pub const fn per_second(rate: f64) -> Self {
        Self {
            rate,
            period: DEFAULT_PERIOD,
        }
    }

    pub const fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub const fn with_period_ms(mut self, period: NonZeroU64) -> Self {
        self.period = Duration::from_millis(period.get());
        self
    }

    pub const fn rate_per_second(&self) -> f64 {
        self.rate
    }

    pub const fn period(&self) -> Duration {
        self.period
    }

    pub fn is_unlimited(&self) -> bool {
        self.rate == 0.0
    }

    /// Rejects a negative or non-finite rate and a zero period.
    pub fn validate(&self) -> Result<(), PaceError> {
        check_rate(self.rate)?;
        check_period(self.period)
    }
}

pub(crate) fn check_rate(rate: f64) -> Result<(), PaceError> {
    if rate.is_finite() && rate >= 0.0 {
        Ok(())
    } else {
        Err(PaceError::InvalidRate(rate))
    }
}

pub(crate) fn check_period(period: Duration) -> Result<(), PaceError> {
    if period.is_zero() {
        Err(PaceError::InvalidPeriod(period))
    } else {
        Ok(())
    }
}
