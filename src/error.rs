use std::fmt::{Debug, Display, Formatter};
use std::time::Duration;

/// Errors reported by a [`Pacer`](crate::Pacer) and its adapters.
///
/// The only failure mode is caller misuse; nothing here is retryable.
#[derive(Clone, PartialEq)]
pub enum PaceError {
    /// The rate is negative or not a finite number.
    InvalidRate(f64),
    /// The period is zero.
    InvalidPeriod(Duration),
    /// The producer wrote after signalling the end of its input.
    WriteAfterEnd,
    /// The pacer was destroyed; the requested value no longer describes a live stream.
    Destroyed,
}

impl Debug for PaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRate(rate) => write!(f, "InvalidRate({rate})"),
            Self::InvalidPeriod(period) => write!(f, "InvalidPeriod({period:?})"),
            Self::WriteAfterEnd => write!(f, "WriteAfterEnd"),
            Self::Destroyed => write!(f, "Destroyed"),
        }
    }
}

impl Display for PaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRate(rate) => write!(
                f,
                "invalid rate {rate}; expected a finite number of bytes per second >= 0"
            ),
            Self::InvalidPeriod(period) => {
                write!(f, "invalid period {period:?}; the period must be positive")
            }
            Self::WriteAfterEnd => write!(f, "write after end of input"),
            Self::Destroyed => write!(f, "stream destroyed"),
        }
    }
}

impl std::error::Error for PaceError {}

impl From<PaceError> for std::io::Error {
    fn from(err: PaceError) -> Self {
        let kind = match err {
            PaceError::WriteAfterEnd | PaceError::Destroyed => std::io::ErrorKind::BrokenPipe,
            PaceError::InvalidRate(_) | PaceError::InvalidPeriod(_) => {
                std::io::ErrorKind::InvalidInput
            }
        };
        std::io::Error::new(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_rate() {
        assert_eq!(
            "invalid rate -1; expected a finite number of bytes per second >= 0",
            PaceError::InvalidRate(-1.0).to_string()
        );
    }

    #[test]
    fn display_invalid_period() {
        assert_eq!(
            "invalid period 0ns; the period must be positive",
            PaceError::InvalidPeriod(Duration::ZERO).to_string()
        );
    }

    #[test]
    fn write_after_end_is_a_broken_pipe() {
        let err: std::io::Error = PaceError::WriteAfterEnd.into();
        assert_eq!(std::io::ErrorKind::BrokenPipe, err.kind());
        assert_eq!("write after end of input", err.to_string());
    }
}
