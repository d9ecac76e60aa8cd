#![doc = include_str!("../README.md")]
//!
//! # Core Components
//!
//! - [`Pacer`] - The pacing engine: byte queue, rate anchor and active-time accounting
//! - [`PaceConfig`] - Rate (bytes per second) and burst period
//! - [`Clock`] trait and implementations for time sources
//! - [`futures`] - Async producer handle, consumer stream and stream adapter (feature `async`)
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tempo_stream::{ManualClock, PaceConfig, Pacer, Tick};
//!
//! let clock = Arc::new(ManualClock::default());
//! let mut pacer = Pacer::with_clock(PaceConfig::per_second(10.0), Arc::clone(&clock)).unwrap();
//! pacer.write(&b"hello world"[..]).unwrap();
//! pacer.end();
//!
//! let mut out = Vec::new();
//! loop {
//!     match pacer.tick() {
//!         Tick::Data(chunk) => out.extend_from_slice(&chunk),
//!         Tick::Wait(_) => clock.advance_ms(100),
//!         Tick::End => break,
//!         other => unreachable!("{other:?}"),
//!     }
//! }
//! assert_eq!(b"hello world", &out[..]);
//! // 11 bytes at 10 bytes per second
//! assert_eq!(1.1, pacer.total_time().unwrap().as_secs_f64());
//! ```

mod accounting;
mod buffer;
mod clock;
mod config;
mod error;
#[cfg(feature = "async")]
pub mod futures;
mod pacer;

#[cfg(feature = "tokio")]
pub use clock::TokioClock;
pub use clock::{Clock, ManualClock, StdClock};
#[cfg(feature = "quanta")]
pub use clock::{FastClock, QuantaClock};
pub use config::PaceConfig;
pub use error::PaceError;
pub use pacer::{Pacer, Phase, Tick, Trigger};
