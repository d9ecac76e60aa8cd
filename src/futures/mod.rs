//! Async adapters driving a [`Pacer`] with tokio timers.
//!
//! [`paced`] splits a pacer into a [`PacerHandle`] (producer and controls) and a
//! [`PacedStream`] (consumer). [`PaceStreamExt::paced`] wraps an existing byte stream instead.

mod handle;
mod stream;
mod timer;

pub use handle::{PacedWriter, PacerHandle};
pub use stream::{DEFAULT_HIGH_WATER_MARK, Event, Paced, PacedStream};

use bytes::Bytes;
use futures::Stream;

use crate::{Clock, PaceConfig, PaceError, Pacer, TokioClock};

/// Creates a paced stream timed by the tokio clock.
///
/// # Examples
///
/// ```rust
/// use futures::StreamExt;
/// use tempo_stream::PaceConfig;
/// use tempo_stream::futures::{Event, paced};
///
/// # #[tokio::main(flavor = "current_thread", start_paused = true)]
/// # async fn main() {
/// let (handle, mut stream) = paced(PaceConfig::per_second(1000.0)).unwrap();
/// handle.write(vec![7u8; 300]).unwrap();
/// handle.end();
///
/// let mut received = 0;
/// while let Some(Event::Data(chunk)) = stream.next().await {
///     received += chunk.len();
/// }
/// assert_eq!(300, received);
/// # }
/// ```
pub fn paced(
    config: PaceConfig,
) -> Result<(PacerHandle<TokioClock>, PacedStream<TokioClock>), PaceError> {
    paced_with_clock(config, TokioClock::default())
}

pub fn paced_with_clock<C: Clock>(
    config: PaceConfig,
    clock: C,
) -> Result<(PacerHandle<C>, PacedStream<C>), PaceError> {
    let stream = PacedStream::new(handle::new_shared(Pacer::with_clock(config, clock)?));
    Ok((stream.handle(), stream))
}

pub trait PaceStreamExt: Stream + Sized
where
    Self::Item: Into<Bytes>,
{
    /// Re-emits the bytes of this stream at the rate described by `config`.
    fn paced(self, config: PaceConfig) -> Result<Paced<Self, TokioClock>, PaceError>;
}

impl<S> PaceStreamExt for S
where
    S: Stream,
    S::Item: Into<Bytes>,
{
    fn paced(self, config: PaceConfig) -> Result<Paced<Self, TokioClock>, PaceError> {
        let (_, stream) = paced(config)?;
        Ok(Paced::new(self, stream))
    }
}
