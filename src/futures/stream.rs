use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use pin_project_lite::pin_project;
use tracing::{debug, warn};

use super::handle::{PacerHandle, SharedPacer, lock};
use super::timer::{Sleep, rearm};
use crate::{Clock, Tick, Trigger};

/// Upstream bytes buffered before [`Paced`] stops pulling from its source.
pub const DEFAULT_HIGH_WATER_MARK: usize = 16 * 1024;

/// Notification delivered to the consumer of a paced stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// One burst of bytes, in the order they were written.
    Data(Bytes),
    /// The input ended and every byte was delivered. Never follows a destroy.
    End,
}

/// Runs ticks until one yields something or the task has to wait for a trigger.
///
/// The consumer waker is parked under the same lock as the tick, so a write, resume or rate
/// change racing with this poll always re-runs it.
fn poll_event<C: Clock>(
    shared: &SharedPacer<C>,
    delay: &mut Option<Pin<Box<Sleep>>>,
    cx: &mut Context<'_>,
) -> Poll<Option<Event>> {
    loop {
        let tick = {
            let mut shared = lock(shared);
            let tick = shared.pacer.tick();
            if matches!(tick, Tick::Wait(_) | Tick::Paused) {
                shared.park(cx.waker());
            }
            tick
        };
        match tick {
            Tick::Data(chunk) => return Poll::Ready(Some(Event::Data(chunk))),
            Tick::End => return Poll::Ready(Some(Event::End)),
            Tick::Closed => return Poll::Ready(None),
            Tick::Paused | Tick::Wait(Trigger::Readable) => {
                *delay = None;
                return Poll::Pending;
            }
            Tick::Wait(Trigger::After(after)) => {
                rearm(delay, after);
                if let Some(sleep) = delay.as_mut() {
                    if sleep.as_mut().poll(cx).is_pending() {
                        return Poll::Pending;
                    }
                }
            }
        }
    }
}

/// Consumer side of a paced stream, created by [`paced`](super::paced).
///
/// Yields [`Event::Data`] bursts at the configured rate and a single [`Event::End`] after
/// the input ended and drained, then `None`. A destroyed stream yields `None` without an
/// end event. While paused the stream stays pending.
///
/// Backpressure is implicit: bytes are only taken from the queue when the stream is
/// polled, so a slow consumer receives larger bursts later instead of losing data.
///
/// The timer is boxed, so the stream is `Unpin` and can be polled in place.
pub struct PacedStream<C> {
    shared: SharedPacer<C>,
    delay: Option<Pin<Box<Sleep>>>,
    done: bool,
}

impl<C: Clock> PacedStream<C> {
    pub(super) fn new(shared: SharedPacer<C>) -> Self {
        Self {
            shared,
            delay: None,
            done: false,
        }
    }

    /// A handle controlling this stream.
    pub fn handle(&self) -> PacerHandle<C> {
        PacerHandle::new(self.shared.clone())
    }

    /// Plain byte stream: the same bursts, ending with `None` instead of [`Event::End`].
    pub fn into_bytes_stream(self) -> impl Stream<Item = Bytes> {
        futures::StreamExt::filter_map(self, |event| {
            futures::future::ready(match event {
                Event::Data(chunk) => Some(chunk),
                Event::End => None,
            })
        })
    }
}

impl<C: Clock> Stream for PacedStream<C> {
    type Item = Event;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        let event = std::task::ready!(poll_event(&this.shared, &mut this.delay, cx));
        if !matches!(event, Some(Event::Data(_))) {
            this.done = true;
        }
        Poll::Ready(event)
    }
}

pin_project! {
    /// Paces the bytes of an upstream stream, created by
    /// [`PaceStreamExt::paced`](super::PaceStreamExt::paced).
    ///
    /// The upstream is pulled eagerly until [`DEFAULT_HIGH_WATER_MARK`] (or the configured
    /// mark) bytes are queued; its end becomes the end of the input. Pulling stops for good
    /// once the pacer no longer accepts input, e.g. after [`PacerHandle::end`] or
    /// [`PacerHandle::destroy`] through [`handle`](Self::handle).
    pub struct Paced<S, C> {
        #[pin]
        upstream: S,
        upstream_done: bool,
        high_water_mark: usize,
        inner: PacedStream<C>,
    }
}

impl<S, C: Clock> Paced<S, C> {
    pub(super) fn new(upstream: S, inner: PacedStream<C>) -> Self {
        Self {
            upstream,
            upstream_done: false,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            inner,
        }
    }

    /// Stops pulling from upstream while at least `bytes` are queued.
    pub fn with_high_water_mark(mut self, bytes: usize) -> Self {
        self.high_water_mark = bytes.max(1);
        self
    }

    pub fn handle(&self) -> PacerHandle<C> {
        self.inner.handle()
    }
}

impl<S, C> Stream for Paced<S, C>
where
    S: Stream,
    S::Item: Into<Bytes>,
    C: Clock,
{
    type Item = Event;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        if !*this.upstream_done {
            let handle = this.inner.handle();
            while handle.buffered() < *this.high_water_mark {
                if !handle.accepts_input() {
                    debug!(phase = ?handle.phase(), "input closed, no longer pulling upstream");
                    *this.upstream_done = true;
                    break;
                }
                match this.upstream.as_mut().poll_next(cx) {
                    Poll::Ready(Some(chunk)) => {
                        let chunk: Bytes = chunk.into();
                        let len = chunk.len();
                        if let Err(err) = handle.write(chunk) {
                            warn!(%err, len, "upstream chunk rejected");
                            *this.upstream_done = true;
                            break;
                        }
                    }
                    Poll::Ready(None) => {
                        handle.end();
                        *this.upstream_done = true;
                        break;
                    }
                    Poll::Pending => break,
                }
            }
        }
        Pin::new(this.inner).poll_next(cx)
    }
}
