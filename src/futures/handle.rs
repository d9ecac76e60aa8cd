use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use bytes::Bytes;
use tokio::io::AsyncWrite;

use crate::{Clock, PaceError, Pacer, Phase};

/// Engine state shared by the producer side and the consumer stream.
///
/// One mutex around the whole engine serializes every write, tick and controller call.
pub(super) struct Shared<C> {
    pub pacer: Pacer<C>,
    consumer: Option<Waker>,
}

impl<C> Shared<C> {
    /// Remembers the consumer task so the next mutation can re-run its tick.
    pub fn park(&mut self, waker: &Waker) {
        let parked = self.consumer.as_ref().is_some_and(|w| w.will_wake(waker));
        if !parked {
            self.consumer = Some(waker.clone());
        }
    }

    fn wake(&mut self) {
        if let Some(waker) = self.consumer.take() {
            waker.wake();
        }
    }
}

pub(super) type SharedPacer<C> = Arc<Mutex<Shared<C>>>;

pub(super) fn new_shared<C>(pacer: Pacer<C>) -> SharedPacer<C> {
    Arc::new(Mutex::new(Shared {
        pacer,
        consumer: None,
    }))
}

pub(super) fn lock<C>(shared: &Mutex<Shared<C>>) -> MutexGuard<'_, Shared<C>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Producer and controller side of a paced stream.
///
/// Cheap to clone; every clone drives the same engine. Each mutating call wakes the
/// consumer so that a new trigger (timer or readable) takes effect immediately.
pub struct PacerHandle<C> {
    shared: SharedPacer<C>,
}

impl<C> Clone for PacerHandle<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: Clock> PacerHandle<C> {
    pub(super) fn new(shared: SharedPacer<C>) -> Self {
        Self { shared }
    }

    fn update<T>(&self, f: impl FnOnce(&mut Pacer<C>) -> T) -> T {
        let mut shared = lock(&self.shared);
        let out = f(&mut shared.pacer);
        shared.wake();
        out
    }

    fn read<T>(&self, f: impl FnOnce(&Pacer<C>) -> T) -> T {
        f(&lock(&self.shared).pacer)
    }

    /// Queues bytes for the consumer. See [`Pacer::write`].
    pub fn write(&self, bytes: impl Into<Bytes>) -> Result<(), PaceError> {
        let bytes = bytes.into();
        self.update(|pacer| pacer.write(bytes))
    }

    /// Signals the end of the input; the stream yields [`Event::End`](super::Event::End)
    /// once everything queued has been paced out.
    pub fn end(&self) {
        self.update(Pacer::end)
    }

    pub fn pause_stream(&self) {
        self.update(Pacer::pause)
    }

    pub fn resume_stream(&self) {
        self.update(Pacer::resume)
    }

    /// Tears the stream down. The consumer stream terminates without an end event.
    pub fn destroy(&self) {
        self.update(Pacer::destroy)
    }

    pub fn set_rate(&self, rate: f64) -> Result<(), PaceError> {
        self.update(|pacer| pacer.set_rate(rate))
    }

    pub fn set_period(&self, period: Duration) -> Result<(), PaceError> {
        self.update(|pacer| pacer.set_period(period))
    }

    pub fn rate(&self) -> f64 {
        self.read(Pacer::rate)
    }

    pub fn period(&self) -> Duration {
        self.read(Pacer::period)
    }

    pub fn stream_paused(&self) -> bool {
        self.read(Pacer::stream_paused)
    }

    pub fn phase(&self) -> Phase {
        self.read(Pacer::phase)
    }

    pub fn total_time(&self) -> Result<Duration, PaceError> {
        self.read(Pacer::total_time)
    }

    pub fn passed_bytes(&self) -> u64 {
        self.read(Pacer::passed_bytes)
    }

    pub fn buffered(&self) -> usize {
        self.read(Pacer::buffered)
    }

    /// See [`Pacer::accepts_input`].
    pub fn accepts_input(&self) -> bool {
        self.read(Pacer::accepts_input)
    }

    /// An [`AsyncWrite`] feeding this stream; shutting it down ends the input.
    pub fn writer(&self) -> PacedWriter<C> {
        PacedWriter {
            handle: self.clone(),
        }
    }
}

/// [`AsyncWrite`] producer for a paced stream.
///
/// Writes are queued without blocking and always accepted whole. `poll_shutdown` signals the
/// end of the input; writing afterwards fails with [`io::ErrorKind::BrokenPipe`].
pub struct PacedWriter<C> {
    handle: PacerHandle<C>,
}

impl<C: Clock> AsyncWrite for PacedWriter<C> {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.handle.write(Bytes::copy_from_slice(buf))?;
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.handle.end();
        Poll::Ready(Ok(()))
    }
}
