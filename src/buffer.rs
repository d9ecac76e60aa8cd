use std::collections::VecDeque;

use bytes::{Buf, Bytes, BytesMut};

/// FIFO queue of written but not yet emitted bytes.
///
/// Writes are kept as the producer's own chunks so that a read fitting inside the head chunk
/// is a zero-copy split; reads spanning several chunks are coalesced into one allocation.
#[derive(Debug, Default)]
pub(crate) struct ByteBuffer {
    chunks: VecDeque<Bytes>,
    len: usize,
    ended: bool,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the tail. Empty writes are ignored.
    pub fn write(&mut self, bytes: Bytes) {
        if bytes.is_empty() {
            return;
        }
        self.len += bytes.len();
        self.chunks.push_back(bytes);
    }

    /// Removes up to `max` bytes from the head.
    pub fn read(&mut self, max: usize) -> Option<Bytes> {
        if self.len == 0 || max == 0 {
            return None;
        }
        let want = max.min(self.len);
        self.len -= want;

        let head = self.chunks.front_mut()?;
        if head.len() > want {
            return Some(head.split_to(want));
        }
        if head.len() == want {
            return self.chunks.pop_front();
        }

        let mut out = BytesMut::with_capacity(want);
        while out.len() < want {
            let Some(head) = self.chunks.front_mut() else {
                break;
            };
            let take = (want - out.len()).min(head.len());
            out.extend_from_slice(&head[..take]);
            head.advance(take);
            if head.is_empty() {
                self.chunks.pop_front();
            }
        }
        Some(out.freeze())
    }

    /// Drains everything currently held.
    pub fn read_all(&mut self) -> Option<Bytes> {
        self.read(self.len)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Marks that no more writes will arrive.
    pub fn signal_end(&mut self) {
        self.ended = true;
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Input ended and every byte has been read out.
    pub fn is_finished(&self) -> bool {
        self.ended && self.len == 0
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_fifo_across_chunks() {
        let mut buf = ByteBuffer::new();
        buf.write(Bytes::from_static(b"hello"));
        buf.write(Bytes::from_static(b" "));
        buf.write(Bytes::from_static(b"world"));
        assert_eq!(11, buf.len());

        assert_eq!(&b"he"[..], buf.read(2).unwrap());
        assert_eq!(&b"llo w"[..], buf.read(5).unwrap());
        assert_eq!(4, buf.len());
        assert_eq!(&b"orld"[..], buf.read(100).unwrap());
        assert_eq!(0, buf.len());
        assert!(buf.read(1).is_none());
    }

    #[test]
    fn read_all_drains_everything() {
        let mut buf = ByteBuffer::new();
        buf.write(Bytes::from_static(b"abc"));
        buf.write(Bytes::new());
        buf.write(Bytes::from_static(b"def"));
        assert_eq!(&b"abcdef"[..], buf.read_all().unwrap());
        assert!(buf.read_all().is_none());
    }

    #[test]
    fn finished_only_once_ended_and_empty() {
        let mut buf = ByteBuffer::new();
        buf.write(Bytes::from_static(b"xy"));
        buf.signal_end();
        assert!(buf.is_ended());
        assert!(!buf.is_finished());
        buf.read(1);
        assert!(!buf.is_finished());
        buf.read(1);
        assert!(buf.is_finished());
    }

    #[test]
    fn zero_sized_read_takes_nothing() {
        let mut buf = ByteBuffer::new();
        buf.write(Bytes::from_static(b"abc"));
        assert!(buf.read(0).is_none());
        assert_eq!(3, buf.len());
    }
}
