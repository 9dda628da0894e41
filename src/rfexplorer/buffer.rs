//! Receive accumulation buffer for the analyzer serial link.
//!
//! Bytes arrive from the port in whatever chunk sizes the driver hands us. They are appended
//! here and only leave through [`FrameBuffer::consume`], once the framer has attributed them
//! to a decoded frame or to skipped garbage.
use bytes::{Buf, BytesMut};

/// Append-only byte accumulator with explicit front consumption.
#[derive(Debug)]
pub struct FrameBuffer {
    buf: BytesMut,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(4096),
        }
    }

    /// Append a freshly received chunk to the tail.
    pub fn ingest(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Drop the first `n` bytes. Consuming more than is buffered empties the buffer.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.buf.len());
        self.buf.advance(n);
    }

    /// Remove and return the first `n` bytes.
    pub fn take(&mut self, n: usize) -> Vec<u8> {
        let n = n.min(self.buf.len());
        self.buf.split_to(n).to_vec()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::FrameBuffer;

    #[test]
    fn ingest_appends_in_order() {
        let mut buf = FrameBuffer::new();
        buf.ingest(b"$S");
        buf.ingest(&[3, 10]);
        assert_eq!(buf.as_slice(), &[b'$', b'S', 3, 10]);
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn consume_drops_prefix_only() {
        let mut buf = FrameBuffer::new();
        buf.ingest(b"junk#Sn123\r\n");
        buf.consume(4);
        assert_eq!(buf.as_slice(), b"#Sn123\r\n");
        let head = buf.take(3);
        assert_eq!(head, b"#Sn");
        assert_eq!(buf.as_slice(), b"123\r\n");
    }

    #[test]
    fn over_consume_empties() {
        let mut buf = FrameBuffer::new();
        buf.ingest(b"abc");
        buf.consume(10);
        assert!(buf.is_empty());
    }
}
