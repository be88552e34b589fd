//! Per-connection byte accumulator for contiguous recv data.
//!
//! The dispatcher always sees a contiguous buffer. Unconsumed bytes (an
//! incomplete trailing reply) are put back after each parsing pass.

use std::io::{self, Read};

use bytes::{Bytes, BytesMut};

pub(crate) struct RecvAccumulator {
    buf: BytesMut,
}

impl RecvAccumulator {
    /// Create a new accumulator with the given initial capacity.
    pub fn new(capacity: usize) -> Self {
        RecvAccumulator {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Append received bytes. Grows the buffer if necessary.
    #[cfg(test)]
    pub fn append(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Read up to `chunk` bytes from `reader` straight into the buffer.
    ///
    /// Returns what the reader returned; on error the buffer is unchanged.
    pub fn fill_from<R: Read + ?Sized>(
        &mut self,
        reader: &mut R,
        chunk: usize,
    ) -> io::Result<usize> {
        let start = self.buf.len();
        self.buf.resize(start + chunk, 0);
        let result = reader.read(&mut self.buf[start..]);
        let filled = *result.as_ref().unwrap_or(&0);
        self.buf.truncate(start + filled);
        result
    }

    /// Get a reference to the accumulated data.
    #[cfg(test)]
    pub fn data(&self) -> &[u8] {
        &self.buf[..]
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Reset the accumulator (discard all data).
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Detach the buffer as a frozen `Bytes` (O(1)).
    ///
    /// The accumulator is left empty. Use `prepend()` to put back
    /// any unconsumed remainder after zero-copy parsing.
    pub fn take_frozen(&mut self) -> Bytes {
        std::mem::take(&mut self.buf).freeze()
    }

    /// Put unconsumed data back in front of anything buffered since.
    pub fn prepend(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        if self.buf.is_empty() {
            self.buf.extend_from_slice(data);
        } else {
            let mut new_buf = BytesMut::with_capacity(data.len() + self.buf.len());
            new_buf.extend_from_slice(data);
            new_buf.extend_from_slice(&self.buf);
            self.buf = new_buf;
        }
    }
}
