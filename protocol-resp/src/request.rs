//! Client-side command framing.
//!
//! Commands are encoded as RESP arrays of bulk strings:
//! `*<argc>\r\n` followed by `$<len>\r\n<arg>\r\n` per argument.

use bytes::BufMut;

use crate::value::{bulk_len, header_len, put_bulk, put_header};

/// A command to be framed for the wire.
///
/// # Example
///
/// ```
/// use protocol_resp::Request;
///
/// let mut buf = vec![0u8; 64];
/// let len = Request::cmd(b"INCR").arg(b"counter").encode(&mut buf);
/// assert_eq!(&buf[..len], b"*2\r\n$4\r\nINCR\r\n$7\r\ncounter\r\n");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request<'a> {
    args: Vec<&'a [u8]>,
}

impl<'a> Request<'a> {
    /// Create a new request with the given arguments.
    #[inline]
    pub fn new(args: Vec<&'a [u8]>) -> Self {
        Self { args }
    }

    /// Create a request whose first argument is the command name.
    #[inline]
    pub fn cmd(name: &'a [u8]) -> Self {
        Self { args: vec![name] }
    }

    /// Add an argument to the command.
    #[inline]
    pub fn arg(mut self, arg: &'a [u8]) -> Self {
        self.args.push(arg);
        self
    }

    /// The arguments of this request, command name first.
    #[inline]
    pub fn args(&self) -> &[&'a [u8]] {
        &self.args
    }

    /// Number of arguments, including the command name.
    #[inline]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Returns true if the request has no arguments at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Encode this request into a buffer.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is too small.
    pub fn encode(&self, buf: &mut [u8]) -> usize {
        let capacity = buf.len();
        let mut out = buf;
        self.encode_into(&mut out);
        capacity - out.len()
    }

    /// Append the framed request to `out`.
    pub fn encode_into<B: BufMut>(&self, out: &mut B) {
        put_header(out, b'*', self.args.len());
        for arg in &self.args {
            put_bulk(out, arg);
        }
    }

    /// Calculate the encoded length of this request.
    pub fn encoded_len(&self) -> usize {
        header_len(self.args.len()) + self.args.iter().map(|a| bulk_len(a.len())).sum::<usize>()
    }
}
