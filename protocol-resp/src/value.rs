//! RESP reply values and parsing/encoding.
//!
//! Reply types understood by the client:
//! - Status: `+OK\r\n`
//! - Error: `-ERR message\r\n`
//! - Integer: `:1000\r\n`
//! - Bulk string: `$6\r\nfoobar\r\n`
//! - Null bulk string: `$-1\r\n`
//! - Array: `*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n`
//! - Null array: `*-1\r\n`
//! - Nil: `_\r\n` (the RESP3 null, sent by servers speaking RESP3)
//!
//! The two null markers of RESP2 are kept apart from `Nil` and from their
//! empty counterparts: `$-1` is not `$0`, and `*-1` is not `*0`.

use bytes::{BufMut, Bytes};

use crate::error::ParseError;

/// Default maximum number of elements in a single array.
pub const DEFAULT_MAX_COLLECTION_ELEMENTS: usize = 1024 * 1024;

/// Default maximum size of a bulk string in bytes (512MB, the server-side
/// `proto-max-bulk-len` default).
pub const DEFAULT_MAX_BULK_STRING_LEN: usize = 512 * 1024 * 1024;

/// Default maximum nesting depth for arrays.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Default maximum total array elements across all levels of a single reply.
pub const DEFAULT_MAX_TOTAL_ITEMS: usize = 4 * 1024 * 1024;

/// Default maximum length of a single status, error, integer or header line.
pub const DEFAULT_MAX_LINE_LEN: usize = 64 * 1024;

/// Upper bound on up-front `Vec` reservation for a declared array length.
const PREALLOC_LIMIT: usize = 1024;

const CRLF: &[u8] = b"\r\n";

/// Configuration options for RESP value parsing.
///
/// The limits bound what a misbehaving peer can make the parser allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum number of elements in a single array.
    pub max_collection_elements: usize,
    /// Maximum size of a bulk string in bytes.
    pub max_bulk_string_len: usize,
    /// Maximum nesting depth for arrays.
    pub max_depth: usize,
    /// Maximum total array elements across all levels of a single parse.
    pub max_total_items: usize,
    /// Maximum length of a status, error, integer or header line, prefix
    /// byte included, CRLF excluded.
    pub max_line_len: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseOptions {
    /// Create new parse options with default values.
    pub const fn new() -> Self {
        Self {
            max_collection_elements: DEFAULT_MAX_COLLECTION_ELEMENTS,
            max_bulk_string_len: DEFAULT_MAX_BULK_STRING_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
            max_total_items: DEFAULT_MAX_TOTAL_ITEMS,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }

    /// Set the maximum collection element count.
    pub const fn max_collection_elements(mut self, count: usize) -> Self {
        self.max_collection_elements = count;
        self
    }

    /// Set the maximum bulk string length.
    pub const fn max_bulk_string_len(mut self, len: usize) -> Self {
        self.max_bulk_string_len = len;
        self
    }

    /// Set the maximum nesting depth.
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the maximum total items across all arrays.
    pub const fn max_total_items(mut self, count: usize) -> Self {
        self.max_total_items = count;
        self
    }

    /// Set the maximum line length.
    pub const fn max_line_len(mut self, len: usize) -> Self {
        self.max_line_len = len;
        self
    }
}

/// A decoded RESP reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Null: `_\r\n`
    Nil,
    /// Integer: `:1000\r\n`
    Integer(i64),
    /// Status (simple string): `+OK\r\n`
    Status(Bytes),
    /// Error: `-ERR message\r\n`
    Error(Bytes),
    /// Bulk string: `$6\r\nfoobar\r\n`. `None` is the null bulk string `$-1\r\n`.
    BulkString(Option<Bytes>),
    /// Array: `*2\r\n...`. `None` is the null array `*-1\r\n`.
    Array(Option<Vec<Value>>),
}

impl Value {
    /// Create a status value.
    #[inline]
    pub fn status(s: &[u8]) -> Self {
        Value::Status(Bytes::copy_from_slice(s))
    }

    /// Create an error value.
    #[inline]
    pub fn error(msg: &[u8]) -> Self {
        Value::Error(Bytes::copy_from_slice(msg))
    }

    /// Create an integer value.
    #[inline]
    pub fn integer(n: i64) -> Self {
        Value::Integer(n)
    }

    /// Create a bulk string value.
    #[inline]
    pub fn bulk_string(data: &[u8]) -> Self {
        Value::BulkString(Some(Bytes::copy_from_slice(data)))
    }

    /// Create a null bulk string (`$-1`).
    #[inline]
    pub fn null_bulk_string() -> Self {
        Value::BulkString(None)
    }

    /// Create an array value.
    #[inline]
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Some(elements))
    }

    /// Create a null array (`*-1`).
    #[inline]
    pub fn null_array() -> Self {
        Value::Array(None)
    }

    /// Returns true for any absent reply: `Nil`, `$-1` or `*-1`.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Value::Nil | Value::BulkString(None) | Value::Array(None)
        )
    }

    /// Returns true if this is an error reply.
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Returns the payload of a status, error or non-null bulk string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Status(s) | Value::Error(s) | Value::BulkString(Some(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer value, if this is an integer reply.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the elements of a non-null array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(Some(elements)) => Some(elements),
            _ => None,
        }
    }

    // ========================================================================
    // Parsing
    // ========================================================================

    /// Parse a RESP value from a byte buffer.
    ///
    /// Returns the parsed value and the number of bytes consumed. Payloads are
    /// copied out of `data`; use [`Value::parse_bytes`] to share the buffer.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Incomplete` if more data is needed to complete parsing.
    /// Returns other errors for malformed data.
    #[inline]
    pub fn parse(data: &[u8]) -> Result<(Self, usize), ParseError> {
        Self::parse_with_options(data, &ParseOptions::default())
    }

    /// Parse a RESP value from raw bytes with custom options.
    pub fn parse_with_options(
        data: &[u8],
        options: &ParseOptions,
    ) -> Result<(Self, usize), ParseError> {
        Parser::new(data, None, options).parse_value(0, 0)
    }

    /// Parse a RESP value zero-copy from a `Bytes` buffer.
    ///
    /// Payloads are returned as `Bytes::slice()` references into the input.
    #[inline]
    pub fn parse_bytes(data: &Bytes) -> Result<(Self, usize), ParseError> {
        Self::parse_bytes_with_options(data, &ParseOptions::default())
    }

    /// Parse a RESP value zero-copy from a `Bytes` buffer with custom options.
    pub fn parse_bytes_with_options(
        data: &Bytes,
        options: &ParseOptions,
    ) -> Result<(Self, usize), ParseError> {
        Parser::new(data, Some(data), options).parse_value(0, 0)
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    /// Encode this value into a byte buffer.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is too small. Use `encoded_len()` to check the required size.
    pub fn encode(&self, buf: &mut [u8]) -> usize {
        let capacity = buf.len();
        let mut out = buf;
        self.encode_into(&mut out);
        capacity - out.len()
    }

    /// Append the encoding of this value to `out`.
    pub fn encode_into<B: BufMut>(&self, out: &mut B) {
        match self {
            Value::Nil => out.put_slice(b"_\r\n"),
            Value::Integer(n) => put_header(out, b':', *n),
            Value::Status(s) => put_line(out, b'+', s),
            Value::Error(msg) => put_line(out, b'-', msg),
            Value::BulkString(None) => out.put_slice(b"$-1\r\n"),
            Value::BulkString(Some(data)) => put_bulk(out, data),
            Value::Array(None) => out.put_slice(b"*-1\r\n"),
            Value::Array(Some(elements)) => {
                put_header(out, b'*', elements.len());
                for element in elements {
                    element.encode_into(out);
                }
            }
        }
    }

    /// Calculate the encoded length of this value.
    pub fn encoded_len(&self) -> usize {
        match self {
            Value::Nil => 3,
            Value::Integer(n) => header_len(*n),
            Value::Status(s) | Value::Error(s) => 1 + s.len() + 2,
            Value::BulkString(None) | Value::Array(None) => 5,
            Value::BulkString(Some(data)) => bulk_len(data.len()),
            Value::Array(Some(elements)) => {
                header_len(elements.len()) + elements.iter().map(Value::encoded_len).sum::<usize>()
            }
        }
    }
}

// ============================================================================
// Encoding helpers
// ============================================================================

/// Write `<prefix><n>\r\n`.
pub(crate) fn put_header<B: BufMut, I: itoa::Integer>(out: &mut B, prefix: u8, n: I) {
    let mut digits = itoa::Buffer::new();
    out.put_u8(prefix);
    out.put_slice(digits.format(n).as_bytes());
    out.put_slice(CRLF);
}

/// Write `$<len>\r\n<data>\r\n`.
pub(crate) fn put_bulk<B: BufMut>(out: &mut B, data: &[u8]) {
    put_header(out, b'$', data.len());
    out.put_slice(data);
    out.put_slice(CRLF);
}

fn put_line<B: BufMut>(out: &mut B, prefix: u8, line: &[u8]) {
    out.put_u8(prefix);
    out.put_slice(line);
    out.put_slice(CRLF);
}

pub(crate) fn header_len<I: itoa::Integer>(n: I) -> usize {
    1 + itoa::Buffer::new().format(n).len() + 2
}

pub(crate) fn bulk_len(len: usize) -> usize {
    header_len(len) + len + 2
}

// ============================================================================
// Parsing helpers
// ============================================================================

/// Recursive-descent reply parser over one contiguous buffer.
///
/// Positions are absolute offsets into `data`. When `shared` is set it is the
/// same buffer as `data`, and payloads are sliced from it instead of copied.
struct Parser<'a> {
    data: &'a [u8],
    shared: Option<&'a Bytes>,
    options: &'a ParseOptions,
    total_items: usize,
}

impl<'a> Parser<'a> {
    fn new(data: &'a [u8], shared: Option<&'a Bytes>, options: &'a ParseOptions) -> Self {
        Self {
            data,
            shared,
            options,
            total_items: 0,
        }
    }

    fn payload(&self, start: usize, end: usize) -> Bytes {
        match self.shared {
            Some(bytes) => bytes.slice(start..end),
            None => Bytes::copy_from_slice(&self.data[start..end]),
        }
    }

    /// Offset of the `\r` terminating the line that starts at `pos`.
    ///
    /// Only the first `max_line_len + 2` bytes are scanned.
    fn line_end(&self, pos: usize) -> Result<usize, ParseError> {
        let rest = &self.data[pos..];
        let max = self.options.max_line_len;
        let window = &rest[..rest.len().min(max.saturating_add(2))];
        if let Some(i) =
            memchr::memchr_iter(b'\r', window).find(|&i| window.get(i + 1) == Some(&b'\n'))
        {
            return Ok(pos + i);
        }
        if rest.len() >= max.saturating_add(2) {
            return Err(ParseError::LineTooLong { max });
        }
        Err(ParseError::Incomplete)
    }

    fn parse_value(&mut self, pos: usize, depth: usize) -> Result<(Value, usize), ParseError> {
        let Some(&prefix) = self.data.get(pos) else {
            return Err(ParseError::Incomplete);
        };

        match prefix {
            b'+' => {
                let end = self.line_end(pos)?;
                Ok((Value::Status(self.payload(pos + 1, end)), end + 2))
            }
            b'-' => {
                let end = self.line_end(pos)?;
                Ok((Value::Error(self.payload(pos + 1, end)), end + 2))
            }
            b':' => {
                let end = self.line_end(pos)?;
                let n = parse_i64(&self.data[pos + 1..end])?;
                Ok((Value::Integer(n), end + 2))
            }
            b'$' => self.parse_bulk_string(pos),
            b'*' => self.parse_array(pos, depth),
            b'_' => {
                let end = self.line_end(pos)?;
                if end != pos + 1 {
                    return Err(ParseError::Protocol("unexpected data after null".to_string()));
                }
                Ok((Value::Nil, end + 2))
            }
            other => Err(ParseError::InvalidPrefix(other)),
        }
    }

    /// Parse a bulk string: `$6\r\nfoobar\r\n` or `$-1\r\n`
    fn parse_bulk_string(&mut self, pos: usize) -> Result<(Value, usize), ParseError> {
        let len_end = self.line_end(pos)?;
        let declared = parse_i64(&self.data[pos + 1..len_end])?;
        let data_start = len_end + 2;

        if declared == -1 {
            return Ok((Value::BulkString(None), data_start));
        }
        let len = usize::try_from(declared).map_err(|_| ParseError::InvalidLength(declared))?;
        if len > self.options.max_bulk_string_len {
            return Err(ParseError::BulkStringTooLong {
                len,
                max: self.options.max_bulk_string_len,
            });
        }

        let data_end = data_start
            .checked_add(len)
            .ok_or_else(|| ParseError::Protocol("length overflow".to_string()))?;
        let total_end = data_end
            .checked_add(2)
            .ok_or_else(|| ParseError::Protocol("length overflow".to_string()))?;

        if self.data.len() < total_end {
            return Err(ParseError::Incomplete);
        }
        if &self.data[data_end..total_end] != CRLF {
            return Err(ParseError::Protocol("missing trailing CRLF".to_string()));
        }

        Ok((
            Value::BulkString(Some(self.payload(data_start, data_end))),
            total_end,
        ))
    }

    /// Parse an array: `*2\r\n...` or `*-1\r\n`
    fn parse_array(&mut self, pos: usize, depth: usize) -> Result<(Value, usize), ParseError> {
        if depth >= self.options.max_depth {
            return Err(ParseError::NestingTooDeep(depth));
        }

        let len_end = self.line_end(pos)?;
        let declared = parse_i64(&self.data[pos + 1..len_end])?;
        let mut next = len_end + 2;

        if declared == -1 {
            return Ok((Value::Array(None), next));
        }
        let len = usize::try_from(declared).map_err(|_| ParseError::InvalidLength(declared))?;
        if len > self.options.max_collection_elements {
            return Err(ParseError::CollectionTooLarge(len));
        }

        self.total_items = self
            .total_items
            .checked_add(len)
            .ok_or(ParseError::CollectionTooLarge(usize::MAX))?;
        if self.total_items > self.options.max_total_items {
            return Err(ParseError::CollectionTooLarge(self.total_items));
        }

        let mut elements = Vec::with_capacity(len.min(PREALLOC_LIMIT));
        for _ in 0..len {
            let (value, after) = self.parse_value(next, depth + 1)?;
            elements.push(value);
            next = after;
        }

        Ok((Value::Array(Some(elements)), next))
    }
}

fn parse_i64(digits: &[u8]) -> Result<i64, ParseError> {
    let s = std::str::from_utf8(digits).map_err(|e| ParseError::InvalidInteger(e.to_string()))?;
    s.parse()
        .map_err(|e: std::num::ParseIntError| ParseError::InvalidInteger(e.to_string()))
}
