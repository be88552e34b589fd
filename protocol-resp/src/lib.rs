//! RESP (Redis Serialization Protocol) codec for pipelined clients.
//!
//! - **Values**: parse replies (status, error, integer, bulk string, array,
//!   nil) and encode them
//! - **Requests**: frame commands as arrays of bulk strings
//!
//! Parsing distinguishes "need more bytes" ([`ParseError::Incomplete`]) from
//! malformed input (every other [`ParseError`] variant), and reports how many
//! bytes each complete reply consumed so pipelined replies can be peeled off
//! a buffer one at a time.
//!
//! # Example
//!
//! ```
//! use protocol_resp::{Request, Value};
//!
//! // Encode a GET command
//! let mut buf = vec![0u8; 1024];
//! let len = Request::cmd(b"GET").arg(b"mykey").encode(&mut buf);
//! assert_eq!(&buf[..len], b"*2\r\n$3\r\nGET\r\n$5\r\nmykey\r\n");
//!
//! // Parse the response
//! let (value, consumed) = Value::parse(b"$-1\r\n+OK\r\n").unwrap();
//! assert_eq!(value, Value::BulkString(None));
//! assert_eq!(consumed, 5);
//! ```

mod error;
mod request;
mod value;

pub use error::ParseError;
pub use request::Request;
pub use value::{
    DEFAULT_MAX_BULK_STRING_LEN, DEFAULT_MAX_COLLECTION_ELEMENTS, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_LINE_LEN, DEFAULT_MAX_TOTAL_ITEMS, ParseOptions, Value,
};
