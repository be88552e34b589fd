//! Routing decoded replies to their pending commands.

use resp_proto::{ParseError, ParseOptions, Value};
use tracing::{trace, warn};

use crate::accumulator::RecvAccumulator;
use crate::error::Error;
use crate::metrics;
use crate::queue::CommandQueue;

/// What a command callback receives.
///
/// Both variants borrow data owned by the connection for the duration of the
/// call. Clone the value if it must outlive the callback.
#[derive(Debug, Clone, Copy)]
pub enum Reply<'a> {
    /// The decoded reply. Server error replies (`-ERR ...`) arrive here too.
    Value(&'a Value),
    /// The connection failed or was closed before this command was answered.
    ConnectionError(&'a Error),
}

impl<'a> Reply<'a> {
    /// The decoded reply, if the command was answered.
    pub fn value(&self) -> Option<&'a Value> {
        match self {
            Reply::Value(value) => Some(value),
            Reply::ConnectionError(_) => None,
        }
    }

    /// The connection error, if the command was not answered.
    pub fn connection_error(&self) -> Option<&'a Error> {
        match self {
            Reply::Value(_) => None,
            Reply::ConnectionError(err) => Some(err),
        }
    }

    pub fn is_connection_error(&self) -> bool {
        matches!(self, Reply::ConnectionError(_))
    }
}

/// Deliver one decoded reply to the head of the queue.
pub(crate) fn dispatch<T>(queue: &mut CommandQueue<T>, value: &Value) -> Result<(), Error> {
    let Some(entry) = queue.pop_front() else {
        warn!(reply = ?value, "reply received with no pending command");
        return Err(Error::QueueUnderflow);
    };
    entry.complete(Reply::Value(value));
    metrics::REPLIES_DISPATCHED.increment();
    Ok(())
}

/// Decode and dispatch every complete reply in `input`, in buffer order.
///
/// An incomplete trailing reply is left in `input` for the next read. On a
/// framing error or underflow, replies decoded before the failure have
/// already been delivered and the error is returned.
pub(crate) fn dispatch_all<T>(
    input: &mut RecvAccumulator,
    queue: &mut CommandQueue<T>,
    options: &ParseOptions,
) -> Result<usize, Error> {
    if input.is_empty() {
        return Ok(0);
    }

    let data = input.take_frozen();
    let mut offset = 0;
    let mut dispatched = 0;

    let result = loop {
        if offset == data.len() {
            break Ok(dispatched);
        }
        match Value::parse_bytes_with_options(&data.slice(offset..), options) {
            Ok((value, consumed)) => {
                offset += consumed;
                if let Err(err) = dispatch(queue, &value) {
                    break Err(err);
                }
                dispatched += 1;
            }
            Err(ParseError::Incomplete) => break Ok(dispatched),
            Err(err) => break Err(Error::Protocol(err)),
        }
    };

    input.prepend(&data[offset..]);
    trace!(dispatched, remaining = data.len() - offset, "dispatch pass");
    result
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::queue::Pending;

    fn recording(queue: &mut CommandQueue<u32>, log: &Rc<RefCell<Vec<(u32, Value)>>>, n: u32) {
        for i in 0..n {
            let log = log.clone();
            queue.push_back(Pending::new(
                Box::new(move |reply: Reply<'_>, data: u32| {
                    let value = reply.value().cloned().unwrap_or(Value::Nil);
                    log.borrow_mut().push((data, value));
                }),
                i,
            ));
        }
    }

    #[test]
    fn replies_follow_buffer_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut queue = CommandQueue::new();
        recording(&mut queue, &log, 3);

        let mut input = RecvAccumulator::new(64);
        input.append(b"+OK\r\n:42\r\n$3\r\nbar\r\n");
        let n = dispatch_all(&mut input, &mut queue, &ParseOptions::new()).unwrap();

        assert_eq!(n, 3);
        assert!(queue.is_empty());
        assert!(input.is_empty());
        assert_eq!(
            *log.borrow(),
            vec![
                (0, Value::status(b"OK")),
                (1, Value::integer(42)),
                (2, Value::bulk_string(b"bar")),
            ]
        );
    }

    #[test]
    fn incomplete_tail_is_kept() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut queue = CommandQueue::new();
        recording(&mut queue, &log, 2);

        let mut input = RecvAccumulator::new(64);
        input.append(b"+OK\r\n$5\r\nhel");
        assert_eq!(dispatch_all(&mut input, &mut queue, &ParseOptions::new()).unwrap(), 1);
        assert_eq!(input.data(), b"$5\r\nhel");
        assert_eq!(queue.len(), 1);

        input.append(b"lo\r\n");
        assert_eq!(dispatch_all(&mut input, &mut queue, &ParseOptions::new()).unwrap(), 1);
        assert!(input.is_empty());
        assert_eq!(log.borrow()[1], (1, Value::bulk_string(b"hello")));
    }

    #[test]
    fn error_reply_is_ordinary_data() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut queue = CommandQueue::new();
        recording(&mut queue, &log, 1);

        let mut input = RecvAccumulator::new(64);
        input.append(b"-ERR unknown command\r\n");
        dispatch_all(&mut input, &mut queue, &ParseOptions::new()).unwrap();
        assert_eq!(log.borrow()[0].1, Value::error(b"ERR unknown command"));
    }

    #[test]
    fn underflow_after_delivering_earlier_replies() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut queue = CommandQueue::new();
        recording(&mut queue, &log, 1);

        let mut input = RecvAccumulator::new(64);
        input.append(b"+A\r\n+B\r\n");
        let err = dispatch_all(&mut input, &mut queue, &ParseOptions::new()).unwrap_err();
        assert!(matches!(err, Error::QueueUnderflow));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn framing_error_after_delivering_earlier_replies() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut queue = CommandQueue::new();
        recording(&mut queue, &log, 2);

        let mut input = RecvAccumulator::new(64);
        input.append(b":1\r\n?garbage\r\n");
        let err = dispatch_all(&mut input, &mut queue, &ParseOptions::new()).unwrap_err();
        assert!(matches!(err, Error::Protocol(ParseError::InvalidPrefix(b'?'))));
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn parse_limits_apply() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut queue = CommandQueue::new();
        recording(&mut queue, &log, 1);

        let mut input = RecvAccumulator::new(64);
        input.append(b"$10\r\n0123456789\r\n");
        let options = ParseOptions::new().max_bulk_string_len(4);
        let err = dispatch_all(&mut input, &mut queue, &options).unwrap_err();
        assert!(err.is_protocol());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn reply_accessors() {
        let value = Value::integer(7);
        let reply = Reply::Value(&value);
        assert_eq!(reply.value(), Some(&value));
        assert!(reply.connection_error().is_none());

        let err = Error::Disconnected;
        let reply = Reply::ConnectionError(&err);
        assert!(reply.is_connection_error());
        assert!(reply.value().is_none());
    }
}
