//! Shared fixtures: an in-memory transport and a reactor that records calls.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::rc::Rc;

use hookline::{InterestKind, Reactor, Reply, Token, Value};

/// Both ends of the fake socket.
#[derive(Default)]
pub struct Wire {
    /// Bytes the "server" has sent, not yet read by the client.
    pub inbound: VecDeque<u8>,
    /// Bytes the client has written.
    pub outbound: Vec<u8>,
    /// Report EOF once `inbound` is drained.
    pub eof: bool,
    /// Bytes accepted before writes start returning `WouldBlock`.
    pub write_budget: Option<usize>,
    /// Error returned by the next read.
    pub read_error: Option<io::ErrorKind>,
}

#[derive(Clone)]
pub struct MockTransport {
    pub wire: Rc<RefCell<Wire>>,
    fd: RawFd,
}

impl MockTransport {
    pub fn new(fd: RawFd) -> Self {
        Self {
            wire: Rc::default(),
            fd,
        }
    }

    pub fn feed(&self, bytes: &[u8]) {
        self.wire.borrow_mut().inbound.extend(bytes);
    }

    pub fn close(&self) {
        self.wire.borrow_mut().eof = true;
    }

    /// Everything the client has written so far, draining it.
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut self.wire.borrow_mut().outbound)
    }

    pub fn set_write_budget(&self, budget: Option<usize>) {
        self.wire.borrow_mut().write_budget = budget;
    }

    pub fn fail_next_read(&self, kind: io::ErrorKind) {
        self.wire.borrow_mut().read_error = Some(kind);
    }
}

impl Read for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut wire = self.wire.borrow_mut();
        if let Some(kind) = wire.read_error.take() {
            return Err(kind.into());
        }
        if wire.inbound.is_empty() {
            return if wire.eof {
                Ok(0)
            } else {
                Err(io::ErrorKind::WouldBlock.into())
            };
        }
        let n = buf.len().min(wire.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(wire.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for MockTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut wire = self.wire.borrow_mut();
        let n = match wire.write_budget {
            Some(0) => return Err(io::ErrorKind::WouldBlock.into()),
            Some(budget) => {
                let n = budget.min(buf.len());
                wire.write_budget = Some(budget - n);
                n
            }
            None => buf.len(),
        };
        wire.outbound.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsRawFd for MockTransport {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Register(Token, InterestKind),
    Deregister(Token, InterestKind),
}

/// Reactor that records every call and tracks what is registered.
#[derive(Default)]
pub struct RecordingReactor {
    pub calls: RefCell<Vec<Call>>,
    pub registered: RefCell<HashSet<(RawFd, InterestKind)>>,
    pub fail_register: RefCell<bool>,
}

impl RecordingReactor {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn is_registered(&self, fd: RawFd, kind: InterestKind) -> bool {
        self.registered.borrow().contains(&(fd, kind))
    }

    pub fn nothing_registered(&self) -> bool {
        self.registered.borrow().is_empty()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl Reactor for RecordingReactor {
    fn register(&self, fd: RawFd, token: Token, kind: InterestKind) -> io::Result<()> {
        if *self.fail_register.borrow() {
            return Err(io::Error::other("registration refused"));
        }
        self.calls.borrow_mut().push(Call::Register(token, kind));
        assert!(
            self.registered.borrow_mut().insert((fd, kind)),
            "{kind:?} registered twice for fd {fd}"
        );
        Ok(())
    }

    fn deregister(&self, fd: RawFd, token: Token, kind: InterestKind) -> io::Result<()> {
        self.calls.borrow_mut().push(Call::Deregister(token, kind));
        assert!(
            self.registered.borrow_mut().remove(&(fd, kind)),
            "{kind:?} withdrawn for fd {fd} without being registered"
        );
        Ok(())
    }
}

/// What a callback observed.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Value(Value),
    /// Display form of the connection error.
    Failed(String),
}

pub type Log<T> = Rc<RefCell<Vec<(T, Outcome)>>>;

pub fn log<T>() -> Log<T> {
    Rc::new(RefCell::new(Vec::new()))
}

/// A callback appending `(data, outcome)` to `log`.
pub fn record<T: 'static>(log: &Log<T>) -> impl FnOnce(Reply<'_>, T) + 'static {
    let log = log.clone();
    move |reply, data| {
        let outcome = match reply {
            Reply::Value(value) => Outcome::Value(value.clone()),
            Reply::ConnectionError(err) => Outcome::Failed(err.to_string()),
        };
        log.borrow_mut().push((data, outcome));
    }
}
