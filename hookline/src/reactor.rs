//! The host scheduler seam.
//!
//! A [`Reactor`] is whatever owns the readiness loop: it is told which file
//! descriptors to watch for which kind of readiness, and reports readiness
//! back to the context by [`Token`].

use std::io;
use std::os::fd::RawFd;
use std::rc::Rc;
use std::sync::Arc;

/// Identifies a connection to the scheduler. Chosen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(pub usize);

/// One kind of readiness interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterestKind {
    Read,
    Write,
}

/// The set of readiness kinds currently registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Interests {
    pub read: bool,
    pub write: bool,
}

impl Interests {
    pub const NONE: Interests = Interests {
        read: false,
        write: false,
    };

    pub const READ: Interests = Interests {
        read: true,
        write: false,
    };

    pub const READ_WRITE: Interests = Interests {
        read: true,
        write: true,
    };

    pub fn contains(self, kind: InterestKind) -> bool {
        match kind {
            InterestKind::Read => self.read,
            InterestKind::Write => self.write,
        }
    }

    pub fn is_empty(self) -> bool {
        !self.read && !self.write
    }

    #[must_use]
    pub fn with(mut self, kind: InterestKind) -> Self {
        match kind {
            InterestKind::Read => self.read = true,
            InterestKind::Write => self.write = true,
        }
        self
    }

    #[must_use]
    pub fn without(mut self, kind: InterestKind) -> Self {
        match kind {
            InterestKind::Read => self.read = false,
            InterestKind::Write => self.write = false,
        }
        self
    }
}

/// Readiness registration, one interest kind at a time.
///
/// Calls arrive only on transitions: `register` for a kind that is not
/// registered for `fd`, `deregister` for one that is.
pub trait Reactor {
    fn register(&self, fd: RawFd, token: Token, kind: InterestKind) -> io::Result<()>;

    fn deregister(&self, fd: RawFd, token: Token, kind: InterestKind) -> io::Result<()>;
}

impl<R: Reactor + ?Sized> Reactor for &R {
    fn register(&self, fd: RawFd, token: Token, kind: InterestKind) -> io::Result<()> {
        (**self).register(fd, token, kind)
    }

    fn deregister(&self, fd: RawFd, token: Token, kind: InterestKind) -> io::Result<()> {
        (**self).deregister(fd, token, kind)
    }
}

impl<R: Reactor + ?Sized> Reactor for Rc<R> {
    fn register(&self, fd: RawFd, token: Token, kind: InterestKind) -> io::Result<()> {
        (**self).register(fd, token, kind)
    }

    fn deregister(&self, fd: RawFd, token: Token, kind: InterestKind) -> io::Result<()> {
        (**self).deregister(fd, token, kind)
    }
}

impl<R: Reactor + ?Sized> Reactor for Arc<R> {
    fn register(&self, fd: RawFd, token: Token, kind: InterestKind) -> io::Result<()> {
        (**self).register(fd, token, kind)
    }

    fn deregister(&self, fd: RawFd, token: Token, kind: InterestKind) -> io::Result<()> {
        (**self).deregister(fd, token, kind)
    }
}
