//! The event subscription: the five hooks a context uses to tell its host
//! scheduler which readiness it wants.

use std::io;
use std::os::fd::RawFd;

use tracing::trace;

use crate::reactor::{InterestKind, Interests, Reactor, Token};

/// Readiness hooks between one connection context and its scheduler.
///
/// Only the owning context calls these. `add_*` and `del_*` are idempotent.
/// `cleanup` withdraws everything still registered and is safe to call on a
/// subscription that never registered anything.
pub trait EventHooks {
    fn add_read(&mut self) -> io::Result<()>;

    fn del_read(&mut self) -> io::Result<()>;

    fn add_write(&mut self) -> io::Result<()>;

    fn del_write(&mut self) -> io::Result<()>;

    fn cleanup(&mut self) -> io::Result<()>;

    /// Interest currently registered with the scheduler.
    fn interest(&self) -> Interests;

    /// The scheduler's handle for this connection.
    fn token(&self) -> Token;
}

/// [`EventHooks`] backed by a [`Reactor`] registration for one fd.
pub struct Subscription<R> {
    reactor: R,
    fd: RawFd,
    token: Token,
    interest: Interests,
}

impl<R: Reactor> Subscription<R> {
    pub fn new(reactor: R, fd: RawFd, token: Token) -> Self {
        Self {
            reactor,
            fd,
            token,
            interest: Interests::NONE,
        }
    }

    pub fn fd(&self) -> RawFd {
        self.fd
    }

    fn add(&mut self, kind: InterestKind) -> io::Result<()> {
        if self.interest.contains(kind) {
            return Ok(());
        }
        self.reactor.register(self.fd, self.token, kind)?;
        self.interest = self.interest.with(kind);
        trace!(fd = self.fd, token = self.token.0, ?kind, "interest added");
        Ok(())
    }

    fn del(&mut self, kind: InterestKind) -> io::Result<()> {
        if !self.interest.contains(kind) {
            return Ok(());
        }
        // Recorded as withdrawn even if the reactor refuses, so cleanup
        // never retries a kind.
        self.interest = self.interest.without(kind);
        self.reactor.deregister(self.fd, self.token, kind)?;
        trace!(fd = self.fd, token = self.token.0, ?kind, "interest withdrawn");
        Ok(())
    }
}

impl<R: Reactor> EventHooks for Subscription<R> {
    fn add_read(&mut self) -> io::Result<()> {
        self.add(InterestKind::Read)
    }

    fn del_read(&mut self) -> io::Result<()> {
        self.del(InterestKind::Read)
    }

    fn add_write(&mut self) -> io::Result<()> {
        self.add(InterestKind::Write)
    }

    fn del_write(&mut self) -> io::Result<()> {
        self.del(InterestKind::Write)
    }

    fn cleanup(&mut self) -> io::Result<()> {
        let read = self.del(InterestKind::Read);
        let write = self.del(InterestKind::Write);
        read.and(write)
    }

    fn interest(&self) -> Interests {
        self.interest
    }

    fn token(&self) -> Token {
        self.token
    }
}
