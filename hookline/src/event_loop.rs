//! A host scheduler for [`Context`]s on top of `mio`.
//!
//! [`MioReactor`] implements [`Reactor`] against a `mio::Registry`;
//! [`EventLoop`] owns the `Poll`, keeps contexts in a slab keyed by token and
//! routes readiness to them. Closed contexts are dropped at the end of each
//! turn.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::net::ToSocketAddrs;
use std::os::fd::RawFd;
use std::rc::Rc;
use std::time::Duration;

use mio::net::TcpStream;
use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Registry};
use slab::Slab;
use tracing::{trace, warn};

use crate::config::Config;
use crate::context::Context;
use crate::error::Error;
use crate::reactor::{InterestKind, Interests, Reactor, Token};
use crate::transport;

const EVENTS_CAPACITY: usize = 1024;

/// [`Reactor`] over a `mio::Registry`.
///
/// mio registers a source once with its full interest set, so the per-kind
/// calls are folded into register / reregister / deregister here.
pub struct MioReactor {
    registry: Registry,
    registered: RefCell<HashMap<RawFd, Interests>>,
}

impl MioReactor {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            registered: RefCell::new(HashMap::new()),
        }
    }

    /// Interest currently registered for `fd`.
    pub fn interest(&self, fd: RawFd) -> Interests {
        self.registered
            .borrow()
            .get(&fd)
            .copied()
            .unwrap_or(Interests::NONE)
    }

    fn update(&self, fd: RawFd, token: Token, next: Interests) -> io::Result<()> {
        let mut registered = self.registered.borrow_mut();
        let current = registered.get(&fd).copied().unwrap_or(Interests::NONE);
        if current == next {
            return Ok(());
        }
        let token = mio::Token(token.0);
        match to_mio(next) {
            Some(interest) if current.is_empty() => {
                self.registry.register(&mut SourceFd(&fd), token, interest)?;
            }
            Some(interest) => {
                self.registry.reregister(&mut SourceFd(&fd), token, interest)?;
            }
            None => {
                registered.remove(&fd);
                self.registry.deregister(&mut SourceFd(&fd))?;
                return Ok(());
            }
        }
        registered.insert(fd, next);
        Ok(())
    }
}

impl Reactor for MioReactor {
    fn register(&self, fd: RawFd, token: Token, kind: InterestKind) -> io::Result<()> {
        let next = self.interest(fd).with(kind);
        self.update(fd, token, next)
    }

    fn deregister(&self, fd: RawFd, token: Token, kind: InterestKind) -> io::Result<()> {
        let next = self.interest(fd).without(kind);
        self.update(fd, token, next)
    }
}

fn to_mio(interests: Interests) -> Option<Interest> {
    match (interests.read, interests.write) {
        (true, true) => Some(Interest::READABLE | Interest::WRITABLE),
        (true, false) => Some(Interest::READABLE),
        (false, true) => Some(Interest::WRITABLE),
        (false, false) => None,
    }
}

/// Single-threaded event loop driving a set of connections.
pub struct EventLoop<T> {
    poll: Poll,
    events: Events,
    reactor: Rc<MioReactor>,
    connections: Slab<Context<TcpStream, T>>,
    config: Config,
}

impl<T> EventLoop<T> {
    pub fn new() -> io::Result<Self> {
        Self::with_config(Config::default())
    }

    /// Create a loop whose connections use `config`.
    pub fn with_config(config: Config) -> io::Result<Self> {
        let poll = Poll::new()?;
        let registry = poll.registry().try_clone()?;
        Ok(Self {
            poll,
            events: Events::with_capacity(EVENTS_CAPACITY),
            reactor: Rc::new(MioReactor::new(registry)),
            connections: Slab::new(),
            config,
        })
    }

    pub fn reactor(&self) -> &Rc<MioReactor> {
        &self.reactor
    }

    /// Take ownership of a connected stream and attach it to this loop.
    pub fn insert(&mut self, stream: TcpStream) -> Result<Token, Error> {
        let entry = self.connections.vacant_entry();
        let token = Token(entry.key());
        let mut ctx = Context::with_config(stream, self.config.clone());
        ctx.attach(Rc::clone(&self.reactor), token)?;
        entry.insert(ctx);
        trace!(token = token.0, "connection inserted");
        Ok(token)
    }

    /// Connect to `addr` and [`insert`](Self::insert) the stream.
    pub fn connect<A: ToSocketAddrs>(&mut self, addr: A) -> Result<Token, Error> {
        let stream = transport::connect(addr)?;
        self.insert(stream)
    }

    pub fn get(&self, token: Token) -> Option<&Context<TcpStream, T>> {
        self.connections.get(token.0)
    }

    pub fn get_mut(&mut self, token: Token) -> Option<&mut Context<TcpStream, T>> {
        self.connections.get_mut(token.0)
    }

    /// Detach the connection from this loop and hand it back.
    pub fn remove(&mut self, token: Token) -> Option<Context<TcpStream, T>> {
        let mut ctx = self.connections.try_remove(token.0)?;
        if let Err(e) = ctx.detach() {
            warn!(token = token.0, error = %e, "detach on remove failed");
        }
        Some(ctx)
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Commands awaiting a reply across all connections.
    pub fn pending(&self) -> usize {
        self.connections.iter().map(|(_, ctx)| ctx.pending()).sum()
    }

    /// Wait for readiness once and deliver it.
    ///
    /// Returns the number of events handled; zero means the timeout expired.
    pub fn turn(&mut self, timeout: Option<Duration>) -> io::Result<usize> {
        match self.poll.poll(&mut self.events, timeout) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(0),
            Err(e) => return Err(e),
        }

        let mut handled = 0;
        for event in self.events.iter() {
            handled += 1;
            let Some(ctx) = self.connections.get_mut(event.token().0) else {
                continue;
            };
            if event.is_readable() || event.is_read_closed() || event.is_error() {
                ctx.on_readable();
            }
            if event.is_writable() {
                ctx.on_writable();
            }
        }

        self.connections.retain(|key, ctx| {
            let keep = !ctx.is_closed();
            if !keep {
                trace!(token = key, "reaping closed connection");
            }
            keep
        });
        Ok(handled)
    }

    /// Turn until no command is pending.
    ///
    /// Fails with `TimedOut` if a turn sees no events within `timeout`.
    pub fn run_until_idle(&mut self, timeout: Duration) -> io::Result<()> {
        while self.pending() > 0 {
            if self.turn(Some(timeout))? == 0 {
                return Err(io::ErrorKind::TimedOut.into());
            }
        }
        Ok(())
    }
}
