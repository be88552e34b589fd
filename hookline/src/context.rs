use std::io;

use bytes::{Buf, BytesMut};
use tracing::{debug, trace, warn};

use crate::accumulator::RecvAccumulator;
use crate::config::Config;
use crate::dispatch::{self, Reply};
use crate::encoder;
use crate::error::Error;
use crate::metrics;
use crate::queue::{CommandQueue, Pending};
use crate::reactor::{Interests, Reactor, Token};
use crate::subscription::{EventHooks, Subscription};
use crate::transport::Transport;

/// Lifecycle of a [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Connected, no event subscription.
    Connected,
    /// Subscription installed, no interest registered yet.
    Attached,
    /// Interest registered with the scheduler.
    Active,
    /// Failing pending commands during teardown.
    Draining,
    /// Terminal. Queue drained, subscription released, transport dropped.
    Closed,
}

/// One pipelined client connection driven by an external scheduler.
///
/// Commands are framed into the output buffer by [`submit`](Self::submit)
/// and answered in order: every decoded reply completes the oldest pending
/// command. The scheduler reports readiness through
/// [`on_readable`](Self::on_readable) and [`on_writable`](Self::on_writable);
/// the context keeps its registered interest in step with its buffers.
///
/// Every submitted command gets exactly one callback invocation, either with
/// its reply or with the error that closed the connection.
pub struct Context<S, T> {
    transport: Option<S>,
    input: RecvAccumulator,
    output: BytesMut,
    queue: CommandQueue<T>,
    subscription: Option<Box<dyn EventHooks>>,
    state: State,
    last_error: Option<Error>,
    config: Config,
}

impl<S: Transport, T> Context<S, T> {
    /// Wrap a connected, non-blocking transport.
    pub fn new(transport: S) -> Self {
        Self::with_config(transport, Config::default())
    }

    /// Wrap `transport` with explicit buffer and parse settings.
    ///
    /// A zero `read_chunk_size` is raised to one byte.
    pub fn with_config(transport: S, mut config: Config) -> Self {
        config.read_chunk_size = config.read_chunk_size.max(1);
        Self {
            transport: Some(transport),
            input: RecvAccumulator::new(config.recv_buffer_capacity),
            output: BytesMut::with_capacity(config.send_buffer_capacity),
            queue: CommandQueue::new(),
            subscription: None,
            state: State::Connected,
            last_error: None,
            config,
        }
    }

    /// Subscribe the transport's fd to `reactor` under `token`.
    ///
    /// Nothing is registered until there is traffic, unless commands were
    /// submitted before attaching. A registration failure at that point
    /// closes the context; check [`state`](Self::state) afterwards.
    ///
    /// # Errors
    ///
    /// `AlreadyAttached` if a subscription exists (nothing changes),
    /// `NotConnected` if the context is closed.
    pub fn attach<R: Reactor + 'static>(&mut self, reactor: R, token: Token) -> Result<(), Error> {
        self.check_attachable()?;
        let fd = match self.transport.as_ref() {
            Some(transport) => transport.as_raw_fd(),
            None => return Err(Error::NotConnected),
        };
        self.install(Box::new(Subscription::new(reactor, fd, token)));
        Ok(())
    }

    /// Install caller-provided hooks in place of a [`Subscription`].
    pub fn attach_hooks<H: EventHooks + 'static>(&mut self, hooks: H) -> Result<(), Error> {
        self.check_attachable()?;
        self.install(Box::new(hooks));
        Ok(())
    }

    /// Withdraw all interest and release the subscription.
    ///
    /// Pending commands stay queued and buffered output is kept; a later
    /// attach picks them up. Detaching an unattached context does nothing.
    pub fn detach(&mut self) -> Result<(), Error> {
        if !self.is_open() {
            return Err(Error::NotConnected);
        }
        let Some(mut hooks) = self.subscription.take() else {
            return Ok(());
        };
        metrics::SUBSCRIPTIONS_ACTIVE.decrement();
        self.state = State::Connected;
        debug!(token = hooks.token().0, pending = self.queue.len(), "detached");
        hooks.cleanup()?;
        Ok(())
    }

    /// Queue a command. `callback` receives the reply and `data`.
    ///
    /// # Errors
    ///
    /// `Encoding` if `argv` is empty, `NotConnected` once the context is
    /// closed. In both cases nothing is queued and `callback` is dropped
    /// without being called.
    pub fn submit<A, F>(&mut self, argv: &[A], callback: F, data: T) -> Result<(), Error>
    where
        A: AsRef<[u8]>,
        F: FnOnce(Reply<'_>, T) + 'static,
    {
        if !self.is_open() {
            return Err(Error::NotConnected);
        }
        let len = encoder::encode_command(argv, &mut self.output)?;
        self.queue.push_back(Pending::new(Box::new(callback), data));
        metrics::COMMANDS_SUBMITTED.increment();
        trace!(bytes = len, pending = self.queue.len(), "command queued");
        self.declare_interest();
        Ok(())
    }

    /// Like [`submit`](Self::submit), checking each argument against a
    /// declared length first.
    pub fn submit_with_lengths<A, F>(
        &mut self,
        argv: &[A],
        lengths: &[usize],
        callback: F,
        data: T,
    ) -> Result<(), Error>
    where
        A: AsRef<[u8]>,
        F: FnOnce(Reply<'_>, T) + 'static,
    {
        if !self.is_open() {
            return Err(Error::NotConnected);
        }
        encoder::check_lengths(argv, lengths)?;
        self.submit(argv, callback, data)
    }

    /// The transport is readable: read until it would block, then dispatch
    /// every complete reply.
    ///
    /// Peer EOF, read errors and malformed input close the context, after
    /// the replies decoded ahead of them have been delivered.
    pub fn on_readable(&mut self) {
        if !self.is_open() {
            return;
        }
        let Some(transport) = self.transport.as_mut() else {
            return;
        };

        let chunk = self.config.read_chunk_size;
        let mut failure = None;
        loop {
            match self.input.fill_from(transport, chunk) {
                Ok(0) => {
                    failure = Some(Error::ConnectionClosed);
                    break;
                }
                Ok(n) => {
                    metrics::BYTES_RECEIVED.add(n as u64);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    failure = Some(Error::Io(e));
                    break;
                }
            }
        }

        if let Err(err) =
            dispatch::dispatch_all(&mut self.input, &mut self.queue, &self.config.parse_options)
        {
            self.teardown(err);
            return;
        }
        if let Some(err) = failure {
            self.teardown(err);
        }
    }

    /// The transport is writable: flush buffered commands, withdrawing write
    /// interest once the buffer is empty.
    pub fn on_writable(&mut self) {
        if !self.is_open() {
            return;
        }
        if let Err(err) = self.flush() {
            self.teardown(Error::Io(err));
            return;
        }
        if !self.output.is_empty() {
            return;
        }
        let result = match self.subscription.as_mut() {
            Some(hooks) => hooks.del_write(),
            None => Ok(()),
        };
        if let Err(err) = result {
            self.teardown(Error::Io(err));
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(());
        };
        while !self.output.is_empty() {
            match transport.write(&self.output) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => {
                    self.output.advance(n);
                    metrics::BYTES_SENT.add(n as u64);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn check_attachable(&self) -> Result<(), Error> {
        if !self.is_open() {
            return Err(Error::NotConnected);
        }
        if self.subscription.is_some() {
            return Err(Error::AlreadyAttached);
        }
        Ok(())
    }

    fn install(&mut self, hooks: Box<dyn EventHooks>) {
        debug!(token = hooks.token().0, pending = self.queue.len(), "attached");
        self.subscription = Some(hooks);
        self.state = State::Attached;
        metrics::SUBSCRIPTIONS_ACTIVE.increment();
        if !self.output.is_empty() || !self.queue.is_empty() {
            self.declare_interest();
        }
    }

    /// Register read interest, and write interest while output is buffered.
    fn declare_interest(&mut self) {
        let Some(hooks) = self.subscription.as_mut() else {
            return;
        };
        let mut result = hooks.add_read();
        if result.is_ok() && !self.output.is_empty() {
            result = hooks.add_write();
        }
        match result {
            Ok(()) if self.state == State::Attached => {
                self.state = State::Active;
                trace!("active");
            }
            Ok(()) => {}
            Err(err) => self.teardown(Error::Io(err)),
        }
    }
}

impl<S, T> Context<S, T> {
    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    fn is_open(&self) -> bool {
        !matches!(self.state, State::Draining | State::Closed)
    }

    /// Number of submitted commands still waiting for a reply.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Interest currently registered with the scheduler.
    pub fn interest(&self) -> Interests {
        self.subscription
            .as_ref()
            .map_or(Interests::NONE, |hooks| hooks.interest())
    }

    /// The scheduler token, while attached.
    pub fn token(&self) -> Option<Token> {
        self.subscription.as_ref().map(|hooks| hooks.token())
    }

    /// The error that closed the context.
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    /// Bytes framed but not yet written.
    pub fn output_len(&self) -> usize {
        self.output.len()
    }

    /// The transport, until the context closes.
    pub fn transport(&self) -> Option<&S> {
        self.transport.as_ref()
    }

    pub fn transport_mut(&mut self) -> Option<&mut S> {
        self.transport.as_mut()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Close the connection, failing every pending command with
    /// [`Error::Disconnected`]. Does nothing if already closed.
    pub fn disconnect(&mut self) {
        self.teardown(Error::Disconnected);
    }

    fn teardown(&mut self, err: Error) {
        if !self.is_open() {
            return;
        }
        let pending = self.queue.len();
        match &err {
            Error::Disconnected => debug!(pending, "disconnecting"),
            err => {
                warn!(error = %err, pending, "connection failed");
                metrics::CONNECTIONS_FAILED.increment();
            }
        }

        self.state = State::Draining;
        let err: &Error = self.last_error.insert(err);
        let mut drained = 0u64;
        while let Some(entry) = self.queue.pop_front() {
            entry.complete(Reply::ConnectionError(err));
            drained += 1;
        }
        metrics::CALLBACKS_DRAINED.add(drained);

        if let Some(mut hooks) = self.subscription.take() {
            if let Err(e) = hooks.cleanup() {
                warn!(error = %e, token = hooks.token().0, "failed to withdraw interest");
            }
            metrics::SUBSCRIPTIONS_ACTIVE.decrement();
        }

        self.input.reset();
        self.output.clear();
        self.transport = None;
        self.state = State::Closed;
        debug!(drained, "closed");
    }
}

impl<S, T> Drop for Context<S, T> {
    fn drop(&mut self) {
        self.teardown(Error::Disconnected);
    }
}
