//! Pipelined RESP client connections driven by an external event loop.
//!
//! A [`Context`] owns one connection: its transport, input and output
//! buffers, the FIFO of pending commands, and at most one event
//! subscription. The host scheduler is reached through the [`Reactor`]
//! trait and calls back into the context when the socket is ready:
//!
//! ```text
//! readiness ──► on_readable ──► read ──► decode ──► callback(reply, data)
//!           └─► on_writable ──► flush ──► withdraw write interest when empty
//! ```
//!
//! Each submitted command is answered exactly once. Replies are matched to
//! commands purely by order. When the connection fails or is closed, every
//! command still pending receives [`Reply::ConnectionError`].
//!
//! [`EventLoop`] is a ready-made scheduler on top of `mio`.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use hookline::{EventLoop, Reply};
//!
//! let mut event_loop = EventLoop::new()?;
//! let token = event_loop.connect("127.0.0.1:6379")?;
//!
//! let ctx = event_loop.get_mut(token).unwrap();
//! ctx.submit(&["SET", "greeting", "hello"], |_, _| {}, ())?;
//! ctx.submit(
//!     &["GET", "greeting"],
//!     |reply: Reply<'_>, ()| println!("{:?}", reply.value()),
//!     (),
//! )?;
//!
//! event_loop.run_until_idle(Duration::from_secs(1))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod event_loop;
pub mod metrics;
pub mod reactor;
pub mod subscription;
pub mod transport;

pub(crate) mod accumulator;
pub(crate) mod dispatch;
pub(crate) mod encoder;
pub(crate) mod queue;

mod context;

pub use config::Config;
pub use context::{Context, State};
pub use dispatch::Reply;
pub use error::{EncodingError, Error};
pub use event_loop::{EventLoop, MioReactor};
pub use queue::Callback;
pub use reactor::{InterestKind, Interests, Reactor, Token};
pub use subscription::{EventHooks, Subscription};
pub use transport::{Transport, connect, connect_timeout};

pub use resp_proto::{ParseError, ParseOptions, Value};
