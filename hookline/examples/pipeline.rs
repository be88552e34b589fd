//! Pipeline a batch of commands to a Redis server and print the replies.
//!
//!   RUST_LOG=hookline=debug cargo run -p hookline --example pipeline -- 127.0.0.1:6379

use std::time::Duration;

use hookline::{EventLoop, Reply};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:6379".to_string());

    let mut event_loop = EventLoop::new()?;
    let token = event_loop.connect(addr.as_str())?;
    let ctx = event_loop
        .get_mut(token)
        .ok_or("connection closed immediately")?;

    let commands: &[&[&str]] = &[
        &["PING"],
        &["SET", "hookline:example", "hello"],
        &["GET", "hookline:example"],
        &["INCR", "hookline:example"],
        &["DEL", "hookline:example"],
    ];
    for argv in commands {
        let label = argv.join(" ");
        ctx.submit(argv, print_reply, label)?;
    }

    event_loop.run_until_idle(Duration::from_secs(5))?;
    Ok(())
}

fn print_reply(reply: Reply<'_>, label: String) {
    match reply {
        Reply::Value(value) => println!("{label:<32} => {value:?}"),
        Reply::ConnectionError(err) => println!("{label:<32} !! {err}"),
    }
}
