//! Integration tests against a real Redis server.
//!
//! These tests are `#[ignore]` by default because they require a running
//! Redis instance on `127.0.0.1:6379`. Run them with:
//!
//!   cargo test -p hookline --test integration -- --ignored --nocapture

mod common;

use std::sync::Mutex;
use std::time::Duration;

use common::{Outcome, log, record};
use hookline::{EventLoop, Token, Value, connect_timeout};

static TEST_SERIALIZE: Mutex<()> = Mutex::new(());

const REDIS_ADDR: &str = "127.0.0.1:6379";
const TIMEOUT: Duration = Duration::from_secs(5);

fn connect_redis() -> (EventLoop<u32>, Token) {
    let stream = connect_timeout(REDIS_ADDR, Duration::from_secs(2))
        .unwrap_or_else(|e| panic!("Redis not reachable at {REDIS_ADDR}: {e}"));
    let mut event_loop = EventLoop::new().unwrap();
    let token = event_loop.insert(stream).unwrap();
    (event_loop, token)
}

fn value(outcome: &Outcome) -> &Value {
    match outcome {
        Outcome::Value(v) => v,
        Outcome::Failed(e) => panic!("command failed: {e}"),
    }
}

#[test]
#[ignore]
fn set_get_del() {
    let _guard = TEST_SERIALIZE.lock().unwrap_or_else(|e| e.into_inner());
    let (mut event_loop, token) = connect_redis();
    let log = log();

    let ctx = event_loop.get_mut(token).unwrap();
    ctx.submit(&["SET", "hookline:test:key", "hello"], record(&log), 0).unwrap();
    ctx.submit(&["GET", "hookline:test:key"], record(&log), 1).unwrap();
    ctx.submit(&["DEL", "hookline:test:key"], record(&log), 2).unwrap();
    ctx.submit(&["GET", "hookline:test:key"], record(&log), 3).unwrap();
    event_loop.run_until_idle(TIMEOUT).unwrap();

    let log = log.borrow();
    assert_eq!(*value(&log[0].1), Value::status(b"OK"));
    assert_eq!(*value(&log[1].1), Value::bulk_string(b"hello"));
    assert_eq!(*value(&log[2].1), Value::integer(1));
    assert_eq!(*value(&log[3].1), Value::null_bulk_string());
}

#[test]
#[ignore]
fn binary_safe_values() {
    let _guard = TEST_SERIALIZE.lock().unwrap_or_else(|e| e.into_inner());
    let (mut event_loop, token) = connect_redis();
    let log = log();
    let payload: &[u8] = b"\x00\r\n\xff binary";

    let ctx = event_loop.get_mut(token).unwrap();
    let set: [&[u8]; 3] = [b"SET", b"hookline:test:bin", payload];
    ctx.submit_with_lengths(&set, &[3, 17, payload.len()], record(&log), 0)
        .unwrap();
    ctx.submit(&["GET", "hookline:test:bin"], record(&log), 1).unwrap();
    ctx.submit(&["DEL", "hookline:test:bin"], record(&log), 2).unwrap();
    event_loop.run_until_idle(TIMEOUT).unwrap();

    let log = log.borrow();
    assert_eq!(value(&log[1].1).as_bytes(), Some(payload));
}

#[test]
#[ignore]
fn server_error_does_not_close_the_connection() {
    let _guard = TEST_SERIALIZE.lock().unwrap_or_else(|e| e.into_inner());
    let (mut event_loop, token) = connect_redis();
    let log = log();

    let ctx = event_loop.get_mut(token).unwrap();
    ctx.submit(&["HOOKLINE-NO-SUCH-COMMAND"], record(&log), 0).unwrap();
    ctx.submit(&["PING"], record(&log), 1).unwrap();
    event_loop.run_until_idle(TIMEOUT).unwrap();

    let log = log.borrow();
    assert!(value(&log[0].1).is_error());
    assert_eq!(*value(&log[1].1), Value::status(b"PONG"));
    assert!(!event_loop.get(token).unwrap().is_closed());
}

#[test]
#[ignore]
fn deep_pipeline() {
    let _guard = TEST_SERIALIZE.lock().unwrap_or_else(|e| e.into_inner());
    let (mut event_loop, token) = connect_redis();
    let log = log();

    let ctx = event_loop.get_mut(token).unwrap();
    ctx.submit(&["DEL", "hookline:test:counter"], record(&log), 0).unwrap();
    for i in 1..=1000 {
        ctx.submit(&["INCR", "hookline:test:counter"], record(&log), i).unwrap();
    }
    event_loop.run_until_idle(TIMEOUT).unwrap();

    let log = log.borrow();
    assert_eq!(log.len(), 1001);
    for (data, outcome) in log.iter().skip(1) {
        assert_eq!(*value(outcome), Value::integer(i64::from(*data)));
    }
}
