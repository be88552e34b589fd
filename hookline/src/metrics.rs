//! hookline bridge metrics.
//!
//! Process-wide counters for command flow, teardown and bytes moved.
//! Exposed through the `metriken` registry.

use metriken::{Counter, Gauge, metric};

// ── Command flow ─────────────────────────────────────────────────

#[metric(
    name = "hookline/commands/submitted",
    description = "Commands accepted by submit"
)]
pub static COMMANDS_SUBMITTED: Counter = Counter::new();

#[metric(
    name = "hookline/replies/dispatched",
    description = "Replies delivered to their pending command"
)]
pub static REPLIES_DISPATCHED: Counter = Counter::new();

#[metric(
    name = "hookline/callbacks/drained",
    description = "Pending commands completed with a connection error during teardown"
)]
pub static CALLBACKS_DRAINED: Counter = Counter::new();

// ── Connection lifecycle ─────────────────────────────────────────

#[metric(
    name = "hookline/connections/failed",
    description = "Connections torn down by a transport or protocol failure"
)]
pub static CONNECTIONS_FAILED: Counter = Counter::new();

#[metric(
    name = "hookline/subscriptions/active",
    description = "Currently attached event subscriptions"
)]
pub static SUBSCRIPTIONS_ACTIVE: Gauge = Gauge::new();

// ── Bytes ────────────────────────────────────────────────────────

#[metric(name = "hookline/bytes/received", description = "Total bytes received")]
pub static BYTES_RECEIVED: Counter = Counter::new();

#[metric(name = "hookline/bytes/sent", description = "Total bytes sent")]
pub static BYTES_SENT: Counter = Counter::new();
