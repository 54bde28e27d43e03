//! Metrics collection.
//!
//! # Metrics
//! - `outpost_patrols_total` (counter): patrol passes by hook, outcome
//! - `outpost_executions_total` (counter): executions by outpost, status
//! - `outpost_execution_duration_seconds` (histogram): handler latency
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; the embedding application installs a recorder
//! - Without a recorder every call is a no-op

use std::time::Instant;

use crate::routing::NavigationHook;

/// Record a completed patrol pass.
pub fn record_patrol(hook: NavigationHook, outcome: &'static str) {
    metrics::counter!(
        "outpost_patrols_total",
        "hook" => hook.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record one outpost execution.
pub fn record_execution(outpost: &str, status: &'static str, start: Instant) {
    metrics::counter!(
        "outpost_executions_total",
        "outpost" => outpost.to_string(),
        "status" => status
    )
    .increment(1);

    metrics::histogram!(
        "outpost_execution_duration_seconds",
        "outpost" => outpost.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}
