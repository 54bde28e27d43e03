//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use router_outposts::observability::{LogLevel, LogRecord, OutpostLogger};
use router_outposts::outpost::{outpost_fn, OutpostHandler};
use router_outposts::patrol::Verdict;
use router_outposts::routing::{MemoryRouter, RouteDef};
use router_outposts::{Outposts, OutpostsConfig};

/// Logger capturing every record it receives.
#[derive(Default)]
pub struct RecordingLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingLogger {
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn at(&self, level: LogLevel) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.level == level)
            .collect()
    }

    /// Records at `level` whose message contains `needle`.
    pub fn matching(&self, level: LogLevel, needle: &str) -> Vec<LogRecord> {
        self.at(level)
            .into_iter()
            .filter(|r| r.message.contains(needle))
            .collect()
    }
}

impl OutpostLogger for RecordingLogger {
    fn log(&self, record: &LogRecord) {
        self.records.lock().unwrap().push(record.clone());
    }
}

/// Invocation order shared between handlers.
#[derive(Clone, Default)]
pub struct Calls(Arc<Mutex<Vec<String>>>);

impl Calls {
    pub fn push(&self, name: &str) {
        self.0.lock().unwrap().push(name.to_string());
    }

    pub fn names(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// A handler that records its invocation, then returns `verdict`.
pub fn recording(name: &str, calls: &Calls, verdict: Verdict) -> OutpostHandler {
    let name = name.to_string();
    let calls = calls.clone();
    outpost_fn(move |_ctx| {
        calls.push(&name);
        let verdict = verdict.clone();
        async move { Ok(verdict) }
    })
}

/// A handler that sleeps, then allows.
pub fn sleeping(duration: Duration) -> OutpostHandler {
    outpost_fn(move |_ctx| async move {
        tokio::time::sleep(duration).await;
        Ok(Verdict::Allow)
    })
}

/// Route table used across tests:
/// `/` home, `/login`, `/admin` with child `/admin/users/:id`, `/r`.
pub fn routes() -> Vec<RouteDef> {
    vec![
        RouteDef::named("home", "/"),
        RouteDef::named("login", "/login"),
        RouteDef::named("admin", "/admin").child(RouteDef::named("admin-user", "users/:id")),
        RouteDef::named("r", "/r"),
    ]
}

pub fn router() -> Arc<MemoryRouter> {
    Arc::new(MemoryRouter::new(routes()))
}

/// Install outposts with a recording logger.
pub fn install(
    router: &Arc<MemoryRouter>,
    config: OutpostsConfig,
) -> (Outposts, Arc<RecordingLogger>) {
    let logger = Arc::new(RecordingLogger::default());
    let outposts = Outposts::builder(router.clone())
        .config(config)
        .logger(logger.clone())
        .install()
        .unwrap();
    (outposts, logger)
}
