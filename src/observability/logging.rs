//! Structured logging.
//!
//! # Responsibilities
//! - Define the pluggable logger the patrol writes through
//! - Forward to `tracing` by default
//! - Gate informational records behind the verbosity flag
//! - Initialize a subscriber for binaries
//!
//! # Design Decisions
//! - Critical records (timeouts, faults, configuration warnings) are never gated
//! - Structured fields (outpost, hook, navigation id) travel with every record

use std::fmt;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::routing::NavigationHook;

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

/// A single log record emitted by the outposts.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub outpost: Option<String>,
    pub hook: Option<NavigationHook>,
    pub navigation_id: Option<Uuid>,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            outpost: None,
            hook: None,
            navigation_id: None,
        }
    }

    pub fn outpost(mut self, name: impl Into<String>) -> Self {
        self.outpost = Some(name.into());
        self
    }

    pub fn navigation(mut self, id: Uuid, hook: NavigationHook) -> Self {
        self.navigation_id = Some(id);
        self.hook = Some(hook);
        self
    }
}

/// Destination for outpost log records.
pub trait OutpostLogger: Send + Sync {
    fn log(&self, record: &LogRecord);
}

/// Default logger: forwards records to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl OutpostLogger for TracingLogger {
    fn log(&self, record: &LogRecord) {
        let outpost = record.outpost.as_deref().unwrap_or("-");
        let hook = record.hook.map(|h| h.as_str()).unwrap_or("-");
        let navigation_id = record.navigation_id.map(|id| id.to_string()).unwrap_or_default();

        match record.level {
            LogLevel::Debug => {
                tracing::debug!(outpost, hook, navigation_id = %navigation_id, "{}", record.message)
            }
            LogLevel::Info => {
                tracing::info!(outpost, hook, navigation_id = %navigation_id, "{}", record.message)
            }
            LogLevel::Warn => {
                tracing::warn!(outpost, hook, navigation_id = %navigation_id, "{}", record.message)
            }
            LogLevel::Error => {
                tracing::error!(outpost, hook, navigation_id = %navigation_id, "{}", record.message)
            }
        }
    }
}

/// Logger handle used inside the patrol, aware of the verbosity flag.
#[derive(Clone)]
pub struct PatrolLog {
    logger: Arc<dyn OutpostLogger>,
    verbose: bool,
}

impl PatrolLog {
    pub fn new(logger: Arc<dyn OutpostLogger>, verbose: bool) -> Self {
        Self { logger, verbose }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Emit an informational record, only when verbose.
    pub fn info(&self, record: LogRecord) {
        if self.verbose {
            self.logger.log(&LogRecord {
                level: LogLevel::Info,
                ..record
            });
        }
    }

    /// Emit a debug record, only when verbose.
    pub fn debug(&self, record: LogRecord) {
        if self.verbose {
            self.logger.log(&LogRecord {
                level: LogLevel::Debug,
                ..record
            });
        }
    }

    /// Emit a warning. Always emitted.
    pub fn warn(&self, record: LogRecord) {
        self.logger.log(&LogRecord {
            level: LogLevel::Warn,
            ..record
        });
    }

    /// Emit an error. Always emitted.
    pub fn error(&self, record: LogRecord) {
        self.logger.log(&LogRecord {
            level: LogLevel::Error,
            ..record
        });
    }
}

impl Default for PatrolLog {
    fn default() -> Self {
        Self::new(Arc::new(TracingLogger), false)
    }
}

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` wins over `default_directive` when set.
pub fn init_tracing(default_directive: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture(Mutex<Vec<LogRecord>>);

    impl OutpostLogger for Capture {
        fn log(&self, record: &LogRecord) {
            self.0.lock().unwrap().push(record.clone());
        }
    }

    #[test]
    fn test_verbosity_gates_only_informational() {
        let capture = Arc::new(Capture::default());
        let log = PatrolLog::new(capture.clone(), false);

        log.info(LogRecord::new(LogLevel::Info, "patrol started"));
        log.debug(LogRecord::new(LogLevel::Debug, "details"));
        log.warn(LogRecord::new(LogLevel::Warn, "duplicate").outpost("auth"));
        log.error(LogRecord::new(LogLevel::Error, "boom"));

        let records = capture.0.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level, LogLevel::Warn);
        assert_eq!(records[0].outpost.as_deref(), Some("auth"));
        assert_eq!(records[1].level, LogLevel::Error);
    }

    #[test]
    fn test_verbose_emits_everything() {
        let capture = Arc::new(Capture::default());
        let log = PatrolLog::new(capture.clone(), true);
        log.info(LogRecord::new(LogLevel::Warn, "patrol started"));
        assert_eq!(capture.0.lock().unwrap()[0].level, LogLevel::Info);
    }
}
