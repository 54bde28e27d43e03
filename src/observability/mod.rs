//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Patrol + executor produce:
//!     → logging.rs (OutpostLogger records, verbosity-gated PatrolLog)
//!     → metrics.rs (counters, histograms)
//!     → debug checkpoints (patrol::hooks::DebugObserver)
//!
//! Consumers:
//!     → tracing subscriber (default logger)
//!     → custom OutpostLogger supplied by the application
//!     → any `metrics` recorder the application installs
//! ```
//!
//! # Design Decisions
//! - Logging goes through an injected strategy, `tracing` by default
//! - Critical signals are never silenced by the verbosity flag
//! - Every record carries the navigation id for correlation

pub mod logging;
pub mod metrics;

pub use logging::{init_tracing, LogLevel, LogRecord, OutpostLogger, PatrolLog, TracingLogger};
