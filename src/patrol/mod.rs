//! Patrol engine.
//!
//! # Data Flow
//! ```text
//! Lifecycle event (hook, to, from)
//!     → context.rs (NavigationContext, one per event)
//!     → orchestrator.rs (collect route outposts, filter by hook, order)
//!     → executor.rs (load → race timeout → normalize) per outpost
//!         → outcome.rs (Verdict → Outcome)
//!         → hooks.rs on timeout / failure (custom or deny-and-log)
//!     → first non-Allow outcome wins, else Allow
//! ```
//!
//! # Design Decisions
//! - Strictly sequential: one outpost at a time per patrol
//! - Registry snapshots are read-only during a patrol
//! - Timeouts and faults are absorbed into outcomes at the executor boundary

pub mod context;
pub mod error;
pub mod executor;
pub mod hooks;
pub mod orchestrator;
pub mod outcome;

pub use context::NavigationContext;
pub use error::PatrolError;
pub use executor::{Executor, PatrolSettings};
pub use hooks::{
    error_hook_fn, timeout_hook_fn, DebugObserver, DebugPoint, DenyOnError, DenyOnTimeout,
    ErrorHook, HookFuture, TimeoutHook, TracingObserver,
};
pub use orchestrator::Patrol;
pub use outcome::{normalize, Outcome, OutcomeError, Verdict};
