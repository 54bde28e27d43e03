//! Outpost subsystem.
//!
//! # Data Flow
//! ```text
//! OutpostSpec (name, scope, handler | loader, priority?, hooks?, timeout?)
//!     → registry.rs (apply defaults, insert/overwrite, rebuild ordered snapshot)
//!     → HandlerRecord (immutable, shared via Arc)
//!     → patrol reads OrderedOutposts per scope
//!
//! Lazy handlers (lazy.rs):
//!     first execution → loader → memoized handler
//! ```
//!
//! # Design Decisions
//! - Names are unique per scope; duplicates overwrite with a warning
//! - Records are immutable; redeploying replaces the record
//! - Handler loading is separate from execution (never timed)

pub mod lazy;
pub mod registry;
pub mod types;

pub use lazy::LazyHandler;
pub use registry::{OrderedOutposts, OutpostRegistry};
pub use types::{
    loader_fn, outpost_fn, BoxError, HandlerLoader, HandlerRecord, HandlerResult, HandlerSource,
    OutpostHandler, OutpostSpec, Scope,
};
