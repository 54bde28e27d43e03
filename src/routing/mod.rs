//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Navigation request (path | {name} | {path})
//!     → router.rs (resolve against the route table)
//!     → matcher.rs (evaluate path patterns, extract params)
//!     → location.rs (RouteLocation with matched chain + metadata)
//!     → host.rs lifecycle hooks (before_each → before_resolve → commit → after_each)
//! ```
//!
//! # Design Decisions
//! - The outposts depend only on the `RouterHost` trait, never on a concrete router
//! - `MemoryRouter` is a complete reference host (tests, simulator, embedding)
//! - Route metadata carries route-scoped outpost names and stays mutable at runtime

pub mod host;
pub mod location;
pub mod matcher;
pub mod router;

pub use host::{
    after_fn, guard_fn, AfterHook, HookId, NavigationDecision, NavigationGuard, NavigationHook,
    RouterHost,
};
pub use location::{MatchedRoute, RedirectTarget, RouteLocation, RouteMeta};
pub use router::{MemoryRouter, NavigationResult, RouteDef, RoutingError};
