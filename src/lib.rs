//! Navigation guards ("outposts") for client-side routers.
//!
//! Outposts are named async handlers attached to a host router's lifecycle
//! hooks. Each navigation runs a patrol: global outposts, then the
//! route-scoped outposts of the matched chain, in priority order, until one
//! blocks or redirects.

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod outpost;
pub mod patrol;
pub mod resilience;
pub mod routing;

pub use config::schema::OutpostsConfig;
pub use lifecycle::{Outposts, OutpostsBuilder};
pub use outpost::{loader_fn, outpost_fn, OutpostSpec, Scope};
pub use patrol::{NavigationContext, Outcome, PatrolError, Verdict};
pub use routing::{MemoryRouter, NavigationHook, RedirectTarget, RouteDef, RouteLocation, RouterHost};
