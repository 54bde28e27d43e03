//! Host router contract.
//!
//! The patrol engine never drives navigation itself. It plugs into a host
//! router through [`RouterHost`]: three lifecycle registration points, route
//! resolution for redirect validation, and mutable per-route metadata.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};

use crate::patrol::Outcome;
use crate::routing::location::{RedirectTarget, RouteLocation};

/// Which phase of a navigation triggered a patrol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationHook {
    BeforeEach,
    BeforeResolve,
    AfterEach,
}

impl NavigationHook {
    pub const ALL: [NavigationHook; 3] = [
        NavigationHook::BeforeEach,
        NavigationHook::BeforeResolve,
        NavigationHook::AfterEach,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationHook::BeforeEach => "before_each",
            NavigationHook::BeforeResolve => "before_resolve",
            NavigationHook::AfterEach => "after_each",
        }
    }
}

impl std::fmt::Display for NavigationHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a pre-navigation guard hands back to the host router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    Proceed,
    Cancel,
    Redirect(RedirectTarget),
}

impl From<Outcome> for NavigationDecision {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Allow => NavigationDecision::Proceed,
            Outcome::Block => NavigationDecision::Cancel,
            Outcome::Redirect(target) => NavigationDecision::Redirect(target),
        }
    }
}

/// Identifier returned when a lifecycle hook is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(pub u64);

/// A pre-navigation guard: `(to, from) -> decision`.
pub type NavigationGuard =
    Arc<dyn Fn(RouteLocation, RouteLocation) -> BoxFuture<'static, NavigationDecision> + Send + Sync>;

/// A post-navigation hook: `(to, from)`. Cannot affect the navigation.
pub type AfterHook =
    Arc<dyn Fn(RouteLocation, RouteLocation) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wrap an async closure as a [`NavigationGuard`].
pub fn guard_fn<F, Fut>(f: F) -> NavigationGuard
where
    F: Fn(RouteLocation, RouteLocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = NavigationDecision> + Send + 'static,
{
    Arc::new(move |to, from| f(to, from).boxed())
}

/// Wrap an async closure as an [`AfterHook`].
pub fn after_fn<F, Fut>(f: F) -> AfterHook
where
    F: Fn(RouteLocation, RouteLocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |to, from| f(to, from).boxed())
}

/// The host router as seen by the outposts.
pub trait RouterHost: Send + Sync {
    /// Resolve a candidate target against the live route table.
    ///
    /// Returns `None` when the target cannot be expressed as a location at
    /// all (unknown route name, missing params). A returned location with an
    /// empty matched chain did not resolve to a real route.
    fn resolve(&self, target: &RedirectTarget) -> Option<RouteLocation>;

    /// Route-scoped outpost names attached to a named route.
    fn route_outposts(&self, route_name: &str) -> Option<Vec<String>>;

    /// Replace the route-scoped outpost names of a named route.
    /// Returns false if the route does not exist.
    fn set_route_outposts(&self, route_name: &str, outposts: Vec<String>) -> bool;

    fn add_before_each(&self, guard: NavigationGuard) -> HookId;

    fn add_before_resolve(&self, guard: NavigationGuard) -> HookId;

    fn add_after_each(&self, hook: AfterHook) -> HookId;

    /// Detach a previously registered hook. Returns false if unknown.
    fn remove_hook(&self, id: HookId) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_from_outcome() {
        assert_eq!(NavigationDecision::from(Outcome::Allow), NavigationDecision::Proceed);
        assert_eq!(NavigationDecision::from(Outcome::Block), NavigationDecision::Cancel);
        assert_eq!(
            NavigationDecision::from(Outcome::Redirect(RedirectTarget::named("login"))),
            NavigationDecision::Redirect(RedirectTarget::named("login"))
        );
    }

    #[test]
    fn test_hook_serde_names() {
        let hook: NavigationHook = serde_json::from_str("\"before_resolve\"").unwrap();
        assert_eq!(hook, NavigationHook::BeforeResolve);
        assert_eq!(NavigationHook::AfterEach.to_string(), "after_each");
    }
}
