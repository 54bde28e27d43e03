//! Outpost records and registration specs.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};

use crate::outpost::lazy::LazyHandler;
use crate::patrol::{NavigationContext, Verdict};
use crate::routing::NavigationHook;

/// Boxed error type for user-supplied handlers, loaders and hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What a handler produces: a verdict, or an error (the "throw" path).
pub type HandlerResult = Result<Verdict, BoxError>;

/// An outpost handler.
pub type OutpostHandler =
    Arc<dyn Fn(Arc<NavigationContext>) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Loads an outpost handler on first use.
pub type HandlerLoader =
    Arc<dyn Fn() -> BoxFuture<'static, Result<OutpostHandler, BoxError>> + Send + Sync>;

/// Wrap an async closure as an [`OutpostHandler`].
pub fn outpost_fn<F, Fut>(f: F) -> OutpostHandler
where
    F: Fn(Arc<NavigationContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx| f(ctx).boxed())
}

/// Wrap an async closure as a [`HandlerLoader`].
pub fn loader_fn<F, Fut>(f: F) -> HandlerLoader
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<OutpostHandler, BoxError>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Where an outpost applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Runs on every navigation.
    Global,
    /// Runs only when referenced by a matched route's metadata.
    Route,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::Route => "route",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The code behind an outpost.
pub enum HandlerSource {
    Eager(OutpostHandler),
    Lazy(LazyHandler),
}

impl HandlerSource {
    /// The callable handler, loading it first if lazy. Not subject to timeouts.
    pub async fn resolve(&self) -> Result<OutpostHandler, BoxError> {
        match self {
            HandlerSource::Eager(handler) => Ok(handler.clone()),
            HandlerSource::Lazy(lazy) => lazy.load().await,
        }
    }
}

impl std::fmt::Debug for HandlerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerSource::Eager(_) => f.write_str("Eager"),
            HandlerSource::Lazy(lazy) => write!(f, "Lazy(loaded: {})", lazy.is_loaded()),
        }
    }
}

/// A registered outpost.
#[derive(Debug)]
pub struct HandlerRecord {
    pub name: String,
    pub scope: Scope,
    /// Lower runs earlier.
    pub priority: i32,
    /// Lifecycle hooks this outpost patrols.
    pub hooks: Vec<NavigationHook>,
    /// Explicit timeout; `Some(ZERO)` disables, `None` defers to the pipeline default.
    pub timeout: Option<Duration>,
    pub source: HandlerSource,
    /// Registration sequence, the tie-breaker for equal priorities.
    pub(crate) seq: u64,
}

impl HandlerRecord {
    pub fn applies_to(&self, hook: NavigationHook) -> bool {
        self.hooks.contains(&hook)
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self.source, HandlerSource::Lazy(_))
    }
}

/// A request to deploy one outpost.
#[derive(Debug)]
pub struct OutpostSpec {
    pub scope: Scope,
    pub name: String,
    pub source: HandlerSource,
    pub priority: Option<i32>,
    pub hooks: Option<Vec<NavigationHook>>,
    pub timeout_ms: Option<u64>,
}

impl OutpostSpec {
    pub fn new(scope: Scope, name: impl Into<String>, handler: OutpostHandler) -> Self {
        Self {
            scope,
            name: name.into(),
            source: HandlerSource::Eager(handler),
            priority: None,
            hooks: None,
            timeout_ms: None,
        }
    }

    /// A global outpost, patrolling every navigation.
    pub fn global(name: impl Into<String>, handler: OutpostHandler) -> Self {
        Self::new(Scope::Global, name, handler)
    }

    /// A route outpost, patrolling routes that reference it.
    pub fn route(name: impl Into<String>, handler: OutpostHandler) -> Self {
        Self::new(Scope::Route, name, handler)
    }

    /// An outpost whose handler is loaded on first use.
    pub fn lazy(scope: Scope, name: impl Into<String>, loader: HandlerLoader) -> Self {
        Self {
            scope,
            name: name.into(),
            source: HandlerSource::Lazy(LazyHandler::new(loader)),
            priority: None,
            hooks: None,
            timeout_ms: None,
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn applies_to<I>(mut self, hooks: I) -> Self
    where
        I: IntoIterator<Item = NavigationHook>,
    {
        let mut list = Vec::new();
        for hook in hooks {
            if !list.contains(&hook) {
                list.push(hook);
            }
        }
        self.hooks = Some(list);
        self
    }

    /// Explicit timeout in milliseconds; `0` disables the timeout.
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Build the record, applying defaults for omitted fields.
    pub(crate) fn into_record(
        self,
        seq: u64,
        default_priority: i32,
        default_hooks: &[NavigationHook],
    ) -> HandlerRecord {
        HandlerRecord {
            name: self.name,
            scope: self.scope,
            priority: self.priority.unwrap_or(default_priority),
            hooks: self.hooks.unwrap_or_else(|| default_hooks.to_vec()),
            timeout: self.timeout_ms.map(Duration::from_millis),
            source: self.source,
            seq,
        }
    }
}
