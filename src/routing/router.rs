//! In-memory router implementing [`RouterHost`].
//!
//! # Responsibilities
//! - Store nested route definitions and their metadata
//! - Resolve paths, named targets and located targets to [`RouteLocation`]
//! - Drive a navigation through before-each, before-resolve and after-each hooks
//!
//! # Design Decisions
//! - Most specific pattern wins; ties go to definition order
//! - Redirects re-enter the navigation with a bounded depth
//! - Hooks run in registration order
//! - Route metadata is mutable at runtime (outpost attach/detach)

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::routing::host::{AfterHook, HookId, NavigationDecision, NavigationGuard, RouterHost};
use crate::routing::location::{MatchedRoute, RedirectTarget, RouteLocation, RouteMeta};
use crate::routing::matcher::{join_paths, PathPattern};

/// Maximum redirect depth before a navigation is abandoned.
pub const MAX_REDIRECT_DEPTH: usize = 5;

/// Errors raised while driving a navigation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutingError {
    /// The target did not resolve to any route.
    #[error("No route matches {0}")]
    NotFound(String),

    /// Guards kept redirecting past the depth limit.
    #[error("Redirect loop detected after {0} redirects")]
    RedirectLoop(usize),
}

/// Final state of a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationResult {
    /// The navigation committed to this location.
    Completed(RouteLocation),
    /// A guard cancelled the navigation.
    Cancelled,
}

/// A route definition, possibly nested.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RouteDef {
    pub name: Option<String>,
    pub path: String,
    #[serde(default)]
    pub outposts: Vec<String>,
    #[serde(default)]
    pub children: Vec<RouteDef>,
}

impl RouteDef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn named(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn outposts<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outposts = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn child(mut self, child: RouteDef) -> Self {
        self.children.push(child);
        self
    }
}

/// A flattened route record.
#[derive(Debug)]
struct RouteRecord {
    name: Option<String>,
    pattern: PathPattern,
    parent: Option<usize>,
    meta: RwLock<RouteMeta>,
}

#[derive(Default)]
struct HookTable {
    before_each: Vec<(HookId, NavigationGuard)>,
    before_resolve: Vec<(HookId, NavigationGuard)>,
    after_each: Vec<(HookId, AfterHook)>,
}

/// A router keeping its route table and current location in memory.
pub struct MemoryRouter {
    records: Vec<RouteRecord>,
    hooks: RwLock<HookTable>,
    next_hook: AtomicU64,
    current: Mutex<RouteLocation>,
}

impl MemoryRouter {
    /// Build a router from route definitions.
    pub fn new(routes: Vec<RouteDef>) -> Self {
        let mut records = Vec::new();
        for route in routes {
            flatten(route, None, "/", &mut records);
        }

        tracing::debug!(routes = records.len(), "Route table compiled");

        Self {
            records,
            hooks: RwLock::new(HookTable::default()),
            next_hook: AtomicU64::new(1),
            current: Mutex::new(RouteLocation::start()),
        }
    }

    /// The location of the last completed navigation.
    pub fn current_route(&self) -> RouteLocation {
        self.current
            .lock()
            .map(|c| c.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Number of registered lifecycle hooks, across all three phases.
    pub fn hook_count(&self) -> usize {
        let hooks = self.hooks.read().unwrap_or_else(|p| p.into_inner());
        hooks.before_each.len() + hooks.before_resolve.len() + hooks.after_each.len()
    }

    /// Navigate to a target, running every registered hook.
    pub async fn navigate(
        &self,
        target: impl Into<RedirectTarget>,
    ) -> Result<NavigationResult, RoutingError> {
        let mut target = target.into();
        let from = self.current_route();

        for _ in 0..=MAX_REDIRECT_DEPTH {
            let to = self
                .resolve(&target)
                .filter(RouteLocation::is_resolved)
                .ok_or_else(|| RoutingError::NotFound(target.to_string()))?;

            let before_each = self.guards(|h| &h.before_each);
            match run_guards(&before_each, &to, &from).await {
                NavigationDecision::Proceed => {}
                NavigationDecision::Cancel => return Ok(NavigationResult::Cancelled),
                NavigationDecision::Redirect(next) => {
                    tracing::debug!(from = %to.full_path, to = %next, "Navigation redirected");
                    target = next;
                    continue;
                }
            }

            let before_resolve = self.guards(|h| &h.before_resolve);
            match run_guards(&before_resolve, &to, &from).await {
                NavigationDecision::Proceed => {}
                NavigationDecision::Cancel => return Ok(NavigationResult::Cancelled),
                NavigationDecision::Redirect(next) => {
                    tracing::debug!(from = %to.full_path, to = %next, "Navigation redirected");
                    target = next;
                    continue;
                }
            }

            match self.current.lock() {
                Ok(mut current) => *current = to.clone(),
                Err(poisoned) => *poisoned.into_inner() = to.clone(),
            }

            let after_each = {
                let hooks = self.hooks.read().unwrap_or_else(|p| p.into_inner());
                hooks.after_each.iter().map(|(_, h)| h.clone()).collect::<Vec<_>>()
            };
            for hook in after_each {
                hook(to.clone(), from.clone()).await;
            }

            return Ok(NavigationResult::Completed(to));
        }

        Err(RoutingError::RedirectLoop(MAX_REDIRECT_DEPTH))
    }

    fn guards(
        &self,
        select: impl Fn(&HookTable) -> &Vec<(HookId, NavigationGuard)>,
    ) -> Vec<NavigationGuard> {
        let hooks = self.hooks.read().unwrap_or_else(|p| p.into_inner());
        select(&hooks).iter().map(|(_, g)| g.clone()).collect()
    }

    fn next_id(&self) -> HookId {
        HookId(self.next_hook.fetch_add(1, Ordering::Relaxed))
    }

    fn find_by_name(&self, name: &str) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.name.as_deref() == Some(name))
    }

    fn find_by_path(&self, path: &str) -> Option<(usize, BTreeMap<String, String>)> {
        let mut best: Option<(usize, BTreeMap<String, String>)> = None;
        for (idx, record) in self.records.iter().enumerate() {
            if let Some(params) = record.pattern.matches(path) {
                let better = match &best {
                    None => true,
                    Some((current, _)) => {
                        record.pattern.depth() > self.records[*current].pattern.depth()
                    }
                };
                if better {
                    best = Some((idx, params));
                }
            }
        }
        best
    }

    /// Build a location for a matched record.
    fn location_for(
        &self,
        idx: usize,
        path: String,
        params: BTreeMap<String, String>,
        query: BTreeMap<String, String>,
        hash: String,
    ) -> RouteLocation {
        let mut chain = Vec::new();
        let mut cursor = Some(idx);
        while let Some(i) = cursor {
            let record = &self.records[i];
            let meta = record
                .meta
                .read()
                .map(|m| m.clone())
                .unwrap_or_else(|p| p.into_inner().clone());
            chain.push(MatchedRoute {
                name: record.name.clone(),
                path: record.pattern.as_str().to_string(),
                meta,
            });
            cursor = record.parent;
        }
        chain.reverse();

        let full_path = full_path(&path, &query, &hash);
        RouteLocation {
            name: self.records[idx].name.clone(),
            path,
            full_path,
            params,
            query,
            hash,
            matched: chain,
        }
    }

    fn unmatched(path: String, query: BTreeMap<String, String>, hash: String) -> RouteLocation {
        RouteLocation {
            full_path: full_path(&path, &query, &hash),
            path,
            query,
            hash,
            ..RouteLocation::default()
        }
    }

    fn resolve_path(
        &self,
        path: &str,
        query: BTreeMap<String, String>,
        hash: String,
    ) -> RouteLocation {
        match self.find_by_path(path) {
            Some((idx, params)) => {
                let clean = self.records[idx]
                    .pattern
                    .build(&params)
                    .unwrap_or_else(|| path.to_string());
                self.location_for(idx, clean, params, query, hash)
            }
            None => Self::unmatched(path.to_string(), query, hash),
        }
    }
}

impl RouterHost for MemoryRouter {
    fn resolve(&self, target: &RedirectTarget) -> Option<RouteLocation> {
        match target {
            RedirectTarget::Path(raw) => {
                let (path, query, hash) = parse_raw_path(raw)?;
                Some(self.resolve_path(&path, query, hash))
            }
            RedirectTarget::Located { path, query, hash } => {
                let (path, mut parsed_query, parsed_hash) = parse_raw_path(path)?;
                parsed_query.extend(query.clone());
                let hash = if hash.is_empty() { parsed_hash } else { hash.clone() };
                Some(self.resolve_path(&path, parsed_query, hash))
            }
            RedirectTarget::Named {
                name,
                params,
                query,
                hash,
            } => {
                let idx = self.find_by_name(name)?;
                let path = self.records[idx].pattern.build(params)?;
                Some(self.location_for(idx, path, params.clone(), query.clone(), hash.clone()))
            }
        }
    }

    fn route_outposts(&self, route_name: &str) -> Option<Vec<String>> {
        let idx = self.find_by_name(route_name)?;
        let meta = self.records[idx].meta.read().unwrap_or_else(|p| p.into_inner());
        Some(meta.outposts.clone())
    }

    fn set_route_outposts(&self, route_name: &str, outposts: Vec<String>) -> bool {
        let Some(idx) = self.find_by_name(route_name) else {
            return false;
        };
        let mut meta = self.records[idx]
            .meta
            .write()
            .unwrap_or_else(|p| p.into_inner());
        meta.outposts = outposts;
        true
    }

    fn add_before_each(&self, guard: NavigationGuard) -> HookId {
        let id = self.next_id();
        let mut hooks = self.hooks.write().unwrap_or_else(|p| p.into_inner());
        hooks.before_each.push((id, guard));
        id
    }

    fn add_before_resolve(&self, guard: NavigationGuard) -> HookId {
        let id = self.next_id();
        let mut hooks = self.hooks.write().unwrap_or_else(|p| p.into_inner());
        hooks.before_resolve.push((id, guard));
        id
    }

    fn add_after_each(&self, hook: AfterHook) -> HookId {
        let id = self.next_id();
        let mut hooks = self.hooks.write().unwrap_or_else(|p| p.into_inner());
        hooks.after_each.push((id, hook));
        id
    }

    fn remove_hook(&self, id: HookId) -> bool {
        let mut hooks = self.hooks.write().unwrap_or_else(|p| p.into_inner());
        let before = hooks.before_each.len() + hooks.before_resolve.len() + hooks.after_each.len();
        hooks.before_each.retain(|(i, _)| *i != id);
        hooks.before_resolve.retain(|(i, _)| *i != id);
        hooks.after_each.retain(|(i, _)| *i != id);
        let after = hooks.before_each.len() + hooks.before_resolve.len() + hooks.after_each.len();
        after < before
    }
}

async fn run_guards(
    guards: &[NavigationGuard],
    to: &RouteLocation,
    from: &RouteLocation,
) -> NavigationDecision {
    for guard in guards {
        let decision = guard(to.clone(), from.clone()).await;
        if decision != NavigationDecision::Proceed {
            return decision;
        }
    }
    NavigationDecision::Proceed
}

fn flatten(route: RouteDef, parent: Option<usize>, parent_path: &str, out: &mut Vec<RouteRecord>) {
    let full = join_paths(parent_path, &route.path);
    let idx = out.len();
    out.push(RouteRecord {
        name: route.name,
        pattern: PathPattern::parse(&full),
        parent,
        meta: RwLock::new(RouteMeta {
            outposts: route.outposts,
        }),
    });
    for child in route.children {
        flatten(child, Some(idx), &full, out);
    }
}

/// Split a raw path into path, query and hash.
fn parse_raw_path(raw: &str) -> Option<(String, BTreeMap<String, String>, String)> {
    if !raw.starts_with('/') {
        return None;
    }
    let base = Url::parse("memory://router").ok()?;
    let url = base.join(raw).ok()?;

    let query = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let hash = url.fragment().map(|f| format!("#{}", f)).unwrap_or_default();
    Some((url.path().to_string(), query, hash))
}

fn full_path(path: &str, query: &BTreeMap<String, String>, hash: &str) -> String {
    let mut out = path.to_string();
    if !query.is_empty() {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query.iter())
            .finish();
        out.push('?');
        out.push_str(&encoded);
    }
    out.push_str(hash);
    out
}
