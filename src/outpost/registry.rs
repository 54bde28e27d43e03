//! Outpost registry.
//!
//! # Responsibilities
//! - Hold global and route-scoped outposts by name
//! - Keep a priority-ordered snapshot per scope, rebuilt on every mutation
//! - Warn (never fail) on duplicate registration
//!
//! # Design Decisions
//! - Patrols read an immutable snapshot; sorting never happens during navigation
//! - Mutations are serialized per scope; readers never block
//! - Overwriting a name keeps its original registration slot

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use dashmap::DashMap;

use crate::observability::{LogLevel, LogRecord, PatrolLog};
use crate::outpost::types::{HandlerRecord, OutpostSpec, Scope};
use crate::routing::NavigationHook;

/// Priority-ordered outposts of one scope.
pub type OrderedOutposts = Arc<Vec<Arc<HandlerRecord>>>;

struct ScopeTable {
    records: DashMap<String, Arc<HandlerRecord>>,
    ordered: ArcSwap<Vec<Arc<HandlerRecord>>>,
    writer: Mutex<()>,
}

impl ScopeTable {
    fn new() -> Self {
        Self {
            records: DashMap::new(),
            ordered: ArcSwap::from_pointee(Vec::new()),
            writer: Mutex::new(()),
        }
    }

    /// Recompute the ordered snapshot: ascending priority, then registration order.
    fn rebuild(&self) {
        let mut all = self
            .records
            .iter()
            .map(|r| r.value().clone())
            .collect::<Vec<_>>();
        all.sort_by_key(|r| (r.priority, r.seq));
        self.ordered.store(Arc::new(all));
    }
}

/// Registry of deployed outposts, one table per scope.
pub struct OutpostRegistry {
    global: ScopeTable,
    route: ScopeTable,
    next_seq: AtomicU64,
    default_priority: i32,
    default_hooks: Vec<NavigationHook>,
    log: PatrolLog,
}

impl OutpostRegistry {
    pub fn new(default_priority: i32, default_hooks: Vec<NavigationHook>, log: PatrolLog) -> Self {
        Self {
            global: ScopeTable::new(),
            route: ScopeTable::new(),
            next_seq: AtomicU64::new(0),
            default_priority,
            default_hooks,
            log,
        }
    }

    fn table(&self, scope: Scope) -> &ScopeTable {
        match scope {
            Scope::Global => &self.global,
            Scope::Route => &self.route,
        }
    }

    /// Insert or overwrite an outpost. Returns true if a record was replaced.
    pub fn register(&self, spec: OutpostSpec) -> bool {
        let table = self.table(spec.scope);
        let _writer = table.writer.lock().unwrap_or_else(|p| p.into_inner());

        let previous_seq = table.records.get(&spec.name).map(|r| r.seq);
        let seq = previous_seq.unwrap_or_else(|| self.next_seq.fetch_add(1, Ordering::Relaxed));
        let scope = spec.scope;
        let record = Arc::new(spec.into_record(seq, self.default_priority, &self.default_hooks));
        let name = record.name.clone();

        table.records.insert(name.clone(), record);
        table.rebuild();

        if previous_seq.is_some() {
            self.log.warn(
                LogRecord::new(
                    LogLevel::Warn,
                    format!("Outpost \"{}\" already registered in {} scope, overwriting", name, scope),
                )
                .outpost(&name),
            );
        } else {
            self.log.debug(
                LogRecord::new(LogLevel::Debug, format!("Outpost deployed in {} scope", scope))
                    .outpost(&name),
            );
        }
        previous_seq.is_some()
    }

    /// Remove an outpost. Returns whether it existed.
    pub fn unregister(&self, scope: Scope, name: &str) -> bool {
        let table = self.table(scope);
        let _writer = table.writer.lock().unwrap_or_else(|p| p.into_inner());

        let removed = table.records.remove(name).is_some();
        if removed {
            table.rebuild();
        }
        removed
    }

    /// Names in registration order.
    pub fn list_names(&self, scope: Scope) -> Vec<String> {
        let mut records = self
            .table(scope)
            .records
            .iter()
            .map(|r| (r.value().seq, r.key().clone()))
            .collect::<Vec<_>>();
        records.sort();
        records.into_iter().map(|(_, name)| name).collect()
    }

    /// The current priority-ordered snapshot.
    pub fn ordered(&self, scope: Scope) -> OrderedOutposts {
        self.table(scope).ordered.load_full()
    }

    pub fn get(&self, scope: Scope, name: &str) -> Option<Arc<HandlerRecord>> {
        self.table(scope).records.get(name).map(|r| r.value().clone())
    }

    pub fn contains(&self, scope: Scope, name: &str) -> bool {
        self.table(scope).records.contains_key(name)
    }

    pub fn len(&self, scope: Scope) -> usize {
        self.table(scope).records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.global.records.is_empty() && self.route.records.is_empty()
    }

    /// Drop every outpost in both scopes.
    pub fn clear(&self) {
        for table in [&self.global, &self.route] {
            let _writer = table.writer.lock().unwrap_or_else(|p| p.into_inner());
            table.records.clear();
            table.rebuild();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outpost::types::outpost_fn;
    use crate::patrol::Verdict;

    fn spec(scope: Scope, name: &str) -> OutpostSpec {
        OutpostSpec::new(scope, name, outpost_fn(|_ctx| async { Ok(Verdict::Allow) }))
    }

    fn registry() -> OutpostRegistry {
        OutpostRegistry::new(100, vec![NavigationHook::BeforeEach], PatrolLog::default())
    }

    fn ordered_names(registry: &OutpostRegistry, scope: Scope) -> Vec<String> {
        registry.ordered(scope).iter().map(|r| r.name.clone()).collect()
    }

    #[test]
    fn test_ordered_by_priority_then_registration() {
        let registry = registry();
        registry.register(spec(Scope::Global, "low").priority(50));
        registry.register(spec(Scope::Global, "default-a"));
        registry.register(spec(Scope::Global, "high").priority(10));
        registry.register(spec(Scope::Global, "default-b"));

        assert_eq!(
            ordered_names(&registry, Scope::Global),
            vec!["high", "low", "default-a", "default-b"]
        );
        assert_eq!(
            registry.list_names(Scope::Global),
            vec!["low", "default-a", "high", "default-b"]
        );
        assert!(registry.ordered(Scope::Route).is_empty());
    }

    #[test]
    fn test_overwrite_keeps_slot_and_reorders() {
        let registry = registry();
        registry.register(spec(Scope::Route, "a").priority(1));
        registry.register(spec(Scope::Route, "b").priority(2));

        assert!(registry.register(spec(Scope::Route, "a").priority(3)));
        assert_eq!(registry.len(Scope::Route), 2);
        assert_eq!(ordered_names(&registry, Scope::Route), vec!["b", "a"]);
        assert_eq!(registry.list_names(Scope::Route), vec!["a", "b"]);
    }

    #[test]
    fn test_scopes_are_independent() {
        let registry = registry();
        registry.register(spec(Scope::Global, "shared"));
        registry.register(spec(Scope::Route, "shared"));

        assert!(registry.unregister(Scope::Global, "shared"));
        assert!(!registry.unregister(Scope::Global, "shared"));
        assert!(registry.contains(Scope::Route, "shared"));
        assert!(registry.ordered(Scope::Global).is_empty());

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.list_names(Scope::Route).is_empty());
        assert!(registry.ordered(Scope::Route).is_empty());
    }

    #[test]
    fn test_snapshot_is_stable_across_mutation() {
        let registry = registry();
        registry.register(spec(Scope::Global, "a"));
        let snapshot = registry.ordered(Scope::Global);

        registry.register(spec(Scope::Global, "b"));
        registry.unregister(Scope::Global, "a");

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name, "a");
        assert_eq!(ordered_names(&registry, Scope::Global), vec!["b"]);
    }
}
