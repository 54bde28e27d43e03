//! Patrol orchestration.
//!
//! # States
//! ```text
//! Collecting → Executing-Global → Executing-Route → Resolved
//!      │               │                 │
//!      │ nothing       │ first non-allow │ first non-allow
//!      ▼ applicable    ▼                 ▼
//!    Allow          Outcome           Outcome
//! ```
//!
//! # Design Decisions
//! - Global outposts always run before route outposts
//! - Within a scope: ascending priority, then registration order
//! - Route outposts are collected from the whole matched chain and deduplicated
//! - Unknown route outpost names are skipped with a warning (forward references are legal)

use std::collections::HashSet;
use std::sync::Arc;

use crate::observability::{metrics, LogLevel, LogRecord};
use crate::outpost::{HandlerRecord, OutpostRegistry, Scope};
use crate::patrol::context::NavigationContext;
use crate::patrol::error::PatrolError;
use crate::patrol::executor::{Executor, PatrolSettings};
use crate::patrol::outcome::Outcome;

/// Runs every applicable outpost for one navigation event.
#[derive(Clone)]
pub struct Patrol {
    registry: Arc<OutpostRegistry>,
    executor: Executor,
    settings: Arc<PatrolSettings>,
}

impl Patrol {
    pub fn new(registry: Arc<OutpostRegistry>, settings: Arc<PatrolSettings>) -> Self {
        Self {
            registry,
            executor: Executor::new(settings.clone()),
            settings,
        }
    }

    /// Patrol one navigation event.
    pub async fn run(&self, ctx: Arc<NavigationContext>) -> Result<Outcome, PatrolError> {
        let result = self.patrol(&ctx).await;

        if self.settings.metrics_enabled {
            let label = match &result {
                Ok(outcome) => outcome.label(),
                Err(_) => "error",
            };
            metrics::record_patrol(ctx.hook, label);
        }
        result
    }

    async fn patrol(&self, ctx: &Arc<NavigationContext>) -> Result<Outcome, PatrolError> {
        let hook = ctx.hook;
        let log = &self.settings.log;

        // Collecting
        let chain = collect_route_outposts(ctx);
        let wanted = chain.names.iter().map(String::as_str).collect::<HashSet<_>>();

        let globals = self.registry.ordered(Scope::Global);
        let routes = self.registry.ordered(Scope::Route);

        let applicable_globals = globals
            .iter()
            .filter(|r| r.applies_to(hook))
            .collect::<Vec<_>>();
        let applicable_routes = routes
            .iter()
            .filter(|r| r.applies_to(hook) && wanted.contains(r.name.as_str()))
            .collect::<Vec<_>>();

        let total = applicable_globals.len() + applicable_routes.len();
        if total == 0 {
            return Ok(Outcome::Allow);
        }

        log.info(
            LogRecord::new(
                LogLevel::Info,
                format!("Patrolling {} outpost(s) for {}", total, ctx.to.full_path),
            )
            .navigation(ctx.id, hook),
        );

        if let Some(route) = &chain.first_duplicate_route {
            log.warn(
                LogRecord::new(
                    LogLevel::Warn,
                    format!(
                        "Duplicate route outposts {:?} in matched chain at route \"{}\"; each runs once",
                        chain.duplicates, route
                    ),
                )
                .navigation(ctx.id, hook),
            );
        }

        // Executing-Global
        for record in applicable_globals {
            if let Some(stop) = self.step(record, ctx).await? {
                return Ok(stop);
            }
        }

        // Executing-Route
        for name in &chain.names {
            if !self.registry.contains(Scope::Route, name) {
                log.warn(
                    LogRecord::new(
                        LogLevel::Warn,
                        format!(
                            "Route outpost \"{}\" referenced by {} is not registered, skipping",
                            name, ctx.to.full_path
                        ),
                    )
                    .outpost(name)
                    .navigation(ctx.id, hook),
                );
            }
        }

        for record in applicable_routes {
            if let Some(stop) = self.step(record, ctx).await? {
                return Ok(stop);
            }
        }

        // Resolved
        log.info(
            LogRecord::new(LogLevel::Info, "All outposts passed").navigation(ctx.id, hook),
        );
        Ok(Outcome::Allow)
    }

    /// Execute one outpost; `Some` if it stops the patrol.
    async fn step(
        &self,
        record: &HandlerRecord,
        ctx: &Arc<NavigationContext>,
    ) -> Result<Option<Outcome>, PatrolError> {
        let outcome = self.executor.execute(record, ctx).await?;
        if outcome.is_allow() {
            return Ok(None);
        }

        self.settings.log.info(
            LogRecord::new(
                LogLevel::Info,
                format!("Navigation stopped ({})", outcome.label()),
            )
            .outpost(&record.name)
            .navigation(ctx.id, ctx.hook),
        );
        Ok(Some(outcome))
    }
}

/// Route outpost names referenced along a matched chain.
struct ChainOutposts {
    /// Root to leaf, deduplicated in encounter order.
    names: Vec<String>,
    duplicates: Vec<String>,
    /// First route that repeated a name already seen higher in the chain.
    first_duplicate_route: Option<String>,
}

fn collect_route_outposts(ctx: &NavigationContext) -> ChainOutposts {
    let mut seen = HashSet::new();
    let mut chain = ChainOutposts {
        names: Vec::new(),
        duplicates: Vec::new(),
        first_duplicate_route: None,
    };

    for route in &ctx.to.matched {
        for name in &route.meta.outposts {
            if seen.insert(name.as_str()) {
                chain.names.push(name.clone());
            } else {
                chain.duplicates.push(name.clone());
                chain
                    .first_duplicate_route
                    .get_or_insert_with(|| route.name.clone().unwrap_or_else(|| route.path.clone()));
            }
        }
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::observability::{OutpostLogger, PatrolLog};
    use crate::outpost::{outpost_fn, OutpostSpec};
    use crate::patrol::Verdict;
    use crate::routing::{
        MemoryRouter, NavigationHook, RedirectTarget, RouteDef, RouteLocation, RouterHost,
    };

    #[derive(Default)]
    struct Capture(Mutex<Vec<LogRecord>>);

    impl OutpostLogger for Capture {
        fn log(&self, record: &LogRecord) {
            self.0.lock().unwrap().push(record.clone());
        }
    }

    fn router() -> Arc<MemoryRouter> {
        Arc::new(MemoryRouter::new(vec![RouteDef::named("admin", "/admin")
            .outposts(["shared"])
            .child(RouteDef::named("admin-user", "users/:id").outposts(["shared", "ghost"]))]))
    }

    fn patrol(capture: &Arc<Capture>) -> (Patrol, Arc<OutpostRegistry>) {
        let log = PatrolLog::new(capture.clone(), false);
        let registry = Arc::new(OutpostRegistry::new(100, vec![NavigationHook::BeforeEach], log.clone()));
        let settings = PatrolSettings {
            metrics_enabled: false,
            ..PatrolSettings::from_config(&Default::default(), log)
        };
        (Patrol::new(registry.clone(), Arc::new(settings)), registry)
    }

    fn context(router: &Arc<MemoryRouter>, hook: NavigationHook) -> Arc<NavigationContext> {
        let to = router.resolve(&RedirectTarget::path("/admin/users/7")).unwrap();
        Arc::new(NavigationContext::new(hook, to, RouteLocation::start(), router.clone()))
    }

    #[test]
    fn test_collect_dedups_in_chain_order() {
        let router = router();
        let chain = collect_route_outposts(&context(&router, NavigationHook::BeforeEach));
        assert_eq!(chain.names, vec!["shared", "ghost"]);
        assert_eq!(chain.duplicates, vec!["shared"]);
        assert_eq!(chain.first_duplicate_route.as_deref(), Some("admin-user"));
    }

    #[tokio::test]
    async fn test_structural_warnings_only_when_patrolling() {
        let router = router();
        let capture = Arc::new(Capture::default());
        let (patrol, registry) = patrol(&capture);
        registry.register(OutpostSpec::route(
            "shared",
            outpost_fn(|_ctx| async { Ok(Verdict::Allow) }),
        ));

        for hook in NavigationHook::ALL {
            let outcome = patrol.run(context(&router, hook)).await.unwrap();
            assert_eq!(outcome, Outcome::Allow);
        }

        let records = capture.0.lock().unwrap();
        let duplicates = records.iter().filter(|r| r.message.contains("Duplicate")).count();
        let missing = records.iter().filter(|r| r.message.contains("not registered")).count();
        assert_eq!(duplicates, 1);
        assert_eq!(missing, 1);
        assert!(records.iter().all(|r| r.hook == Some(NavigationHook::BeforeEach)));
    }
}
