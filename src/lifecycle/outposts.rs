//! The outposts facade.
//!
//! # Responsibilities
//! - Build the registry and patrol from a validated config
//! - Install the three lifecycle hooks into the host router
//! - Translate outcomes into router decisions
//! - Expose deploy / abandon / attach / detach / teardown
//!
//! # Design Decisions
//! - Installed hooks hold a `Weak` handle; once the facade is gone they let
//!   every navigation through
//! - Patrol failures and panics are contained here: before hooks cancel,
//!   after hooks only log

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};

use futures_util::FutureExt;

use crate::config::{validate_config, ConfigError, OutpostsConfig};
use crate::lifecycle::installation::Installation;
use crate::observability::{LogLevel, LogRecord, OutpostLogger, PatrolLog, TracingLogger};
use crate::outpost::{OutpostRegistry, OutpostSpec, Scope};
use crate::patrol::{
    DebugObserver, ErrorHook, NavigationContext, Outcome, Patrol, PatrolError, PatrolSettings,
    TimeoutHook,
};
use crate::routing::{
    after_fn, guard_fn, NavigationDecision, NavigationHook, RouteLocation, RouterHost,
};

/// Builder for [`Outposts`].
pub struct OutpostsBuilder {
    router: Arc<dyn RouterHost>,
    config: OutpostsConfig,
    logger: Option<Arc<dyn OutpostLogger>>,
    on_error: Option<Arc<dyn ErrorHook>>,
    on_timeout: Option<Arc<dyn TimeoutHook>>,
    observer: Option<Arc<dyn DebugObserver>>,
}

impl OutpostsBuilder {
    pub fn config(mut self, config: OutpostsConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the default `tracing` logger.
    pub fn logger(mut self, logger: Arc<dyn OutpostLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Replace the default deny-and-log error strategy.
    pub fn on_error(mut self, hook: Arc<dyn ErrorHook>) -> Self {
        self.on_error = Some(hook);
        self
    }

    /// Replace the default deny-and-log timeout strategy.
    pub fn on_timeout(mut self, hook: Arc<dyn TimeoutHook>) -> Self {
        self.on_timeout = Some(hook);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn DebugObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Validate the config, build the patrol and attach it to the router.
    pub fn install(self) -> Result<Outposts, ConfigError> {
        validate_config(&self.config).map_err(ConfigError::Validation)?;

        let logger = self.logger.unwrap_or_else(|| Arc::new(TracingLogger));
        let log = PatrolLog::new(logger, self.config.log);

        let mut settings = PatrolSettings::from_config(&self.config, log.clone());
        if let Some(hook) = self.on_error {
            settings.on_error = hook;
        }
        if let Some(hook) = self.on_timeout {
            settings.on_timeout = hook;
        }
        if let Some(observer) = self.observer {
            settings.observer = observer;
        }

        let registry = Arc::new(OutpostRegistry::new(
            self.config.default_priority,
            self.config.default_hooks.clone(),
            log.clone(),
        ));
        let patrol = Patrol::new(registry.clone(), Arc::new(settings));

        let inner = Arc::new(Inner {
            installation: Installation::new(self.router.clone()),
            router: self.router,
            registry,
            patrol,
            log,
        });
        Inner::install_hooks(&inner);

        inner.log.info(LogRecord::new(
            LogLevel::Info,
            format!("Outposts installed ({} hooks)", inner.installation.active()),
        ));
        Ok(Outposts { inner })
    }
}

struct Inner {
    router: Arc<dyn RouterHost>,
    registry: Arc<OutpostRegistry>,
    patrol: Patrol,
    log: PatrolLog,
    installation: Installation,
}

impl Inner {
    fn install_hooks(inner: &Arc<Inner>) {
        for hook in [NavigationHook::BeforeEach, NavigationHook::BeforeResolve] {
            let weak = Arc::downgrade(inner);
            let guard = guard_fn(move |to, from| {
                let weak = weak.clone();
                async move {
                    match weak.upgrade() {
                        Some(inner) => inner.guard(hook, to, from).await,
                        None => NavigationDecision::Proceed,
                    }
                }
            });

            let id = match hook {
                NavigationHook::BeforeEach => inner.router.add_before_each(guard),
                _ => inner.router.add_before_resolve(guard),
            };
            inner.installation.record(id);
        }

        let weak: Weak<Inner> = Arc::downgrade(inner);
        let after = after_fn(move |to, from| {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    inner.after(to, from).await;
                }
            }
        });
        inner.installation.record(inner.router.add_after_each(after));
    }

    fn context(&self, hook: NavigationHook, to: RouteLocation, from: RouteLocation) -> Arc<NavigationContext> {
        Arc::new(NavigationContext::new(hook, to, from, self.router.clone()))
    }

    /// Patrol with panics turned into an error log. `None` if anything failed.
    async fn contained(&self, ctx: Arc<NavigationContext>) -> Option<Outcome> {
        let id = ctx.id;
        let hook = ctx.hook;

        match AssertUnwindSafe(self.patrol.run(ctx)).catch_unwind().await {
            Ok(Ok(outcome)) => Some(outcome),
            Ok(Err(err)) => {
                self.log.error(
                    LogRecord::new(LogLevel::Error, format!("Patrol failed: {}", err))
                        .outpost(err.outpost())
                        .navigation(id, hook),
                );
                None
            }
            Err(_) => {
                self.log.error(
                    LogRecord::new(LogLevel::Error, "Patrol panicked").navigation(id, hook),
                );
                None
            }
        }
    }

    async fn guard(&self, hook: NavigationHook, to: RouteLocation, from: RouteLocation) -> NavigationDecision {
        let ctx = self.context(hook, to, from);
        match self.contained(ctx).await {
            Some(outcome) => outcome.into(),
            None => NavigationDecision::Cancel,
        }
    }

    async fn after(&self, to: RouteLocation, from: RouteLocation) {
        let ctx = self.context(NavigationHook::AfterEach, to, from);
        let _ = self.contained(ctx).await;
    }
}

/// Navigation guards for a host router.
///
/// Owns the registry and the patrol; dropping the last handle turns the
/// installed hooks into no-ops. Call [`Outposts::teardown`] to detach them.
#[derive(Clone)]
pub struct Outposts {
    inner: Arc<Inner>,
}

impl Outposts {
    pub fn builder(router: Arc<dyn RouterHost>) -> OutpostsBuilder {
        OutpostsBuilder {
            router,
            config: OutpostsConfig::default(),
            logger: None,
            on_error: None,
            on_timeout: None,
            observer: None,
        }
    }

    /// Install with the default config and strategies.
    pub fn install(router: Arc<dyn RouterHost>) -> Result<Self, ConfigError> {
        Self::builder(router).install()
    }

    /// Register one outpost, overwriting any of the same scope and name.
    pub fn deploy(&self, spec: OutpostSpec) {
        self.inner.registry.register(spec);
    }

    pub fn deploy_all<I>(&self, specs: I)
    where
        I: IntoIterator<Item = OutpostSpec>,
    {
        for spec in specs {
            self.deploy(spec);
        }
    }

    /// Unregister outposts by name. True only if every name existed.
    ///
    /// Every name is attempted even after a miss.
    pub fn abandon<I, S>(&self, scope: Scope, names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut all = true;
        for name in names {
            all &= self.inner.registry.unregister(scope, name.as_ref());
        }
        all
    }

    /// Names of one scope, in registration order.
    pub fn list_names(&self, scope: Scope) -> Vec<String> {
        self.inner.registry.list_names(scope)
    }

    /// Add route outpost names to a named route. Names already present are skipped.
    ///
    /// Returns false if the route does not exist.
    pub fn attach_to_route<I, S>(&self, route: &str, names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(mut current) = self.route_outposts(route, "attach") else {
            return false;
        };

        for name in names {
            let name = name.as_ref();
            if !current.iter().any(|n| n == name) {
                current.push(name.to_string());
            }
        }
        self.inner.router.set_route_outposts(route, current)
    }

    /// Remove route outpost names from a named route.
    ///
    /// Returns false if the route does not exist.
    pub fn detach_from_route<I, S>(&self, route: &str, names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(mut current) = self.route_outposts(route, "detach") else {
            return false;
        };

        let names = names
            .into_iter()
            .map(|n| n.as_ref().to_string())
            .collect::<Vec<_>>();
        current.retain(|n| !names.contains(n));
        self.inner.router.set_route_outposts(route, current)
    }

    fn route_outposts(&self, route: &str, action: &str) -> Option<Vec<String>> {
        let current = self.inner.router.route_outposts(route);
        if current.is_none() {
            self.inner.log.warn(LogRecord::new(
                LogLevel::Warn,
                format!("Cannot {} outposts: route \"{}\" not found", action, route),
            ));
        }
        current
    }

    /// Detach every lifecycle hook and clear the registry. Idempotent.
    pub fn teardown(&self) {
        let detached = self.inner.installation.detach_all();
        self.inner.registry.clear();

        if detached > 0 {
            self.inner.log.info(LogRecord::new(
                LogLevel::Info,
                format!("Outposts torn down ({} hooks detached)", detached),
            ));
        }
    }

    /// Whether the lifecycle hooks are still attached.
    pub fn is_installed(&self) -> bool {
        self.inner.installation.active() > 0
    }

    pub fn registry(&self) -> &OutpostRegistry {
        &self.inner.registry
    }

    /// Run one patrol pass directly, bypassing the host router.
    ///
    /// Unlike the installed hooks, a failing error hook surfaces here.
    pub async fn patrol(
        &self,
        hook: NavigationHook,
        to: RouteLocation,
        from: RouteLocation,
    ) -> Result<Outcome, PatrolError> {
        let ctx = self.inner.context(hook, to, from);
        self.inner.patrol.run(ctx).await
    }
}
