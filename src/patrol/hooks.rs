//! Pluggable failure hooks and debug checkpoints.
//!
//! Every strategy has a default, injected at construction, so the executor
//! never branches on "is a hook configured".

use std::future::{ready, Future};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};

use crate::observability::{LogLevel, LogRecord, PatrolLog};
use crate::outpost::HandlerResult;
use crate::patrol::context::NavigationContext;
use crate::patrol::error::PatrolError;
use crate::patrol::outcome::{Outcome, Verdict};

pub type HookFuture = BoxFuture<'static, HandlerResult>;

/// Decides the verdict when an outpost fails (error, panic, invalid outcome, load failure).
pub trait ErrorHook: Send + Sync {
    fn on_error(&self, error: PatrolError, ctx: Arc<NavigationContext>) -> HookFuture;
}

/// Decides the verdict when an outpost exceeds its timeout.
pub trait TimeoutHook: Send + Sync {
    fn on_timeout(&self, outpost: &str, timeout: Duration, ctx: Arc<NavigationContext>) -> HookFuture;
}

/// Named instrumentation points around an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugPoint {
    /// Right before an outpost runs.
    BeforeExecution,
    /// An outpost stopped the patrol (block or redirect).
    AfterStop,
}

/// Observes debug checkpoints. Purely observational.
pub trait DebugObserver: Send + Sync {
    fn checkpoint(&self, point: DebugPoint, outpost: &str, outcome: Option<&Outcome>, ctx: &NavigationContext);
}

/// Default error strategy: log at error level, block.
pub struct DenyOnError {
    log: PatrolLog,
}

impl DenyOnError {
    pub fn new(log: PatrolLog) -> Self {
        Self { log }
    }
}

impl ErrorHook for DenyOnError {
    fn on_error(&self, error: PatrolError, ctx: Arc<NavigationContext>) -> HookFuture {
        self.log.error(
            LogRecord::new(LogLevel::Error, error.to_string())
                .outpost(error.outpost())
                .navigation(ctx.id, ctx.hook),
        );
        ready(Ok(Verdict::Block)).boxed()
    }
}

/// Default timeout strategy: log at warn level, block.
pub struct DenyOnTimeout {
    log: PatrolLog,
}

impl DenyOnTimeout {
    pub fn new(log: PatrolLog) -> Self {
        Self { log }
    }
}

impl TimeoutHook for DenyOnTimeout {
    fn on_timeout(&self, outpost: &str, timeout: Duration, ctx: Arc<NavigationContext>) -> HookFuture {
        self.log.warn(
            LogRecord::new(
                LogLevel::Warn,
                format!("Outpost \"{}\" timed out after {:?}", outpost, timeout),
            )
            .outpost(outpost)
            .navigation(ctx.id, ctx.hook),
        );
        ready(Ok(Verdict::Block)).boxed()
    }
}

/// Default observer: emits checkpoints as `tracing` debug events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl DebugObserver for TracingObserver {
    fn checkpoint(&self, point: DebugPoint, outpost: &str, outcome: Option<&Outcome>, ctx: &NavigationContext) {
        tracing::debug!(
            checkpoint = ?point,
            outpost,
            outcome = outcome.map(Outcome::label).unwrap_or("-"),
            navigation_id = %ctx.id,
            to = %ctx.to.full_path,
            "Debug checkpoint"
        );
    }
}

struct FnErrorHook<F>(F);

impl<F, Fut> ErrorHook for FnErrorHook<F>
where
    F: Fn(PatrolError, Arc<NavigationContext>) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn on_error(&self, error: PatrolError, ctx: Arc<NavigationContext>) -> HookFuture {
        (self.0)(error, ctx).boxed()
    }
}

struct FnTimeoutHook<F>(F);

impl<F, Fut> TimeoutHook for FnTimeoutHook<F>
where
    F: Fn(String, Duration, Arc<NavigationContext>) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn on_timeout(&self, outpost: &str, timeout: Duration, ctx: Arc<NavigationContext>) -> HookFuture {
        (self.0)(outpost.to_string(), timeout, ctx).boxed()
    }
}

/// Wrap an async closure as an [`ErrorHook`].
pub fn error_hook_fn<F, Fut>(f: F) -> Arc<dyn ErrorHook>
where
    F: Fn(PatrolError, Arc<NavigationContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(FnErrorHook(f))
}

/// Wrap an async closure as a [`TimeoutHook`].
pub fn timeout_hook_fn<F, Fut>(f: F) -> Arc<dyn TimeoutHook>
where
    F: Fn(String, Duration, Arc<NavigationContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(FnTimeoutHook(f))
}
