//! Single-outpost execution.
//!
//! # Responsibilities
//! - Load the handler (lazy outposts), outside the timeout budget
//! - Race the handler body against its effective timeout
//! - Normalize the verdict
//! - Route timeouts and failures through the configured hooks
//!
//! # Design Decisions
//! - Timeouts and faults never escape: they always resolve to an outcome
//! - A failing timeout hook degrades to an error log + block
//! - A failing error hook is the one failure that propagates (PatrolError::ErrorHookFailed)

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;

use crate::config::OutpostsConfig;
use crate::observability::{metrics, LogLevel, LogRecord, PatrolLog};
use crate::outpost::HandlerRecord;
use crate::patrol::context::NavigationContext;
use crate::patrol::error::PatrolError;
use crate::patrol::hooks::{
    DebugObserver, DebugPoint, DenyOnError, DenyOnTimeout, ErrorHook, TimeoutHook, TracingObserver,
};
use crate::patrol::outcome::{normalize, Outcome};
use crate::resilience::timeouts::{effective_timeout, race, RaceError};

/// Runtime settings shared by the executor and the patrol.
pub struct PatrolSettings {
    /// Pipeline-wide timeout; `None` disables.
    pub default_timeout: Option<Duration>,
    pub debug: bool,
    pub metrics_enabled: bool,
    pub log: PatrolLog,
    pub on_error: Arc<dyn ErrorHook>,
    pub on_timeout: Arc<dyn TimeoutHook>,
    pub observer: Arc<dyn DebugObserver>,
}

impl PatrolSettings {
    /// Settings from a config, with the default deny-and-log strategies.
    pub fn from_config(config: &OutpostsConfig, log: PatrolLog) -> Self {
        Self {
            default_timeout: config.default_timeout_ms.map(Duration::from_millis),
            debug: config.debug,
            metrics_enabled: config.metrics_enabled,
            on_error: Arc::new(DenyOnError::new(log.clone())),
            on_timeout: Arc::new(DenyOnTimeout::new(log.clone())),
            observer: Arc::new(TracingObserver),
            log,
        }
    }
}

impl Default for PatrolSettings {
    fn default() -> Self {
        Self::from_config(&OutpostsConfig::default(), PatrolLog::default())
    }
}

/// Executes one outpost for one navigation.
#[derive(Clone)]
pub struct Executor {
    settings: Arc<PatrolSettings>,
}

impl Executor {
    pub fn new(settings: Arc<PatrolSettings>) -> Self {
        Self { settings }
    }

    /// Execute an outpost and resolve every failure mode into an outcome.
    pub async fn execute(
        &self,
        record: &HandlerRecord,
        ctx: &Arc<NavigationContext>,
    ) -> Result<Outcome, PatrolError> {
        let settings = &self.settings;
        let start = Instant::now();

        if settings.debug {
            settings
                .observer
                .checkpoint(DebugPoint::BeforeExecution, &record.name, None, ctx);
        }

        let (outcome, status) = match self.run(record, ctx).await {
            Ok(outcome) => {
                let status = outcome.label();
                (outcome, status)
            }
            Err(PatrolError::HandlerTimeout { outpost, timeout }) => {
                (self.recover_timeout(&outpost, timeout, ctx).await, "timeout")
            }
            Err(error) => match self.recover_error(error, ctx).await {
                Ok(outcome) => (outcome, "fault"),
                Err(failed) => {
                    // Still stops the navigation, one level up.
                    if settings.debug {
                        settings
                            .observer
                            .checkpoint(DebugPoint::AfterStop, &record.name, None, ctx);
                    }
                    if settings.metrics_enabled {
                        metrics::record_execution(&record.name, "fault", start);
                    }
                    return Err(failed);
                }
            },
        };

        settings.log.debug(
            LogRecord::new(
                LogLevel::Debug,
                format!("Outpost finished ({}) in {:?}", status, start.elapsed()),
            )
            .outpost(&record.name)
            .navigation(ctx.id, ctx.hook),
        );

        if settings.debug && !outcome.is_allow() {
            settings
                .observer
                .checkpoint(DebugPoint::AfterStop, &record.name, Some(&outcome), ctx);
        }

        if settings.metrics_enabled {
            metrics::record_execution(&record.name, status, start);
        }

        Ok(outcome)
    }

    /// Load, race and normalize. Failures are returned, not recovered.
    async fn run(
        &self,
        record: &HandlerRecord,
        ctx: &Arc<NavigationContext>,
    ) -> Result<Outcome, PatrolError> {
        let outpost = || record.name.clone();

        let handler = match AssertUnwindSafe(record.source.resolve()).catch_unwind().await {
            Ok(Ok(handler)) => handler,
            Ok(Err(source)) => {
                return Err(PatrolError::LazyLoad {
                    outpost: outpost(),
                    source,
                })
            }
            Err(panic) => {
                return Err(PatrolError::LazyLoad {
                    outpost: outpost(),
                    source: format!("loader panicked: {}", panic_message(panic)).into(),
                })
            }
        };

        let budget = effective_timeout(record.timeout, self.settings.default_timeout);
        let body_ctx = ctx.clone();
        let body = async move { handler(body_ctx).await };

        let verdict = match race(budget, body).await {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(source)) => {
                return Err(PatrolError::HandlerFault {
                    outpost: outpost(),
                    source,
                })
            }
            Err(RaceError::Elapsed(timeout)) => {
                return Err(PatrolError::HandlerTimeout {
                    outpost: outpost(),
                    timeout,
                })
            }
            Err(RaceError::Join(err)) => {
                return Err(PatrolError::HandlerFault {
                    outpost: outpost(),
                    source: Box::new(err),
                })
            }
        };

        normalize(verdict, ctx.router.as_ref()).map_err(|source| PatrolError::InvalidOutcome {
            outpost: outpost(),
            source,
        })
    }

    async fn recover_timeout(
        &self,
        outpost: &str,
        timeout: Duration,
        ctx: &Arc<NavigationContext>,
    ) -> Outcome {
        let hook = async {
            self.settings
                .on_timeout
                .on_timeout(outpost, timeout, ctx.clone())
                .await
        };

        match AssertUnwindSafe(hook).catch_unwind().await {
            Ok(Ok(verdict)) => match normalize(verdict, ctx.router.as_ref()) {
                Ok(outcome) => outcome,
                Err(err) => self.deny(
                    outpost,
                    ctx,
                    format!("Timeout hook for outpost \"{}\" returned an unusable outcome: {}", outpost, err),
                ),
            },
            Ok(Err(err)) => self.deny(
                outpost,
                ctx,
                format!("Timeout hook for outpost \"{}\" failed: {}", outpost, err),
            ),
            Err(panic) => self.deny(
                outpost,
                ctx,
                format!(
                    "Timeout hook for outpost \"{}\" panicked: {}",
                    outpost,
                    panic_message(panic)
                ),
            ),
        }
    }

    async fn recover_error(
        &self,
        error: PatrolError,
        ctx: &Arc<NavigationContext>,
    ) -> Result<Outcome, PatrolError> {
        let outpost = error.outpost().to_string();
        let hook = async { self.settings.on_error.on_error(error, ctx.clone()).await };

        match AssertUnwindSafe(hook).catch_unwind().await {
            Ok(Ok(verdict)) => normalize(verdict, ctx.router.as_ref()).map_err(|source| {
                PatrolError::ErrorHookFailed {
                    outpost,
                    source: Box::new(source),
                }
            }),
            Ok(Err(source)) => Err(PatrolError::ErrorHookFailed { outpost, source }),
            Err(panic) => Err(PatrolError::ErrorHookFailed {
                outpost,
                source: format!("error hook panicked: {}", panic_message(panic)).into(),
            }),
        }
    }

    /// Terminal fallback: error log, block.
    fn deny(&self, outpost: &str, ctx: &NavigationContext, message: String) -> Outcome {
        self.settings.log.error(
            LogRecord::new(LogLevel::Error, message)
                .outpost(outpost)
                .navigation(ctx.id, ctx.hook),
        );
        Outcome::Block
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
