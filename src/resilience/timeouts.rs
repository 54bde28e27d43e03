//! Timeout enforcement.
//!
//! # Responsibilities
//! - Resolve the effective budget (explicit override, pipeline default, disabled)
//! - Race a handler body against that budget
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - The losing body is detached, not aborted: the patrol stops waiting on it
//! - Panics in the body surface as errors, never unwind into the caller

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinError;
use tracing::Instrument;

/// Why a raced body produced no value.
#[derive(Debug, Error)]
pub enum RaceError {
    #[error("timed out after {0:?}")]
    Elapsed(Duration),

    #[error("task failed: {0}")]
    Join(#[from] JoinError),
}

/// Pick the budget for one execution.
///
/// An explicit value always wins, including zero which disables the
/// timeout even when a default exists.
pub fn effective_timeout(explicit: Option<Duration>, default: Option<Duration>) -> Option<Duration> {
    explicit.or(default).filter(|d| !d.is_zero())
}

/// Run `body` on its own task and wait for it, up to `budget`.
pub async fn race<F, T>(budget: Option<Duration>, body: F) -> Result<T, RaceError>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::spawn(body.in_current_span());
    match budget {
        None => Ok(handle.await?),
        Some(limit) => match tokio::time::timeout(limit, handle).await {
            Ok(joined) => Ok(joined?),
            Err(_) => Err(RaceError::Elapsed(limit)),
        },
    }
}
