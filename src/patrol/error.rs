//! Patrol error definitions.

use std::time::Duration;

use thiserror::Error;

use crate::outpost::BoxError;
use crate::patrol::outcome::OutcomeError;

/// Failures raised while executing outposts.
///
/// Everything except [`PatrolError::ErrorHookFailed`] is absorbed by the
/// executor and turned into an outcome.
#[derive(Debug, Error)]
pub enum PatrolError {
    /// The outpost returned something that is not a valid outcome.
    #[error("Outpost \"{outpost}\" returned an unusable outcome: {source}")]
    InvalidOutcome {
        outpost: String,
        source: OutcomeError,
    },

    /// The outpost returned an error or panicked.
    #[error("Outpost \"{outpost}\" failed: {source}")]
    HandlerFault { outpost: String, source: BoxError },

    /// The outpost exceeded its timeout budget.
    #[error("Outpost \"{outpost}\" timed out after {timeout:?}")]
    HandlerTimeout { outpost: String, timeout: Duration },

    /// The lazy loader of the outpost failed.
    #[error("Outpost \"{outpost}\" could not be loaded: {source}")]
    LazyLoad { outpost: String, source: BoxError },

    /// A custom error hook failed while handling another failure.
    #[error("Error hook failed while handling outpost \"{outpost}\": {source}")]
    ErrorHookFailed { outpost: String, source: BoxError },
}

impl PatrolError {
    /// Name of the outpost the failure belongs to.
    pub fn outpost(&self) -> &str {
        match self {
            PatrolError::InvalidOutcome { outpost, .. }
            | PatrolError::HandlerFault { outpost, .. }
            | PatrolError::HandlerTimeout { outpost, .. }
            | PatrolError::LazyLoad { outpost, .. }
            | PatrolError::ErrorHookFailed { outpost, .. } => outpost,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PatrolError::HandlerTimeout { .. })
    }
}
