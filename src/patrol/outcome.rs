//! Outcomes and their normalization.
//!
//! Handlers speak [`Verdict`], a permissive shape that also accepts raw JSON
//! values (`"/login"`, `{"name": "login"}`, ...). The patrol only ever acts on
//! [`Outcome`], the closed form produced by [`normalize`].

use serde_json::Value;
use thiserror::Error;

use crate::routing::{RedirectTarget, RouterHost};

/// The normalized result of an outpost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Allow,
    Block,
    Redirect(RedirectTarget),
}

impl Outcome {
    pub fn is_allow(&self) -> bool {
        matches!(self, Outcome::Allow)
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Allow => "allow",
            Outcome::Block => "block",
            Outcome::Redirect(_) => "redirect",
        }
    }
}

/// What a handler hands back, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Allow,
    Block,
    Redirect(RedirectTarget),
    /// Any other value; accepted only if it reads as a redirect target.
    Raw(Value),
}

impl From<Outcome> for Verdict {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Allow => Verdict::Allow,
            Outcome::Block => Verdict::Block,
            Outcome::Redirect(target) => Verdict::Redirect(target),
        }
    }
}

impl From<RedirectTarget> for Verdict {
    fn from(target: RedirectTarget) -> Self {
        Verdict::Redirect(target)
    }
}

impl From<&str> for Verdict {
    fn from(path: &str) -> Self {
        Verdict::Redirect(RedirectTarget::Path(path.to_string()))
    }
}

impl From<String> for Verdict {
    fn from(path: String) -> Self {
        Verdict::Redirect(RedirectTarget::Path(path))
    }
}

impl From<Value> for Verdict {
    fn from(value: Value) -> Self {
        Verdict::Raw(value)
    }
}

/// Normalization failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutcomeError {
    /// Neither a verdict nor a redirect target.
    #[error("invalid outcome: {value}")]
    InvalidOutcome { value: String },

    /// A redirect target that matches no route.
    #[error("redirect target {target} does not resolve to any route")]
    UnresolvableRedirect { target: RedirectTarget },
}

/// Convert a verdict into an [`Outcome`], validating redirect targets
/// against the live route table.
pub fn normalize(verdict: Verdict, router: &dyn RouterHost) -> Result<Outcome, OutcomeError> {
    match verdict {
        Verdict::Allow => Ok(Outcome::Allow),
        Verdict::Block => Ok(Outcome::Block),
        Verdict::Redirect(target) => validate_redirect(target, router),
        Verdict::Raw(value) => {
            let target = redirect_from_value(&value).ok_or_else(|| OutcomeError::InvalidOutcome {
                value: value.to_string(),
            })?;
            validate_redirect(target, router)
        }
    }
}

fn redirect_from_value(value: &Value) -> Option<RedirectTarget> {
    match value {
        Value::String(path) => Some(RedirectTarget::Path(path.clone())),
        Value::Object(map) if map.contains_key("name") || map.contains_key("path") => {
            serde_json::from_value(value.clone()).ok()
        }
        _ => None,
    }
}

fn validate_redirect(target: RedirectTarget, router: &dyn RouterHost) -> Result<Outcome, OutcomeError> {
    match router.resolve(&target) {
        Some(location) if location.is_resolved() => Ok(Outcome::Redirect(target)),
        _ => Err(OutcomeError::UnresolvableRedirect { target }),
    }
}
