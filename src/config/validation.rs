//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and list contents
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: OutpostsConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::OutpostsConfig;
use crate::routing::NavigationHook;

/// Upper bound for the pipeline-wide timeout.
pub const MAX_TIMEOUT_MS: u64 = 60 * 60 * 1000;

/// A semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("default_hooks must name at least one lifecycle hook")]
    NoDefaultHooks,

    #[error("default_hooks lists {0} more than once")]
    DuplicateHook(NavigationHook),

    #[error("default_timeout_ms {value} exceeds maximum {max}")]
    TimeoutTooLarge { value: u64, max: u64 },
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &OutpostsConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.default_hooks.is_empty() {
        errors.push(ValidationError::NoDefaultHooks);
    }

    let mut seen = HashSet::new();
    for hook in &config.default_hooks {
        if !seen.insert(*hook) {
            errors.push(ValidationError::DuplicateHook(*hook));
        }
    }

    if let Some(value) = config.default_timeout_ms {
        if value > MAX_TIMEOUT_MS {
            errors.push(ValidationError::TimeoutTooLarge {
                value,
                max: MAX_TIMEOUT_MS,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&OutpostsConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let config = OutpostsConfig {
            default_hooks: vec![NavigationHook::AfterEach, NavigationHook::AfterEach],
            default_timeout_ms: Some(MAX_TIMEOUT_MS + 1),
            ..OutpostsConfig::default()
        };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&ValidationError::DuplicateHook(NavigationHook::AfterEach)));

        let empty = OutpostsConfig {
            default_hooks: vec![],
            ..OutpostsConfig::default()
        };
        assert_eq!(
            validate_config(&empty).unwrap_err(),
            vec![ValidationError::NoDefaultHooks]
        );
    }
}
