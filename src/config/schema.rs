//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::NavigationHook;

/// Priority given to outposts registered without one.
pub const DEFAULT_PRIORITY: i32 = 100;

/// Root configuration for the outposts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutpostsConfig {
    /// Priority applied when an outpost omits one (lower runs earlier).
    pub default_priority: i32,

    /// Pipeline-wide timeout in milliseconds. `None` or `0` disables it.
    pub default_timeout_ms: Option<u64>,

    /// Lifecycle hooks an outpost applies to when it omits its own list.
    pub default_hooks: Vec<NavigationHook>,

    /// Verbose patrol logging (informational records).
    pub log: bool,

    /// Fire debug checkpoints around each execution.
    pub debug: bool,

    /// Record patrol metrics through the `metrics` facade.
    pub metrics_enabled: bool,
}

impl Default for OutpostsConfig {
    fn default() -> Self {
        Self {
            default_priority: DEFAULT_PRIORITY,
            default_timeout_ms: None,
            default_hooks: vec![NavigationHook::BeforeEach],
            log: false,
            debug: false,
            metrics_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: OutpostsConfig = toml::from_str(
            r#"
            default_timeout_ms = 250
            default_hooks = ["before_each", "before_resolve"]
            "#,
        )
        .unwrap();

        assert_eq!(config.default_priority, DEFAULT_PRIORITY);
        assert_eq!(config.default_timeout_ms, Some(250));
        assert_eq!(config.default_hooks.len(), 2);
        assert!(!config.log);
        assert!(config.metrics_enabled);
    }
}
