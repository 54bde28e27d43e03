//! Route locations and redirect targets.
//!
//! # Responsibilities
//! - Describe a resolved navigation target (path, params, matched chain)
//! - Describe a candidate redirect target in any of its accepted shapes
//! - Carry per-route metadata (the route-scoped outpost names)

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Metadata attached to a route definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteMeta {
    /// Route-scoped outpost names to patrol when this route is matched.
    pub outposts: Vec<String>,
}

/// One entry of a location's matched chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedRoute {
    /// Route name, if the route is named.
    pub name: Option<String>,
    /// Full path pattern (e.g. `/users/:id`).
    pub path: String,
    /// Route metadata at resolution time.
    pub meta: RouteMeta,
}

/// A normalized navigation location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteLocation {
    /// Name of the leaf matched route.
    pub name: Option<String>,
    /// Path without query or hash.
    pub path: String,
    /// Path including query and hash.
    pub full_path: String,
    pub params: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub hash: String,
    /// Matched routes, root to leaf.
    pub matched: Vec<MatchedRoute>,
}

impl RouteLocation {
    /// The location a router sits at before its first navigation.
    pub fn start() -> Self {
        Self {
            path: "/".to_string(),
            full_path: "/".to_string(),
            ..Self::default()
        }
    }

    /// Whether this location resolved to at least one real route.
    pub fn is_resolved(&self) -> bool {
        !self.matched.is_empty()
    }
}

/// A redirect target, in any of the shapes a handler may produce.
///
/// Deserializes from a plain string (path), an object carrying `name`, or an
/// object carrying `path`. An object with both keys is read as named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RedirectTarget {
    Path(String),
    Named {
        name: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        params: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        query: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        hash: String,
    },
    Located {
        path: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        query: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        hash: String,
    },
}

impl RedirectTarget {
    /// Target a route by name, without params.
    pub fn named(name: impl Into<String>) -> Self {
        RedirectTarget::Named {
            name: name.into(),
            params: BTreeMap::new(),
            query: BTreeMap::new(),
            hash: String::new(),
        }
    }

    /// Target a route by name with path params.
    pub fn named_with<I, K, V>(name: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        RedirectTarget::Named {
            name: name.into(),
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            query: BTreeMap::new(),
            hash: String::new(),
        }
    }

    /// Target a path.
    pub fn path(path: impl Into<String>) -> Self {
        RedirectTarget::Path(path.into())
    }
}

impl From<&str> for RedirectTarget {
    fn from(path: &str) -> Self {
        RedirectTarget::Path(path.to_string())
    }
}

impl From<String> for RedirectTarget {
    fn from(path: String) -> Self {
        RedirectTarget::Path(path)
    }
}

impl From<&RouteLocation> for RedirectTarget {
    fn from(location: &RouteLocation) -> Self {
        RedirectTarget::Path(location.full_path.clone())
    }
}

impl fmt::Display for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectTarget::Path(path) => write!(f, "{}", path),
            RedirectTarget::Named { name, .. } => write!(f, "{{name: {}}}", name),
            RedirectTarget::Located { path, .. } => write!(f, "{{path: {}}}", path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_target_shapes_deserialize() {
        let t: RedirectTarget = serde_json::from_value(json!("/login")).unwrap();
        assert_eq!(t, RedirectTarget::path("/login"));

        let t: RedirectTarget = serde_json::from_value(json!({ "name": "login" })).unwrap();
        assert_eq!(t, RedirectTarget::named("login"));

        let t: RedirectTarget =
            serde_json::from_value(json!({ "path": "/login", "hash": "#top" })).unwrap();
        assert!(matches!(t, RedirectTarget::Located { ref hash, .. } if hash == "#top"));

        assert!(serde_json::from_value::<RedirectTarget>(json!(42)).is_err());
        assert!(serde_json::from_value::<RedirectTarget>(json!({ "other": 1 })).is_err());
    }

    #[test]
    fn test_start_location_is_unresolved() {
        let start = RouteLocation::start();
        assert_eq!(start.full_path, "/");
        assert!(!start.is_resolved());
    }
}
