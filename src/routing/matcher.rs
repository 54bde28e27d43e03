//! Path pattern matching.
//!
//! # Responsibilities
//! - Compile route path patterns (`/users/:id`) into segments
//! - Match a concrete path and extract params
//! - Build a concrete path back from params (named navigation)
//!
//! # Design Decisions
//! - Static segments are case-sensitive
//! - Trailing slashes are ignored on both sides
//! - No regex: a pattern is a flat list of static/param segments

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
}

/// A compiled route path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern. Segments starting with `:` capture a param.
    pub fn parse(pattern: &str) -> Self {
        let segments = split(pattern)
            .map(|s| match s.strip_prefix(':') {
                Some(param) => Segment::Param(param.to_string()),
                None => Segment::Static(s.to_string()),
            })
            .collect::<Vec<_>>();

        Self {
            raw: normalize(pattern),
            segments,
        }
    }

    /// The normalized pattern text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of segments; deeper patterns are more specific.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Match a concrete path, returning captured params.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let parts = split(path).collect::<Vec<_>>();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Static(s) if s == part => {}
                Segment::Static(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }

    /// Build a concrete path from params. Fails if a param is missing.
    pub fn build(&self, params: &BTreeMap<String, String>) -> Option<String> {
        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            match segment {
                Segment::Static(s) => out.push_str(s),
                Segment::Param(name) => out.push_str(params.get(name)?),
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        Some(out)
    }
}

/// Join a child route path onto its parent. Absolute children stand alone.
pub fn join_paths(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        normalize(child)
    } else if child.is_empty() {
        normalize(parent)
    } else {
        normalize(&format!("{}/{}", parent.trim_end_matches('/'), child))
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn normalize(path: &str) -> String {
    let joined = split(path).collect::<Vec<_>>().join("/");
    format!("/{}", joined)
}
