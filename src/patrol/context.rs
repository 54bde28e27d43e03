//! Per-navigation context handed to every outpost.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::patrol::outcome::Verdict;
use crate::routing::{NavigationHook, RedirectTarget, RouteLocation, RouterHost};

/// Everything an outpost may inspect about the navigation it patrols.
///
/// Built once per lifecycle event and shared, read-only, by every outpost
/// of that patrol pass.
pub struct NavigationContext {
    /// Correlation id of this patrol pass.
    pub id: Uuid,
    pub to: RouteLocation,
    pub from: RouteLocation,
    pub router: Arc<dyn RouterHost>,
    pub hook: NavigationHook,
}

impl NavigationContext {
    pub fn new(
        hook: NavigationHook,
        to: RouteLocation,
        from: RouteLocation,
        router: Arc<dyn RouterHost>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            to,
            from,
            router,
            hook,
        }
    }

    /// Let the navigation continue.
    pub fn allow(&self) -> Verdict {
        Verdict::Allow
    }

    /// Cancel the navigation.
    pub fn block(&self) -> Verdict {
        Verdict::Block
    }

    /// Send the navigation elsewhere.
    pub fn redirect(&self, target: impl Into<RedirectTarget>) -> Verdict {
        Verdict::Redirect(target.into())
    }
}

impl fmt::Debug for NavigationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationContext")
            .field("id", &self.id)
            .field("hook", &self.hook)
            .field("to", &self.to.full_path)
            .field("from", &self.from.full_path)
            .finish_non_exhaustive()
    }
}
