//! Hook installation tracking.

use std::sync::{Arc, Mutex};

use crate::routing::{HookId, RouterHost};

/// The lifecycle hooks installed into a host router.
///
/// Detaching is idempotent: the ids are drained on the first call.
pub struct Installation {
    router: Arc<dyn RouterHost>,
    ids: Mutex<Vec<HookId>>,
}

impl Installation {
    pub fn new(router: Arc<dyn RouterHost>) -> Self {
        Self {
            router,
            ids: Mutex::new(Vec::new()),
        }
    }

    /// Remember a hook so it can be detached later.
    pub fn record(&self, id: HookId) {
        self.ids.lock().unwrap_or_else(|p| p.into_inner()).push(id);
    }

    /// Number of hooks currently installed.
    pub fn active(&self) -> usize {
        self.ids.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Detach every recorded hook. Returns how many the router knew about.
    pub fn detach_all(&self) -> usize {
        let ids = std::mem::take(&mut *self.ids.lock().unwrap_or_else(|p| p.into_inner()));
        ids.into_iter()
            .filter(|id| self.router.remove_hook(*id))
            .count()
    }
}
