//! Lazily loaded outpost handlers.
//!
//! # States
//! ```text
//! Unloaded(loader) → load ok  → Loaded(handler)   (memoized for good)
//! Unloaded(loader) → load err → Unloaded(loader)  (next use retries)
//! ```

use tokio::sync::OnceCell;

use crate::outpost::types::{BoxError, HandlerLoader, OutpostHandler};

/// A handler loaded on first use.
pub struct LazyHandler {
    loader: HandlerLoader,
    cell: OnceCell<OutpostHandler>,
}

impl LazyHandler {
    pub fn new(loader: HandlerLoader) -> Self {
        Self {
            loader,
            cell: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Load the handler, or return the memoized one.
    ///
    /// A failed load leaves the cell empty; a success is never replaced.
    pub async fn load(&self) -> Result<OutpostHandler, BoxError> {
        self.cell
            .get_or_try_init(|| (self.loader)())
            .await
            .cloned()
    }
}
