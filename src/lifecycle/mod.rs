//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Install (outposts.rs builder):
//!     Validate config → Build registry + patrol → Attach three router hooks
//!
//! Navigation (host router fires a hook):
//!     before_each / before_resolve → patrol → Outcome → NavigationDecision
//!     after_each                   → patrol → outcome discarded, errors logged
//!
//! Teardown:
//!     Detach hooks (installation.rs) → Clear registry
//! ```
//!
//! # Design Decisions
//! - Hooks hold a weak reference; a dropped facade lets navigations proceed
//! - Teardown is idempotent
//! - Nothing raised during a patrol reaches the host router

pub mod installation;
pub mod outposts;

pub use installation::Installation;
pub use outposts::{Outposts, OutpostsBuilder};
