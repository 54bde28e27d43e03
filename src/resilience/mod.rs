//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outpost execution:
//!     → timeouts.rs (resolve budget, race body against timer)
//!     → On expiry: HandlerTimeout path (timeout hook or deny)
//!     → On panic/error: HandlerFault path (error hook or deny)
//! ```
//!
//! # Design Decisions
//! - No retries: a failed outpost resolves to an outcome immediately
//! - Lazy loading happens before the race and is never timed

pub mod timeouts;
