//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or in-code OutpostsConfig
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → OutpostsConfig (validated, immutable)
//!     → PatrolSettings built once by the Outposts builder
//! ```
//!
//! # Design Decisions
//! - Config is immutable once installed
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{OutpostsConfig, DEFAULT_PRIORITY};
pub use validation::{validate_config, ValidationError};
