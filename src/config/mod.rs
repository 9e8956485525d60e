//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks on the route tree)
//!     → ManagerConfig (validated, immutable)
//!     → route_tree() → RouteNodeBuilder → gates attached → build()
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the route tree lives for the process
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Gates are code, so they are attached to the built tree, not declared

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::ManagerConfig;
pub use schema::NavigationConfig;
pub use schema::ObservabilityConfig;
pub use schema::RouteConfig;
