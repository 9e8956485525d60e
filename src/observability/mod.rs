//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Routing and navigation produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (trigger, outcome and gate counters)
//!
//! Consumers:
//!     → Log output (stderr via tracing-subscriber)
//!     → Any metrics recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - Structured fields (generation, node, path) on every decision point
//! - The library never installs a metrics recorder; recording is free
//!   when none is present
//! - Log level comes from config, overridable with RUST_LOG

pub mod logging;
pub mod metrics;
