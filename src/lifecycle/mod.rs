//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Location sources (watcher.rs):
//!     File modified → Read contents → Parse location → mpsc → Navigator::run
//!
//! Shutdown (shutdown.rs):
//!     Ctrl-C / input exhausted → broadcast → Navigator::run exits
//! ```
//!
//! # Design Decisions
//! - Event sources only produce locations; they never resolve
//! - Stopping a source drops its watcher handle, which unregisters it
//! - One broadcast channel reaches every long-running task

pub mod shutdown;
pub mod watcher;

pub use shutdown::Shutdown;
pub use watcher::LocationWatcher;
