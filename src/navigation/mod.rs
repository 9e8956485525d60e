//! Navigation subsystem.
//!
//! # Data Flow
//! ```text
//! set_location(value)
//!     → location.rs: encode structured values, normalize relative paths
//!     → navigator.rs: take a generation, split path/query
//!     → routing::Resolver: match the tree (gates may defer)
//!     → generation still current?
//!         no  → discard (Stale)
//!         yes → state.rs: commit params + context
//!               machine.rs: go_to_state(clean), then go_to_state(clean+dirty)
//!               title.rs: bind nearest titled node
//!     → nothing matched: go_to_state("404") if the root defines it
//! ```
//!
//! # Design Decisions
//! - The state machine is a trait; the navigator only names state paths
//! - State is guarded by a std Mutex that is never held across an await
//! - Location changes from outside arrive over an mpsc channel

pub mod location;
pub mod machine;
pub mod navigator;
pub mod state;
pub mod title;

pub use location::{extract_params, normalize, Location, LocationError};
pub use machine::{PathStateMachine, StateEvent, StateMachine};
pub use navigator::{NavigationOutcome, Navigator};
pub use state::{Generation, NavigationState};
pub use title::TitleBinding;
