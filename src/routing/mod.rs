//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Path tail (segments, query stripped)
//!     → router.rs (walk tree level by level)
//!     → per level: routable children sorted by priority
//!         → matcher.rs (pattern vs. head of tail)
//!         → gate.rs (admission, possibly deferred)
//!         → router.rs (recurse into the child)
//!     → join all candidates, first acceptor in priority order wins
//!     → Return: Resolution (clean/dirty names, params, context) or None
//!
//! Tree Construction (at startup):
//!     RouteConfig[] or builders
//!     → node.rs (parse patterns, compile regexes, check sibling names)
//!     → Freeze as immutable Arc<RouteNode> tree
//! ```
//!
//! # Design Decisions
//! - Trees are validated at build time; matching never errors
//! - Deterministic: same input and gate verdicts always pick the same leaf
//! - First acceptor wins, ordered by priority then declaration
//! - The `404` child is reserved for fallback and never matched

pub mod gate;
pub mod matcher;
pub mod node;
pub mod router;
pub mod types;

pub use gate::{Gate, GateOwner, Transition};
pub use matcher::{MatchOutcome, RoutePattern, SegmentToken};
pub use node::{RouteNode, RouteNodeBuilder};
pub use router::{Resolution, Resolver};
pub use types::{Context, MatchParams, RouteError, RouteResult, RoutingSnapshot, NOT_FOUND};
