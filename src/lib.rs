//! Hierarchical route manager.
//!
//! Maps location strings onto a tree of named route nodes and drives a
//! hierarchical state machine to the matched node's dotted state path.

pub mod config;
pub mod lifecycle;
pub mod navigation;
pub mod observability;
pub mod routing;

pub use config::schema::ManagerConfig;
pub use lifecycle::Shutdown;
pub use navigation::{Location, NavigationOutcome, Navigator, PathStateMachine, StateMachine};
pub use routing::{Gate, GateOwner, RouteNode, RouteNodeBuilder, RoutingSnapshot, Transition};
