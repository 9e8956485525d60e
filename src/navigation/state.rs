//! The active navigation record.
//!
//! One record per navigator holds everything a commit changes: the
//! current location, the committed params and context, the title binding,
//! and the generation counter that identifies the latest trigger.

use std::sync::Arc;

use crate::navigation::title::TitleBinding;
use crate::routing::node::RouteNode;
use crate::routing::types::{Context, MatchParams};

/// Identifies one trigger. Strictly increasing per navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutable navigation state, guarded by the navigator.
#[derive(Debug, Default)]
pub struct NavigationState {
    location: Option<String>,
    params: MatchParams,
    context: Context,
    generation: u64,
    routing: bool,
    title: TitleBinding,
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn set_location(&mut self, location: String) {
        self.location = Some(location);
    }

    /// Params committed by the last successful navigation.
    pub fn params(&self) -> &MatchParams {
        &self.params
    }

    /// Context committed by the last successful navigation.
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn title(&self) -> &TitleBinding {
        &self.title
    }

    pub fn generation(&self) -> Generation {
        Generation(self.generation)
    }

    pub fn is_routing(&self) -> bool {
        self.routing
    }

    /// Start a new generation, superseding any in flight.
    pub fn begin(&mut self) -> Generation {
        self.generation += 1;
        self.routing = true;
        Generation(self.generation)
    }

    /// Is `generation` still the latest?
    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation == generation.0
    }

    /// Commit a successful resolution's params and context.
    pub fn commit(&mut self, params: MatchParams, context: Context) {
        self.params = params;
        self.context = context;
    }

    /// Rebind the document title to the matched path.
    pub fn bind_title(&mut self, path: &[Arc<RouteNode>]) {
        self.title.bind(path);
    }

    /// Mark the current generation finished.
    pub fn finish(&mut self) {
        self.routing = false;
    }
}
