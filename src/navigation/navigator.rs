//! Navigation trigger.
//!
//! # Responsibilities
//! - Store locations (normalized against the previous one)
//! - Resolve the current location against the route tree
//! - Commit params/context and drive the state machine on success
//! - Fall back to the root `404` state when nothing matches
//!
//! # Design Decisions
//! - Every trigger takes a new generation; a resolution whose generation
//!   was superseded while it waited on gates is discarded without effects
//! - Clean states are entered first, then the full path; an unchanged
//!   path with dirty nodes is forced through the neutral state
//! - A failed resolution keeps the previously committed params and title
//! - Params are committed and the state lock released before the machine
//!   runs, so entered states read the params they were entered for
//! - Gates see a snapshot of the previous navigation taken at trigger start
//! - Completed outcomes are broadcast for listeners such as the CLI

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{broadcast, mpsc};

use crate::config::schema::NavigationConfig;
use crate::navigation::location::{extract_params, normalize, Location};
use crate::navigation::machine::StateMachine;
use crate::navigation::state::{Generation, NavigationState};
use crate::observability::metrics;
use crate::routing::node::RouteNode;
use crate::routing::router::{Resolution, Resolver};
use crate::routing::types::{Context, MatchParams, RoutingSnapshot, NOT_FOUND, STATE_SEPARATOR};

/// Outcomes buffered per subscriber before the oldest are dropped.
const OUTCOME_CAPACITY: usize = 64;

/// How one trigger ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// A leaf matched and the state machine was moved to it.
    Navigated { clean: Vec<String>, dirty: Vec<String> },
    /// Nothing matched. `fallback` is true when the `404` state was entered.
    NotFound { fallback: bool },
    /// A newer trigger superseded this one before it completed.
    Stale,
}

impl NavigationOutcome {
    /// Dotted state path reached by this trigger, if any.
    pub fn state_path(&self) -> Option<String> {
        match self {
            Self::Navigated { clean, dirty } => Some(join_path(clean.iter().chain(dirty))),
            Self::NotFound { fallback: true } => Some(NOT_FOUND.to_string()),
            _ => None,
        }
    }

    /// Metric label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Navigated { .. } => "navigated",
            Self::NotFound { fallback: true } => "fallback",
            Self::NotFound { fallback: false } => "not_found",
            Self::Stale => "stale",
        }
    }
}

/// A trigger whose generation is taken but whose resolution hasn't run.
#[derive(Debug)]
struct Pending {
    generation: Generation,
    path: String,
    query: MatchParams,
    snapshot: RoutingSnapshot,
}

/// Binds a route tree to a state machine.
///
/// Lock order is machine, then state. The state lock is never held while
/// the machine runs, so entered states may read [`Navigator::params`] and
/// [`Navigator::context`]. They must not call [`Navigator::machine`].
pub struct Navigator<M> {
    root: Arc<RouteNode>,
    settings: NavigationConfig,
    state: Mutex<NavigationState>,
    machine: Mutex<M>,
    outcomes: broadcast::Sender<NavigationOutcome>,
}

impl<M: StateMachine> Navigator<M> {
    pub fn new(root: impl Into<Arc<RouteNode>>, machine: M, settings: NavigationConfig) -> Self {
        let (outcomes, _) = broadcast::channel(OUTCOME_CAPACITY);
        Self {
            root: root.into(),
            settings,
            state: Mutex::new(NavigationState::new()),
            machine: Mutex::new(machine),
            outcomes,
        }
    }

    pub fn root(&self) -> &Arc<RouteNode> {
        &self.root
    }

    pub fn settings(&self) -> &NavigationConfig {
        &self.settings
    }

    /// The last stored location, as normalized.
    pub fn location(&self) -> Option<String> {
        self.lock_state().location().map(String::from)
    }

    /// Params committed by the last successful navigation.
    pub fn params(&self) -> MatchParams {
        self.lock_state().params().clone()
    }

    /// Context committed by the last successful navigation.
    pub fn context(&self) -> Context {
        self.lock_state().context().clone()
    }

    /// Current title of the bound title source.
    pub fn document_title(&self) -> Option<String> {
        self.lock_state().title().title()
    }

    /// Name of the node the document title is bound to.
    pub fn title_source(&self) -> Option<String> {
        self.lock_state().title().source().map(String::from)
    }

    /// True while the latest trigger is still resolving.
    pub fn is_routing(&self) -> bool {
        self.lock_state().is_routing()
    }

    pub fn generation(&self) -> Generation {
        self.lock_state().generation()
    }

    /// Lock the state machine.
    pub fn machine(&self) -> MutexGuard<'_, M> {
        self.machine.lock().expect("state machine mutex poisoned")
    }

    /// Subscribe to the outcome of every trigger completed from now on.
    pub fn outcomes(&self) -> broadcast::Receiver<NavigationOutcome> {
        self.outcomes.subscribe()
    }

    /// Store a location without resolving it.
    ///
    /// Returns the normalized location.
    pub fn update_location(&self, location: impl Into<Location>) -> String {
        let encoded = location.into().encode();
        let mut state = self.lock_state();
        let normalized = normalize(state.location(), &encoded);
        tracing::debug!(location = %normalized, "Location updated");
        state.set_location(normalized.clone());
        normalized
    }

    /// Store a location and resolve it.
    pub async fn set_location(&self, location: impl Into<Location>) -> NavigationOutcome {
        self.update_location(location);
        self.trigger().await
    }

    /// Navigate to the configured initial location, if there is one and no
    /// location has been set yet.
    pub async fn start(&self) -> Option<NavigationOutcome> {
        let initial = self.settings.initial_location.clone()?;
        if self.location().is_some() {
            return None;
        }
        tracing::info!(location = %initial, "Navigating to initial location");
        Some(self.set_location(initial).await)
    }

    /// Resolve the current location.
    pub async fn trigger(&self) -> NavigationOutcome {
        let pending = self.begin();
        self.complete(pending).await
    }

    /// Take a generation and snapshot everything the resolution reads.
    fn begin(&self) -> Pending {
        let active_state = self.machine().current_state().map(String::from);

        let mut state = self.lock_state();
        let location = state.location().unwrap_or_default().to_string();
        let (path, query) = extract_params(&location);
        let pending = Pending {
            generation: state.begin(),
            path,
            query,
            snapshot: RoutingSnapshot {
                location,
                params: state.params().clone(),
                active_state,
            },
        };
        drop(state);

        metrics::record_trigger();
        tracing::debug!(generation = %pending.generation, path = %pending.path, "Resolving location");
        pending
    }

    async fn complete(&self, pending: Pending) -> NavigationOutcome {
        let Pending {
            generation,
            path,
            query,
            snapshot,
        } = pending;

        let resolver = Resolver::new(&snapshot, self.settings.gate_timeout());
        let resolution = resolver.resolve(&self.root, &path, query).await;

        // Held until every effect of this generation is applied
        let mut machine = self.machine();

        let mut state = self.lock_state();
        if !state.is_current(generation) {
            tracing::debug!(
                generation = %generation,
                current = %state.generation(),
                "Discarding superseded resolution"
            );
            drop(state);
            drop(machine);
            return self.finish(generation, &path, NavigationOutcome::Stale);
        }

        let Some(Resolution {
            clean,
            dirty,
            params,
            context,
            nodes,
        }) = resolution
        else {
            drop(state);
            let outcome = self.fall_back(&mut *machine, &path);
            drop(machine);
            return self.finish(generation, &path, outcome);
        };

        // Entered states observe the new params
        state.commit(params, context);
        drop(state);

        self.enter(&mut *machine, &clean, &dirty);
        self.lock_state().bind_title(&nodes);
        drop(machine);

        self.finish(generation, &path, NavigationOutcome::Navigated { clean, dirty })
    }

    fn enter(&self, machine: &mut M, clean: &[String], dirty: &[String]) {
        if !clean.is_empty() {
            machine.go_to_state(&join_path(clean));
        }
        if !dirty.is_empty() {
            let target = join_path(clean.iter().chain(dirty));
            if machine.current_state() == Some(target.as_str()) {
                machine.go_to_state(&self.settings.neutral_state);
            }
            machine.go_to_state(&target);
        }
    }

    fn fall_back(&self, machine: &mut M, path: &str) -> NavigationOutcome {
        if self.root.child(NOT_FOUND).is_none() {
            tracing::warn!(path = %path, "No route matched and no 404 state is defined");
            return NavigationOutcome::NotFound { fallback: false };
        }
        machine.go_to_state(NOT_FOUND);
        NavigationOutcome::NotFound { fallback: true }
    }

    /// Clear the routing flag if `generation` is still current, then record
    /// and publish the outcome.
    fn finish(&self, generation: Generation, path: &str, outcome: NavigationOutcome) -> NavigationOutcome {
        {
            let mut state = self.lock_state();
            if state.is_current(generation) {
                state.finish();
            }
        }

        metrics::record_outcome(outcome.label());
        match &outcome {
            NavigationOutcome::Navigated { .. } => {
                tracing::info!(
                    path = %path,
                    state = %outcome.state_path().unwrap_or_default(),
                    "Navigated"
                );
            }
            NavigationOutcome::NotFound { fallback } => {
                tracing::info!(path = %path, fallback = *fallback, "No route matched");
            }
            NavigationOutcome::Stale => {}
        }

        // No subscribers is fine
        let _ = self.outcomes.send(outcome.clone());
        outcome
    }

    fn lock_state(&self) -> MutexGuard<'_, NavigationState> {
        self.state.lock().expect("navigation state mutex poisoned")
    }
}

impl<M: StateMachine + 'static> Navigator<M> {
    /// Apply location updates until the channel closes or shutdown fires.
    ///
    /// Each update is stored and its generation taken in arrival order;
    /// the resolutions themselves run as separate tasks so a slow gate
    /// never blocks newer locations. Outcomes go to [`Navigator::outcomes`].
    pub async fn run(
        self: Arc<Self>,
        mut updates: mpsc::UnboundedReceiver<Location>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        tracing::info!("Navigator listening for location changes");

        loop {
            tokio::select! {
                update = updates.recv() => {
                    let Some(location) = update else {
                        tracing::info!("Location source closed, exiting loop");
                        break;
                    };
                    let location = self.update_location(location);
                    let pending = self.begin();
                    let navigator = self.clone();
                    tokio::spawn(async move {
                        let outcome = navigator.complete(pending).await;
                        tracing::debug!(location = %location, outcome = outcome.label(), "Update applied");
                    });
                }
                _ = shutdown.recv() => {
                    tracing::info!("Navigator received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

fn join_path<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut path = String::new();
    for name in names {
        if !path.is_empty() {
            path.push(STATE_SEPARATOR);
        }
        path.push_str(name.as_ref());
    }
    path
}
