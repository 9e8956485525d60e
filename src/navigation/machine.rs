//! State machine seam.
//!
//! The navigator never enters or exits states itself. It drives a
//! [`StateMachine`] by dotted state path (`posts.post.comments`) and leaves
//! enter/exit side effects to the implementation.

use crate::routing::types::STATE_SEPARATOR;

/// The capability the navigator needs from a hierarchical state machine.
pub trait StateMachine: Send {
    /// Transition to the state at `path`. Transitioning to the current
    /// path is a no-op.
    ///
    /// Called with the navigator's machine lock held and the new params
    /// already committed. Enter handlers may read the navigator's params and
    /// context but must not lock its machine.
    fn go_to_state(&mut self, path: &str);

    /// Dotted path of the active state, if any.
    fn current_state(&self) -> Option<&str>;
}

/// An enter or exit performed by [`PathStateMachine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    Enter(String),
    Exit(String),
}

/// In-memory state machine over dotted paths.
///
/// Moving from `a.b.c` to `a.d` exits `a.b.c` then `a.b`, and enters `a.d`.
/// Every enter/exit is recorded with the full path of the state.
#[derive(Debug, Default)]
pub struct PathStateMachine {
    active: Vec<String>,
    current: Option<String>,
    events: Vec<StateEvent>,
}

impl PathStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event recorded so far, oldest first.
    pub fn events(&self) -> &[StateEvent] {
        &self.events
    }

    /// Drain the recorded events.
    pub fn take_events(&mut self) -> Vec<StateEvent> {
        std::mem::take(&mut self.events)
    }

    /// Number of times the state at `path` was entered.
    pub fn enter_count(&self, path: &str) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, StateEvent::Enter(p) if p == path))
            .count()
    }

    /// Number of times the state at `path` was exited.
    pub fn exit_count(&self, path: &str) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, StateEvent::Exit(p) if p == path))
            .count()
    }

    fn path_of(names: &[String]) -> String {
        names.join(&STATE_SEPARATOR.to_string())
    }
}

impl StateMachine for PathStateMachine {
    fn go_to_state(&mut self, path: &str) {
        let target: Vec<String> = path
            .split(STATE_SEPARATOR)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();

        let shared = self
            .active
            .iter()
            .zip(&target)
            .take_while(|(active, wanted)| active == wanted)
            .count();

        while self.active.len() > shared {
            let exited = Self::path_of(&self.active);
            tracing::trace!(state = %exited, "Exit");
            self.events.push(StateEvent::Exit(exited));
            self.active.pop();
        }
        for name in &target[shared..] {
            self.active.push(name.clone());
            let entered = Self::path_of(&self.active);
            tracing::trace!(state = %entered, "Enter");
            self.events.push(StateEvent::Enter(entered));
        }

        self.current = (!target.is_empty()).then(|| Self::path_of(&target));
    }

    fn current_state(&self) -> Option<&str> {
        self.current.as_deref()
    }
}
