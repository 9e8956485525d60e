//! Node admission gates.
//!
//! # Responsibilities
//! - Invoke a node's optional gate with the merged params and context
//! - Give the gate a read-only view of the navigation it belongs to
//! - Track asynchronous completions requested through a [`Transition`]
//! - Produce a single accept/reject verdict per evaluation
//!
//! # Design Decisions
//! - A gate answers synchronously unless it calls [`Transition::defer`]
//! - With N defers the node is accepted after N `ok()`s; one `fail()` rejects
//! - Progress lives in a `watch` channel, so completion can come from any task
//! - Dropping every handle before settling counts as a rejection
//! - Optional timeout bounds how long a deferred gate may take

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::routing::node::RouteNode;
use crate::routing::types::{Context, MatchParams, RoutingSnapshot};

/// The node being admitted and the navigation it is admitted into.
#[derive(Debug, Clone, Copy)]
pub struct GateOwner<'a> {
    node: &'a RouteNode,
    routing: &'a RoutingSnapshot,
}

impl<'a> GateOwner<'a> {
    pub fn new(node: &'a RouteNode, routing: &'a RoutingSnapshot) -> Self {
        Self { node, routing }
    }

    pub fn node(&self) -> &'a RouteNode {
        self.node
    }

    /// Navigation as it stood when the trigger started.
    pub fn routing(&self) -> &'a RoutingSnapshot {
        self.routing
    }

    /// Params committed before this trigger.
    pub fn previous_params(&self) -> &'a MatchParams {
        &self.routing.params
    }

    /// State active before this trigger.
    pub fn active_state(&self) -> Option<&'a str> {
        self.routing.active_state.as_deref()
    }
}

/// Admission predicate attached to a route node.
///
/// `admit` runs synchronously; a gate that needs to wait calls
/// [`Transition::defer`] and hands a clone of the transition to whatever
/// completes the work later. The returned `bool` is the verdict only when
/// no defer was requested.
pub trait Gate: Send + Sync {
    fn admit(
        &self,
        owner: &GateOwner<'_>,
        params: &MatchParams,
        transition: &Transition,
        context: &mut Context,
    ) -> bool;
}

impl<F> Gate for F
where
    F: Fn(&GateOwner<'_>, &MatchParams, &Transition, &mut Context) -> bool + Send + Sync,
{
    fn admit(
        &self,
        owner: &GateOwner<'_>,
        params: &MatchParams,
        transition: &Transition,
        context: &mut Context,
    ) -> bool {
        self(owner, params, transition, context)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct GateProgress {
    requested: usize,
    satisfied: usize,
    failed: bool,
}

impl GateProgress {
    fn is_settled(&self) -> bool {
        self.failed || self.satisfied >= self.requested
    }
}

/// Handle given to a gate for deferring its verdict.
///
/// Cheap to clone; every clone reports into the same evaluation.
#[derive(Clone)]
pub struct Transition {
    progress: Arc<watch::Sender<GateProgress>>,
}

impl Transition {
    fn new() -> (Self, watch::Receiver<GateProgress>) {
        let (tx, rx) = watch::channel(GateProgress::default());
        (Self { progress: Arc::new(tx) }, rx)
    }

    /// Register one pending asynchronous completion.
    pub fn defer(&self) {
        self.progress.send_modify(|p| p.requested += 1);
    }

    /// Satisfy one pending completion.
    pub fn ok(&self) {
        self.progress.send_modify(|p| p.satisfied += 1);
    }

    /// Reject the node, regardless of outstanding completions.
    pub fn fail(&self) {
        self.progress.send_modify(|p| p.failed = true);
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("progress", &*self.progress.borrow())
            .finish()
    }
}

/// Evaluate `node`'s gate, writing into `context` as the gate sees fit.
///
/// Nodes without a gate are accepted immediately.
pub async fn evaluate_gate(
    node: &RouteNode,
    routing: &RoutingSnapshot,
    params: &MatchParams,
    context: &mut Context,
    timeout: Option<Duration>,
) -> bool {
    let Some(gate) = node.gate() else {
        return true;
    };

    let (transition, mut progress) = Transition::new();
    let verdict = gate.admit(&GateOwner::new(node, routing), params, &transition, context);
    drop(transition);

    let snapshot = *progress.borrow();
    if snapshot.requested == 0 {
        return verdict && !snapshot.failed;
    }

    let settled = async {
        match progress.wait_for(GateProgress::is_settled).await {
            Ok(p) => !p.failed,
            Err(_) => {
                tracing::warn!(node = %node.name(), "Gate dropped its transition before settling");
                false
            }
        }
    };

    match timeout {
        Some(limit) => match tokio::time::timeout(limit, settled).await {
            Ok(accepted) => accepted,
            Err(_) => {
                tracing::warn!(node = %node.name(), timeout_ms = limit.as_millis() as u64, "Gate timed out");
                false
            }
        },
        None => settled.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn node_with_gate<F>(gate: F) -> RouteNode
    where
        F: Fn(&GateOwner<'_>, &MatchParams, &Transition, &mut Context) -> bool + Send + Sync + 'static,
    {
        RouteNode::builder("gated").gate(gate).build().unwrap()
    }

    #[tokio::test]
    async fn test_no_gate_accepts() {
        let node = RouteNode::builder("open").build().unwrap();
        assert!(evaluate_gate(&node, &RoutingSnapshot::default(), &MatchParams::new(), &mut Context::new(), None).await);
    }

    #[tokio::test]
    async fn test_sync_verdict() {
        let yes = node_with_gate(|_, _, _, _| true);
        let no = node_with_gate(|_, _, _, _| false);
        assert!(evaluate_gate(&yes, &RoutingSnapshot::default(), &MatchParams::new(), &mut Context::new(), None).await);
        assert!(!evaluate_gate(&no, &RoutingSnapshot::default(), &MatchParams::new(), &mut Context::new(), None).await);
    }

    #[tokio::test]
    async fn test_sync_fail_rejects_even_when_returning_true() {
        let node = node_with_gate(|_, _, transition, _| {
            transition.fail();
            true
        });
        assert!(!evaluate_gate(&node, &RoutingSnapshot::default(), &MatchParams::new(), &mut Context::new(), None).await);
    }

    #[tokio::test]
    async fn test_gate_sees_params_and_writes_context() {
        let node = node_with_gate(|_, params, _, context| {
            context.insert("seen", params.get("id").cloned().unwrap_or_default());
            true
        });
        let mut params = MatchParams::new();
        params.insert("id".into(), "7".into());
        let mut context = Context::new();

        assert!(evaluate_gate(&node, &RoutingSnapshot::default(), &params, &mut context, None).await);
        assert_eq!(context.get("seen"), Some(&serde_json::Value::from("7")));
    }

    #[tokio::test]
    async fn test_deferred_gate_waits_for_every_ok() {
        let held: Arc<Mutex<Option<Transition>>> = Arc::default();
        let slot = held.clone();
        let node = node_with_gate(move |_, _, transition, _| {
            transition.defer();
            transition.defer();
            *slot.lock().unwrap() = Some(transition.clone());
            // Ignored once a defer was requested
            false
        });

        let evaluation = tokio::spawn(async move {
            evaluate_gate(&node, &RoutingSnapshot::default(), &MatchParams::new(), &mut Context::new(), None).await
        });
        while held.lock().unwrap().is_none() {
            tokio::task::yield_now().await;
        }

        let transition = held.lock().unwrap().take().unwrap();
        transition.ok();
        tokio::task::yield_now().await;
        assert!(!evaluation.is_finished());

        transition.ok();
        assert!(evaluation.await.unwrap());
    }

    #[tokio::test]
    async fn test_fail_short_circuits_outstanding_oks() {
        let node = node_with_gate(|_, _, transition, _| {
            transition.defer();
            transition.defer();
            let t = transition.clone();
            tokio::spawn(async move {
                t.ok();
                t.fail();
            });
            true
        });
        assert!(!evaluate_gate(&node, &RoutingSnapshot::default(), &MatchParams::new(), &mut Context::new(), None).await);
    }

    #[tokio::test]
    async fn test_abandoned_transition_rejects() {
        let node = node_with_gate(|_, _, transition, _| {
            transition.defer();
            true
        });
        assert!(!evaluate_gate(&node, &RoutingSnapshot::default(), &MatchParams::new(), &mut Context::new(), None).await);
    }

    #[tokio::test]
    async fn test_gate_sees_owner_and_previous_navigation() {
        let node = node_with_gate(|owner, _, _, _| {
            owner.node().name() == "gated"
                && owner.active_state() == Some("posts.post")
                && owner.previous_params().get("postId").map(String::as_str) == Some("1")
                && owner.routing().location == "posts/2"
        });
        let mut routing = RoutingSnapshot {
            location: "posts/2".into(),
            active_state: Some("posts.post".into()),
            ..RoutingSnapshot::default()
        };
        routing.params.insert("postId".into(), "1".into());

        assert!(evaluate_gate(&node, &routing, &MatchParams::new(), &mut Context::new(), None).await);
        assert!(!evaluate_gate(&node, &RoutingSnapshot::default(), &MatchParams::new(), &mut Context::new(), None).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_gate_times_out() {
        let held: Arc<Mutex<Vec<Transition>>> = Arc::default();
        let slot = held.clone();
        let node = node_with_gate(move |_, _, transition, _| {
            transition.defer();
            slot.lock().unwrap().push(transition.clone());
            true
        });

        let accepted = evaluate_gate(
            &node,
            &RoutingSnapshot::default(),
            &MatchParams::new(),
            &mut Context::new(),
            Some(Duration::from_millis(50)),
        )
        .await;
        assert!(!accepted);
    }
}
