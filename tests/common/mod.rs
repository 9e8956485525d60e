//! Shared fixtures for navigation tests.

use std::sync::{Arc, Mutex};

use route_manager::config::NavigationConfig;
use route_manager::navigation::{Navigator, PathStateMachine};
use route_manager::routing::{RouteNode, RouteNodeBuilder, Transition};

/// ```text
/// 404
/// home            (pass-through)
/// posts           posts            "Posts"
///   index         (pass-through)
///   post          :postId
///     show        (pass-through)
///     comments    comments
///       comment   :commentId       "Comment"
/// ```
pub fn blog() -> RouteNodeBuilder {
    RouteNode::root()
        .child(RouteNode::builder("404"))
        .child(RouteNode::builder("home"))
        .child(
            RouteNode::builder("posts")
                .pattern("posts")
                .document_title("Posts")
                .child(RouteNode::builder("index"))
                .child(
                    RouteNode::builder("post")
                        .pattern(":postId")
                        .child(RouteNode::builder("show"))
                        .child(
                            RouteNode::builder("comments").pattern("comments").child(
                                RouteNode::builder("comment")
                                    .pattern(":commentId")
                                    .document_title("Comment"),
                            ),
                        ),
                ),
        )
}

/// Build `tree` and bind it to a fresh in-memory state machine.
pub fn navigator(tree: RouteNodeBuilder) -> Navigator<PathStateMachine> {
    let root = tree.build().expect("fixture tree is valid");
    Navigator::new(root, PathStateMachine::new(), NavigationConfig::default())
}

/// Holds deferred transitions until a test settles them.
#[derive(Default)]
pub struct Latch {
    held: Mutex<Vec<Transition>>,
}

#[allow(dead_code)]
impl Latch {
    pub fn new() -> Arc<Self> {
        Arc::default()
    }

    /// Defer `transition` and keep it.
    pub fn hold(&self, transition: &Transition) {
        transition.defer();
        self.held.lock().unwrap().push(transition.clone());
    }

    pub fn len(&self) -> usize {
        self.held.lock().unwrap().len()
    }

    /// Yield until at least `count` transitions are held.
    pub async fn wait_for(&self, count: usize) {
        while self.len() < count {
            tokio::task::yield_now().await;
        }
    }

    /// Complete every held transition.
    pub fn release(&self) {
        for transition in self.held.lock().unwrap().drain(..) {
            transition.ok();
        }
    }

    /// Fail every held transition.
    pub fn reject(&self) {
        for transition in self.held.lock().unwrap().drain(..) {
            transition.fail();
        }
    }
}
