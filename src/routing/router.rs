//! Route tree resolution.
//!
//! # Responsibilities
//! - Walk the tree from the root, matching each level's children
//! - Merge captured params and split the matched path into clean/dirty
//! - Return the first accepting leaf in priority order, or no match
//!
//! # Design Decisions
//! - Siblings are matched concurrently and joined before selection, so
//!   the winner is chosen by priority order, never by completion order
//! - Each candidate branch owns a copy of params and context
//! - Only leaves are routable: a node with routable children must hand
//!   the path on to one of them
//! - Dirtiness is sticky: once a node is dirty, every descendant is too

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{join_all, BoxFuture};
use futures_util::FutureExt;

use crate::observability::metrics;
use crate::routing::gate::evaluate_gate;
use crate::routing::node::RouteNode;
use crate::routing::types::{Context, MatchParams, RoutingSnapshot};

/// The outcome of a successful resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Leading node names whose captured params did not change.
    pub clean: Vec<String>,
    /// Remaining node names, which must be re-entered.
    pub dirty: Vec<String>,
    /// Query params merged with every captured param along the path.
    pub params: MatchParams,
    /// Context as left by the gates of the matched branch.
    pub context: Context,
    /// Matched nodes, root child first, leaf last.
    pub nodes: Vec<Arc<RouteNode>>,
}

impl Resolution {
    /// All matched node names, clean then dirty.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clean.iter().chain(self.dirty.iter()).map(String::as_str)
    }

    /// The deepest matched node.
    pub fn leaf(&self) -> Option<&Arc<RouteNode>> {
        self.nodes.last()
    }
}

/// Accumulated state of one branch while descending.
#[derive(Debug, Clone, Default)]
struct Branch {
    clean: Vec<String>,
    dirty: Vec<String>,
    params: MatchParams,
    context: Context,
    nodes: Vec<Arc<RouteNode>>,
}

impl Branch {
    fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    fn finish(self) -> Resolution {
        Resolution {
            clean: self.clean,
            dirty: self.dirty,
            params: self.params,
            context: self.context,
            nodes: self.nodes,
        }
    }
}

/// Resolves paths against one route tree for one trigger.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    /// Navigation before this trigger. Its params are the dirtiness baseline.
    routing: &'a RoutingSnapshot,
    gate_timeout: Option<Duration>,
}

impl<'a> Resolver<'a> {
    pub fn new(routing: &'a RoutingSnapshot, gate_timeout: Option<Duration>) -> Self {
        Self { routing, gate_timeout }
    }

    /// Resolve `path` (query already stripped) from `root`.
    ///
    /// `params` seeds the merged params (typically the query params) and
    /// the context starts fresh.
    pub async fn resolve(&self, root: &Arc<RouteNode>, path: &str, params: MatchParams) -> Option<Resolution> {
        let segments = split_segments(path);
        let branch = Branch {
            params,
            ..Branch::default()
        };
        self.resolve_tree(&segments, root, branch).await
    }

    /// Descend from `node` with the remaining `tail`.
    fn resolve_tree<'s>(
        &'s self,
        tail: &'s [String],
        node: &'s Arc<RouteNode>,
        branch: Branch,
    ) -> BoxFuture<'s, Option<Resolution>> {
        async move {
            let candidates = node.routable_children();
            if candidates.is_empty() {
                // Leaf: succeeds only once the path is fully consumed
                return tail.is_empty().then(|| branch.finish());
            }
            self.resolve_siblings(&candidates, tail, &branch).await
        }
        .boxed()
    }

    /// Match every candidate concurrently; pick the first acceptor in order.
    ///
    /// `candidates` must already be in priority order.
    async fn resolve_siblings(
        &self,
        candidates: &[&Arc<RouteNode>],
        tail: &[String],
        branch: &Branch,
    ) -> Option<Resolution> {
        let attempts = candidates
            .iter()
            .map(|child| self.match_child(child, tail, branch.clone()));
        let results = join_all(attempts).await;

        let (winner, resolution) = candidates
            .iter()
            .zip(results)
            .find_map(|(child, result)| result.map(|resolution| (child, resolution)))?;

        tracing::debug!(node = %winner.name(), priority = winner.priority(), "Sibling selected");
        Some(resolution)
    }

    /// Match one child: pattern, then gate, then the subtree below it.
    fn match_child<'s>(
        &'s self,
        child: &'s Arc<RouteNode>,
        tail: &'s [String],
        mut branch: Branch,
    ) -> BoxFuture<'s, Option<Resolution>> {
        async move {
            let matched = child.pattern().match_tail(tail)?;

            let changed = matched
                .params
                .iter()
                .any(|(key, value)| self.routing.params.get(key) != Some(value));
            let dirty = branch.is_dirty() || changed;
            branch.params.extend(matched.params);

            if !evaluate_gate(child, self.routing, &branch.params, &mut branch.context, self.gate_timeout).await {
                tracing::debug!(node = %child.name(), "Gate rejected");
                metrics::record_gate_rejection();
                return None;
            }

            if dirty {
                branch.dirty.push(child.name().to_string());
            } else {
                branch.clean.push(child.name().to_string());
            }
            branch.nodes.push(child.clone());

            self.resolve_tree(&tail[matched.consumed..], child, branch).await
        }
        .boxed()
    }
}

/// Split a path into its non-empty segments.
pub fn split_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::gate::Transition;
    use std::sync::Mutex;

    fn names(resolution: &Resolution) -> Vec<&str> {
        resolution.names().collect()
    }

    async fn resolve(root: &Arc<RouteNode>, path: &str, previous: &MatchParams) -> Option<Resolution> {
        let routing = RoutingSnapshot {
            location: path.to_string(),
            params: previous.clone(),
            active_state: None,
        };
        Resolver::new(&routing, None).resolve(root, path, MatchParams::new()).await
    }

    fn blog() -> Arc<RouteNode> {
        Arc::new(
            RouteNode::root()
                .child(
                    RouteNode::builder("post")
                        .pattern("posts/:postId")
                        .child(RouteNode::builder("comment").pattern("comments/:commentId")),
                )
                .child(RouteNode::builder("home"))
                .build()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_nested_params_merge() {
        let root = blog();
        let resolution = resolve(&root, "posts/1/comments/4", &MatchParams::new()).await.unwrap();

        assert_eq!(names(&resolution), ["post", "comment"]);
        assert_eq!(resolution.params.get("postId").map(String::as_str), Some("1"));
        assert_eq!(resolution.params.get("commentId").map(String::as_str), Some("4"));
        assert_eq!(resolution.leaf().unwrap().name(), "comment");
    }

    #[tokio::test]
    async fn test_empty_path_reaches_pass_through_leaf() {
        let root = blog();
        let resolution = resolve(&root, "", &MatchParams::new()).await.unwrap();
        assert_eq!(names(&resolution), ["home"]);
    }

    #[tokio::test]
    async fn test_intermediate_node_is_not_a_leaf() {
        let root = blog();
        assert!(resolve(&root, "posts/1", &MatchParams::new()).await.is_none());
        assert!(resolve(&root, "posts/1/comments/4/extra", &MatchParams::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_dirty_split_follows_previous_params() {
        let root = blog();
        let mut previous = MatchParams::new();
        previous.insert("postId".into(), "1".into());
        previous.insert("commentId".into(), "4".into());

        let same = resolve(&root, "posts/1/comments/4", &previous).await.unwrap();
        assert_eq!(same.clean, ["post", "comment"]);
        assert!(same.dirty.is_empty());

        let child_changed = resolve(&root, "posts/1/comments/5", &previous).await.unwrap();
        assert_eq!(child_changed.clean, ["post"]);
        assert_eq!(child_changed.dirty, ["comment"]);

        // Dirtiness propagates to descendants even when their own params match
        let parent_changed = resolve(&root, "posts/2/comments/4", &previous).await.unwrap();
        assert!(parent_changed.clean.is_empty());
        assert_eq!(parent_changed.dirty, ["post", "comment"]);
    }

    #[tokio::test]
    async fn test_failed_branch_falls_back_to_lower_priority_sibling() {
        let root = Arc::new(
            RouteNode::root()
                .child(
                    RouteNode::builder("specific")
                        .pattern("items")
                        .priority(5)
                        .child(RouteNode::builder("edit").pattern("edit")),
                )
                .child(
                    RouteNode::builder("generic")
                        .pattern("*")
                        .child(RouteNode::builder("show").pattern(":id")),
                )
                .build()
                .unwrap(),
        );

        let resolution = resolve(&root, "items/9", &MatchParams::new()).await.unwrap();
        assert_eq!(names(&resolution), ["generic", "show"]);

        let resolution = resolve(&root, "items/edit", &MatchParams::new()).await.unwrap();
        assert_eq!(names(&resolution), ["specific", "edit"]);
    }

    #[tokio::test]
    async fn test_priority_wins_over_completion_order() {
        let held: Arc<Mutex<Vec<(String, Transition)>>> = Arc::default();
        let deferred = |name: &'static str, priority: i32| {
            let held = held.clone();
            RouteNode::builder(name)
                .pattern("test")
                .priority(priority)
                .gate(move |owner, _, transition, _| {
                    transition.defer();
                    held.lock().unwrap().push((owner.node().name().to_string(), transition.clone()));
                    true
                })
        };
        let root = Arc::new(
            RouteNode::root()
                .child(deferred("route1", 1))
                .child(deferred("route2", 3))
                .child(deferred("route3", -1))
                .child(deferred("route4", 1))
                .build()
                .unwrap(),
        );

        let task = tokio::spawn({
            let root = root.clone();
            async move { resolve(&root, "test", &MatchParams::new()).await }
        });
        while held.lock().unwrap().len() < 4 {
            tokio::task::yield_now().await;
        }

        // Settle the highest priority candidate last
        let mut transitions = std::mem::take(&mut *held.lock().unwrap());
        transitions.sort_by_key(|(name, _)| name == "route2");
        for (_, transition) in transitions {
            transition.ok();
            tokio::task::yield_now().await;
        }

        let resolution = task.await.unwrap().unwrap();
        assert_eq!(names(&resolution), ["route2"]);
    }

    #[tokio::test]
    async fn test_context_is_scoped_to_branch() {
        let root = Arc::new(
            RouteNode::root()
                .child(
                    RouteNode::builder("admin")
                        .pattern("a")
                        .gate(|_, _, _, context| {
                            context.insert("role", "admin");
                            true
                        })
                        .child(RouteNode::builder("dead_end").pattern("never")),
                )
                .child(
                    RouteNode::builder("public")
                        .pattern("a")
                        .priority(-1)
                        .child(RouteNode::builder("page").pattern(":page").gate(|_, _, _, context| {
                            !context.contains_key("role")
                        })),
                )
                .build()
                .unwrap(),
        );

        let resolution = resolve(&root, "a/1", &MatchParams::new()).await.unwrap();
        assert_eq!(names(&resolution), ["public", "page"]);
        assert!(resolution.context.is_empty());
    }

    #[tokio::test]
    async fn test_not_found_child_never_matched() {
        let root = Arc::new(
            RouteNode::root()
                .child(RouteNode::builder("404"))
                .child(RouteNode::builder("section").pattern("section"))
                .build()
                .unwrap(),
        );
        assert!(resolve(&root, "", &MatchParams::new()).await.is_none());
        assert!(resolve(&root, "section", &MatchParams::new()).await.is_some());
    }

    #[test]
    fn test_split_segments_drops_empty() {
        assert_eq!(split_segments("/posts//1/"), ["posts", "1"]);
        assert!(split_segments("").is_empty());
    }
}
