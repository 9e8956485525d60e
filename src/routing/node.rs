//! Route tree nodes and their builder.
//!
//! A tree is assembled once through [`RouteNodeBuilder`], validated on
//! `build()`, and is immutable afterwards. The only mutable attribute is
//! the document title, which is observed rather than matched.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::config::RouteConfig;
use crate::routing::gate::{Gate, GateOwner, Transition};
use crate::routing::matcher::RoutePattern;
use crate::routing::types::{Context, MatchParams, RouteError, RouteResult, NOT_FOUND, STATE_SEPARATOR};

/// A named node in the route tree.
pub struct RouteNode {
    name: String,
    pattern: RoutePattern,
    priority: i32,
    gate: Option<Arc<dyn Gate>>,
    document_title: ArcSwapOption<String>,
    children: Vec<Arc<RouteNode>>,
}

impl RouteNode {
    /// Start building a node.
    pub fn builder(name: impl Into<String>) -> RouteNodeBuilder {
        RouteNodeBuilder::new(name)
    }

    /// Start building an unnamed root node.
    pub fn root() -> RouteNodeBuilder {
        RouteNodeBuilder::new("")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn gate(&self) -> Option<&dyn Gate> {
        self.gate.as_deref()
    }

    /// Current document title, if any.
    pub fn document_title(&self) -> Option<String> {
        self.document_title.load_full().map(|title| title.as_ref().clone())
    }

    /// Replace the document title. Observers of this node see the new value.
    pub fn set_document_title(&self, title: Option<String>) {
        self.document_title.store(title.map(Arc::new));
    }

    /// Children in declaration order.
    pub fn children(&self) -> &[Arc<RouteNode>] {
        &self.children
    }

    /// Child by name.
    pub fn child(&self, name: &str) -> Option<&Arc<RouteNode>> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Children eligible for path matching, highest priority first.
    ///
    /// The reserved `404` child is excluded. Equal priorities keep
    /// declaration order.
    pub fn routable_children(&self) -> Vec<&Arc<RouteNode>> {
        let mut candidates: Vec<_> = self.children.iter().filter(|child| child.name != NOT_FOUND).collect();
        candidates.sort_by_key(|child| Reverse(child.priority));
        candidates
    }

    /// Walk a dotted state path (`posts.post`) down from this node.
    ///
    /// Returns the chain of nodes visited, excluding `self`.
    pub fn descend(&self, path: &str) -> Option<Vec<Arc<RouteNode>>> {
        let mut chain: Vec<Arc<RouteNode>> = Vec::new();
        for name in path.split(STATE_SEPARATOR).filter(|name| !name.is_empty()) {
            let next = match chain.last() {
                Some(parent) => parent.child(name),
                None => self.child(name),
            }?
            .clone();
            chain.push(next);
        }
        Some(chain)
    }
}

impl fmt::Debug for RouteNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteNode")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("priority", &self.priority)
            .field("gated", &self.gate.is_some())
            .field("document_title", &self.document_title())
            .field("children", &self.children)
            .finish()
    }
}

#[derive(Default)]
enum PatternSource {
    #[default]
    None,
    Tokens(String),
    Regex { source: String, captures: Vec<String> },
}

/// Builder for [`RouteNode`] trees.
pub struct RouteNodeBuilder {
    name: String,
    pattern: PatternSource,
    priority: i32,
    gate: Option<Arc<dyn Gate>>,
    document_title: Option<String>,
    children: Vec<RouteNodeBuilder>,
}

impl RouteNodeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: PatternSource::None,
            priority: 0,
            gate: None,
            document_title: None,
            children: Vec::new(),
        }
    }

    /// Static/dynamic/wildcard token pattern, e.g. `posts/:postId`.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = PatternSource::Tokens(pattern.into());
        self
    }

    /// Regular expression pattern with positional capture names.
    pub fn regex<I, S>(mut self, source: impl Into<String>, captures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pattern = PatternSource::Regex {
            source: source.into(),
            captures: captures.into_iter().map(Into::into).collect(),
        };
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn document_title(mut self, title: impl Into<String>) -> Self {
        self.document_title = Some(title.into());
        self
    }

    /// Attach a gate closure.
    pub fn gate<F>(self, gate: F) -> Self
    where
        F: Fn(&GateOwner<'_>, &MatchParams, &Transition, &mut Context) -> bool + Send + Sync + 'static,
    {
        self.gate_with(gate)
    }

    /// Attach any [`Gate`] implementation.
    pub fn gate_with(mut self, gate: impl Gate + 'static) -> Self {
        self.gate = Some(Arc::new(gate));
        self
    }

    pub fn child(mut self, child: RouteNodeBuilder) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = RouteNodeBuilder>) -> Self {
        self.children.extend(children);
        self
    }

    /// Attach a gate to the descendant at a dotted path (`posts.post`).
    pub fn gate_at<F>(mut self, path: &str, gate: F) -> RouteResult<Self>
    where
        F: Fn(&GateOwner<'_>, &MatchParams, &Transition, &mut Context) -> bool + Send + Sync + 'static,
    {
        let mut target = &mut self;
        for name in path.split(STATE_SEPARATOR) {
            target = target
                .children
                .iter_mut()
                .find(|child| child.name == name)
                .ok_or_else(|| RouteError::UnknownNode(path.to_string()))?;
        }
        target.gate = Some(Arc::new(gate));
        Ok(self)
    }

    /// Validate and freeze the tree.
    pub fn build(self) -> RouteResult<RouteNode> {
        let pattern = match self.pattern {
            PatternSource::None => RoutePattern::PassThrough,
            PatternSource::Tokens(pattern) => RoutePattern::parse(&self.name, &pattern)?,
            PatternSource::Regex { source, captures } => RoutePattern::regex(&self.name, &source, captures)?,
        };

        let mut seen = HashSet::new();
        for child in &self.children {
            if !seen.insert(child.name.as_str()) {
                return Err(RouteError::DuplicateSibling {
                    parent: self.name.clone(),
                    name: child.name.clone(),
                });
            }
        }

        let children = self
            .children
            .into_iter()
            .map(|child| child.build().map(Arc::new))
            .collect::<RouteResult<Vec<_>>>()?;

        Ok(RouteNode {
            name: self.name,
            pattern,
            priority: self.priority,
            gate: self.gate,
            document_title: ArcSwapOption::new(self.document_title.map(Arc::new)),
            children,
        })
    }
}

impl From<&RouteConfig> for RouteNodeBuilder {
    fn from(config: &RouteConfig) -> Self {
        let mut builder = RouteNodeBuilder::new(config.name.clone()).priority(config.priority);
        builder.pattern = match (&config.pattern, &config.regex) {
            (_, Some(regex)) => PatternSource::Regex {
                source: regex.clone(),
                captures: config.captures.clone(),
            },
            (Some(pattern), None) => PatternSource::Tokens(pattern.clone()),
            (None, None) => PatternSource::None,
        };
        builder.document_title = config.document_title.clone();
        builder.children = config.children.iter().map(RouteNodeBuilder::from).collect();
        builder
    }
}
