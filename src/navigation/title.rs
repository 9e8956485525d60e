//! Document title binding.
//!
//! After a successful navigation the nearest titled node on the matched
//! path (leaf first, walking up) becomes the single title source. The
//! binding holds the node itself, so later changes to that node's title
//! are observed without rebinding.

use std::sync::Arc;

use crate::routing::node::RouteNode;

/// The node currently supplying the document title.
#[derive(Debug, Default, Clone)]
pub struct TitleBinding {
    source: Option<Arc<RouteNode>>,
}

impl TitleBinding {
    /// Bind to the deepest node in `path` that defines a title.
    ///
    /// `path` runs from the root's child down to the leaf. If no node on
    /// it has a title the binding is cleared.
    pub fn bind(&mut self, path: &[Arc<RouteNode>]) {
        self.source = path
            .iter()
            .rev()
            .find(|node| node.document_title().is_some())
            .cloned();

        match &self.source {
            Some(node) => tracing::debug!(node = %node.name(), "Document title bound"),
            None => tracing::debug!("Document title unbound"),
        }
    }

    /// Name of the bound node.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref().map(RouteNode::name)
    }

    /// The bound node's current title.
    pub fn title(&self) -> Option<String> {
        self.source.as_ref().and_then(|node| node.document_title())
    }
}
