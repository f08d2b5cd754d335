//! Highlight marker node - a runtime wrapper around highlighted text
//!
//! Markers are never persisted; they exist only between "applied to tree"
//! and "unwrapped". The anchor id and color are stored as plain strings so
//! this crate stays independent of the anchoring engine's types.

use crate::NodeId;
use serde::{Deserialize, Serialize};

/// A highlight marker wrapping a contiguous text range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marker {
    id: NodeId,
    parent: Option<NodeId>,
    /// ID of the owning anchor. Multiple markers may share one anchor id
    /// when the highlighted text spans several underlying text nodes.
    pub anchor_id: String,
    /// Highlight color tag
    pub color: String,
    /// Child node IDs (text nodes, in document order)
    children: Vec<NodeId>,
}

impl Marker {
    /// Create a new marker for an anchor
    pub fn new(anchor_id: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            anchor_id: anchor_id.into(),
            color: color.into(),
            children: Vec::new(),
        }
    }

    /// Get the unique ID of this marker
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the parent node ID
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Set the parent node ID
    pub fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    /// Get the child node IDs
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Append a child node ID
    pub fn add_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    /// Take the children out of this marker (used when unwrapping)
    pub fn take_children(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.children)
    }
}
