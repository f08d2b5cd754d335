//! Node kinds and node storage

use crate::{Element, Marker, NodeId, TextNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Enumeration of the node kinds in the DOM tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Element,
    Text,
    Marker,
}

/// Storage for the different node kinds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeStorage {
    pub elements: HashMap<NodeId, Element>,
    pub texts: HashMap<NodeId, TextNode>,
    pub markers: HashMap<NodeId, Marker>,
}

impl NodeStorage {
    /// Get the kind of a stored node
    pub fn kind_of(&self, id: NodeId) -> Option<NodeKind> {
        if self.elements.contains_key(&id) {
            return Some(NodeKind::Element);
        }
        if self.texts.contains_key(&id) {
            return Some(NodeKind::Text);
        }
        if self.markers.contains_key(&id) {
            return Some(NodeKind::Marker);
        }
        None
    }
}
