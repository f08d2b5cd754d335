//! Element node - a tagged container with optional id and class attributes

use crate::{NodeId, TagName};
use serde::{Deserialize, Serialize};

/// An element in the DOM tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    id: NodeId,
    parent: Option<NodeId>,
    /// The element tag (lowercased)
    pub tag: TagName,
    /// The `id` attribute, if present
    pub dom_id: Option<String>,
    /// The `class` attribute, if present (space-separated tokens)
    pub class_name: Option<String>,
    /// Child node IDs in document order
    children: Vec<NodeId>,
}

impl Element {
    /// Create a new element with the given tag
    pub fn new(tag: impl Into<TagName>) -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            tag: tag.into(),
            dom_id: None,
            class_name: None,
            children: Vec::new(),
        }
    }

    /// Get the unique ID of this element
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

    /// Insert a child node ID at an index
    pub fn insert_child(&mut self, index: usize, child: NodeId) {
        self.children.insert(index, child);
    }

    /// Remove a child node ID; returns its former index
    pub fn remove_child(&mut self, child: NodeId) -> Option<usize> {
        let index = self.children.iter().position(|&c| c == child)?;
        self.children.remove(index);
        Some(index)
    }

    /// Set the `id` attribute
    pub fn set_dom_id(&mut self, dom_id: Option<String>) {
        self.dom_id = dom_id;
    }

    /// Set the `class` attribute
    pub fn set_class_name(&mut self, class_name: Option<String>) {
        self.class_name = class_name;
    }

    /// Get the first class token, if any
    pub fn first_class_token(&self) -> Option<&str> {
        self.class_name
            .as_deref()
            .and_then(|c| c.split_whitespace().next())
    }

    /// Check whether the class attribute contains the given token
    pub fn has_class(&self, token: &str) -> bool {
        self.class_name
            .as_deref()
            .map(|c| c.split_whitespace().any(|t| t == token))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_tokens() {
        let mut el = Element::new("p");
        assert_eq!(el.first_class_token(), None);
        assert!(!el.has_class("lead"));

        el.set_class_name(Some("lead article-body".to_string()));
        assert_eq!(el.first_class_token(), Some("lead"));
        assert!(el.has_class("lead"));
        assert!(el.has_class("article-body"));
        assert!(!el.has_class("article"));
    }

    #[test]
    fn test_child_order() {
        let mut el = Element::new("div");
        let a = NodeId::new();
        let b = NodeId::new();
        let c = NodeId::new();
        el.add_child(a);
        el.add_child(c);
        el.insert_child(1, b);
        assert_eq!(el.children(), &[a, b, c]);
        assert_eq!(el.remove_child(b), Some(1));
        assert_eq!(el.children(), &[a, c]);
    }
}
