//! DOM tree operations and storage

use crate::{DomError, Element, Marker, NodeId, NodeKind, NodeStorage, Result, TextNode};
use serde::{Deserialize, Serialize};

/// The complete DOM tree structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomTree {
    root: NodeId,
    /// Storage for all nodes
    pub nodes: NodeStorage,
}

impl DomTree {
    /// Create a new tree with an empty `body` root element
    pub fn new() -> Self {
        let root = Element::new("body");
        let root_id = root.id();
        let mut nodes = NodeStorage::default();
        nodes.elements.insert(root_id, root);
        Self { root: root_id, nodes }
    }

    /// Get the root element ID
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Get the kind of a node
    pub fn node_kind(&self, id: NodeId) -> Option<NodeKind> {
        self.nodes.kind_of(id)
    }

    /// Get an element by ID
    pub fn get_element(&self, id: NodeId) -> Option<&Element> {
        self.nodes.elements.get(&id)
    }

    /// Get a mutable element by ID
    pub fn get_element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.nodes.elements.get_mut(&id)
    }

    /// Get a text node by ID
    pub fn get_text(&self, id: NodeId) -> Option<&TextNode> {
        self.nodes.texts.get(&id)
    }

    /// Get a mutable text node by ID
    pub fn get_text_mut(&mut self, id: NodeId) -> Option<&mut TextNode> {
        self.nodes.texts.get_mut(&id)
    }

    /// Get a marker by ID
    pub fn get_marker(&self, id: NodeId) -> Option<&Marker> {
        self.nodes.markers.get(&id)
    }

    /// Get a mutable marker by ID
    pub fn get_marker_mut(&mut self, id: NodeId) -> Option<&mut Marker> {
        self.nodes.markers.get_mut(&id)
    }

    /// Get the parent of a node
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        if let Some(el) = self.nodes.elements.get(&id) {
            return el.parent();
        }
        if let Some(text) = self.nodes.texts.get(&id) {
            return text.parent();
        }
        if let Some(marker) = self.nodes.markers.get(&id) {
            return marker.parent();
        }
        None
    }

    /// Get the children of a node (empty for text nodes)
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        if let Some(el) = self.nodes.elements.get(&id) {
            return el.children();
        }
        if let Some(marker) = self.nodes.markers.get(&id) {
            return marker.children();
        }
        &[]
    }

    /// Get a node's index among its siblings
    pub fn sibling_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent_of(id)?;
        self.children_of(parent).iter().position(|&c| c == id)
    }

    /// Get the previous sibling of a node
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent_of(id)?;
        let index = self.sibling_index(id)?;
        if index == 0 {
            None
        } else {
            self.children_of(parent).get(index - 1).copied()
        }
    }

    /// Get the next sibling of a node
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent_of(id)?;
        let index = self.sibling_index(id)?;
        self.children_of(parent).get(index + 1).copied()
    }

    /// Walk ancestors from a node up to the root (nearest first)
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = self.parent_of(id);
        while let Some(node) = current {
            result.push(node);
            current = self.parent_of(node);
        }
        result
    }

    /// All descendants of a node in document (preorder) order, excluding the node itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children_of(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            result.push(node);
            for &child in self.children_of(node).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// All text nodes under a node in document order (descending into markers)
    pub fn text_nodes_in(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|n| self.nodes.texts.contains_key(n))
            .collect()
    }

    /// Concatenated text of all descendant text nodes, including marker contents
    pub fn raw_text(&self, id: NodeId) -> String {
        let mut result = String::new();
        for text_id in self.text_nodes_in(id) {
            if let Some(text) = self.nodes.texts.get(&text_id) {
                result.push_str(&text.text);
            }
        }
        result
    }

    /// All elements with the given tag, in document order
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        let mut result = Vec::new();
        if let Some(root) = self.nodes.elements.get(&self.root) {
            if root.tag.matches(tag) {
                result.push(self.root);
            }
        }
        for id in self.descendants(self.root) {
            if let Some(el) = self.nodes.elements.get(&id) {
                if el.tag.matches(tag) {
                    result.push(id);
                }
            }
        }
        result
    }

    /// Find an element by its `id` attribute
    pub fn element_by_dom_id(&self, dom_id: &str) -> Option<NodeId> {
        if let Some(root) = self.nodes.elements.get(&self.root) {
            if root.dom_id.as_deref() == Some(dom_id) {
                return Some(self.root);
            }
        }
        self.descendants(self.root).into_iter().find(|id| {
            self.nodes
                .elements
                .get(id)
                .map(|el| el.dom_id.as_deref() == Some(dom_id))
                .unwrap_or(false)
        })
    }

    /// All markers owned by the given anchor id, in document order
    pub fn markers_with_anchor(&self, anchor_id: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| {
                self.nodes
                    .markers
                    .get(id)
                    .map(|m| m.anchor_id == anchor_id)
                    .unwrap_or(false)
            })
            .collect()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Insert an element under a parent
    pub fn insert_element(
        &mut self,
        mut element: Element,
        parent_id: NodeId,
        index: Option<usize>,
    ) -> Result<NodeId> {
        let element_id = element.id();
        element.set_parent(Some(parent_id));
        self.nodes.elements.insert(element_id, element);
        self.attach_child(parent_id, element_id, index)?;
        Ok(element_id)
    }

    /// Insert a text node under a parent
    pub fn insert_text(
        &mut self,
        mut text: TextNode,
        parent_id: NodeId,
        index: Option<usize>,
    ) -> Result<NodeId> {
        let text_id = text.id();
        text.set_parent(Some(parent_id));
        self.nodes.texts.insert(text_id, text);
        self.attach_child(parent_id, text_id, index)?;
        Ok(text_id)
    }

    /// Attach an already-stored node to a parent's child list
    fn attach_child(&mut self, parent_id: NodeId, child: NodeId, index: Option<usize>) -> Result<()> {
        if let Some(parent) = self.nodes.elements.get_mut(&parent_id) {
            match index {
                Some(idx) => parent.insert_child(idx, child),
                None => parent.add_child(child),
            }
            return Ok(());
        }
        if let Some(parent) = self.nodes.markers.get_mut(&parent_id) {
            match index {
                Some(idx) => {
                    let mut children = parent.take_children();
                    children.insert(idx, child);
                    for c in children {
                        parent.add_child(c);
                    }
                }
                None => parent.add_child(child),
            }
            return Ok(());
        }
        // Remove the orphaned node again so a failed attach has no effect
        self.nodes.elements.remove(&child);
        self.nodes.texts.remove(&child);
        Err(DomError::NodeNotFound(parent_id.as_uuid()))
    }

    /// Detach a node from its parent's child list; returns its former index
    fn detach_child(&mut self, id: NodeId) -> Result<usize> {
        let parent_id = self
            .parent_of(id)
            .ok_or(DomError::InvalidOperation(format!("node {id} has no parent")))?;
        if let Some(parent) = self.nodes.elements.get_mut(&parent_id) {
            return parent
                .remove_child(id)
                .ok_or(DomError::NodeNotFound(id.as_uuid()));
        }
        if let Some(parent) = self.nodes.markers.get_mut(&parent_id) {
            let children = parent.take_children();
            let index = children.iter().position(|&c| c == id);
            for c in children.into_iter().filter(|&c| c != id) {
                parent.add_child(c);
            }
            return index.ok_or(DomError::NodeNotFound(id.as_uuid()));
        }
        Err(DomError::NodeNotFound(parent_id.as_uuid()))
    }

    /// Split a text node at a character offset.
    ///
    /// The left half keeps the original node ID (so offsets below the split
    /// point stay valid); the right half becomes a new sibling immediately
    /// after it. The offset must be strictly inside the node.
    pub fn split_text_node(&mut self, id: NodeId, char_offset: usize) -> Result<(NodeId, NodeId)> {
        let text = self
            .nodes
            .texts
            .get(&id)
            .ok_or(DomError::NotATextNode(id.as_uuid()))?;
        let len = text.char_len();
        if char_offset == 0 || char_offset >= len {
            return Err(DomError::InvalidOffset {
                node: id.as_uuid(),
                offset: char_offset,
                len,
            });
        }
        let byte_offset = text
            .byte_offset(char_offset)
            .ok_or(DomError::InvalidOffset {
                node: id.as_uuid(),
                offset: char_offset,
                len,
            })?;
        let parent_id = text.parent().ok_or(DomError::InvalidOperation(
            "cannot split a detached text node".to_string(),
        ))?;

        let right_content = {
            let text = self.nodes.texts.get_mut(&id).expect("checked above");
            let right = text.text.split_off(byte_offset);
            right
        };

        let index = self
            .sibling_index(id)
            .ok_or(DomError::NodeNotFound(id.as_uuid()))?;
        let right = TextNode::new(right_content);
        let right_id = self.insert_text(right, parent_id, Some(index + 1))?;
        Ok((id, right_id))
    }

    /// Replace a text node with a highlight marker containing it.
    /// Returns the new marker's ID.
    pub fn wrap_text_node_in_marker(
        &mut self,
        text_id: NodeId,
        anchor_id: &str,
        color: &str,
    ) -> Result<NodeId> {
        if !self.nodes.texts.contains_key(&text_id) {
            return Err(DomError::NotATextNode(text_id.as_uuid()));
        }
        let parent_id = self.parent_of(text_id).ok_or(DomError::InvalidOperation(
            "cannot wrap a detached text node".to_string(),
        ))?;
        let index = self.detach_child(text_id)?;

        let mut marker = Marker::new(anchor_id, color);
        let marker_id = marker.id();
        marker.set_parent(Some(parent_id));
        marker.add_child(text_id);
        self.nodes.markers.insert(marker_id, marker);
        self.attach_child(parent_id, marker_id, Some(index))?;

        if let Some(text) = self.nodes.texts.get_mut(&text_id) {
            text.set_parent(Some(marker_id));
        }
        Ok(marker_id)
    }

    /// Remove a marker, splicing its children back into its parent at the
    /// marker's position. Returns the number of spliced children.
    pub fn unwrap_marker(&mut self, marker_id: NodeId) -> Result<usize> {
        if !self.nodes.markers.contains_key(&marker_id) {
            return Err(DomError::NotAMarker(marker_id.as_uuid()));
        }
        let parent_id = self.parent_of(marker_id).ok_or(DomError::InvalidOperation(
            "cannot unwrap a detached marker".to_string(),
        ))?;
        let index = self.detach_child(marker_id)?;
        let mut marker = self
            .nodes
            .markers
            .remove(&marker_id)
            .ok_or(DomError::NotAMarker(marker_id.as_uuid()))?;
        let children = marker.take_children();
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            if let Some(text) = self.nodes.texts.get_mut(&child) {
                text.set_parent(Some(parent_id));
            } else if let Some(el) = self.nodes.elements.get_mut(&child) {
                el.set_parent(Some(parent_id));
            } else if let Some(inner) = self.nodes.markers.get_mut(&child) {
                inner.set_parent(Some(parent_id));
            }
            self.attach_child(parent_id, child, Some(index + i))?;
        }
        Ok(count)
    }

    /// Merge runs of adjacent sibling text nodes under a parent into single
    /// nodes. One pass; returns the number of nodes merged away.
    pub fn merge_adjacent_text_nodes(&mut self, parent_id: NodeId) -> Result<usize> {
        if self.node_kind(parent_id).is_none() {
            return Err(DomError::NodeNotFound(parent_id.as_uuid()));
        }
        let children: Vec<NodeId> = self.children_of(parent_id).to_vec();
        let mut merged = 0;
        let mut run_head: Option<NodeId> = None;
        for child in children {
            if self.nodes.texts.contains_key(&child) {
                match run_head {
                    None => run_head = Some(child),
                    Some(head) => {
                        let tail_text = self
                            .nodes
                            .texts
                            .get(&child)
                            .map(|t| t.text.clone())
                            .unwrap_or_default();
                        if let Some(head_node) = self.nodes.texts.get_mut(&head) {
                            head_node.text.push_str(&tail_text);
                        }
                        self.detach_child(child)?;
                        self.nodes.texts.remove(&child);
                        merged += 1;
                    }
                }
            } else {
                run_head = None;
            }
        }
        Ok(merged)
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para_with_text(tree: &mut DomTree, text: &str) -> (NodeId, NodeId) {
        let para = tree
            .insert_element(Element::new("p"), tree.root_id(), None)
            .unwrap();
        let text_id = tree.insert_text(TextNode::new(text), para, None).unwrap();
        (para, text_id)
    }

    #[test]
    fn test_split_keeps_left_id() {
        let mut tree = DomTree::new();
        let (para, text_id) = para_with_text(&mut tree, "hello world");

        let (left, right) = tree.split_text_node(text_id, 5).unwrap();
        assert_eq!(left, text_id);
        assert_eq!(tree.get_text(left).unwrap().text, "hello");
        assert_eq!(tree.get_text(right).unwrap().text, " world");
        assert_eq!(tree.children_of(para), &[left, right]);
        assert_eq!(tree.raw_text(para), "hello world");
    }

    #[test]
    fn test_split_rejects_boundary_offsets() {
        let mut tree = DomTree::new();
        let (_, text_id) = para_with_text(&mut tree, "abc");
        assert!(tree.split_text_node(text_id, 0).is_err());
        assert!(tree.split_text_node(text_id, 3).is_err());
        assert!(tree.split_text_node(text_id, 4).is_err());
    }

    #[test]
    fn test_wrap_unwrap_roundtrip() {
        let mut tree = DomTree::new();
        let (para, text_id) = para_with_text(&mut tree, "hello world");
        let before = tree.raw_text(para);

        let (_, right) = tree.split_text_node(text_id, 6).unwrap();
        let marker_id = tree
            .wrap_text_node_in_marker(right, "anchor-1", "yellow")
            .unwrap();
        assert_eq!(tree.raw_text(para), before);
        assert_eq!(tree.get_marker(marker_id).unwrap().anchor_id, "anchor-1");
        assert_eq!(tree.markers_with_anchor("anchor-1"), vec![marker_id]);

        let spliced = tree.unwrap_marker(marker_id).unwrap();
        assert_eq!(spliced, 1);
        let merged = tree.merge_adjacent_text_nodes(para).unwrap();
        assert_eq!(merged, 1);
        assert_eq!(tree.children_of(para).len(), 1);
        assert_eq!(tree.raw_text(para), before);
    }

    #[test]
    fn test_document_order_traversal() {
        let mut tree = DomTree::new();
        let (p1, t1) = para_with_text(&mut tree, "first");
        let (p2, t2) = para_with_text(&mut tree, "second");
        assert_eq!(tree.descendants(tree.root_id()), vec![p1, t1, p2, t2]);
        assert_eq!(tree.text_nodes_in(tree.root_id()), vec![t1, t2]);
        assert_eq!(tree.raw_text(tree.root_id()), "firstsecond");
    }

    #[test]
    fn test_sibling_navigation() {
        let mut tree = DomTree::new();
        let (p1, _) = para_with_text(&mut tree, "a");
        let (p2, _) = para_with_text(&mut tree, "b");
        let (p3, _) = para_with_text(&mut tree, "c");
        assert_eq!(tree.prev_sibling(p2), Some(p1));
        assert_eq!(tree.next_sibling(p2), Some(p3));
        assert_eq!(tree.prev_sibling(p1), None);
        assert_eq!(tree.next_sibling(p3), None);
        assert_eq!(tree.sibling_index(p3), Some(2));
    }

    #[test]
    fn test_element_lookup() {
        let mut tree = DomTree::new();
        let mut el = Element::new("p");
        el.set_dom_id(Some("intro".to_string()));
        let p1 = tree.insert_element(el, tree.root_id(), None).unwrap();
        let (p2, _) = para_with_text(&mut tree, "x");

        assert_eq!(tree.element_by_dom_id("intro"), Some(p1));
        assert_eq!(tree.element_by_dom_id("missing"), None);
        assert_eq!(tree.elements_by_tag("p"), vec![p1, p2]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut tree = DomTree::new();
        let (para, _) = para_with_text(&mut tree, "persisted");
        let json = serde_json::to_string(&tree).unwrap();
        let restored: DomTree = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.raw_text(para), "persisted");
        assert_eq!(restored.root_id(), tree.root_id());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Splitting anywhere inside a text node never loses characters,
            // and merging reproduces the original content.
            #[test]
            fn split_then_merge_is_lossless(
                text in "[a-zA-Z é☃ ]{2,40}",
                offset in 1usize..40,
            ) {
                let len = text.chars().count();
                prop_assume!(offset < len);

                let mut tree = DomTree::new();
                let (para, text_id) = para_with_text(&mut tree, &text);
                tree.split_text_node(text_id, offset).unwrap();
                let after_split = tree.raw_text(para);
                prop_assert_eq!(after_split.as_str(), text.as_str());

                tree.merge_adjacent_text_nodes(para).unwrap();
                prop_assert_eq!(tree.children_of(para).len(), 1);
                let after_merge = tree.raw_text(para);
                prop_assert_eq!(after_merge.as_str(), text.as_str());
            }
        }
    }
}
