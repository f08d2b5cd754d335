//! Text node - a leaf holding raw character data

use crate::NodeId;
use serde::{Deserialize, Serialize};

/// A text node in the DOM tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextNode {
    id: NodeId,
    parent: Option<NodeId>,
    /// The raw text content
    pub text: String,
}

impl TextNode {
    /// Create a new text node
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            text: text.into(),
        }
    }

    /// Get the unique ID of this node
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

    /// Get the number of characters in this node
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Check if this node is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Convert a character offset to a byte offset.
    /// Returns `None` if the offset is past the end of the text.
    pub fn byte_offset(&self, char_offset: usize) -> Option<usize> {
        if char_offset == 0 {
            return Some(0);
        }
        let mut seen = 0;
        for (byte_idx, _) in self.text.char_indices() {
            if seen == char_offset {
                return Some(byte_idx);
            }
            seen += 1;
        }
        if seen == char_offset {
            Some(self.text.len())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_offset_ascii() {
        let node = TextNode::new("hello");
        assert_eq!(node.byte_offset(0), Some(0));
        assert_eq!(node.byte_offset(3), Some(3));
        assert_eq!(node.byte_offset(5), Some(5));
        assert_eq!(node.byte_offset(6), None);
    }

    #[test]
    fn test_byte_offset_multibyte() {
        let node = TextNode::new("héllo");
        assert_eq!(node.char_len(), 5);
        assert_eq!(node.byte_offset(1), Some(1));
        assert_eq!(node.byte_offset(2), Some(3));
        assert_eq!(node.byte_offset(5), Some(6));
    }
}
