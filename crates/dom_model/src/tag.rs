//! Tag names and container classification

use serde::{Deserialize, Serialize};

/// Tag names of block-level elements that can serve as highlight containers
const BLOCK_CONTAINERS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "td", "th", "li", "div", "blockquote", "pre",
];

/// A lowercased element tag name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagName(String);

impl TagName {
    /// Create a tag name (normalized to lowercase)
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().to_ascii_lowercase())
    }

    /// Get the tag name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this tag is on the block-container allow-list
    pub fn is_block_container(&self) -> bool {
        BLOCK_CONTAINERS.contains(&self.0.as_str())
    }

    /// Check whether this tag is a list element
    pub fn is_list(&self) -> bool {
        self.0 == "ul" || self.0 == "ol"
    }

    /// Check whether this tag is a list item
    pub fn is_list_item(&self) -> bool {
        self.0 == "li"
    }

    /// Case-insensitive comparison against a raw tag string
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl std::fmt::Display for TagName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TagName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TagName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_normalization() {
        let tag = TagName::new("DIV");
        assert_eq!(tag.as_str(), "div");
        assert!(tag.matches("Div"));
    }

    #[test]
    fn test_block_classification() {
        assert!(TagName::new("p").is_block_container());
        assert!(TagName::new("h3").is_block_container());
        assert!(TagName::new("li").is_block_container());
        assert!(!TagName::new("span").is_block_container());
        assert!(!TagName::new("em").is_block_container());
    }

    #[test]
    fn test_list_classification() {
        assert!(TagName::new("ul").is_list());
        assert!(TagName::new("ol").is_list());
        assert!(!TagName::new("li").is_list());
        assert!(TagName::new("li").is_list_item());
    }
}
