//! Anchor records - the persisted description of one highlighted span

use crate::ContainerDescriptor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorId(Uuid);

impl AnchorId {
    /// Create a new random AnchorId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an AnchorId from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Create an AnchorId from a string representation
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for AnchorId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AnchorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The fixed highlight color palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    Yellow,
    Green,
    Blue,
    Pink,
    Orange,
}

impl HighlightColor {
    /// All palette colors, in picker order
    pub const ALL: [HighlightColor; 5] = [
        HighlightColor::Yellow,
        HighlightColor::Green,
        HighlightColor::Blue,
        HighlightColor::Pink,
        HighlightColor::Orange,
    ];

    /// The CSS class name for this color
    pub fn css_class(&self) -> &'static str {
        match self {
            HighlightColor::Yellow => "hl-yellow",
            HighlightColor::Green => "hl-green",
            HighlightColor::Blue => "hl-blue",
            HighlightColor::Pink => "hl-pink",
            HighlightColor::Orange => "hl-orange",
        }
    }

    /// Stable lowercase name (used as the marker color tag)
    pub fn name(&self) -> &'static str {
        match self {
            HighlightColor::Yellow => "yellow",
            HighlightColor::Green => "green",
            HighlightColor::Blue => "blue",
            HighlightColor::Pink => "pink",
            HighlightColor::Orange => "orange",
        }
    }

    /// The next color in picker order, wrapping around
    pub fn next(&self) -> HighlightColor {
        let idx = Self::ALL.iter().position(|c| c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl Default for HighlightColor {
    fn default() -> Self {
        HighlightColor::Yellow
    }
}

/// Where an anchor's text lives inside its container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorLocation {
    /// Fingerprint of the containing element or list item
    pub descriptor: ContainerDescriptor,
    /// Character offset of the match start inside the container's clean text
    pub text_index: usize,
    /// Zero-based index among repeated matches of the text within the container
    pub occurrence: usize,
}

/// A persisted highlight anchor.
///
/// Immutable once created except for `color` and `note`; deletion removes
/// the record entirely. Anchors are owned by the page's collection in
/// storage, not by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    /// Opaque unique id, generated at creation
    pub id: AnchorId,
    /// Exact raw highlighted string (display and relocation key)
    pub text: String,
    /// Highlight color
    pub color: HighlightColor,
    /// Optional free-text note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Normalized page identity (supplied by the caller)
    pub page_key: String,
    /// Relocation description
    pub location: AnchorLocation,
}

impl Anchor {
    /// Create a new anchor
    pub fn new(
        text: impl Into<String>,
        color: HighlightColor,
        page_key: impl Into<String>,
        location: AnchorLocation,
    ) -> Self {
        Self {
            id: AnchorId::new(),
            text: text.into(),
            color,
            note: None,
            created_at: Utc::now(),
            page_key: page_key.into(),
            location,
        }
    }

    /// Attach or replace the free-text note
    pub fn set_note(&mut self, note: Option<String>) {
        self.note = note;
    }
}

/// The anchors of one page, ordered by creation time.
///
/// Returned to callers instead of any module-level "already loaded" set;
/// the caller owns the collection for the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageAnchors {
    anchors: Vec<Anchor>,
}

impl PageAnchors {
    /// Build a collection from anchors, sorting by creation time
    pub fn new(mut anchors: Vec<Anchor>) -> Self {
        anchors.sort_by_key(|a| a.created_at);
        Self { anchors }
    }

    /// Look up an anchor by id
    pub fn get(&self, id: AnchorId) -> Option<&Anchor> {
        self.anchors.iter().find(|a| a.id == id)
    }

    /// Look up an anchor mutably by id
    pub fn get_mut(&mut self, id: AnchorId) -> Option<&mut Anchor> {
        self.anchors.iter_mut().find(|a| a.id == id)
    }

    /// Add a newly created anchor
    pub fn push(&mut self, anchor: Anchor) {
        self.anchors.push(anchor);
        self.anchors.sort_by_key(|a| a.created_at);
    }

    /// Remove an anchor by id; returns it if present
    pub fn remove(&mut self, id: AnchorId) -> Option<Anchor> {
        let index = self.anchors.iter().position(|a| a.id == id)?;
        Some(self.anchors.remove(index))
    }

    /// Set the note on an anchor; returns false if the id is unknown
    pub fn set_note(&mut self, id: AnchorId, note: Option<String>) -> bool {
        match self.get_mut(id) {
            Some(anchor) => {
                anchor.set_note(note);
                true
            }
            None => false,
        }
    }

    /// All anchors, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Anchor> {
        self.anchors.iter()
    }

    /// Number of anchors
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Check if the collection is empty
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Consume the collection, returning the anchors
    pub fn into_vec(self) -> Vec<Anchor> {
        self.anchors
    }

    /// Borrow the anchors as a slice
    pub fn as_slice(&self) -> &[Anchor] {
        &self.anchors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_location() -> AnchorLocation {
        AnchorLocation {
            descriptor: ContainerDescriptor::Element {
                tag: "p".to_string(),
                dom_id: None,
                class_name: None,
                tag_index: 0,
                clean_text: "Hello world".to_string(),
            },
            text_index: 6,
            occurrence: 0,
        }
    }

    #[test]
    fn test_anchor_serde_roundtrip() {
        let anchor = Anchor::new("world", HighlightColor::Green, "example.com/page", sample_location());
        let json = serde_json::to_string(&anchor).unwrap();
        let back: Anchor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, anchor);
    }

    #[test]
    fn test_color_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&HighlightColor::Pink).unwrap(), "\"pink\"");
    }

    #[test]
    fn test_color_cycle() {
        let mut color = HighlightColor::Yellow;
        for _ in 0..HighlightColor::ALL.len() {
            color = color.next();
        }
        assert_eq!(color, HighlightColor::Yellow);
    }

    #[test]
    fn test_page_anchors_lookup_and_remove() {
        let a = Anchor::new("one", HighlightColor::Yellow, "k", sample_location());
        let b = Anchor::new("two", HighlightColor::Blue, "k", sample_location());
        let a_id = a.id;
        let mut page = PageAnchors::new(vec![b, a]);
        assert_eq!(page.len(), 2);
        assert!(page.get(a_id).is_some());
        assert!(page.set_note(a_id, Some("margin note".to_string())));
        assert_eq!(page.get(a_id).unwrap().note.as_deref(), Some("margin note"));
        assert!(page.remove(a_id).is_some());
        assert!(page.remove(a_id).is_none());
        assert_eq!(page.len(), 1);
    }
}
