//! Position mapping between whitespace-normalized and raw text offsets
//!
//! Built once per container per operation in a single O(n) pass. Callers
//! that need many occurrences of a substring must build the map once and
//! query it repeatedly; rebuilding per occurrence degrades a whole-page
//! search to O(n²) on pages with many repeated matches.

/// Collapse every maximal run of whitespace to a single space.
/// All other characters map one-to-one.
pub fn normalize(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut in_whitespace = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                result.push(' ');
                in_whitespace = true;
            }
        } else {
            result.push(ch);
            in_whitespace = false;
        }
    }
    result
}

/// Offset table from normalized text back to raw text.
///
/// Ephemeral: scoped to one clean-text string during one locate/create
/// operation. Never persisted, never shared across containers.
#[derive(Debug)]
pub struct PositionMap {
    normalized: String,
    /// raw character offset of each normalized character; a collapsed
    /// whitespace run maps to the raw offset of the run's first character
    raw_offsets: Vec<usize>,
    raw_char_len: usize,
}

impl PositionMap {
    /// Build the map in one left-to-right pass over the raw text
    pub fn build(raw: &str) -> Self {
        let mut normalized = String::with_capacity(raw.len());
        let mut raw_offsets = Vec::new();
        let mut raw_char_len = 0;
        let mut in_whitespace = false;
        for (raw_idx, ch) in raw.chars().enumerate() {
            raw_char_len = raw_idx + 1;
            if ch.is_whitespace() {
                if !in_whitespace {
                    normalized.push(' ');
                    raw_offsets.push(raw_idx);
                    in_whitespace = true;
                }
            } else {
                normalized.push(ch);
                raw_offsets.push(raw_idx);
                in_whitespace = false;
            }
        }
        Self {
            normalized,
            raw_offsets,
            raw_char_len,
        }
    }

    /// The normalized text
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Number of characters in the normalized text
    pub fn norm_char_len(&self) -> usize {
        self.raw_offsets.len()
    }

    /// Translate a normalized character offset to a raw character offset.
    /// The one-past-the-end offset maps to the raw length.
    pub fn to_raw(&self, norm_offset: usize) -> Option<usize> {
        if norm_offset < self.raw_offsets.len() {
            Some(self.raw_offsets[norm_offset])
        } else if norm_offset == self.raw_offsets.len() {
            Some(self.raw_char_len)
        } else {
            None
        }
    }

    /// Translate a normalized character range to a raw character range
    pub fn raw_range(&self, norm_start: usize, norm_end: usize) -> Option<(usize, usize)> {
        let start = self.to_raw(norm_start)?;
        let end = self.to_raw(norm_end)?;
        Some((start, end))
    }

    /// Normalized character offsets of every occurrence of `needle` in the
    /// normalized text. Occurrences may overlap: a needle that repeats part
    /// of itself (`"aa"` in `"aaaa"`) is counted at every start, so the
    /// occurrence index recorded when a highlight is created addresses the
    /// same span when it is looked up again.
    pub fn occurrences(&self, needle: &str) -> Vec<usize> {
        if needle.is_empty() {
            return Vec::new();
        }
        let mut byte_starts = Vec::new();
        let mut from = 0;
        while let Some(found) = self.normalized[from..].find(needle) {
            let at = from + found;
            byte_starts.push(at);
            // advance one char past the match start, not the whole match
            from = at
                + self.normalized[at..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
        }
        let mut byte_starts = byte_starts.into_iter().peekable();
        let mut result = Vec::new();
        for (char_idx, (byte_idx, _)) in self.normalized.char_indices().enumerate() {
            if byte_starts.peek() == Some(&byte_idx) {
                result.push(char_idx);
                byte_starts.next();
            }
        }
        result
    }
}
