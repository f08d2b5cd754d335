//! Engine configuration

use crate::{ScanBudget, ScoringWeights};
use serde::{Deserialize, Serialize};

/// Tunable policy for the anchoring engine.
///
/// The scoring weights and thresholds are empirically chosen defaults, not
/// load-bearing constants; hosts may override any of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum prefix length used when verifying a relocated container's
    /// clean text against the stored descriptor text. The effective check
    /// length is the minimum of this and the stored text length, so short
    /// snippets still verify correctly.
    pub prefix_check_len: usize,
    /// Length (in graphemes) of the sibling text prefixes recorded for
    /// list-item descriptors
    pub sibling_prefix_len: usize,
    /// Length (in characters) of the before/after context snippets used by
    /// the scoring matcher
    pub context_len: usize,
    /// Scoring weights and acceptance threshold for the fallback matcher
    pub weights: ScoringWeights,
    /// Size budget for whole-document scoring scans
    pub scan_budget: ScanBudget,
    /// Anchors restored per step of a chunked restore session
    pub restore_chunk_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prefix_check_len: 40,
            sibling_prefix_len: 30,
            context_len: 32,
            weights: ScoringWeights::default(),
            scan_budget: ScanBudget::default(),
            restore_chunk_size: 10,
        }
    }
}
