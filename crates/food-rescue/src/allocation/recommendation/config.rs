use serde::{Deserialize, Serialize};

/// Thresholds steering the three ranking passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationConfig {
    /// Lots spoiling within this many days qualify for waste prevention.
    pub expiry_window_days: i64,
    pub max_candidates: usize,
    /// Lots holding more than this count as abundant.
    pub abundance_threshold: u32,
    /// Upper bound on a single abundance proposal.
    pub abundance_cap: u32,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            expiry_window_days: 7,
            max_candidates: 3,
            abundance_threshold: 200,
            abundance_cap: 100,
        }
    }
}
