mod claims;
mod config;
mod passes;

pub use config::RecommendationConfig;

use chrono::{DateTime, Utc};

use super::domain::{InventorySnapshot, MatchCandidate};
use claims::ClaimSet;

/// Stateless generator applying the ranking passes to a snapshot.
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    config: RecommendationConfig,
}

impl RecommendationEngine {
    pub fn new(config: RecommendationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RecommendationConfig {
        &self.config
    }

    /// Propose up to `max_candidates` allocations, urgency first, then waste
    /// prevention, then abundance. No lot or need appears twice.
    pub fn recommend(&self, snapshot: &InventorySnapshot, now: DateTime<Utc>) -> Vec<MatchCandidate> {
        let mut claims = ClaimSet::new(self.config.max_candidates);

        passes::urgency_first(snapshot, &mut claims);
        passes::waste_prevention(snapshot, &self.config, now, &mut claims);
        passes::abundance_fallback(snapshot, &self.config, &mut claims);

        let mut candidates = claims.into_candidates();
        candidates.truncate(self.config.max_candidates);
        candidates
    }
}

/// Run the generator with default thresholds.
pub fn generate_recommendations(
    snapshot: &InventorySnapshot,
    now: DateTime<Utc>,
) -> Vec<MatchCandidate> {
    RecommendationEngine::default().recommend(snapshot, now)
}
