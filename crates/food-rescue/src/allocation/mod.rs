//! Matching and allocation of donated inventory to beneficiary needs.
//!
//! Recommendations are pure functions of an [`InventorySnapshot`] and the
//! current time. Committing a match and turning a donor submission into
//! inventory go through [`AllocationService`], which serialises every
//! quantity-changing operation.

pub mod clock;
pub mod committer;
pub mod compatibility;
pub mod domain;
pub mod intake;
pub mod recommendation;
pub mod repository;
pub mod router;
pub mod service;
pub mod snapshot;
pub mod suggestions;

#[cfg(test)]
mod tests;

pub use clock::{Clock, FixedClock, IdGenerator, SequentialIds, SystemClock};
pub use committer::{
    commit_allocation, AllocationError, CommitOutcome, EntityKind, QuantityIssue, Transfer,
};
pub use compatibility::{is_compatible, missing_dietary_tags};
pub use domain::{
    Activity, ActivityId, ActivityKind, AllocationRequest, BeneficiaryNeed, DonationSubmission,
    InventoryLot, InventorySnapshot, LotCategory, LotId, MatchCandidate, MatchDetails, MatchRule,
    NeedId, NeedPriority, RequestedItem, SubmissionCategory, SubmissionId, SubmissionItem,
    SubmissionStatus, ANY_ITEM,
};
pub use intake::{match_submission, IntakeConfig, IntakeOutcome};
pub use recommendation::{generate_recommendations, RecommendationConfig, RecommendationEngine};
pub use repository::{ActivityFeed, AllocationRepository, FeedError, RepositoryError};
pub use router::allocation_router;
pub use service::{AllocationService, AllocationServiceError, CommitReceipt};
pub use snapshot::{SnapshotImportError, SnapshotImporter};
pub use suggestions::{suggest_donations, DonationSuggestion};
