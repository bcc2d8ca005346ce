use super::committer::Transfer;
use super::domain::{Activity, DonationSubmission, InventorySnapshot, SubmissionId};
use super::intake::IntakeOutcome;

/// Storage owned by the surrounding application.
///
/// `snapshot` must return a consistent point-in-time copy in a stable order.
/// `apply_transfer` and `record_intake` must land all of their changes at once
/// so readers never observe a half-applied transfer.
pub trait AllocationRepository: Send + Sync {
    fn snapshot(&self) -> Result<InventorySnapshot, RepositoryError>;
    fn apply_transfer(&self, transfer: &Transfer, activity: &Activity)
        -> Result<(), RepositoryError>;
    fn fetch_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<DonationSubmission>, RepositoryError>;
    fn record_intake(&self, outcome: &IntakeOutcome) -> Result<(), RepositoryError>;
    /// Newest first.
    fn recent_activities(&self, limit: usize) -> Result<Vec<Activity>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook surfacing new activity records (dashboards, notifications).
pub trait ActivityFeed: Send + Sync {
    fn publish(&self, activity: Activity) -> Result<(), FeedError>;
}

/// Feed dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("activity feed unavailable: {0}")]
    Transport(String),
}
