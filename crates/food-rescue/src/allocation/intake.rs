use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::clock::{Clock, IdGenerator};
use super::committer::{AllocationError, EntityKind};
use super::domain::{
    Activity, ActivityKind, DonationSubmission, InventoryLot, MatchDetails, NeedId,
    SubmissionStatus,
};

/// Defaults applied when a submission turns into inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Shelf life assumed for items submitted without an expiry.
    pub default_shelf_life_days: i64,
    pub low_stock_threshold: u32,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            default_shelf_life_days: 7,
            low_stock_threshold: 50,
        }
    }
}

/// New lots, the matched submission and its audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeOutcome {
    pub lots: Vec<InventoryLot>,
    pub submission: DonationSubmission,
    pub activity: Activity,
}

/// Turn a pending submission into inventory matched to `need_id`.
///
/// Every submitted item becomes a fresh lot. Submissions carry no dietary
/// metadata, so the lots start with no dietary tags. No existing need is
/// decremented.
pub fn match_submission(
    submission: &DonationSubmission,
    need_id: &NeedId,
    beneficiary_name: &str,
    config: &IntakeConfig,
    clock: &dyn Clock,
    ids: &dyn IdGenerator,
) -> Result<IntakeOutcome, AllocationError> {
    if submission.status != SubmissionStatus::PendingReview {
        return Err(AllocationError::SubmissionNotPending {
            id: submission.id.to_string(),
            status: submission.status.label(),
        });
    }

    let now = clock.now();
    let default_expiry = Duration::try_days(config.default_shelf_life_days)
        .and_then(|shelf_life| now.checked_add_signed(shelf_life))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    let lots = submission
        .items
        .iter()
        .map(|item| {
            InventoryLot::new(
                ids.next_lot_id(),
                item.name.clone(),
                item.category.lot_category(),
                item.quantity,
                item.unit.clone(),
                submission.donor_name.clone(),
                item.expires_at.unwrap_or(default_expiry),
                now,
            )
        })
        .collect();

    let mut matched = submission.clone();
    matched.status = SubmissionStatus::Matched;
    matched.match_details = Some(MatchDetails {
        need_id: need_id.clone(),
        beneficiary_name: beneficiary_name.to_string(),
    });

    let activity = Activity {
        id: ids.next_activity_id(),
        timestamp: now,
        description: format!(
            "New donation from {} matched to {}.",
            submission.donor_name, beneficiary_name
        ),
        kind: ActivityKind::Donation,
    };

    Ok(IntakeOutcome {
        lots,
        submission: matched,
        activity,
    })
}

/// Shorthand for the error raised when a submission id is unknown.
pub(crate) fn submission_not_found(id: impl std::fmt::Display) -> AllocationError {
    AllocationError::not_found(EntityKind::Submission, id)
}
