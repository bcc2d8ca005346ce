use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::clock::{Clock, IdGenerator, SequentialIds, SystemClock};
use super::committer::{commit_allocation, AllocationError, EntityKind, Transfer};
use super::domain::{
    Activity, AllocationRequest, InventoryLot, MatchCandidate, NeedId, SubmissionId,
};
use super::intake::{match_submission, submission_not_found, IntakeConfig, IntakeOutcome};
use super::recommendation::RecommendationEngine;
use super::repository::{ActivityFeed, AllocationRepository, RepositoryError};
use super::suggestions::{suggest_donations, DonationSuggestion};
use crate::config::AllocationConfig;

/// Service composing the recommendation engine, committer and intake matcher
/// over caller-owned storage.
///
/// Commits and intakes run one at a time under a single allocation lock so the
/// read-validate-write sequence on quantities cannot interleave. Recommendations
/// only read a snapshot and never take the lock.
pub struct AllocationService<R, F> {
    repository: Arc<R>,
    feed: Arc<F>,
    engine: RecommendationEngine,
    intake: IntakeConfig,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    allocation_lock: Mutex<()>,
}

/// What a successful commit changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitReceipt {
    pub transfer: Transfer,
    pub activity: Activity,
}

impl<R, F> AllocationService<R, F>
where
    R: AllocationRepository + 'static,
    F: ActivityFeed + 'static,
{
    pub fn new(repository: Arc<R>, feed: Arc<F>, config: AllocationConfig) -> Self {
        Self::with_collaborators(
            repository,
            feed,
            config,
            Arc::new(SystemClock),
            Arc::new(SequentialIds::new()),
        )
    }

    pub fn with_collaborators(
        repository: Arc<R>,
        feed: Arc<F>,
        config: AllocationConfig,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            repository,
            feed,
            engine: RecommendationEngine::new(config.recommendation),
            intake: config.intake,
            clock,
            ids,
            allocation_lock: Mutex::new(()),
        }
    }

    /// Current suggestions for the operator to review.
    pub fn recommend(&self) -> Result<Vec<MatchCandidate>, AllocationServiceError> {
        let snapshot = self.repository.snapshot()?;
        let candidates = self.engine.recommend(&snapshot, self.clock.now());
        debug!(
            lots = snapshot.lots.len(),
            needs = snapshot.needs.len(),
            candidates = candidates.len(),
            "generated allocation recommendations"
        );
        Ok(candidates)
    }

    /// Apply a manual or accepted allocation.
    pub fn commit(
        &self,
        request: AllocationRequest,
    ) -> Result<CommitReceipt, AllocationServiceError> {
        let receipt = {
            let _guard = self.lock_allocations();
            let snapshot = self.repository.snapshot()?;

            let outcome = commit_allocation(
                &snapshot.lots,
                &snapshot.needs,
                &request,
                self.clock.as_ref(),
                self.ids.as_ref(),
            )
            .map_err(|error| {
                warn!(lot = %request.lot_id, need = %request.need_id, %error, "allocation rejected");
                error
            })?;

            self.repository
                .apply_transfer(&outcome.transfer, &outcome.activity)?;

            CommitReceipt {
                transfer: outcome.transfer,
                activity: outcome.activity,
            }
        };

        info!(
            lot = %receipt.transfer.lot_id,
            need = %receipt.transfer.need_id,
            quantity = receipt.transfer.quantity,
            "allocation committed"
        );
        self.publish(receipt.activity.clone());
        Ok(receipt)
    }

    /// Commit a candidate exactly as proposed.
    pub fn accept(
        &self,
        candidate: &MatchCandidate,
    ) -> Result<CommitReceipt, AllocationServiceError> {
        self.commit(AllocationRequest::from(candidate))
    }

    /// Turn a pending donor submission into inventory matched to `need_id`.
    pub fn match_submission(
        &self,
        submission_id: &SubmissionId,
        need_id: &NeedId,
    ) -> Result<IntakeOutcome, AllocationServiceError> {
        let outcome = {
            let _guard = self.lock_allocations();

            let submission = self
                .repository
                .fetch_submission(submission_id)?
                .ok_or_else(|| submission_not_found(submission_id))?;
            let snapshot = self.repository.snapshot()?;
            let need = snapshot
                .need(need_id)
                .ok_or_else(|| AllocationError::not_found(EntityKind::Need, need_id))?;

            let outcome = match_submission(
                &submission,
                need_id,
                &need.beneficiary_name,
                &self.intake,
                self.clock.as_ref(),
                self.ids.as_ref(),
            )
            .map_err(|error| {
                warn!(submission = %submission_id, %error, "donation intake rejected");
                error
            })?;

            self.repository.record_intake(&outcome)?;
            outcome
        };

        info!(
            submission = %submission_id,
            need = %need_id,
            lots = outcome.lots.len(),
            "donation submission matched"
        );
        self.publish(outcome.activity.clone());
        Ok(outcome)
    }

    pub fn activities(&self, limit: usize) -> Result<Vec<Activity>, AllocationServiceError> {
        Ok(self.repository.recent_activities(limit)?)
    }

    pub fn suggestions(&self) -> Result<Vec<DonationSuggestion>, AllocationServiceError> {
        let snapshot = self.repository.snapshot()?;
        Ok(suggest_donations(&snapshot.needs))
    }

    /// Lots below the configured low-stock threshold, in snapshot order.
    pub fn low_stock(&self) -> Result<Vec<InventoryLot>, AllocationServiceError> {
        let threshold = self.intake.low_stock_threshold;
        let snapshot = self.repository.snapshot()?;
        Ok(snapshot
            .lots
            .into_iter()
            .filter(|lot| lot.is_low_stock(threshold))
            .collect())
    }

    // The guarded value is `()`, so a poisoned lock carries no torn state.
    fn lock_allocations(&self) -> MutexGuard<'_, ()> {
        self.allocation_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // The record is already stored by now; feed failures are logged, not returned.
    fn publish(&self, activity: Activity) {
        let id = activity.id.clone();
        if let Err(error) = self.feed.publish(activity) {
            warn!(activity = %id, %error, "activity feed publish failed");
        }
    }
}

/// Error raised by the allocation service.
#[derive(Debug, thiserror::Error)]
pub enum AllocationServiceError {
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
