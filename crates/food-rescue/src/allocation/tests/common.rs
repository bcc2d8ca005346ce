use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::allocation::clock::{FixedClock, SequentialIds};
use crate::allocation::committer::Transfer;
use crate::allocation::domain::{
    Activity, BeneficiaryNeed, DonationSubmission, InventoryLot, InventorySnapshot, LotCategory,
    LotId, NeedId, NeedPriority, SubmissionCategory, SubmissionId, SubmissionItem,
    SubmissionStatus,
};
use crate::allocation::intake::IntakeOutcome;
use crate::allocation::repository::{
    ActivityFeed, AllocationRepository, FeedError, RepositoryError,
};
use crate::allocation::{allocation_router, AllocationService};
use crate::config::AllocationConfig;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 30, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn clock() -> FixedClock {
    FixedClock(now())
}

pub(super) fn lot(id: &str, item: &str, quantity: u32, expires_in_days: i64) -> InventoryLot {
    InventoryLot::new(
        LotId(id.to_string()),
        item,
        LotCategory::Other,
        quantity,
        "kg",
        "Reliance Fresh",
        now() + Duration::days(expires_in_days),
        now() - Duration::days(1),
    )
}

pub(super) fn need(
    id: &str,
    beneficiary: &str,
    item: &str,
    quantity: u32,
    priority: NeedPriority,
) -> BeneficiaryNeed {
    BeneficiaryNeed::new(
        NeedId(id.to_string()),
        beneficiary,
        item,
        quantity,
        "kg",
        priority,
    )
}

pub(super) fn pantry_lots() -> Vec<InventoryLot> {
    vec![
        InventoryLot::new(
            LotId("inv001".to_string()),
            "Apples",
            LotCategory::Produce,
            100,
            "kg",
            "Reliance Fresh",
            now() + Duration::days(3),
            now() - Duration::days(1),
        )
        .with_dietary_tags(["gluten-free"]),
        InventoryLot::new(
            LotId("inv002".to_string()),
            "Canned Beans",
            LotCategory::CannedGoods,
            500,
            "cans",
            "BigBasket",
            now() + Duration::days(365),
            now() - Duration::days(9),
        )
        .with_dietary_tags(["gluten-free"]),
        InventoryLot::new(
            LotId("inv003".to_string()),
            "Bread",
            LotCategory::Bakery,
            50,
            "loaves",
            "Iyengar Bakery",
            now() + Duration::days(2),
            now(),
        ),
        InventoryLot::new(
            LotId("inv004".to_string()),
            "Milk",
            LotCategory::Dairy,
            80,
            "liters",
            "Nandini Dairy",
            now() + Duration::days(5),
            now(),
        ),
        InventoryLot::new(
            LotId("inv005".to_string()),
            "Oranges",
            LotCategory::Produce,
            150,
            "kg",
            "Reliance Fresh",
            now() + Duration::days(7),
            now() - Duration::days(2),
        ),
    ]
}

pub(super) fn pantry_needs() -> Vec<BeneficiaryNeed> {
    vec![
        need("need01", "Anbu Illam", "Apples", 50, NeedPriority::Medium).with_site(
            "12 Gandhi Street, Chennai",
            1000,
            800,
        ),
        need("need02", "Aashirwad Shelter", "Apples", 75, NeedPriority::High).with_site(
            "45 Lake Road, Chennai",
            500,
            450,
        ),
        need(
            "need03",
            "Akshaya Patra Kitchen",
            "Anything",
            200,
            NeedPriority::High,
        )
        .with_site("7 Bangalore Highway, Chennai", 2000, 1500)
        .with_dietary_requirements(["gluten-free"]),
    ]
}

pub(super) fn pantry() -> InventorySnapshot {
    InventorySnapshot {
        lots: pantry_lots(),
        needs: pantry_needs(),
    }
}

pub(super) fn pending_submission() -> DonationSubmission {
    DonationSubmission {
        id: SubmissionId("sub003".to_string()),
        donor_id: "don001".to_string(),
        donor_name: "Reliance Fresh".to_string(),
        items: vec![SubmissionItem {
            category: SubmissionCategory::Food,
            name: "Fresh Oranges".to_string(),
            quantity: 200,
            unit: "kg".to_string(),
            expires_at: None,
            storage_notes: "Keep in a cool, dry place.".to_string(),
        }],
        status: SubmissionStatus::PendingReview,
        created_at: now() - Duration::hours(3),
        match_details: None,
    }
}

#[derive(Default)]
pub(super) struct MemoryState {
    pub(super) lots: Vec<InventoryLot>,
    pub(super) needs: Vec<BeneficiaryNeed>,
    pub(super) submissions: Vec<DonationSubmission>,
    pub(super) activities: Vec<Activity>,
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) state: Arc<Mutex<MemoryState>>,
}

impl MemoryRepository {
    pub(super) fn seeded() -> Self {
        let repository = Self::default();
        {
            let mut state = repository.state.lock().expect("repository mutex poisoned");
            state.lots = pantry_lots();
            state.needs = pantry_needs();
            state.submissions = vec![pending_submission()];
        }
        repository
    }

    pub(super) fn lot(&self, id: &str) -> InventoryLot {
        let state = self.state.lock().expect("repository mutex poisoned");
        state
            .lots
            .iter()
            .find(|lot| lot.id.0 == id)
            .cloned()
            .expect("lot present")
    }

    pub(super) fn need(&self, id: &str) -> BeneficiaryNeed {
        let state = self.state.lock().expect("repository mutex poisoned");
        state
            .needs
            .iter()
            .find(|need| need.id.0 == id)
            .cloned()
            .expect("need present")
    }

    pub(super) fn lot_count(&self) -> usize {
        self.state.lock().expect("repository mutex poisoned").lots.len()
    }
}

impl AllocationRepository for MemoryRepository {
    fn snapshot(&self) -> Result<InventorySnapshot, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(InventorySnapshot {
            lots: state.lots.clone(),
            needs: state.needs.clone(),
        })
    }

    fn apply_transfer(&self, transfer: &Transfer, activity: &Activity) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        let MemoryState { lots, needs, .. } = &mut *state;
        if !transfer.apply_to(lots, needs) {
            return Err(RepositoryError::NotFound);
        }
        state.activities.push(activity.clone());
        Ok(())
    }

    fn fetch_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<DonationSubmission>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.submissions.iter().find(|s| &s.id == id).cloned())
    }

    fn record_intake(&self, outcome: &IntakeOutcome) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        let slot = state
            .submissions
            .iter_mut()
            .find(|s| s.id == outcome.submission.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = outcome.submission.clone();
        state.lots.extend(outcome.lots.iter().cloned());
        state.activities.push(outcome.activity.clone());
        Ok(())
    }

    fn recent_activities(&self, limit: usize) -> Result<Vec<Activity>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.activities.iter().rev().take(limit).cloned().collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryFeed {
    events: Arc<Mutex<Vec<Activity>>>,
}

impl MemoryFeed {
    pub(super) fn events(&self) -> Vec<Activity> {
        self.events.lock().expect("feed mutex poisoned").clone()
    }
}

impl ActivityFeed for MemoryFeed {
    fn publish(&self, activity: Activity) -> Result<(), FeedError> {
        self.events
            .lock()
            .expect("feed mutex poisoned")
            .push(activity);
        Ok(())
    }
}

pub(super) struct FailingFeed;

impl ActivityFeed for FailingFeed {
    fn publish(&self, _activity: Activity) -> Result<(), FeedError> {
        Err(FeedError::Transport("dashboard offline".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl AllocationRepository for UnavailableRepository {
    fn snapshot(&self) -> Result<InventorySnapshot, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn apply_transfer(&self, _transfer: &Transfer, _activity: &Activity) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_submission(
        &self,
        _id: &SubmissionId,
    ) -> Result<Option<DonationSubmission>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn record_intake(&self, _outcome: &IntakeOutcome) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn recent_activities(&self, _limit: usize) -> Result<Vec<Activity>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn service_with<R, F>(repository: Arc<R>, feed: Arc<F>) -> AllocationService<R, F>
where
    R: AllocationRepository + 'static,
    F: ActivityFeed + 'static,
{
    AllocationService::with_collaborators(
        repository,
        feed,
        AllocationConfig::default(),
        Arc::new(clock()),
        Arc::new(SequentialIds::new()),
    )
}

pub(super) fn build_service() -> (
    AllocationService<MemoryRepository, MemoryFeed>,
    Arc<MemoryRepository>,
    Arc<MemoryFeed>,
) {
    let repository = Arc::new(MemoryRepository::seeded());
    let feed = Arc::new(MemoryFeed::default());
    let service = service_with(repository.clone(), feed.clone());
    (service, repository, feed)
}

pub(super) fn router_with_service(
    service: AllocationService<MemoryRepository, MemoryFeed>,
) -> axum::Router {
    allocation_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
