use chrono::{DateTime, Duration, Utc};
use food_rescue::allocation::snapshot::parse_timestamp;
use food_rescue::allocation::{
    Activity, ActivityFeed, AllocationRepository, BeneficiaryNeed, DonationSubmission, FeedError,
    IntakeOutcome, InventoryLot, InventorySnapshot, LotCategory, LotId, NeedId, NeedPriority,
    RepositoryError, SubmissionCategory, SubmissionId, SubmissionItem, SubmissionStatus,
    Transfer,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Debug, Default)]
struct InventoryState {
    snapshot: InventorySnapshot,
    submissions: Vec<DonationSubmission>,
    activities: Vec<Activity>,
}

/// Process-local storage; records keep insertion order so recommendation
/// tie-breaks follow the order lots and needs were created.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryAllocationRepository {
    state: Arc<Mutex<InventoryState>>,
}

impl InMemoryAllocationRepository {
    pub(crate) fn seeded(snapshot: InventorySnapshot, submissions: Vec<DonationSubmission>) -> Self {
        Self {
            state: Arc::new(Mutex::new(InventoryState {
                snapshot,
                submissions,
                activities: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, InventoryState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("inventory lock poisoned".to_string()))
    }
}

impl AllocationRepository for InMemoryAllocationRepository {
    fn snapshot(&self) -> Result<InventorySnapshot, RepositoryError> {
        Ok(self.lock()?.snapshot.clone())
    }

    fn apply_transfer(&self, transfer: &Transfer, activity: &Activity) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let InventorySnapshot { lots, needs } = &mut guard.snapshot;
        if !transfer.apply_to(lots, needs) {
            return Err(RepositoryError::NotFound);
        }
        guard.activities.push(activity.clone());
        Ok(())
    }

    fn fetch_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<DonationSubmission>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard
            .submissions
            .iter()
            .find(|submission| &submission.id == id)
            .cloned())
    }

    fn record_intake(&self, outcome: &IntakeOutcome) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let slot = guard
            .submissions
            .iter_mut()
            .find(|submission| submission.id == outcome.submission.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = outcome.submission.clone();
        guard.snapshot.lots.extend(outcome.lots.iter().cloned());
        guard.activities.push(outcome.activity.clone());
        Ok(())
    }

    fn recent_activities(&self, limit: usize) -> Result<Vec<Activity>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.activities.iter().rev().take(limit).cloned().collect())
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryActivityFeed {
    events: Arc<Mutex<Vec<Activity>>>,
}

impl ActivityFeed for InMemoryActivityFeed {
    fn publish(&self, activity: Activity) -> Result<(), FeedError> {
        let mut guard = self
            .events
            .lock()
            .map_err(|_| FeedError::Transport("feed lock poisoned".to_string()))?;
        guard.push(activity);
        Ok(())
    }
}

#[cfg(test)]
impl InMemoryActivityFeed {
    pub(crate) fn events(&self) -> Vec<Activity> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

/// Pantry used by `demo` and `serve --seed-demo`, dated relative to `now`.
pub(crate) fn demo_inventory(now: DateTime<Utc>) -> InventorySnapshot {
    let lot = |id: &str,
               item: &str,
               category: LotCategory,
               quantity: u32,
               unit: &str,
               donor: &str,
               days: i64| {
        InventoryLot::new(
            LotId(id.to_string()),
            item,
            category,
            quantity,
            unit,
            donor,
            now + Duration::days(days),
            now - Duration::days(1),
        )
    };

    InventorySnapshot {
        lots: vec![
            lot("inv001", "Apples", LotCategory::Produce, 100, "kg", "Reliance Fresh", 3)
                .with_dietary_tags(["gluten-free"]),
            lot("inv002", "Canned Beans", LotCategory::CannedGoods, 500, "cans", "BigBasket", 365)
                .with_dietary_tags(["gluten-free"]),
            lot("inv003", "Bread", LotCategory::Bakery, 50, "loaves", "Iyengar Bakery", 2),
            lot("inv004", "Milk", LotCategory::Dairy, 80, "liters", "Nandini Dairy", 5),
            lot("inv005", "Oranges", LotCategory::Produce, 150, "kg", "Reliance Fresh", 7),
        ],
        needs: vec![
            BeneficiaryNeed::new(
                NeedId("need01".to_string()),
                "Anbu Illam",
                "Apples",
                50,
                "kg",
                NeedPriority::Medium,
            )
            .with_site("12 Gandhi Street, Chennai", 1000, 800),
            BeneficiaryNeed::new(
                NeedId("need02".to_string()),
                "Aashirwad Shelter",
                "Apples",
                75,
                "kg",
                NeedPriority::High,
            )
            .with_site("45 Lake Road, Chennai", 500, 450),
            BeneficiaryNeed::new(
                NeedId("need03".to_string()),
                "Akshaya Patra Kitchen",
                "Anything",
                200,
                "kg",
                NeedPriority::High,
            )
            .with_site("7 Bangalore Highway, Chennai", 2000, 1500)
            .with_dietary_requirements(["gluten-free"]),
        ],
    }
}

pub(crate) fn demo_submissions(now: DateTime<Utc>) -> Vec<DonationSubmission> {
    vec![DonationSubmission {
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
        created_at: now - Duration::hours(3),
        match_details: None,
    }]
}

pub(crate) fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(raw)
        .ok_or_else(|| format!("failed to parse '{raw}' as RFC 3339 or YYYY-MM-DD"))
}
