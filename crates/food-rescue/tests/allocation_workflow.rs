//! End-to-end scenarios for the allocation engine driven through the public
//! service facade, the CSV importer and the HTTP router.

mod common {
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, TimeZone, Utc};

    use food_rescue::allocation::{
        Activity, ActivityFeed, AllocationRepository, AllocationService, DonationSubmission,
        FeedError, FixedClock, IntakeOutcome, InventorySnapshot, RepositoryError, SequentialIds,
        SnapshotImporter, SubmissionId, Transfer,
    };
    use food_rescue::config::AllocationConfig;

    pub(super) const LOTS_CSV: &str = "id,item_name,category,quantity,unit,donor,expires_at,received_at,dietary_tags\n\
inv001,Apples,Produce,100,kg,Reliance Fresh,2025-10-03,2025-09-29,gluten-free\n\
inv002,Canned Beans,Canned Goods,500,cans,BigBasket,2026-09-30,2025-09-21,gluten-free\n\
inv003,Bread,Bakery,50,loaves,Iyengar Bakery,2025-10-02,2025-09-30,\n\
inv004,Milk,Dairy,80,liters,Nandini Dairy,2025-10-05,2025-09-30,\n\
inv005,Oranges,Produce,150,kg,Reliance Fresh,2025-10-07,2025-09-28,\n";

    pub(super) const NEEDS_CSV: &str = "id,beneficiary_name,item_name,quantity_needed,unit,priority,address,capacity,current_stock,dietary_requirements\n\
need01,Anbu Illam,Apples,50,kg,Medium,12 Gandhi Street,1000,800,\n\
need02,Aashirwad Shelter,Apples,75,kg,High,45 Lake Road,500,450,\n\
need03,Akshaya Patra Kitchen,Anything,200,kg,High,7 Bangalore Highway,2000,1500,gluten-free\n\
need04,Night Shelter,Anything,60,kg,Low,3 Beach Road,300,100,\n";

    pub(super) fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 30, 9, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    pub(super) fn snapshot() -> InventorySnapshot {
        InventorySnapshot {
            lots: SnapshotImporter::lots_from_reader(LOTS_CSV.as_bytes()).expect("lots"),
            needs: SnapshotImporter::needs_from_reader(NEEDS_CSV.as_bytes()).expect("needs"),
        }
    }

    #[derive(Default)]
    struct State {
        snapshot: InventorySnapshot,
        submissions: Vec<DonationSubmission>,
        activities: Vec<Activity>,
    }

    #[derive(Default, Clone)]
    pub(super) struct Repository {
        state: Arc<Mutex<State>>,
    }

    impl Repository {
        pub(super) fn with(snapshot: InventorySnapshot, submissions: Vec<DonationSubmission>) -> Self {
            let repository = Self::default();
            {
                let mut state = repository.state.lock().expect("lock");
                state.snapshot = snapshot;
                state.submissions = submissions;
            }
            repository
        }
    }

    impl AllocationRepository for Repository {
        fn snapshot(&self) -> Result<InventorySnapshot, RepositoryError> {
            Ok(self.state.lock().expect("lock").snapshot.clone())
        }

        fn apply_transfer(
            &self,
            transfer: &Transfer,
            activity: &Activity,
        ) -> Result<(), RepositoryError> {
            let mut state = self.state.lock().expect("lock");
            let InventorySnapshot { lots, needs } = &mut state.snapshot;
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
            let state = self.state.lock().expect("lock");
            Ok(state.submissions.iter().find(|s| &s.id == id).cloned())
        }

        fn record_intake(&self, outcome: &IntakeOutcome) -> Result<(), RepositoryError> {
            let mut state = self.state.lock().expect("lock");
            state.submissions.retain(|s| s.id != outcome.submission.id);
            state.submissions.push(outcome.submission.clone());
            state.snapshot.lots.extend(outcome.lots.iter().cloned());
            state.activities.push(outcome.activity.clone());
            Ok(())
        }

        fn recent_activities(&self, limit: usize) -> Result<Vec<Activity>, RepositoryError> {
            let state = self.state.lock().expect("lock");
            Ok(state.activities.iter().rev().take(limit).cloned().collect())
        }
    }

    #[derive(Default, Clone)]
    pub(super) struct Feed {
        events: Arc<Mutex<Vec<Activity>>>,
    }

    impl Feed {
        pub(super) fn events(&self) -> Vec<Activity> {
            self.events.lock().expect("lock").clone()
        }
    }

    impl ActivityFeed for Feed {
        fn publish(&self, activity: Activity) -> Result<(), FeedError> {
            self.events.lock().expect("lock").push(activity);
            Ok(())
        }
    }

    pub(super) fn build_service(
        repository: Repository,
    ) -> (AllocationService<Repository, Feed>, Arc<Repository>, Arc<Feed>) {
        let repository = Arc::new(repository);
        let feed = Arc::new(Feed::default());
        let service = AllocationService::with_collaborators(
            repository.clone(),
            feed.clone(),
            AllocationConfig::default(),
            Arc::new(FixedClock(now())),
            Arc::new(SequentialIds::new()),
        );
        (service, repository, feed)
    }
}

mod recommendations {
    use super::common::*;
    use food_rescue::allocation::{generate_recommendations, MatchRule};

    #[test]
    fn imported_snapshot_ranks_urgent_then_abundant() {
        let candidates = generate_recommendations(&snapshot(), now());

        let summary: Vec<_> = candidates
            .iter()
            .map(|c| (c.lot_id.0.as_str(), c.need_id.0.as_str(), c.quantity, c.rule))
            .collect();
        assert_eq!(
            summary,
            [
                ("inv001", "need02", 75, MatchRule::Urgency),
                ("inv002", "need03", 200, MatchRule::Urgency),
                ("inv003", "need04", 50, MatchRule::WastePrevention),
            ]
        );
        assert!(candidates[2].reason.ends_with("expires on 2025-10-02."));
    }
}

mod commits {
    use std::sync::Arc;
    use std::thread;

    use super::common::*;
    use food_rescue::allocation::{
        AllocationError, AllocationRepository, AllocationRequest, AllocationServiceError,
        EntityKind, LotId, NeedId,
    };

    fn totals(repository: &Repository) -> (u32, u32) {
        let snapshot = repository.snapshot().expect("snapshot");
        (
            snapshot.lots.iter().map(|lot| lot.quantity()).sum(),
            snapshot.needs.iter().map(|need| need.quantity_needed()).sum(),
        )
    }

    #[test]
    fn accepting_every_candidate_conserves_quantity() {
        let (service, repository, feed) = build_service(Repository::with(snapshot(), Vec::new()));
        let (lots_before, needs_before) = totals(&repository);

        let candidates = service.recommend().expect("recommendations");
        let moved: u32 = candidates.iter().map(|c| c.quantity).sum();
        for candidate in &candidates {
            service.accept(candidate).expect("accept");
        }

        let (lots_after, needs_after) = totals(&repository);
        assert_eq!(lots_before - lots_after, moved);
        assert_eq!(needs_before - needs_after, moved);
        assert_eq!(feed.events().len(), candidates.len());
    }

    #[test]
    fn missing_lot_leaves_needs_unchanged() {
        let (service, repository, _) = build_service(Repository::with(snapshot(), Vec::new()));
        let before = repository.snapshot().expect("snapshot").needs;

        let result = service.commit(AllocationRequest {
            lot_id: LotId("inv404".to_string()),
            need_id: NeedId("need01".to_string()),
            quantity: 10,
        });

        assert!(matches!(
            result,
            Err(AllocationServiceError::Allocation(AllocationError::NotFound {
                kind: EntityKind::Lot,
                ..
            }))
        ));
        assert_eq!(repository.snapshot().expect("snapshot").needs, before);
    }

    #[test]
    fn racing_commits_for_one_need_apply_once() {
        let (service, repository, _) = build_service(Repository::with(snapshot(), Vec::new()));
        let service = Arc::new(service);

        let handles: Vec<_> = ["inv001", "inv001"]
            .into_iter()
            .map(|lot| {
                let service = Arc::clone(&service);
                thread::spawn(move || {
                    service.commit(AllocationRequest {
                        lot_id: LotId(lot.to_string()),
                        need_id: NeedId("need02".to_string()),
                        quantity: 60,
                    })
                })
            })
            .collect();
        let outcomes: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .collect();

        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
        let snapshot = repository.snapshot().expect("snapshot");
        let need = snapshot.need(&NeedId("need02".to_string())).expect("need");
        assert_eq!(need.quantity_needed(), 15);
        let lot = snapshot.lot(&LotId("inv001".to_string())).expect("lot");
        assert_eq!(lot.quantity(), 40);
    }
}

mod intake {
    use chrono::Duration;

    use super::common::*;
    use food_rescue::allocation::{
        ActivityKind, DonationSubmission, NeedId, SubmissionCategory, SubmissionId,
        SubmissionItem, SubmissionStatus,
    };

    fn submission() -> DonationSubmission {
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
                storage_notes: String::new(),
            }],
            status: SubmissionStatus::PendingReview,
            created_at: now() - Duration::hours(2),
            match_details: None,
        }
    }

    #[test]
    fn matched_submission_feeds_the_next_recommendation_run() {
        let (service, _, feed) =
            build_service(Repository::with(snapshot(), vec![submission()]));

        let outcome = service
            .match_submission(
                &SubmissionId("sub003".to_string()),
                &NeedId("need04".to_string()),
            )
            .expect("intake");

        assert_eq!(outcome.submission.status, SubmissionStatus::Matched);
        assert_eq!(feed.events()[0].kind, ActivityKind::Donation);

        let activities = service.activities(5).expect("activities");
        assert_eq!(
            activities[0].description,
            "New donation from Reliance Fresh matched to Night Shelter."
        );

        let lots = service.low_stock().expect("low stock");
        assert!(lots.iter().all(|lot| lot.id != outcome.lots[0].id));
    }
}

mod routing {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    use super::common::*;
    use food_rescue::allocation::allocation_router;

    async fn read_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&body).expect("json")
    }

    #[tokio::test]
    async fn recommend_then_commit_over_http() {
        let (service, _, _) = build_service(Repository::with(snapshot(), Vec::new()));
        let router = allocation_router(Arc::new(service));

        let response = router
            .clone()
            .oneshot(
                Request::get("/api/v1/allocation/recommendations")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let candidates = read_json(response).await;
        let first = &candidates[0];

        let response = router
            .clone()
            .oneshot(
                Request::post("/api/v1/allocation/commits")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::to_vec(&json!({
                            "lot_id": first["lot_id"],
                            "need_id": first["need_id"],
                            "quantity": first["quantity"],
                        }))
                        .unwrap(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = router
            .oneshot(
                Request::get("/api/v1/allocation/recommendations")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let after = read_json(response).await;
        assert!(after
            .as_array()
            .expect("array")
            .iter()
            .all(|candidate| candidate["need_id"] != first["need_id"]));
    }
}
