use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::committer::AllocationError;
use super::domain::{AllocationRequest, NeedId, SubmissionId};
use super::repository::{ActivityFeed, AllocationRepository, RepositoryError};
use super::service::{AllocationService, AllocationServiceError};

const DEFAULT_ACTIVITY_LIMIT: usize = 20;

/// Router builder exposing recommendation, commit and intake endpoints.
pub fn allocation_router<R, F>(service: Arc<AllocationService<R, F>>) -> Router
where
    R: AllocationRepository + 'static,
    F: ActivityFeed + 'static,
{
    Router::new()
        .route(
            "/api/v1/allocation/recommendations",
            get(recommendations_handler::<R, F>),
        )
        .route("/api/v1/allocation/commits", post(commit_handler::<R, F>))
        .route(
            "/api/v1/allocation/submissions/:submission_id/match",
            post(submission_match_handler::<R, F>),
        )
        .route(
            "/api/v1/allocation/activities",
            get(activities_handler::<R, F>),
        )
        .route(
            "/api/v1/allocation/suggestions",
            get(suggestions_handler::<R, F>),
        )
        .route("/api/v1/allocation/low-stock", get(low_stock_handler::<R, F>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmissionMatchBody {
    pub(crate) need_id: NeedId,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ActivityQuery {
    pub(crate) limit: Option<usize>,
}

impl AllocationServiceError {
    /// HTTP status an API surface should answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Allocation(AllocationError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Allocation(AllocationError::InvalidQuantity { .. })
            | Self::Allocation(AllocationError::IncompatibleMatch { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Allocation(AllocationError::SubmissionNotPending { .. }) => StatusCode::CONFLICT,
            Self::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Repository(RepositoryError::Unavailable(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AllocationServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let payload = match &self {
            AllocationServiceError::Allocation(AllocationError::InvalidQuantity {
                requested,
                issue,
            }) => json!({
                "error": self.to_string(),
                "requested": requested,
                "detail": issue,
            }),
            other => json!({
                "error": other.to_string(),
            }),
        };
        (status, axum::Json(payload)).into_response()
    }
}

pub(crate) async fn recommendations_handler<R, F>(
    State(service): State<Arc<AllocationService<R, F>>>,
) -> Response
where
    R: AllocationRepository + 'static,
    F: ActivityFeed + 'static,
{
    match service.recommend() {
        Ok(candidates) => (StatusCode::OK, axum::Json(candidates)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn commit_handler<R, F>(
    State(service): State<Arc<AllocationService<R, F>>>,
    axum::Json(request): axum::Json<AllocationRequest>,
) -> Response
where
    R: AllocationRepository + 'static,
    F: ActivityFeed + 'static,
{
    match service.commit(request) {
        Ok(receipt) => (StatusCode::CREATED, axum::Json(receipt)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn submission_match_handler<R, F>(
    State(service): State<Arc<AllocationService<R, F>>>,
    Path(submission_id): Path<String>,
    axum::Json(body): axum::Json<SubmissionMatchBody>,
) -> Response
where
    R: AllocationRepository + 'static,
    F: ActivityFeed + 'static,
{
    let id = SubmissionId(submission_id);
    match service.match_submission(&id, &body.need_id) {
        Ok(outcome) => (StatusCode::CREATED, axum::Json(outcome)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn activities_handler<R, F>(
    State(service): State<Arc<AllocationService<R, F>>>,
    Query(query): Query<ActivityQuery>,
) -> Response
where
    R: AllocationRepository + 'static,
    F: ActivityFeed + 'static,
{
    let limit = query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
    match service.activities(limit) {
        Ok(activities) => (StatusCode::OK, axum::Json(activities)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn suggestions_handler<R, F>(
    State(service): State<Arc<AllocationService<R, F>>>,
) -> Response
where
    R: AllocationRepository + 'static,
    F: ActivityFeed + 'static,
{
    match service.suggestions() {
        Ok(suggestions) => (StatusCode::OK, axum::Json(suggestions)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn low_stock_handler<R, F>(
    State(service): State<Arc<AllocationService<R, F>>>,
) -> Response
where
    R: AllocationRepository + 'static,
    F: ActivityFeed + 'static,
{
    match service.low_stock() {
        Ok(lots) => (StatusCode::OK, axum::Json(lots)).into_response(),
        Err(error) => error.into_response(),
    }
}
