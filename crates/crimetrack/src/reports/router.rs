use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::admission::AdmissionDenied;
use super::domain::{AdminId, MobileNumber, ReportId, ReportStatus, ReportSubmission};
use super::service::{ReportService, ReportServiceError};
use super::store::{Notifier, ReportStore};

/// Router builder exposing the report endpoints.
pub fn report_router<S, N>(service: Arc<ReportService<S, N>>) -> Router
where
    S: ReportStore + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route("/api/v1/reports", post(submit_handler::<S, N>))
        .route("/api/v1/reports/heatmap", get(heatmap_handler::<S, N>))
        .route("/api/v1/reports/:report_id", get(report_handler::<S, N>))
        .route(
            "/api/v1/reports/:report_id/review",
            post(review_handler::<S, N>),
        )
        .route("/api/v1/admin/reports", get(list_handler::<S, N>))
        .route("/api/v1/admin/stats", get(stats_handler::<S, N>))
        .route(
            "/api/v1/submitters/:mobile/reports",
            get(history_handler::<S, N>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<S, N>(
    State(service): State<Arc<ReportService<S, N>>>,
    axum::Json(submission): axum::Json<ReportSubmission>,
) -> Response
where
    S: ReportStore + 'static,
    N: Notifier + 'static,
{
    match service.submit(submission) {
        Ok(receipt) => (StatusCode::CREATED, axum::Json(receipt)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn report_handler<S, N>(
    State(service): State<Arc<ReportService<S, N>>>,
    Path(report_id): Path<String>,
) -> Response
where
    S: ReportStore + 'static,
    N: Notifier + 'static,
{
    match service.get(&ReportId(report_id)) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

/// Body of a review request. The admin identity arrives with the request;
/// authentication itself happens upstream.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub admin_id: String,
    pub status: String,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

pub(crate) async fn review_handler<S, N>(
    State(service): State<Arc<ReportService<S, N>>>,
    Path(report_id): Path<String>,
    axum::Json(request): axum::Json<ReviewRequest>,
) -> Response
where
    S: ReportStore + 'static,
    N: Notifier + 'static,
{
    let Some(target) = ReportStatus::parse(&request.status) else {
        let payload = json!({ "error": format!("unknown status '{}'", request.status) });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    };

    match service.review(
        &ReportId(report_id),
        AdminId(request.admin_id),
        target,
        request.admin_notes,
    ) {
        Ok(report) => (
            StatusCode::OK,
            axum::Json(json!({
                "success": true,
                "message": "Report updated successfully",
                "report": report,
            })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    status: Option<String>,
}

pub(crate) async fn list_handler<S, N>(
    State(service): State<Arc<ReportService<S, N>>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    S: ReportStore + 'static,
    N: Notifier + 'static,
{
    let filter = match &query.status {
        Some(raw) => match ReportStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                let payload = json!({ "error": format!("unknown status '{raw}'") });
                return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
            }
        },
        None => None,
    };

    match service.list(filter) {
        Ok(reports) => (StatusCode::OK, axum::Json(json!({ "reports": reports }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn stats_handler<S, N>(
    State(service): State<Arc<ReportService<S, N>>>,
) -> Response
where
    S: ReportStore + 'static,
    N: Notifier + 'static,
{
    match service.dashboard_stats() {
        Ok(stats) => (StatusCode::OK, axum::Json(stats)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn history_handler<S, N>(
    State(service): State<Arc<ReportService<S, N>>>,
    Path(mobile): Path<String>,
) -> Response
where
    S: ReportStore + 'static,
    N: Notifier + 'static,
{
    let Some(submitter) = MobileNumber::new(&mobile) else {
        let payload = json!({ "error": "mobile number must be exactly 10 digits" });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    };

    match service.submitter_history(&submitter, Utc::now()) {
        Ok(history) => (StatusCode::OK, axum::Json(history)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn heatmap_handler<S, N>(
    State(service): State<Arc<ReportService<S, N>>>,
) -> Response
where
    S: ReportStore + 'static,
    N: Notifier + 'static,
{
    match service.heatmap_points() {
        Ok(points) => {
            (StatusCode::OK, axum::Json(json!({ "heatmapData": points }))).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// Map service errors onto wire payloads. Rate-limit rejections carry the
/// machine-readable rule that fired and, for cooldown, the retry hint.
fn error_response(err: ReportServiceError) -> Response {
    let status = err.status_code();
    let payload = match &err {
        ReportServiceError::RateLimit(AdmissionDenied::DailyLimitExceeded {
            reports_today,
            daily_cap,
        }) => json!({
            "error": "Daily limit exceeded",
            "message": format!(
                "You can only report {daily_cap} crimes per day. Please try again tomorrow."
            ),
            "limitType": "daily",
            "reportsToday": reports_today,
        }),
        ReportServiceError::RateLimit(AdmissionDenied::CooldownActive {
            retry_after,
            hours_remaining,
        }) => json!({
            "error": "Time limit not met",
            "message": format!(
                "Please wait {hours_remaining} more hour(s) before submitting another report."
            ),
            "limitType": "timeGap",
            "hoursRemaining": hours_remaining,
            "retryAfter": retry_after,
        }),
        other => json!({ "error": other.to_string() }),
    };

    (status, axum::Json(payload)).into_response()
}
