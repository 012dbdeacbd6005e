use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use soulstat_backend::{AnalysisReport, BackendError, DeepReport};
use soulstat_report::ChapterSection;

use super::error::ApiError;
use super::server::AppState;

const MISSING_BIRTH_DATE: &str = "Birth date is required";
const DEEP_FAILED: &str = "Failed to generate report from backend";

#[derive(Debug, Deserialize)]
pub(crate) struct ChaptersRequest {
    deep_report: String,
}

#[derive(Serialize)]
struct ChaptersResponse {
    chapters: Vec<ChapterSection>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    version: &'static str,
}

/// Parse the raw body regardless of its content type.
///
/// Only the presence of `birthDate` is checked; the object is forwarded to the
/// backend untouched, which owns validation of every field.
fn parse_request(body: &Bytes) -> Result<Map<String, Value>, ApiError> {
    let payload: Value = serde_json::from_slice(body).map_err(|e| {
        tracing::warn!("unreadable request body: {e}");
        ApiError::internal()
    })?;
    let Value::Object(fields) = payload else {
        return Err(ApiError::bad_request(MISSING_BIRTH_DATE));
    };

    let missing = match fields.get("birthDate") {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    };
    if missing {
        return Err(ApiError::bad_request(MISSING_BIRTH_DATE));
    }
    Ok(fields)
}

fn map_backend_error(err: BackendError, upstream_message: impl FnOnce(u16) -> String) -> ApiError {
    match err {
        BackendError::Upstream { status, .. } => {
            let code = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            ApiError::new(code, upstream_message(status))
        }
        other => {
            tracing::error!("backend request failed: {other}");
            ApiError::internal()
        }
    }
}

pub(crate) async fn analyze_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AnalysisReport>, ApiError> {
    let request = parse_request(&body)?;
    tracing::debug!(birth_date = %request["birthDate"], "forwarding analysis request");

    let report = state
        .backend
        .analyze(&request)
        .await
        .map_err(|e| map_backend_error(e, |status| format!("Backend failed: {status}")))?;
    Ok(Json(report))
}

pub(crate) async fn deep_analyze_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DeepReport>, ApiError> {
    let request = parse_request(&body)?;
    tracing::info!(
        payment_id = request.get("paymentId").and_then(serde_json::Value::as_str).unwrap_or("-"),
        "forwarding deep analysis request"
    );

    let report = state
        .backend
        .analyze_deep(&request)
        .await
        .map_err(|e| map_backend_error(e, |_| DEEP_FAILED.to_owned()))?;
    tracing::debug!(report_len = report.deep_report.len(), "deep report received");
    Ok(Json(report))
}

pub(crate) async fn chapters_handler(
    payload: Result<Json<ChaptersRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::new(e.status(), e.body_text()))?;
    let chapters = soulstat_report::segment(&payload.deep_report);
    Ok(Json(ChaptersResponse {
        chapters: chapters.into_sections(),
    }))
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
