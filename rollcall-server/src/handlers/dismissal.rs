use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use rollcall_model::{ActiveStudent, LogEntry, Student, StudentId, StudentStatus, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppResult;
use crate::infra::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct BarcodeRequest {
    pub barcode: String,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub message: String,
    pub student: Student,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default = "default_log_limit")]
    pub limit: i64,
}

fn default_log_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: i64,
}

fn default_history_limit() -> i64 {
    20
}

/// Check a student in by barcode.
///
/// # Response
///
/// - `200` with the student and check-in timestamp
/// - `400` when the student is already checked in (terminal rejection, not
///   a retry candidate) or the barcode is empty
/// - `404` for an unknown barcode
pub async fn check_in_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<BarcodeRequest>,
) -> AppResult<Json<CheckResponse>> {
    let receipt = state
        .roster
        .check_in(&request.barcode, Some(user.id))
        .await?;

    Ok(Json(CheckResponse {
        message: "Student checked in successfully".to_string(),
        student: receipt.student,
        timestamp: receipt.timestamp,
    }))
}

/// Check a student out by barcode. `400` when not checked in.
pub async fn check_out_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<BarcodeRequest>,
) -> AppResult<Json<CheckResponse>> {
    let receipt = state
        .roster
        .check_out(&request.barcode, Some(user.id))
        .await?;

    Ok(Json(CheckResponse {
        message: "Student checked out successfully".to_string(),
        student: receipt.student,
        timestamp: receipt.timestamp,
    }))
}

/// All currently active students, class+name order.
pub async fn active_handler(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ActiveStudent>>> {
    Ok(Json(state.roster.active_roster().await?))
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub message: String,
    pub cleared: u64,
}

/// End-of-day bulk check-out.
pub async fn clear_all_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<ClearResponse>> {
    let cleared = state.roster.clear_all(Some(user.id)).await?;

    Ok(Json(ClearResponse {
        message: format!("Cleared {cleared} active students"),
        cleared,
    }))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Remove one roster entry by student id (admin correction path).
pub async fn clear_one_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(student_id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state
        .roster
        .clear_one(StudentId(student_id), Some(user.id))
        .await?;

    Ok(Json(MessageResponse {
        message: "Active entry removed".to_string(),
    }))
}

/// Current status for a barcode; scan stations call this after an ambiguous
/// timeout instead of blindly retrying the check-in.
pub async fn status_handler(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> AppResult<Json<StudentStatus>> {
    Ok(Json(state.roster.status(&barcode).await?))
}

/// Most recent dismissal log rows.
pub async fn logs_handler(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<LogEntry>>> {
    Ok(Json(state.roster.recent_logs(query.limit).await?))
}

/// Today's check-in/check-out activity.
pub async fn today_handler(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<LogEntry>>> {
    Ok(Json(state.roster.today_activity().await?))
}

/// Per-student dismissal history.
pub async fn history_handler(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<LogEntry>>> {
    Ok(Json(
        state
            .roster
            .student_history(StudentId(student_id), query.limit)
            .await?,
    ))
}
