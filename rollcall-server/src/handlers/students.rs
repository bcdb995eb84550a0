use axum::{
    Json,
    extract::{Path, State},
};
use rollcall_model::{NewStudent, Student, StudentId, StudentUpdate};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::handlers::dismissal::MessageResponse;
use crate::infra::app_state::AppState;

/// Full student directory, class+name order. Dashboards fetch this to
/// enrich live roster rows with photo and sound references.
pub async fn list_students_handler(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Student>>> {
    Ok(Json(state.students.all().await?))
}

pub async fn create_student_handler(
    State(state): State<AppState>,
    Json(new): Json<NewStudent>,
) -> AppResult<Json<Student>> {
    if new.barcode.trim().is_empty() || new.name.trim().is_empty() {
        return Err(AppError::bad_request("Barcode and name are required"));
    }

    Ok(Json(state.students.create(new).await?))
}

pub async fn update_student_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<StudentUpdate>,
) -> AppResult<Json<Student>> {
    Ok(Json(state.students.update(StudentId(id), update).await?))
}

pub async fn delete_student_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state.students.delete(StudentId(id)).await?;
    Ok(Json(MessageResponse {
        message: "Student deleted".to_string(),
    }))
}

pub async fn list_classes_handler(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.students.classes().await?))
}
