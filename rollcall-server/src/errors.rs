use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));

        (self.status, body).into_response()
    }
}

// Business outcomes map onto the scan-station contract: unknown barcode is
// 404, an invariant rejection ("already checked in" / "not checked in") is
// 400, and only store failures surface as 500.
impl From<rollcall_core::RosterError> for AppError {
    fn from(err: rollcall_core::RosterError) -> Self {
        use rollcall_core::RosterError;
        match err {
            RosterError::NotFound(msg) => Self::not_found(msg),
            RosterError::Conflict(msg) => Self::bad_request(msg),
            RosterError::Validation(msg) => Self::bad_request(msg),
            RosterError::Internal(msg) => Self::internal(msg),
            _ => Self::internal(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;
    use axum::http::StatusCode;
    use rollcall_core::RosterError;

    #[test]
    fn roster_errors_map_to_scan_station_statuses() {
        let err: AppError = RosterError::NotFound("Student not found".into()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err: AppError = RosterError::Conflict("Student is already checked in".into()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Student is already checked in");

        let err: AppError = RosterError::Validation("Barcode is required".into()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err: AppError = RosterError::Internal("connection reset".into()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
