pub mod dismissal;
pub mod students;
pub mod ws;

use axum::Json;
use chrono::Utc;
use serde_json::{Value, json};

/// Health check endpoint
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "Server is running",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
