use axum::{Extension, Json, extract::State};
use rollcall_model::User;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::infra::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Exchange username/password for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::bad_request("Username and password are required"));
    }

    let user = state
        .users
        .find_by_username(&request.username)
        .await?
        .filter(|user| {
            state
                .auth_crypto
                .verify_password(&request.password, &user.password_hash)
        })
        .ok_or_else(|| AppError::unauthorized("Invalid username or password"))?;

    let token = state
        .jwt_keys
        .issue(&user)
        .map_err(|e| AppError::internal(format!("Failed to issue token: {e}")))?;

    Ok(Json(LoginResponse { token, user }))
}

/// Current authenticated user, resolved by the auth middleware.
pub async fn me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}
