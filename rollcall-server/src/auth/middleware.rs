use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use rollcall_model::{Role, User, UserId};
use serde_json::json;

use crate::infra::app_state::AppState;

/// Require a valid bearer token and attach the resolved user to the request.
///
/// The WebSocket route shares this middleware; browser dashboards cannot set
/// headers on the upgrade request, so a `token` query parameter is accepted
/// as an equivalent credential.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_token(&request)?;
    let user = validate_and_get_user(&state, &token).await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Require the admin role. Runs AFTER auth_middleware in the layer stack.
pub async fn require_admin(request: Request, next: Next) -> Response {
    let Some(user) = request.extensions().get::<User>() else {
        return (
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({"error": {"message": "Authentication required", "status": 401}})),
        )
            .into_response();
    };

    if user.role != Role::Admin {
        return (
            StatusCode::FORBIDDEN,
            axum::Json(json!({"error": {"message": "Admin access required", "status": 403}})),
        )
            .into_response();
    }

    next.run(request).await
}

fn extract_token(request: &Request) -> Result<String, StatusCode> {
    if let Some(auth_header) = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    {
        if let Some(token) = auth_header.strip_prefix("Bearer ") {
            return Ok(token.to_string());
        }
        return Err(StatusCode::UNAUTHORIZED);
    }

    if let Some(query) = request.uri().query()
        && let Some((_, token)) = url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "token")
    {
        return Ok(token.into_owned());
    }

    Err(StatusCode::UNAUTHORIZED)
}

async fn validate_and_get_user(state: &AppState, token: &str) -> Result<User, StatusCode> {
    let claims = state
        .jwt_keys
        .verify(token)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    state
        .users
        .find_by_id(UserId(claims.sub))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::UNAUTHORIZED)
}
