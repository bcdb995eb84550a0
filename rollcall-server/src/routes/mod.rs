use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{
    auth,
    handlers::{self, dismissal, students, ws},
    infra::app_state::AppState,
};

/// Create all API routes, mounted under `/api` by the caller.
pub fn create_api_router(state: AppState) -> Router<AppState> {
    Router::new()
        // Public endpoints
        .route("/auth/login", post(auth::handlers::login))
        .route("/health", get(handlers::health_handler))
        // Merge protected routes
        .merge(create_protected_routes(state.clone()))
        // Merge admin routes
        .merge(create_admin_routes(state))
}

/// Routes that require a valid bearer credential (teacher or admin).
fn create_protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(auth::handlers::me))
        // Scan endpoints
        //
        .route("/dismissal/check-in", post(dismissal::check_in_handler))
        .route("/dismissal/check-out", post(dismissal::check_out_handler))
        .route("/dismissal/active", get(dismissal::active_handler))
        .route(
            "/dismissal/active/clear",
            axum::routing::delete(dismissal::clear_all_handler),
        )
        .route(
            "/dismissal/active/{student_id}",
            axum::routing::delete(dismissal::clear_one_handler),
        )
        .route("/dismissal/status/{barcode}", get(dismissal::status_handler))
        // Audit log reads
        //
        .route("/dismissal/logs", get(dismissal::logs_handler))
        .route("/dismissal/today", get(dismissal::today_handler))
        .route(
            "/dismissal/history/{student_id}",
            get(dismissal::history_handler),
        )
        // Student directory (dashboards enrich live rows from this)
        .route("/students", get(students::list_students_handler))
        .route("/students/classes", get(students::list_classes_handler))
        // Live roster push channel
        .route("/dismissal/ws", axum::routing::any(ws::websocket_handler))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::middleware::auth_middleware,
        ))
}

/// Student management requires the admin role.
fn create_admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/students", post(students::create_student_handler))
        .route(
            "/students/{id}",
            axum::routing::put(students::update_student_handler),
        )
        .route(
            "/students/{id}",
            axum::routing::delete(students::delete_student_handler),
        )
        .route_layer(middleware::from_fn(auth::middleware::require_admin))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::middleware::auth_middleware,
        ))
}
