use axum::http::Uri;
use axum::routing::get;
use axum::Router;
use cognito_gate_core::{default_cors, default_trace, ApiResponse, HttpError};
use cognito_gate_security::{CognitoGate, CognitoUser};
use serde_json::{json, Value};

/// Public routes plus the `/admin` routes behind `gate`.
pub fn router(gate: &CognitoGate) -> Router {
    let admin = Router::new()
        .route("/admin/", get(admin_index))
        .route("/admin/me", get(admin_me))
        .route("/admin/ping", get(admin_ping));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .merge(gate.protect(admin))
        .fallback(not_found)
        .layer(default_cors())
        .layer(default_trace())
}

async fn index() -> ApiResponse<Value> {
    ApiResponse::ok(json!({ "message": "Hello World" }))
}

async fn not_found(uri: Uri) -> HttpError {
    HttpError::NotFound(format!("no route for {}", uri.path()))
}

async fn health() -> &'static str {
    "OK"
}

async fn admin_index() -> ApiResponse<Value> {
    ApiResponse::ok(json!({ "message": "Hello Admin" }))
}

async fn admin_me(user: CognitoUser) -> ApiResponse<CognitoUser> {
    ApiResponse::ok(user)
}

/// Reachable without a token when listed in `gate.skip_paths`.
async fn admin_ping(user: Option<CognitoUser>) -> ApiResponse<Value> {
    ApiResponse::ok(json!({
        "message": "pong",
        "authenticated": user.is_some(),
    }))
}
