use axum::http::StatusCode;
use axum::response::IntoResponse;
use cognito_gate_core::{ApiResponse, HttpError};
use http_body_util::BodyExt;
use serde_json::{json, Value};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[test]
fn error_envelope_omits_data() {
    let envelope = ApiResponse::<()>::error(StatusCode::UNAUTHORIZED, "token is expired");
    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value, json!({ "http_status": 401, "errors": "token is expired" }));
}

#[test]
fn ok_envelope_omits_errors() {
    let envelope = ApiResponse::ok(json!({ "message": "Hello Admin" }));
    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(
        value,
        json!({ "data": { "message": "Hello Admin" }, "http_status": 200 })
    );
}

#[tokio::test]
async fn envelope_response_uses_its_status() {
    let response =
        ApiResponse::<()>::error(StatusCode::UNAUTHORIZED, "missing token").into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    let body = body_json(response).await;
    assert_eq!(body["http_status"], 401);
    assert_eq!(body["errors"], "missing token");
}

#[tokio::test]
async fn http_error_renders_envelope() {
    let response = HttpError::NotFound("no such route".into()).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body, json!({ "http_status": 404, "errors": "no such route" }));
}

#[test]
fn http_error_display() {
    let err = HttpError::Unauthorized("bad token".into());
    assert_eq!(err.to_string(), "Unauthorized: bad token");
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}
