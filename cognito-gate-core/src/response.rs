//! JSON response envelope shared by every endpoint.
//!
//! Every body has the shape `{ "data": ..., "http_status": 200, "errors": ... }`
//! where absent `data` / `errors` are omitted entirely:
//!
//! ```ignore
//! // 200 {"data":{"message":"Hello Admin"},"http_status":200}
//! ApiResponse::ok(json!({ "message": "Hello Admin" }))
//!
//! // 401 {"http_status":401,"errors":"token is expired"}
//! ApiResponse::<()>::error(StatusCode::UNAUTHORIZED, "token is expired")
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = serde_json::Value> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    pub http_status: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}

impl<T> ApiResponse<T> {
    /// A `200 OK` envelope carrying `data`.
    pub fn ok(data: T) -> Self {
        Self::with_status(StatusCode::OK, data)
    }

    /// A success envelope with an explicit status.
    pub fn with_status(status: StatusCode, data: T) -> Self {
        Self {
            data: Some(data),
            http_status: status.as_u16(),
            errors: None,
        }
    }

    /// A failure envelope carrying only the status and the error reason.
    pub fn error(status: StatusCode, reason: impl Into<String>) -> Self {
        Self {
            data: None,
            http_status: status.as_u16(),
            errors: Some(reason.into()),
        }
    }

    /// The HTTP status this envelope is sent with.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}
