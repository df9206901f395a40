use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cognito_gate_core::{ApiResponse, HttpError};

/// Reasons a request is denied by the verification gate.
///
/// Every variant is terminal for the request: nothing is retried and the
/// gate turns it into a single `401` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// The token header is absent or empty.
    MissingToken,

    /// The signing keys could not be fetched, parsed, or reconstructed.
    KeyFetchFailure(String),

    /// The token header declares an algorithm outside the allowed RSA family.
    UnsupportedAlgorithm(String),

    /// The `kid` from the token header is not in the key set.
    UnknownKeyId(String),

    /// The signature does not verify against the selected key.
    SignatureInvalid(String),

    /// The `iss` claim is missing or does not match the user pool.
    IssuerMismatch(String),

    /// The `token_use` claim is neither `id` nor `access`.
    InvalidTokenUse,

    /// The `exp` claim is absent or not in the future.
    TokenExpired,

    /// The token is structurally invalid (segments, base64, JSON).
    MalformedToken(String),

    /// The configured credential validator refused the token.
    CredentialsRejected(String),
}

impl std::fmt::Display for GateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateError::MissingToken => write!(f, "missing token"),
            GateError::KeyFetchFailure(msg) => write!(f, "unable to fetch signing keys: {msg}"),
            GateError::UnsupportedAlgorithm(alg) => write!(f, "unexpected signing method: {alg}"),
            GateError::UnknownKeyId(kid) => write!(f, "key not found: {kid}"),
            GateError::SignatureInvalid(msg) => write!(f, "invalid token signature: {msg}"),
            GateError::IssuerMismatch(msg) => write!(f, "{msg}"),
            GateError::InvalidTokenUse => write!(f, "token_use should be id or access"),
            GateError::TokenExpired => write!(f, "token is expired"),
            GateError::MalformedToken(msg) => write!(f, "malformed token: {msg}"),
            GateError::CredentialsRejected(msg) => write!(f, "credentials rejected: {msg}"),
        }
    }
}

impl std::error::Error for GateError {}

impl GateError {
    /// The reason written into the denial body.
    ///
    /// Key-fetch failures carry upstream details that stay in the logs.
    pub fn public_reason(&self) -> String {
        match self {
            GateError::KeyFetchFailure(_) => "unable to fetch signing keys".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::error(StatusCode::UNAUTHORIZED, self.public_reason()).into_response()
    }
}

impl From<GateError> for HttpError {
    fn from(err: GateError) -> Self {
        HttpError::Unauthorized(err.public_reason())
    }
}
