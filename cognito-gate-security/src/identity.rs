use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use cognito_gate_core::HttpError;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::jwt::VerifiedToken;

/// The caller behind a request admitted by the gate.
///
/// Built from the [`VerifiedToken`] the gate stores in the request
/// extensions, so handlers never see an unverified token.
///
/// ```ignore
/// async fn me(user: CognitoUser) -> ApiResponse<CognitoUser> {
///     ApiResponse::ok(user)
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CognitoUser {
    /// Subject claim ("sub") - unique user identifier in the pool.
    pub sub: String,

    /// `username` (access tokens) or `cognito:username` (id tokens).
    pub username: Option<String>,

    /// `id` or `access`.
    pub token_use: Option<String>,

    /// App client the token was issued to.
    pub client_id: Option<String>,

    /// Email claim, usually only present in id tokens.
    pub email: Option<String>,

    /// `cognito:groups` memberships.
    pub groups: Vec<String>,

    /// Raw claims for advanced access.
    pub claims: serde_json::Value,
}

impl CognitoUser {
    pub fn from_token(token: &VerifiedToken) -> Self {
        let claims = &token.claims;
        Self {
            sub: claims.sub().unwrap_or_default().to_string(),
            username: claims.username().map(String::from),
            token_use: claims.token_use().map(String::from),
            client_id: claims.client_id().map(String::from),
            email: claims.email().map(String::from),
            groups: claims.groups(),
            claims: claims.clone().into_value(),
        }
    }

    /// Check whether the user belongs to a specific group.
    pub fn has_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}

/// Reads the identity stored by the gate. Routes outside the gate reject with
/// `401`.
impl<S> FromRequestParts<S> for CognitoUser
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<VerifiedToken>() {
            Some(token) => Ok(CognitoUser::from_token(token)),
            None => {
                warn!(uri = %parts.uri, "CognitoUser requested on a route without a verified token");
                Err(HttpError::Unauthorized("missing token".into()))
            }
        }
    }
}

/// `Option<CognitoUser>` is `None` on skipped or unprotected routes.
impl<S> OptionalFromRequestParts<S> for CognitoUser
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<VerifiedToken>()
            .map(CognitoUser::from_token))
    }
}
