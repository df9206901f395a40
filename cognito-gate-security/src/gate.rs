//! The verification gate: axum middleware that admits a request only when it
//! carries a valid token for the configured user pool.
//!
//! ```ignore
//! let config = VerificationConfig::new("us-east-1", "us-east-1_AbCdEfGhI")
//!     .with_skipper(PathSkipper::new(["/admin/ping"]));
//! let gate = CognitoGate::new(config)?;
//!
//! let admin = gate.protect(Router::new().route("/admin/", get(hello)));
//! ```

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tracing::{debug, warn};

use crate::config::VerificationConfig;
use crate::error::GateError;
use crate::extractor::extract_token;
use crate::jwks::JwksCache;
use crate::jwt::{TokenVerifier, VerifiedToken};
use crate::keys::KeySet;
use crate::skip::RequestContext;

struct GateInner {
    verifier: TokenVerifier,
    www_authenticate: HeaderValue,
}

/// Shared handle to the gate. Cloning is cheap.
#[derive(Clone)]
pub struct CognitoGate {
    inner: Arc<GateInner>,
}

impl CognitoGate {
    /// Build a gate with its own JWKS cache.
    pub fn new(config: VerificationConfig) -> Result<Self, GateError> {
        let cache = Arc::new(JwksCache::from_config(&config)?);
        Ok(Self::with_cache(config, cache))
    }

    /// Build a gate on top of an existing cache, e.g. one shared between pools.
    pub fn with_cache(config: VerificationConfig, cache: Arc<JwksCache>) -> Self {
        Self::from_verifier(TokenVerifier::new(config, cache))
    }

    /// Build a gate that verifies against a fixed key set and never fetches.
    pub fn with_static_keys(config: VerificationConfig, keys: KeySet) -> Self {
        Self::from_verifier(TokenVerifier::new_with_static_keys(config, keys))
    }

    fn from_verifier(verifier: TokenVerifier) -> Self {
        let www_authenticate = challenge(&verifier.config().realm);
        Self {
            inner: Arc::new(GateInner {
                verifier,
                www_authenticate,
            }),
        }
    }

    pub fn config(&self) -> &VerificationConfig {
        self.inner.verifier.config()
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.inner.verifier
    }

    /// Extract and verify the token carried by `headers`.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<VerifiedToken, GateError> {
        let token = extract_token(headers, &self.config().token_header)?;
        self.inner.verifier.verify(token).await
    }

    /// Run the full per-request decision: verification plus the optional
    /// credential validator.
    pub async fn check(
        &self,
        headers: &HeaderMap,
        ctx: &RequestContext,
    ) -> Result<VerifiedToken, GateError> {
        let verified = self.authenticate(headers).await?;
        if let Some(validator) = &self.config().credential_validator {
            validator
                .validate(&verified, ctx)
                .map_err(GateError::CredentialsRejected)?;
        }
        Ok(verified)
    }

    /// The `401` response sent for `err`.
    pub fn deny(&self, err: &GateError) -> Response {
        let mut response = err.clone().into_response();
        response
            .headers_mut()
            .insert(WWW_AUTHENTICATE, self.inner.www_authenticate.clone());
        response
    }

    /// Put every route of `router` behind the gate.
    ///
    /// The fallback is left ungated, so unknown paths stay 404 once the
    /// router is merged or nested into a public one.
    pub fn protect<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(middleware::from_fn_with_state(self.clone(), cognito_gate))
    }
}

fn challenge(realm: &str) -> HeaderValue {
    let escaped = realm.replace('\\', "\\\\").replace('"', "\\\"");
    HeaderValue::from_str(&format!("Bearer realm=\"{escaped}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("Bearer realm=\"Restricted\""))
}

/// Middleware function behind [`CognitoGate::protect`]; usable directly with
/// `axum::middleware::from_fn_with_state`.
pub async fn cognito_gate(
    State(gate): State<CognitoGate>,
    mut req: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext::from_request(&req);

    if gate.config().skipper.skip(&ctx) {
        debug!(method = %ctx.method, path = %ctx.path, "Skipping token verification");
        return next.run(req).await;
    }

    match gate.check(req.headers(), &ctx).await {
        Ok(verified) => {
            debug!(path = %ctx.path, sub = verified.sub().unwrap_or("unknown"), "Request authenticated");
            req.extensions_mut().insert(verified);
            next.run(req).await
        }
        Err(err) => {
            warn!(method = %ctx.method, path = %ctx.path, error = %err, "Request denied");
            gate.deny(&err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::challenge;

    #[test]
    fn challenge_quotes_realm() {
        assert_eq!(challenge("Restricted"), "Bearer realm=\"Restricted\"");
        assert_eq!(challenge("a\"b"), "Bearer realm=\"a\\\"b\"");
    }

    #[test]
    fn unencodable_realm_falls_back() {
        assert_eq!(challenge("line\nbreak"), "Bearer realm=\"Restricted\"");
    }
}
