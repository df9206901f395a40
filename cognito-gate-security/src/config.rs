use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::Algorithm;

use crate::skip::{CredentialValidator, NeverSkip, Skipper};

/// Host marker identifying issuers that get the Cognito-specific claim checks.
pub const PROVIDER_HOST_MARKER: &str = "cognito-idp";

/// Realm used in `WWW-Authenticate` when none is configured.
pub const DEFAULT_REALM: &str = "Restricted";

/// Request header carrying the token when none is configured.
pub const DEFAULT_TOKEN_HEADER: &str = "access_token";

/// Algorithms the gate can ever accept. Only the RSA PKCS#1 v1.5 family.
pub const RSA_ALGORITHMS: &[Algorithm] = &[Algorithm::RS256, Algorithm::RS384, Algorithm::RS512];

/// Verification configuration for one Cognito user pool.
///
/// Constructed once at startup and shared read-only by every request.
#[derive(Clone)]
pub struct VerificationConfig {
    /// AWS region of the user pool (e.g. `us-east-1`).
    pub region: String,

    /// User pool identifier (e.g. `us-east-1_AbCdEfGhI`).
    pub user_pool_id: String,

    /// Realm label reported in the `WWW-Authenticate` header of denials.
    pub realm: String,

    /// Name of the request header carrying the token (default: `access_token`).
    ///
    /// When set to `authorization`, the `Bearer` scheme is stripped.
    pub token_header: String,

    /// Allowed JWT algorithms. Anything outside the RSA family is rejected
    /// regardless of this list. Default: RS256 only.
    pub allowed_algorithms: Vec<Algorithm>,

    /// Overrides the JWKS URL derived from region and pool.
    pub jwks_url: Option<String>,

    /// JWKS cache TTL in seconds (default: 3600).
    pub jwks_cache_ttl_secs: u64,

    /// Minimum interval between JWKS refresh attempts in seconds (default: 10).
    pub jwks_min_refresh_interval_secs: u64,

    /// How long past its TTL a cached key set may still be served when a
    /// refresh fails, in seconds (default: 300).
    pub jwks_stale_grace_secs: u64,

    /// Timeout of the JWKS request in seconds (default: 10).
    pub fetch_timeout_secs: u64,

    /// Decides per request whether verification is bypassed.
    pub skipper: Arc<dyn Skipper>,

    /// Optional extra check run after a token is fully verified.
    pub credential_validator: Option<Arc<dyn CredentialValidator>>,
}

impl VerificationConfig {
    /// Create a configuration for the given region and user pool with defaults
    /// for everything else.
    pub fn new(region: impl Into<String>, user_pool_id: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            user_pool_id: user_pool_id.into(),
            realm: DEFAULT_REALM.to_string(),
            token_header: DEFAULT_TOKEN_HEADER.to_string(),
            allowed_algorithms: vec![Algorithm::RS256],
            jwks_url: None,
            jwks_cache_ttl_secs: 3600,
            jwks_min_refresh_interval_secs: 10,
            jwks_stale_grace_secs: 300,
            fetch_timeout_secs: 10,
            skipper: Arc::new(NeverSkip),
            credential_validator: None,
        }
    }

    /// The issuer every token of this pool must carry:
    /// `https://cognito-idp.<region>.amazonaws.com/<poolId>`.
    pub fn issuer(&self) -> String {
        format!(
            "https://{PROVIDER_HOST_MARKER}.{}.amazonaws.com/{}",
            self.region, self.user_pool_id
        )
    }

    /// The JWKS discovery URL, or the configured override.
    pub fn jwks_url(&self) -> String {
        match &self.jwks_url {
            Some(url) => url.clone(),
            None => format!("{}/.well-known/jwks.json", self.issuer()),
        }
    }

    /// Algorithms that are both configured and in the RSA family.
    pub fn effective_algorithms(&self) -> Vec<Algorithm> {
        self.allowed_algorithms
            .iter()
            .copied()
            .filter(|alg| RSA_ALGORITHMS.contains(alg))
            .collect()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Set the realm label. An empty realm falls back to `"Restricted"`.
    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        let realm = realm.into();
        self.realm = if realm.is_empty() {
            DEFAULT_REALM.to_string()
        } else {
            realm
        };
        self
    }

    /// Read the token from another header. Header names are case-insensitive.
    pub fn with_token_header(mut self, header: impl Into<String>) -> Self {
        self.token_header = header.into().to_ascii_lowercase();
        self
    }

    /// Set the allowed JWT algorithms. Empty lists will cause validation to fail.
    pub fn with_allowed_algorithms(
        mut self,
        algorithms: impl IntoIterator<Item = Algorithm>,
    ) -> Self {
        self.allowed_algorithms = algorithms.into_iter().collect();
        self
    }

    /// Fetch keys from `url` instead of the Cognito discovery URL.
    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = Some(url.into());
        self
    }

    /// Set the JWKS cache TTL in seconds.
    pub fn with_cache_ttl(mut self, ttl_secs: u64) -> Self {
        self.jwks_cache_ttl_secs = ttl_secs;
        self
    }

    /// Set the minimum interval between JWKS refresh attempts.
    pub fn with_min_refresh_interval(mut self, interval_secs: u64) -> Self {
        self.jwks_min_refresh_interval_secs = interval_secs;
        self
    }

    /// Set how long an expired key set may be served after a failed refresh.
    pub fn with_stale_grace(mut self, grace_secs: u64) -> Self {
        self.jwks_stale_grace_secs = grace_secs;
        self
    }

    /// Set the JWKS request timeout.
    pub fn with_fetch_timeout(mut self, timeout_secs: u64) -> Self {
        self.fetch_timeout_secs = timeout_secs;
        self
    }

    /// Set the skip predicate.
    pub fn with_skipper(mut self, skipper: impl Skipper + 'static) -> Self {
        self.skipper = Arc::new(skipper);
        self
    }

    /// Install a credential validator hook.
    pub fn with_credential_validator(
        mut self,
        validator: impl CredentialValidator + 'static,
    ) -> Self {
        self.credential_validator = Some(Arc::new(validator));
        self
    }
}

impl std::fmt::Debug for VerificationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationConfig")
            .field("region", &self.region)
            .field("user_pool_id", &self.user_pool_id)
            .field("realm", &self.realm)
            .field("token_header", &self.token_header)
            .field("allowed_algorithms", &self.allowed_algorithms)
            .field("jwks_url", &self.jwks_url())
            .field("jwks_cache_ttl_secs", &self.jwks_cache_ttl_secs)
            .field("jwks_min_refresh_interval_secs", &self.jwks_min_refresh_interval_secs)
            .field("jwks_stale_grace_secs", &self.jwks_stale_grace_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("credential_validator", &self.credential_validator.is_some())
            .finish_non_exhaustive()
    }
}
