use std::str::FromStr;
use std::sync::Arc;

use jsonwebtoken::{decode, Algorithm, Validation};
use serde::Serialize;
use tracing::{debug, warn};

use crate::claims::{unix_now, Claims, ClaimsValidator};
use crate::config::VerificationConfig;
use crate::error::GateError;
use crate::jwks::JwksCache;
use crate::keys::{KeyRecord, KeySet, RsaComponents};
use crate::token::{ParsedToken, TokenHeader};

/// Source of signing keys: the shared JWKS cache, or a fixed set for testing.
enum KeySource {
    Jwks(Arc<JwksCache>),
    Static(KeySet),
}

/// A token whose signature and claims have been checked.
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedToken {
    pub header: TokenHeader,
    pub claims: Claims,
    /// Algorithm the signature was verified with.
    #[serde(skip)]
    pub algorithm: Algorithm,
}

impl VerifiedToken {
    pub fn sub(&self) -> Option<&str> {
        self.claims.sub()
    }

    pub fn kid(&self) -> Option<&str> {
        self.header.kid.as_deref()
    }
}

/// Verifies compact tokens against the signing keys of one user pool.
///
/// Verification runs these steps and stops at the first failure:
/// 1. Parse the token without trusting it
/// 2. Reject algorithms outside the allowed RSA family, before any key lookup
/// 3. Select the key by `kid` (refreshing the cache on a miss)
/// 4. Verify the signature with the reconstructed RSA key
/// 5. Check issuer, `token_use` and expiry
pub struct TokenVerifier {
    key_source: KeySource,
    config: VerificationConfig,
    claims_validator: ClaimsValidator,
}

impl TokenVerifier {
    /// Create a verifier backed by a JWKS cache.
    pub fn new(config: VerificationConfig, jwks: Arc<JwksCache>) -> Self {
        Self::with_source(config, KeySource::Jwks(jwks))
    }

    /// Create a verifier with a fixed key set (useful for testing).
    pub fn new_with_static_keys(config: VerificationConfig, keys: KeySet) -> Self {
        Self::with_source(config, KeySource::Static(keys))
    }

    fn with_source(config: VerificationConfig, key_source: KeySource) -> Self {
        Self {
            key_source,
            claims_validator: ClaimsValidator::from_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    /// Verify `token` against the current time.
    pub async fn verify(&self, token: &str) -> Result<VerifiedToken, GateError> {
        self.verify_at(token, unix_now()).await
    }

    /// Verify `token` as if the current time were `now` (Unix seconds).
    pub async fn verify_at(&self, token: &str, now: i64) -> Result<VerifiedToken, GateError> {
        let parsed = ParsedToken::parse(token)?;
        debug!(alg = %parsed.header().alg, kid = ?parsed.header().kid, "Decoded JWT header");

        let algorithm = self.check_algorithm(&parsed.header().alg)?;

        let kid = parsed
            .header()
            .kid
            .clone()
            .ok_or_else(|| GateError::MalformedToken("JWT header missing 'kid' field".into()))?;

        let record = self.find_key(&kid).await?;
        let decoding_key = RsaComponents::from_record(&record)?.to_decoding_key()?;

        let mut validation = Validation::new(algorithm);
        validation.algorithms = vec![algorithm];
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<serde_json::Value>(parsed.as_str(), &decoding_key, &validation).map_err(|e| {
            warn!(kid = %kid, error = %e, "JWT signature verification failed");
            GateError::SignatureInvalid(e.to_string())
        })?;

        self.claims_validator.validate(parsed.claims(), now)?;

        debug!(kid = %kid, sub = parsed.claims().sub().unwrap_or("unknown"), "JWT verified");
        let header = parsed.header().clone();
        Ok(VerifiedToken {
            header,
            claims: parsed.into_claims(),
            algorithm,
        })
    }

    fn check_algorithm(&self, alg: &str) -> Result<Algorithm, GateError> {
        let unsupported = || GateError::UnsupportedAlgorithm(alg.to_string());
        let algorithm = Algorithm::from_str(alg).map_err(|_| unsupported())?;
        if self.config.effective_algorithms().contains(&algorithm) {
            Ok(algorithm)
        } else {
            Err(unsupported())
        }
    }

    async fn find_key(&self, kid: &str) -> Result<KeyRecord, GateError> {
        match &self.key_source {
            KeySource::Static(keys) => keys
                .get(kid)
                .cloned()
                .ok_or_else(|| GateError::UnknownKeyId(kid.to_string())),
            KeySource::Jwks(jwks) => jwks.get_key(&self.config.jwks_url(), kid).await,
        }
    }
}
