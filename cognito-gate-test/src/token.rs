use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};

use crate::keys::{TestKeyPair, DEFAULT_KID};

/// Region used by test pools.
pub const TEST_REGION: &str = "us-east-1";

/// User pool used by test pools.
pub const TEST_POOL_ID: &str = "us-east-1_TestPool";

/// Issuer of a Cognito user pool.
pub fn cognito_issuer(region: &str, pool_id: &str) -> String {
    format!("https://cognito-idp.{region}.amazonaws.com/{pool_id}")
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// Fluent builder for Cognito-shaped test tokens.
///
/// ```ignore
/// let token = TokenBuilder::cognito(TEST_REGION, TEST_POOL_ID)
///     .token_use("id")
///     .claim("cognito:groups", json!(["admin"]))
///     .sign(TestKeyPair::shared());
/// ```
#[derive(Debug, Clone)]
pub struct TokenBuilder {
    algorithm: Algorithm,
    kid: Option<String>,
    claims: Map<String, Value>,
}

impl Default for TokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenBuilder {
    /// An RS256 token with kid [`DEFAULT_KID`] and no claims.
    pub fn new() -> Self {
        Self {
            algorithm: Algorithm::RS256,
            kid: Some(DEFAULT_KID.to_string()),
            claims: Map::new(),
        }
    }

    /// A valid access token of the given pool expiring in one hour.
    pub fn cognito(region: &str, pool_id: &str) -> Self {
        let now = now();
        Self::new()
            .claim("iss", cognito_issuer(region, pool_id))
            .claim("sub", "7d8f6a2e-0000-4c1b-9a7e-3f2b1c0d9e8f")
            .claim("token_use", "access")
            .claim("client_id", "test-client")
            .claim("username", "test-user")
            .claim("scope", "aws.cognito.signin.user.admin")
            .claim("auth_time", now)
            .claim("iat", now)
            .claim("exp", now + 3600)
    }

    /// A valid access token of [`TEST_REGION`]/[`TEST_POOL_ID`].
    pub fn test_pool() -> Self {
        Self::cognito(TEST_REGION, TEST_POOL_ID)
    }

    /// Set any claim.
    pub fn claim(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.claims.insert(key.to_string(), value.into());
        self
    }

    /// Remove a claim.
    pub fn without(mut self, key: &str) -> Self {
        self.claims.remove(key);
        self
    }

    pub fn issuer(self, iss: &str) -> Self {
        self.claim("iss", iss)
    }

    pub fn subject(self, sub: &str) -> Self {
        self.claim("sub", sub)
    }

    pub fn token_use(self, token_use: &str) -> Self {
        self.claim("token_use", token_use)
    }

    /// Set `exp` relative to now; negative values produce expired tokens.
    pub fn expires_in(self, secs: i64) -> Self {
        self.claim("exp", now() + secs)
    }

    /// Set an absolute `exp`.
    pub fn expires_at(self, exp: i64) -> Self {
        self.claim("exp", exp)
    }

    pub fn kid(mut self, kid: &str) -> Self {
        self.kid = Some(kid.to_string());
        self
    }

    pub fn without_kid(mut self) -> Self {
        self.kid = None;
        self
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// The claims as a JSON object.
    pub fn claims(&self) -> Value {
        Value::Object(self.claims.clone())
    }

    fn header(&self) -> Header {
        let mut header = Header::new(self.algorithm);
        header.kid = self.kid.clone();
        header
    }

    /// Sign with `keys`. The header kid is left as configured, so a token can
    /// name a kid other than the one of the signing key.
    pub fn sign(&self, keys: &TestKeyPair) -> String {
        encode(&self.header(), &self.claims(), keys.encoding_key()).expect("failed to sign token")
    }

    /// Sign with kid and key of `keys`.
    pub fn sign_as(&self, keys: &TestKeyPair) -> String {
        self.clone().kid(keys.kid()).sign(keys)
    }

    /// Sign as HS256 with a shared secret.
    pub fn sign_with_secret(&self, secret: &[u8]) -> String {
        let mut header = self.header();
        header.alg = Algorithm::HS256;
        encode(&header, &self.claims(), &EncodingKey::from_secret(secret))
            .expect("failed to sign token")
    }

    /// A token declaring `alg` with a garbage signature.
    pub fn unsigned(&self, alg: &str) -> String {
        let mut header = json!({ "alg": alg, "typ": "JWT" });
        if let Some(kid) = &self.kid {
            header["kid"] = json!(kid);
        }
        format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(self.claims().to_string()),
            URL_SAFE_NO_PAD.encode(b"not-a-signature"),
        )
    }
}

/// Swap the claims segment of a signed token, keeping its signature.
pub fn tamper_claims(token: &str, claims: &Value) -> String {
    let parts: Vec<&str> = token.split('.').collect();
    assert_eq!(parts.len(), 3, "not a compact JWT");
    format!(
        "{}.{}.{}",
        parts[0],
        URL_SAFE_NO_PAD.encode(claims.to_string()),
        parts[2]
    )
}
