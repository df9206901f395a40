use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{VerificationConfig, PROVIDER_HOST_MARKER};
use crate::error::GateError;

/// Accepted values of the `token_use` claim.
pub const VALID_TOKEN_USES: &[&str] = &["id", "access"];

/// Token claims as a JSON object, with accessors for the fields the gate and
/// handlers care about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Get a claim by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    fn str_claim(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn iss(&self) -> Option<&str> {
        self.str_claim("iss")
    }

    pub fn sub(&self) -> Option<&str> {
        self.str_claim("sub")
    }

    pub fn token_use(&self) -> Option<&str> {
        self.str_claim("token_use")
    }

    /// `exp` as whole seconds. Fractional timestamps are truncated.
    pub fn exp(&self) -> Option<i64> {
        let exp = self.get("exp")?;
        exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))
    }

    /// Username: `username` in access tokens, `cognito:username` in id tokens.
    pub fn username(&self) -> Option<&str> {
        self.str_claim("username")
            .or_else(|| self.str_claim("cognito:username"))
    }

    /// App client: `client_id` in access tokens, `aud` in id tokens.
    pub fn client_id(&self) -> Option<&str> {
        self.str_claim("client_id").or_else(|| self.str_claim("aud"))
    }

    pub fn email(&self) -> Option<&str> {
        self.str_claim("email")
    }

    /// `cognito:groups`, empty when absent.
    pub fn groups(&self) -> Vec<String> {
        self.get("cognito:groups")
            .and_then(Value::as_array)
            .map(|groups| {
                groups
                    .iter()
                    .filter_map(|g| g.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Current Unix time in seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Checks issuer, token purpose and expiry of a signature-verified token.
#[derive(Debug, Clone)]
pub struct ClaimsValidator {
    issuer: String,
}

impl ClaimsValidator {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
        }
    }

    pub fn from_config(config: &VerificationConfig) -> Self {
        Self::new(config.issuer())
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Validate `claims` at time `now` (Unix seconds).
    ///
    /// Issuers without the Cognito host marker only need to be present; the
    /// Cognito checks run in order and stop at the first failure.
    pub fn validate(&self, claims: &Claims, now: i64) -> Result<(), GateError> {
        let iss = claims
            .iss()
            .ok_or_else(|| GateError::IssuerMismatch("token does not contain issuer".into()))?;

        if !iss.contains(PROVIDER_HOST_MARKER) {
            return Ok(());
        }

        if iss != self.issuer {
            return Err(GateError::IssuerMismatch(format!(
                "iss does not match any of valid values: [{}]",
                self.issuer
            )));
        }

        match claims.token_use() {
            Some(token_use) if VALID_TOKEN_USES.contains(&token_use) => {}
            _ => return Err(GateError::InvalidTokenUse),
        }

        validate_expiry(claims, now)
    }
}

fn validate_expiry(claims: &Claims, now: i64) -> Result<(), GateError> {
    if claims.get("exp").is_none() {
        return Err(GateError::TokenExpired);
    }
    let exp = claims
        .exp()
        .ok_or_else(|| GateError::MalformedToken("cannot parse token exp".into()))?;
    if exp > now {
        Ok(())
    } else {
        Err(GateError::TokenExpired)
    }
}
