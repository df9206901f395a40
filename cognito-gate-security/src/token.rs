//! Compact JWT parsing. Nothing here is trusted yet: the signature is only
//! decoded, not verified.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::claims::Claims;
use crate::error::GateError;

/// Decoded JOSE header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    /// Declared signing algorithm, kept as a string so that unknown values
    /// (`none`, `HS256`, ...) can be reported instead of failing the parse.
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

/// A token split into its three segments.
#[derive(Debug, Clone)]
pub struct ParsedToken {
    raw: String,
    header: TokenHeader,
    claims: Claims,
    signature: Vec<u8>,
}

impl ParsedToken {
    /// Parse a compact `header.claims.signature` token.
    pub fn parse(token: &str) -> Result<Self, GateError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [header_b64, claims_b64, signature_b64] = segments.as_slice() else {
            return Err(GateError::MalformedToken(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        };

        let header_json = decode_object(header_b64, "header")?;
        let header: TokenHeader = serde_json::from_value(Value::Object(header_json))
            .map_err(|e| GateError::MalformedToken(format!("invalid header: {e}")))?;

        let claims = Claims::new(decode_object(claims_b64, "claims")?);

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|e| GateError::MalformedToken(format!("invalid signature encoding: {e}")))?;

        Ok(Self {
            raw: token.to_string(),
            header,
            claims,
            signature,
        })
    }

    pub fn header(&self) -> &TokenHeader {
        &self.header
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The original compact token.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub(crate) fn into_claims(self) -> Claims {
        self.claims
    }
}

fn decode_object(segment: &str, what: &str) -> Result<Map<String, Value>, GateError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| GateError::MalformedToken(format!("invalid {what} encoding: {e}")))?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(GateError::MalformedToken(format!("{what} is not a JSON object"))),
        Err(e) => Err(GateError::MalformedToken(format!("invalid {what} JSON: {e}"))),
    }
}
