//! Signing-key records and RSA public key reconstruction.
//!
//! A JWKS publishes each RSA key as two base64url strings: the public
//! exponent `e` and the modulus `n`, both unsigned big-endian integers with
//! leading zero bytes stripped. [`RsaComponents`] turns them back into
//! integers and then into a key usable for signature verification.

use std::collections::HashMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::DecodingKey;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPublicKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GateError;

/// One signing key descriptor from a JWKS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    /// Key ID.
    pub kid: String,
    /// Key type (e.g. "RSA").
    pub kty: String,
    /// Algorithm (e.g. "RS256").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Public key use (e.g. "sig").
    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// RSA public exponent (base64url).
    pub e: String,
    /// RSA modulus (base64url).
    pub n: String,
}

/// Raw JWK as returned by the endpoint. Fields a Cognito RSA key always
/// carries may be missing for other key types, so everything is optional here.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawJwk {
    kid: Option<String>,
    kty: String,
    #[serde(default)]
    alg: Option<String>,
    #[serde(default, rename = "use")]
    key_use: Option<String>,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

/// JWKS response envelope.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JwksDocument {
    #[serde(default)]
    pub(crate) keys: Vec<RawJwk>,
}

/// Keys from one fetch, indexed by `kid`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet {
    keys: HashMap<String, KeyRecord>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JWKS JSON body.
    pub fn from_json(json: &[u8]) -> Result<Self, GateError> {
        let document: JwksDocument = serde_json::from_slice(json)
            .map_err(|e| GateError::KeyFetchFailure(format!("Failed to parse JWKS: {e}")))?;
        Ok(Self::from_document(document))
    }

    pub(crate) fn from_document(document: JwksDocument) -> Self {
        let mut set = KeySet::new();
        for jwk in document.keys {
            let (Some(kid), Some(n), Some(e)) = (jwk.kid, jwk.n, jwk.e) else {
                debug!(kty = %jwk.kty, "Skipping JWK without kid or RSA components");
                continue;
            };
            set.insert(KeyRecord {
                kid,
                kty: jwk.kty,
                alg: jwk.alg,
                key_use: jwk.key_use,
                e,
                n,
            });
        }
        set
    }

    /// Add a record. The first record for a `kid` wins; returns `false` when
    /// the `kid` was already present.
    pub fn insert(&mut self, record: KeyRecord) -> bool {
        if self.keys.contains_key(&record.kid) {
            warn!(kid = %record.kid, "Duplicate kid in JWKS, keeping the first key");
            return false;
        }
        self.keys.insert(record.kid.clone(), record);
        true
    }

    pub fn get(&self, kid: &str) -> Option<&KeyRecord> {
        self.keys.get(kid)
    }

    pub fn contains(&self, kid: &str) -> bool {
        self.keys.contains_key(kid)
    }

    pub fn kids(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<KeyRecord> for KeySet {
    fn from_iter<I: IntoIterator<Item = KeyRecord>>(iter: I) -> Self {
        let mut set = KeySet::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

/// Decode a base64url exponent into a `u32`.
///
/// Short encodings are left-padded with zero bytes to 4 bytes, so `AQAB`
/// (`[0x01, 0x00, 0x01]`) is 65537. Encodings longer than 4 bytes are rejected.
pub fn decode_exponent(raw: &str) -> Result<u32, GateError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(raw)
        .map_err(|e| GateError::KeyFetchFailure(format!("invalid RSA exponent encoding: {e}")))?;
    if bytes.len() > 4 {
        return Err(GateError::KeyFetchFailure(format!(
            "RSA exponent is {} bytes, at most 4 are supported",
            bytes.len()
        )));
    }
    let mut padded = [0u8; 4];
    padded[4 - bytes.len()..].copy_from_slice(&bytes);
    Ok(u32::from_be_bytes(padded))
}

/// Decode a base64url modulus into an arbitrary-length unsigned integer.
pub fn decode_modulus(raw: &str) -> Result<BigUint, GateError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(raw)
        .map_err(|e| GateError::KeyFetchFailure(format!("invalid RSA modulus encoding: {e}")))?;
    Ok(BigUint::from_bytes_be(&bytes))
}

/// RSA public key reconstructed from a [`KeyRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaComponents {
    pub modulus: BigUint,
    pub exponent: u32,
}

impl RsaComponents {
    /// Decode the base64url exponent and modulus.
    pub fn from_encoded(e: &str, n: &str) -> Result<Self, GateError> {
        Ok(Self {
            exponent: decode_exponent(e)?,
            modulus: decode_modulus(n)?,
        })
    }

    /// Reconstruct the key of an RSA record. Other key types are rejected.
    pub fn from_record(record: &KeyRecord) -> Result<Self, GateError> {
        if record.kty != "RSA" {
            return Err(GateError::KeyFetchFailure(format!(
                "Unsupported key type for kid {}: {}",
                record.kid, record.kty
            )));
        }
        Self::from_encoded(&record.e, &record.n).map_err(|err| match err {
            GateError::KeyFetchFailure(msg) => {
                GateError::KeyFetchFailure(format!("kid {}: {msg}", record.kid))
            }
            other => other,
        })
    }

    /// Build a validated `rsa` public key.
    pub fn to_public_key(&self) -> Result<RsaPublicKey, GateError> {
        RsaPublicKey::new(self.modulus.clone(), BigUint::from(self.exponent))
            .map_err(|e| GateError::KeyFetchFailure(format!("invalid RSA public key: {e}")))
    }

    /// Build the key used for signature verification.
    pub fn to_decoding_key(&self) -> Result<DecodingKey, GateError> {
        let public_key = self.to_public_key()?;
        Ok(DecodingKey::from_rsa_raw_components(
            &public_key.n().to_bytes_be(),
            &public_key.e().to_bytes_be(),
        ))
    }
}
