use std::sync::OnceLock;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::EncodingKey;
use rand::rngs::OsRng;
use rsa::pkcs8::EncodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::{json, Value};

/// `kid` of [`TestKeyPair::shared`].
pub const DEFAULT_KID: &str = "test-key-1";

/// `kid` of [`TestKeyPair::other`].
pub const OTHER_KID: &str = "test-key-2";

/// RSA key pair that signs test tokens and publishes itself as a JWK.
#[derive(Clone)]
pub struct TestKeyPair {
    encoding_key: EncodingKey,
    public_key: RsaPublicKey,
    /// Base64url-encoded RSA modulus (for JWKS).
    n: String,
    /// Base64url-encoded RSA public exponent (for JWKS).
    e: String,
    kid: String,
}

impl TestKeyPair {
    /// Generate a new RSA-2048 key pair.
    pub fn generate(kid: &str) -> Self {
        let private_key =
            RsaPrivateKey::new(&mut OsRng, 2048).expect("failed to generate RSA-2048 key");
        let public_key = RsaPublicKey::from(&private_key);

        let pkcs8_pem = private_key
            .to_pkcs8_pem(rsa::pkcs8::LineEnding::LF)
            .expect("failed to export RSA key as PKCS8 PEM");
        let encoding_key = EncodingKey::from_rsa_pem(pkcs8_pem.as_bytes())
            .expect("failed to create EncodingKey from RSA PEM");

        let n = URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
        let e = URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());

        Self {
            encoding_key,
            public_key,
            n,
            e,
            kid: kid.to_string(),
        }
    }

    /// Process-wide key pair with kid [`DEFAULT_KID`]. Key generation is slow,
    /// so tests share it.
    pub fn shared() -> &'static TestKeyPair {
        static KEY: OnceLock<TestKeyPair> = OnceLock::new();
        KEY.get_or_init(|| TestKeyPair::generate(DEFAULT_KID))
    }

    /// A second, unrelated process-wide key pair with kid [`OTHER_KID`].
    pub fn other() -> &'static TestKeyPair {
        static KEY: OnceLock<TestKeyPair> = OnceLock::new();
        KEY.get_or_init(|| TestKeyPair::generate(OTHER_KID))
    }

    /// The same key published under another `kid`.
    pub fn with_kid(&self, kid: &str) -> TestKeyPair {
        TestKeyPair {
            kid: kid.to_string(),
            ..self.clone()
        }
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Base64url modulus as published in the JWK.
    pub fn n(&self) -> &str {
        &self.n
    }

    /// Base64url exponent as published in the JWK.
    pub fn e(&self) -> &str {
        &self.e
    }

    /// This key as one JWKS entry, the way Cognito publishes it.
    pub fn jwk(&self) -> Value {
        json!({
            "alg": "RS256",
            "e": self.e,
            "kid": self.kid,
            "kty": "RSA",
            "n": self.n,
            "use": "sig",
        })
    }

    /// A JWKS document containing only this key.
    pub fn jwks_json(&self) -> Value {
        jwks_json(&[self])
    }
}

/// A JWKS document containing `keys`, in order.
pub fn jwks_json(keys: &[&TestKeyPair]) -> Value {
    json!({ "keys": keys.iter().map(|k| k.jwk()).collect::<Vec<_>>() })
}
