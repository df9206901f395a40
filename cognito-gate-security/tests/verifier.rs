use cognito_gate_security::{
    Algorithm, GateError, KeySet, TokenVerifier, VerificationConfig,
};
use cognito_gate_test::{
    jwks_json, tamper_claims, TestKeyPair, TokenBuilder, DEFAULT_KID, TEST_POOL_ID, TEST_REGION,
};
use serde_json::json;

fn config() -> VerificationConfig {
    VerificationConfig::new(TEST_REGION, TEST_POOL_ID)
}

fn keys(pairs: &[&TestKeyPair]) -> KeySet {
    KeySet::from_json(jwks_json(pairs).to_string().as_bytes()).unwrap()
}

fn verifier() -> TokenVerifier {
    verifier_with(config())
}

fn verifier_with(config: VerificationConfig) -> TokenVerifier {
    TokenVerifier::new_with_static_keys(config, keys(&[TestKeyPair::shared()]))
}

#[tokio::test]
async fn test_valid_access_token() {
    let token = TokenBuilder::test_pool().sign(TestKeyPair::shared());
    let verified = verifier().verify(&token).await.unwrap();
    assert_eq!(verified.kid(), Some(DEFAULT_KID));
    assert_eq!(verified.algorithm, Algorithm::RS256);
    assert_eq!(verified.claims.token_use(), Some("access"));
    assert_eq!(verified.claims.username(), Some("test-user"));
}

#[tokio::test]
async fn test_valid_id_token() {
    let token = TokenBuilder::test_pool()
        .token_use("id")
        .claim("email", "alice@example.com")
        .sign(TestKeyPair::shared());
    let verified = verifier().verify(&token).await.unwrap();
    assert_eq!(verified.claims.email(), Some("alice@example.com"));
}

#[tokio::test]
async fn test_expired_one_second_ago() {
    let token = TokenBuilder::test_pool()
        .expires_in(-1)
        .sign(TestKeyPair::shared());
    assert_eq!(verifier().verify(&token).await.unwrap_err(), GateError::TokenExpired);
}

#[tokio::test]
async fn test_verify_at_fixed_clock() {
    let token = TokenBuilder::test_pool()
        .expires_at(1_000)
        .sign(TestKeyPair::shared());
    assert!(verifier().verify_at(&token, 999).await.is_ok());
    assert_eq!(
        verifier().verify_at(&token, 1_000).await.unwrap_err(),
        GateError::TokenExpired
    );
}

#[tokio::test]
async fn test_missing_exp_is_expired() {
    let token = TokenBuilder::test_pool()
        .without("exp")
        .sign(TestKeyPair::shared());
    assert_eq!(verifier().verify(&token).await.unwrap_err(), GateError::TokenExpired);
}

#[tokio::test]
async fn test_string_exp_is_malformed() {
    let token = TokenBuilder::test_pool()
        .claim("exp", "never")
        .sign(TestKeyPair::shared());
    assert_eq!(
        verifier().verify(&token).await.unwrap_err(),
        GateError::MalformedToken("cannot parse token exp".into())
    );
}

#[tokio::test]
async fn test_refresh_token_use_rejected() {
    let token = TokenBuilder::test_pool()
        .token_use("refresh")
        .sign(TestKeyPair::shared());
    assert_eq!(
        verifier().verify(&token).await.unwrap_err(),
        GateError::InvalidTokenUse
    );
}

#[tokio::test]
async fn test_other_pool_issuer_rejected() {
    let token = TokenBuilder::cognito(TEST_REGION, "us-east-1_OtherPool").sign(TestKeyPair::shared());
    let err = verifier().verify(&token).await.unwrap_err();
    assert!(matches!(err, GateError::IssuerMismatch(_)), "got {err:?}");
}

#[tokio::test]
async fn test_missing_issuer_rejected() {
    let token = TokenBuilder::test_pool()
        .without("iss")
        .sign(TestKeyPair::shared());
    assert_eq!(
        verifier().verify(&token).await.unwrap_err(),
        GateError::IssuerMismatch("token does not contain issuer".into())
    );
}

#[tokio::test]
async fn test_non_cognito_issuer_only_needs_signature() {
    let token = TokenBuilder::new()
        .issuer("https://login.example.com")
        .claim("sub", "svc")
        .sign(TestKeyPair::shared());
    assert!(verifier().verify(&token).await.is_ok());
}

#[tokio::test]
async fn test_hs256_forgery_rejected_before_key_lookup() {
    let token = TokenBuilder::test_pool()
        .kid("no-such-kid")
        .sign_with_secret(b"secret");
    assert_eq!(
        verifier().verify(&token).await.unwrap_err(),
        GateError::UnsupportedAlgorithm("HS256".into())
    );
}

#[tokio::test]
async fn test_unknown_algorithm_names_rejected() {
    for alg in ["none", "ES256", "PS256", "rs256"] {
        let token = TokenBuilder::test_pool().unsigned(alg);
        assert_eq!(
            verifier().verify(&token).await.unwrap_err(),
            GateError::UnsupportedAlgorithm(alg.into()),
            "alg {alg}"
        );
    }
}

#[tokio::test]
async fn test_rs384_needs_opt_in() {
    let token = TokenBuilder::test_pool()
        .algorithm(Algorithm::RS384)
        .sign(TestKeyPair::shared());
    assert_eq!(
        verifier().verify(&token).await.unwrap_err(),
        GateError::UnsupportedAlgorithm("RS384".into())
    );

    let verifier =
        verifier_with(config().with_allowed_algorithms([Algorithm::RS256, Algorithm::RS384]));
    let verified = verifier.verify(&token).await.unwrap();
    assert_eq!(verified.algorithm, Algorithm::RS384);
}

#[tokio::test]
async fn test_non_rsa_algorithms_never_allowed() {
    let verifier = verifier_with(config().with_allowed_algorithms([Algorithm::HS256]));
    let token = TokenBuilder::test_pool().sign_with_secret(b"secret");
    assert_eq!(
        verifier.verify(&token).await.unwrap_err(),
        GateError::UnsupportedAlgorithm("HS256".into())
    );
}

#[tokio::test]
async fn test_unknown_kid() {
    let token = TokenBuilder::test_pool()
        .kid("rotated-away")
        .sign(TestKeyPair::shared());
    assert_eq!(
        verifier().verify(&token).await.unwrap_err(),
        GateError::UnknownKeyId("rotated-away".into())
    );
}

#[tokio::test]
async fn test_missing_kid_is_malformed() {
    let token = TokenBuilder::test_pool()
        .without_kid()
        .sign(TestKeyPair::shared());
    assert!(matches!(
        verifier().verify(&token).await.unwrap_err(),
        GateError::MalformedToken(_)
    ));
}

#[tokio::test]
async fn test_signature_from_other_key_rejected() {
    // Signed by another key but claiming the published kid.
    let token = TokenBuilder::test_pool().sign(TestKeyPair::other());
    let err = verifier().verify(&token).await.unwrap_err();
    assert!(matches!(err, GateError::SignatureInvalid(_)), "got {err:?}");
}

#[tokio::test]
async fn test_tampered_claims_rejected() {
    let token = TokenBuilder::test_pool().sign(TestKeyPair::shared());
    let forged = TokenBuilder::test_pool().subject("admin").claims();
    let err = verifier()
        .verify(&tamper_claims(&token, &forged))
        .await
        .unwrap_err();
    assert!(matches!(err, GateError::SignatureInvalid(_)), "got {err:?}");
}

#[tokio::test]
async fn test_signature_checked_before_claims() {
    // An expired token with a bad signature reports the signature.
    let token = TokenBuilder::test_pool()
        .expires_in(-60)
        .sign(TestKeyPair::other());
    assert!(matches!(
        verifier().verify(&token).await.unwrap_err(),
        GateError::SignatureInvalid(_)
    ));
}

#[tokio::test]
async fn test_selects_key_by_kid() {
    let set = keys(&[TestKeyPair::shared(), TestKeyPair::other()]);
    let verifier = TokenVerifier::new_with_static_keys(config(), set);

    let first = TokenBuilder::test_pool().sign_as(TestKeyPair::shared());
    let second = TokenBuilder::test_pool().sign_as(TestKeyPair::other());
    assert!(verifier.verify(&first).await.is_ok());
    assert!(verifier.verify(&second).await.is_ok());
}

#[tokio::test]
async fn test_malformed_tokens() {
    for raw in ["", "abc", "a.b", "a.b.c.d", "!!.??.**"] {
        assert!(
            matches!(
                verifier().verify(raw).await,
                Err(GateError::MalformedToken(_))
            ),
            "{raw:?}"
        );
    }
}

#[tokio::test]
async fn test_extra_claims_are_kept() {
    let token = TokenBuilder::test_pool()
        .claim("cognito:groups", json!(["admin", "ops"]))
        .sign(TestKeyPair::shared());
    let verified = verifier().verify(&token).await.unwrap();
    assert_eq!(verified.claims.groups(), vec!["admin", "ops"]);
}
