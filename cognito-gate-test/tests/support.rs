use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use cognito_gate_test::{
    cognito_issuer, jwks_json, resolve_path, tamper_claims, MockJwks, TestKeyPair, TokenBuilder,
    DEFAULT_KID, TEST_POOL_ID, TEST_REGION,
};
use serde_json::{json, Value};

fn decode_segment(segment: &str) -> Value {
    serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segment).unwrap()).unwrap()
}

#[test]
fn test_resolve_nested_paths() {
    let v = json!({ "data": { "groups": ["a", "b"], "sub": "x" } });
    assert_eq!(resolve_path(&v, "data.sub"), json!("x"));
    assert_eq!(resolve_path(&v, "data.groups[1]"), json!("b"));
    assert_eq!(resolve_path(&v, "data.groups[2]"), Value::Null);
    assert_eq!(resolve_path(&v, "data.missing"), Value::Null);
}

#[test]
fn test_cognito_token_shape() {
    let token = TokenBuilder::test_pool().sign(TestKeyPair::shared());
    let parts: Vec<&str> = token.split('.').collect();
    assert_eq!(parts.len(), 3);

    let header = decode_segment(parts[0]);
    assert_eq!(header["alg"], "RS256");
    assert_eq!(header["kid"], DEFAULT_KID);

    let claims = decode_segment(parts[1]);
    assert_eq!(claims["iss"], cognito_issuer(TEST_REGION, TEST_POOL_ID));
    assert_eq!(claims["token_use"], "access");
    assert!(claims["exp"].as_i64().unwrap() > claims["iat"].as_i64().unwrap());
}

#[test]
fn test_builder_overrides() {
    let builder = TokenBuilder::test_pool()
        .token_use("id")
        .without("username")
        .claim("cognito:username", "alice")
        .without_kid();
    let token = builder.unsigned("none");
    let parts: Vec<&str> = token.split('.').collect();

    let header = decode_segment(parts[0]);
    assert_eq!(header["alg"], "none");
    assert!(header.get("kid").is_none());

    let claims = decode_segment(parts[1]);
    assert_eq!(claims["token_use"], "id");
    assert_eq!(claims["cognito:username"], "alice");
    assert!(claims.get("username").is_none());
}

#[test]
fn test_tamper_keeps_header_and_signature() {
    let token = TokenBuilder::test_pool().sign(TestKeyPair::shared());
    let tampered = tamper_claims(&token, &json!({ "sub": "mallory" }));
    let (a, b): (Vec<&str>, Vec<&str>) = (token.split('.').collect(), tampered.split('.').collect());
    assert_eq!(a[0], b[0]);
    assert_eq!(a[2], b[2]);
    assert_ne!(a[1], b[1]);
}

#[test]
fn test_jwks_lists_keys_in_order() {
    let doc = jwks_json(&[TestKeyPair::shared(), TestKeyPair::other()]);
    assert_eq!(doc["keys"].as_array().unwrap().len(), 2);
    assert_eq!(doc["keys"][0]["kid"], "test-key-1");
    assert_eq!(doc["keys"][1]["kid"], "test-key-2");
    assert_eq!(doc["keys"][0]["kty"], "RSA");
    assert_eq!(doc["keys"][0]["e"], "AQAB");
}

#[test]
fn test_with_kid_keeps_key_material() {
    let renamed = TestKeyPair::shared().with_kid("rotated");
    assert_eq!(renamed.kid(), "rotated");
    assert_eq!(renamed.n(), TestKeyPair::shared().n());
}

#[tokio::test]
async fn test_mock_jwks_serves_and_counts() {
    let mock = MockJwks::start().await;
    mock.serve(TestKeyPair::shared().jwks_json()).await;

    let body: Value = reqwest::get(mock.jwks_url())
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["keys"][0]["kid"], DEFAULT_KID);
    assert_eq!(mock.fetch_count().await, 1);
    assert!(mock.jwks_url().ends_with("/us-east-1_TestPool/.well-known/jwks.json"));
    assert_eq!(mock.issuer(), cognito_issuer(TEST_REGION, TEST_POOL_ID));
}
