use cognito_gate_core::{AppConfig, ConfigError};
use cognito_gate_security::Algorithm;
use cognito_gate_server::Settings;

const FULL: &str = r#"
server:
  bind: "127.0.0.1:8080"
cognito:
  region: "eu-west-1"
  user_pool_id: "eu-west-1_Pool"
  realm: "admin-area"
  token_header: "Authorization"
  allowed_algorithms: ["RS256", "RS512"]
  jwks:
    url: "http://localhost:9000/jwks.json"
    cache_ttl_secs: 60
    min_refresh_interval_secs: 5
    stale_grace_secs: 30
    fetch_timeout_secs: 2
    warm_up: false
gate:
  skip_paths:
    - "/admin/ping"
    - "/admin/health"
"#;

const MINIMAL: &str = r#"
cognito:
  region: "us-east-1"
  user_pool_id: "us-east-1_Pool"
"#;

fn settings(yaml: &str) -> Result<Settings, ConfigError> {
    Settings::from_config(&AppConfig::from_yaml_str(yaml, "test").unwrap())
}

#[test]
fn test_reads_every_key() {
    let settings = settings(FULL).unwrap();
    assert_eq!(settings.bind, "127.0.0.1:8080");
    assert_eq!(settings.region, "eu-west-1");
    assert_eq!(settings.user_pool_id, "eu-west-1_Pool");
    assert_eq!(settings.realm, "admin-area");
    assert_eq!(settings.token_header, "Authorization");
    assert_eq!(settings.allowed_algorithms, vec![Algorithm::RS256, Algorithm::RS512]);
    assert_eq!(settings.jwks_url.as_deref(), Some("http://localhost:9000/jwks.json"));
    assert_eq!(settings.jwks_cache_ttl_secs, 60);
    assert_eq!(settings.jwks_min_refresh_interval_secs, 5);
    assert_eq!(settings.jwks_stale_grace_secs, 30);
    assert_eq!(settings.fetch_timeout_secs, 2);
    assert!(!settings.warm_up);
    assert_eq!(settings.skip_paths, vec!["/admin/ping", "/admin/health"]);
}

#[test]
fn test_defaults() {
    let settings = settings(MINIMAL).unwrap();
    assert_eq!(settings.bind, "0.0.0.0:1323");
    assert_eq!(settings.realm, "Restricted");
    assert_eq!(settings.token_header, "access_token");
    assert_eq!(settings.allowed_algorithms, vec![Algorithm::RS256]);
    assert_eq!(settings.jwks_url, None);
    assert_eq!(settings.jwks_cache_ttl_secs, 3600);
    assert_eq!(settings.jwks_min_refresh_interval_secs, 10);
    assert_eq!(settings.jwks_stale_grace_secs, 300);
    assert_eq!(settings.fetch_timeout_secs, 10);
    assert!(settings.warm_up);
    assert!(settings.skip_paths.is_empty());
}

#[test]
fn test_missing_region() {
    let err = settings("cognito:\n  user_pool_id: \"p\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(key) if key == "cognito.region"));
}

#[test]
fn test_empty_pool_id() {
    let err = settings("cognito:\n  region: \"us-east-1\"\n  user_pool_id: \"  \"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key, .. } if key == "cognito.user_pool_id"));
}

#[test]
fn test_non_rsa_algorithm_rejected() {
    let yaml = format!("{MINIMAL}  allowed_algorithms: [\"HS256\"]\n");
    let err = settings(&yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key, .. } if key == "cognito.allowed_algorithms"));
}

#[test]
fn test_unknown_algorithm_rejected() {
    let yaml = format!("{MINIMAL}  allowed_algorithms: [\"RS999\"]\n");
    assert!(matches!(settings(&yaml), Err(ConfigError::Invalid { .. })));
}

#[test]
fn test_comma_separated_algorithms() {
    let mut config = AppConfig::from_yaml_str(MINIMAL, "test").unwrap();
    config.set(
        "cognito.allowed_algorithms",
        cognito_gate_core::ConfigValue::String("RS256, RS384".into()),
    );
    let settings = Settings::from_config(&config).unwrap();
    assert_eq!(settings.allowed_algorithms, vec![Algorithm::RS256, Algorithm::RS384]);
}

#[test]
fn test_verification_config() {
    let config = settings(FULL).unwrap().verification_config();
    assert_eq!(config.issuer(), "https://cognito-idp.eu-west-1.amazonaws.com/eu-west-1_Pool");
    assert_eq!(config.jwks_url(), "http://localhost:9000/jwks.json");
    assert_eq!(config.realm, "admin-area");
    assert_eq!(config.token_header, "Authorization");
    assert_eq!(config.effective_algorithms(), vec![Algorithm::RS256, Algorithm::RS512]);
    assert_eq!(config.fetch_timeout().as_secs(), 2);
}

#[test]
fn test_verification_config_derives_jwks_url() {
    let config = settings(MINIMAL).unwrap().verification_config();
    assert_eq!(
        config.jwks_url(),
        "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_Pool/.well-known/jwks.json"
    );
}
