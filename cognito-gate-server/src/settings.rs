use std::str::FromStr;

use cognito_gate_core::{AppConfig, ConfigError};
use cognito_gate_security::config::{DEFAULT_REALM, DEFAULT_TOKEN_HEADER, RSA_ALGORITHMS};
use cognito_gate_security::{Algorithm, PathSkipper, VerificationConfig};

pub const DEFAULT_BIND: &str = "0.0.0.0:1323";

/// Server settings read from [`AppConfig`].
///
/// | key                                    | default          |
/// |----------------------------------------|------------------|
/// | `server.bind`                          | `0.0.0.0:1323`   |
/// | `cognito.region`                       | required         |
/// | `cognito.user_pool_id`                 | required         |
/// | `cognito.realm`                        | `Restricted`     |
/// | `cognito.token_header`                 | `access_token`   |
/// | `cognito.allowed_algorithms`           | `[RS256]`        |
/// | `cognito.jwks.url`                     | derived          |
/// | `cognito.jwks.cache_ttl_secs`          | `3600`           |
/// | `cognito.jwks.min_refresh_interval_secs` | `10`           |
/// | `cognito.jwks.stale_grace_secs`        | `300`            |
/// | `cognito.jwks.fetch_timeout_secs`      | `10`             |
/// | `cognito.jwks.warm_up`                 | `true`           |
/// | `gate.skip_paths`                      | `[]`             |
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bind: String,
    pub region: String,
    pub user_pool_id: String,
    pub realm: String,
    pub token_header: String,
    pub allowed_algorithms: Vec<Algorithm>,
    pub jwks_url: Option<String>,
    pub jwks_cache_ttl_secs: u64,
    pub jwks_min_refresh_interval_secs: u64,
    pub jwks_stale_grace_secs: u64,
    pub fetch_timeout_secs: u64,
    pub warm_up: bool,
    pub skip_paths: Vec<String>,
}

impl Settings {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let algorithms: Vec<String> =
            config.get_or("cognito.allowed_algorithms", vec!["RS256".to_string()])?;

        Ok(Self {
            bind: config.get_or("server.bind", DEFAULT_BIND.to_string())?,
            region: required(config, "cognito.region")?,
            user_pool_id: required(config, "cognito.user_pool_id")?,
            realm: config.get_or("cognito.realm", DEFAULT_REALM.to_string())?,
            token_header: config.get_or("cognito.token_header", DEFAULT_TOKEN_HEADER.to_string())?,
            allowed_algorithms: parse_algorithms(&algorithms)?,
            jwks_url: config
                .get_or::<Option<String>>("cognito.jwks.url", None)?
                .filter(|url| !url.is_empty()),
            jwks_cache_ttl_secs: config.get_or("cognito.jwks.cache_ttl_secs", 3600)?,
            jwks_min_refresh_interval_secs: config
                .get_or("cognito.jwks.min_refresh_interval_secs", 10)?,
            jwks_stale_grace_secs: config.get_or("cognito.jwks.stale_grace_secs", 300)?,
            fetch_timeout_secs: config.get_or("cognito.jwks.fetch_timeout_secs", 10)?,
            warm_up: config.get_or("cognito.jwks.warm_up", true)?,
            skip_paths: config.get_or("gate.skip_paths", Vec::new())?,
        })
    }

    /// The gate configuration these settings describe.
    pub fn verification_config(&self) -> VerificationConfig {
        let mut config = VerificationConfig::new(&self.region, &self.user_pool_id)
            .with_realm(&self.realm)
            .with_token_header(&self.token_header)
            .with_allowed_algorithms(self.allowed_algorithms.iter().copied())
            .with_cache_ttl(self.jwks_cache_ttl_secs)
            .with_min_refresh_interval(self.jwks_min_refresh_interval_secs)
            .with_stale_grace(self.jwks_stale_grace_secs)
            .with_fetch_timeout(self.fetch_timeout_secs);
        if let Some(url) = &self.jwks_url {
            config = config.with_jwks_url(url);
        }
        if !self.skip_paths.is_empty() {
            config = config.with_skipper(PathSkipper::new(self.skip_paths.iter().cloned()));
        }
        config
    }
}

fn required(config: &AppConfig, key: &str) -> Result<String, ConfigError> {
    let value: String = config.get(key)?;
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid {
            key: key.to_string(),
            message: "must not be empty".into(),
        });
    }
    Ok(value)
}

fn parse_algorithms(names: &[String]) -> Result<Vec<Algorithm>, ConfigError> {
    let invalid = |message: String| ConfigError::Invalid {
        key: "cognito.allowed_algorithms".into(),
        message,
    };
    if names.is_empty() {
        return Err(invalid("at least one algorithm is required".into()));
    }
    names
        .iter()
        .map(|name| {
            let algorithm = Algorithm::from_str(name.trim())
                .map_err(|_| invalid(format!("unknown algorithm {name}")))?;
            if RSA_ALGORITHMS.contains(&algorithm) {
                Ok(algorithm)
            } else {
                Err(invalid(format!("{name} is not an RSA algorithm")))
            }
        })
        .collect()
}
