use std::time::Duration;

use tracing::{debug, info};

use crate::error::GateError;
use crate::keys::KeySet;

/// Downloads a JWKS document over HTTPS.
#[derive(Debug, Clone)]
pub struct KeySetFetcher {
    client: reqwest::Client,
}

impl KeySetFetcher {
    /// Build a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, GateError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GateError::KeyFetchFailure(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Fetch and parse the key set at `url`.
    ///
    /// Transport errors, non-success statuses and unparsable bodies all
    /// surface as [`GateError::KeyFetchFailure`].
    pub async fn fetch(&self, url: &str) -> Result<KeySet, GateError> {
        debug!(url = %url, "Fetching JWKS");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GateError::KeyFetchFailure(e.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|e| GateError::KeyFetchFailure(e.to_string()))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| GateError::KeyFetchFailure(format!("Failed to read JWKS body: {e}")))?;

        let keys = KeySet::from_json(&body)?;
        info!(url = %url, keys = keys.len(), "JWKS fetched");
        Ok(keys)
    }
}
