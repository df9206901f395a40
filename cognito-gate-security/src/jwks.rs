use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::config::VerificationConfig;
use crate::error::GateError;
use crate::fetcher::KeySetFetcher;
use crate::keys::{KeyRecord, KeySet};

/// Timing rules of the key-set cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// How long a fetched key set is considered fresh.
    pub ttl: Duration,
    /// Minimum delay between two fetch attempts for the same URL.
    pub min_refresh_interval: Duration,
    /// How long past `ttl` a key set may still be served when refreshing fails.
    pub stale_grace: Duration,
}

impl CachePolicy {
    pub fn from_config(config: &VerificationConfig) -> Self {
        Self {
            ttl: Duration::from_secs(config.jwks_cache_ttl_secs),
            min_refresh_interval: Duration::from_secs(config.jwks_min_refresh_interval_secs),
            stale_grace: Duration::from_secs(config.jwks_stale_grace_secs),
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            min_refresh_interval: Duration::from_secs(10),
            stale_grace: Duration::from_secs(300),
        }
    }
}

/// Cached state of one JWKS URL, behind the slot lock.
#[derive(Default)]
struct SlotState {
    keys: KeySet,
    last_refresh: Option<Instant>,
    last_refresh_attempt: Option<Instant>,
    last_error: Option<GateError>,
}

#[derive(Default)]
struct Slot {
    state: RwLock<SlotState>,
    refresh_lock: Mutex<()>,
}

/// Key-set cache shared by every request.
///
/// Slots are keyed by JWKS URL, which is derived from region and user pool,
/// so several pools can share one cache. Each slot refreshes when its keys
/// are older than the TTL or when a requested `kid` is missing, with at most
/// one fetch in flight per URL.
pub struct JwksCache {
    fetcher: KeySetFetcher,
    policy: CachePolicy,
    slots: DashMap<String, Arc<Slot>>,
}

impl JwksCache {
    /// Create an empty cache. Nothing is fetched until the first lookup or
    /// [`refresh_now`](Self::refresh_now).
    pub fn new(policy: CachePolicy, fetch_timeout: Duration) -> Result<Self, GateError> {
        Ok(Self::with_fetcher(KeySetFetcher::new(fetch_timeout)?, policy))
    }

    pub fn from_config(config: &VerificationConfig) -> Result<Self, GateError> {
        Self::new(CachePolicy::from_config(config), config.fetch_timeout())
    }

    pub fn with_fetcher(fetcher: KeySetFetcher, policy: CachePolicy) -> Self {
        Self {
            fetcher,
            policy,
            slots: DashMap::new(),
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    fn slot(&self, url: &str) -> Arc<Slot> {
        if let Some(slot) = self.slots.get(url) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.slots.entry(url.to_string()).or_default().value())
    }

    /// Look up the key record for `kid` in the key set published at `url`.
    ///
    /// A fresh hit returns immediately. Otherwise the slot is refreshed
    /// (forced when `kid` is unknown) and looked up again. If refreshing
    /// fails, an expired key set is still served for the stale grace window.
    pub async fn get_key(&self, url: &str, kid: &str) -> Result<KeyRecord, GateError> {
        let slot = self.slot(url);

        let force_refresh = {
            let state = slot.state.read().await;
            match state.keys.get(kid) {
                Some(record) if !is_stale(state.last_refresh, self.policy.ttl) => {
                    return Ok(record.clone());
                }
                Some(_) => false,
                None => true,
            }
        };

        let refreshed = match self.try_refresh(url, &slot, force_refresh).await {
            Ok(refreshed) => refreshed,
            Err(err) => {
                warn!(url = %url, error = %err, "JWKS refresh failed");
                false
            }
        };

        let state = slot.state.read().await;
        let Some(record) = state.keys.get(kid) else {
            return Err(match &state.last_error {
                Some(err) => err.clone(),
                None => GateError::UnknownKeyId(kid.to_string()),
            });
        };

        if refreshed || !is_stale(state.last_refresh, self.policy.ttl) {
            return Ok(record.clone());
        }
        if !is_stale(state.last_refresh, self.policy.ttl + self.policy.stale_grace) {
            debug!(url = %url, kid = %kid, "Serving stale JWKS key");
            return Ok(record.clone());
        }
        Err(state
            .last_error
            .clone()
            .unwrap_or_else(|| GateError::KeyFetchFailure("cached signing keys expired".into())))
    }

    /// Fetch the key set at `url` now, subject only to the refresh lock.
    pub async fn refresh_now(&self, url: &str) -> Result<usize, GateError> {
        let slot = self.slot(url);
        let _guard = slot.refresh_lock.lock().await;
        self.refresh(url, &slot).await?;
        let count = slot.state.read().await.keys.len();
        Ok(count)
    }

    async fn refresh(&self, url: &str, slot: &Slot) -> Result<(), GateError> {
        let attempt = Instant::now();
        let result = self.fetcher.fetch(url).await;

        let mut state = slot.state.write().await;
        state.last_refresh_attempt = Some(attempt);
        match result {
            Ok(keys) => {
                state.keys = keys;
                state.last_refresh = Some(Instant::now());
                state.last_error = None;
                Ok(())
            }
            Err(err) => {
                state.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Refresh the slot if it is stale, or unconditionally when `force` is
    /// set, unless an attempt was made less than the minimum interval ago.
    ///
    /// Returns whether the slot now holds keys from a successful fetch that
    /// is at most one refresh interval old.
    async fn try_refresh(&self, url: &str, slot: &Slot, force: bool) -> Result<bool, GateError> {
        let ttl = self.policy.ttl;
        let min_interval = self.policy.min_refresh_interval;

        {
            let state = slot.state.read().await;
            if !force && !is_stale(state.last_refresh, ttl) {
                return Ok(false);
            }
            if !can_attempt(state.last_refresh_attempt, min_interval) {
                return Ok(last_attempt_succeeded(&state));
            }
        }

        let _guard = slot.refresh_lock.lock().await;

        {
            let state = slot.state.read().await;
            if !force && !is_stale(state.last_refresh, ttl) {
                return Ok(false);
            }
            if !can_attempt(state.last_refresh_attempt, min_interval) {
                return Ok(last_attempt_succeeded(&state));
            }
        }

        self.refresh(url, slot).await.map(|_| true)
    }
}

fn last_attempt_succeeded(state: &SlotState) -> bool {
    state.last_refresh.is_some() && state.last_error.is_none()
}

fn is_stale(last_refresh: Option<Instant>, ttl: Duration) -> bool {
    match last_refresh {
        None => true,
        Some(ts) => ts.elapsed() >= ttl,
    }
}

fn can_attempt(last_attempt: Option<Instant>, min_interval: Duration) -> bool {
    match last_attempt {
        None => true,
        Some(ts) => ts.elapsed() >= min_interval,
    }
}
