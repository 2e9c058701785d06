//! Process-wide cache of a provider's published signing keys.
//!
//! ```text
//! token arrives → read kid from header
//!               → read-locked lookup (hit: done)
//!               → miss: take the refresh lock, look up again
//!               → still missing: fetch the key set (timeout-bounded), swap it in
//! ```
//!
//! Only one refresh runs at a time. Callers that missed while a refresh was
//! in flight find the key on their second lookup instead of fetching again.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use jsonwebtoken::DecodingKey;
use tokio::sync::Mutex;
use tokio::sync::RwLock;

use super::errors::JwksError;
use super::fetcher::KeySetFetcher;

/// Default upper bound for one key set fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Default minimum spacing between two refreshes triggered by unknown key ids.
///
/// Keeps tokens carrying made-up `kid` values from turning every request
/// into a round-trip to the provider.
pub const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

pub struct SigningKeyCache {
    fetcher: Arc<dyn KeySetFetcher>,
    keys: RwLock<HashMap<String, Arc<DecodingKey>>>,
    /// Serialises refreshes; holds the instant of the last successful one.
    refresh: Mutex<Option<Instant>>,
    fetch_timeout: Duration,
    min_refresh_interval: Duration,
}

impl SigningKeyCache {
    /// Create an empty cache. Nothing is fetched until the first lookup.
    pub fn new(fetcher: Arc<dyn KeySetFetcher>) -> Self {
        Self {
            fetcher,
            keys: RwLock::new(HashMap::new()),
            refresh: Mutex::new(None),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Returns the decoding key for `kid`, fetching the key set on a miss.
    ///
    /// # Errors
    /// * `KeyNotFound` - Key id is not part of the current key set
    /// * `FetchFailed` / `Timeout` / `InvalidKeySet` - Refresh failed
    pub async fn get_decoding_key(&self, kid: &str) -> Result<Arc<DecodingKey>, JwksError> {
        if let Some(key) = self.cached(kid).await {
            return Ok(key);
        }
        tracing::debug!(kid, "Signing key cache miss");

        let mut last_refresh = self.refresh.lock().await;

        if let Some(key) = self.cached(kid).await {
            tracing::debug!(kid, "Signing key loaded by concurrent refresh");
            return Ok(key);
        }

        if let Some(at) = *last_refresh {
            if at.elapsed() < self.min_refresh_interval {
                tracing::debug!(kid, "Unknown key id, refresh suppressed");
                return Err(JwksError::KeyNotFound(kid.to_string()));
            }
        }

        self.load().await?;
        *last_refresh = Some(Instant::now());

        self.cached(kid)
            .await
            .ok_or_else(|| JwksError::KeyNotFound(kid.to_string()))
    }

    /// Number of keys currently cached.
    pub async fn len(&self) -> usize {
        self.keys.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.keys.read().await.is_empty()
    }

    async fn cached(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        self.keys.read().await.get(kid).cloned()
    }

    async fn load(&self) -> Result<(), JwksError> {
        let started = Instant::now();
        let set = tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch())
            .await
            .map_err(|_| JwksError::Timeout(self.fetch_timeout.as_millis()))
            .and_then(|fetched| fetched)
            .map_err(|e| {
                tracing::warn!(error = %e, "Signing key set refresh failed");
                e
            })?;

        let mut keys = HashMap::with_capacity(set.keys.len());
        for jwk in &set.keys {
            match jwk.to_decoding_key() {
                Ok(key) => {
                    keys.insert(jwk.kid.clone(), Arc::new(key));
                }
                Err(e) => tracing::warn!(kid = %jwk.kid, error = %e, "Skipping signing key"),
            }
        }

        tracing::info!(
            keys = keys.len(),
            latency_ms = started.elapsed().as_millis(),
            "Signing key set refreshed"
        );

        *self.keys.write().await = keys;
        Ok(())
    }
}
