use std::time::Duration;

use async_trait::async_trait;

use super::errors::JwksError;
use super::models::JwkSet;

/// Source of a published key set.
#[async_trait]
pub trait KeySetFetcher: Send + Sync + 'static {
    /// Retrieve the current key set.
    ///
    /// # Errors
    /// * `FetchFailed` - Endpoint unreachable or answered with an error status
    /// * `Timeout` - Endpoint did not answer in time
    /// * `InvalidKeySet` - Body is not a key set
    async fn fetch(&self) -> Result<JwkSet, JwksError>;
}

/// Fetches a key set over HTTPS from a well-known URL.
pub struct HttpKeySetFetcher {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpKeySetFetcher {
    /// Create a fetcher for `url` whose requests give up after `timeout`.
    ///
    /// # Errors
    /// * `FetchFailed` - HTTP client could not be built
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, JwksError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| JwksError::FetchFailed(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    /// The well-known key set URL of a hosted user pool.
    pub fn user_pool_url(region: &str, user_pool_id: &str) -> String {
        format!(
            "https://cognito-idp.{}.amazonaws.com/{}/.well-known/jwks.json",
            region, user_pool_id
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl KeySetFetcher for HttpKeySetFetcher {
    async fn fetch(&self) -> Result<JwkSet, JwksError> {
        tracing::debug!(url = %self.url, "Fetching signing key set");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    JwksError::Timeout(self.timeout.as_millis())
                } else {
                    JwksError::FetchFailed(e.to_string())
                }
            })?
            .error_for_status()
            .map_err(|e| JwksError::FetchFailed(e.to_string()))?;

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| JwksError::InvalidKeySet(e.to_string()))
    }
}
