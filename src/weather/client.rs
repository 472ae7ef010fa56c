//! Open-Meteo HTTP client with a response cache in front of it.

use std::{sync::Arc, time::Duration};

use reqwest::{header::ACCEPT, Client, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::cache::TtlCache;

// ---

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Open-Meteo returned {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid Open-Meteo URL: {0}")]
    InvalidUrl(String),
}

/// Upstream payload plus whether it came from the cache.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub data: Value,
    pub cached: bool,
}

#[derive(Clone)]
pub struct OpenMeteoClient {
    http: Client,
    base_url: String,
    cache: Arc<TtlCache>,
}

impl OpenMeteoClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        // ---
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache: Arc::new(TtlCache::new()),
        })
    }

    /// Full URL for the `forecast` endpoint with the given query parameters.
    pub fn forecast_url(&self, params: &[(&str, String)]) -> Result<Url, UpstreamError> {
        Url::parse_with_params(&format!("{}/forecast", self.base_url), params)
            .map_err(|e| UpstreamError::InvalidUrl(e.to_string()))
    }

    /// Call `forecast`, serving from cache when a fresh copy exists.
    pub async fn forecast(
        &self,
        params: &[(&str, String)],
        ttl: Duration,
    ) -> Result<Fetched, UpstreamError> {
        // ---
        let url = self.forecast_url(params)?;
        let key = url.to_string();

        if let Some(data) = self.cache.get(&key).await {
            debug!("Open-Meteo cache hit: {}", key);
            return Ok(Fetched { data, cached: true });
        }

        debug!("Open-Meteo fetch: {}", key);
        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Open-Meteo responded {} for {}", status, key);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let data: Value = response.json().await?;
        self.cache.insert(key, data.clone(), ttl).await;

        Ok(Fetched {
            data,
            cached: false,
        })
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn builds_forecast_url_with_encoded_params() {
        // ---
        let client =
            OpenMeteoClient::new("https://api.open-meteo.com/v1/", Duration::from_secs(1)).unwrap();
        let url = client
            .forecast_url(&[
                ("latitude", "50.5".to_string()),
                ("current", "temperature_2m,is_day".to_string()),
            ])
            .unwrap();

        assert_eq!(url.path(), "/v1/forecast");
        assert_eq!(
            url.query(),
            Some("latitude=50.5&current=temperature_2m%2Cis_day")
        );
    }

    #[test]
    fn status_error_message() {
        // ---
        let err = UpstreamError::Status {
            status: 503,
            reason: "Service Unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Open-Meteo returned 503: Service Unavailable");
    }

    #[test]
    fn rejects_unparseable_base() {
        // ---
        let client = OpenMeteoClient::new("not a url", Duration::from_secs(1)).unwrap();
        assert!(matches!(
            client.forecast_url(&[]),
            Err(UpstreamError::InvalidUrl(_))
        ));
    }
}
