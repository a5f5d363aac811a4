use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::RETRY_AFTER;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{GeocodeError, Result};

// ─── RateLimitedClient ────────────────────────────────────────────────────────

/// GET-only HTTP client that spaces requests at least `min_interval` apart.
///
/// Clones share the same pacing state.
#[derive(Clone)]
pub struct RateLimitedClient {
    client: reqwest::Client,
    min_interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl RateLimitedClient {
    pub fn new(
        min_interval: Duration,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            min_interval,
            last_request: Arc::new(Mutex::new(None)),
        })
    }

    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(t) = *last {
            let elapsed = t.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// One GET per call; failures are returned, never retried.
    pub async fn get(&self, url: &Url) -> Result<String> {
        self.wait_for_rate_limit().await;
        debug!(%url, "GET");
        let resp = self.client.get(url.clone()).send().await?;

        let status = resp.status();
        if status == 429 {
            let wait = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(GeocodeError::RateLimit(host_of(url), wait));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeocodeError::ApiError(
                host_of(url),
                format!("HTTP {}: {body}", status.as_u16()),
            ));
        }
        Ok(resp.text().await?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let text = self.get(url).await?;
        serde_json::from_str(&text).map_err(|e| GeocodeError::Parse(e.to_string()))
    }
}

fn host_of(url: &Url) -> String {
    url.host_str().unwrap_or("server").to_string()
}

pub(crate) fn parse_base_url(base_url: &str) -> Result<Url> {
    Url::parse(base_url).map_err(|e| GeocodeError::Parse(format!("invalid URL {base_url}: {e}")))
}
