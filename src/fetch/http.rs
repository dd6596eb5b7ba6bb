use super::{is_challenge_page, FetchRequest, PageFetcher};
use crate::config::ScrapeConfig;
use crate::error::{Result, ScraperError};
use crate::metrics::ScrapeMetrics;
use crate::retry::Sleeper;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Plain HTTP backend. A fresh client is built per call so agent and proxy
/// rotate and no cookies or connections carry over between fetches.
pub struct HttpFetcher {
    config: ScrapeConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl HttpFetcher {
    pub fn new(config: ScrapeConfig, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { config, sleeper }
    }

    fn browser_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));
        headers
    }

    fn client(&self, request: &FetchRequest) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .user_agent(request.user_agent.as_str())
            .default_headers(Self::browser_headers())
            .timeout(request.timeout)
            .gzip(true)
            .deflate(true);

        if let Some(proxy) = &request.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
        }

        Ok(builder.build()?)
    }

    /// One GET. Challenge pages are returned as-is, whatever their status,
    /// so the caller can decide whether to wait.
    async fn get_once(&self, client: &reqwest::Client, url: &str) -> Result<String> {
        let response = client.get(url).send().await.map_err(|e| ScraperError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ScraperError::Fetch {
            url: url.to_string(),
            message: format!("failed to read body: {e}"),
        })?;

        if !status.is_success() && !is_challenge_page(&body) {
            return Err(ScraperError::Fetch {
                url: url.to_string(),
                message: format!("HTTP status {status}"),
            });
        }
        Ok(body)
    }

    async fn fetch_page(&self, request: &FetchRequest) -> Result<String> {
        let client = self.client(request)?;
        let url = request.url.as_str();

        let mut html = self.get_once(&client, url).await?;

        if is_challenge_page(&html) {
            info!(url = %url, wait_secs = self.config.settle_wait_seconds, "Challenge page detected, waiting");
            self.sleeper
                .sleep(Duration::from_secs(self.config.settle_wait_seconds))
                .await;
            html = self.get_once(&client, url).await?;
        }

        if is_challenge_page(&html) {
            info!(url = %url, wait_secs = self.config.challenge_wait_seconds, "Challenge still active, extended wait");
            self.sleeper
                .sleep(Duration::from_secs(self.config.challenge_wait_seconds))
                .await;
            html = self.get_once(&client, url).await?;
        }

        if is_challenge_page(&html) {
            return Err(ScraperError::Challenge {
                url: url.to_string(),
            });
        }

        if html.trim().is_empty() {
            return Err(ScraperError::Fetch {
                url: url.to_string(),
                message: "empty response body".to_string(),
            });
        }
        Ok(html)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let request = FetchRequest::new(url, &self.config)?;

        debug!(url = %request.url, delay_secs = self.config.delay_seconds, "Rate limit delay");
        self.sleeper
            .sleep(Duration::from_secs(self.config.delay_seconds))
            .await;

        info!(
            url = %request.url,
            backend = "http",
            proxy = request.proxy.is_some(),
            "Fetching page"
        );
        ScrapeMetrics::record_fetch_attempt();
        let started = Instant::now();

        let result = self.fetch_page(&request).await;
        ScrapeMetrics::record_fetch_duration(started.elapsed().as_secs_f64());

        match &result {
            Ok(html) => info!(url = %request.url, page_len = html.len(), "Fetched page"),
            Err(e) => {
                ScrapeMetrics::record_fetch_failure(e.kind());
                warn!(url = %request.url, error = %e, "Fetch failed");
            }
        }
        result
    }
}
