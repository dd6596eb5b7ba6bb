use super::{is_challenge_title, FetchRequest, PageFetcher};
use crate::config::ScrapeConfig;
use crate::error::{Result, ScraperError};
use crate::metrics::ScrapeMetrics;
use crate::retry::Sleeper;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Headless Chromium backend. Each fetch launches and tears down its own
/// browser so a crashed session never leaks into the next call.
pub struct BrowserFetcher {
    config: ScrapeConfig,
    sleeper: Arc<dyn Sleeper>,
}

fn browser_err(context: &str, e: impl std::fmt::Display) -> ScraperError {
    ScraperError::Browser(format!("{context}: {e}"))
}

impl BrowserFetcher {
    pub fn new(config: ScrapeConfig, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { config, sleeper }
    }

    fn browser_config(request: &FetchRequest) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .window_size(1920, 1080)
            .request_timeout(request.timeout)
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={}", request.user_agent));

        if let Some(proxy) = &request.proxy {
            builder = builder.arg(format!("--proxy-server={proxy}"));
        }

        builder
            .build()
            .map_err(|e| browser_err("failed to build browser config", e))
    }

    async fn title(page: &Page) -> String {
        page.get_title().await.ok().flatten().unwrap_or_default()
    }

    async fn load(&self, browser: &Browser, request: &FetchRequest) -> Result<String> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| browser_err("failed to open page", e))?;
        page.enable_stealth_mode_with_agent(&request.user_agent)
            .await
            .map_err(|e| browser_err("failed to mask automation", e))?;

        let navigation = tokio::time::timeout(request.timeout, page.goto(request.url.as_str())).await;
        match navigation {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(ScraperError::Fetch {
                    url: request.url.clone(),
                    message: e.to_string(),
                })
            }
            Err(_) => {
                return Err(ScraperError::Fetch {
                    url: request.url.clone(),
                    message: format!("page load timed out after {:?}", request.timeout),
                })
            }
        }

        self.sleeper
            .sleep(Duration::from_secs(self.config.settle_wait_seconds))
            .await;

        if is_challenge_title(&Self::title(&page).await) {
            info!(url = %request.url, wait_secs = self.config.challenge_wait_seconds, "Challenge still active, extended wait");
            self.sleeper
                .sleep(Duration::from_secs(self.config.challenge_wait_seconds))
                .await;
            if is_challenge_title(&Self::title(&page).await) {
                return Err(ScraperError::Challenge {
                    url: request.url.clone(),
                });
            }
        }

        let html = page
            .content()
            .await
            .map_err(|e| browser_err("failed to read page content", e))?;
        if html.trim().is_empty() {
            return Err(ScraperError::Fetch {
                url: request.url.clone(),
                message: "empty page source".to_string(),
            });
        }
        Ok(html)
    }

    async fn fetch_page(&self, request: &FetchRequest) -> Result<String> {
        let (mut browser, mut handler) = Browser::launch(Self::browser_config(request)?)
            .await
            .map_err(|e| browser_err("failed to launch browser", e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(e) = h {
                    error!("Browser handler error: {:?}", e);
                }
            }
        });

        let result = self.load(&browser, request).await;

        if let Err(e) = browser.close().await {
            debug!("Browser close failed: {}", e);
        }
        let _ = browser.wait().await;
        handler_task.abort();

        result
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let request = FetchRequest::new(url, &self.config)?;

        self.sleeper
            .sleep(Duration::from_secs(self.config.delay_seconds))
            .await;

        info!(
            url = %request.url,
            backend = "browser",
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
