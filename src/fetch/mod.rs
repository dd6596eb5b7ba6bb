//! Page fetching: URL normalization, agent/proxy rotation and backends.

pub mod http;

#[cfg(feature = "browser")]
pub mod browser;

use crate::config::{FetchBackend, ScrapeConfig};
use crate::constants::CHALLENGE_TITLE_MARKER;
use crate::error::{Result, ScraperError};
use crate::retry::Sleeper;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;

pub use http::HttpFetcher;

#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());

/// Source of raw page HTML.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Full HTML document for `url`, or an error. Never a partial page.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Drop everything from the first `#`. Query string and path are untouched.
pub fn strip_fragment(url: &str) -> &str {
    match url.find('#') {
        Some(idx) => &url[..idx],
        None => url,
    }
}

/// Per-call fetch parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub user_agent: String,
    pub proxy: Option<String>,
    pub timeout: Duration,
}

impl FetchRequest {
    pub fn new(url: &str, config: &ScrapeConfig) -> Result<Self> {
        Self::with_rng(url, config, &mut rand::thread_rng())
    }

    /// Picks the agent (and proxy, when rotation is on) from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(url: &str, config: &ScrapeConfig, rng: &mut R) -> Result<Self> {
        let user_agent = config
            .user_agents
            .choose(rng)
            .cloned()
            .ok_or_else(|| ScraperError::Config("user agent pool is empty".to_string()))?;

        let proxy = if config.use_proxy {
            config.proxy_list.choose(rng).cloned()
        } else {
            None
        };

        Ok(Self {
            url: strip_fragment(url).to_string(),
            user_agent,
            proxy,
            timeout: Duration::from_secs(config.request_timeout_seconds),
        })
    }
}

pub fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string());
    title
}

/// True when the page is the bot-detection interstitial.
pub fn is_challenge_page(html: &str) -> bool {
    page_title(html)
        .map(|t| is_challenge_title(&t))
        .unwrap_or(false)
}

pub fn is_challenge_title(title: &str) -> bool {
    title.contains(CHALLENGE_TITLE_MARKER)
}

pub fn build_fetcher(config: &ScrapeConfig, sleeper: Arc<dyn Sleeper>) -> Result<Arc<dyn PageFetcher>> {
    match config.backend {
        FetchBackend::Http => Ok(Arc::new(HttpFetcher::new(config.clone(), sleeper))),
        #[cfg(feature = "browser")]
        FetchBackend::Browser => Ok(Arc::new(BrowserFetcher::new(config.clone(), sleeper))),
        #[cfg(not(feature = "browser"))]
        FetchBackend::Browser => Err(ScraperError::Config(
            "browser backend requires building with the `browser` feature".to_string(),
        )),
    }
}
