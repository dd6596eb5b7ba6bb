use crate::constants::{DEFAULT_ODDS_BASE_URL, DEFAULT_USER_AGENTS};
use crate::error::{Result, ScraperError};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub scrape: ScrapeConfig,
    pub odds: OddsConfig,
    pub server: ServerConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchBackend {
    Http,
    Browser,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub backend: FetchBackend,
    /// Throttle applied before every page fetch.
    pub delay_seconds: u64,
    pub request_timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delays: Vec<u64>,
    pub settle_wait_seconds: u64,
    pub challenge_wait_seconds: u64,
    pub user_agents: Vec<String>,
    pub use_proxy: bool,
    pub proxy_list: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OddsConfig {
    pub api_key: String,
    pub base_url: String,
    pub sport: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            scrape: ScrapeConfig::default(),
            odds: OddsConfig::default(),
            server: ServerConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/nfl_stats.db".to_string(),
        }
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            backend: FetchBackend::Http,
            delay_seconds: 60,
            request_timeout_seconds: 30,
            max_retries: 3,
            retry_delays: vec![30, 60, 120],
            settle_wait_seconds: 10,
            challenge_wait_seconds: 15,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            use_proxy: false,
            proxy_list: Vec::new(),
        }
    }
}

impl Default for OddsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_ODDS_BASE_URL.to_string(),
            sport: "americanfootball_nfl".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
        }
    }
}

impl Config {
    /// Loads `config.toml` (or the file named by `NFL_STATS_CONFIG`) when present,
    /// then applies environment overrides and validates the result.
    pub fn load() -> Result<Self> {
        let config_path =
            std::env::var("NFL_STATS_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        let mut config = if Path::new(&config_path).exists() {
            Self::from_file(&config_path)?
        } else {
            Config::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Overlays values from `lookup` (the process environment in production).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DATABASE_PATH") {
            self.database.path = v;
        }
        if let Some(v) = lookup("SCRAPE_BACKEND") {
            self.scrape.backend = match v.trim().to_ascii_lowercase().as_str() {
                "http" => FetchBackend::Http,
                "browser" => FetchBackend::Browser,
                other => {
                    return Err(ScraperError::Config(format!(
                        "SCRAPE_BACKEND must be 'http' or 'browser', got '{other}'"
                    )))
                }
            };
        }
        if let Some(v) = lookup("SCRAPE_DELAY_SECONDS") {
            self.scrape.delay_seconds = parse_env("SCRAPE_DELAY_SECONDS", &v)?;
        }
        if let Some(v) = lookup("SCRAPE_REQUEST_TIMEOUT") {
            self.scrape.request_timeout_seconds = parse_env("SCRAPE_REQUEST_TIMEOUT", &v)?;
        }
        if let Some(v) = lookup("SCRAPE_MAX_RETRIES") {
            self.scrape.max_retries = parse_env("SCRAPE_MAX_RETRIES", &v)?;
        }
        if let Some(v) = lookup("SCRAPE_RETRY_DELAYS") {
            self.scrape.retry_delays = split_list(&v)
                .iter()
                .map(|s| parse_env("SCRAPE_RETRY_DELAYS", s))
                .collect::<Result<Vec<u64>>>()?;
        }
        if let Some(v) = lookup("SCRAPE_USE_PROXY") {
            self.scrape.use_proxy = matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Some(v) = lookup("SCRAPE_PROXY_LIST") {
            self.scrape.proxy_list = split_list(&v);
        }
        if let Some(v) = lookup("ODDS_API_KEY") {
            self.odds.api_key = v;
        }
        if let Some(v) = lookup("ODDS_API_BASE_URL") {
            self.odds.base_url = v;
        }
        if let Some(v) = lookup("API_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("API_PORT") {
            self.server.port = parse_env("API_PORT", &v)?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.log_level = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.scrape.user_agents.is_empty() {
            return Err(ScraperError::Config(
                "scrape.user_agents must not be empty".to_string(),
            ));
        }
        if self.scrape.max_retries == 0 {
            return Err(ScraperError::InvalidRetryConfig(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.scrape.use_proxy {
            for proxy in &self.scrape.proxy_list {
                reqwest::Proxy::all(proxy.as_str()).map_err(|e| {
                    ScraperError::Config(format!("invalid proxy '{proxy}': {e}"))
                })?;
            }
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ScraperError::Config(format!("{key} has invalid value '{value}'")))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
