//! Site and scraping constants shared across fetchers, parsers and categories.

pub const PFR_BASE_URL: &str = "https://www.pro-football-reference.com";
pub const DEFAULT_ODDS_BASE_URL: &str = "https://api.the-odds-api.com";

/// Title fragment of the bot-detection interstitial.
pub const CHALLENGE_TITLE_MARKER: &str = "Just a moment";

/// Class marker on repeated header rows inside stat tables.
pub const HEADER_ROW_CLASS: &str = "thead";

/// Header-cell `data-stat` carrying the row rank.
pub const RANK_STAT: &str = "ranker";
pub const RANK_FIELD: &str = "rk";

/// Decorations appended to names (`*` Pro Bowl, `+` All-Pro).
pub const AWARD_MARKERS: &[char] = &['*', '+'];

pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 OPR/106.0.0.0",
];

/// Season page for a category path, e.g. `passing.htm`. An empty path is the season index.
pub fn season_url(season: i32, path: &str) -> String {
    format!("{PFR_BASE_URL}/years/{season}/{path}")
}

pub fn team_season_url(team: &str, year: i32) -> String {
    format!(
        "{PFR_BASE_URL}/teams/{}/{year}.htm",
        team.trim().to_ascii_lowercase()
    )
}
