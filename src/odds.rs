//! Betting lines from The Odds API.

use crate::config::OddsConfig;
use crate::db::Database;
use crate::error::{Result, ScraperError};
use crate::retry::{retry_with_backoff, RetryPolicy, Sleeper};
use crate::schema::{decimal, int, rate, text, week, ColumnDef, ColumnKind, TableSchema};
use crate::types::{ExtractedRow, StoredRecord};
use crate::validate::{validate_rows, ValidationPolicy};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub static ODDS_SCHEMA: TableSchema = TableSchema {
    table: "odds",
    columns: &[
        crate::schema::season(),
        week().required(),
        ColumnDef::new("game_date", ColumnKind::Date).required(),
        text("home_team", 64).required(),
        text("away_team", 64).required(),
        text("sportsbook", 64).required(),
        decimal("spread_home"),
        decimal("spread_away"),
        int("moneyline_home"),
        int("moneyline_away"),
        rate("over_under"),
        text("timestamp", 40).required(),
        ColumnDef::new("is_opening", ColumnKind::Int).range(0.0, 1.0),
        ColumnDef::new("is_closing", ColumnKind::Int).range(0.0, 1.0),
    ],
    unique: &["season", "week", "home_team", "sportsbook", "timestamp"],
};

/// Sportsbook filter meaning "any book".
pub const CONSENSUS: &str = "consensus";

const TEAM_ABBREVIATIONS: &[(&str, &str)] = &[
    ("Arizona Cardinals", "ARI"),
    ("Atlanta Falcons", "ATL"),
    ("Baltimore Ravens", "BAL"),
    ("Buffalo Bills", "BUF"),
    ("Carolina Panthers", "CAR"),
    ("Chicago Bears", "CHI"),
    ("Cincinnati Bengals", "CIN"),
    ("Cleveland Browns", "CLE"),
    ("Dallas Cowboys", "DAL"),
    ("Denver Broncos", "DEN"),
    ("Detroit Lions", "DET"),
    ("Green Bay Packers", "GB"),
    ("Houston Texans", "HOU"),
    ("Indianapolis Colts", "IND"),
    ("Jacksonville Jaguars", "JAX"),
    ("Kansas City Chiefs", "KC"),
    ("Las Vegas Raiders", "LV"),
    ("Los Angeles Chargers", "LAC"),
    ("Los Angeles Rams", "LAR"),
    ("Miami Dolphins", "MIA"),
    ("Minnesota Vikings", "MIN"),
    ("New England Patriots", "NE"),
    ("New Orleans Saints", "NO"),
    ("New York Giants", "NYG"),
    ("New York Jets", "NYJ"),
    ("Philadelphia Eagles", "PHI"),
    ("Pittsburgh Steelers", "PIT"),
    ("San Francisco 49ers", "SF"),
    ("Seattle Seahawks", "SEA"),
    ("Tampa Bay Buccaneers", "TB"),
    ("Tennessee Titans", "TEN"),
    ("Washington Commanders", "WAS"),
];

/// Franchise abbreviation; unknown names fall back to their first three
/// letters upper-cased.
pub fn team_abbreviation(full_name: &str) -> String {
    let name = full_name.trim();
    TEAM_ABBREVIATIONS
        .iter()
        .find(|(full, _)| full.eq_ignore_ascii_case(name))
        .map(|(_, abbr)| abbr.to_string())
        .unwrap_or_else(|| name.chars().take(3).collect::<String>().to_uppercase())
}

// ---- API response ----

#[derive(Debug, Clone, Deserialize)]
pub struct OddsEvent {
    pub id: String,
    pub commence_time: String,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub bookmakers: Vec<Bookmaker>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Bookmaker {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub markets: Vec<Market>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Market {
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Outcome {
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub point: Option<f64>,
}

/// One bookmaker's line for one game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OddsLine {
    pub season: i32,
    pub week: i32,
    pub game_date: String,
    pub home_team: String,
    pub away_team: String,
    pub sportsbook: String,
    pub spread_home: Option<f64>,
    pub spread_away: Option<f64>,
    pub moneyline_home: Option<i64>,
    pub moneyline_away: Option<i64>,
    pub over_under: Option<f64>,
    pub timestamp: String,
    pub is_opening: bool,
    pub is_closing: bool,
}

impl OddsLine {
    fn to_row(&self) -> ExtractedRow {
        let mut row = ExtractedRow::new();
        row.set("season", self.season);
        row.set("week", self.week);
        row.set("game_date", self.game_date.as_str());
        row.set("home_team", self.home_team.as_str());
        row.set("away_team", self.away_team.as_str());
        row.set("sportsbook", self.sportsbook.as_str());
        row.set("spread_home", self.spread_home);
        row.set("spread_away", self.spread_away);
        row.set("moneyline_home", self.moneyline_home);
        row.set("moneyline_away", self.moneyline_away);
        row.set("over_under", self.over_under);
        row.set("timestamp", self.timestamp.as_str());
        row.set("is_opening", i64::from(self.is_opening));
        row.set("is_closing", i64::from(self.is_closing));
        row
    }
}

/// Latest closing line for a team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosingLine {
    pub home_team: String,
    pub away_team: String,
    pub spread_home: Option<f64>,
    pub spread_away: Option<f64>,
    pub moneyline_home: Option<i64>,
    pub moneyline_away: Option<i64>,
    pub over_under: Option<f64>,
    pub sportsbook: String,
    pub timestamp: String,
}

/// Flags applied to every line of one fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineKind {
    pub is_opening: bool,
    pub is_closing: bool,
}

/// Flatten API events into one line per bookmaker. Events with an
/// unreadable kickoff time are skipped.
pub fn parse_events(events: &[OddsEvent], season: i32, week: i32, kind: LineKind, timestamp: &str) -> Vec<OddsLine> {
    let mut lines = Vec::new();

    for event in events {
        let game_date = match DateTime::parse_from_rfc3339(&event.commence_time) {
            Ok(t) => t.with_timezone(&Utc).date_naive().format("%Y-%m-%d").to_string(),
            Err(e) => {
                warn!(event_id = %event.id, commence_time = %event.commence_time, error = %e, "Skipping event");
                continue;
            }
        };

        for bookmaker in &event.bookmakers {
            let mut line = OddsLine {
                season,
                week,
                game_date: game_date.clone(),
                home_team: team_abbreviation(&event.home_team),
                away_team: team_abbreviation(&event.away_team),
                sportsbook: bookmaker.title.clone(),
                spread_home: None,
                spread_away: None,
                moneyline_home: None,
                moneyline_away: None,
                over_under: None,
                timestamp: timestamp.to_string(),
                is_opening: kind.is_opening,
                is_closing: kind.is_closing,
            };

            for market in &bookmaker.markets {
                for outcome in &market.outcomes {
                    let home = outcome.name == event.home_team;
                    let away = outcome.name == event.away_team;
                    match market.key.as_str() {
                        "spreads" if home => line.spread_home = outcome.point,
                        "spreads" if away => line.spread_away = outcome.point,
                        "h2h" if home => line.moneyline_home = outcome.price.map(|p| p.round() as i64),
                        "h2h" if away => line.moneyline_away = outcome.price.map(|p| p.round() as i64),
                        "totals" if outcome.name == "Over" => line.over_under = outcome.point,
                        _ => {}
                    }
                }
            }

            lines.push(line);
        }
    }

    lines
}

/// Validate and store lines; lines already stored under the same key are
/// returned as they exist.
pub fn store_lines(db: &Database, lines: &[OddsLine]) -> Result<Vec<StoredRecord>> {
    let rows: Vec<ExtractedRow> = lines.iter().map(OddsLine::to_row).collect();
    let (typed, _) = validate_rows(&ODDS_SCHEMA, &rows, ValidationPolicy::FailFast)?;
    db.insert_or_skip(&ODDS_SCHEMA, &typed)
}

/// Most recent closing line for `team` in a week. `sportsbook` of
/// `consensus` (or none) matches any book.
pub fn closing_line(
    db: &Database,
    season: i32,
    week: i32,
    team: &str,
    sportsbook: Option<&str>,
) -> Result<Option<ClosingLine>> {
    let book = sportsbook.filter(|b| !b.eq_ignore_ascii_case(CONSENSUS));
    match db.latest_closing_line(season, week, team, book)? {
        Some(record) => Ok(Some(serde_json::from_value(serde_json::Value::Object(record.fields))?)),
        None => Ok(None),
    }
}

#[derive(Clone)]
pub struct OddsClient {
    http: reqwest::Client,
    config: OddsConfig,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl OddsClient {
    pub fn new(config: OddsConfig, retry: RetryPolicy, sleeper: Arc<dyn Sleeper>, timeout_secs: u64) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ScraperError::Config("ODDS_API_KEY is not configured".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            config,
            retry,
            sleeper,
        })
    }

    fn odds_url(&self) -> String {
        format!(
            "{}/v4/sports/{}/odds",
            self.config.base_url.trim_end_matches('/'),
            self.config.sport
        )
    }

    async fn get_events(&self, url: &str) -> Result<Vec<OddsEvent>> {
        let response = self
            .http
            .get(url)
            .query(&[
                ("apiKey", self.config.api_key.as_str()),
                ("regions", "us"),
                ("markets", "h2h,spreads,totals"),
                ("oddsFormat", "american"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(ScraperError::Fetch {
                url: url.to_string(),
                message: format!("HTTP {status}"),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScraperError::Api {
                message: format!("HTTP {status}: {body}"),
            });
        }

        Ok(response.json::<Vec<OddsEvent>>().await?)
    }

    /// Current odds for every listed game, retried like a page fetch.
    pub async fn fetch_events(&self) -> Result<Vec<OddsEvent>> {
        let url = self.odds_url();
        let events = retry_with_backoff(&self.retry, self.sleeper.as_ref(), &url, || self.get_events(&url)).await?;
        info!(events = events.len(), "Fetched odds");
        Ok(events)
    }

    pub async fn fetch_and_store(&self, db: &Database, season: i32, week: i32, kind: LineKind) -> Result<Vec<StoredRecord>> {
        let events = self.fetch_events().await?;
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let lines = parse_events(&events, season, week, kind, &timestamp);
        let stored = store_lines(db, &lines)?;
        info!(season, week, lines = stored.len(), "Stored odds");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RecordingSleeper;
    use axum::{routing::get, Json, Router};
    use std::net::SocketAddr;

    const EVENTS: &str = r#"[
      {
        "id": "evt1",
        "sport_key": "americanfootball_nfl",
        "commence_time": "2023-09-08T00:20:00Z",
        "home_team": "Kansas City Chiefs",
        "away_team": "Detroit Lions",
        "bookmakers": [
          {
            "key": "draftkings",
            "title": "DraftKings",
            "last_update": "2023-09-07T20:00:00Z",
            "markets": [
              {"key": "h2h", "outcomes": [
                {"name": "Kansas City Chiefs", "price": -198},
                {"name": "Detroit Lions", "price": 164}
              ]},
              {"key": "spreads", "outcomes": [
                {"name": "Kansas City Chiefs", "price": -110, "point": -4.5},
                {"name": "Detroit Lions", "price": -110, "point": 4.5}
              ]},
              {"key": "totals", "outcomes": [
                {"name": "Over", "price": -110, "point": 53.5},
                {"name": "Under", "price": -110, "point": 53.5}
              ]}
            ]
          },
          {"key": "fanduel", "title": "FanDuel", "markets": []}
        ]
      },
      {"id": "bad", "commence_time": "soon", "home_team": "A", "away_team": "B", "bookmakers": []}
    ]"#;

    fn events() -> Vec<OddsEvent> {
        serde_json::from_str(EVENTS).unwrap()
    }

    #[test]
    fn test_team_abbreviation() {
        assert_eq!(team_abbreviation("Kansas City Chiefs"), "KC");
        assert_eq!(team_abbreviation("san francisco 49ers"), "SF");
        assert_eq!(team_abbreviation("Springfield Atoms"), "SPR");
        assert_eq!(TEAM_ABBREVIATIONS.len(), 32);
    }

    #[test]
    fn test_parse_events_one_line_per_bookmaker() {
        let kind = LineKind {
            is_opening: false,
            is_closing: true,
        };
        let lines = parse_events(&events(), 2023, 1, kind, "2023-09-07T21:00:00Z");
        assert_eq!(lines.len(), 2);

        let dk = &lines[0];
        assert_eq!(dk.game_date, "2023-09-08");
        assert_eq!(dk.home_team, "KC");
        assert_eq!(dk.away_team, "DET");
        assert_eq!(dk.spread_home, Some(-4.5));
        assert_eq!(dk.spread_away, Some(4.5));
        assert_eq!(dk.moneyline_home, Some(-198));
        assert_eq!(dk.moneyline_away, Some(164));
        assert_eq!(dk.over_under, Some(53.5));
        assert!(dk.is_closing);

        assert_eq!(lines[1].sportsbook, "FanDuel");
        assert_eq!(lines[1].spread_home, None);
    }

    #[test]
    fn test_store_and_closing_line() {
        let db = Database::open_in_memory().unwrap();
        let closing = LineKind {
            is_opening: false,
            is_closing: true,
        };
        let early = parse_events(&events(), 2023, 1, closing, "2023-09-07T12:00:00Z");
        let late = parse_events(&events(), 2023, 1, closing, "2023-09-07T23:00:00Z");

        assert_eq!(store_lines(&db, &early).unwrap().len(), 2);
        let again = store_lines(&db, &early).unwrap();
        assert_eq!(again.len(), 2);
        store_lines(&db, &late).unwrap();

        let line = closing_line(&db, 2023, 1, "det", Some(CONSENSUS)).unwrap().unwrap();
        assert_eq!(line.timestamp, "2023-09-07T23:00:00Z");

        let dk = closing_line(&db, 2023, 1, "KC", Some("draftkings")).unwrap().unwrap();
        assert_eq!(dk.sportsbook, "DraftKings");
        assert_eq!(dk.over_under, Some(53.5));

        assert!(closing_line(&db, 2023, 2, "KC", None).unwrap().is_none());
        assert!(closing_line(&db, 2023, 1, "KC", Some("Caesars")).unwrap().is_none());
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let policy = RetryPolicy::new(1, vec![]).unwrap();
        let result = OddsClient::new(OddsConfig::default(), policy, Arc::new(RecordingSleeper::new()), 5);
        assert!(matches!(result, Err(ScraperError::Config(_))));
    }

    #[tokio::test]
    async fn test_fetch_and_store_against_local_api() {
        let app = Router::new().route(
            "/v4/sports/americanfootball_nfl/odds",
            get(|| async { Json(serde_json::from_str::<serde_json::Value>(EVENTS).unwrap()) }),
        );
        let server = hyper::Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(app.into_make_service());
        let addr = server.local_addr();
        tokio::spawn(server);

        let config = OddsConfig {
            api_key: "test-key".into(),
            base_url: format!("http://{addr}"),
            ..OddsConfig::default()
        };
        let policy = RetryPolicy::new(2, vec![1]).unwrap();
        let client = OddsClient::new(config, policy, Arc::new(RecordingSleeper::new()), 5).unwrap();
        let db = Database::open_in_memory().unwrap();

        let stored = client
            .fetch_and_store(&db, 2023, 1, LineKind::default())
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].get("home_team"), Some(&serde_json::Value::from("KC")));
    }
}
