use crate::categories::StatCategory;
use crate::db::{Database, ListQuery};
use crate::error::ScraperError;
use crate::metrics;
use crate::odds::{self, LineKind, OddsClient};
use crate::pipeline::{StatsScraper, TableScrapeEntry};
use axum::{
    extract::{Path, Query},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Extension, Router,
};
use hyper::Server;
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<StatsScraper>,
    pub db: Arc<Database>,
    pub odds: Option<OddsClient>,
}

/// JSON error body naming the failing stage.
pub struct ApiError {
    status: StatusCode,
    body: Value,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: json!({ "stage": "query", "error": message.into() }),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: json!({ "stage": "query", "error": message.into() }),
        }
    }
}

impl From<ScraperError> for ApiError {
    fn from(err: ScraperError) -> Self {
        let status = match (&err, err.stage()) {
            (ScraperError::DuplicateRecord { .. }, _) => StatusCode::CONFLICT,
            (ScraperError::UnknownCategory(_), _) => StatusCode::NOT_FOUND,
            (_, "fetch") => StatusCode::BAD_GATEWAY,
            (_, "parse") | (_, "validate") => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(stage = err.stage(), error = %err, "Request failed");
        }

        let mut body = json!({ "stage": err.stage(), "error": err.to_string() });
        if let Some(attempts) = err.attempts() {
            body["attempts"] = json!(attempts);
        }
        Self { status, body }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub sort: Option<String>,
    pub order: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl From<ListParams> for ListQuery {
    fn from(p: ListParams) -> Self {
        ListQuery {
            sort: p.sort,
            descending: p.order.as_deref().is_some_and(|o| o.eq_ignore_ascii_case("desc")),
            limit: p.limit,
            offset: p.offset,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WeekParams {
    pub week: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct PlayerParams {
    pub name: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OddsParams {
    #[serde(default)]
    pub opening: bool,
    #[serde(default)]
    pub closing: bool,
}

#[derive(Debug, Deserialize)]
pub struct ClosingParams {
    pub sportsbook: Option<String>,
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "nfl-stats",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn metrics_handler() -> impl IntoResponse {
    match metrics::render() {
        Some(body) => (StatusCode::OK, body),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed".to_string()),
    }
}

async fn list_categories() -> impl IntoResponse {
    let categories: Vec<Value> = StatCategory::ALL
        .iter()
        .map(|c| json!({ "name": c.as_str(), "player": c.is_player(), "url_path": c.spec().url_path }))
        .collect();
    Json(json!({ "categories": categories }))
}

fn listing(db: &Database, category: StatCategory, season: i32, params: ListParams) -> ApiResult {
    let schema = &category.spec().schema;
    let query = ListQuery::from(params);
    let records = db.list_by_season(schema, season, &query)?;
    let total = db.count_by_season(schema, season)?;
    Ok(Json(json!({
        "category": category.as_str(),
        "season": season,
        "total": total,
        "records": records,
    })))
}

async fn list_teams(
    Extension(state): Extension<AppState>,
    Path(season): Path<i32>,
    Query(params): Query<ListParams>,
) -> ApiResult {
    listing(&state.db, StatCategory::TeamOffense, season, params)
}

async fn get_team(
    Extension(state): Extension<AppState>,
    Path((season, team)): Path<(i32, String)>,
) -> ApiResult {
    let offense = state
        .db
        .find_team(&StatCategory::TeamOffense.spec().schema, season, &team)?;
    let defense = state
        .db
        .find_team(&StatCategory::TeamDefense.spec().schema, season, &team)?;
    if offense.is_none() && defense.is_none() {
        return Err(ApiError::not_found(format!("no stats for team '{team}' in {season}")));
    }
    Ok(Json(json!({ "season": season, "team": team, "offense": offense, "defense": defense })))
}

async fn list_standings(
    Extension(state): Extension<AppState>,
    Path(season): Path<i32>,
    Query(params): Query<ListParams>,
) -> ApiResult {
    listing(&state.db, StatCategory::Standings, season, params)
}

async fn list_games(
    Extension(state): Extension<AppState>,
    Path(season): Path<i32>,
    Query(params): Query<WeekParams>,
) -> ApiResult {
    let games = state
        .db
        .list_games(&StatCategory::Games.spec().schema, season, params.week)?;
    Ok(Json(json!({ "season": season, "week": params.week, "games": games })))
}

async fn search_players(
    Extension(state): Extension<AppState>,
    Path(season): Path<i32>,
    Query(params): Query<PlayerParams>,
) -> ApiResult {
    let name = params
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("query parameter 'name' is required"))?;
    let limit = params.limit.unwrap_or(25);

    let mut results = serde_json::Map::new();
    for category in [
        StatCategory::PassingStats,
        StatCategory::RushingStats,
        StatCategory::ReceivingStats,
    ] {
        let found = state
            .db
            .search_players(&category.spec().schema, season, &name, limit)?;
        results.insert(category.as_str().to_string(), json!(found));
    }
    Ok(Json(json!({ "season": season, "name": name, "results": results })))
}

async fn list_records(
    Extension(state): Extension<AppState>,
    Path((category, season)): Path<(String, i32)>,
    Query(params): Query<ListParams>,
) -> ApiResult {
    let category: StatCategory = category.parse()?;
    listing(&state.db, category, season, params)
}

async fn scrape_category(
    Extension(state): Extension<AppState>,
    Path((stat_type, season)): Path<(String, i32)>,
) -> ApiResult {
    let category: StatCategory = stat_type.parse()?;
    let stored = state.scraper.scrape_category(category, season).await?;
    Ok(Json(json!({
        "category": category.as_str(),
        "season": season,
        "stored": stored.len(),
        "records": stored,
    })))
}

async fn scrape_gamelog(
    Extension(state): Extension<AppState>,
    Path((team, year)): Path<(String, i32)>,
) -> ApiResult {
    let stored = state.scraper.scrape_team_gamelog(&team, year).await?;
    Ok(Json(json!({ "team": team, "year": year, "games": stored })))
}

async fn scrape_tables(
    Extension(state): Extension<AppState>,
    Json(entries): Json<Vec<TableScrapeEntry>>,
) -> ApiResult {
    let summary = state.scraper.scrape_tables(&entries).await;
    Ok(Json(json!(summary)))
}

fn odds_client(state: &AppState) -> Result<&OddsClient, ApiError> {
    state
        .odds
        .as_ref()
        .ok_or_else(|| ApiError::from(ScraperError::Config("ODDS_API_KEY is not configured".to_string())))
}

async fn fetch_odds(
    Extension(state): Extension<AppState>,
    Path((season, week)): Path<(i32, i32)>,
    Query(params): Query<OddsParams>,
) -> ApiResult {
    let client = odds_client(&state)?;
    let kind = LineKind {
        is_opening: params.opening,
        is_closing: params.closing,
    };
    let stored = client.fetch_and_store(&state.db, season, week, kind).await?;
    Ok(Json(json!({ "season": season, "week": week, "stored": stored.len(), "ids": stored.iter().map(|r| r.id).collect::<Vec<_>>() })))
}

async fn closing_line(
    Extension(state): Extension<AppState>,
    Path((season, week, team)): Path<(i32, i32, String)>,
    Query(params): Query<ClosingParams>,
) -> ApiResult {
    match odds::closing_line(&state.db, season, week, &team, params.sportsbook.as_deref())? {
        Some(line) => Ok(Json(json!(line))),
        None => Err(ApiError::not_found(format!(
            "no closing line for {team} in {season} week {week}"
        ))),
    }
}

/// Create the HTTP router with all routes.
pub fn create_server(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .route("/categories", get(list_categories))
        // Queries
        .route("/teams/:season", get(list_teams))
        .route("/teams/:season/:team", get(get_team))
        .route("/standings/:season", get(list_standings))
        .route("/games/:season", get(list_games))
        .route("/players/:season", get(search_players))
        .route("/records/:category/:season", get(list_records))
        // Scrape triggers
        .route("/scrape/tables", post(scrape_tables))
        .route("/scrape/:stat_type/:season", get(scrape_category))
        .route("/gamelog/:team/:year", get(scrape_gamelog))
        .route("/odds/:season/:week", post(fetch_odds))
        .route("/odds/:season/:week/:team/closing", get(closing_line))
        .layer(Extension(state))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
}

/// Start the HTTP server on `host:port`.
pub async fn start_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_server(state);
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    info!(%addr, "HTTP server listening");
    info!("Health check: http://{addr}/health");

    Server::bind(&addr).serve(app.into_make_service()).await?;
    Ok(())
}
