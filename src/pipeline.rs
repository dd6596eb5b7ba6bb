//! Fetch, locate, extract, validate and persist, per category, per team and
//! per ad-hoc URL.

use crate::categories::{CategorySpec, StatCategory};
use crate::constants::team_season_url;
use crate::db::{is_reserved_table, Database, ScrapedTableMeta};
use crate::error::{Result, ScraperError};
use crate::fetch::{strip_fragment, PageFetcher};
use crate::gamelog::{to_game_record, GAMELOG_COLUMNS, GAMELOG_TABLE_ID, TEAM_GAME_SCHEMA};
use crate::metrics::ScrapeMetrics;
use crate::parser::{extract_generic_rows, extract_rows, find_all_tables, find_table, LocatedTable};
use crate::retry::{retry_with_backoff, RetryPolicy, Sleeper};
use crate::schema::{infer_columns, sanitize_identifier};
use crate::types::{ExtractContext, ExtractedRow, StoredRecord};
use crate::validate::{validate_rows, ValidationPolicy};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// One URL of an ad-hoc table batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableScrapeEntry {
    pub url: String,
    #[serde(default)]
    pub season: Option<i32>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub table_type: Option<String>,
}

impl TableScrapeEntry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            season: None,
            entity_type: None,
            table_type: None,
        }
    }
}

/// Outcome of a best-effort table batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub urls_processed: usize,
    pub urls_success: usize,
    pub urls_failed: usize,
    pub tables_extracted: usize,
    pub rows_inserted: usize,
    pub errors: Vec<String>,
}

/// Read batch entries from a CSV with a `url` column and optional
/// `season`, `entity_type`, `table_type` columns.
pub fn read_url_csv(path: impl AsRef<Path>) -> Result<Vec<TableScrapeEntry>> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let has_url = reader.headers()?.iter().any(|h| h.trim() == "url");
    if !has_url {
        return Err(ScraperError::Config(format!(
            "{} has no 'url' column",
            path.as_ref().display()
        )));
    }

    let mut entries = Vec::new();
    for record in reader.deserialize::<TableScrapeEntry>() {
        let entry = record?;
        if !entry.url.trim().is_empty() {
            entries.push(entry);
        }
    }
    Ok(entries)
}

/// Locate and extract every table a category reads from one page.
///
/// The first table id is required; later ids (the second conference of the
/// standings page) are skipped with a warning when absent.
pub fn extract_category(
    spec: &CategorySpec,
    html: &str,
    url: &str,
    season: i32,
) -> Result<Vec<ExtractedRow>> {
    let context = ExtractContext::season(season);
    let mut rows = Vec::new();

    for (idx, table_id) in spec.table_ids.iter().enumerate() {
        match find_table(html, table_id) {
            Some(table) => {
                debug!(table_id, source = table.source.as_str(), "Located table");
                rows.extend(extract_rows(&table, &spec.columns, &context));
            }
            None if idx == 0 => {
                ScrapeMetrics::record_table_not_found();
                return Err(ScraperError::TableNotFound {
                    table_id: table_id.to_string(),
                    url: url.to_string(),
                });
            }
            None => {
                ScrapeMetrics::record_table_not_found();
                warn!(table_id, url, "Optional table missing, skipping");
            }
        }
    }

    Ok(rows)
}

pub struct StatsScraper {
    fetcher: Arc<dyn PageFetcher>,
    db: Arc<Database>,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl StatsScraper {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        db: Arc<Database>,
        retry: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            fetcher,
            db,
            retry,
            sleeper,
        }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<String> {
        let url = strip_fragment(url);
        retry_with_backoff(&self.retry, self.sleeper.as_ref(), url, || self.fetcher.fetch(url)).await
    }

    /// Scrape one category for one season and append its rows.
    ///
    /// All-or-nothing: a bad row or a duplicate key stores nothing.
    pub async fn scrape_category(&self, category: StatCategory, season: i32) -> Result<Vec<StoredRecord>> {
        let span = info_span!(
            "scrape_category",
            scrape_id = %Uuid::new_v4(),
            category = %category,
            season
        );
        self.run_category(category, season).instrument(span).await
    }

    async fn run_category(&self, category: StatCategory, season: i32) -> Result<Vec<StoredRecord>> {
        let spec = category.spec();
        let url = category.url(season);
        info!(url = %url, "Scraping category");

        let html = self.fetch_with_retry(&url).await?;
        let rows = extract_category(spec, &html, &url, season)?;
        ScrapeMetrics::record_rows_extracted(spec.schema.table, rows.len());

        let (typed, _) = validate_rows(&spec.schema, &rows, ValidationPolicy::FailFast)?;
        let stored = self.db.insert_records(&spec.schema, &typed)?;
        ScrapeMetrics::record_rows_persisted(spec.schema.table, stored.len());

        info!(rows = stored.len(), "Category stored");
        Ok(stored)
    }

    /// Scrape a team's season schedule. Rows already stored for the same
    /// (team, season, week) are returned unchanged.
    pub async fn scrape_team_gamelog(&self, team: &str, year: i32) -> Result<Vec<StoredRecord>> {
        let span = info_span!(
            "scrape_team_gamelog",
            scrape_id = %Uuid::new_v4(),
            team = %team,
            year
        );
        self.run_gamelog(team, year).instrument(span).await
    }

    async fn run_gamelog(&self, team: &str, year: i32) -> Result<Vec<StoredRecord>> {
        let url = team_season_url(team, year);
        let html = self.fetch_with_retry(&url).await?;

        let table = find_table(&html, GAMELOG_TABLE_ID).ok_or_else(|| {
            ScrapeMetrics::record_table_not_found();
            ScraperError::TableNotFound {
                table_id: GAMELOG_TABLE_ID.to_string(),
                url: url.clone(),
            }
        })?;

        let context = ExtractContext::season(year).with_team(team.to_uppercase());
        let games: Vec<ExtractedRow> = extract_rows(&table, &GAMELOG_COLUMNS, &context)
            .iter()
            .map(|row| to_game_record(row, team, year))
            .collect();
        ScrapeMetrics::record_rows_extracted(TEAM_GAME_SCHEMA.table, games.len());

        let (typed, rejected) = validate_rows(&TEAM_GAME_SCHEMA, &games, ValidationPolicy::SkipInvalid)?;
        if !rejected.is_empty() {
            warn!(rejected = rejected.len(), "Dropped invalid schedule rows");
        }

        let stored = self.db.insert_or_skip(&TEAM_GAME_SCHEMA, &typed)?;
        ScrapeMetrics::record_rows_persisted(TEAM_GAME_SCHEMA.table, stored.len());
        info!(games = stored.len(), "Game log stored");
        Ok(stored)
    }

    /// Scrape every table on each URL into `scraped_<table_id>`, replacing
    /// rows from earlier runs of the same URL. Failures are recorded per URL
    /// and per table; the batch always completes.
    pub async fn scrape_tables(&self, entries: &[TableScrapeEntry]) -> BatchSummary {
        let span = info_span!("scrape_tables", scrape_id = %Uuid::new_v4(), urls = entries.len());
        async {
            let mut summary = BatchSummary::default();
            for entry in entries {
                summary.urls_processed += 1;
                match self.scrape_url_tables(entry, &mut summary).await {
                    Ok(()) => summary.urls_success += 1,
                    Err(e) => {
                        warn!(url = %entry.url, stage = e.stage(), error = %e, "URL failed");
                        summary.urls_failed += 1;
                        summary.errors.push(format!("{}: {e}", entry.url));
                    }
                }
            }
            info!(
                urls_success = summary.urls_success,
                urls_failed = summary.urls_failed,
                tables = summary.tables_extracted,
                rows = summary.rows_inserted,
                "Table batch finished"
            );
            summary
        }
        .instrument(span)
        .await
    }

    async fn scrape_url_tables(&self, entry: &TableScrapeEntry, summary: &mut BatchSummary) -> Result<()> {
        let url = strip_fragment(&entry.url).to_string();
        let html = self.fetch_with_retry(&url).await?;

        let tables = find_all_tables(&html);
        if tables.is_empty() {
            ScrapeMetrics::record_table_not_found();
            return Err(ScraperError::TableNotFound {
                table_id: "*".to_string(),
                url,
            });
        }

        let scraped_at = Utc::now().to_rfc3339();
        let mut seen = HashSet::new();
        for (idx, table) in tables.iter().enumerate() {
            let table_id = sanitize_identifier(table.id.as_deref().unwrap_or(&format!("table_{idx}")));
            if !seen.insert(table_id.clone()) {
                debug!(table_id = %table_id, "Table already stored for this URL");
                continue;
            }

            match self.store_table(entry, &url, &table_id, table, &scraped_at) {
                Ok(0) => debug!(table_id = %table_id, "Table has no data rows"),
                Ok(rows) => {
                    summary.tables_extracted += 1;
                    summary.rows_inserted += rows;
                }
                Err(e) => {
                    warn!(url = %url, table_id = %table_id, error = %e, "Table failed");
                    summary.errors.push(format!("{url} [{table_id}]: {e}"));
                }
            }
        }
        Ok(())
    }

    fn store_table(
        &self,
        entry: &TableScrapeEntry,
        url: &str,
        table_id: &str,
        table: &LocatedTable,
        scraped_at: &str,
    ) -> Result<usize> {
        let mut rows = extract_generic_rows(table);
        if rows.is_empty() {
            return Ok(0);
        }

        for row in &mut rows {
            row.set("source_url", url);
            row.set("scraped_at", scraped_at);
            if let Some(season) = entry.season {
                row.set("season", season);
            }
            if let Some(entity_type) = &entry.entity_type {
                row.set("entity_type", entity_type.as_str());
            }
            if let Some(table_type) = &entry.table_type {
                row.set("table_type", table_type.as_str());
            }
        }

        let table_name = dynamic_table_name(table_id);
        self.db.ensure_dynamic_table(&table_name, &infer_columns(&rows))?;
        let inserted = self.db.replace_rows_for_source(&table_name, url, &rows)?;

        self.db.track_scraped(&ScrapedTableMeta {
            source_url: url.to_string(),
            table_id: table_id.to_string(),
            table_name: table.display_name().unwrap_or_else(|| table_id.to_string()),
            scraped_at: scraped_at.to_string(),
            season: entry.season,
            entity_type: entry.entity_type.clone(),
            table_type: entry.table_type.clone(),
            rows_scraped: inserted,
            source_type: table.source.as_str().to_string(),
        })?;

        ScrapeMetrics::record_rows_persisted(&table_name, inserted);
        info!(table = %table_name, rows = inserted, source = table.source.as_str(), "Stored table");
        Ok(inserted)
    }
}

/// Store table for a page table id. Ids that would land on one of the
/// store's own tables get a `_page` suffix.
fn dynamic_table_name(table_id: &str) -> String {
    let name = sanitize_identifier(&format!("scraped_{table_id}"));
    if is_reserved_table(&name) {
        format!("{name}_page")
    } else {
        name
    }
}
