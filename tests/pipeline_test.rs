use anyhow::Result;
use async_trait::async_trait;
use nfl_stats::categories::StatCategory;
use nfl_stats::db::Database;
use nfl_stats::error::ScraperError;
use nfl_stats::fetch::PageFetcher;
use nfl_stats::pipeline::{StatsScraper, TableScrapeEntry};
use nfl_stats::retry::{RecordingSleeper, RetryPolicy};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Replays scripted responses, then keeps serving `fallback`.
struct ScriptedFetcher {
    script: Mutex<VecDeque<std::result::Result<String, ScraperError>>>,
    fallback: Option<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedFetcher {
    fn serving(html: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(html.to_string()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn failing_then(failures: usize, html: Option<&str>) -> Self {
        let script = (0..failures)
            .map(|i| {
                Err(ScraperError::Fetch {
                    url: "scripted".into(),
                    message: format!("timeout #{}", i + 1),
                })
            })
            .collect();
        Self {
            script: Mutex::new(script),
            fallback: html.map(str::to_string),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> nfl_stats::Result<String> {
        self.calls.lock().await.push(url.to_string());
        if let Some(next) = self.script.lock().await.pop_front() {
            return next;
        }
        self.fallback.clone().ok_or_else(|| ScraperError::Fetch {
            url: url.to_string(),
            message: "connection refused".into(),
        })
    }
}

struct Harness {
    scraper: StatsScraper,
    db: Arc<Database>,
    sleeper: Arc<RecordingSleeper>,
    calls: Arc<Mutex<Vec<String>>>,
}

fn harness(fetcher: ScriptedFetcher) -> Harness {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let sleeper = Arc::new(RecordingSleeper::new());
    let calls = fetcher.calls.clone();
    let scraper = StatsScraper::new(
        Arc::new(fetcher),
        db.clone(),
        RetryPolicy::new(3, vec![30, 60, 120]).unwrap(),
        sleeper.clone(),
    );
    Harness {
        scraper,
        db,
        sleeper,
        calls,
    }
}

const PASSING_PAGE: &str = r#"<html><head><title>2023 NFL Passing</title></head><body>
<div id="all_passing">
<table id="passing">
  <thead><tr><th data-stat="ranker">Rk</th><th data-stat="player">Player</th><th data-stat="team">Tm</th><th data-stat="pass_att">Att</th><th data-stat="pass_cmp_perc">Cmp%</th></tr></thead>
  <tbody>
    <tr><th data-stat="ranker">1</th><td data-stat="player"><a href="/players/D/DoeJa00.htm">Jane Doe</a>*+</td><td data-stat="team">KAN</td><td data-stat="pass_att">597</td><td data-stat="pass_cmp_perc">67.2</td><td data-stat="pass_fake">9</td></tr>
    <tr class="thead"><th data-stat="ranker">Rk</th><td data-stat="player">Player</td><td data-stat="team">Tm</td><td data-stat="pass_att">Att</td></tr>
    <tr><th data-stat="ranker">2</th><td data-stat="player">John Roe</td><td data-stat="team">BUF</td><td data-stat="pass_att">579</td><td data-stat="pass_cmp_perc"></td></tr>
  </tbody>
</table>
</div>
</body></html>"#;

#[tokio::test]
async fn test_passing_scrape_end_to_end() -> Result<()> {
    let h = harness(ScriptedFetcher::serving(PASSING_PAGE));

    let stored = h.scraper.scrape_category(StatCategory::PassingStats, 2023).await?;

    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|r| r.get("season") == Some(&Value::from(2023))));
    assert_eq!(stored[0].get("player_name"), Some(&Value::from("Jane Doe")));
    assert_eq!(stored[0].get("att"), Some(&Value::from(597)));
    assert_eq!(stored[0].get("cmp_pct"), Some(&Value::from(67.2)));
    assert_eq!(stored[1].get("cmp_pct"), Some(&Value::Null));
    assert!(stored[0].get("pass_fake").is_none());

    assert_eq!(
        *h.calls.lock().await,
        vec!["https://www.pro-football-reference.com/years/2023/passing.htm".to_string()]
    );
    assert!(h.sleeper.recorded_secs().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_second_scrape_of_same_season_is_duplicate() -> Result<()> {
    let h = harness(ScriptedFetcher::serving(PASSING_PAGE));
    h.scraper.scrape_category(StatCategory::PassingStats, 2023).await?;

    let err = h
        .scraper
        .scrape_category(StatCategory::PassingStats, 2023)
        .await
        .unwrap_err();
    assert!(matches!(err, ScraperError::DuplicateRecord { .. }));
    assert_eq!(err.stage(), "persist");

    let schema = &StatCategory::PassingStats.spec().schema;
    assert_eq!(h.db.count_by_season(schema, 2023)?, 2);
    Ok(())
}

#[tokio::test]
async fn test_missing_table_is_not_retried() {
    let h = harness(ScriptedFetcher::serving("<html><body><p>Nothing</p></body></html>"));

    let err = h
        .scraper
        .scrape_category(StatCategory::RushingStats, 2023)
        .await
        .unwrap_err();

    assert!(matches!(err, ScraperError::TableNotFound { ref table_id, .. } if table_id == "rushing"));
    assert_eq!(h.calls.lock().await.len(), 1);
    assert!(h.sleeper.recorded_secs().await.is_empty());
}

#[tokio::test]
async fn test_transient_failures_are_retried() -> Result<()> {
    let h = harness(ScriptedFetcher::failing_then(2, Some(PASSING_PAGE)));

    let stored = h.scraper.scrape_category(StatCategory::PassingStats, 2023).await?;

    assert_eq!(stored.len(), 2);
    assert_eq!(h.calls.lock().await.len(), 3);
    assert_eq!(h.sleeper.recorded_secs().await, vec![30, 60]);
    Ok(())
}

#[tokio::test]
async fn test_persistent_failure_exhausts_retries() {
    let h = harness(ScriptedFetcher::failing_then(0, None));

    let err = h
        .scraper
        .scrape_category(StatCategory::PassingStats, 2023)
        .await
        .unwrap_err();

    assert_eq!(err.attempts(), Some(3));
    assert_eq!(err.stage(), "fetch");
    match &err {
        ScraperError::RetryExhausted { source, .. } => {
            assert!(source.to_string().contains("connection refused"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.calls.lock().await.len(), 3);
    assert_eq!(h.sleeper.recorded_secs().await, vec![30, 60]);
}

#[tokio::test]
async fn test_invalid_row_stores_nothing() {
    let page = PASSING_PAGE.replace(">67.2<", ">167.2<");
    let h = harness(ScriptedFetcher::serving(&page));

    let err = h
        .scraper
        .scrape_category(StatCategory::PassingStats, 2023)
        .await
        .unwrap_err();

    match err {
        ScraperError::Validation(v) => {
            assert_eq!(v.field, "cmp_pct");
            assert_eq!(v.row, Some(0));
        }
        other => panic!("unexpected error: {other}"),
    }
    let schema = &StatCategory::PassingStats.spec().schema;
    assert_eq!(h.db.count_by_season(schema, 2023).unwrap(), 0);
}

const STANDINGS_PAGE: &str = r#"<html><body>
<table id="AFC"><tbody>
  <tr class="thead onecell"><td data-stat="onecell" colspan="13">AFC East</td></tr>
  <tr><th data-stat="team"><a href="/teams/mia/2023.htm">Miami Dolphins</a>*</th><td data-stat="wins">11</td><td data-stat="losses">6</td><td data-stat="win_loss_perc">.647</td><td data-stat="points_diff">-12</td></tr>
  <tr><th data-stat="team">Buffalo Bills+</th><td data-stat="wins">11</td><td data-stat="losses">6</td><td data-stat="win_loss_perc">.647</td><td data-stat="points_diff">140</td></tr>
</tbody></table>
</body></html>"#;

#[tokio::test]
async fn test_standings_with_one_conference_missing() -> Result<()> {
    let h = harness(ScriptedFetcher::serving(STANDINGS_PAGE));

    let stored = h.scraper.scrape_category(StatCategory::Standings, 2023).await?;

    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].get("tm"), Some(&Value::from("Miami Dolphins")));
    assert_eq!(stored[1].get("tm"), Some(&Value::from("Buffalo Bills")));
    assert_eq!(stored[0].get("pd"), Some(&Value::from(-12)));
    Ok(())
}

const MISC_PAGE: &str = r#"<html><body>
<table id="team_conversions">
  <thead><tr><th>Tm</th><th>3DAtt</th><th>3D%</th></tr></thead>
  <tbody>
    <tr><td>Kansas City Chiefs</td><td>210</td><td>43.8</td></tr>
    <tr><td>Buffalo Bills</td><td>199</td><td>46.2</td></tr>
  </tbody>
</table>
<div id="all_drives"><!--
<table id="drives"><caption>Drive Averages</caption>
  <thead><tr><th data-stat="team">Tm</th><th data-stat="drives">#Dr</th></tr></thead>
  <tbody><tr><td data-stat="team">Kansas City Chiefs</td><td data-stat="drives">185</td></tr></tbody>
</table>
--></div>
</body></html>"#;

#[tokio::test]
async fn test_table_batch_is_idempotent() -> Result<()> {
    let h = harness(ScriptedFetcher::serving(MISC_PAGE));
    let url = "https://www.pro-football-reference.com/years/2023/#team_conversions";
    let entries = vec![TableScrapeEntry {
        url: url.to_string(),
        season: Some(2023),
        entity_type: Some("team".into()),
        table_type: None,
    }];

    let first = h.scraper.scrape_tables(&entries).await;
    assert_eq!(first.urls_success, 1);
    assert_eq!(first.tables_extracted, 2);
    assert_eq!(first.rows_inserted, 3);
    assert!(first.errors.is_empty());

    let clean = "https://www.pro-football-reference.com/years/2023/";
    assert_eq!(h.calls.lock().await[0], clean);
    let conversions = h.db.count_rows_for_source("scraped_team_conversions", clean)?;
    let drives = h.db.count_rows_for_source("scraped_drives", clean)?;
    assert_eq!((conversions, drives), (2, 1));

    let second = h.scraper.scrape_tables(&entries).await;
    assert_eq!(second.rows_inserted, 3);
    assert_eq!(h.db.count_rows_for_source("scraped_team_conversions", clean)?, conversions);
    assert_eq!(h.db.count_rows_for_source("scraped_drives", clean)?, drives);

    let tracked = h.db.scraped_metadata_for(clean)?;
    assert_eq!(tracked.len(), 4);
    assert!(tracked
        .iter()
        .any(|m| m.get("table_name") == Some(&Value::from("Drive Averages"))
            && m.get("source_type") == Some(&Value::from("comment"))));

    let columns = h.db.table_columns("scraped_team_conversions")?;
    for name in ["tm", "c_3datt", "c_3d", "source_url", "scraped_at", "season", "entity_type"] {
        assert!(columns.iter().any(|c| c.name == name), "missing column {name}");
    }
    Ok(())
}

#[tokio::test]
async fn test_table_batch_continues_past_failed_url() {
    let h = harness(ScriptedFetcher::serving("<html><body>no tables</body></html>"));
    let entries = vec![
        TableScrapeEntry::new("https://example.com/a.htm"),
        TableScrapeEntry::new("https://example.com/b.htm"),
    ];

    let summary = h.scraper.scrape_tables(&entries).await;

    assert_eq!(summary.urls_processed, 2);
    assert_eq!(summary.urls_failed, 2);
    assert_eq!(summary.errors.len(), 2);
    assert!(summary.errors[0].starts_with("https://example.com/a.htm"));
}

const DRAFT_PAGE: &str = r#"<html><body>
<table id="drafts">
  <thead><tr><th>Player</th><th>From</th><th>To</th><th>Order</th></tr></thead>
  <tbody>
    <tr><td>Jane Doe</td><td>2017</td><td>2023</td><td>10</td></tr>
    <tr><td>John Roe</td><td>2018</td><td>2023</td><td>7</td></tr>
  </tbody>
</table>
<table id="data_metadata">
  <thead><tr><th>Source</th><th>Rows</th></tr></thead>
  <tbody><tr><td>box scores</td><td>272</td></tr></tbody>
</table>
</body></html>"#;

#[tokio::test]
async fn test_table_batch_handles_keyword_headers_and_store_table_ids() -> Result<()> {
    let h = harness(ScriptedFetcher::serving(DRAFT_PAGE));
    let url = "https://example.com/draft.htm";
    let entries = vec![TableScrapeEntry::new(url)];

    let summary = h.scraper.scrape_tables(&entries).await;
    assert!(summary.errors.is_empty(), "{:?}", summary.errors);
    assert_eq!(summary.tables_extracted, 2);
    assert_eq!(summary.rows_inserted, 3);

    assert_eq!(h.db.count_rows_for_source("scraped_drafts", url)?, 2);
    let columns = h.db.table_columns("scraped_drafts")?;
    for name in ["player", "from", "to", "order"] {
        assert!(columns.iter().any(|c| c.name == name), "missing column {name}");
    }

    assert_eq!(h.db.count_rows_for_source("scraped_data_metadata_page", url)?, 1);
    let metadata_columns = h.db.table_columns("scraped_data_metadata")?;
    assert!(metadata_columns.iter().all(|c| c.name != "rows" && c.name != "source"));
    assert_eq!(h.db.scraped_metadata_for(url)?.len(), 2);
    Ok(())
}

const SCHEDULE_PAGE: &str = r#"<html><body>
<table id="games">
  <thead><tr><th data-stat="week_num">Week</th><th data-stat="game_outcome">Result</th></tr></thead>
  <tbody>
    <tr><th data-stat="week_num">1</th><td data-stat="game_day_of_week">Thu</td><td data-stat="game_date">September 7</td><td data-stat="gametime">8:20PM ET</td><td data-stat="game_outcome">L</td><td data-stat="game_location"></td><td data-stat="opp">Detroit Lions</td><td data-stat="pts_off">20</td><td data-stat="pts_def">21</td></tr>
    <tr><th data-stat="week_num">2</th><td data-stat="game_day_of_week">Sun</td><td data-stat="game_date">September 17</td><td data-stat="gametime">1:00PM ET</td><td data-stat="game_outcome">W</td><td data-stat="game_location">@</td><td data-stat="opp">Jacksonville Jaguars</td><td data-stat="pts_off">17</td><td data-stat="pts_def">9</td></tr>
    <tr><th data-stat="week_num">10</th><td data-stat="game_day_of_week"></td><td data-stat="game_date"></td><td data-stat="game_outcome"></td><td data-stat="opp">Bye Week</td></tr>
    <tr><th data-stat="week_num">Wild Card</th><td data-stat="game_day_of_week">Sat</td><td data-stat="game_date">January 13</td><td data-stat="game_outcome">W</td><td data-stat="opp">Miami Dolphins</td></tr>
  </tbody>
</table>
</body></html>"#;

#[tokio::test]
async fn test_team_gamelog_insert_or_skip() -> Result<()> {
    let h = harness(ScriptedFetcher::serving(SCHEDULE_PAGE));

    let first = h.scraper.scrape_team_gamelog("kan", 2023).await?;
    assert_eq!(first.len(), 3);
    assert_eq!(
        *h.calls.lock().await,
        vec!["https://www.pro-football-reference.com/teams/kan/2023.htm".to_string()]
    );

    let week1 = &first[0];
    assert_eq!(week1.get("team_abbr"), Some(&Value::from("KAN")));
    assert_eq!(week1.get("winner"), Some(&Value::from("Detroit Lions")));
    assert_eq!(week1.get("pts_w"), Some(&Value::from(21)));
    assert_eq!(week1.get("game_date"), Some(&Value::from("2023-09-07")));

    assert_eq!(first[1].get("winner"), Some(&Value::from("KAN")));
    assert_eq!(first[2].get("winner"), Some(&Value::Null));

    let second = h.scraper.scrape_team_gamelog("kan", 2023).await?;
    let ids = |rows: &[nfl_stats::types::StoredRecord]| rows.iter().map(|r| r.id).collect::<Vec<_>>();
    assert_eq!(ids(&first), ids(&second));
    Ok(())
}
