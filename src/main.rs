use anyhow::Context;
use clap::{Parser, Subcommand};
use nfl_stats::categories::StatCategory;
use nfl_stats::config::Config;
use nfl_stats::db::Database;
use nfl_stats::fetch::build_fetcher;
use nfl_stats::logging::init_logging;
use nfl_stats::metrics::init_metrics;
use nfl_stats::odds::{LineKind, OddsClient};
use nfl_stats::pipeline::{read_url_csv, StatsScraper};
use nfl_stats::retry::{RetryPolicy, Sleeper, TokioSleeper};
use nfl_stats::server::{start_server, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "nfl_stats")]
#[command(about = "Pro-Football-Reference stat scraper and odds collector")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape one stat category for a season
    Scrape {
        /// Category name, e.g. passing_stats (see `categories`)
        category: StatCategory,
        season: i32,
    },
    /// Scrape a team's season schedule
    Gamelog {
        /// Team abbreviation as used in site URLs, e.g. kan
        team: String,
        year: i32,
    },
    /// Scrape every table from each URL listed in a CSV (`url` column required)
    Tables { csv: PathBuf },
    /// Fetch and store current betting lines
    Odds {
        season: i32,
        week: i32,
        #[arg(long)]
        opening: bool,
        #[arg(long)]
        closing: bool,
    },
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// List the known stat categories
    Categories,
}

struct Services {
    scraper: Arc<StatsScraper>,
    db: Arc<Database>,
    odds: Option<OddsClient>,
}

fn build_services(config: &Config) -> anyhow::Result<Services> {
    let db = Arc::new(Database::open(&config.database.path).context("opening database")?);
    let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);
    let retry = RetryPolicy::from_config(&config.scrape)?;
    let fetcher = build_fetcher(&config.scrape, sleeper.clone())?;

    let odds = if config.odds.api_key.trim().is_empty() {
        None
    } else {
        Some(OddsClient::new(
            config.odds.clone(),
            retry.clone(),
            sleeper.clone(),
            config.scrape.request_timeout_seconds,
        )?)
    };

    let scraper = Arc::new(StatsScraper::new(fetcher, db.clone(), retry, sleeper));
    Ok(Services { scraper, db, odds })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load().context("loading configuration")?;
    init_logging(&config.log_level);
    init_metrics();

    if let Commands::Categories = cli.command {
        for category in StatCategory::ALL {
            println!("{:<16} {}", category.as_str(), category.url(2023));
        }
        return Ok(());
    }

    let services = build_services(&config)?;

    match cli.command {
        Commands::Scrape { category, season } => {
            let stored = services.scraper.scrape_category(category, season).await?;
            info!(category = %category, season, rows = stored.len(), "Scrape complete");
            println!("Stored {} {} rows for {}", stored.len(), category, season);
        }
        Commands::Gamelog { team, year } => {
            let stored = services.scraper.scrape_team_gamelog(&team, year).await?;
            println!("Stored {} games for {} {}", stored.len(), team.to_uppercase(), year);
        }
        Commands::Tables { csv } => {
            let entries = read_url_csv(&csv)?;
            info!(urls = entries.len(), file = %csv.display(), "Starting table batch");
            let summary = services.scraper.scrape_tables(&entries).await;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            if summary.urls_failed > 0 {
                warn!(failed = summary.urls_failed, "Some URLs failed");
            }
        }
        Commands::Odds {
            season,
            week,
            opening,
            closing,
        } => {
            let client = services
                .odds
                .as_ref()
                .context("ODDS_API_KEY is not configured")?;
            let kind = LineKind {
                is_opening: opening,
                is_closing: closing,
            };
            let stored = client.fetch_and_store(&services.db, season, week, kind).await?;
            println!("Stored {} odds lines for {} week {}", stored.len(), season, week);
        }
        Commands::Serve { port } => {
            let state = AppState {
                scraper: services.scraper,
                db: services.db,
                odds: services.odds,
            };
            let port = port.unwrap_or(config.server.port);
            if let Err(e) = start_server(state, &config.server.host, port).await {
                error!(error = %e, "Server stopped");
                return Err(e);
            }
        }
        Commands::Categories => {}
    }

    Ok(())
}
