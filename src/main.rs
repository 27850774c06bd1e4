use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use wastewatch::analytics::anomaly::DEFAULT_MULTIPLIER;
use wastewatch::analytics::stats::Granularity;
use wastewatch::analytics::AnalyticsService;
use wastewatch::classify::engine::{ClassificationEngine, EngineCell};
use wastewatch::config::{self, Config, LogFormat};
use wastewatch::db::models::{parse_timestamp, IncidentFilter, IncidentUpdate, NewIncident, TimeWindow};
use wastewatch::db::{self, IncidentStore, SqliteStore};
use wastewatch::embedding::onnx::SentenceEmbedder;
use wastewatch::embedding::traits::TextEncoder;
use wastewatch::output::{self, terminal};
use wastewatch::pipeline::{self, duplicates, IncidentPipeline};
use wastewatch::similarity::{SimilarMatch, DEFAULT_LIMIT};
use wastewatch::text::keywords::{KeywordExtractor, DEFAULT_TOP_N};

/// Process-wide classification engine, initialized on first use.
static ENGINE: EngineCell = EngineCell::new();

/// Wastewatch: waste incident classification, duplicate detection and
/// trend analytics.
///
/// Classifies free-text incident reports into waste categories with a local
/// sentence encoder, links likely duplicates, and summarizes trends,
/// spikes and location hotspots.
#[derive(Parser)]
#[command(name = "wastewatch", version, about)]
struct Cli {
    /// Print machine-readable JSON instead of the terminal view
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Download the sentence encoder model (~90 MB)
    DownloadModel,

    /// Report a new incident: classify, extract keywords, link duplicates, store
    Report {
        /// Free-text description of the incident
        description: String,

        /// Where it was observed
        #[arg(long)]
        location: String,

        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// When it happened (YYYY-MM-DD, "YYYY-MM-DD HH:MM:SS" or RFC 3339; default: now)
        #[arg(long)]
        at: Option<String>,
    },

    /// Classify text without storing anything
    Classify {
        text: String,
    },

    /// Extract keywords from text
    Keywords {
        text: String,

        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top_n: usize,
    },

    /// Find incidents similar to a stored one
    Similar {
        id: Uuid,

        /// Minimum cosine similarity (default: WASTEWATCH_SIMILARITY_THRESHOLD)
        #[arg(long)]
        threshold: Option<f64>,

        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },

    /// Semantic search over stored incidents
    Search {
        query: String,

        #[arg(long, default_value = "0.70")]
        threshold: f64,

        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Recompute AI fields for one incident, or for all when no id is given
    Reprocess {
        id: Option<Uuid>,

        /// Number of incidents to process in parallel (default: 4)
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },

    /// List incidents, newest first
    List {
        /// Show one incident in detail
        #[arg(long)]
        id: Option<Uuid>,

        /// Filter by waste type (substring, case-insensitive)
        #[arg(long)]
        waste_type: Option<String>,

        /// Filter by location (substring, case-insensitive)
        #[arg(long)]
        location: Option<String>,

        /// Only incidents from the last N days
        #[arg(long)]
        days: Option<u32>,

        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long, default_value = "20")]
        page_size: u32,
    },

    /// Edit an incident's description, location or coordinates
    Edit {
        id: Uuid,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Delete an incident
    Delete {
        id: Uuid,
    },

    /// Compare category counts between the last N days and the N days before
    Trends {
        #[arg(long, default_value = "7")]
        days: u32,
    },

    /// Per-category daily counts over the last N days
    CategoryTrends {
        #[arg(long, default_value = "30")]
        days: u32,
    },

    /// Locations with unusually many incidents
    Anomalies {
        #[arg(long, default_value_t = DEFAULT_MULTIPLIER)]
        multiplier: f64,
    },

    /// Narrative summary with insights for the last N days
    Summary {
        #[arg(long, default_value = "7")]
        days: u32,
    },

    /// Totals, category distribution and top locations
    Stats {
        /// Only incidents from the last N days (default: all)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Incident counts bucketed by day, week or month
    Timeseries {
        #[arg(long, default_value = "30")]
        days: u32,

        #[arg(long, default_value = "day")]
        group_by: Granularity,
    },

    /// Incident counts and mean coordinates per location
    Heatmap {
        #[arg(long)]
        days: Option<u32>,
    },

    /// Most frequent keywords across processed incidents
    TopKeywords {
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show system status (DB stats, processing coverage, model presence)
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    init_logging(config::log_format_from_env());

    let cli = Cli::parse();
    let json = cli.json;

    match cli.command {
        Commands::Init => {
            info!("Initializing wastewatch database...");
            let config = Config::load()?;
            let store = SqliteStore::new(db::initialize(&config.db_path)?);
            let table_count = store.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nNext step: run `wastewatch download-model`");
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            println!("Downloading sentence encoder...");
            println!("  Destination: {}", config.model_dir.display());

            wastewatch::embedding::download::download_model(&config.model_dir, &config.model_name)
                .await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("You can now run `wastewatch report` or `wastewatch classify`.");
        }

        Commands::Report {
            description,
            location,
            lat,
            lon,
            at,
        } => {
            let config = Config::load()?;
            let store = open_store(&config)?;
            let engine = load_engine(&config).await?;
            let pipeline = IncidentPipeline::new(engine, Arc::clone(&store));

            let mut new = NewIncident::new(description, location);
            if let (Some(lat), Some(lon)) = (lat, lon) {
                new = new.with_coordinates(lat, lon);
            }
            if let Some(at) = at {
                new = new.at(parse_when(&at)?);
            }

            let outcome = pipeline.ingest(new).await?;
            let reason = outcome.reason().map(str::to_string);
            let incident = outcome.into_value();
            if json {
                output::print_json(&incident)?;
            } else {
                terminal::display_incident_detail(&incident);
                terminal::display_degraded(reason.as_deref());
            }
        }

        Commands::Classify { text } => {
            let config = Config::load()?;
            let engine = load_engine(&config).await?;
            let outcome = engine.classify(&text).await?;
            let keywords = KeywordExtractor::new().extract(&text, DEFAULT_TOP_N);
            if json {
                output::print_json(outcome.value())?;
            } else {
                terminal::display_classification(outcome.value(), &keywords);
                terminal::display_degraded(outcome.reason());
            }
        }

        Commands::Keywords { text, top_n } => {
            let keywords = KeywordExtractor::new().extract(&text, top_n);
            if json {
                output::print_json(&keywords)?;
            } else if keywords.is_empty() {
                println!("No keywords found.");
            } else {
                for kw in &keywords {
                    println!("  {kw}");
                }
            }
        }

        Commands::Similar {
            id,
            threshold,
            limit,
        } => {
            let config = Config::load()?;
            let store = open_store(&config)?;
            let outcome = duplicates::similar_to_incident(
                store.as_ref(),
                id,
                threshold,
                config.engine.similarity_threshold,
                limit,
            )
            .await?;
            show_matches(&store, outcome.value(), outcome.reason(), json).await?;
        }

        Commands::Search {
            query,
            threshold,
            limit,
        } => {
            let config = Config::load()?;
            let store = open_store(&config)?;
            let engine = load_engine(&config).await?;
            let outcome =
                duplicates::similar_to_text(&engine, store.as_ref(), &query, Some(threshold), limit)
                    .await?;
            show_matches(&store, outcome.value(), outcome.reason(), json).await?;
        }

        Commands::Reprocess { id, concurrency } => {
            let config = Config::load()?;
            let store = open_store(&config)?;
            let engine = load_engine(&config).await?;
            let pipeline = IncidentPipeline::new(engine, Arc::clone(&store));

            match id {
                Some(id) => {
                    let outcome = pipeline.reprocess(id).await?;
                    if json {
                        output::print_json(outcome.value())?;
                    } else {
                        terminal::display_incident_detail(outcome.value());
                        terminal::display_degraded(outcome.reason());
                    }
                }
                None => {
                    let summary = pipeline.reprocess_all(concurrency).await?;
                    if json {
                        output::print_json(&summary)?;
                    } else {
                        println!("\n{}", "Reprocessing complete.".bold());
                        println!("  Processed: {}", summary.processed);
                        if summary.degraded > 0 {
                            println!(
                                "  {} {} used keyword-only classification",
                                "!".yellow(),
                                summary.degraded
                            );
                        }
                        if summary.failed > 0 {
                            println!("  {} {} failed (see logs)", "!!".red(), summary.failed);
                        }
                    }
                }
            }
        }

        Commands::List {
            id,
            waste_type,
            location,
            days,
            page,
            page_size,
        } => {
            let config = Config::load()?;
            let store = open_store(&config)?;

            if let Some(id) = id {
                let incident = store
                    .get_incident(id)
                    .await?
                    .with_context(|| format!("Incident {id} not found"))?;
                if json {
                    output::print_json(&incident)?;
                } else {
                    terminal::display_incident_detail(&incident);
                }
                return Ok(());
            }

            let filter = IncidentFilter {
                waste_type,
                location,
                window: days_window(days),
            };
            let incidents = store.list_incidents(&filter, page, page_size).await?;
            if json {
                output::print_json(&incidents)?;
            } else {
                terminal::display_incident_list(&incidents, page);
            }
        }

        Commands::Edit {
            id,
            description,
            location,
            lat,
            lon,
        } => {
            let config = Config::load()?;
            let store = open_store(&config)?;
            let update = IncidentUpdate {
                description,
                location,
                latitude: lat,
                longitude: lon,
            };
            let updated = pipeline::update_incident(store.as_ref(), id, &update).await?;
            if json {
                output::print_json(&updated)?;
            } else {
                terminal::display_incident_detail(&updated);
                println!(
                    "{}",
                    "Classification unchanged. Run `wastewatch reprocess <id>` to refresh it."
                        .dimmed()
                );
            }
        }

        Commands::Delete { id } => {
            let config = Config::load()?;
            let store = open_store(&config)?;
            pipeline::delete_incident(store.as_ref(), id).await?;
            println!("Deleted incident {id}");
        }

        Commands::Trends { days } => {
            let analytics = open_analytics()?;
            let report = analytics.analyze_trends(days).await?;
            if json {
                output::print_json(&report)?;
            } else {
                terminal::display_trend_report(&report);
            }
        }

        Commands::CategoryTrends { days } => {
            let analytics = open_analytics()?;
            let series = analytics.category_trends(days).await?;
            if json {
                output::print_json(&series)?;
            } else if series.is_empty() {
                println!("No classified incidents in the last {days} days.");
            } else {
                for (category, points) in &series {
                    let total: i64 = points.iter().map(|p| p.count).sum();
                    println!("\n  {} ({total})", category.bold());
                    for p in points {
                        println!("    {}  {:>4}", p.date, p.count);
                    }
                }
            }
        }

        Commands::Anomalies { multiplier } => {
            let analytics = open_analytics()?;
            let anomalies = analytics.detect_anomalies(multiplier).await?;
            if json {
                output::print_json(&anomalies)?;
            } else {
                terminal::display_anomalies(&anomalies);
            }
        }

        Commands::Summary { days } => {
            let analytics = open_analytics()?;
            let summary = analytics.generate_summary(days).await?;
            if json {
                output::print_json(&summary)?;
            } else {
                terminal::display_summary(&summary);
            }
        }

        Commands::Stats { days } => {
            let analytics = open_analytics()?;
            let stats = analytics.summary_statistics(days_window(days)).await?;
            if json {
                output::print_json(&stats)?;
            } else {
                terminal::display_statistics(&stats);
            }
        }

        Commands::Timeseries { days, group_by } => {
            let analytics = open_analytics()?;
            let points = analytics.time_series(days, group_by).await?;
            if json {
                output::print_json(&points)?;
            } else {
                terminal::display_time_series(&points, group_by.as_str());
            }
        }

        Commands::Heatmap { days } => {
            let analytics = open_analytics()?;
            let points = analytics.location_heatmap(days_window(days)).await?;
            if json {
                output::print_json(&points)?;
            } else if points.is_empty() {
                println!("No incidents with coordinates.");
            } else {
                for p in &points {
                    println!(
                        "  {:<40} {:>9.5} {:>10.5}  {:>5}",
                        output::truncate_chars(&p.location, 40),
                        p.latitude,
                        p.longitude,
                        p.count
                    );
                }
            }
        }

        Commands::TopKeywords { limit } => {
            let analytics = open_analytics()?;
            let keywords = analytics.keyword_frequency(limit).await?;
            if json {
                output::print_json(&keywords)?;
            } else {
                terminal::display_keywords(&keywords);
            }
        }

        Commands::Status => {
            let config = Config::load()?;
            let store: Arc<dyn IncidentStore> = match db::open(&config.db_path) {
                Ok(conn) => Arc::new(SqliteStore::new(conn)),
                Err(_) => {
                    println!("Database: not initialized");
                    println!("\nRun `wastewatch init` to set up the database.");
                    return Ok(());
                }
            };
            wastewatch::status::show(&store, &config).await?;
        }
    }

    Ok(())
}

/// Text logs by default; JSON lines when WASTEWATCH_LOG_FORMAT=json.
fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("wastewatch=info,audit=info"));

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

fn open_store(config: &Config) -> Result<Arc<dyn IncidentStore>> {
    Ok(Arc::new(SqliteStore::new(db::open(&config.db_path)?)))
}

fn open_analytics() -> Result<AnalyticsService> {
    let config = Config::load()?;
    let store = open_store(&config)?;
    Ok(AnalyticsService::new(store, config.engine))
}

/// Load the sentence encoder and initialize the shared engine once.
async fn load_engine(config: &Config) -> Result<Arc<ClassificationEngine>> {
    config.require_model()?;
    let dir = wastewatch::embedding::download::encoder_dir(&config.model_dir, &config.model_name);
    let encoder: Arc<dyn TextEncoder> = Arc::new(SentenceEmbedder::load(&dir, &config.model_name)?);
    let engine = ENGINE.initialize(encoder, config.engine.clone()).await?;
    Ok(engine)
}

/// Resolve matches to their incidents and print them.
async fn show_matches(
    store: &Arc<dyn IncidentStore>,
    matches: &[SimilarMatch],
    reason: Option<&str>,
    json: bool,
) -> Result<()> {
    if json {
        return output::print_json(&matches);
    }

    let mut loaded = HashMap::new();
    for m in matches {
        if let Some(incident) = store.get_incident(m.id).await? {
            loaded.insert(m.id, incident);
        }
    }
    let rows: Vec<(SimilarMatch, Option<_>)> = matches
        .iter()
        .map(|m| (m.clone(), loaded.remove(&m.id)))
        .collect();
    terminal::display_similar(&rows);
    terminal::display_degraded(reason);
    Ok(())
}

fn days_window(days: Option<u32>) -> TimeWindow {
    match days {
        Some(days) => TimeWindow::last_days(Utc::now(), days as i64),
        None => TimeWindow::all(),
    }
}

/// Accept a bare date, the storage format, or RFC 3339.
fn parse_when(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = parse_timestamp(raw) {
        return Ok(ts);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Unrecognized timestamp: {raw}"))?;
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .with_context(|| format!("Unrecognized timestamp: {raw}"))
}
