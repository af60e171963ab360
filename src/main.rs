//! PrUn Production Calculator
//!
//! Production planning and extraction site ranking for Prosperous Universe.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use prun_calculator::config::{Config, DEFAULT_DATABASE};
use prun_calculator::evaluator::DEFAULT_CONCURRENCY;
use prun_calculator::extraction::calculate_extraction;
use prun_calculator::models::{Direction, Preferences, ResourceType};
use prun_calculator::production::{
    PlanDefinition, calculate_material_io, construction_materials, resolve_plan,
};
use prun_calculator::{Evaluator, GameData, GameSnapshot, PriceResolver};
use prun_calculator::{db, environment, import, roi, sample};

#[derive(Parser)]
#[command(name = "prun-calculator")]
#[command(about = "Production planning calculator for Prosperous Universe")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, env = "PRUN_DATABASE", default_value = DEFAULT_DATABASE)]
    database: PathBuf,

    /// Maximum number of candidates evaluated at once
    #[arg(long, env = "PRUN_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Log filter, e.g. "debug" or "prun_calculator=trace" (RUST_LOG when unset)
    #[arg(long, env = "PRUN_LOG")]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Import JSON game data dumps from a directory
    Import {
        /// Directory holding exchanges, recipes, buildings, planets, templates
        /// and preferences JSON files
        dir: PathBuf,

        /// Clear existing game data before import
        #[arg(long)]
        clear: bool,
    },

    /// Load sample data for testing (without dumps)
    LoadSample,

    /// Resolve the unit price of a material
    Price {
        /// Material ticker, e.g. "RAT"
        ticker: String,

        /// Price for selling instead of buying
        #[arg(long)]
        sell: bool,

        /// Planet natural id for planet-scoped preferences
        #[arg(long)]
        planet: Option<String>,

        /// Name of the preference set to apply
        #[arg(long)]
        preferences: Option<String>,
    },

    /// Extraction cycle for a resource type and daily extraction rate
    Extraction {
        /// MINERAL, GASEOUS or LIQUID
        resource_type: ResourceType,

        /// Daily extraction rate of one building
        rate: f64,
    },

    /// Construction materials of a building on a planet
    Special {
        /// Planet natural id
        planet: String,

        /// Building ticker
        building: String,
    },

    /// Construction cost of habitation and storage on a planet
    Infrastructure {
        /// Planet natural id
        planet: String,

        /// Name of the preference set to apply
        #[arg(long)]
        preferences: Option<String>,
    },

    /// Daily material flow and value of a production plan
    MaterialIo {
        /// Plan definition JSON file
        plan: PathBuf,

        /// Planet natural id, overriding the plan's own
        #[arg(long)]
        planet: Option<String>,

        /// Name of the preference set to apply
        #[arg(long)]
        preferences: Option<String>,
    },

    /// Rank extraction sites for a material
    Roi {
        /// Material ticker, e.g. "FEO"
        ticker: String,

        /// Name of the preference set to apply
        #[arg(long)]
        preferences: Option<String>,

        /// Show only the best N results
        #[arg(short = 'n', long)]
        top: Option<usize>,

        /// Keep results finished before Ctrl-C
        #[arg(long)]
        keep_partial: bool,
    },

    /// List all planets in the database
    ListPlanets,

    /// Show row counts of the stored data
    Status,
}

fn init_logging(filter: Option<&str>) -> Result<()> {
    let filter = match filter {
        Some(f) => EnvFilter::try_new(f).with_context(|| format!("invalid log filter '{}'", f))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn load_preferences(snapshot: &GameSnapshot, name: Option<&str>) -> Result<Option<Preferences>> {
    name.map(|n| snapshot.preferences(n).cloned())
        .transpose()
        .context("loading preference set")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref())?;

    let keep_partial = matches!(cli.command, Commands::Roi { keep_partial: true, .. });
    let config = Config::new(cli.database, cli.concurrency, cli.log, keep_partial)?;
    debug!(?config, "resolved configuration");

    let conn = Connection::open(&config.database)
        .with_context(|| format!("opening {}", config.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Init => {
            println!("Database initialized at: {}", config.database.display());
        }

        Commands::Import { dir, clear } => {
            if clear {
                info!("clearing existing game data");
                db::clear_game_data(&conn)?;
            }

            let stats = import::import_directory(&conn, &dir)?;
            println!("\n{}", stats);
        }

        Commands::LoadSample => {
            sample::load_sample_data(&conn)?;
            println!("Sample data loaded successfully!");
        }

        Commands::Price {
            ticker,
            sell,
            planet,
            preferences,
        } => {
            let snapshot = db::load_snapshot(&conn)?;
            let prefs = load_preferences(&snapshot, preferences.as_deref())?;
            let direction = if sell { Direction::Sell } else { Direction::Buy };

            let resolver = PriceResolver::new(&snapshot, prefs.as_ref());
            let quote = resolver.resolve_quote(&ticker, direction, planet.as_deref());
            println!("{} {:?}: {:.2} ({:?})", ticker, direction, quote.value, quote.source);
        }

        Commands::Extraction { resource_type, rate } => {
            let timing = calculate_extraction(resource_type, rate);
            println!(
                "{} ({}) at {}/day: {} units every {:.2}h",
                resource_type.as_str(),
                resource_type.extraction_building(),
                rate,
                timing.extraction_amount,
                timing.time_ms / 3_600_000.0
            );
        }

        Commands::Special { planet, building } => {
            let snapshot = db::load_snapshot(&conn)?;
            let planet = snapshot.planet(&planet)?;
            let building = snapshot.building(&building)?;

            println!("{} on {}", building.ticker, planet.display_name());
            let tags = environment::EnvironmentSummary::of(planet).tags();
            if !tags.is_empty() {
                println!("  Environment: {}", tags.join(", "));
            }
            println!("  Materials:");
            for line in construction_materials(building, &planet.environment) {
                println!("    {:<5} {:>8.0}", line.ticker, line.input);
            }
        }

        Commands::Infrastructure {
            planet,
            preferences,
        } => {
            let snapshot = db::load_snapshot(&conn)?;
            let prefs = load_preferences(&snapshot, preferences.as_deref())?;
            let resolver = PriceResolver::new(&snapshot, prefs.as_ref());
            let costs = resolver.infrastructure_costs(&planet)?;

            println!("{:<6} {:>14}", "Bldg", "Cost");
            println!("{}", "-".repeat(21));
            for (ticker, cost) in &costs {
                println!("{:<6} {:>14.0}", ticker, cost);
            }
        }

        Commands::MaterialIo {
            plan,
            planet,
            preferences,
        } => {
            let content = fs::read_to_string(&plan)
                .with_context(|| format!("Failed to read {}", plan.display()))?;
            let definition: PlanDefinition = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", plan.display()))?;

            let snapshot = db::load_snapshot(&conn)?;
            let prefs = load_preferences(&snapshot, preferences.as_deref())?;
            let buildings = resolve_plan(&snapshot, &definition)?;
            let planet = planet.or(definition.planet);

            let resolver = PriceResolver::new(&snapshot, prefs.as_ref());
            let lines = resolver.price_lines(&calculate_material_io(&buildings), planet.as_deref());

            println!(
                "{:<6} {:>10} {:>10} {:>10} {:>10} {:>12}",
                "Ticker", "Input", "Output", "Delta", "Price", "Value"
            );
            println!("{}", "-".repeat(63));
            for l in &lines {
                println!(
                    "{:<6} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>12.2}",
                    l.ticker, l.input, l.output, l.delta, l.unit_price, l.value
                );
            }
            let total: f64 = lines.iter().map(|l| l.value).sum();
            println!("\nDaily value: {:.2}", total);
        }

        Commands::Roi {
            ticker,
            preferences,
            top,
            ..
        } => {
            let snapshot = db::load_snapshot(&conn)?;
            let prefs = load_preferences(&snapshot, preferences.as_deref())?.map(Arc::new);
            let data: Arc<dyn GameData> = Arc::new(snapshot);

            let evaluator = Evaluator::new(config.evaluate_options());

            let cancel = evaluator.cancel_flag();
            let interrupt = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            });

            let progress = evaluator.progress();
            let reporter = tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(1));
                loop {
                    interval.tick().await;
                    if progress.total() > 0 {
                        info!(current = progress.current(), total = progress.total(), "evaluating");
                    }
                }
            });

            let report = roi::resource_roi(&evaluator, data, prefs, &ticker).await;
            interrupt.abort();
            reporter.abort();

            println!(
                "{} sites for {}: {} attempted, {} succeeded, {} failed{}",
                report.results.len(),
                ticker,
                report.attempted,
                report.succeeded,
                report.failed,
                if report.cancelled { " (cancelled)" } else { "" }
            );
            if report.results.is_empty() {
                return Ok(());
            }

            println!(
                "\n{:<28} {:<4} {:>9} {:>6} {:>11} {:>12} {:>8} {:>6}  {}",
                "Planet", "Bldg", "Yield/d", "%Max", "Profit/d", "Cost", "ROI (d)", "Area", "Env"
            );
            println!("{}", "-".repeat(104));
            let shown = top.unwrap_or(report.results.len());
            for r in report.results.iter().take(shown) {
                let roi_days = if r.plan_roi.is_finite() {
                    format!("{:.1}", r.plan_roi)
                } else {
                    "-".to_string()
                };
                println!(
                    "{:<28} {:<4} {:>9.1} {:>5.0}% {:>11.0} {:>12.0} {:>8} {:>6.0}  {}",
                    r.planet_name,
                    r.building_ticker,
                    r.daily_yield,
                    r.percent_max_daily_yield * 100.0,
                    r.daily_profit,
                    r.plan_cost,
                    roi_days,
                    r.plan_area,
                    r.environment.join(",")
                );
            }
        }

        Commands::ListPlanets => {
            let snapshot = db::load_snapshot(&conn)?;
            let planets = snapshot.planets();
            if planets.is_empty() {
                println!("No planets in database. Run 'import' or 'load-sample' first.");
            } else {
                println!("{:<28} {:<20} {}", "Planet", "COGC", "Resources");
                println!("{}", "-".repeat(80));
                for p in planets {
                    let resources: Vec<String> = p
                        .resources
                        .iter()
                        .map(|r| format!("{} {:.1}", r.ticker, r.daily_extraction))
                        .collect();
                    println!(
                        "{:<28} {:<20} {}",
                        p.display_name(),
                        p.cogc_program.as_deref().unwrap_or("-"),
                        resources.join(", ")
                    );
                }
            }
        }

        Commands::Status => {
            println!("Database: {}", config.database.display());
            for (table, count) in db::table_counts(&conn)? {
                println!("  {:<22} {:>8}", table, count);
            }
        }
    }

    Ok(())
}
