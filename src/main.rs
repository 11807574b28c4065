//! Tabelog crawler main entry point
//!
//! This is the command-line interface for the restaurant crawler.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabelog_crawler::config::{load_config_with_hash, validate, Config};
use tabelog_crawler::crawler::run_crawl;
use tabelog_crawler::output::{print_statistics, LogSink, RecordSink, SqliteRecordSink};
use tracing_subscriber::EnvFilter;

/// Tabelog crawler: a budgeted restaurant listing crawler
///
/// Starts from a seed page, follows index and listing pages, and records
/// every restaurant detail page it reaches.
#[derive(Parser, Debug)]
#[command(name = "tabelog-crawler")]
#[command(version)]
#[command(about = "A budgeted restaurant listing crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply without one)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Start URL, overriding the configuration
    #[arg(long, value_name = "URL")]
    seed: Option<String>,

    /// Maximum number of page fetches
    #[arg(long, value_name = "N")]
    max_visits: Option<u64>,

    /// Minimum delay between one worker's fetches, in milliseconds
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Number of concurrent workers
    #[arg(long, value_name = "N")]
    workers: Option<u32>,

    /// SQLite database path
    #[arg(long, value_name = "PATH")]
    database: Option<String>,

    /// Write records to the log instead of the database
    #[arg(long)]
    log_only: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the effective settings without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show the latest run from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(seed) = &self.seed {
            config.crawler.seed = seed.clone();
        }
        if let Some(max_visits) = self.max_visits {
            config.crawler.max_visits = max_visits;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.crawler.delay_ms = delay_ms;
        }
        if let Some(workers) = self.workers {
            config.crawler.workers = workers;
        }
        if let Some(database) = &self.database {
            config.output.database_path = database.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    (cfg, hash)
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            (Config::default(), "defaults".to_string())
        }
    };

    cli.apply_overrides(&mut config);
    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    if cli.dry_run {
        handle_dry_run(&config, cli.log_only);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, &config_hash, cli.log_only).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tabelog_crawler=info,warn"),
            1 => EnvFilter::new("tabelog_crawler=debug,info"),
            2 => EnvFilter::new("tabelog_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, log_only: bool) {
    println!("=== Tabelog Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed: {}", config.crawler.seed);
    println!("  Max visits: {}", config.crawler.max_visits);
    println!("  Delay per worker: {}ms", config.crawler.delay_ms);
    println!("  Workers: {}", config.crawler.workers);
    match config.crawler.max_depth {
        Some(depth) => println!("  Max depth: {}", depth),
        None => println!("  Max depth: unlimited"),
    }

    println!("\nSite:");
    println!("  Base URL: {}", config.site.base_url);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nFetch:");
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Connect timeout: {}s", config.fetch.connect_timeout_secs);
    println!("  Max redirects: {}", config.fetch.max_redirects);

    println!("\nOutput:");
    if log_only {
        println!("  Records: log only");
    } else {
        println!("  Database: {}", config.output.database_path);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows the latest run from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use tabelog_crawler::storage::{SqliteStorage, Storage};

    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

    match storage.get_latest_run()? {
        Some(run) => {
            println!("Latest run: #{}", run.id);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            println!("  Config hash: {}", run.config_hash);
            println!("  Pages fetched: {}", run.pages_fetched);
            println!("  Records emitted: {}", run.records_emitted);
            println!("  Fetch errors: {}", run.fetch_errors);
            println!("  Parse errors: {}", run.parse_errors);
        }
        None => println!("No crawl runs recorded"),
    }

    println!("\nRestaurants stored: {}", storage.count_restaurants()?);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: &str,
    log_only: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let sink: Arc<dyn RecordSink> = if log_only {
        tracing::info!("Writing records to the log only");
        Arc::new(LogSink::new())
    } else {
        tracing::info!("Writing records to {}", config.output.database_path);
        Arc::new(SqliteRecordSink::open(
            Path::new(&config.output.database_path),
            config_hash,
        )?)
    };

    match run_crawl(config, sink).await {
        Ok(report) => {
            print_statistics(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
