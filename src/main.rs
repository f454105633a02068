//! ls-crawler main entry point
//!
//! Command-line interface for the Leichte Sprache crawler.

use clap::Parser;
use ls_crawler::config::{load_config_with_hash, load_site_lists, Config, CrawlSeed};
use ls_crawler::crawler::run_crawl;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// ls-crawler: finds Leichte Sprache pages on German websites
///
/// Crawls every homepage from the configured site lists, follows links that
/// point to Leichte Sprache sections of the same site, and archives the pages
/// found there as HTML and plain text.
#[derive(Parser, Debug)]
#[command(name = "ls-crawler")]
#[command(version = "1.0.0")]
#[command(about = "Finds and archives Leichte Sprache pages", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and site lists, show what would be crawled, and exit
    #[arg(long, conflicts_with_all = ["stats", "export_summary"])]
    dry_run: bool,

    /// Show statistics of the latest run and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_summary"])]
    stats: bool,

    /// Regenerate the markdown summary of the latest run and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_summary: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_summary {
        handle_export_summary(&config)?;
    } else {
        let seeds = load_site_lists(&config)?;
        if cli.dry_run {
            handle_dry_run(&config, &seeds);
        } else {
            handle_crawl(&config, &config_hash, &seeds).await?;
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG` overrides the verbosity flags when set.
fn setup_logging(verbose: u8, quiet: bool) {
    let default_filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "ls_crawler=info,warn",
            1 => "ls_crawler=debug,info",
            2 => "ls_crawler=trace,debug",
            _ => "trace",
        }
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration and seeds
fn handle_dry_run(config: &Config, seeds: &[CrawlSeed]) {
    println!("=== ls-crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!("  Download delay: {}ms", config.crawler.download_delay);
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!("  Obey robots.txt: {}", config.crawler.obey_robots);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Save directory: {}", config.output.save_dir);
    println!("  Events: {}", config.output.events_path);
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);
    println!("  Filename policy: {:?}", config.output.filename_policy);

    println!("\nSite Lists ({}):", config.seeds.site_lists.len());
    for path in &config.seeds.site_lists {
        println!("  - {}", path.display());
    }

    println!("\nHomepages ({}):", seeds.len());
    for seed in seeds.iter().take(20) {
        println!("  - {}", seed.url);
    }
    if seeds.len() > 20 {
        println!("  ... and {} more", seeds.len() - 20);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling {} homepages", seeds.len());
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use ls_crawler::output::{load_statistics, print_statistics};
    use ls_crawler::storage::SqliteStorage;

    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-summary mode: generates the markdown summary
fn handle_export_summary(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use ls_crawler::output::{generate_markdown_summary, generate_summary};
    use ls_crawler::storage::SqliteStorage;

    println!("=== Exporting Crawl Summary ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", config.output.summary_path);
    println!();

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

    tracing::info!("Loading crawl data from database...");
    let summary = generate_summary(&storage)?;

    generate_markdown_summary(&summary, Path::new(&config.output.summary_path))?;
    println!("✓ Summary exported to: {}", config.output.summary_path);

    Ok(())
}

/// Handles the main crawl operation
///
/// Ctrl-C stops scheduling new requests; requests already in flight finish
/// and their results are still recorded.
async fn handle_crawl(
    config: &Config,
    config_hash: &str,
    seeds: &[CrawlSeed],
) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();

    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, finishing in-flight requests");
            signal_token.cancel();
        }
    });

    match run_crawl(config, config_hash, seeds, cancel).await {
        Ok(report) if report.interrupted => {
            tracing::info!(
                "Crawl interrupted after {} events ({} pages archived)",
                report.events,
                report.pages_archived
            );
            Ok(())
        }
        Ok(report) => {
            tracing::info!(
                "Crawl completed successfully: {} events, {} pages archived",
                report.events,
                report.pages_archived
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
