//! Inkdrop main entry point
//!
//! This is the command-line interface for the Inkdrop URL ingestion pipeline.

use clap::Parser;
use inkdrop::config::load_config_with_hash;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Inkdrop: a URL ingestion pipeline
///
/// Inkdrop accepts URL submissions, crawls them through a reader service
/// with durable retries, and reports each URL's progress on demand.
#[derive(Parser, Debug)]
#[command(name = "inkdrop")]
#[command(version = "1.0.0")]
#[command(about = "A URL ingestion pipeline", long_about = None)]
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

    /// User id submissions and queries run as
    #[arg(long, value_name = "USER_ID", default_value = "local")]
    user: String,

    /// Submit URLs, crawl them, and report their final status
    #[arg(long, value_name = "URL", num_args = 1.., conflicts_with_all = ["status", "stats", "dry_run"])]
    submit: Vec<String>,

    /// Report the status of previously submitted URLs and exit
    #[arg(long, value_name = "URL", num_args = 1.., conflicts_with_all = ["submit", "stats", "dry_run"])]
    status: Vec<String>,

    /// Show resource and queue statistics and exit
    #[arg(long, conflicts_with_all = ["submit", "status", "dry_run"])]
    stats: bool,

    /// Validate config and show what would run, without touching the database
    #[arg(long, conflicts_with_all = ["submit", "status", "stats"])]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config).await?;
    } else if !cli.status.is_empty() {
        handle_status(&config, &cli.status).await?;
    } else if !cli.submit.is_empty() {
        handle_submit(&config, &cli.user, &cli.submit).await?;
    } else {
        anyhow::bail!("Nothing to do: pass --submit, --status, --stats, or --dry-run");
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
            0 => EnvFilter::new("inkdrop=info,warn"),
            1 => EnvFilter::new("inkdrop=debug,info"),
            2 => EnvFilter::new("inkdrop=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(config: &inkdrop::Config) -> anyhow::Result<()> {
    println!("=== Inkdrop Dry Run ===\n");

    println!("Store:");
    println!("  Database: {}", config.store.database_path);

    println!("\nFetcher:");
    println!("  Reader: {}", config.fetcher.base_url);
    println!(
        "  API key: {}",
        if config.fetcher.api_key.is_some() {
            "set"
        } else {
            "not set"
        }
    );
    println!("  Connect timeout: {}s", config.fetcher.connect_timeout_secs);
    println!("  Request timeout: {}s", config.fetcher.request_timeout_secs);

    println!("\nQueue:");
    println!("  Max attempts: {}", config.queue.max_attempts);
    println!("  Retry base delay: {}ms", config.queue.retry_base_delay_ms);
    println!("  Retry multiplier: {}", config.queue.retry_multiplier);

    println!("\nWorkers:");
    println!("  Count: {}", config.worker.count);

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows resource and queue statistics
async fn handle_stats(config: &inkdrop::Config) -> anyhow::Result<()> {
    use inkdrop::queue::{JobQueue, SqliteQueue};
    use inkdrop::store::{ResourceStore, SqliteStore};
    use inkdrop::ResourceStatus;

    println!("Database: {}\n", config.store.database_path);

    let store = SqliteStore::new(&config.store.database_path)?;
    let queue = SqliteQueue::open(&config.store.database_path, config.queue.retry_policy())?;

    let counts = store.count_by_status().await?;
    let total: u64 = counts.values().sum();
    println!("Resources ({} total):", total);
    for status in ResourceStatus::all_statuses() {
        let count = counts.get(&status).copied().unwrap_or(0);
        println!("  {:<10} {}", status.to_db_string(), count);
    }

    let queue_counts = queue.counts().await?;
    println!("\nCrawl jobs:");
    println!("  {:<10} {}", "ready", queue_counts.ready);
    println!("  {:<10} {}", "scheduled", queue_counts.scheduled);
    println!("  {:<10} {}", "running", queue_counts.running);
    println!("  {:<10} {}", "dead", queue_counts.dead);

    let letters = queue.dead_letters().await?;
    if !letters.is_empty() {
        println!("\nDead letters:");
        for letter in &letters {
            println!(
                "  - {} (attempts: {}): {}",
                letter.job.url, letter.attempts, letter.last_error
            );
        }
    }

    Ok(())
}

/// Handles the --status mode: reports each URL's progress
async fn handle_status(config: &inkdrop::Config, urls: &[String]) -> anyhow::Result<()> {
    use inkdrop::store::SqliteStore;
    use inkdrop::StatusService;
    use std::sync::Arc;

    let store = Arc::new(SqliteStore::new(&config.store.database_path)?);
    let status = StatusService::new(store);

    let snapshots = status.check_status(urls).await?;
    print_snapshots(urls, &snapshots);

    Ok(())
}

/// Handles the --submit mode: submits URLs, crawls them, reports status
async fn handle_submit(
    config: &inkdrop::Config,
    user_id: &str,
    urls: &[String],
) -> anyhow::Result<()> {
    use inkdrop::fetcher::ReaderClient;
    use inkdrop::queue::SqliteQueue;
    use inkdrop::store::SqliteStore;
    use inkdrop::{CrawlWorker, StatusService, SubmissionService, WorkerPool};
    use std::sync::Arc;

    let store = Arc::new(SqliteStore::new(&config.store.database_path)?);
    let queue = Arc::new(SqliteQueue::open(
        &config.store.database_path,
        config.queue.retry_policy(),
    )?);
    let fetcher = Arc::new(ReaderClient::new(&config.fetcher)?);

    let submission = SubmissionService::new(store.clone(), queue.clone());
    let mut submitted = 0usize;
    for url in urls {
        match submission.submit(url, user_id).await {
            Ok(id) => {
                println!("✓ {} -> {}", url, id);
                submitted += 1;
            }
            Err(e) => println!("✗ {}: {}", url, e),
        }
    }

    if submitted == 0 {
        println!("\nNo URLs accepted");
        return Ok(());
    }

    let worker = Arc::new(CrawlWorker::new(store.clone(), fetcher));
    let pool = WorkerPool::spawn(queue.clone(), worker, config.worker.count);

    wait_for_drain(queue.as_ref()).await?;
    pool.shutdown().await;

    let status = StatusService::new(store);
    let snapshots = status.check_status(urls).await?;
    println!();
    print_snapshots(urls, &snapshots);

    Ok(())
}

/// Polls the queue until every job has been settled
async fn wait_for_drain(queue: &inkdrop::queue::SqliteQueue) -> anyhow::Result<()> {
    use inkdrop::queue::JobQueue;
    use std::time::Duration;

    loop {
        if queue.counts().await?.is_drained() {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// Prints one block per reported URL, noting URLs with no record
fn print_snapshots(requested: &[String], snapshots: &[inkdrop::pipeline::ResourceSnapshot]) {
    for snapshot in snapshots {
        println!("{} [{}]", snapshot.url, snapshot.status);
        println!("  id: {}", snapshot.id);
        if let Some(title) = &snapshot.title {
            println!("  title: {}", title);
        }
        if let Some(preview) = &snapshot.preview_content {
            println!("  preview: {}", preview.replace('\n', " "));
        }
        if let Some(summary) = &snapshot.ai_summary {
            println!("  summary: {}", summary);
        }
    }

    let missing = requested.len() - snapshots.len();
    if missing > 0 {
        println!("({} URL(s) not yet submitted)", missing);
    }
}
