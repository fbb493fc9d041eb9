//! Gleaner main entry point
//!
//! Command-line interface for running a configured crawl.

use clap::Parser;
use gleaner::config::load_config_with_hash;
use gleaner::output::{print_summary, NdjsonSink};
use gleaner::Crawler;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Gleaner: a configurable listing crawler and extraction engine
///
/// Gleaner crawls the listing pages described by a site configuration,
/// extracts normalized records, and streams them to an output file while
/// respecting robots.txt and a politeness delay.
#[derive(Parser, Debug)]
#[command(name = "gleaner")]
#[command(version = "1.0.0")]
#[command(about = "A configurable listing crawler", long_about = None)]
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

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Stream extracted records to this file as newline-delimited JSON
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
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

    if cli.dry_run {
        handle_dry_run(&config, &config_hash);
        return Ok(());
    }

    let mut crawler = Crawler::new(config.site, config.crawl)?;

    if let Some(path) = &cli.output {
        let sink = NdjsonSink::create(path)?;
        crawler = crawler.with_sink(Box::new(sink));
        tracing::info!("Streaming records to {}", path.display());
    }

    // Ctrl-C requests a clean stop at the next suspension point
    let cancel = crawler.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing current page");
            cancel.cancel();
        }
    });

    let outcome = crawler.run().await?;
    print_summary(&outcome.stats);

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gleaner=info,warn"),
            1 => EnvFilter::new("gleaner=debug,info"),
            2 => EnvFilter::new("gleaner=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows the crawl plan
fn handle_dry_run(config: &gleaner::Config, config_hash: &str) {
    println!("=== Gleaner Dry Run ===\n");

    println!("Site:");
    println!("  Start URL: {}", config.site.start_url);
    if let Some(wait) = &config.site.wait_condition {
        println!("  Wait condition: {}", wait);
    }

    let selectors = &config.site.selectors;
    println!("\nSelectors:");
    println!("  Product: {}", selectors.product);
    if let Some(title) = &selectors.title {
        println!("  Title: {}", title.selector());
    }
    if let Some(price) = &selectors.price {
        println!("  Price: {}", price.selector());
    }
    if let Some(image) = &selectors.image {
        println!("  Image: {}", image.selector());
    }
    if let Some(next) = &selectors.next_page {
        println!("  Next page: {}", next.selector());
    } else {
        println!("  Next page: (none, single-page crawl)");
    }
    if !selectors.custom.is_empty() {
        println!("  Custom fields ({}):", selectors.custom.len());
        for (name, locator) in &selectors.custom {
            match locator.attr() {
                Some(attr) => println!("    - {}: {} @{}", name, locator.selector(), attr),
                None => println!("    - {}: {}", name, locator.selector()),
            }
        }
    }

    println!("\nCrawl options:");
    println!("  Delay: {}ms", config.crawl.delay_ms);
    println!("  Max retries: {}", config.crawl.max_retries);
    println!("  Timeout: {}ms", config.crawl.timeout_ms);
    println!("  User agent: {}", config.crawl.user_agent);
    if let Some(proxy) = &config.crawl.proxy {
        println!("  Proxy: {}", proxy);
    }

    println!("\nConfig hash: {}", config_hash);
    println!("\n✓ Configuration is valid");
}
