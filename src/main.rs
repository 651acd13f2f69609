//! Gleaner main entry point
//!
//! Command-line interface for the harvesting engine.

use anyhow::Context;
use clap::Parser;
use gleaner::config::{load_config_with_hash, Config};
use gleaner::run_targets;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Gleaner: a resumable harvester for paginated listing sites
#[derive(Parser, Debug)]
#[command(name = "gleaner")]
#[command(version)]
#[command(about = "A resumable harvester for paginated listing sites", long_about = None)]
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

    /// Restart every target from page 1, ignoring persisted cursors
    /// (dedup records still apply)
    #[arg(long)]
    fresh: bool,

    /// Harvest only the named target
    #[arg(long, value_name = "NAME")]
    target: Option<String>,

    /// Validate config and show what would be harvested without fetching
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    if cli.dry_run {
        print_dry_run(&config);
        return Ok(());
    }

    if cli.fresh {
        tracing::info!("Starting fresh harvest (cursors reset to page 1)");
    } else {
        tracing::info!("Starting harvest (resuming from persisted cursors)");
    }

    let stats = run_targets(config, cli.fresh, cli.target)
        .await
        .context("harvest run failed")?;

    println!(
        "Done: {} stored, {} duplicates, {} skipped across {} pages ({} pages skipped)",
        stats.items_stored,
        stats.items_duplicate,
        stats.items_skipped,
        stats.pages_visited,
        stats.pages_skipped
    );

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
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

/// Shows what a run would do, without touching the network
fn print_dry_run(config: &Config) {
    println!("=== Gleaner Dry Run ===\n");

    println!("Engine:");
    println!("  Max pages: {}", config.engine.max_pages);
    println!(
        "  Item delay: {}-{}ms",
        config.engine.item_delay_min_ms, config.engine.item_delay_max_ms
    );
    println!("  Retry backoff: {}ms", config.engine.retry_backoff_ms);
    println!(
        "  Timeouts: listing {}s, detail {}s",
        config.engine.listing_timeout_secs, config.engine.detail_timeout_secs
    );
    println!("  Mark failed done: {}", config.engine.mark_failed_done);

    println!("\nUser Agent:");
    println!(
        "  {}/{} (+{}; {})",
        config.user_agent.harvester_name,
        config.user_agent.harvester_version,
        config.user_agent.contact_url,
        config.user_agent.contact_email
    );

    println!("\nTargets ({}):", config.targets.len());
    for target in &config.targets {
        println!("  - {}", target.name);
        println!("    Listing: {}", target.base_url);
        println!("    Template: {}", target.page_url_template);
        println!("    Output: {} ({:?} sink)", target.output_dir, target.sink);
        println!(
            "    Selectors: {} link, {} title, {} date, {} body",
            target.link_selectors.len(),
            target.title_selectors.len(),
            target.date_selectors.len(),
            target.body_selectors.len()
        );
        println!("    Stop markers: {}", target.stop_markers.len());
        if let Some(marker) = &target.header_end_marker {
            println!(
                "    Header cut: '{}' within first {} lines",
                marker, target.header_scan_lines
            );
        }
    }

    println!("\n✓ Configuration is valid");
}
