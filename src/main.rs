//! Card-Localizer main entry point
//!
//! This is the command-line interface for localizing character cards.

use anyhow::Context;
use card_localizer::card::decode_card;
use card_localizer::config::{load_config_or_default, validate, Config};
use card_localizer::output::{print_statistics, TracingSink};
use card_localizer::{discover_references, localize_card_file, CardFileOutcome};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Card-Localizer: mirrors the remote assets of a character card
///
/// Card-Localizer downloads every external image, sound, font, stylesheet
/// and script a PNG character card references, stores them under a served
/// directory, and writes a copy of the card that points at the local files.
#[derive(Parser, Debug)]
#[command(name = "card-localizer")]
#[command(version = "1.0.0")]
#[command(about = "Mirrors the remote assets of a character card", long_about = None)]
struct Cli {
    /// Path to the PNG character card
    #[arg(value_name = "CARD")]
    card: PathBuf,

    /// Path to TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Public directory resources are written under
    #[arg(long, value_name = "DIR")]
    base_path: Option<String>,

    /// Proxy URL (http, https, socks5 or socks5h)
    #[arg(long, value_name = "URL")]
    proxy: Option<String>,

    /// Host that must always be reached through the proxy (repeatable)
    #[arg(long = "force-proxy", value_name = "HOST")]
    force_proxy: Vec<String>,

    /// Only report whether the card needs localization
    #[arg(long)]
    check: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load configuration and apply command-line overrides
    let config = match load_effective_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {:#}", e);
            return Err(e);
        }
    };

    if cli.check {
        handle_check(&cli.card).await
    } else {
        handle_localize(&cli.card, config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("card_localizer=info,warn"),
            1 => EnvFilter::new("card_localizer=debug,info"),
            2 => EnvFilter::new("card_localizer=trace,debug"),
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

/// Loads the config file (if any) and overlays the command-line flags
fn load_effective_config(cli: &Cli) -> anyhow::Result<Config> {
    if let Some(path) = &cli.config {
        tracing::info!("Loading configuration from: {}", path.display());
    }
    let mut config = load_config_or_default(cli.config.as_deref())?;

    if let Some(base_path) = &cli.base_path {
        config.localizer.base_path = Some(base_path.clone());
    }
    if let Some(proxy) = &cli.proxy {
        config.network.proxy = Some(proxy.clone());
    }
    if !cli.force_proxy.is_empty() {
        config.network.force_proxy = cli.force_proxy.clone();
    }

    validate(&config).context("invalid command-line overrides")?;
    Ok(config)
}

/// Handles the --check mode: lists the card's references without downloading
async fn handle_check(card: &Path) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(card)
        .await
        .with_context(|| format!("failed to read {}", card.display()))?;
    let document = decode_card(&bytes)?;
    let references = discover_references(&document)?;

    if references.is_empty() {
        println!("✓ {} has no external references", card.display());
        return Ok(());
    }

    println!(
        "{} references {} external resources:",
        card.display(),
        references.len()
    );
    for url in &references {
        println!("  - {}", url);
    }

    Ok(())
}

/// Handles the main localization operation
async fn handle_localize(card: &Path, config: Config) -> anyhow::Result<()> {
    let stop = CancellationToken::new();

    // Ctrl-C raises the stop signal; queued work is drained, not aborted
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping localization");
                stop.cancel();
            }
        });
    }

    tracing::info!("Localizing {}", card.display());

    match localize_card_file(card, &config, Arc::new(TracingSink), stop).await {
        Ok(CardFileOutcome::Localized {
            output_path,
            card: localized,
        }) => {
            println!();
            print_statistics(&localized.stats);
            println!("\n✓ Localized card written to: {}", output_path.display());
            Ok(())
        }
        Ok(CardFileOutcome::NothingToLocalize { .. }) => {
            println!("✓ {} has no external references; nothing to do", card.display());
            Ok(())
        }
        Err(failure) => {
            if failure.is_stopped() {
                tracing::warn!("Localization stopped before completion");
            } else {
                tracing::error!("Localization failed: {}", failure.error);
            }
            Err(failure.into())
        }
    }
}
