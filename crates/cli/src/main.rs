//! BrowserStash command-line management tool.
//!
//! Thin wrapper around the core sync engine: generate and validate the
//! configuration file, inspect status, and trigger snapshot uploads and
//! downloads.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use console::Style;
use tracing_subscriber::EnvFilter;

use browserstash_core::browser::PlaceholderBrowser;
use browserstash_core::config::{ConfigStore, SyncConfig};
use browserstash_core::insights::TrendAnalyzer;
use browserstash_core::models::{LogKind, SyncLogEntry};
use browserstash_core::sync_engine::{DownloadOutcome, SyncEngine, UploadOutcome};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// BrowserStash command-line management tool.
#[derive(Parser, Debug)]
#[command(
    name = "browserstash",
    version,
    about = "Back up browser state to a GitHub Gist or WebDAV store"
)]
struct Cli {
    /// Directory holding the sync configuration file.
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file.
    Init {
        /// Overwrite an existing configuration.
        #[arg(long)]
        force: bool,
    },

    /// Check that the active provider has its required credentials.
    Validate,

    /// Show the current configuration and engine status.
    Status,

    /// Gather the enabled collections and upload a snapshot.
    Upload,

    /// Fetch the remote snapshot (without applying it).
    Download,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", Style::new().red().apply_to("✗"), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let store = match &cli.config_dir {
        Some(dir) => ConfigStore::new(dir),
        None => ConfigStore::default_location(),
    };

    match cli.command {
        Commands::Init { force } => cmd_init(store, force),
        Commands::Validate => cmd_validate(store),
        Commands::Status => Ok(cmd_status(store)),
        Commands::Upload => Ok(cmd_upload(store).await),
        Commands::Download => Ok(cmd_download(store).await),
    }
}

fn build_engine(store: ConfigStore) -> SyncEngine {
    SyncEngine::new(
        store,
        Arc::new(PlaceholderBrowser),
        Some(Arc::new(TrendAnalyzer)),
    )
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

fn cmd_init(store: ConfigStore, force: bool) -> Result<ExitCode> {
    if store.path().exists() && !force {
        println!(
            "{} configuration already exists at {} (use --force to overwrite)",
            Style::new().yellow().apply_to("⚠"),
            store.path().display()
        );
        return Ok(ExitCode::FAILURE);
    }

    store.save(&SyncConfig::default())?;
    println!(
        "{} wrote default configuration to {}",
        Style::new().green().apply_to("✓"),
        store.path().display()
    );
    Ok(ExitCode::SUCCESS)
}

fn cmd_validate(store: ConfigStore) -> Result<ExitCode> {
    let Some(config) = store.load()? else {
        println!(
            "{} no configuration found; run `browserstash init` first",
            Style::new().yellow().apply_to("⚠")
        );
        return Ok(ExitCode::FAILURE);
    };

    match config.missing_credential() {
        None => {
            println!(
                "{} configuration is valid for provider `{}`",
                Style::new().green().apply_to("✓"),
                config.provider
            );
            Ok(ExitCode::SUCCESS)
        }
        Some(field) => {
            println!(
                "{} {} is required for provider `{}` but not configured",
                Style::new().red().apply_to("✗"),
                field,
                config.provider
            );
            Ok(ExitCode::FAILURE)
        }
    }
}

fn cmd_status(store: ConfigStore) -> ExitCode {
    let engine = build_engine(store);
    let config = engine.config();
    let status = engine.status();

    let mut table = Table::new();
    table.set_header(vec!["Setting", "Value"]);
    table.add_row(vec!["Provider".to_string(), config.provider.to_string()]);
    table.add_row(vec![
        "Busy".to_string(),
        if status.busy { "yes" } else { "no" }.to_string(),
    ]);
    table.add_row(vec![
        "Last sync".to_string(),
        status.last_sync.unwrap_or_else(|| "never".to_string()),
    ]);
    table.add_row(vec![
        "Bookmarks".to_string(),
        enabled(config.sync_bookmarks),
    ]);
    table.add_row(vec![
        "Extensions".to_string(),
        enabled(config.sync_extensions),
    ]);
    table.add_row(vec!["History".to_string(), enabled(config.sync_history)]);
    table.add_row(vec![
        "Gist token".to_string(),
        present(config.gist_token.as_deref()),
    ]);
    table.add_row(vec![
        "Gist id".to_string(),
        config.gist_id.unwrap_or_else(|| "—".to_string()),
    ]);
    table.add_row(vec![
        "WebDAV URL".to_string(),
        config.webdav_url.unwrap_or_else(|| "—".to_string()),
    ]);
    table.add_row(vec![
        "WebDAV user".to_string(),
        config.webdav_user.unwrap_or_else(|| "—".to_string()),
    ]);

    println!("{table}");
    ExitCode::SUCCESS
}

async fn cmd_upload(store: ConfigStore) -> ExitCode {
    let engine = build_engine(store);
    let config = engine.config();
    let mut insights_rx = engine.subscribe_insights();

    let outcome = engine.perform_upload().await;
    print_log(&engine.log_entries());

    match outcome {
        UploadOutcome::Completed => {
            // Advisory insights arrive on a side channel; give them a moment.
            if config.sync_history {
                let arrived =
                    tokio::time::timeout(Duration::from_secs(2), insights_rx.changed()).await;
                if matches!(arrived, Ok(Ok(()))) {
                    if let Some(insights) = engine.latest_insights() {
                        println!();
                        println!("{}", Style::new().bold().apply_to("Browsing insights"));
                        println!("  {}", insights.summary);
                        for recommendation in &insights.recommendations {
                            println!("  - {}", recommendation);
                        }
                    }
                }
            }
            ExitCode::SUCCESS
        }
        UploadOutcome::AlreadyBusy => {
            println!(
                "{} another sync operation is already running",
                Style::new().yellow().apply_to("⚠")
            );
            ExitCode::FAILURE
        }
        UploadOutcome::Failed => ExitCode::FAILURE,
    }
}

async fn cmd_download(store: ConfigStore) -> ExitCode {
    let engine = build_engine(store);

    let outcome = engine.perform_download().await;
    print_log(&engine.log_entries());

    match outcome {
        DownloadOutcome::Completed(snapshot) => {
            println!();
            println!(
                "fetched {} bookmarks, {} extensions, {} history entries",
                snapshot.bookmarks.len(),
                snapshot.extensions.len(),
                snapshot.history.len()
            );
            ExitCode::SUCCESS
        }
        DownloadOutcome::AlreadyBusy => {
            println!(
                "{} another sync operation is already running",
                Style::new().yellow().apply_to("⚠")
            );
            ExitCode::FAILURE
        }
        DownloadOutcome::Failed => ExitCode::FAILURE,
    }
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

/// Print sync log entries oldest-first for natural console reading.
fn print_log(entries: &[SyncLogEntry]) {
    for entry in entries.iter().rev() {
        let tag = match entry.kind {
            LogKind::Info => Style::new().dim().apply_to("·").to_string(),
            LogKind::Error => Style::new().red().apply_to("✗").to_string(),
            LogKind::Success => Style::new().green().apply_to("✓").to_string(),
        };
        println!("{} [{}] {}", tag, entry.timestamp, entry.message);
    }
}

fn enabled(value: bool) -> String {
    if value { "enabled" } else { "disabled" }.to_string()
}

fn present(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => "set".to_string(),
        _ => "not set".to_string(),
    }
}
