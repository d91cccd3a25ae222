//! pagewatch CLI
//!
//! Local entry point for one-off checks and the long-running watcher.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use pagewatch::{
    config,
    error::Result,
    models::{CheckStatus, Config, CycleReport, Delivery, Target},
    pipeline::{Command as WatchCommand, Coordinator, Reply, Watcher, WatcherHandle},
    services::{Fetcher, PageChecker},
    storage::{LocalStorage, UpdateEntry, UpdateStore},
    utils::http,
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// pagewatch - Web Page Change Watcher
#[derive(Parser, Debug)]
#[command(
    name = "pagewatch",
    version,
    about = "Watches web pages and reports significant changes"
)]
struct Cli {
    /// State directory (default: $HOME/.config/pagewatch)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Configuration file (default: {root}/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check every target once and print the report
    Check,

    /// Poll every target on its interval until Ctrl-C
    Watch,

    /// List targets flagged as changed
    Updates,

    /// Clear the list of flagged targets
    Clear,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging from the verbosity flag or the configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let root = match cli.root {
        Some(root) => root,
        None => config::default_root_dir()?,
    };
    let config_path = cli.config.unwrap_or_else(|| config::config_path(&root));

    // Only the logging section is needed here; the strict load comes later.
    let logging = Config::load(&config_path)
        .map(|config| config.logging)
        .unwrap_or_default();
    init_logging(cli.verbose, &logging.level);

    log::debug!("State directory: {}", root.display());

    match cli.command {
        Command::Check => {
            let (config, targets) = config::load_targets(&config_path)?;
            let coordinator = build_coordinator(&root, &config).await?;

            let report = coordinator.run_cycle(&targets).await;
            print_report(&targets, &report);
            report.log_summary();
        }

        Command::Watch => {
            let (config, targets) = config::load_targets(&config_path)?;
            let coordinator = build_coordinator(&root, &config).await?;

            let watcher = Watcher::new(coordinator, targets);
            let (handle, commands) = Watcher::channel();
            tokio::spawn(read_commands(handle));

            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Failed to listen for Ctrl-C: {}", e);
                }
            };
            watcher.run(commands, shutdown).await?;
        }

        Command::Updates => {
            let updates = UpdateStore::load(config::updates_path(&root)).await?;
            print_updates(&updates.list().await);
        }

        Command::Clear => {
            let updates = UpdateStore::load(config::updates_path(&root)).await?;
            let cleared = updates.clear().await?;
            println!("Cleared {cleared} update(s)");
        }

        Command::Validate => {
            log::info!("Validating {}", config_path.display());

            let (_, targets) = match config::load_targets(&config_path) {
                Ok(loaded) => loaded,
                Err(e) => {
                    log::error!("Config validation failed: {}", e);
                    return Err(e);
                }
            };
            for target in &targets {
                println!("{}", describe(target));
            }
            log::info!("✓ Config OK ({} targets)", targets.len());
        }
    }

    Ok(())
}

/// Wire storage, HTTP client and checker for the given state directory.
async fn build_coordinator(root: &std::path::Path, config: &Config) -> Result<Coordinator> {
    let storage = LocalStorage::new(root);
    storage.init().await?;
    let updates = Arc::new(UpdateStore::load(config::updates_path(root)).await?);

    let client = http::create_async_client(&config.settings)?;
    let fetcher = Fetcher::new(client).with_deadline(config.settings.timeout());
    let checker = PageChecker::new(fetcher, Arc::new(storage), updates);

    Ok(Coordinator::new(checker))
}

/// Forward commands typed on stdin to the watcher.
async fn read_commands(handle: WatcherHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let command = match line.trim() {
            "" => continue,
            "r" | "recheck" => WatchCommand::ForceRecheck,
            "u" | "updates" => WatchCommand::ListUpdates,
            "c" | "clear" => WatchCommand::ClearUpdates,
            other => {
                log::warn!("Unknown command '{}' (recheck, updates, clear)", other);
                continue;
            }
        };

        match handle.send(command).await {
            Ok(Reply::Rechecked(report)) => println!("Rechecked {} target(s)", report.total()),
            Ok(Reply::Updates(entries)) => print_updates(&entries),
            Ok(Reply::Cleared(count)) => println!("Cleared {count} update(s)"),
            Err(e) => {
                log::debug!("Command reader stopping: {}", e);
                break;
            }
        }
    }
}

fn describe(target: &Target) -> String {
    let transforms: Vec<&str> = target.transforms.iter().map(|t| t.name()).collect();
    format!(
        "{}  selection='{}' strip=[{}] threshold={} every {}s",
        target.url,
        target.selection,
        transforms.join(", "),
        target.threshold,
        target.interval.as_secs()
    )
}

fn print_report(targets: &[Arc<Target>], report: &CycleReport) {
    for target in targets {
        let url = target.id();
        let line = match (report.status_of(url), report.failure_of(url)) {
            (Some(CheckStatus::NewlyObserved), _) => "new".to_string(),
            (Some(CheckStatus::Unchanged { score }), _) => format!("unchanged ({score:.2}%)"),
            (Some(CheckStatus::Changed { score, delivery }), _) => match delivery {
                Delivery::Skipped => format!("CHANGED ({score:.2}%)"),
                Delivery::Sent => format!("CHANGED ({score:.2}%), notified"),
                Delivery::Failed(e) => format!("CHANGED ({score:.2}%), notification failed: {e}"),
            },
            (None, Some(failure)) => format!("error {failure}"),
            (None, None) => "not checked".to_string(),
        };
        println!("{url}  {line}");
    }
}

fn print_updates(entries: &[UpdateEntry]) {
    if entries.is_empty() {
        println!("No updates.");
        return;
    }
    for entry in entries {
        println!(
            "{}  (since {})",
            entry.url,
            entry.flagged_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
}
