//! Chapter Notifier CLI
//!
//! Long-running poller by default; `run --once` suits cron-style scheduling.

use std::path::PathBuf;

use chapter_notifier::{
    config,
    error::Result,
    pipeline::PollLoop,
    storage::{LocalStorage, SeenStore},
};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

/// Chapter Notifier - announce new manga chapters on Telegram
#[derive(Parser, Debug)]
#[command(name = "chapter-notifier", version, about = "Announce new manga chapters on Telegram")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "chapter-notifier.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the target page and announce new chapters
    Run {
        /// Exit after the first cycle that reaches the page
        #[arg(long)]
        once: bool,
    },

    /// Show what would be announced, without sending or saving
    Check,

    /// Validate configuration
    Validate,

    /// Show notification history info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Cancel `token` on Ctrl+C or SIGTERM.
fn spawn_shutdown_listener(token: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = term.recv() => {}
                    }
                }
                Err(e) => {
                    log::warn!("SIGTERM handler unavailable: {}", e);
                    let _ = tokio::signal::ctrl_c().await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }

        log::info!("Received shutdown signal, stopping after the current step...");
        token.cancel();
    });
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            log::warn!("Ignoring unreadable .env file: {}", e);
        }
    }

    let mut config = config::load(&cli.config);
    log::debug!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Run { once } => {
            if once {
                config.poll.run_once = true;
            }
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }

            let poller = PollLoop::from_config(&config).await?;
            let token = CancellationToken::new();
            spawn_shutdown_listener(token.clone());

            let summary = poller.run(token).await;
            log::info!(
                "Done: {} chapters announced, {} failed",
                summary.sent,
                summary.failed
            );
        }

        Command::Check => {
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }

            let poller = PollLoop::dry_run(&config)?;
            let diff = poller.preview().await?;

            log::info!(
                "{} new, {} already announced, {} untitled, {} duplicates",
                diff.added.len(),
                diff.already_seen,
                diff.untitled,
                diff.duplicates
            );
            for item in &diff.added {
                log::info!("Would send:\n{}", poller.render(item));
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK (target: {})", config.target.url);
            log::info!("State file: {}", config.state_path().display());
        }

        Command::Info => {
            let storage = LocalStorage::new(&config.storage.dir, &config.storage.file);
            log::info!("State file: {}", storage.location());

            match storage.load().await {
                Ok(seen) if seen.is_empty() => log::info!("No chapters announced yet."),
                Ok(seen) => {
                    log::info!("Announced chapters: {}", seen.len());
                    if let Some(latest) = seen.latest() {
                        log::info!(
                            "Latest: {} ({}) at {}",
                            latest.title,
                            latest.identifier,
                            latest.notified_at
                        );
                    }
                }
                Err(e) => log::error!("{}", e),
            }
        }
    }

    Ok(())
}
