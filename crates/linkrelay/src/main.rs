// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! linkrelay - rewrites shared marketplace offers with your own affiliate
//! tags.
//!
//! This is the operator binary: configuration checks, one-off link
//! resolution, and inspection of the dedup cache and source cursors.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod resolve;
mod state;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use linkrelay_config::RelayConfig;
use linkrelay_core::RelayError;

/// linkrelay - affiliate link relay.
#[derive(Parser, Debug)]
#[command(name = "linkrelay", version, about, long_about = None)]
struct Cli {
    /// Load this file instead of the standard config locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate configuration, state files and session profiles.
    Check {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Turn one shared link into an affiliate link.
    Resolve {
        url: String,
        /// Use this account instead of the currently active one.
        #[arg(long)]
        account: Option<String>,
    },
    /// Print the content fingerprint of an offer.
    Fingerprint {
        text: String,
        #[arg(long = "url")]
        urls: Vec<String>,
    },
    /// Inspect or update the dedup cache.
    Dedup {
        #[command(subcommand)]
        action: DedupAction,
    },
    /// Inspect or update the per-source cursors.
    Cursor {
        #[command(subcommand)]
        action: CursorAction,
    },
    /// Rotate through every account once and report each step.
    Rotate,
}

#[derive(Subcommand, Debug)]
enum DedupAction {
    /// Would this offer be suppressed for `destination` right now?
    Check {
        destination: String,
        text: String,
        #[arg(long = "url")]
        urls: Vec<String>,
    },
    /// Record the offer as just sent to `destination`.
    Mark {
        destination: String,
        text: String,
        #[arg(long = "url")]
        urls: Vec<String>,
    },
    /// Drop expired entries.
    Prune,
}

#[derive(Subcommand, Debug)]
enum CursorAction {
    Get { source: String },
    Set { source: String, fingerprint: String },
    List,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => linkrelay_config::load_and_validate_path(path),
        None => linkrelay_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            linkrelay_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.relay.log_level);

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("linkrelay: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &RelayConfig) -> Result<(), RelayError> {
    match command {
        Commands::Check { plain } => check::run_check(config, plain).await,
        Commands::Resolve { url, account } => {
            resolve::run_resolve(config, &url, account.as_deref()).await
        }
        Commands::Fingerprint { text, urls } => {
            state::print_fingerprint(config, &text, &urls);
            Ok(())
        }
        Commands::Dedup { action } => match action {
            DedupAction::Check {
                destination,
                text,
                urls,
            } => state::dedup_check(config, &destination, &text, &urls).await,
            DedupAction::Mark {
                destination,
                text,
                urls,
            } => state::dedup_mark(config, &destination, &text, &urls).await,
            DedupAction::Prune => state::dedup_prune(config).await,
        },
        Commands::Cursor { action } => match action {
            CursorAction::Get { source } => state::cursor_get(config, &source).await,
            CursorAction::Set {
                source,
                fingerprint,
            } => state::cursor_set(config, &source, &fingerprint).await,
            CursorAction::List => state::cursor_list(config).await,
        },
        Commands::Rotate => resolve::run_rotate(config).await,
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so command output on stdout stays scriptable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("linkrelay={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
