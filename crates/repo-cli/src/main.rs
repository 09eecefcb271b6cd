//! Repository sync CLI
//!
//! Watches one or more sources and keeps their local mirrors current.
//!
//! # Usage
//!
//! ```bash
//! repo-sync --uri https://example.com/org/project.git
//! repo-sync --uri ftp://files.example.com/pub/project --ftp-user bob --ftp-pass secret
//! repo-sync --config watch.toml --gitroot multiple --gitroot-path /cache/a,/cache/b
//! ```
//!
//! # Environment Variables
//!
//! - `GITROOT`: cache root(s), same as `--gitroot-path`
//! - `RUST_LOG`: log filter (default: `repo_sync=info,repo_watch=info`)
//!
//! Logs go to stderr; stdout carries the interactive prompt and command
//! output.

mod cli;
mod collaborator;
mod error;
mod interactive;
mod sources;

use clap::Parser;
use colored::Colorize;
use repo_fs::{RootSet, default_cache_base};
use repo_watch::WatcherSupervisor;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use collaborator::TreeSummaryCollaborator;
use error::Result;

const DEFAULT_FILTER: &str = "repo_sync=info,repo_watch=info";
const VERBOSE_FILTER: &str =
    "repo_sync=debug,repo_watch=debug,repo_git=debug,repo_transfer=debug,repo_source=debug,repo_fs=debug";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "Exiting");
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let roots = RootSet::resolve(
        cli.gitroot.into(),
        cli.gitroot_path.as_deref(),
        default_cache_base().as_deref(),
    )?;
    tracing::debug!(roots = %roots.env_value(), "Cache roots ready");

    let specs = sources::collect(&cli)?;
    let watchers = sources::build_watchers(&specs, &roots)?;

    let mut supervisor = WatcherSupervisor::new();
    for watcher in watchers {
        if let Err(e) = supervisor.spawn(watcher) {
            shutdown_all(&mut supervisor).await;
            return Err(e.into());
        }
    }

    let outcome = if cli.no_interactive {
        tracing::info!(count = supervisor.len(), "Watching until interrupted");
        tokio::signal::ctrl_c().await.map_err(Into::into)
    } else {
        interactive::run(&supervisor, &TreeSummaryCollaborator).await
    };

    shutdown_all(&mut supervisor).await;
    outcome
}

/// Stop every watcher, waiting until no loop holds a remote session.
async fn shutdown_all(supervisor: &mut WatcherSupervisor) {
    supervisor.shutdown().await;
    while !supervisor.is_empty() {
        tracing::info!(pending = ?supervisor.names(), "Waiting for watchers to finish");
        supervisor.shutdown().await;
    }
}
