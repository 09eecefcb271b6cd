//! Interactive command loop on stdin
//!
//! Commands are case-insensitive; blank lines are ignored. Unknown input
//! prints the usage line and the loop carries on.

use colored::Colorize;
use repo_watch::{Collaborator, WatchState, WatchStatus, WatcherSupervisor};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::Result;

pub const USAGE: &str = "commands: start | status | exit";

/// One parsed line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Invoke the collaborator once against every mirror
    Start,
    /// Print every watcher's state
    Status,
    /// Stop all watchers and leave
    Exit,
    /// Blank line
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let word = line.trim();
        match word.to_lowercase().as_str() {
            "" => Self::Empty,
            "start" => Self::Start,
            "status" => Self::Status,
            "exit" | "quit" => Self::Exit,
            _ => Self::Unknown(word.to_string()),
        }
    }
}

/// Read commands until `exit`, end of input or Ctrl-C.
pub async fn run(supervisor: &WatcherSupervisor, collaborator: &dyn Collaborator) -> Result<()> {
    println!("{} watching {} source(s). {}", "repo-sync".green().bold(), supervisor.len(), USAGE);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            tracing::debug!("Input closed");
            return Ok(());
        };

        match Command::parse(&line) {
            Command::Empty => {}
            Command::Exit => return Ok(()),
            Command::Status => {
                for status in supervisor.statuses() {
                    println!("{}", format_status(&status));
                }
            }
            Command::Start => {
                for run in supervisor.run_collaborator(collaborator).await {
                    match run.result {
                        Ok(summary) => println!("{} {}: {}", "ok".green(), run.repository, summary),
                        Err(e) => println!("{} {}: {}", "skipped".yellow(), run.repository, e),
                    }
                }
            }
            Command::Unknown(word) => {
                println!("{} unknown command '{}'. {}", "?".yellow().bold(), word, USAGE);
            }
        }
    }
}

/// One status line: name, state, last outcome, cycle count, last check, path.
pub fn format_status(status: &WatchStatus) -> String {
    let state = match status.state {
        WatchState::Idle => status.state.to_string().green(),
        WatchState::Syncing => status.state.to_string().cyan(),
        WatchState::Failed => status.state.to_string().red(),
        WatchState::Stopped => status.state.to_string().dimmed(),
    };
    let outcome = status
        .last_outcome
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "pending".to_string());
    let checked = status
        .last_checked
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    format!(
        "{:<20} {:<8} {:<10} {:<24} cycles={} checked={} {}",
        status.name,
        state,
        status.kind,
        outcome,
        status.cycles,
        checked,
        status.mirror_path.display()
    )
}
