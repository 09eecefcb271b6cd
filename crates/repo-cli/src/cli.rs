//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{ArgGroup, Parser, ValueEnum};
use repo_fs::GitrootMode;
use repo_source::StreamType;

/// Repository sync - keep local mirrors of git, FTP, SFTP and local sources current
#[derive(Parser, Debug)]
#[command(name = "repo-sync")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("sources").required(true).multiple(true).args(["uris", "config"])))]
pub struct Cli {
    /// Source to watch: http(s)://, ftp://, scp:// or localdir:// (repeatable)
    #[arg(short, long = "uri", value_name = "URI")]
    pub uris: Vec<String>,

    /// Watch-list file (.toml, .json, .yaml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// How sources are followed
    #[arg(long, value_enum, default_value_t = StreamArg::Offlinestream)]
    pub stream_type: StreamArg,

    /// Cache root layout
    #[arg(long, value_enum, default_value_t = GitrootArg::Single)]
    pub gitroot: GitrootArg,

    /// Cache root(s); two comma-separated paths in multiple mode
    #[arg(long, env = "GITROOT", value_name = "PATH[,PATH]")]
    pub gitroot_path: Option<String>,

    /// Poll interval in seconds (default: 30 for livestream, 60 otherwise)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// FTP username (default: anonymous)
    #[arg(long, value_name = "USER")]
    pub ftp_user: Option<String>,

    /// FTP password
    #[arg(long, value_name = "PASS")]
    pub ftp_pass: Option<String>,

    /// SSH username (required for scp:// sources)
    #[arg(long, value_name = "USER")]
    pub scp_user: Option<String>,

    /// SSH password (agent authentication when absent)
    #[arg(long, value_name = "PASS")]
    pub scp_pass: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run until Ctrl-C instead of reading commands from stdin
    #[arg(long)]
    pub no_interactive: bool,
}

/// `--stream-type` values
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamArg {
    /// Probe the remote reference list, write nothing
    Livestream,
    /// Keep a local mirror
    Offlinestream,
}

impl From<StreamArg> for StreamType {
    fn from(arg: StreamArg) -> Self {
        match arg {
            StreamArg::Livestream => StreamType::Livestream,
            StreamArg::Offlinestream => StreamType::Offlinestream,
        }
    }
}

/// `--gitroot` values
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitrootArg {
    /// One cache root
    Single,
    /// An ordered pair of cache roots
    Multiple,
}

impl From<GitrootArg> for GitrootMode {
    fn from(arg: GitrootArg) -> Self {
        match arg {
            GitrootArg::Single => GitrootMode::Single,
            GitrootArg::Multiple => GitrootMode::Multiple,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repeated_uris() {
        let cli = Cli::try_parse_from([
            "repo-sync",
            "--uri",
            "https://example.com/a.git",
            "-u",
            "ftp://files.example.com/pub/b",
        ])
        .unwrap();
        assert_eq!(cli.uris.len(), 2);
        assert_eq!(cli.stream_type, StreamArg::Offlinestream);
        assert_eq!(cli.gitroot, GitrootArg::Single);
        assert!(!cli.no_interactive);
    }

    #[test]
    fn test_sources_are_required() {
        assert!(Cli::try_parse_from(["repo-sync", "--verbose"]).is_err());
    }

    #[test]
    fn test_config_alone_is_enough() {
        let cli = Cli::try_parse_from(["repo-sync", "--config", "watch.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("watch.toml")));
        assert!(cli.uris.is_empty());
    }

    #[test]
    fn test_value_enums_and_credentials() {
        let cli = Cli::try_parse_from([
            "repo-sync",
            "-u",
            "scp://ssh.example.com/srv/p",
            "--stream-type",
            "livestream",
            "--gitroot",
            "multiple",
            "--gitroot-path",
            "/a,/b",
            "--scp-user",
            "deploy",
            "--interval",
            "15",
        ])
        .unwrap();
        assert_eq!(StreamType::from(cli.stream_type), StreamType::Livestream);
        assert_eq!(GitrootMode::from(cli.gitroot), GitrootMode::Multiple);
        assert_eq!(cli.gitroot_path.as_deref(), Some("/a,/b"));
        assert_eq!(cli.scp_user.as_deref(), Some("deploy"));
        assert_eq!(cli.interval, Some(15));
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(Cli::try_parse_from(["repo-sync", "-u", "x", "--interval", "0"]).is_err());
    }
}
