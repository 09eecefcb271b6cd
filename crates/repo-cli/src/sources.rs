//! Turning command-line and watch-list input into watchers
//!
//! Every configuration error surfaces here, before any watch loop starts.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use repo_fs::{ConfigStore, RepositoryEntry, RootSet};
use repo_source::{Credentials, RepoMirror, Scheme, StreamType, UriDescriptor};
use repo_watch::Watcher;

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// One configured source, validated but not yet bound to a cache root.
#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub descriptor: UriDescriptor,
    pub stream_type: StreamType,
    pub interval: Option<Duration>,
}

/// Collect sources from `--uri` flags and the `--config` watch list.
pub fn collect(cli: &Cli) -> Result<Vec<SourceSpec>> {
    let stream_type = StreamType::from(cli.stream_type);
    let interval = cli.interval.map(Duration::from_secs);

    let mut specs = Vec::new();
    for uri in &cli.uris {
        let descriptor = UriDescriptor::parse(uri)?;
        let overrides = flag_credentials(cli, descriptor.scheme());
        specs.push(SourceSpec {
            descriptor: descriptor.with_credentials(overrides),
            stream_type,
            interval,
        });
    }

    if let Some(path) = &cli.config {
        let list = ConfigStore::new().load_watch_list(path)?;
        for entry in &list.repositories {
            specs.push(from_entry(cli, entry, stream_type, interval)?);
        }
    }

    if specs.is_empty() {
        return Err(CliError::user("no sources configured"));
    }
    Ok(specs)
}

fn from_entry(
    cli: &Cli,
    entry: &RepositoryEntry,
    default_stream: StreamType,
    default_interval: Option<Duration>,
) -> Result<SourceSpec> {
    let descriptor = UriDescriptor::parse(&entry.uri)?;
    let stream_type = match &entry.stream_type {
        Some(value) => value.parse()?,
        None => default_stream,
    };
    let interval = entry
        .interval_secs
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .or(default_interval);
    let overrides = Credentials::new(entry.username.clone(), entry.password.clone())
        .or(flag_credentials(cli, descriptor.scheme()));

    Ok(SourceSpec {
        descriptor: descriptor.with_credentials(overrides),
        stream_type,
        interval,
    })
}

/// Credentials passed with `--ftp-*` / `--scp-*` for `scheme`.
fn flag_credentials(cli: &Cli, scheme: Scheme) -> Credentials {
    match scheme {
        Scheme::Ftp => Credentials::new(cli.ftp_user.clone(), cli.ftp_pass.clone()),
        Scheme::Scp => Credentials::new(cli.scp_user.clone(), cli.scp_pass.clone()),
        _ => Credentials::new(None, None),
    }
}

/// Derive mirrors under `roots` and build one watcher per source.
///
/// Two sources that would share a mirror path are rejected.
pub fn build_watchers(specs: &[SourceSpec], roots: &RootSet) -> Result<Vec<Watcher>> {
    let mut seen: HashMap<PathBuf, String> = HashMap::new();
    let mut watchers = Vec::with_capacity(specs.len());

    for spec in specs {
        let mirror = RepoMirror::new(spec.descriptor.clone(), roots)?;
        if let Some(existing) = seen.get(mirror.local_path()) {
            return Err(repo_watch::Error::DuplicateMirror {
                path: mirror.local_path().to_path_buf(),
                existing: existing.clone(),
            }
            .into());
        }
        seen.insert(mirror.local_path().to_path_buf(), spec.descriptor.to_string());

        watchers.push(Watcher::for_source(&mirror, spec.stream_type, spec.interval)?);
    }

    Ok(watchers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use repo_fs::GitrootMode;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["repo-sync"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flag_credentials_fill_uri() {
        let cli = cli(&["-u", "ftp://files.example.com/pub/p", "--ftp-user", "bob", "--ftp-pass", "pw"]);
        let specs = collect(&cli).unwrap();
        let creds = specs[0].descriptor.credentials().unwrap();
        assert_eq!(creds.username.as_deref(), Some("bob"));
        assert_eq!(creds.password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_ftp_flags_do_not_leak_into_scp() {
        let cli = cli(&["-u", "scp://ssh.example.com/srv/p", "--ftp-user", "bob"]);
        let specs = collect(&cli).unwrap();
        assert!(specs[0].descriptor.credentials().is_none());
    }

    #[test]
    fn test_invalid_uri_is_fatal() {
        let cli = cli(&["-u", "gopher://example.com/x"]);
        assert!(matches!(collect(&cli), Err(CliError::Source(_))));
    }

    #[test]
    fn test_watch_list_entries_override_defaults() {
        let temp = TempDir::new().unwrap();
        let list = temp.path().join("watch.toml");
        std::fs::write(
            &list,
            r#"
[[repository]]
uri = "https://example.com/org/live.git"
stream_type = "livestream"

[[repository]]
uri = "scp://ssh.example.com/srv/project"
username = "deploy"
interval_secs = 5
"#,
        )
        .unwrap();
        let cli = cli(&["--config", list.to_str().unwrap(), "--scp-pass", "pw"]);

        let specs = collect(&cli).unwrap();

        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].stream_type, StreamType::Livestream);
        assert_eq!(specs[1].stream_type, StreamType::Offlinestream);
        assert_eq!(specs[1].interval, Some(Duration::from_secs(5)));
        let creds = specs[1].descriptor.credentials().unwrap();
        assert_eq!(creds.username.as_deref(), Some("deploy"));
        assert_eq!(creds.password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_same_mirror_twice_is_rejected() {
        let temp = TempDir::new().unwrap();
        let roots = RootSet::configure(GitrootMode::Single, temp.path()).unwrap();
        let cli = cli(&[
            "-u",
            "https://example.com/a/project.git",
            "-u",
            "https://mirror.example.org/b/project.git",
        ]);
        let specs = collect(&cli).unwrap();

        let result = build_watchers(&specs, &roots);

        assert!(matches!(
            result,
            Err(CliError::Watch(repo_watch::Error::DuplicateMirror { .. }))
        ));
    }

    #[test]
    fn test_build_watchers_names_from_uri() {
        let temp = TempDir::new().unwrap();
        let roots = RootSet::configure(GitrootMode::Single, temp.path()).unwrap();
        let cli = cli(&["-u", "https://example.com/a/alpha.git", "-u", "ftp://f.example.com/pub/beta"]);
        let watchers = build_watchers(&collect(&cli).unwrap(), &roots).unwrap();
        let names: Vec<String> = watchers.iter().map(Watcher::name).collect();
        assert_eq!(names, vec!["alpha".to_string(), "beta".to_string()]);
    }
}
