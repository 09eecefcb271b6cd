//! Source URI parsing and validation

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use url::Url;

use crate::{Error, Result};

/// Supported source schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Git remote over `http://`
    GitHttp,
    /// Git remote over `https://`
    GitHttps,
    /// FTP root
    Ftp,
    /// SSH/SFTP root
    Scp,
    /// Directory on the local filesystem
    LocalDir,
}

impl Scheme {
    /// All supported schemes.
    pub const ALL: [Scheme; 5] = [
        Scheme::GitHttp,
        Scheme::GitHttps,
        Scheme::Ftp,
        Scheme::Scp,
        Scheme::LocalDir,
    ];

    /// The URI scheme string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitHttp => "http",
            Self::GitHttps => "https",
            Self::Ftp => "ftp",
            Self::Scp => "scp",
            Self::LocalDir => "localdir",
        }
    }

    /// Port used when the URI does not name one.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::GitHttp => Some(80),
            Self::GitHttps => Some(443),
            Self::Ftp => Some(21),
            Self::Scp => Some(22),
            Self::LocalDir => None,
        }
    }

    pub fn is_git(&self) -> bool {
        matches!(self, Self::GitHttp | Self::GitHttps)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        Scheme::ALL
            .into_iter()
            .find(|scheme| scheme.as_str() == s)
            .ok_or(())
    }
}

/// Username/password pair, passed through opaquely.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none()
    }

    /// Fill fields missing from `self` with the ones from `fallback`.
    pub fn or(self, fallback: Credentials) -> Credentials {
        Credentials {
            username: self.username.or(fallback.username),
            password: self.password.or(fallback.password),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A parsed and validated source URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriDescriptor {
    raw: String,
    scheme: Scheme,
    host: Option<String>,
    port: Option<u16>,
    path: String,
    credentials: Option<Credentials>,
}

impl UriDescriptor {
    /// Parse and validate `uri`.
    ///
    /// - The scheme must be one of `http`, `https`, `ftp`, `scp`, `localdir`.
    /// - `localdir` must name an existing directory.
    /// - `ftp` and `scp` need a host and a path other than `/`.
    /// - `http`/`https` remotes are checked lazily on first fetch.
    pub fn parse(uri: &str) -> Result<Self> {
        let url = Url::parse(uri.trim()).map_err(|e| Error::invalid(uri, e.to_string()))?;

        let scheme: Scheme = url
            .scheme()
            .parse()
            .map_err(|_| Error::invalid(uri, format!("unsupported scheme '{}'", url.scheme())))?;

        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .map(str::to_string);
        let path = decode(uri, url.path())?;

        let username = Some(decode(uri, url.username())?).filter(|u| !u.is_empty());
        let password = url.password().map(|p| decode(uri, p)).transpose()?;
        let credentials = Some(Credentials::new(username, password)).filter(|c| !c.is_empty());

        match scheme {
            Scheme::LocalDir => {
                let dir = Path::new(&path);
                if path.is_empty() || !dir.is_dir() {
                    return Err(Error::invalid(
                        uri,
                        format!("'{}' is not an existing directory", path),
                    ));
                }
            }
            Scheme::Ftp | Scheme::Scp => {
                if host.is_none() {
                    return Err(Error::invalid(uri, "a host is required"));
                }
                if path.is_empty() || path == "/" {
                    return Err(Error::invalid(uri, "a non-root path is required"));
                }
            }
            Scheme::GitHttp | Scheme::GitHttps => {}
        }

        Ok(Self {
            raw: uri.trim().to_string(),
            scheme,
            host,
            port: url.port(),
            path,
            credentials,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// The explicit port, if the URI names one.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// The explicit port or the scheme default.
    pub fn effective_port(&self) -> Option<u16> {
        self.port.or_else(|| self.scheme.default_port())
    }

    /// Decoded path component.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Remote path without a trailing slash.
    pub fn remote_root(&self) -> &str {
        let trimmed = self.path.trim_end_matches('/');
        if trimmed.is_empty() { "/" } else { trimmed }
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Replace the URI credentials field by field with `overrides`.
    pub fn with_credentials(mut self, overrides: Credentials) -> Self {
        let merged = match self.credentials.take() {
            Some(existing) => overrides.or(existing),
            None => overrides,
        };
        self.credentials = Some(merged).filter(|c| !c.is_empty());
        self
    }

    /// The local directory for `localdir` sources, canonicalised.
    pub fn local_dir(&self) -> Option<PathBuf> {
        match self.scheme {
            Scheme::LocalDir => {
                let path = Path::new(&self.path);
                Some(dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()))
            }
            _ => None,
        }
    }

    /// The URI with userinfo stripped, suitable to hand to a git client.
    pub fn remote_url(&self) -> String {
        match Url::parse(&self.raw) {
            Ok(mut url) => {
                let _ = url.set_username("");
                let _ = url.set_password(None);
                url.to_string()
            }
            Err(_) => self.raw.clone(),
        }
    }
}

impl fmt::Display for UriDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.host() {
            Some(host) => write!(f, "{}://{}{}", self.scheme, host, self.path),
            None => write!(f, "{}://{}", self.scheme, self.path),
        }
    }
}

fn decode(uri: &str, component: &str) -> Result<String> {
    urlencoding::decode(component)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| Error::invalid(uri, format!("bad percent-encoding: {e}")))
}
