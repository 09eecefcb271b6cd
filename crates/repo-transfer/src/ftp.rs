//! FTP sessions over `suppaftp`

use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;
use std::time::{Duration, SystemTime};

use suppaftp::list::File as ListEntry;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream};

use crate::{Connector, Error, RemoteEntry, RemoteSession, Result};

/// Identity used when no username is configured.
pub const ANONYMOUS_USER: &str = "anonymous";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection parameters for one FTP endpoint.
#[derive(Clone)]
pub struct FtpConnector {
    host: String,
    port: u16,
    username: String,
    password: String,
}

impl FtpConnector {
    /// Missing credentials fall back to the anonymous identity.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.unwrap_or_else(|| ANONYMOUS_USER.to_string()),
            password: password.unwrap_or_default(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    fn resolve(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| self.connection_error(e))?
            .next()
            .ok_or_else(|| self.connection_error("host did not resolve"))
    }

    fn connection_error(&self, message: impl ToString) -> Error {
        Error::Connection {
            endpoint: self.endpoint(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Debug for FtpConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtpConnector")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Connector for FtpConnector {
    type Session = FtpSession;

    fn connect(&self) -> Result<FtpSession> {
        let addr = self.resolve()?;
        let mut stream =
            FtpStream::connect_timeout(addr, CONNECT_TIMEOUT).map_err(|e| self.connection_error(e))?;

        if let Err(e) = stream.login(self.username.as_str(), self.password.as_str()) {
            let _ = stream.quit();
            return Err(match e {
                FtpError::ConnectionError(io) => self.connection_error(io),
                other => Error::Auth {
                    username: self.username.clone(),
                    message: other.to_string(),
                },
            });
        }

        let endpoint = self.endpoint();
        if let Err(e) = stream.transfer_type(FileType::Binary) {
            let _ = stream.quit();
            return Err(map_ftp_error(&endpoint, "/", e));
        }

        let session = FtpSession {
            stream: Some(stream),
            endpoint,
        };
        tracing::debug!(endpoint = %session.endpoint, user = %self.username, "FTP session opened");
        Ok(session)
    }

    fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// An authenticated FTP control connection.
pub struct FtpSession {
    stream: Option<FtpStream>,
    endpoint: String,
}

impl FtpSession {
    fn stream(&mut self) -> Result<&mut FtpStream> {
        self.stream.as_mut().ok_or_else(|| Error::Connection {
            endpoint: self.endpoint.clone(),
            message: "session already closed".to_string(),
        })
    }
}

impl RemoteSession for FtpSession {
    fn list(&mut self, path: &str) -> Result<Vec<RemoteEntry>> {
        let endpoint = self.endpoint.clone();
        let lines = self
            .stream()?
            .list(Some(path))
            .map_err(|e| map_ftp_error(&endpoint, path, e))?;
        Ok(lines.iter().filter_map(|line| parse_list_line(line)).collect())
    }

    fn download(&mut self, path: &str) -> Result<Vec<u8>> {
        let endpoint = self.endpoint.clone();
        let cursor = self
            .stream()?
            .retr_as_buffer(path)
            .map_err(|e| map_ftp_error(&endpoint, path, e))?;
        Ok(cursor.into_inner())
    }

    fn close(&mut self) -> Result<()> {
        match self.stream.take() {
            Some(mut stream) => {
                tracing::debug!(endpoint = %self.endpoint, "Closing FTP session");
                stream
                    .quit()
                    .map_err(|e| map_ftp_error(&self.endpoint, "/", e))
            }
            None => Ok(()),
        }
    }
}

/// Parse one `LIST` line. Summary lines such as `total 12` and the
/// `.`/`..` entries yield `None`.
pub(crate) fn parse_list_line(line: &str) -> Option<RemoteEntry> {
    let parsed = match ListEntry::from_str(line) {
        Ok(parsed) => parsed,
        Err(_) => {
            tracing::trace!(line, "Ignoring unparsable LIST line");
            return None;
        }
    };

    let name = parsed.name().to_string();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }

    if parsed.is_directory() {
        Some(RemoteEntry::directory(name))
    } else {
        let modified: SystemTime = parsed.modified();
        Some(RemoteEntry::file(name, Some(parsed.size() as u64), Some(modified)))
    }
}

fn map_ftp_error(endpoint: &str, path: &str, error: FtpError) -> Error {
    match error {
        FtpError::ConnectionError(io) => Error::Connection {
            endpoint: endpoint.to_string(),
            message: io.to_string(),
        },
        other => Error::protocol(path, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unix_listing() {
        let dir = parse_list_line("drwxr-xr-x    2 1000     1000         4096 Jan 10 12:00 src").unwrap();
        assert_eq!(dir, RemoteEntry::directory("src"));

        let file =
            parse_list_line("-rw-r--r--    1 1000     1000          120 Jan 10 12:00 README.md").unwrap();
        assert_eq!(file.name, "README.md");
        assert!(!file.is_dir());
        assert_eq!(file.size, Some(120));
    }

    #[test]
    fn test_parse_skips_dot_entries_and_totals() {
        assert!(parse_list_line("total 8").is_none());
        assert!(parse_list_line("drwxr-xr-x    2 1000     1000         4096 Jan 10 12:00 .").is_none());
        assert!(parse_list_line("drwxr-xr-x    2 1000     1000         4096 Jan 10 12:00 ..").is_none());
    }

    #[test]
    fn test_missing_credentials_use_anonymous() {
        let connector = FtpConnector::new("files.example.com", 21, None, None);
        assert_eq!(connector.username(), ANONYMOUS_USER);
        assert_eq!(connector.endpoint(), "files.example.com:21");
    }

    #[test]
    fn test_debug_hides_password() {
        let connector = FtpConnector::new("h", 21, Some("u".into()), Some("hunter2".into()));
        assert!(!format!("{:?}", connector).contains("hunter2"));
    }
}
