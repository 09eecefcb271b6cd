//! SFTP sessions over `ssh2`

use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::{Duration, SystemTime};

use ssh2::{ErrorCode, Session, Sftp};

use crate::{Connector, Error, RemoteEntry, RemoteSession, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const SESSION_TIMEOUT_MS: u32 = 30_000;

// libssh2 session error codes that mean the transport is gone
const LIBSSH2_ERROR_SOCKET_SEND: i32 = -7;
const LIBSSH2_ERROR_TIMEOUT: i32 = -9;
const LIBSSH2_ERROR_SOCKET_DISCONNECT: i32 = -13;
const LIBSSH2_ERROR_SOCKET_RECV: i32 = -43;

/// Connection parameters for one SSH endpoint.
///
/// A username is mandatory; there is no implicit identity.
#[derive(Clone)]
pub struct SftpConnector {
    host: String,
    port: u16,
    username: String,
    password: Option<String>,
}

impl SftpConnector {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self> {
        let host = host.into();
        let username = username
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::MissingUsername { host: host.clone() })?;
        Ok(Self {
            host,
            port,
            username,
            password,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    fn connection_error(&self, message: impl ToString) -> Error {
        Error::Connection {
            endpoint: self.endpoint(),
            message: message.to_string(),
        }
    }

    fn open_tcp(&self) -> Result<TcpStream> {
        let addr = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| self.connection_error(e))?
            .next()
            .ok_or_else(|| self.connection_error("host did not resolve"))?;
        TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).map_err(|e| self.connection_error(e))
    }

    fn authenticate(&self, session: &Session) -> Result<()> {
        let attempt = match &self.password {
            Some(password) => session.userauth_password(&self.username, password),
            None => session.userauth_agent(&self.username),
        };
        let rejected = |message: String| Error::Auth {
            username: self.username.clone(),
            message,
        };
        attempt.map_err(|e| rejected(e.message().to_string()))?;
        if session.authenticated() {
            Ok(())
        } else {
            Err(rejected("server did not accept the credentials".to_string()))
        }
    }
}

impl std::fmt::Debug for SftpConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SftpConnector")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Connector for SftpConnector {
    type Session = SftpSession;

    fn connect(&self) -> Result<SftpSession> {
        let tcp = self.open_tcp()?;
        let mut session = Session::new().map_err(|e| self.connection_error(e))?;
        session.set_tcp_stream(tcp);
        session.set_timeout(SESSION_TIMEOUT_MS);
        session.handshake().map_err(|e| self.connection_error(e))?;

        if let Err(e) = self.authenticate(&session) {
            let _ = session.disconnect(None, "authentication failed", None);
            return Err(e);
        }

        let sftp = match session.sftp() {
            Ok(sftp) => sftp,
            Err(e) => {
                let _ = session.disconnect(None, "sftp subsystem unavailable", None);
                return Err(self.connection_error(e));
            }
        };

        tracing::debug!(endpoint = %self.endpoint(), user = %self.username, "SFTP session opened");
        Ok(SftpSession {
            session,
            sftp: Some(sftp),
            endpoint: self.endpoint(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// An authenticated SSH session with its SFTP channel.
pub struct SftpSession {
    session: Session,
    sftp: Option<Sftp>,
    endpoint: String,
}

impl SftpSession {
    fn sftp(&self) -> Result<&Sftp> {
        self.sftp.as_ref().ok_or_else(|| Error::Connection {
            endpoint: self.endpoint.clone(),
            message: "session already closed".to_string(),
        })
    }

    fn map_error(&self, path: &str, error: ssh2::Error) -> Error {
        match error.code() {
            ErrorCode::Session(
                LIBSSH2_ERROR_SOCKET_SEND
                | LIBSSH2_ERROR_TIMEOUT
                | LIBSSH2_ERROR_SOCKET_DISCONNECT
                | LIBSSH2_ERROR_SOCKET_RECV,
            ) => Error::Connection {
                endpoint: self.endpoint.clone(),
                message: error.message().to_string(),
            },
            _ => Error::protocol(path, error.message()),
        }
    }
}

impl RemoteSession for SftpSession {
    fn list(&mut self, path: &str) -> Result<Vec<RemoteEntry>> {
        let listing = self
            .sftp()?
            .readdir(Path::new(path))
            .map_err(|e| self.map_error(path, e))?;

        Ok(listing
            .into_iter()
            .filter_map(|(entry_path, stat)| {
                let name = entry_path.file_name()?.to_string_lossy().into_owned();
                if name == "." || name == ".." {
                    return None;
                }
                if stat.is_dir() {
                    Some(RemoteEntry::directory(name))
                } else {
                    let modified = stat
                        .mtime
                        .map(|secs| SystemTime::UNIX_EPOCH + Duration::from_secs(secs));
                    Some(RemoteEntry::file(name, stat.size, modified))
                }
            })
            .collect())
    }

    fn download(&mut self, path: &str) -> Result<Vec<u8>> {
        let mut file = self
            .sftp()?
            .open(Path::new(path))
            .map_err(|e| self.map_error(path, e))?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .map_err(|e| Error::protocol(path, e))?;
        Ok(buffer)
    }

    fn close(&mut self) -> Result<()> {
        let Some(mut sftp) = self.sftp.take() else {
            return Ok(());
        };
        tracing::debug!(endpoint = %self.endpoint, "Closing SFTP session");
        let shutdown = sftp.shutdown();
        drop(sftp);
        let disconnect = self.session.disconnect(None, "mirror cycle complete", None);
        shutdown
            .and(disconnect)
            .map_err(|e| self.map_error("/", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_username_is_rejected() {
        let result = SftpConnector::new("ssh.example.com", 22, None, Some("pw".into()));
        assert!(matches!(result, Err(Error::MissingUsername { host }) if host == "ssh.example.com"));

        let empty = SftpConnector::new("ssh.example.com", 22, Some(String::new()), None);
        assert!(matches!(empty, Err(Error::MissingUsername { .. })));
    }

    #[test]
    fn test_debug_hides_password() {
        let connector =
            SftpConnector::new("ssh.example.com", 22, Some("deploy".into()), Some("hunter2".into()))
                .unwrap();
        let rendered = format!("{:?}", connector);
        assert!(rendered.contains("deploy"));
        assert!(!rendered.contains("hunter2"));
    }
}
