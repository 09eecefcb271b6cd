//! Credential plumbing for git remotes

use git2::{Cred, CredentialType, RemoteCallbacks};

/// Upper bound on credential callbacks per operation; libgit2 keeps asking
/// after a rejection.
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Username/password for an http(s) remote.
#[derive(Clone)]
pub struct GitAuth {
    pub username: String,
    pub password: Option<String>,
}

impl std::fmt::Debug for GitAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitAuth")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Build callbacks that answer credential requests.
///
/// Explicit credentials win; otherwise the configured credential helper and
/// then libgit2's default credentials are offered.
pub(crate) fn callbacks(auth: Option<&GitAuth>) -> RemoteCallbacks<'_> {
    let mut cb = RemoteCallbacks::new();
    let mut attempts = 0usize;

    cb.credentials(move |url, username_from_url, allowed| {
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str("authentication rejected by remote"));
        }

        if let Some(auth) = auth
            && allowed.contains(CredentialType::USER_PASS_PLAINTEXT)
        {
            return Cred::userpass_plaintext(&auth.username, auth.password.as_deref().unwrap_or(""));
        }

        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT)
            && let Ok(config) = git2::Config::open_default()
            && let Ok(cred) = Cred::credential_helper(&config, url, username_from_url)
        {
            return Ok(cred);
        }

        Cred::default()
    });

    cb
}
