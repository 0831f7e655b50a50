//! Directory session provider
//!
//! Picks the credential for an operation and hands out sessions scoped to it.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use ez_directory_backend::{
    Credential, DirectoryBackend, DirectoryError, DirectoryPath, DirectorySession,
};

use crate::error::CoreResult;

/// A session owned by exactly one logical operation.
///
/// Dropping it releases the connection; [`finish`](Self::finish) additionally unbinds
/// gracefully when the operation succeeded.
pub struct Session {
    inner: Box<dyn DirectorySession>,
}

impl Session {
    pub fn new(inner: Box<dyn DirectorySession>) -> Self {
        Self { inner }
    }

    /// Ends the operation: closes the session on success, drops it on failure.
    ///
    /// A failing close after a successful operation is logged, not returned.
    pub async fn finish<T>(mut self, result: Result<T, DirectoryError>) -> CoreResult<T> {
        match result {
            Ok(value) => {
                if let Err(e) = self.inner.close().await {
                    log::warn!("[{}] Failed to close session: {e}", self.inner.path());
                }
                Ok(value)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Deref for Session {
    type Target = dyn DirectorySession;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DerefMut for Session {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut()
    }
}

/// Resolves credentials and opens sessions.
///
/// Precedence: an explicit credential with non-blank username and password, else the
/// configured default under the same rule, else the ambient identity.
#[derive(Clone)]
pub struct SessionProvider {
    backend: Arc<dyn DirectoryBackend>,
    default_credential: Option<Credential>,
}

impl SessionProvider {
    pub fn new(backend: Arc<dyn DirectoryBackend>, default_credential: Option<Credential>) -> Self {
        Self {
            backend,
            default_credential,
        }
    }

    pub fn backend(&self) -> &Arc<dyn DirectoryBackend> {
        &self.backend
    }

    pub fn default_credential(&self) -> Option<&Credential> {
        self.default_credential.as_ref()
    }

    /// Replace the default credential; `None` falls back to the ambient identity.
    pub fn set_default_credential(&mut self, credential: Option<Credential>) {
        self.default_credential = credential;
    }

    /// The credential an operation would bind with, `None` meaning ambient identity.
    pub fn effective_credential<'a>(
        &'a self,
        explicit: Option<&'a Credential>,
    ) -> Option<&'a Credential> {
        explicit
            .filter(|c| c.is_usable())
            .or_else(|| self.default_credential.as_ref().filter(|c| c.is_usable()))
    }

    /// Open a session on `path` with the effective credential.
    pub async fn resolve_session(
        &self,
        path: &DirectoryPath,
        credential: Option<&Credential>,
    ) -> CoreResult<Session> {
        let credential = self.effective_credential(credential);
        log::debug!(
            "Opening session on {path} as {}",
            credential.map_or("<ambient>", |c| c.username.as_str())
        );
        let inner = self.backend.open_session(path, credential).await?;
        Ok(Session::new(inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockBackend;

    fn provider_with(default: Option<Credential>) -> (Arc<MockBackend>, SessionProvider) {
        let backend = Arc::new(MockBackend::new());
        let provider = SessionProvider::new(backend.clone(), default);
        (backend, provider)
    }

    #[test]
    fn explicit_credential_wins() {
        let (_, provider) = provider_with(Some(Credential::new("default", "pw")));
        let explicit = Credential::new("alice", "secret");
        assert_eq!(
            provider.effective_credential(Some(&explicit)).map(|c| c.username.as_str()),
            Some("alice")
        );
    }

    #[test]
    fn blank_explicit_falls_back_to_default() {
        let (_, provider) = provider_with(Some(Credential::new("default", "pw")));
        let blank = Credential::new("alice", " ");
        assert_eq!(
            provider.effective_credential(Some(&blank)).map(|c| c.username.as_str()),
            Some("default")
        );
    }

    #[test]
    fn blank_default_falls_back_to_ambient() {
        let (_, provider) = provider_with(Some(Credential::new("", "pw")));
        assert!(provider.effective_credential(None).is_none());
        let (_, provider) = provider_with(None);
        assert!(provider.effective_credential(Some(&Credential::default())).is_none());
    }

    #[tokio::test]
    async fn resolve_session_binds_with_effective_credential() {
        let (backend, provider) = provider_with(Some(Credential::new("svc", "pw")));
        let path = DirectoryPath::parse("LDAP://DC=corp,DC=example,DC=com").unwrap();
        let session = provider.resolve_session(&path, None).await.unwrap();
        assert_eq!(backend.binds(), vec![Some("svc".to_string())]);
        session.finish(Ok(())).await.unwrap();
        assert_eq!(backend.open_sessions(), 0);
        assert_eq!(backend.closed_sessions(), 1);
    }

    #[tokio::test]
    async fn failed_operation_still_releases_session() {
        let (backend, provider) = provider_with(None);
        let path = DirectoryPath::parse("LDAP://DC=corp").unwrap();
        let session = provider.resolve_session(&path, None).await.unwrap();
        assert_eq!(backend.open_sessions(), 1);
        let result: CoreResult<()> = session
            .finish(Err(DirectoryError::PermissionDenied {
                endpoint: "mock".into(),
                raw_message: None,
            }))
            .await;
        assert!(result.is_err());
        assert_eq!(backend.open_sessions(), 0);
        assert_eq!(backend.closed_sessions(), 0);
    }
}
