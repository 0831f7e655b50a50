//! LDAP / Active Directory backend

mod error;
mod modify;
mod session;

use std::time::Duration;

use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapConnSettings};

use crate::error::{DirectoryError, Result};
use crate::path::DirectoryPath;
use crate::traits::{DirectoryBackend, DirectoryErrorMapper, DirectorySession, ErrorContext};
use crate::types::{BackendConfig, Credential};

use error::LdapErrorMapper;
use session::LdapSession;

/// Directory backend speaking LDAP (v3) to Active Directory or any compatible server.
pub struct LdapBackend {
    config: BackendConfig,
}

impl LdapBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// `(url, endpoint label)` for a path, falling back to the configured default host.
    fn resolve(&self, path: &DirectoryPath) -> Result<(String, String)> {
        let host = path
            .host()
            .or(self.config.default_host.as_deref())
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| DirectoryError::InvalidPath {
                path: path.to_string(),
                detail: "no server in path and no default host configured".to_string(),
            })?;
        let port = path.port().unwrap_or_else(|| self.config.effective_port());
        let scheme = if self.config.use_tls { "ldaps" } else { "ldap" };
        Ok((format!("{scheme}://{host}:{port}"), format!("{host}:{port}")))
    }
}

#[async_trait]
impl DirectoryBackend for LdapBackend {
    fn id(&self) -> &'static str {
        "ldap"
    }

    async fn open_session(
        &self,
        path: &DirectoryPath,
        credential: Option<&Credential>,
    ) -> Result<Box<dyn DirectorySession>> {
        let (url, endpoint) = self.resolve(path)?;
        let mapper = LdapErrorMapper::new(endpoint);

        log::debug!("CONNECT {url}");
        let settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(self.config.connect_timeout_secs));
        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| mapper.from_ldap(e, ErrorContext::default()))?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                log::warn!("LDAP connection driver error: {e}");
            }
        });

        let op_timeout = self.config.operation_timeout_secs.map(Duration::from_secs);
        if let Some(timeout) = op_timeout {
            ldap.with_timeout(timeout);
        }

        let (bind_name, password) = match credential {
            Some(credential) => (credential.username_with_domain(), credential.password.as_str()),
            None => (String::new(), ""),
        };
        log::debug!(
            "BIND [{}] as {}",
            mapper.endpoint(),
            if bind_name.is_empty() { "<anonymous>" } else { &bind_name }
        );
        ldap.simple_bind(&bind_name, password)
            .await
            .and_then(ldap3::LdapResult::success)
            .map_err(|e| match e {
                // A refused bind must not read as a missing object.
                ldap3::LdapError::LdapResult { result } if result.rc == 32 => {
                    DirectoryError::InvalidCredentials {
                        endpoint: mapper.endpoint().to_string(),
                        raw_message: Some(result.text),
                    }
                }
                other => mapper.from_ldap(other, ErrorContext::for_dn(path.dn())),
            })?;

        Ok(Box::new(LdapSession {
            ldap,
            path: path.clone(),
            mapper,
            op_timeout,
            closed: false,
        }))
    }
}
