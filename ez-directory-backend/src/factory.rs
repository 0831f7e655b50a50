//! Backend factory.

use std::sync::Arc;

use crate::error::{DirectoryError, Result};
use crate::traits::DirectoryBackend;
use crate::types::BackendConfig;

#[cfg(feature = "ldap")]
use crate::backends::LdapBackend;

/// Creates the [`DirectoryBackend`] enabled by feature flags.
///
/// The backend is returned as `Arc<dyn DirectoryBackend>` so it can be shared by every
/// service and by concurrently running unlock tasks. Without the `ldap` feature there is
/// no backend to build and the call fails with `UnsupportedOperation`.
///
/// # Examples
///
/// ```rust,no_run
/// use ez_directory_backend::{create_backend, BackendConfig};
///
/// let backend = create_backend(&BackendConfig {
///     default_host: Some("corp.example.com".to_string()),
///     ..BackendConfig::default()
/// }).unwrap();
/// assert_eq!(backend.id(), "ldap");
/// ```
pub fn create_backend(config: &BackendConfig) -> Result<Arc<dyn DirectoryBackend>> {
    if let Some(host) = config.default_host.as_deref().filter(|h| h.trim().is_empty()) {
        return Err(DirectoryError::InvalidPath {
            path: host.to_string(),
            detail: "default host is blank".to_string(),
        });
    }

    build(config)
}

#[cfg(feature = "ldap")]
#[allow(clippy::unnecessary_wraps)]
fn build(config: &BackendConfig) -> Result<Arc<dyn DirectoryBackend>> {
    Ok(Arc::new(LdapBackend::new(config.clone())))
}

#[cfg(not(feature = "ldap"))]
fn build(config: &BackendConfig) -> Result<Arc<dyn DirectoryBackend>> {
    Err(DirectoryError::UnsupportedOperation {
        endpoint: config.default_host.clone().unwrap_or_default(),
        operation: "create_backend (built without the `ldap` feature)".to_string(),
    })
}
