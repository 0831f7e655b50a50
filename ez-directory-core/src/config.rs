//! Directory configuration

use ez_directory_backend::{Credential, DEFAULT_PAGE_SIZE, DirectoryPath};
use serde::{Deserialize, Serialize};

use crate::codec::{dn_to_domain, domain_to_dn};
use crate::error::{CoreError, CoreResult};

/// Default bad-password count at which an account is treated as locked.
pub const DEFAULT_LOCKOUT_THRESHOLD: i64 = 6;
/// Default per-controller timeout in seconds.
pub const DEFAULT_CONTROLLER_TIMEOUT_SECS: u64 = 30;

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_lockout_threshold() -> i64 {
    DEFAULT_LOCKOUT_THRESHOLD
}

#[allow(clippy::unnecessary_wraps)]
fn default_controller_timeout() -> Option<u64> {
    Some(DEFAULT_CONTROLLER_TIMEOUT_SECS)
}

/// Which directory to talk to and how.
///
/// `domain` and `ldap_path` are kept consistent by the constructors and the
/// `change_*` mutators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryConfig {
    /// DNS domain, e.g. `corp.example.com`.
    #[serde(default)]
    pub domain: String,
    /// Root path, e.g. `LDAP://DC=corp,DC=example,DC=com`.
    #[serde(default)]
    pub ldap_path: String,
    /// Credential used when a call supplies none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_credential: Option<Credential>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_lockout_threshold")]
    pub lockout_threshold: i64,
    /// `None` waits on a controller indefinitely.
    #[serde(default = "default_controller_timeout")]
    pub controller_timeout_secs: Option<u64>,
}

impl DirectoryConfig {
    /// `corp.example.com` → root path `LDAP://DC=corp,DC=example,DC=com`.
    pub fn from_domain(domain: &str) -> CoreResult<Self> {
        let mut config = Self::empty();
        config.change_domain(domain)?;
        Ok(config)
    }

    /// `LDAP://DC=corp,DC=example,DC=com` → domain `corp.example.com`.
    pub fn from_ldap_path(ldap_path: &str) -> CoreResult<Self> {
        let mut config = Self::empty();
        config.change_ldap_path(ldap_path)?;
        Ok(config)
    }

    fn empty() -> Self {
        Self {
            domain: String::new(),
            ldap_path: String::new(),
            default_credential: None,
            page_size: DEFAULT_PAGE_SIZE,
            lockout_threshold: DEFAULT_LOCKOUT_THRESHOLD,
            controller_timeout_secs: Some(DEFAULT_CONTROLLER_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_default_credential(mut self, credential: Credential) -> Self {
        self.default_credential = Some(credential);
        self
    }

    /// Switch to another domain, re-deriving the root path.
    pub fn change_domain(&mut self, domain: &str) -> CoreResult<()> {
        let domain = domain.trim().trim_end_matches('.');
        let dn = domain_to_dn(domain);
        if dn.is_empty() {
            return Err(CoreError::ConfigError(format!("invalid domain '{domain}'")));
        }
        self.domain = domain.to_string();
        self.ldap_path = DirectoryPath::from_dn(dn).to_string();
        Ok(())
    }

    /// Switch to another root path, re-deriving the domain.
    pub fn change_ldap_path(&mut self, ldap_path: &str) -> CoreResult<()> {
        let path = DirectoryPath::parse(ldap_path)
            .map_err(|e| CoreError::ConfigError(e.to_string()))?;
        let domain = dn_to_domain(path.dn());
        if domain.is_empty() {
            return Err(CoreError::ConfigError(format!(
                "path '{ldap_path}' has no DC components"
            )));
        }
        self.domain = domain;
        self.ldap_path = path.to_string();
        Ok(())
    }

    /// Derive whichever of `domain` / `ldap_path` a deserialized config left empty.
    pub fn complete(&mut self) -> CoreResult<()> {
        match (self.domain.trim().is_empty(), self.ldap_path.trim().is_empty()) {
            (false, true) => {
                let domain = self.domain.clone();
                self.change_domain(&domain)
            }
            (true, false) => {
                let ldap_path = self.ldap_path.clone();
                self.change_ldap_path(&ldap_path)
            }
            (true, true) => Err(CoreError::ConfigError(
                "either domain or ldapPath is required".to_string(),
            )),
            (false, false) => Ok(()),
        }
    }

    /// Parsed root path.
    pub fn root_path(&self) -> CoreResult<DirectoryPath> {
        DirectoryPath::parse(&self.ldap_path).map_err(|e| CoreError::ConfigError(e.to_string()))
    }

    /// Checks a deserialized config for consistency.
    pub fn validate(&self) -> CoreResult<()> {
        if self.domain.trim().is_empty() {
            return Err(CoreError::ConfigError("domain is empty".to_string()));
        }
        self.root_path()?;
        if self.lockout_threshold <= 0 {
            return Err(CoreError::ConfigError(
                "lockoutThreshold must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
