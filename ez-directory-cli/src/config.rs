//! TOML configuration file
//!
//! ```toml
//! [directory]
//! domain = "corp.example.com"
//! lockoutThreshold = 6
//! controllerTimeoutSecs = 30
//!
//! [directory.defaultCredential]
//! username = "svc-helpdesk"
//! domain = "CORP"
//!
//! [backend]
//! useTls = true
//! ```

use std::path::Path;

use anyhow::{Context, bail};
use ez_directory_backend::{BackendConfig, Credential};
use ez_directory_core::DirectoryConfig;
use serde::Deserialize;

/// Environment variable supplying the default credential's password.
pub const PASSWORD_ENV: &str = "EZDIR_PASSWORD";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub backend: BackendConfig,
}

impl CliConfig {
    /// Parse and complete a config from TOML text.
    pub fn parse(text: &str, password: Option<String>) -> anyhow::Result<Self> {
        let mut config: Self = toml::from_str(text).context("invalid configuration file")?;
        config.directory.complete()?;

        if let Some(password) = password.filter(|p| !p.is_empty()) {
            match config.directory.default_credential.as_mut() {
                Some(credential) => credential.password = password,
                None => bail!("{PASSWORD_ENV} is set but no default credential is configured"),
            }
        }
        if let Some(credential) = config
            .directory
            .default_credential
            .as_ref()
            .filter(|c| !c.is_usable())
        {
            tracing::warn!(
                "Default credential for '{}' has no password; binding with the ambient identity",
                credential.username
            );
        }

        if config.backend.default_host.is_none() {
            config.backend.default_host = Some(config.directory.domain.clone());
        }
        config.directory.validate()?;
        Ok(config)
    }

    /// Read `path`, taking the password from [`PASSWORD_ENV`] when set.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text, std::env::var(PASSWORD_ENV).ok())
    }

    /// Explicit credential built from command-line flags, if both parts are present.
    pub fn credential_override(
        username: Option<String>,
        password: Option<String>,
    ) -> Option<Credential> {
        Some(Credential::new(username?, password?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[directory]
domain = "corp.example.com"
"#;

    #[test]
    fn minimal_config_derives_the_rest() {
        let config = CliConfig::parse(MINIMAL, None).unwrap();
        assert_eq!(config.directory.ldap_path, "LDAP://DC=corp,DC=example,DC=com");
        assert_eq!(config.directory.page_size, 1000);
        assert_eq!(config.directory.controller_timeout_secs, Some(30));
        assert_eq!(
            config.backend.default_host.as_deref(),
            Some("corp.example.com")
        );
        assert_eq!(config.backend.effective_port(), 389);
    }

    #[test]
    fn password_comes_from_environment_value() {
        let text = r#"
[directory]
ldapPath = "LDAP://DC=corp,DC=local"
lockoutThreshold = 3

[directory.defaultCredential]
username = "svc-helpdesk"
domain = "CORP"

[backend]
useTls = true
port = 3269
"#;
        let config = CliConfig::parse(text, Some("s3cret".to_string())).unwrap();
        let credential = config.directory.default_credential.unwrap();
        assert_eq!(credential.password, "s3cret");
        assert_eq!(credential.username_with_domain(), "CORP\\svc-helpdesk");
        assert_eq!(config.directory.domain, "corp.local");
        assert_eq!(config.directory.lockout_threshold, 3);
        assert_eq!(config.backend.effective_port(), 3269);
    }

    #[test]
    fn password_without_credential_is_rejected() {
        assert!(CliConfig::parse(MINIMAL, Some("pw".to_string())).is_err());
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert!(CliConfig::parse("[directory]\n", None).is_err());
        assert!(CliConfig::parse("[directory]\ndomain = \"corp.local\"\nlockoutThreshold = 0\n", None).is_err());
        assert!(CliConfig::parse("[dir]\ndomain = \"corp.local\"\n", None).is_err());
    }

    #[test]
    fn credential_override_needs_both_parts() {
        assert!(CliConfig::credential_override(Some("a".into()), None).is_none());
        assert!(CliConfig::credential_override(None, Some("b".into())).is_none());
        assert_eq!(
            CliConfig::credential_override(Some("a".into()), Some("b".into())),
            Some(Credential::new("a", "b"))
        );
    }
}
