use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DirectoryError, Result};

const SCHEME: &str = "LDAP://";

/// A directory path: an optional server plus a distinguished name.
///
/// Accepted textual forms:
///
/// - `LDAP://DC=corp,DC=example,DC=com`
/// - `LDAP://dc01.corp.example.com/DC=corp,DC=example,DC=com`
/// - `LDAP://dc01.corp.example.com:636/CN=Users,DC=corp,DC=example,DC=com`
/// - `DC=corp,DC=example,DC=com` (scheme omitted)
///
/// The scheme prefix is case-insensitive. Rendering always uses the upper-case scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DirectoryPath {
    host: Option<String>,
    port: Option<u16>,
    dn: String,
}

impl DirectoryPath {
    /// Parse a path. Fails on an empty path or an unparseable port.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let rest = strip_scheme(trimmed);
        if rest.is_empty() {
            return Err(DirectoryError::InvalidPath {
                path: raw.to_string(),
                detail: "path is empty".to_string(),
            });
        }

        // "server/DN": the server part never contains '='; a bare DN does.
        let (server, dn) = match rest.split_once('/') {
            Some((server, dn)) if !server.contains('=') => (Some(server), dn),
            _ => (None, rest),
        };

        let (host, port) = match server {
            Some(server) if !server.is_empty() => {
                let (host, port) = split_port(server).map_err(|detail| {
                    DirectoryError::InvalidPath {
                        path: raw.to_string(),
                        detail,
                    }
                })?;
                (Some(host.to_string()), port)
            }
            _ => (None, None),
        };

        if host.is_none() && dn.is_empty() {
            return Err(DirectoryError::InvalidPath {
                path: raw.to_string(),
                detail: "path has neither a server nor a distinguished name".to_string(),
            });
        }

        Ok(Self {
            host,
            port,
            dn: dn.to_string(),
        })
    }

    /// A serverless path to `dn`.
    pub fn from_dn(dn: impl Into<String>) -> Self {
        Self {
            host: None,
            port: None,
            dn: dn.into(),
        }
    }

    /// The same DN, pinned to a specific server.
    #[must_use]
    pub fn with_host(&self, host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            port: self.port,
            dn: self.dn.clone(),
        }
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Distinguished name; may be empty for a server-only path (RootDSE).
    pub fn dn(&self) -> &str {
        &self.dn
    }
}

fn strip_scheme(s: &str) -> &str {
    match s.get(..SCHEME.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(SCHEME) => &s[SCHEME.len()..],
        _ => s,
    }
}

fn split_port(server: &str) -> std::result::Result<(&str, Option<u16>), String> {
    match server.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| format!("invalid port '{port}'"))?;
            Ok((host, Some(port)))
        }
        None => Ok((server, None)),
    }
}

impl fmt::Display for DirectoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(SCHEME)?;
        if let Some(host) = &self.host {
            f.write_str(host)?;
            if let Some(port) = self.port {
                write!(f, ":{port}")?;
            }
            f.write_str("/")?;
        }
        f.write_str(&self.dn)
    }
}

impl FromStr for DirectoryPath {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DirectoryPath {
    type Error = DirectoryError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<DirectoryPath> for String {
    fn from(value: DirectoryPath) -> Self {
        value.to_string()
    }
}
