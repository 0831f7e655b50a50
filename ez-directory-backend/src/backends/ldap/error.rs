//! LDAP result-code mapping

use ldap3::LdapError;

use crate::error::DirectoryError;
use crate::traits::{DirectoryErrorMapper, ErrorContext, RawDirectoryError};

/// Maps LDAP result codes and transport errors for one endpoint.
#[derive(Debug, Clone)]
pub(crate) struct LdapErrorMapper {
    endpoint: String,
}

impl LdapErrorMapper {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// Map an `ldap3` error, unwrapping non-success results into their result code.
    pub fn from_ldap(&self, err: LdapError, context: ErrorContext) -> DirectoryError {
        match err {
            LdapError::LdapResult { result } => self.map_error(
                RawDirectoryError::with_code(result.rc, result.text),
                context,
            ),
            LdapError::Timeout { .. } => self.timeout("operation timed out"),
            LdapError::Io { source } => self.connect_failed(source),
            other => self.unknown_error(RawDirectoryError::new(other.to_string())),
        }
    }
}

fn non_empty(message: String) -> Option<String> {
    if message.trim().is_empty() {
        None
    } else {
        Some(message)
    }
}

/// Result codes: RFC 4511 §4.1.9.
impl DirectoryErrorMapper for LdapErrorMapper {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_error(&self, raw: RawDirectoryError, context: ErrorContext) -> DirectoryError {
        match raw.code {
            // 49: invalidCredentials
            Some(49) => DirectoryError::InvalidCredentials {
                endpoint: self.endpoint.clone(),
                raw_message: non_empty(raw.message),
            },

            // 32: noSuchObject
            Some(32) => DirectoryError::NoSuchObject {
                endpoint: self.endpoint.clone(),
                dn: context.dn.unwrap_or_else(|| "<unknown>".to_string()),
                raw_message: non_empty(raw.message),
            },

            // 50: insufficientAccessRights
            Some(50) => DirectoryError::PermissionDenied {
                endpoint: self.endpoint.clone(),
                raw_message: non_empty(raw.message),
            },

            // 19: constraintViolation
            // 20: attributeOrValueExists
            // 21: invalidAttributeSyntax
            // 53: unwillingToPerform
            // 68: entryAlreadyExists
            Some(19 | 20 | 21 | 53 | 68) => DirectoryError::ConstraintViolation {
                endpoint: self.endpoint.clone(),
                raw_message: non_empty(raw.message),
            },

            // 51: busy
            // 52: unavailable
            // 81: serverDown (client-side)
            Some(51 | 52 | 81) => self.connect_failed(raw.message),

            // 3: timeLimitExceeded
            // 85: timeout (client-side)
            Some(3 | 85) => self.timeout(raw.message),

            _ => self.unknown_error(raw),
        }
    }
}
