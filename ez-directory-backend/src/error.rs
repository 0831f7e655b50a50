use serde::{Deserialize, Serialize};

/// Unified error type for all directory backend operations.
///
/// Each variant includes an `endpoint` field identifying the directory server (or path)
/// that produced the error, plus variant-specific context. All variants are serializable
/// for structured error reporting.
///
/// # Connect failures
///
/// The following variants mean the endpoint could not be used at all:
/// - [`ConnectFailed`](Self::ConnectFailed): server unreachable or refused the connection
/// - [`InvalidCredentials`](Self::InvalidCredentials): bind rejected
/// - [`Timeout`](Self::Timeout): connect or operation timed out
///
/// See [`is_connect_failure`](Self::is_connect_failure).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum DirectoryError {
    /// The server could not be reached (DNS failure, connection refused, TLS failure, etc.).
    ConnectFailed {
        /// Endpoint that produced the error.
        endpoint: String,
        /// Error details.
        detail: String,
    },

    /// The bind credentials were rejected.
    InvalidCredentials {
        /// Endpoint that produced the error.
        endpoint: String,
        /// Original diagnostic message from the server, if available.
        raw_message: Option<String>,
    },

    /// A connect or directory operation timed out.
    Timeout {
        /// Endpoint that produced the error.
        endpoint: String,
        /// Error details.
        detail: String,
    },

    /// The target entry does not exist.
    NoSuchObject {
        /// Endpoint that produced the error.
        endpoint: String,
        /// Distinguished name that was not found.
        dn: String,
        /// Original diagnostic message from the server, if available.
        raw_message: Option<String>,
    },

    /// The server refused a write because it violates a constraint
    /// (password policy, duplicate value, unwilling to perform).
    ConstraintViolation {
        /// Endpoint that produced the error.
        endpoint: String,
        /// Original diagnostic message from the server, if available.
        raw_message: Option<String>,
    },

    /// The bound identity lacks permission for the requested operation.
    PermissionDenied {
        /// Endpoint that produced the error.
        endpoint: String,
        /// Original diagnostic message from the server, if available.
        raw_message: Option<String>,
    },

    /// A directory path could not be parsed or has no usable host.
    InvalidPath {
        /// The offending path.
        path: String,
        /// Description of what's wrong.
        detail: String,
    },

    /// The backend does not support the requested operation.
    UnsupportedOperation {
        /// Backend that produced the error.
        endpoint: String,
        /// Name of the unsupported operation.
        operation: String,
    },

    /// An unrecognized error from the directory server.
    ///
    /// This is a catch-all for result codes not yet mapped to a specific variant.
    Unknown {
        /// Endpoint that produced the error.
        endpoint: String,
        /// Raw result code, if available.
        raw_code: Option<u32>,
        /// Raw error message.
        raw_message: String,
    },
}

impl DirectoryError {
    /// Whether the error is an expected outcome (bad input, missing object, policy),
    /// used to pick the log level: `warn` when `true`, `error` otherwise.
    ///
    /// **Keep in sync when adding variants.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials { .. }
                | Self::NoSuchObject { .. }
                | Self::ConstraintViolation { .. }
                | Self::PermissionDenied { .. }
                | Self::InvalidPath { .. }
        )
    }

    /// Whether the endpoint itself could not be used (unreachable, bind rejected, timed out).
    #[must_use]
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            Self::ConnectFailed { .. } | Self::InvalidCredentials { .. } | Self::Timeout { .. }
        )
    }

    /// Whether the target entry does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoSuchObject { .. })
    }
}

impl std::fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectFailed { endpoint, detail } => {
                write!(f, "[{endpoint}] Connection failed: {detail}")
            }
            Self::InvalidCredentials {
                endpoint,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{endpoint}] Invalid credentials: {msg}")
                } else {
                    write!(f, "[{endpoint}] Invalid credentials")
                }
            }
            Self::Timeout { endpoint, detail } => {
                write!(f, "[{endpoint}] Timeout: {detail}")
            }
            Self::NoSuchObject { endpoint, dn, .. } => {
                write!(f, "[{endpoint}] No such object: '{dn}'")
            }
            Self::ConstraintViolation {
                endpoint,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{endpoint}] Constraint violation: {msg}")
                } else {
                    write!(f, "[{endpoint}] Constraint violation")
                }
            }
            Self::PermissionDenied {
                endpoint,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{endpoint}] Permission denied: {msg}")
                } else {
                    write!(f, "[{endpoint}] Permission denied")
                }
            }
            Self::InvalidPath { path, detail } => {
                write!(f, "Invalid directory path '{path}': {detail}")
            }
            Self::UnsupportedOperation {
                endpoint,
                operation,
            } => {
                write!(f, "[{endpoint}] Unsupported operation: {operation}")
            }
            Self::Unknown {
                endpoint,
                raw_code,
                raw_message,
            } => {
                if let Some(code) = raw_code {
                    write!(f, "[{endpoint}] {raw_message} (code {code})")
                } else {
                    write!(f, "[{endpoint}] {raw_message}")
                }
            }
        }
    }
}

impl std::error::Error for DirectoryError {}

/// Convenience type alias for `Result<T, DirectoryError>`.
pub type Result<T> = std::result::Result<T, DirectoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_connect_failed() {
        let e = DirectoryError::ConnectFailed {
            endpoint: "dc01.corp.example.com".to_string(),
            detail: "connection refused".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "[dc01.corp.example.com] Connection failed: connection refused"
        );
    }

    #[test]
    fn display_invalid_credentials_with_message() {
        let e = DirectoryError::InvalidCredentials {
            endpoint: "dc01".to_string(),
            raw_message: Some("80090308: LdapErr: DSID-0C09044E".to_string()),
        };
        assert_eq!(
            e.to_string(),
            "[dc01] Invalid credentials: 80090308: LdapErr: DSID-0C09044E"
        );
    }

    #[test]
    fn display_invalid_credentials_without_message() {
        let e = DirectoryError::InvalidCredentials {
            endpoint: "dc01".to_string(),
            raw_message: None,
        };
        assert_eq!(e.to_string(), "[dc01] Invalid credentials");
    }

    #[test]
    fn display_no_such_object() {
        let e = DirectoryError::NoSuchObject {
            endpoint: "dc01".to_string(),
            dn: "CN=Ghost,DC=corp".to_string(),
            raw_message: None,
        };
        assert_eq!(e.to_string(), "[dc01] No such object: 'CN=Ghost,DC=corp'");
        assert!(e.is_not_found());
        assert!(!e.is_connect_failure());
    }

    #[test]
    fn display_invalid_path() {
        let e = DirectoryError::InvalidPath {
            path: String::new(),
            detail: "path is empty".to_string(),
        };
        assert_eq!(e.to_string(), "Invalid directory path '': path is empty");
    }

    #[test]
    fn display_unknown_with_code() {
        let e = DirectoryError::Unknown {
            endpoint: "dc01".to_string(),
            raw_code: Some(80),
            raw_message: "other".to_string(),
        };
        assert_eq!(e.to_string(), "[dc01] other (code 80)");
    }

    #[test]
    fn connect_failure_classification() {
        assert!(
            DirectoryError::Timeout {
                endpoint: "dc".into(),
                detail: "10s".into(),
            }
            .is_connect_failure()
        );
        assert!(
            DirectoryError::InvalidCredentials {
                endpoint: "dc".into(),
                raw_message: None,
            }
            .is_connect_failure()
        );
        assert!(
            !DirectoryError::ConstraintViolation {
                endpoint: "dc".into(),
                raw_message: None,
            }
            .is_connect_failure()
        );
    }

    #[test]
    fn expected_classification() {
        assert!(
            DirectoryError::NoSuchObject {
                endpoint: "dc".into(),
                dn: "x".into(),
                raw_message: None,
            }
            .is_expected()
        );
        assert!(
            !DirectoryError::ConnectFailed {
                endpoint: "dc".into(),
                detail: "x".into(),
            }
            .is_expected()
        );
    }

    #[test]
    fn serialize_carries_code_tag() {
        let e = DirectoryError::PermissionDenied {
            endpoint: "dc01".to_string(),
            raw_message: Some("insufficient access".to_string()),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"code\":\"PermissionDenied\""));
        let back: DirectoryError = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_string(), e.to_string());
    }
}
