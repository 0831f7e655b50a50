//! Core error types

use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub use ez_directory_backend::DirectoryError;

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// No account matched a single-account lookup
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// No group matched a single-group lookup
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    /// No computer matched a single-computer lookup
    #[error("Computer not found: {0}")]
    ComputerNotFound(String),

    /// Caller supplied an invalid argument
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Directory configuration is unusable
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Directory backend error
    #[error("{0}")]
    Directory(#[from] DirectoryError),
}

impl CoreError {
    /// Whether this is an expected outcome (user input, missing entry); selects `warn`
    /// over `error` when logging.
    ///
    /// **Update when adding variants.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::AccountNotFound(_)
            | Self::GroupNotFound(_)
            | Self::ComputerNotFound(_)
            | Self::ValidationError(_) => true,
            Self::ConfigError(_) => false,
            Self::Directory(e) => e.is_expected(),
        }
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Category of a non-fatal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// The controller or directory could not be reached or rejected the bind.
    Connect,
    /// The target entry does not exist.
    NotFound,
    /// The directory refused the write.
    Rejected,
    /// Anything else.
    Other,
}

/// Why a non-fatal mutation (unlock, group membership) failed.
///
/// Returned instead of raising so callers touching many targets can log and move on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReason {
    pub kind: FailureKind,
    pub message: String,
}

impl FailureReason {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&DirectoryError> for FailureKind {
    fn from(err: &DirectoryError) -> Self {
        match err {
            DirectoryError::ConnectFailed { .. }
            | DirectoryError::InvalidCredentials { .. }
            | DirectoryError::Timeout { .. } => Self::Connect,
            DirectoryError::NoSuchObject { .. } | DirectoryError::InvalidPath { .. } => {
                Self::NotFound
            }
            DirectoryError::ConstraintViolation { .. }
            | DirectoryError::PermissionDenied { .. } => Self::Rejected,
            DirectoryError::UnsupportedOperation { .. } | DirectoryError::Unknown { .. } => {
                Self::Other
            }
        }
    }
}

impl From<DirectoryError> for FailureReason {
    fn from(err: DirectoryError) -> Self {
        Self::new(FailureKind::from(&err), err.to_string())
    }
}

impl From<CoreError> for FailureReason {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Directory(e) => e.into(),
            CoreError::AccountNotFound(_)
            | CoreError::GroupNotFound(_)
            | CoreError::ComputerNotFound(_) => Self::new(FailureKind::NotFound, err.to_string()),
            CoreError::ValidationError(_) | CoreError::ConfigError(_) => {
                Self::new(FailureKind::Other, err.to_string())
            }
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
