use async_trait::async_trait;

use crate::error::{DirectoryError, Result};
use crate::path::DirectoryPath;
use crate::types::{AttributeBag, AttributeChange, Credential, NativeOperation, SearchRequest};

/// Raw server error (internal).
#[derive(Debug, Clone)]
pub(crate) struct RawDirectoryError {
    /// Numeric result code, when the failure came from the server.
    pub code: Option<u32>,
    /// Diagnostic message.
    pub message: String,
}

impl RawDirectoryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: u32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }
}

/// Context attached when mapping a raw error (internal).
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorContext {
    /// DN the operation targeted, for `NoSuchObject`.
    pub dn: Option<String>,
}

impl ErrorContext {
    pub fn for_dn(dn: impl Into<String>) -> Self {
        Self { dn: Some(dn.into()) }
    }
}

/// Maps backend-specific raw errors onto [`DirectoryError`] (internal).
pub(crate) trait DirectoryErrorMapper {
    /// Endpoint label used in every produced error.
    fn endpoint(&self) -> &str;

    fn map_error(&self, raw: RawDirectoryError, context: ErrorContext) -> DirectoryError;

    fn connect_failed(&self, detail: impl ToString) -> DirectoryError {
        DirectoryError::ConnectFailed {
            endpoint: self.endpoint().to_string(),
            detail: detail.to_string(),
        }
    }

    fn timeout(&self, detail: impl ToString) -> DirectoryError {
        DirectoryError::Timeout {
            endpoint: self.endpoint().to_string(),
            detail: detail.to_string(),
        }
    }

    fn unknown_error(&self, raw: RawDirectoryError) -> DirectoryError {
        DirectoryError::Unknown {
            endpoint: self.endpoint().to_string(),
            raw_code: raw.code,
            raw_message: raw.message,
        }
    }
}

/// A directory service that can open authenticated sessions.
#[async_trait]
pub trait DirectoryBackend: Send + Sync {
    /// Backend identifier.
    fn id(&self) -> &'static str;

    /// Open a session bound to `path`.
    ///
    /// With `credential = None` the backend binds as the ambient identity. The bind
    /// happens here, so credential and reachability failures surface from this call.
    async fn open_session(
        &self,
        path: &DirectoryPath,
        credential: Option<&Credential>,
    ) -> Result<Box<dyn DirectorySession>>;
}

/// An open, bound connection to one directory path.
///
/// Sessions are exclusively owned by one operation. Dropping a session releases it;
/// [`close`](Self::close) additionally reports errors raised while unbinding.
#[async_trait]
pub trait DirectorySession: Send {
    /// Path the session was opened on.
    fn path(&self) -> &DirectoryPath;

    /// Run a (paged) search. Results of all pages are concatenated.
    async fn search(&mut self, request: &SearchRequest) -> Result<Vec<AttributeBag>>;

    /// Load attributes of the bound entry itself.
    ///
    /// The default implementation runs a base-scope search on the path DN.
    async fn read_entry(&mut self, attributes: &[String]) -> Result<AttributeBag> {
        let dn = self.path().dn().to_string();
        let request = SearchRequest::base_entry(dn.clone()).with_attributes(attributes.to_vec());
        self.search(&request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DirectoryError::NoSuchObject {
                endpoint: self.path().host().unwrap_or_default().to_string(),
                dn,
                raw_message: None,
            })
    }

    /// Write attribute changes to the bound entry. All changes apply atomically.
    async fn commit(&mut self, changes: &[AttributeChange]) -> Result<()>;

    /// Invoke a server-side operation on the bound entry.
    async fn invoke(&mut self, operation: &NativeOperation) -> Result<()>;

    /// Release the session.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
