//! Directory services

mod account_service;
mod bitlocker_service;
mod computer_service;
mod group_service;
mod unlock_service;

pub use account_service::{AccountExpiry, AccountService};
pub use bitlocker_service::BitlockerService;
pub use computer_service::ComputerService;
pub use group_service::GroupService;
pub use unlock_service::UnlockService;

use std::sync::Arc;

use ez_directory_backend::{
    AttributeBag, AttributeChange, Credential, DirectoryBackend, DirectoryPath, NativeOperation,
    SearchRequest,
};

use crate::config::DirectoryConfig;
use crate::error::{CoreError, CoreResult};
use crate::session::SessionProvider;

/// Log a failure at `warn` when it is an expected outcome, `error` otherwise.
pub(crate) fn log_failure(context: &str, err: &CoreError) {
    if err.is_expected() {
        log::warn!("{context}: {err}");
    } else {
        log::error!("{context}: {err}");
    }
}

/// Service context: configuration plus the session machinery every service shares.
pub struct ServiceContext {
    config: DirectoryConfig,
    sessions: SessionProvider,
    root: DirectoryPath,
}

impl ServiceContext {
    /// Validates `config` and binds it to `backend`.
    pub fn new(config: DirectoryConfig, backend: Arc<dyn DirectoryBackend>) -> CoreResult<Self> {
        config.validate()?;
        let root = config.root_path()?;
        let sessions = SessionProvider::new(backend, config.default_credential.clone());
        Ok(Self {
            config,
            sessions,
            root,
        })
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionProvider {
        &self.sessions
    }

    /// Root path of the configured domain.
    pub fn root(&self) -> &DirectoryPath {
        &self.root
    }

    /// Parse a caller-supplied object path.
    pub fn parse_path(&self, raw: &str) -> CoreResult<DirectoryPath> {
        DirectoryPath::parse(raw).map_err(|e| CoreError::ValidationError(e.to_string()))
    }

    /// Run one search in its own session on `path`.
    pub async fn search(
        &self,
        path: &DirectoryPath,
        request: &SearchRequest,
        credential: Option<&Credential>,
    ) -> CoreResult<Vec<AttributeBag>> {
        let mut session = self.sessions.resolve_session(path, credential).await?;
        let result = session.search(request).await;
        session.finish(result).await
    }

    /// Subtree search from the domain root with the configured page size.
    pub async fn search_root(
        &self,
        filter: String,
        attributes: &[&str],
        credential: Option<&Credential>,
    ) -> CoreResult<Vec<AttributeBag>> {
        let request = SearchRequest::subtree(filter)
            .with_page_size(self.config.page_size)
            .with_attributes(attributes.iter().copied());
        self.search(&self.root, &request, credential).await
    }

    /// Read the object at `path` itself.
    pub async fn read(
        &self,
        path: &DirectoryPath,
        attributes: &[&str],
        credential: Option<&Credential>,
    ) -> CoreResult<AttributeBag> {
        let attributes: Vec<String> = attributes.iter().map(ToString::to_string).collect();
        let mut session = self.sessions.resolve_session(path, credential).await?;
        let result = session.read_entry(&attributes).await;
        session.finish(result).await
    }

    /// Commit `changes` to the object at `path` in one modify.
    pub async fn commit(
        &self,
        path: &DirectoryPath,
        changes: &[AttributeChange],
        credential: Option<&Credential>,
    ) -> CoreResult<()> {
        let mut session = self.sessions.resolve_session(path, credential).await?;
        let result = session.commit(changes).await;
        session.finish(result).await
    }

    /// Invoke a native operation on the object at `path`.
    pub async fn invoke(
        &self,
        path: &DirectoryPath,
        operation: &NativeOperation,
        credential: Option<&Credential>,
    ) -> CoreResult<()> {
        let mut session = self.sessions.resolve_session(path, credential).await?;
        let result = session.invoke(operation).await;
        session.finish(result).await
    }
}
