//! BitLocker recovery key lookup

use std::sync::Arc;

use ez_directory_backend::{Credential, SearchRequest};

use crate::error::{CoreError, CoreResult};
use crate::filter::{Filter, ObjectKind};
use crate::services::{ComputerService, ServiceContext};
use crate::types::{BitlockerRecoveryRecord, RECOVERY_ATTRIBUTES};

/// BitLocker recovery key lookup
///
/// Recovery objects live below the computer object they protect; their RDN embeds the
/// key id, so a key id fragment is matched against `name`.
pub struct BitlockerService {
    ctx: Arc<ServiceContext>,
    computers: ComputerService,
}

impl BitlockerService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self {
            computers: ComputerService::new(ctx.clone()),
            ctx,
        }
    }

    /// Recovery records whose name contains the key id `fragment`, domain-wide.
    pub async fn find_by_key_id(
        &self,
        fragment: &str,
        credential: Option<&Credential>,
    ) -> CoreResult<Vec<BitlockerRecoveryRecord>> {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return Err(CoreError::ValidationError("key id is empty".to_string()));
        }
        let filter = Filter::all(vec![
            ObjectKind::RecoveryKey.predicate(),
            Filter::contains("name", fragment),
        ]);
        let bags = self
            .ctx
            .search_root(filter.render(), RECOVERY_ATTRIBUTES, credential)
            .await?;
        Ok(bags.iter().map(BitlockerRecoveryRecord::from_bag).collect())
    }

    /// Recovery records stored under the computer named exactly `computer_name`.
    ///
    /// Fails with `ComputerNotFound` when no computer has that name.
    pub async fn find_by_computer_name(
        &self,
        computer_name: &str,
        credential: Option<&Credential>,
    ) -> CoreResult<Vec<BitlockerRecoveryRecord>> {
        let computer = self.computers.find_exact(computer_name, credential).await?;
        let path = self.ctx.parse_path(&computer.path)?;

        let request = SearchRequest::subtree(ObjectKind::RecoveryKey.predicate().render())
            .with_page_size(self.ctx.config().page_size)
            .with_attributes(RECOVERY_ATTRIBUTES.iter().copied());
        let bags = self.ctx.search(&path, &request, credential).await?;
        log::debug!(
            "[{path}] {} recovery records for {}",
            bags.len(),
            computer.name
        );
        Ok(bags.iter().map(BitlockerRecoveryRecord::from_bag).collect())
    }
}
