//! Group lookup and membership service

use std::sync::Arc;

use ez_directory_backend::{Credential, NativeOperation};

use crate::error::{CoreError, CoreResult, FailureReason};
use crate::filter::{Filter, ObjectKind};
use crate::services::{ServiceContext, log_failure};
use crate::types::{DirectoryGroup, GROUP_ATTRIBUTES};

/// Group lookup and membership service
pub struct GroupService {
    ctx: Arc<ServiceContext>,
}

impl GroupService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Groups whose name contains `fragment`, sorted by name.
    pub async fn find(
        &self,
        fragment: &str,
        credential: Option<&Credential>,
    ) -> CoreResult<Vec<DirectoryGroup>> {
        let filter = Filter::all(vec![
            ObjectKind::Group.predicate(),
            Filter::contains("name", fragment.trim()),
        ]);
        let bags = self
            .ctx
            .search_root(filter.render(), GROUP_ATTRIBUTES, credential)
            .await?;
        let mut groups: Vec<DirectoryGroup> = bags.iter().map(DirectoryGroup::from_bag).collect();
        groups.sort_by_key(|g| g.name.to_lowercase());
        Ok(groups)
    }

    /// The group at `path`.
    pub async fn get(&self, path: &str, credential: Option<&Credential>) -> CoreResult<DirectoryGroup> {
        let parsed = self.ctx.parse_path(path)?;
        match self.ctx.read(&parsed, GROUP_ATTRIBUTES, credential).await {
            Ok(bag) => Ok(DirectoryGroup::from_bag(&bag)),
            Err(CoreError::Directory(e)) if e.is_not_found() => {
                Err(CoreError::GroupNotFound(path.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Add `member_dn` to the group at `group_path`.
    pub async fn add_member(
        &self,
        group_path: &str,
        member_dn: &str,
        credential: Option<&Credential>,
    ) -> Result<(), FailureReason> {
        let op = NativeOperation::AddMember {
            member_dn: member_dn.to_string(),
        };
        self.change_membership(group_path, &op, credential).await
    }

    /// Remove `member_dn` from the group at `group_path`.
    pub async fn remove_member(
        &self,
        group_path: &str,
        member_dn: &str,
        credential: Option<&Credential>,
    ) -> Result<(), FailureReason> {
        let op = NativeOperation::RemoveMember {
            member_dn: member_dn.to_string(),
        };
        self.change_membership(group_path, &op, credential).await
    }

    async fn change_membership(
        &self,
        group_path: &str,
        op: &NativeOperation,
        credential: Option<&Credential>,
    ) -> Result<(), FailureReason> {
        let result = async {
            let path = self.ctx.parse_path(group_path)?;
            self.ctx.invoke(&path, op, credential).await
        }
        .await;

        match result {
            Ok(()) => {
                log::info!("[{group_path}] {} succeeded", op.name());
                Ok(())
            }
            Err(e) => {
                log_failure(&format!("[{group_path}] {} failed", op.name()), &e);
                Err(e.into())
            }
        }
    }
}
