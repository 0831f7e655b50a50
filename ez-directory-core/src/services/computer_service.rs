//! Computer lookup service

use std::sync::Arc;

use ez_directory_backend::Credential;

use crate::error::{CoreError, CoreResult};
use crate::filter::{Filter, ObjectKind};
use crate::services::ServiceContext;
use crate::types::{COMPUTER_ATTRIBUTES, DirectoryComputer};

pub struct ComputerService {
    ctx: Arc<ServiceContext>,
}

impl ComputerService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// First computer whose `cn` contains `name`.
    pub async fn find(
        &self,
        name: &str,
        credential: Option<&Credential>,
    ) -> CoreResult<DirectoryComputer> {
        self.find_all(name, credential)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::ComputerNotFound(name.trim().to_string()))
    }

    /// The computer whose `cn` is exactly `name`.
    ///
    /// Entries whose name differs (other than by case) are ignored, so a near-name
    /// computer is never returned in its place.
    pub async fn find_exact(
        &self,
        name: &str,
        credential: Option<&Credential>,
    ) -> CoreResult<DirectoryComputer> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::ValidationError(
                "computer name is empty".to_string(),
            ));
        }
        let filter = Filter::all(vec![
            ObjectKind::Computer.predicate(),
            Filter::equals("cn", name),
        ]);
        let bags = self
            .ctx
            .search_root(filter.render(), COMPUTER_ATTRIBUTES, credential)
            .await?;
        bags.iter()
            .map(DirectoryComputer::from_bag)
            .find(|computer| computer.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| CoreError::ComputerNotFound(name.to_string()))
    }

    /// Every computer whose `cn` contains `name`.
    pub async fn find_all(
        &self,
        name: &str,
        credential: Option<&Credential>,
    ) -> CoreResult<Vec<DirectoryComputer>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::ValidationError(
                "computer name is empty".to_string(),
            ));
        }
        let filter = Filter::all(vec![
            ObjectKind::Computer.predicate(),
            Filter::contains("cn", name),
        ]);
        let bags = self
            .ctx
            .search_root(filter.render(), COMPUTER_ATTRIBUTES, credential)
            .await?;
        log::debug!("Computer search '{name}' matched {} entries", bags.len());
        Ok(bags.iter().map(DirectoryComputer::from_bag).collect())
    }
}
