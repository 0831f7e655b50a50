//! Bound LDAP session

use std::time::Duration;

use async_trait::async_trait;
use ldap3::adapters::{Adapter, EntriesOnly, PagedResults};
use ldap3::{Ldap, Scope, SearchEntry};

use crate::error::Result;
use crate::path::DirectoryPath;
use crate::traits::{DirectorySession, ErrorContext};
use crate::types::{AttributeBag, AttributeChange, NativeOperation, SearchRequest, SearchScope};
use crate::utils::log_sanitizer::truncate_for_log;

use super::error::LdapErrorMapper;
use super::modify::{change_to_mod, operation_to_mods};

pub(crate) struct LdapSession {
    pub(crate) ldap: Ldap,
    pub(crate) path: DirectoryPath,
    pub(crate) mapper: LdapErrorMapper,
    pub(crate) op_timeout: Option<Duration>,
    pub(crate) closed: bool,
}

fn to_scope(scope: SearchScope) -> Scope {
    match scope {
        SearchScope::Base => Scope::Base,
        SearchScope::OneLevel => Scope::OneLevel,
        SearchScope::Subtree => Scope::Subtree,
    }
}

fn to_bag(entry: SearchEntry) -> AttributeBag {
    let mut bag = AttributeBag::new(entry.dn);
    for (name, values) in entry.attrs {
        bag.insert_text(&name, values);
    }
    for (name, values) in entry.bin_attrs {
        bag.insert_binary(&name, values);
    }
    bag
}

impl LdapSession {
    fn ldap(&mut self) -> &mut Ldap {
        if let Some(timeout) = self.op_timeout {
            self.ldap.with_timeout(timeout);
        }
        &mut self.ldap
    }

    async fn modify(&mut self, mods: Vec<ldap3::Mod<Vec<u8>>>) -> Result<()> {
        let dn = self.path.dn().to_string();
        let mapper = self.mapper.clone();
        self.ldap()
            .modify(&dn, mods)
            .await
            .and_then(ldap3::LdapResult::success)
            .map_err(|e| mapper.from_ldap(e, ErrorContext::for_dn(&dn)))?;
        Ok(())
    }
}

#[async_trait]
impl DirectorySession for LdapSession {
    fn path(&self) -> &DirectoryPath {
        &self.path
    }

    async fn search(&mut self, request: &SearchRequest) -> Result<Vec<AttributeBag>> {
        let base = request
            .base
            .clone()
            .unwrap_or_else(|| self.path.dn().to_string());
        let mapper = self.mapper.clone();
        let context = || ErrorContext::for_dn(&base);

        log::debug!(
            "SEARCH [{}] base={base} scope={:?} filter={}",
            self.path,
            request.scope,
            truncate_for_log(&request.filter)
        );

        let entries = if request.scope == SearchScope::Base || request.page_size == 0 {
            let (entries, _) = self
                .ldap()
                .search(
                    &base,
                    to_scope(request.scope),
                    &request.filter,
                    request.attributes.clone(),
                )
                .await
                .and_then(ldap3::SearchResult::success)
                .map_err(|e| mapper.from_ldap(e, context()))?;
            entries.into_iter().map(SearchEntry::construct).collect()
        } else {
            let adapters: Vec<Box<dyn Adapter<_, _>>> = vec![
                Box::new(EntriesOnly::new()),
                Box::new(PagedResults::new(i32::try_from(request.page_size).unwrap_or(i32::MAX))),
            ];
            let mut stream = self
                .ldap()
                .streaming_search_with(
                    adapters,
                    &base,
                    to_scope(request.scope),
                    &request.filter,
                    request.attributes.clone(),
                )
                .await
                .map_err(|e| mapper.from_ldap(e, context()))?;

            let mut entries = Vec::new();
            while let Some(entry) = stream
                .next()
                .await
                .map_err(|e| mapper.from_ldap(e, context()))?
            {
                entries.push(SearchEntry::construct(entry));
            }
            stream
                .finish()
                .await
                .success()
                .map_err(|e| mapper.from_ldap(e, context()))?;
            entries
        };

        log::debug!("SEARCH returned {} entries", entries.len());
        Ok(entries.into_iter().map(to_bag).collect())
    }

    async fn commit(&mut self, changes: &[AttributeChange]) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }
        log::debug!(
            "MODIFY [{}] {} attributes: {:?}",
            self.path,
            changes.len(),
            changes.iter().map(AttributeChange::attribute).collect::<Vec<_>>()
        );
        self.modify(changes.iter().map(change_to_mod).collect()).await
    }

    async fn invoke(&mut self, operation: &NativeOperation) -> Result<()> {
        log::debug!("INVOKE [{}] {}", self.path, operation.name());
        self.modify(operation_to_mods(operation)).await
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let mapper = self.mapper.clone();
        self.ldap
            .unbind()
            .await
            .map_err(|e| mapper.from_ldap(e, ErrorContext::default()))
    }
}
