//! Account query and mutation service

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ez_directory_backend::{AttributeChange, Credential, DirectoryPath, NativeOperation};

use crate::codec::filetime::{NEVER, to_file_time};
use crate::error::{CoreError, CoreResult, FailureReason};
use crate::filter::{IdentityQuery, ObjectKind, UsernameMatch, build_filter, locked_users_filter};
use crate::services::{ServiceContext, log_failure};
use crate::types::{ACCOUNT_ATTRIBUTES, DirectoryAccount, DirectoryGroup};

/// Value written to `accountExpires`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountExpiry {
    Never,
    At(DateTime<Utc>),
}

impl AccountExpiry {
    fn file_time(self) -> i64 {
        match self {
            Self::Never => NEVER,
            Self::At(time) => to_file_time(time),
        }
    }
}

/// Account query and mutation service
pub struct AccountService {
    ctx: Arc<ServiceContext>,
}

impl AccountService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Search person accounts by identity fragments; the username matches as a prefix.
    ///
    /// No match yields an empty list.
    pub async fn search_users(
        &self,
        query: &IdentityQuery,
        credential: Option<&Credential>,
    ) -> CoreResult<Vec<DirectoryAccount>> {
        let query = query.clone().username_match(UsernameMatch::Prefix);
        let filter = build_filter(ObjectKind::Person, &query);
        self.search_accounts(filter.render(), credential).await
    }

    /// The single account with exactly this username.
    pub async fn find_user(
        &self,
        username: &str,
        credential: Option<&Credential>,
    ) -> CoreResult<DirectoryAccount> {
        let username = username.trim();
        if username.is_empty() {
            return Err(CoreError::ValidationError("username is empty".to_string()));
        }
        let filter = build_filter(ObjectKind::Person, &IdentityQuery::new().username(username));
        self.search_accounts(filter.render(), credential)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::AccountNotFound(username.to_string()))
    }

    /// Locked accounts that are enabled and whose password expires.
    pub async fn get_all_locked_users(
        &self,
        credential: Option<&Credential>,
    ) -> CoreResult<Vec<DirectoryAccount>> {
        let mut accounts = self
            .search_accounts(locked_users_filter().render(), credential)
            .await?;
        accounts.retain(|a| a.is_locked_out && a.is_active() && !a.password_never_expires());
        log::info!("Found {} locked accounts", accounts.len());
        Ok(accounts)
    }

    /// Re-read one account by path.
    pub async fn get_account(
        &self,
        path: &str,
        credential: Option<&Credential>,
    ) -> CoreResult<DirectoryAccount> {
        let path = self.ctx.parse_path(path)?;
        let bag = self.ctx.read(&path, ACCOUNT_ATTRIBUTES, credential).await?;
        Ok(DirectoryAccount::from_bag(&bag))
    }

    async fn search_accounts(
        &self,
        filter: String,
        credential: Option<&Credential>,
    ) -> CoreResult<Vec<DirectoryAccount>> {
        let bags = self
            .ctx
            .search_root(filter, ACCOUNT_ATTRIBUTES, credential)
            .await?;
        Ok(bags.iter().map(DirectoryAccount::from_bag).collect())
    }

    /// Set one attribute. A non-blank value replaces every current value.
    ///
    /// A blank value removes the first current value only, so the rest of a multi-valued
    /// attribute survives. It is a no-op when the attribute is unset.
    pub async fn set_account_property(
        &self,
        path: &str,
        name: &str,
        value: &str,
        credential: Option<&Credential>,
    ) -> CoreResult<()> {
        if name.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "property name is empty".to_string(),
            ));
        }
        let path = self.ctx.parse_path(path)?;
        let mut session = self.ctx.sessions().resolve_session(&path, credential).await?;

        let result = async {
            if value.trim().is_empty() {
                let entry = session.read_entry(&[name.to_string()]).await?;
                if !entry.contains(name) {
                    log::debug!("[{path}] {name} already unset");
                    return Ok(());
                }
                let change = match entry.first_text(name) {
                    Some(first) => AttributeChange::delete_value(name, first),
                    // binary-only values cannot be named in a text delete
                    None => AttributeChange::clear(name),
                };
                session.commit(&[change]).await
            } else {
                session.commit(&[AttributeChange::replace(name, value)]).await
            }
        }
        .await;

        session.finish(result).await.inspect_err(|e| {
            log_failure(&format!("[{path}] Failed to set {name}"), e);
        })
    }

    /// Clear the lockout on `path`. Unlocking an unlocked account succeeds.
    pub async fn unlock_account(
        &self,
        path: &str,
        credential: Option<&Credential>,
    ) -> Result<(), FailureReason> {
        let result = async {
            let path = self.ctx.parse_path(path)?;
            unlock_at(&self.ctx, &path, credential).await
        }
        .await;

        result.map_err(|e| {
            log_failure(&format!("[{path}] Failed to unlock account"), &e);
            FailureReason::from(e)
        })
    }

    /// Set a new password, optionally forcing a change at next logon.
    pub async fn reset_password(
        &self,
        path: &str,
        new_password: &str,
        force_change: bool,
        credential: Option<&Credential>,
    ) -> CoreResult<()> {
        if new_password.is_empty() {
            return Err(CoreError::ValidationError("password is empty".to_string()));
        }
        let path = self.ctx.parse_path(path)?;
        let mut session = self.ctx.sessions().resolve_session(&path, credential).await?;

        let result = async {
            session
                .invoke(&NativeOperation::SetPassword {
                    password: new_password.to_string(),
                })
                .await?;
            if force_change {
                session
                    .commit(&[AttributeChange::replace("pwdLastSet", "0")])
                    .await?;
            }
            Ok(())
        }
        .await;

        session.finish(result).await.inspect_err(|e| {
            log_failure(&format!("[{path}] Failed to reset password"), e);
        })?;
        log::info!("[{path}] Password reset (force change: {force_change})");
        Ok(())
    }

    pub async fn set_account_expiry(
        &self,
        path: &str,
        expiry: AccountExpiry,
        credential: Option<&Credential>,
    ) -> CoreResult<()> {
        let path = self.ctx.parse_path(path)?;
        let change = AttributeChange::replace("accountExpires", expiry.file_time().to_string());
        self.ctx.commit(&path, &[change], credential).await
    }

    /// Expire the account as of now.
    pub async fn expire_now(&self, path: &str, credential: Option<&Credential>) -> CoreResult<()> {
        self.set_account_expiry(path, AccountExpiry::At(Utc::now()), credential)
            .await
    }

    /// Groups the account is a direct member of, sorted by name.
    pub async fn get_groups(
        &self,
        user_path: &str,
        credential: Option<&Credential>,
    ) -> CoreResult<Vec<DirectoryGroup>> {
        let path = self.ctx.parse_path(user_path)?;
        let bag = self.ctx.read(&path, &["memberOf"], credential).await?;
        let mut groups: Vec<DirectoryGroup> = bag
            .text("memberOf")
            .iter()
            .map(|dn| DirectoryGroup::from_member_of(dn))
            .collect();
        groups.sort_by_key(|g| g.name.to_lowercase());
        Ok(groups)
    }
}

/// Write `lockoutTime = 0` to the account at `path`.
pub(crate) async fn unlock_at(
    ctx: &ServiceContext,
    path: &DirectoryPath,
    credential: Option<&Credential>,
) -> CoreResult<()> {
    ctx.commit(path, &[AttributeChange::replace("lockoutTime", "0")], credential)
        .await?;
    log::info!("[{path}] Account unlocked");
    Ok(())
}
