//! EzDirectory Core Library
//!
//! Account engine for Active Directory style directories:
//! - Attribute decoding (file times, GUIDs, escaped DNs, account control flags)
//! - Search filter construction
//! - Credential-scoped session handling
//! - Account, group, computer and BitLocker services
//! - Enterprise-wide unlock across every domain controller
//!
//! The directory protocol itself is reached through the `ez-directory-backend`
//! traits, so every service runs unchanged against an in-memory backend in tests.
//!
//! ```rust,ignore
//! let ctx = Arc::new(ServiceContext::new(config, backend)?);
//! let unlock = UnlockService::new(ctx);
//! let mut results = unlock.unlock_everywhere("jdoe", None).await?;
//! while let Some(result) = results.next().await {
//!     println!("{}", result.message);
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod filter;
pub mod services;
pub mod session;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use config::DirectoryConfig;
pub use error::{CoreError, CoreResult, FailureKind, FailureReason};
pub use filter::{Filter, IdentityQuery, ObjectKind, UsernameMatch};
pub use services::{
    AccountExpiry, AccountService, BitlockerService, ComputerService, GroupService,
    ServiceContext, UnlockService,
};
pub use session::{Session, SessionProvider};
