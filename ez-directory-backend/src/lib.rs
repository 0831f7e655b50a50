//! # ez-directory-backend
//!
//! Directory access abstraction for Active Directory style services: authenticated
//! sessions bound to a directory path, paged filtered search, atomic attribute commits
//! and server-side operations (password set, group membership).
//!
//! ## Feature Flags
//!
//! - **`ldap`** *(default)*: the LDAP backend behind [`create_backend`].
//! - **`native-tls`** *(default)*: LDAPS through the platform's native TLS.
//! - **`rustls`**: LDAPS through rustls.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ez_directory_backend::{
//!     create_backend, BackendConfig, Credential, DirectoryPath, SearchRequest,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = create_backend(&BackendConfig {
//!         default_host: Some("corp.example.com".to_string()),
//!         ..BackendConfig::default()
//!     })?;
//!
//!     let path: DirectoryPath = "LDAP://DC=corp,DC=example,DC=com".parse()?;
//!     let credential = Credential::new("svc-directory", "secret").with_domain("CORP");
//!     let mut session = backend.open_session(&path, Some(&credential)).await?;
//!
//!     let request = SearchRequest::subtree("(&(objectClass=user)(sn=Doe*))")
//!         .with_attributes(["sAMAccountName", "displayName"]);
//!     for entry in session.search(&request).await? {
//!         println!("{} {:?}", entry.dn, entry.first_text("displayName"));
//!     }
//!     session.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`Result<T, DirectoryError>`](DirectoryError). Use
//! [`DirectoryError::is_connect_failure`] to tell unusable endpoints apart from
//! failed operations.

mod backends;
mod error;
mod factory;
mod path;
mod traits;
mod types;
mod utils;

pub use error::{DirectoryError, Result};

pub use factory::create_backend;

pub use path::DirectoryPath;

// Internal error mapping traits are not exported.
pub use traits::{DirectoryBackend, DirectorySession};

pub use types::{
    AttributeBag, AttributeChange, BackendConfig, Credential, DEFAULT_PAGE_SIZE, NativeOperation,
    SearchRequest, SearchScope,
};

pub use utils::log_sanitizer;

#[cfg(feature = "ldap")]
pub use backends::LdapBackend;
