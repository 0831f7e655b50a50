//! Directory backend implementations

#[cfg(feature = "ldap")]
mod ldap;

#[cfg(feature = "ldap")]
pub use ldap::LdapBackend;
