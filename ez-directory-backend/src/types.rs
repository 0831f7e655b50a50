use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============ Credentials ============

/// Explicit bind credentials.
///
/// `None` wherever an `Option<Credential>` is accepted means "use the ambient identity"
/// (an unauthenticated bind for the LDAP backend).
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Account name (`sAMAccountName`, UPN, or a full DN).
    pub username: String,
    /// Plain-text password. May be omitted in configuration files and supplied later.
    #[serde(default)]
    pub password: String,
    /// Optional NetBIOS domain, rendered as `DOMAIN\username`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl Credential {
    /// Create a credential without a domain qualifier.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            domain: None,
        }
    }

    /// Attach a NetBIOS domain qualifier.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// A credential is usable only when both username and password are non-blank.
    pub fn is_usable(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.trim().is_empty()
    }

    /// Bind name: `DOMAIN\username` when a non-blank domain is set, otherwise the bare username.
    pub fn username_with_domain(&self) -> String {
        match self.domain.as_deref().map(str::trim) {
            Some(domain) if !domain.is_empty() => format!("{domain}\\{}", self.username),
            _ => self.username.clone(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"***")
            .field("domain", &self.domain)
            .finish()
    }
}

// ============ Search ============

/// Default page size for paged searches.
///
/// Large enough that Active Directory's default `MaxPageSize` never silently truncates.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Search scope relative to the search base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchScope {
    /// Only the base entry itself.
    Base,
    /// Immediate children of the base entry.
    OneLevel,
    /// The base entry and all of its descendants.
    Subtree,
}

/// A filtered directory search.
///
/// `base` overrides the session's own DN as search root when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Search root DN. `None` searches from the session path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Filter in string form, e.g. `(&(objectClass=user)(sn=Doe*))`.
    pub filter: String,
    /// Search scope.
    pub scope: SearchScope,
    /// Paged-results page size; `0` disables paging.
    pub page_size: u32,
    /// Attributes to load. Empty loads all user attributes.
    pub attributes: Vec<String>,
}

impl SearchRequest {
    /// A paged subtree search using [`DEFAULT_PAGE_SIZE`].
    pub fn subtree(filter: impl Into<String>) -> Self {
        Self {
            base: None,
            filter: filter.into(),
            scope: SearchScope::Subtree,
            page_size: DEFAULT_PAGE_SIZE,
            attributes: Vec::new(),
        }
    }

    /// A base-scope read of a single entry.
    pub fn base_entry(dn: impl Into<String>) -> Self {
        Self {
            base: Some(dn.into()),
            filter: "(objectClass=*)".to_string(),
            scope: SearchScope::Base,
            page_size: 0,
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}

// ============ Attribute bags ============

/// Loosely-typed attributes of one directory entry, as returned by a search.
///
/// Attribute names are matched case-insensitively. Values that are not valid UTF-8
/// (GUIDs, SIDs) land in the binary map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeBag {
    /// Distinguished name of the entry.
    pub dn: String,
    text: HashMap<String, Vec<String>>,
    binary: HashMap<String, Vec<Vec<u8>>>,
}

impl AttributeBag {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            text: HashMap::new(),
            binary: HashMap::new(),
        }
    }

    /// Builder-style text attribute insertion.
    #[must_use]
    pub fn with_text<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert_text(name, values.into_iter().map(Into::into).collect());
        self
    }

    /// Builder-style binary attribute insertion.
    #[must_use]
    pub fn with_binary(mut self, name: &str, values: Vec<Vec<u8>>) -> Self {
        self.insert_binary(name, values);
        self
    }

    pub fn insert_text(&mut self, name: &str, values: Vec<String>) {
        self.text.insert(name.to_ascii_lowercase(), values);
    }

    pub fn insert_binary(&mut self, name: &str, values: Vec<Vec<u8>>) {
        self.binary.insert(name.to_ascii_lowercase(), values);
    }

    /// Remove an attribute from both maps.
    pub fn remove(&mut self, name: &str) {
        let key = name.to_ascii_lowercase();
        self.text.remove(&key);
        self.binary.remove(&key);
    }

    /// All text values of an attribute (empty slice when absent).
    pub fn text(&self, name: &str) -> &[String] {
        self.text
            .get(&name.to_ascii_lowercase())
            .map_or(&[], Vec::as_slice)
    }

    /// First text value of an attribute.
    pub fn first_text(&self, name: &str) -> Option<&str> {
        self.text(name).first().map(String::as_str)
    }

    /// All binary values of an attribute (empty slice when absent).
    pub fn binary(&self, name: &str) -> &[Vec<u8>] {
        self.binary
            .get(&name.to_ascii_lowercase())
            .map_or(&[], Vec::as_slice)
    }

    /// First value of an attribute as raw bytes, whichever map holds it.
    ///
    /// Binary values that happen to be valid UTF-8 are stored as text by some servers.
    pub fn first_bytes(&self, name: &str) -> Option<&[u8]> {
        self.binary(name)
            .first()
            .map(Vec::as_slice)
            .or_else(|| self.first_text(name).map(str::as_bytes))
    }

    /// Whether the attribute is present with at least one value.
    pub fn contains(&self, name: &str) -> bool {
        !self.text(name).is_empty() || !self.binary(name).is_empty()
    }

    /// Number of values of the attribute across both maps.
    pub fn value_count(&self, name: &str) -> usize {
        self.text(name).len() + self.binary(name).len()
    }

    /// Lower-cased names of every attribute present.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.text.keys().chain(self.binary.keys()).map(String::as_str)
    }
}

// ============ Writes ============

/// One attribute modification; a list of them is committed atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum AttributeChange {
    /// Replace all values of the attribute.
    Replace { attribute: String, values: Vec<String> },
    /// Add values to the attribute.
    Add { attribute: String, values: Vec<String> },
    /// Delete the given values; an empty list deletes the whole attribute.
    Delete { attribute: String, values: Vec<String> },
}

impl AttributeChange {
    pub fn replace(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Replace {
            attribute: attribute.into(),
            values: vec![value.into()],
        }
    }

    pub fn delete_value(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Delete {
            attribute: attribute.into(),
            values: vec![value.into()],
        }
    }

    pub fn clear(attribute: impl Into<String>) -> Self {
        Self::Delete {
            attribute: attribute.into(),
            values: Vec::new(),
        }
    }

    pub fn attribute(&self) -> &str {
        match self {
            Self::Replace { attribute, .. }
            | Self::Add { attribute, .. }
            | Self::Delete { attribute, .. } => attribute,
        }
    }
}

/// Server-side operations that are not plain attribute writes.
#[derive(Clone, PartialEq, Eq)]
pub enum NativeOperation {
    /// Administrative password set on the bound user object.
    SetPassword { password: String },
    /// Add a member DN to the bound group object.
    AddMember { member_dn: String },
    /// Remove a member DN from the bound group object.
    RemoveMember { member_dn: String },
}

impl NativeOperation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetPassword { .. } => "SetPassword",
            Self::AddMember { .. } => "Add",
            Self::RemoveMember { .. } => "Remove",
        }
    }
}

impl fmt::Debug for NativeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetPassword { .. } => f.write_str("SetPassword { password: *** }"),
            Self::AddMember { member_dn } => write!(f, "AddMember {{ member_dn: {member_dn:?} }}"),
            Self::RemoveMember { member_dn } => {
                write!(f, "RemoveMember {{ member_dn: {member_dn:?} }}")
            }
        }
    }
}

// ============ Backend configuration ============

/// Connection settings for the LDAP backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendConfig {
    /// Host used when a directory path carries no server component (usually the DNS domain).
    pub default_host: Option<String>,
    /// Use LDAPS instead of plain LDAP. Password sets require it on Active Directory.
    pub use_tls: bool,
    /// Port override; defaults to 389 / 636.
    pub port: Option<u16>,
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Per-operation timeout in seconds; `None` waits indefinitely.
    pub operation_timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            default_host: None,
            use_tls: false,
            port: None,
            connect_timeout_secs: 10,
            operation_timeout_secs: Some(60),
        }
    }
}

impl BackendConfig {
    /// Effective port for the configured transport.
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(if self.use_tls { 636 } else { 389 })
    }
}
