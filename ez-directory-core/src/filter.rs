//! Search filter construction.
//!
//! [`Filter`] is a typed filter tree rendered to the textual form. Every caller-supplied
//! value is escaped when rendered, so fragments can never change the filter's structure.

use std::fmt;

/// OID of the bitwise-AND matching rule.
pub const MATCH_BIT_AND: &str = "1.2.840.113556.1.4.803";
/// OID of the bitwise-OR matching rule.
pub const MATCH_BIT_OR: &str = "1.2.840.113556.1.4.804";

/// Escape a value for use inside a filter: `\ * ( )` and NUL become `\5c \2a \28 \29 \00`.
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\5c"),
            '*' => out.push_str("\\2a"),
            '(' => out.push_str("\\28"),
            ')' => out.push_str("\\29"),
            '\0' => out.push_str("\\00"),
            c => out.push(c),
        }
    }
    out
}

/// A search filter tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    /// `(attr=value)`
    Equals(String, String),
    /// `(attr=value*)`
    StartsWith(String, String),
    /// `(attr=*value*)`
    Contains(String, String),
    /// `(attr=*)`
    Present(String),
    /// `(attr:1.2.840.113556.1.4.803:=mask)`
    BitAnd(String, u64),
    /// `(attr:1.2.840.113556.1.4.804:=mask)`
    BitOr(String, u64),
}

impl Filter {
    pub fn equals(attr: &str, value: impl Into<String>) -> Self {
        Self::Equals(attr.to_string(), value.into())
    }

    pub fn starts_with(attr: &str, value: impl Into<String>) -> Self {
        Self::StartsWith(attr.to_string(), value.into())
    }

    pub fn contains(attr: &str, value: impl Into<String>) -> Self {
        Self::Contains(attr.to_string(), value.into())
    }

    pub fn present(attr: &str) -> Self {
        Self::Present(attr.to_string())
    }

    pub fn bit_and(attr: &str, mask: u64) -> Self {
        Self::BitAnd(attr.to_string(), mask)
    }

    pub fn bit_or(attr: &str, mask: u64) -> Self {
        Self::BitOr(attr.to_string(), mask)
    }

    pub fn not(inner: Filter) -> Self {
        Self::Not(Box::new(inner))
    }

    /// AND of `parts`. Nested ANDs are flattened and a single part collapses to itself.
    pub fn all(parts: Vec<Filter>) -> Self {
        let mut flat = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Self::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Self::And(flat)
        }
    }

    /// Textual form.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(parts) | Self::Or(parts) => {
                f.write_str(if matches!(self, Self::And(_)) { "(&" } else { "(|" })?;
                for part in parts {
                    write!(f, "{part}")?;
                }
                f.write_str(")")
            }
            Self::Not(inner) => write!(f, "(!{inner})"),
            Self::Equals(attr, value) => write!(f, "({attr}={})", escape_value(value)),
            Self::StartsWith(attr, value) => write!(f, "({attr}={}*)", escape_value(value)),
            Self::Contains(attr, value) => write!(f, "({attr}=*{}*)", escape_value(value)),
            Self::Present(attr) => write!(f, "({attr}=*)"),
            Self::BitAnd(attr, mask) => write!(f, "({attr}:{MATCH_BIT_AND}:={mask})"),
            Self::BitOr(attr, mask) => write!(f, "({attr}:{MATCH_BIT_OR}:={mask})"),
        }
    }
}

/// Entity kinds with a fixed object-class predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Person,
    Computer,
    Group,
    RecoveryKey,
    DomainController,
}

impl ObjectKind {
    /// The kind's class/category predicate.
    pub fn predicate(self) -> Filter {
        match self {
            Self::Person => Filter::all(vec![
                Filter::equals("objectCategory", "person"),
                Filter::equals("objectClass", "user"),
            ]),
            Self::Computer => Filter::equals("objectClass", "computer"),
            Self::Group => Filter::equals("objectClass", "group"),
            Self::RecoveryKey => Filter::equals("objectClass", "msFVE-RecoveryInformation"),
            // 516: domain controllers, 521: read-only domain controllers
            Self::DomainController => Filter::all(vec![
                Filter::equals("objectCategory", "computer"),
                Filter::Or(vec![
                    Filter::equals("primaryGroupID", "516"),
                    Filter::equals("primaryGroupID", "521"),
                ]),
            ]),
        }
    }
}

/// How the username fragment is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UsernameMatch {
    #[default]
    Exact,
    Prefix,
}

/// Optional identity fragments; blank fragments are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub employee_id: Option<String>,
    pub username: Option<String>,
    pub username_match: UsernameMatch,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl IdentityQuery {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn first_name(mut self, value: impl Into<String>) -> Self {
        self.first_name = Some(value.into());
        self
    }

    #[must_use]
    pub fn last_name(mut self, value: impl Into<String>) -> Self {
        self.last_name = Some(value.into());
        self
    }

    #[must_use]
    pub fn employee_id(mut self, value: impl Into<String>) -> Self {
        self.employee_id = Some(value.into());
        self
    }

    #[must_use]
    pub fn username(mut self, value: impl Into<String>) -> Self {
        self.username = Some(value.into());
        self
    }

    #[must_use]
    pub fn username_match(mut self, mode: UsernameMatch) -> Self {
        self.username_match = mode;
        self
    }

    /// Whether no fragment is set.
    pub fn is_empty(&self) -> bool {
        non_blank(self.first_name.as_ref()).is_none()
            && non_blank(self.last_name.as_ref()).is_none()
            && non_blank(self.employee_id.as_ref()).is_none()
            && non_blank(self.username.as_ref()).is_none()
    }

    /// Identity predicates, in first name, last name, employee id, username order.
    pub fn predicates(&self) -> Vec<Filter> {
        let mut parts = Vec::new();
        if let Some(v) = non_blank(self.first_name.as_ref()) {
            parts.push(Filter::starts_with("givenName", v));
        }
        if let Some(v) = non_blank(self.last_name.as_ref()) {
            parts.push(Filter::starts_with("sn", v));
        }
        if let Some(v) = non_blank(self.employee_id.as_ref()) {
            parts.push(Filter::starts_with("employeeID", v));
        }
        if let Some(v) = non_blank(self.username.as_ref()) {
            parts.push(match self.username_match {
                UsernameMatch::Exact => Filter::equals("sAMAccountName", v),
                UsernameMatch::Prefix => Filter::starts_with("sAMAccountName", v),
            });
        }
        parts
    }
}

/// Kind predicate ANDed with every supplied identity fragment.
pub fn build_filter(kind: ObjectKind, query: &IdentityQuery) -> Filter {
    let mut parts = vec![kind.predicate()];
    parts.extend(query.predicates());
    Filter::all(parts)
}

/// Accounts that are locked out, excluding disabled and password-never-expires accounts.
pub fn locked_users_filter() -> Filter {
    Filter::all(vec![
        ObjectKind::Person.predicate(),
        Filter::bit_or("lockoutTime", 0xFFFF_FFFF),
        Filter::not(Filter::bit_and("userAccountControl", 0x2)),
        Filter::not(Filter::bit_and("userAccountControl", 0x1_0000)),
    ])
}
