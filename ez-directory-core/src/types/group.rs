//! Groups and computers

use ez_directory_backend::{AttributeBag, DirectoryPath};
use serde::{Deserialize, Serialize};

use crate::codec::{AttributeReader, decode_rdn_value};

pub const GROUP_ATTRIBUTES: &[&str] = &["name", "description", "info", "distinguishedName"];
pub const COMPUTER_ATTRIBUTES: &[&str] = &["name", "distinguishedName"];

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryGroup {
    pub name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DirectoryGroup {
    pub fn from_bag(bag: &AttributeBag) -> Self {
        let name = bag.string("name");
        Self {
            name: if name.is_empty() { decode_rdn_value(&bag.dn) } else { name },
            path: DirectoryPath::from_dn(bag.dn.clone()).to_string(),
            description: non_empty(bag.string("description")),
            notes: non_empty(bag.string("info")),
        }
    }

    /// Group reference from a `memberOf` DN; only name and path are known.
    pub fn from_member_of(dn: &str) -> Self {
        Self {
            name: decode_rdn_value(dn),
            path: DirectoryPath::from_dn(dn).to_string(),
            description: None,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryComputer {
    pub name: String,
    pub path: String,
}

impl DirectoryComputer {
    pub fn from_bag(bag: &AttributeBag) -> Self {
        let name = bag.string("name");
        Self {
            name: if name.is_empty() { decode_rdn_value(&bag.dn) } else { name },
            path: DirectoryPath::from_dn(bag.dn.clone()).to_string(),
        }
    }
}
