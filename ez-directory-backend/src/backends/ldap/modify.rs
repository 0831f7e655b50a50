//! Translation of attribute changes and native operations into LDAP modify lists

use std::collections::HashSet;

use ldap3::Mod;

use crate::types::{AttributeChange, NativeOperation};

/// Attribute Active Directory accepts password sets on.
const UNICODE_PWD: &str = "unicodePwd";
const MEMBER: &str = "member";

/// `unicodePwd` value: the password wrapped in double quotes, encoded as UTF-16LE.
pub(crate) fn encode_unicode_pwd(password: &str) -> Vec<u8> {
    format!("\"{password}\"")
        .encode_utf16()
        .flat_map(u16::to_le_bytes)
        .collect()
}

fn value_set(values: &[String]) -> HashSet<Vec<u8>> {
    values.iter().map(|v| v.as_bytes().to_vec()).collect()
}

pub(crate) fn change_to_mod(change: &AttributeChange) -> Mod<Vec<u8>> {
    match change {
        AttributeChange::Replace { attribute, values } => {
            Mod::Replace(attribute.as_bytes().to_vec(), value_set(values))
        }
        AttributeChange::Add { attribute, values } => {
            Mod::Add(attribute.as_bytes().to_vec(), value_set(values))
        }
        AttributeChange::Delete { attribute, values } => {
            Mod::Delete(attribute.as_bytes().to_vec(), value_set(values))
        }
    }
}

pub(crate) fn operation_to_mods(operation: &NativeOperation) -> Vec<Mod<Vec<u8>>> {
    match operation {
        NativeOperation::SetPassword { password } => vec![Mod::Replace(
            UNICODE_PWD.as_bytes().to_vec(),
            HashSet::from([encode_unicode_pwd(password)]),
        )],
        NativeOperation::AddMember { member_dn } => vec![Mod::Add(
            MEMBER.as_bytes().to_vec(),
            HashSet::from([member_dn.as_bytes().to_vec()]),
        )],
        NativeOperation::RemoveMember { member_dn } => vec![Mod::Delete(
            MEMBER.as_bytes().to_vec(),
            HashSet::from([member_dn.as_bytes().to_vec()]),
        )],
    }
}
