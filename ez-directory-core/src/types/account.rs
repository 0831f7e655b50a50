//! Directory account

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ez_directory_backend::{AttributeBag, DirectoryPath};
use serde::{Deserialize, Serialize};

use crate::codec::{AttributeReader, decode_rdn_value};

use super::AccountControl;

/// Attributes loaded for every account search.
pub const ACCOUNT_ATTRIBUTES: &[&str] = &[
    "sAMAccountName",
    "displayName",
    "name",
    "givenName",
    "middleName",
    "sn",
    "userPrincipalName",
    "canonicalName",
    "distinguishedName",
    "mail",
    "st",
    "l",
    "physicalDeliveryOfficeName",
    "streetAddress",
    "homeDirectory",
    "info",
    "employeeID",
    "company",
    "department",
    "title",
    "manager",
    "whenCreated",
    "whenChanged",
    "pwdLastSet",
    "accountExpires",
    "msDS-UserPasswordExpiryTimeComputed",
    "lockoutTime",
    "badPwdCount",
    "badPasswordTime",
    "memberOf",
    "userAccountControl",
    "adminDescription",
    "extensionAttribute8",
];

/// Loaded with every account but not decoded into a field; kept in `additional`.
const UNMAPPED_ATTRIBUTES: &[&str] = &["adminDescription", "extensionAttribute8"];

fn is_mapped(name: &str) -> bool {
    ACCOUNT_ATTRIBUTES.iter().any(|a| a.eq_ignore_ascii_case(name))
        && !UNMAPPED_ATTRIBUTES.iter().any(|a| a.eq_ignore_ascii_case(name))
}

/// A user account decoded from its directory attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryAccount {
    pub username: String,
    pub display_name: String,
    pub full_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub user_principal_name: String,
    pub canonical_name: String,
    pub distinguished_name: String,
    /// `LDAP://{distinguished name}`
    pub path: String,

    pub email: String,
    pub state: String,
    pub city: String,
    pub office: String,
    pub street_address: String,
    pub home_directory: String,
    pub notes: String,

    pub employee_id: String,
    pub company: String,
    pub department: String,
    pub job_title: String,
    /// Manager display name, decoded from the manager DN.
    pub manager: String,
    pub manager_dn: String,

    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub password_last_set: Option<DateTime<Utc>>,
    /// `None` when the account never expires.
    pub account_expires: Option<DateTime<Utc>>,
    pub password_expires: Option<DateTime<Utc>>,

    pub is_locked_out: bool,
    pub bad_password_count: i64,
    pub last_bad_password_at: Option<DateTime<Utc>>,

    /// `memberOf` DNs.
    pub groups: Vec<String>,
    pub account_control: AccountControl,

    /// Text attributes returned with the entry that no field above decodes,
    /// keyed by lower-cased attribute name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional: BTreeMap<String, Vec<String>>,
}

impl DirectoryAccount {
    /// Decode a search hit. Absent or malformed attributes leave their field at the default.
    pub fn from_bag(bag: &AttributeBag) -> Self {
        let distinguished_name = if bag.dn.is_empty() {
            bag.string("distinguishedName")
        } else {
            bag.dn.clone()
        };
        let manager_dn = bag.string("manager");
        Self {
            username: bag.string("sAMAccountName"),
            display_name: bag.string("displayName"),
            full_name: bag.string("name"),
            first_name: bag.string("givenName"),
            middle_name: bag.string("middleName"),
            last_name: bag.string("sn"),
            user_principal_name: bag.string("userPrincipalName"),
            canonical_name: bag.string("canonicalName"),
            path: DirectoryPath::from_dn(distinguished_name.clone()).to_string(),
            distinguished_name,

            email: bag.string("mail"),
            state: bag.string("st"),
            city: bag.string("l"),
            office: bag.string("physicalDeliveryOfficeName"),
            street_address: bag.string("streetAddress"),
            home_directory: bag.string("homeDirectory"),
            notes: bag.string("info"),

            employee_id: bag.string("employeeID"),
            company: bag.string("company"),
            department: bag.string("department"),
            job_title: bag.string("title"),
            manager: if manager_dn.is_empty() {
                String::new()
            } else {
                decode_rdn_value(&manager_dn)
            },
            manager_dn,

            created: bag.generalized_time("whenCreated"),
            modified: bag.generalized_time("whenChanged"),
            password_last_set: bag.file_time("pwdLastSet"),
            account_expires: bag.file_time("accountExpires"),
            password_expires: bag.file_time("msDS-UserPasswordExpiryTimeComputed"),

            is_locked_out: bag.int64("lockoutTime") != 0,
            bad_password_count: bag.int64("badPwdCount"),
            last_bad_password_at: bag.file_time("badPasswordTime"),

            groups: bag.strings("memberOf"),
            account_control: AccountControl(bag.uint32("userAccountControl")),

            additional: bag
                .attribute_names()
                .filter(|name| !is_mapped(name))
                .filter_map(|name| {
                    let values = bag.text(name);
                    (!values.is_empty()).then(|| (name.to_ascii_lowercase(), values.to_vec()))
                })
                .collect(),
        }
    }

    /// Not disabled.
    pub fn is_active(&self) -> bool {
        !self.account_control.contains(AccountControl::DISABLED)
    }

    pub fn password_never_expires(&self) -> bool {
        self.account_control
            .contains(AccountControl::PASSWORD_NEVER_EXPIRES)
    }

    /// Expired as of `now`; an account without an expiry date never is.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.account_expires.is_some_and(|expires| expires <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// `"{office} - {city}, {state}"`, or the office alone when no city is set.
    pub fn location(&self) -> String {
        if self.city.is_empty() {
            self.office.clone()
        } else {
            format!("{} - {}, {}", self.office, self.city, self.state)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn jane() -> AttributeBag {
        AttributeBag::new("CN=Jane Doe,OU=Staff,DC=corp,DC=example,DC=com")
            .with_text("sAMAccountName", ["jdoe"])
            .with_text("displayName", ["Jane Doe"])
            .with_text("givenName", ["Jane"])
            .with_text("sn", ["Doe"])
            .with_text("manager", ["CN=Smith\\, John,OU=Staff,DC=corp,DC=example,DC=com"])
            .with_text("physicalDeliveryOfficeName", ["HQ"])
            .with_text("l", ["Springfield"])
            .with_text("st", ["IL"])
            .with_text("userAccountControl", ["512"])
            .with_text("accountExpires", ["0"])
            .with_text("pwdLastSet", ["133497846000000000"])
            .with_text("lockoutTime", ["133497846000000000"])
            .with_text("badPwdCount", ["4"])
            .with_text("whenCreated", ["20200101000000.0Z"])
            .with_text("memberOf", ["CN=Staff,OU=Groups,DC=corp"])
    }

    #[test]
    fn decodes_identity_and_derived_fields() {
        let account = DirectoryAccount::from_bag(&jane());
        assert_eq!(account.username, "jdoe");
        assert_eq!(account.manager, "Smith, John");
        assert_eq!(
            account.path,
            "LDAP://CN=Jane Doe,OU=Staff,DC=corp,DC=example,DC=com"
        );
        assert_eq!(account.location(), "HQ - Springfield, IL");
        assert!(account.is_locked_out);
        assert_eq!(account.bad_password_count, 4);
        assert_eq!(account.groups.len(), 1);
        assert!(account.is_active());
        assert!(!account.password_never_expires());
        assert!(account.password_last_set.is_some());
        assert!(account.created.is_some());
    }

    #[test]
    fn unmapped_attributes_are_kept() {
        let account = DirectoryAccount::from_bag(
            &jane()
                .with_text("adminDescription", ["contractor"])
                .with_text("extensionAttribute8", ["B-42"])
                .with_text("costCenter", ["700", "710"]),
        );
        assert_eq!(account.additional.len(), 3);
        assert_eq!(account.additional["admindescription"], vec!["contractor".to_string()]);
        assert_eq!(account.additional["extensionattribute8"], vec!["B-42".to_string()]);
        assert_eq!(account.additional["costcenter"].len(), 2);
        assert!(!account.additional.contains_key("samaccountname"));

        assert!(DirectoryAccount::from_bag(&jane()).additional.is_empty());
    }

    #[test]
    fn location_without_city_is_office() {
        let account = DirectoryAccount {
            office: "HQ".into(),
            ..DirectoryAccount::default()
        };
        assert_eq!(account.location(), "HQ");
    }

    #[test]
    fn flags_follow_bitmask() {
        for raw in [0u32, 2, 512, 514, 65536, 66048, 66050, 0x7fff_ffff, u32::MAX] {
            let account = DirectoryAccount {
                account_control: AccountControl(raw),
                ..DirectoryAccount::default()
            };
            assert_eq!(account.is_active(), raw & 2 == 0);
            assert_eq!(account.password_never_expires(), raw & 0x1_0000 != 0);
        }
    }

    #[test]
    fn sentinel_expiry_never_expires() {
        for raw in ["0", "9223372036854775807"] {
            let account =
                DirectoryAccount::from_bag(&jane().with_text("accountExpires", [raw]));
            assert_eq!(account.account_expires, None);
            assert!(!account.is_expired());
        }
    }

    #[test]
    fn expiry_is_relative_to_now() {
        let expires = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let account = DirectoryAccount {
            account_expires: Some(expires),
            ..DirectoryAccount::default()
        };
        assert!(account.is_expired_at(expires + Duration::seconds(1)));
        assert!(!account.is_expired_at(expires - Duration::days(1)));
    }

    #[test]
    fn empty_bag_decodes_to_defaults() {
        let account = DirectoryAccount::from_bag(&AttributeBag::new(""));
        assert_eq!(account.username, "");
        assert_eq!(account.manager, "");
        assert!(!account.is_locked_out);
        assert!(account.is_active());
    }
}
