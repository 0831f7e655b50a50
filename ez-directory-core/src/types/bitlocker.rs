//! BitLocker recovery information

use chrono::{DateTime, Utc};
use ez_directory_backend::AttributeBag;
use serde::{Deserialize, Serialize};

use crate::codec::{AttributeReader, component_value};

pub const RECOVERY_ATTRIBUTES: &[&str] = &[
    "msFVE-RecoveryPassword",
    "msFVE-RecoveryGuid",
    "distinguishedName",
    "whenCreated",
];

/// One stored recovery key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitlockerRecoveryRecord {
    pub recovery_password: String,
    /// Raw 16-byte key id.
    pub key_id_bytes: Vec<u8>,
    /// Canonical key id; empty when the stored id is malformed.
    pub key_id: String,
    /// Owning computer: second DN component without its `CN=` prefix.
    pub computer_name: String,
    pub created: Option<DateTime<Utc>>,
}

impl BitlockerRecoveryRecord {
    pub fn from_bag(bag: &AttributeBag) -> Self {
        let dn = if bag.dn.is_empty() {
            bag.string("distinguishedName")
        } else {
            bag.dn.clone()
        };
        Self {
            recovery_password: bag.string("msFVE-RecoveryPassword"),
            key_id_bytes: bag
                .first_bytes("msFVE-RecoveryGuid")
                .map(<[u8]>::to_vec)
                .unwrap_or_default(),
            key_id: bag.guid("msFVE-RecoveryGuid").unwrap_or_default(),
            computer_name: component_value(&dn, 1).unwrap_or_default(),
            created: bag.generalized_time("whenCreated"),
        }
    }
}
