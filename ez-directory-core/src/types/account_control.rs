//! `userAccountControl` flag set

use std::fmt;

use serde::{Deserialize, Serialize};

/// The 32-bit `userAccountControl` bitmask.
///
/// Flags are independent bits; membership is always `(raw & flag) != 0`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountControl(pub u32);

impl AccountControl {
    pub const SCRIPT: u32 = 0x0000_0001;
    pub const DISABLED: u32 = 0x0000_0002;
    pub const HOME_DIRECTORY_REQUIRED: u32 = 0x0000_0008;
    pub const LOCKOUT: u32 = 0x0000_0010;
    pub const PASSWORD_NOT_REQUIRED: u32 = 0x0000_0020;
    pub const PASSWORD_CANT_CHANGE: u32 = 0x0000_0040;
    pub const ENCRYPTED_TEXT_PASSWORD_ALLOWED: u32 = 0x0000_0080;
    pub const TEMP_DUPLICATE_ACCOUNT: u32 = 0x0000_0100;
    pub const NORMAL_ACCOUNT: u32 = 0x0000_0200;
    pub const INTERDOMAIN_TRUST_ACCOUNT: u32 = 0x0000_0800;
    pub const WORKSTATION_TRUST_ACCOUNT: u32 = 0x0000_1000;
    pub const SERVER_TRUST_ACCOUNT: u32 = 0x0000_2000;
    pub const PASSWORD_NEVER_EXPIRES: u32 = 0x0001_0000;
    pub const MNS_LOGON_ACCOUNT: u32 = 0x0002_0000;
    pub const SMARTCARD_REQUIRED: u32 = 0x0004_0000;
    pub const TRUSTED_FOR_DELEGATION: u32 = 0x0008_0000;
    pub const NOT_DELEGATED: u32 = 0x0010_0000;
    pub const USE_DES_KEY_ONLY: u32 = 0x0020_0000;
    pub const DONT_REQUIRE_PREAUTH: u32 = 0x0040_0000;
    pub const PASSWORD_EXPIRED: u32 = 0x0080_0000;
    pub const TRUSTED_TO_AUTH_FOR_DELEGATION: u32 = 0x0100_0000;
    pub const PARTIAL_SECRETS_ACCOUNT: u32 = 0x0400_0000;

    const NAMES: [(u32, &'static str); 22] = [
        (Self::SCRIPT, "Script"),
        (Self::DISABLED, "Disabled"),
        (Self::HOME_DIRECTORY_REQUIRED, "HomeDirectoryRequired"),
        (Self::LOCKOUT, "Lockout"),
        (Self::PASSWORD_NOT_REQUIRED, "PasswordNotRequired"),
        (Self::PASSWORD_CANT_CHANGE, "PasswordCantChange"),
        (Self::ENCRYPTED_TEXT_PASSWORD_ALLOWED, "EncryptedTextPasswordAllowed"),
        (Self::TEMP_DUPLICATE_ACCOUNT, "TempDuplicateAccount"),
        (Self::NORMAL_ACCOUNT, "NormalAccount"),
        (Self::INTERDOMAIN_TRUST_ACCOUNT, "InterdomainTrustAccount"),
        (Self::WORKSTATION_TRUST_ACCOUNT, "WorkstationTrustAccount"),
        (Self::SERVER_TRUST_ACCOUNT, "ServerTrustAccount"),
        (Self::PASSWORD_NEVER_EXPIRES, "PasswordNeverExpires"),
        (Self::MNS_LOGON_ACCOUNT, "MnsLogonAccount"),
        (Self::SMARTCARD_REQUIRED, "SmartcardRequired"),
        (Self::TRUSTED_FOR_DELEGATION, "TrustedForDelegation"),
        (Self::NOT_DELEGATED, "NotDelegated"),
        (Self::USE_DES_KEY_ONLY, "UseDesKeyOnly"),
        (Self::DONT_REQUIRE_PREAUTH, "DontRequirePreauth"),
        (Self::PASSWORD_EXPIRED, "PasswordExpired"),
        (Self::TRUSTED_TO_AUTH_FOR_DELEGATION, "TrustedToAuthForDelegation"),
        (Self::PARTIAL_SECRETS_ACCOUNT, "PartialSecretsAccount"),
    ];

    pub fn contains(self, flag: u32) -> bool {
        crate::codec::has_flag(self.0, flag)
    }

    /// Names of every known flag that is set.
    pub fn flag_names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl fmt::Debug for AccountControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountControl({:#x}: {})", self.0, self.flag_names().join(" | "))
    }
}
