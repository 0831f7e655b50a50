//! Domain types

mod account;
mod account_control;
mod bitlocker;
mod group;
mod unlock;

pub use account::{ACCOUNT_ATTRIBUTES, DirectoryAccount};
pub use account_control::AccountControl;
pub use bitlocker::{BitlockerRecoveryRecord, RECOVERY_ATTRIBUTES};
pub use group::{COMPUTER_ATTRIBUTES, DirectoryComputer, DirectoryGroup, GROUP_ATTRIBUTES};
pub use unlock::{UnlockResult, UnlockStatus, format_bad_password_time, short_controller_name};

// Re-export backend value types used in service signatures
pub use ez_directory_backend::{Credential, DirectoryPath};
