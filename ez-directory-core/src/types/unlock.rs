//! Per-controller unlock outcome

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UnlockStatus {
    /// Reachable, account not locked on this controller.
    Checked,
    /// The account was locked and has been unlocked on this controller.
    Unlocked,
    /// The controller could not be queried or the unlock failed.
    Failed,
}

/// Outcome for one domain controller in an unlock run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockResult {
    pub controller: String,
    pub status: UnlockStatus,
    pub message: String,
    pub was_unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bad_password_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_bad_password_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub response_time_ms: u64,
    pub completed_at: DateTime<Utc>,
}

/// Host label before the first dot.
pub fn short_controller_name(controller: &str) -> &str {
    controller.split('.').next().unwrap_or(controller)
}

/// `MM/DD/YYYY h:mm AM` in `tz`, or `never`.
pub fn format_bad_password_time<Tz>(time: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    time.map_or_else(
        || "never".to_string(),
        |t| t.with_timezone(tz).format("%m/%d/%Y %-I:%M %p").to_string(),
    )
}

impl UnlockResult {
    /// Controller answered; `was_unlocked` tells whether an unlock was written.
    pub fn reached<Tz>(
        controller: &str,
        bad_password_count: i64,
        last_bad_password_at: Option<DateTime<Utc>>,
        was_unlocked: bool,
        response_time_ms: u64,
        tz: &Tz,
    ) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self {
            controller: controller.to_string(),
            status: if was_unlocked {
                UnlockStatus::Unlocked
            } else {
                UnlockStatus::Checked
            },
            message: format!(
                "{}: {bad_password_count} Failed last on {}",
                short_controller_name(controller),
                format_bad_password_time(last_bad_password_at, tz)
            ),
            was_unlocked,
            bad_password_count: Some(bad_password_count),
            last_bad_password_at,
            error: None,
            response_time_ms,
            completed_at: Utc::now(),
        }
    }

    pub fn failed(controller: &str, error: impl Into<String>, response_time_ms: u64) -> Self {
        Self {
            controller: controller.to_string(),
            status: UnlockStatus::Failed,
            message: format!("Failed to connect to {controller}"),
            was_unlocked: false,
            bad_password_count: None,
            last_bad_password_at: None,
            error: Some(error.into()),
            response_time_ms,
            completed_at: Utc::now(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == UnlockStatus::Failed
    }
}
