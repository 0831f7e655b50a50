//! Utility modules.

/// Log sanitization so filters and diagnostics stay readable in logs.
pub mod log_sanitizer;
