//! Log sanitization utilities
//!
//! Keeps very long search filters and server diagnostics from flooding debug logs.

/// Maximum number of bytes kept in truncated log output.
const LOG_LIMIT: usize = 512;

/// Largest char boundary not after `index`.
fn char_boundary_at_or_before(s: &str, index: usize) -> usize {
    (0..=index.min(s.len()))
        .rev()
        .find(|&i| s.is_char_boundary(i))
        .unwrap_or(0)
}

/// Truncate a string for logging, noting the original length when cut.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= LOG_LIMIT {
        return s.to_string();
    }
    let cut = char_boundary_at_or_before(s, LOG_LIMIT);
    format!("{}... [{} bytes total]", &s[..cut], s.len())
}
