//! Parser for the tabular "locked accounts" listing printed by directory admin shells.
//!
//! The listing is a single-column table: a blank line, the column header and its
//! underline, one name per row, then two trailing blank lines.

const HEADER_LINES: usize = 3;
const FOOTER_LINES: usize = 2;

/// Account names from a locked-accounts listing.
///
/// Empty raw lines are discarded before the header and footer are cut off; a listing
/// too short to hold both yields nothing.
pub fn parse_locked_listing(output: &str) -> Vec<String> {
    let lines: Vec<&str> = output.split('\n').filter(|line| !line.is_empty()).collect();
    if lines.len() <= HEADER_LINES + FOOTER_LINES {
        return Vec::new();
    }
    lines[HEADER_LINES..lines.len() - FOOTER_LINES]
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
