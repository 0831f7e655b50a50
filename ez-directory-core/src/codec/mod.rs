//! Attribute codec
//!
//! Converts loosely-typed directory attribute values into typed fields. Every reader
//! returns a neutral default (empty string, `None`, `false`, `0`) for absent or
//! malformed values; a bad attribute never aborts decoding of the rest of a record.

pub mod dn;
pub mod filetime;
pub mod generalized_time;
pub mod guid;

use chrono::{DateTime, Utc};
use ez_directory_backend::AttributeBag;

pub use dn::{component_value, decode_rdn_value, dn_to_domain, domain_to_dn, split_dn};
pub use filetime::{from_file_time, to_file_time};
pub use generalized_time::parse_generalized_time;
pub use guid::format_guid;

/// Whether `flag` is set in `raw`.
pub fn has_flag(raw: u32, flag: u32) -> bool {
    raw & flag != 0
}

/// Typed reads over an [`AttributeBag`].
pub trait AttributeReader {
    /// First value, or an empty string.
    fn string(&self, name: &str) -> String;

    /// All values, in server order.
    fn strings(&self, name: &str) -> Vec<String>;

    /// First value as a signed 64-bit integer, or `0`.
    fn int64(&self, name: &str) -> i64;

    /// First value as a 32-bit integer, or `0`. Negative values keep their bit pattern.
    fn uint32(&self, name: &str) -> u32;

    /// First value as a directory 64-bit timestamp.
    fn file_time(&self, name: &str) -> Option<DateTime<Utc>>;

    /// First value as generalized time.
    fn generalized_time(&self, name: &str) -> Option<DateTime<Utc>>;

    /// First value as a GUID string.
    fn guid(&self, name: &str) -> Option<String>;

    /// Flag test against the first value of an integer attribute.
    fn flag(&self, name: &str, flag: u32) -> bool {
        has_flag(self.uint32(name), flag)
    }
}

impl AttributeReader for AttributeBag {
    fn string(&self, name: &str) -> String {
        self.first_text(name).unwrap_or_default().to_string()
    }

    fn strings(&self, name: &str) -> Vec<String> {
        self.text(name).to_vec()
    }

    fn int64(&self, name: &str) -> i64 {
        let Some(raw) = self.first_text(name) else {
            return 0;
        };
        raw.trim().parse().unwrap_or_else(|e| {
            log::debug!("[{}] attribute {name}: bad integer '{raw}': {e}", self.dn);
            0
        })
    }

    fn uint32(&self, name: &str) -> u32 {
        let Some(raw) = self.first_text(name) else {
            return 0;
        };
        let raw = raw.trim();
        // Directories render 32-bit attributes signed; keep the bit pattern.
        raw.parse::<u32>()
            .ok()
            .or_else(|| raw.parse::<i32>().ok().map(i32::cast_unsigned))
            .unwrap_or_else(|| {
                log::debug!("[{}] attribute {name}: bad 32-bit value '{raw}'", self.dn);
                0
            })
    }

    fn file_time(&self, name: &str) -> Option<DateTime<Utc>> {
        from_file_time(self.int64(name))
    }

    fn generalized_time(&self, name: &str) -> Option<DateTime<Utc>> {
        let raw = self.first_text(name)?;
        let parsed = parse_generalized_time(raw);
        if parsed.is_none() {
            log::debug!("[{}] attribute {name}: bad generalized time '{raw}'", self.dn);
        }
        parsed
    }

    fn guid(&self, name: &str) -> Option<String> {
        let bytes = self.first_bytes(name)?;
        let guid = format_guid(bytes);
        if guid.is_none() {
            log::debug!(
                "[{}] attribute {name}: expected 16 bytes, got {}",
                self.dn,
                bytes.len()
            );
        }
        guid
    }
}
