//! Utilities

pub mod locked_listing;

pub use locked_listing::parse_locked_listing;
