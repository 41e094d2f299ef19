//! Moon scan detection and parsing.
//!
//! Clipboard text is first checked with [`looks_like_moon_scan`], then turned
//! into a [`ScanTable`] by [`parse_scan`]. Neither step can fail.

mod detect;
mod parser;
mod table;

pub use detect::looks_like_moon_scan;
pub use parser::{parse_scan, parse_scan_with_summary, ParseSummary, COLUMN_HEADER_MARKER};
pub use table::{ItemRecord, MoonGroup, ScanTable};
