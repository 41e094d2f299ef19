//! Line-oriented moon scan parser.
//!
//! A scan copied from the game looks like this (columns are tab separated):
//!
//! ```text
//! Moon    Moon Product    Quantity    Ore TypeID    SolarSystemID    PlanetID    MoonID
//! 66-PMM V - Moon 15
//!     Flawless Arkonor    0.323762148619    46678    30004923    40311969    40311985
//! ```
//!
//! Each line is either a moon header, a product row, or noise. Noise is
//! dropped one line at a time, so a ragged paste still yields whatever rows
//! are intact.

use super::table::{ItemRecord, ScanTable};
use regex::Regex;
use std::sync::LazyLock;

/// Marker present in the column header line of every scan.
pub const COLUMN_HEADER_MARKER: &str = "Moon Product";

/// `66-PMM V - Moon 15`; capture 1 is the whole moon name.
static MOON_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(.+ - Moon [0-9]+)\s*$").expect("moon line regex"));

/// Name, quantity, ore type, solar system, planet, moon.
static PRODUCT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(.+?)\s+([0-9]+(?:\.[0-9]+)?)\s+([0-9]+)\s+([0-9]+)\s+([0-9]+)\s+([0-9]+)\s*$",
    )
    .expect("product line regex")
});

/// How the lines of one parse were classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseSummary {
    /// Moon header lines seen.
    pub headers: usize,
    /// Product rows stored (overwrites included).
    pub rows: usize,
    /// Non-blank lines that were neither header, column header, nor a usable row.
    pub discarded: usize,
}

/// Parse a block of clipboard text into a scan table.
///
/// Never fails: unrecognized input just produces an empty table.
pub fn parse_scan(input: &str) -> ScanTable {
    parse_scan_with_summary(input).0
}

/// Same as [`parse_scan`], also reporting how many lines were used.
pub fn parse_scan_with_summary(input: &str) -> (ScanTable, ParseSummary) {
    let mut table = ScanTable::default();
    let mut summary = ParseSummary::default();
    let mut current_moon: Option<String> = None;

    for raw_line in input.split('\n') {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        if line.trim().is_empty() {
            continue;
        }

        if line.contains(COLUMN_HEADER_MARKER) {
            continue;
        }

        if let Some(caps) = MOON_LINE.captures(line) {
            let moon = &caps[1];
            table.ensure_group(moon);
            current_moon = Some(moon.to_string());
            summary.headers += 1;
            continue;
        }

        // Rows before the first moon header belong to nothing.
        let Some(moon) = current_moon.as_deref() else {
            summary.discarded += 1;
            continue;
        };

        match PRODUCT_LINE.captures(line) {
            Some(caps) => {
                let record = ItemRecord {
                    quantity: caps[2].to_string(),
                    ore_type_id: caps[3].to_string(),
                    solar_system_id: caps[4].to_string(),
                    planet_id: caps[5].to_string(),
                    moon_id: caps[6].to_string(),
                };
                table.insert(moon, &caps[1], record);
                summary.rows += 1;
            }
            None => {
                log::trace!("Discarding unrecognized scan line: {:?}", line);
                summary.discarded += 1;
            }
        }
    }

    (table, summary)
}
