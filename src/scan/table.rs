//! Moon scan table types.

use serde::Serialize;
use std::collections::BTreeMap;

/// One product line of a moon scan.
///
/// Every field keeps the literal text from the clipboard, so quantities like
/// `0.323762148619` and ids with leading zeros round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemRecord {
    pub quantity: String,
    pub ore_type_id: String,
    pub solar_system_id: String,
    pub planet_id: String,
    pub moon_id: String,
}

/// Products of a single moon, keyed by product name.
pub type MoonGroup = BTreeMap<String, ItemRecord>;

/// Parsed scan: moon name → product name → record.
///
/// Serializes as a plain nested JSON object with sorted keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScanTable {
    moons: BTreeMap<String, MoonGroup>,
}

impl ScanTable {
    /// Make sure a group exists for `moon` (an empty one if new).
    pub(crate) fn ensure_group(&mut self, moon: &str) {
        if !self.moons.contains_key(moon) {
            self.moons.insert(moon.to_string(), MoonGroup::new());
        }
    }

    /// Insert a record, replacing any earlier one for the same moon and product.
    pub(crate) fn insert(&mut self, moon: &str, product: &str, record: ItemRecord) {
        self.moons
            .entry(moon.to_string())
            .or_default()
            .insert(product.to_string(), record);
    }

    /// Look up a single record.
    pub fn get(&self, moon: &str, product: &str) -> Option<&ItemRecord> {
        self.moons.get(moon).and_then(|group| group.get(product))
    }

    pub fn group(&self, moon: &str) -> Option<&MoonGroup> {
        self.moons.get(moon)
    }

    /// Iterate over moons in key order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &MoonGroup)> {
        self.moons.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of moons (including moons with no products).
    pub fn len(&self) -> usize {
        self.moons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moons.is_empty()
    }

    /// Total number of product records across all moons.
    pub fn record_count(&self) -> usize {
        self.moons.values().map(|group| group.len()).sum()
    }
}
