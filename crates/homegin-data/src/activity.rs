//! Activities - Class Catalog and Label Mapping
//!
//! The activity catalog fixes the class ids the classifier predicts. Raw
//! activity names from the house logs are first passed through a merge
//! table of synonyms and then looked up in the catalog.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::collections::BTreeMap;

use homegin_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Integer class id of an activity.
pub type ActivityId = usize;

// =============================================================================
// ActivityCatalog
// =============================================================================

const DEFAULT_ACTIVITIES: [&str; 15] = [
    "washDishes",
    "goToBed",
    "brushTeeth",
    "prepareLunch",
    "eating",
    "takeShower",
    "leaveHouse",
    "getDrink",
    "prepareBreakfast",
    "getSnack",
    "idle",
    "grooming",
    "prepareDinner",
    "relaxing",
    "useToilet",
];

/// Ordered list of canonical activity names; the position is the class id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityCatalog {
    names: Vec<String>,
}

impl Default for ActivityCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVITIES.iter().map(|s| (*s).to_string()).collect())
    }
}

impl ActivityCatalog {
    /// Creates a catalog from names in id order.
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if the catalog has no classes.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Looks up the id of a canonical name.
    pub fn id_for_name(&self, name: &str) -> Result<ActivityId> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| Error::UnknownActivity {
                name: name.to_string(),
            })
    }

    /// Looks up the canonical name of an id.
    pub fn name_for_id(&self, id: ActivityId) -> Result<&str> {
        self.names
            .get(id)
            .map(String::as_str)
            .ok_or(Error::UnknownActivityId { id })
    }

    /// Names in id order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

// =============================================================================
// MergeTable
// =============================================================================

const DEFAULT_MERGES: [(&str, &str); 19] = [
    ("loadDishwasher", "washDishes"),
    ("unloadDishwasher", "washDishes"),
    ("loadWashingmachine", "washClothes"),
    ("unloadWashingmachine", "washClothes"),
    ("receiveGuest", "relaxing"),
    ("eatDinner", "eating"),
    ("eatBreakfast", "eating"),
    ("getDressed", "grooming"),
    ("shave", "grooming"),
    ("takeMedication", "idle"),
    ("leave_Home", "leaveHouse"),
    ("Sleeping", "goToBed"),
    ("Bed_to_Toilet", "useToilet"),
    ("Enter_Home", "idle"),
    ("Respirate", "relaxing"),
    ("Work", "idle"),
    ("Housekeeping", "idle"),
    ("Idle", "idle"),
    ("watchTV", "relaxing"),
];

/// Synonym rules mapping raw activity names to canonical ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergeTable {
    rules: BTreeMap<String, String>,
}

impl Default for MergeTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_MERGES
                .iter()
                .map(|(raw, canonical)| ((*raw).to_string(), (*canonical).to_string()))
                .collect(),
        )
    }
}

impl MergeTable {
    /// Creates a merge table from `raw -> canonical` rules.
    pub fn new(rules: BTreeMap<String, String>) -> Self {
        Self { rules }
    }

    /// Canonical name for `raw`, if a rule exists.
    pub fn get(&self, raw: &str) -> Option<&str> {
        self.rules.get(raw).map(String::as_str)
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// =============================================================================
// LabelMapper
// =============================================================================

/// Resolves raw activity names to class ids.
#[derive(Debug, Clone, Copy)]
pub struct LabelMapper<'a> {
    catalog: &'a ActivityCatalog,
    merges: &'a MergeTable,
}

impl<'a> LabelMapper<'a> {
    /// Creates a mapper over a catalog and a merge table.
    pub fn new(catalog: &'a ActivityCatalog, merges: &'a MergeTable) -> Self {
        Self { catalog, merges }
    }

    /// Canonical name for `raw`: the merge target if a rule exists, else `raw`.
    pub fn canonical<'r>(&self, raw: &'r str) -> &'r str
    where
        'a: 'r,
    {
        self.merges.get(raw).unwrap_or(raw)
    }

    /// Resolves a raw name to a class id.
    pub fn resolve(&self, raw: &str) -> Result<ActivityId> {
        self.catalog.id_for_name(self.canonical(raw.trim()))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_round_trip() {
        let catalog = ActivityCatalog::default();
        assert_eq!(catalog.len(), 15);
        for id in 0..catalog.len() {
            let name = catalog.name_for_id(id).unwrap();
            assert_eq!(catalog.id_for_name(name).unwrap(), id);
        }
        assert_eq!(catalog.id_for_name("washDishes").unwrap(), 0);
        assert_eq!(catalog.id_for_name("useToilet").unwrap(), 14);
        assert!(matches!(
            catalog.name_for_id(15),
            Err(Error::UnknownActivityId { id: 15 })
        ));
    }

    #[test]
    fn test_merge_then_direct_lookup() {
        let catalog = ActivityCatalog::default();
        let merges = MergeTable::default();
        assert_eq!(merges.len(), 19);
        let mapper = LabelMapper::new(&catalog, &merges);

        assert_eq!(mapper.resolve("loadDishwasher").unwrap(), 0);
        assert_eq!(mapper.resolve("watchTV").unwrap(), 13);
        assert_eq!(mapper.resolve("Sleeping").unwrap(), 1);
        assert_eq!(mapper.resolve("eating").unwrap(), 4);
        assert_eq!(mapper.resolve(" idle ").unwrap(), 10);
    }

    #[test]
    fn test_unknown_activity_errors() {
        let catalog = ActivityCatalog::default();
        let merges = MergeTable::default();
        let mapper = LabelMapper::new(&catalog, &merges);

        assert!(matches!(
            mapper.resolve("juggling"),
            Err(Error::UnknownActivity { .. })
        ));
        // merge target missing from the catalog
        match mapper.resolve("loadWashingmachine") {
            Err(Error::UnknownActivity { name }) => assert_eq!(name, "washClothes"),
            other => panic!("expected UnknownActivity, got {other:?}"),
        }
    }
}
