//! Dataset Configuration
//!
//! Immutable description of the dataset shared by the label mapper, the
//! graph builder and the splitter.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use serde::{Deserialize, Serialize};

use crate::activity::{ActivityCatalog, LabelMapper, MergeTable};
use crate::house::{HouseRanges, RunConfig, DEFAULT_HOUSES};

// =============================================================================
// DatasetConfig
// =============================================================================

/// Activity classes, synonym rules, houses and their index ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Canonical activity classes.
    pub activities: ActivityCatalog,
    /// Houses in storage order.
    pub houses: Vec<String>,
    /// Raw-to-canonical activity synonyms.
    pub merges: MergeTable,
    /// Overrides the published ranges of the active run configuration.
    pub ranges: Option<HouseRanges>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            activities: ActivityCatalog::default(),
            merges: MergeTable::default(),
            houses: DEFAULT_HOUSES.iter().map(|h| (*h).to_string()).collect(),
            ranges: None,
        }
    }
}

impl DatasetConfig {
    /// Label mapper over this configuration.
    pub fn label_mapper(&self) -> LabelMapper<'_> {
        LabelMapper::new(&self.activities, &self.merges)
    }

    /// House ranges for `run`: the override if set, else the published table.
    pub fn house_ranges(&self, run: RunConfig) -> HouseRanges {
        self.ranges.clone().unwrap_or_else(|| run.default_ranges())
    }

    /// Number of activity classes.
    pub fn num_classes(&self) -> usize {
        self.activities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DatasetConfig::default();
        assert_eq!(config.num_classes(), 15);
        assert_eq!(config.houses.len(), 5);
        assert_eq!(config.house_ranges(RunConfig::Ob).total(), 8557);
        assert_eq!(config.label_mapper().resolve("shave").unwrap(), 11);
    }

    #[test]
    fn test_range_override() {
        let config = DatasetConfig {
            ranges: Some(HouseRanges::from_counts(&[("x", 3)])),
            ..DatasetConfig::default()
        };
        assert_eq!(config.house_ranges(RunConfig::Raw).total(), 3);
    }
}
