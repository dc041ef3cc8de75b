//! Houses - Run Configurations and House Index Ranges
//!
//! A run configuration selects which processed variant of the sensor logs
//! is used and where its files live. Each house owns a contiguous range of
//! the global graph index space.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use homegin_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Houses in the order their graphs are stored.
pub const DEFAULT_HOUSES: [&str; 5] = ["ordonezB", "houseB", "houseC", "houseA", "ordonezA"];

// =============================================================================
// RunConfig
// =============================================================================

/// Dataset variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunConfig {
    /// Unprocessed sensor values.
    Raw,
    /// Binarised sensor values.
    Ob,
}

impl RunConfig {
    /// Short name used in file names.
    pub fn as_str(self) -> &'static str {
        match self {
            RunConfig::Raw => "raw",
            RunConfig::Ob => "ob",
        }
    }

    /// Per-row sensor value table of `house`.
    pub fn value_table(self, data_dir: &Path, house: &str) -> PathBuf {
        let file = match self {
            RunConfig::Raw => format!("{house}.csv"),
            RunConfig::Ob => format!("ob_{house}.csv"),
        };
        data_dir.join(house).join(file)
    }

    /// Per-row last-change-time table of `house`.
    pub fn change_time_table(self, data_dir: &Path, house: &str) -> PathBuf {
        let file = match self {
            RunConfig::Raw => "house-sensorChangeTime.csv",
            RunConfig::Ob => "ob-house-sensorChangeTime.csv",
        };
        data_dir.join(house).join(file)
    }

    /// Static node table of `house`.
    pub fn node_table(self, data_dir: &Path, house: &str) -> PathBuf {
        data_dir.join(house).join("nodes.csv")
    }

    /// Edge list of `house`.
    pub fn edge_table(self, data_dir: &Path, house: &str) -> PathBuf {
        data_dir.join(house).join("bidrectional_edges.csv")
    }

    /// Binary graph store for this run configuration.
    pub fn store_path(self, data_dir: &Path) -> PathBuf {
        data_dir
            .join("all_houses")
            .join(format!("all_houses_{}.bin", self.as_str()))
    }

    /// Embedding export file name.
    pub fn embeddings_file_name(self) -> String {
        format!("{}_graph_embeddings.csv", self.as_str())
    }

    /// Published house ranges of this variant.
    pub fn default_ranges(self) -> HouseRanges {
        let bounds: [usize; 6] = match self {
            RunConfig::Ob => [0, 2487, 4636, 6954, 7989, 8557],
            RunConfig::Raw => [0, 30470, 51052, 77539, 114626, 134501],
        };
        HouseRanges {
            houses: DEFAULT_HOUSES
                .iter()
                .zip(bounds.windows(2))
                .map(|(name, w)| HouseRange::new(*name, w[0]..w[1]))
                .collect(),
        }
    }
}

impl fmt::Display for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(RunConfig::Raw),
            "ob" => Ok(RunConfig::Ob),
            other => Err(Error::invalid_operation(format!(
                "unknown run configuration '{other}', expected raw or ob"
            ))),
        }
    }
}

// =============================================================================
// HouseRange
// =============================================================================

/// Contiguous index range of one house.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseRange {
    /// House name.
    pub name: String,
    /// First global index.
    pub start: usize,
    /// One past the last global index.
    pub end: usize,
}

impl HouseRange {
    /// Creates a range.
    pub fn new(name: impl Into<String>, range: Range<usize>) -> Self {
        Self {
            name: name.into(),
            start: range.start,
            end: range.end,
        }
    }

    /// Global indices of the house.
    pub fn indices(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the range holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// HouseRanges
// =============================================================================

/// Ordered house ranges that partition the global index space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HouseRanges {
    houses: Vec<HouseRange>,
}

impl HouseRanges {
    /// Creates a table, checking that ranges are contiguous from 0.
    pub fn new(houses: Vec<HouseRange>) -> Result<Self> {
        let ranges = Self { houses };
        ranges.check_contiguous()?;
        Ok(ranges)
    }

    /// Derives ranges from per-house sample counts in storage order.
    pub fn from_counts<S: AsRef<str>>(counts: &[(S, usize)]) -> Self {
        let mut start = 0;
        let houses = counts
            .iter()
            .map(|(name, count)| {
                let range = HouseRange::new(name.as_ref(), start..start + count);
                start += count;
                range
            })
            .collect();
        Self { houses }
    }

    fn check_contiguous(&self) -> Result<()> {
        let mut expected = 0;
        for (i, house) in self.houses.iter().enumerate() {
            if house.start > house.end {
                return Err(Error::InvalidHouseRanges {
                    message: format!("'{}' ends before it starts", house.name),
                });
            }
            if house.start != expected {
                let kind = if house.start > expected { "gap" } else { "overlap" };
                return Err(Error::InvalidHouseRanges {
                    message: format!(
                        "{kind} before '{}': starts at {}, expected {expected}",
                        house.name, house.start
                    ),
                });
            }
            if self.houses[..i].iter().any(|h| h.name == house.name) {
                return Err(Error::InvalidHouseRanges {
                    message: format!("house '{}' listed twice", house.name),
                });
            }
            expected = house.end;
        }
        Ok(())
    }

    /// Checks that the ranges partition `[0, total)` exactly.
    pub fn validate(&self, total: usize) -> Result<()> {
        self.check_contiguous()?;
        if self.total() != total {
            return Err(Error::InvalidHouseRanges {
                message: format!(
                    "ranges cover {} samples but the dataset has {total}",
                    self.total()
                ),
            });
        }
        Ok(())
    }

    /// Range of `name`.
    pub fn get(&self, name: &str) -> Result<&HouseRange> {
        self.houses
            .iter()
            .find(|h| h.name == name)
            .ok_or_else(|| Error::UnknownHouse {
                name: name.to_string(),
            })
    }

    /// Total number of indices covered.
    pub fn total(&self) -> usize {
        self.houses.last().map_or(0, |h| h.end)
    }

    /// House names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.houses.iter().map(|h| h.name.as_str())
    }

    /// Iterates over the ranges in order.
    pub fn iter(&self) -> std::slice::Iter<'_, HouseRange> {
        self.houses.iter()
    }

    /// Number of houses.
    pub fn len(&self) -> usize {
        self.houses.len()
    }

    /// Returns true if there are no houses.
    pub fn is_empty(&self) -> bool {
        self.houses.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
