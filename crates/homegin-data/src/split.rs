//! Dataset Splitter - Leave-One-House-Out Index Sets
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::collections::BTreeSet;

use homegin_core::Result;
use serde::{Deserialize, Serialize};

use crate::house::HouseRanges;

// =============================================================================
// DatasetSplit
// =============================================================================

/// Train, validation and test indices into the global graph list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSplit {
    /// Indices used for training, ascending.
    pub train: Vec<usize>,
    /// Indices of the other held-out houses.
    pub valid: Vec<usize>,
    /// Indices of the target house.
    pub test: Vec<usize>,
}

impl DatasetSplit {
    /// Holds out `target` as the test house.
    ///
    /// Houses in `held_out` other than `target` form the validation set.
    /// Everything else trains, in ascending index order.
    pub fn leave_one_house_out(
        ranges: &HouseRanges,
        target: &str,
        held_out: &[String],
        total: usize,
    ) -> Result<Self> {
        ranges.validate(total)?;
        let test: Vec<usize> = ranges.get(target)?.indices().collect();

        let mut valid_houses: Vec<&str> = Vec::new();
        for house in held_out {
            ranges.get(house)?;
            if house != target && !valid_houses.contains(&house.as_str()) {
                valid_houses.push(house);
            }
        }
        let mut valid = Vec::new();
        for house in valid_houses {
            valid.extend(ranges.get(house)?.indices());
        }

        let excluded: BTreeSet<usize> = test.iter().chain(&valid).copied().collect();
        let train = (0..total).filter(|i| !excluded.contains(i)).collect();

        Ok(Self { train, valid, test })
    }
}

// =============================================================================
// Tests
// =============================================================================
