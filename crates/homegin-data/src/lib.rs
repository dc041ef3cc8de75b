//! homegin-data - Sensor Graph Data Pipeline
//!
//! Turns per-house smart-home sensor tables into labelled graphs and feeds
//! them to training:
//! - Activity catalog, synonym merges and the label mapper
//! - Run configurations, house ranges and the dataset configuration
//! - CSV table readers and the per-node feature encoder
//! - Graph builder and the binary graph store
//! - `Dataset` trait, leave-one-house-out splits, samplers and batching
//!
//! # Example
//!
//! ```ignore
//! use homegin_data::prelude::*;
//!
//! let config = DatasetConfig::default();
//! let builder = GraphBuilder::new("data", RunConfig::Ob, &config);
//! let store = GraphStore::load_or_build(RunConfig::Ob.store_path("data".as_ref()), &builder, false)?;
//! let ranges = config.house_ranges(RunConfig::Ob);
//! let total = store.num_graphs();
//! let split = DatasetSplit::leave_one_house_out(&ranges, "houseA", &[], total)?;
//!
//! let dataset = std::sync::Arc::new(store.into_dataset());
//! let train = SubsetDataset::new(dataset, split.train)?;
//! let loader = GraphDataLoader::new(train, 32)?;
//! for batch in loader.iter() {
//!     let batch = batch?;
//!     // batch.graph, batch.features, batch.labels
//! }
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// ML/tensor-specific allowances
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::float_cmp)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

// =============================================================================
// Module Declarations
// =============================================================================

pub mod activity;
pub mod builder;
pub mod collate;
pub mod config;
pub mod dataloader;
pub mod dataset;
pub mod features;
pub mod graph;
pub mod house;
pub mod sampler;
pub mod split;
pub mod store;
pub mod table;

// =============================================================================
// Re-exports
// =============================================================================

pub use activity::{ActivityCatalog, ActivityId, LabelMapper, MergeTable};
pub use builder::GraphBuilder;
pub use collate::{collate_graphs, GraphBatch};
pub use config::DatasetConfig;
pub use dataloader::{GraphDataLoader, GraphSample};
pub use dataset::{Dataset, GraphDataset, SubsetDataset};
pub use features::{FeatureEncoder, NodeFeature, NodeLayout, FEATURE_DIM};
pub use graph::{GraphTopology, SensorGraph};
pub use house::{HouseRange, HouseRanges, RunConfig, DEFAULT_HOUSES};
pub use sampler::{RandomSampler, Sampler, SequentialSampler};
pub use split::DatasetSplit;
pub use store::{GraphStore, HouseGraphs};
pub use table::{EdgeTable, NodeTable, SensorTable};

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for data loading.
pub mod prelude {
    pub use crate::{
        ActivityCatalog, ActivityId, Dataset, DatasetConfig, DatasetSplit, GraphBatch,
        GraphBuilder, GraphDataLoader, GraphDataset, GraphStore, HouseRanges, LabelMapper,
        MergeTable, RunConfig, SensorGraph, SubsetDataset,
    };
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use std::fmt::Write as _;
    use std::path::Path;

    /// Writes a raw-variant house: a structural kitchen node, fridge and door
    /// sensors, and the time-of-day node. Row `i` has time `9.5 + i`.
    pub fn write_house(data_dir: &Path, house: &str, activities: &[&str]) {
        let dir = data_dir.join(house);
        std::fs::create_dir_all(&dir).unwrap();

        let mut values = String::from("id,timestamp,activity,time_of_the_day,fridge,door\n");
        let mut changes = values.clone();
        for (i, activity) in activities.iter().enumerate() {
            writeln!(values, "{i},0,{activity},{},{},1", 9.5 + i as f32, i % 2).unwrap();
            writeln!(changes, "{i},0,{activity},0,{},{}", 3 * i, 5 * i).unwrap();
        }
        std::fs::write(dir.join(format!("{house}.csv")), values).unwrap();
        std::fs::write(dir.join("house-sensorChangeTime.csv"), changes).unwrap();
        std::fs::write(
            dir.join("nodes.csv"),
            "Name,Type,place_in_house,Object\n\
             kitchen,1,3,kitchen\n\
             fridge,2,3,fridge\n\
             door,4,1,door\n\
             time,5,0,\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("bidrectional_edges.csv"),
            "Src,Dst\n0,1\n1,0\n0,2\n2,0\n0,3\n3,0\n",
        )
        .unwrap();
    }
}
