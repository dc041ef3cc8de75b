//! Graph Store - Binary Cache of Built Graphs
//!
//! All graphs of one run configuration are written once with `bincode` and
//! read back on later runs. Graphs are stored per house so the store also
//! records how many samples each house contributes.
//!
//! # File Format
//! ```text
//! GraphStore {
//!     format_version: u32,
//!     run_config: RunConfig,
//!     houses: [HouseGraphs { name, topology, features, labels }],
//! }
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use homegin_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::activity::ActivityId;
use crate::builder::GraphBuilder;
use crate::dataset::GraphDataset;
use crate::features::NodeFeature;
use crate::graph::{GraphTopology, SensorGraph};
use crate::house::{HouseRanges, RunConfig};

/// Current store format.
pub const STORE_FORMAT_VERSION: u32 = 1;

// =============================================================================
// HouseGraphs
// =============================================================================

/// Graphs and labels of one house, in row order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseGraphs {
    /// House name.
    pub name: String,
    /// Topology shared by every graph of the house.
    pub topology: GraphTopology,
    /// Node features per row.
    pub features: Vec<Vec<NodeFeature>>,
    /// Activity id per row.
    pub labels: Vec<ActivityId>,
}

impl HouseGraphs {
    /// Number of graphs.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if the house has no graphs.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn validate(&self) -> Result<()> {
        self.topology.validate()?;
        if self.features.len() != self.labels.len() {
            return Err(Error::invalid_graph(format!(
                "house '{}' has {} feature sets but {} labels",
                self.name,
                self.features.len(),
                self.labels.len()
            )));
        }
        if let Some(bad) = self
            .features
            .iter()
            .position(|f| f.len() != self.topology.num_nodes())
        {
            return Err(Error::invalid_graph(format!(
                "house '{}' graph {bad} has {} nodes, expected {}",
                self.name,
                self.features[bad].len(),
                self.topology.num_nodes()
            )));
        }
        Ok(())
    }
}

// =============================================================================
// GraphStore
// =============================================================================

/// Every graph of one run configuration, grouped by house in storage order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStore {
    format_version: u32,
    run_config: RunConfig,
    houses: Vec<HouseGraphs>,
}

impl GraphStore {
    /// Creates a store, validating every house.
    pub fn new(run_config: RunConfig, houses: Vec<HouseGraphs>) -> Result<Self> {
        let store = Self {
            format_version: STORE_FORMAT_VERSION,
            run_config,
            houses,
        };
        store.validate()?;
        Ok(store)
    }

    fn validate(&self) -> Result<()> {
        if self.format_version != STORE_FORMAT_VERSION {
            return Err(Error::serialization(format!(
                "graph store format {} is not supported (expected {STORE_FORMAT_VERSION})",
                self.format_version
            )));
        }
        self.houses.iter().try_for_each(HouseGraphs::validate)
    }

    /// Writes the store, replacing any previous file only once fully written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("bin.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            bincode::serialize_into(&mut writer, self).map_err(Error::serialization)?;
            writer.flush()?;
        }
        fs::rename(&tmp, path)?;
        info!(path = %path.display(), graphs = self.num_graphs(), "saved graph store");
        Ok(())
    }

    /// Reads a store written by [`GraphStore::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let store: Self = bincode::deserialize_from(reader).map_err(Error::serialization)?;
        store.validate()?;
        info!(path = %path.display(), graphs = store.num_graphs(), "loaded graph store");
        Ok(store)
    }

    /// Loads the store at `path`, or builds and saves it when absent.
    ///
    /// `force` rebuilds even if the file exists. A store written for another
    /// run configuration is rebuilt.
    pub fn load_or_build(
        path: impl AsRef<Path>,
        builder: &GraphBuilder<'_>,
        force: bool,
    ) -> Result<Self> {
        Self::load_or_build_observed(path, builder, force, |_| {})
    }

    /// Like [`GraphStore::load_or_build`], reporting each house built.
    pub fn load_or_build_observed<F>(
        path: impl AsRef<Path>,
        builder: &GraphBuilder<'_>,
        force: bool,
        on_house: F,
    ) -> Result<Self>
    where
        F: FnMut(&HouseGraphs),
    {
        let path = path.as_ref();
        if !force && path.exists() {
            let store = Self::load(path)?;
            if store.run_config == builder.run_config() {
                return Ok(store);
            }
            warn!(
                path = %path.display(),
                found = %store.run_config,
                expected = %builder.run_config(),
                "graph store has the wrong run configuration, rebuilding"
            );
        }
        let store = builder.build_observed(on_house)?;
        store.save(path)?;
        Ok(store)
    }

    /// Run configuration the graphs were built for.
    pub fn run_config(&self) -> RunConfig {
        self.run_config
    }

    /// Houses in storage order.
    pub fn houses(&self) -> &[HouseGraphs] {
        &self.houses
    }

    /// Total number of graphs.
    pub fn num_graphs(&self) -> usize {
        self.houses.iter().map(HouseGraphs::len).sum()
    }

    /// `(house, sample count)` in storage order.
    pub fn house_counts(&self) -> Vec<(String, usize)> {
        self.houses
            .iter()
            .map(|h| (h.name.clone(), h.len()))
            .collect()
    }

    /// House ranges implied by the stored sample counts.
    pub fn derived_ranges(&self) -> HouseRanges {
        HouseRanges::from_counts(&self.house_counts())
    }

    /// Every label in global index order.
    pub fn labels(&self) -> impl Iterator<Item = ActivityId> + '_ {
        self.houses.iter().flat_map(|h| h.labels.iter().copied())
    }

    /// Number of graphs per activity id.
    pub fn label_histogram(&self, num_classes: usize) -> Vec<usize> {
        let mut histogram = vec![0; num_classes];
        for label in self.labels() {
            if label >= histogram.len() {
                histogram.resize(label + 1, 0);
            }
            histogram[label] += 1;
        }
        histogram
    }

    /// Flattens the store into a dataset in global index order.
    pub fn into_dataset(self) -> GraphDataset {
        let mut graphs = Vec::with_capacity(self.num_graphs());
        let mut labels = Vec::with_capacity(self.num_graphs());
        for house in self.houses {
            let topology = Arc::new(house.topology);
            for (features, label) in house.features.into_iter().zip(house.labels) {
                graphs.push(SensorGraph::from_parts(Arc::clone(&topology), features));
                labels.push(label);
            }
        }
        GraphDataset::from_parts(graphs, labels)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;

    fn house(name: &str, labels: Vec<usize>) -> HouseGraphs {
        HouseGraphs {
            name: name.to_string(),
            topology: GraphTopology::new(2, vec![0, 1], vec![1, 0]).unwrap(),
            features: labels
                .iter()
                .map(|&l| vec![[l as f32, 1.0, 2.0, 3.0], [0.5, -1.0, -1.0, -1.0]])
                .collect(),
            labels,
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all_houses").join("all_houses_ob.bin");
        let store = GraphStore::new(
            RunConfig::Ob,
            vec![house("houseB", vec![4, 4, 1]), house("houseA", vec![13])],
        )
        .unwrap();
        store.save(&path).unwrap();
        assert!(!path.with_extension("bin.tmp").exists());

        let loaded = GraphStore::load(&path).unwrap();
        assert_eq!(loaded, store);
        assert_eq!(
            loaded.house_counts(),
            vec![("houseB".to_string(), 3), ("houseA".to_string(), 1)]
        );
        assert_eq!(loaded.derived_ranges().get("houseA").unwrap().indices(), 3..4);
    }

    #[test]
    fn test_histogram_and_dataset_order() {
        let store = GraphStore::new(
            RunConfig::Raw,
            vec![house("a", vec![0, 2]), house("b", vec![2])],
        )
        .unwrap();
        assert_eq!(store.label_histogram(3), vec![1, 0, 2]);
        assert_eq!(store.labels().collect::<Vec<_>>(), vec![0, 2, 2]);

        let dataset = store.into_dataset();
        assert_eq!(dataset.len(), 3);
        let (graph, label) = dataset.get(1).unwrap();
        assert_eq!(label, 2);
        assert_eq!(graph.features()[0][0], 2.0);
    }

    #[test]
    fn test_rejects_inconsistent_house() {
        let mut bad = house("a", vec![0, 1]);
        bad.labels.pop();
        assert!(GraphStore::new(RunConfig::Raw, vec![bad]).is_err());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            GraphStore::load(dir.path().join("nope.bin")),
            Err(Error::Io(_))
        ));
    }
}
