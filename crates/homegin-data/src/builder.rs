//! Graph Builder - House CSVs to Labelled Graphs
//!
//! Reads the four tables of every configured house, compiles the node
//! layout once, then encodes every row into node features and an activity
//! id. Rows are encoded in parallel and collected in row order.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::path::{Path, PathBuf};
use std::time::Instant;

use homegin_core::Result;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::DatasetConfig;
use crate::features::{FeatureEncoder, NodeFeature, NodeLayout};
use crate::graph::GraphTopology;
use crate::house::RunConfig;
use crate::store::{GraphStore, HouseGraphs};
use crate::table::{EdgeTable, NodeTable, SensorTable};

/// Column of the value table holding the raw activity label.
pub const ACTIVITY_COLUMN: usize = 2;

// =============================================================================
// GraphBuilder
// =============================================================================

/// Builds the graphs of every configured house for one run configuration.
#[derive(Debug, Clone)]
pub struct GraphBuilder<'a> {
    data_dir: PathBuf,
    run: RunConfig,
    config: &'a DatasetConfig,
}

impl<'a> GraphBuilder<'a> {
    /// Creates a builder reading from `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>, run: RunConfig, config: &'a DatasetConfig) -> Self {
        Self {
            data_dir: data_dir.into(),
            run,
            config,
        }
    }

    /// Directory holding one sub-directory per house.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Run configuration being built.
    pub fn run_config(&self) -> RunConfig {
        self.run
    }

    /// Builds the graphs of one house.
    pub fn build_house(&self, house: &str) -> Result<HouseGraphs> {
        let start = Instant::now();
        let values = SensorTable::read(self.run.value_table(&self.data_dir, house))?;
        let changes = SensorTable::read(self.run.change_time_table(&self.data_dir, house))?;
        let nodes = NodeTable::read(self.run.node_table(&self.data_dir, house))?;
        let edges = EdgeTable::read(self.run.edge_table(&self.data_dir, house))?;

        let layout = NodeLayout::compile(&nodes)?;
        let topology = GraphTopology::from_edges(layout.num_nodes(), edges)?;
        let encoder = FeatureEncoder::new(&layout, &values, &changes)?;
        let mapper = self.config.label_mapper();
        debug!(
            house,
            nodes = layout.num_nodes(),
            sensor_columns = layout.num_sensor_columns(),
            "compiled node layout"
        );

        let samples: Vec<(Vec<NodeFeature>, usize)> = (0..values.len())
            .into_par_iter()
            .map(|row| -> Result<(Vec<NodeFeature>, usize)> {
                let features = encoder.encode(row)?;
                let label = mapper.resolve(values.cell(row, ACTIVITY_COLUMN)?)?;
                Ok((features, label))
            })
            .collect::<Result<_>>()?;
        let (features, labels): (Vec<_>, Vec<_>) = samples.into_iter().unzip();

        info!(
            house,
            graphs = labels.len(),
            nodes = topology.num_nodes(),
            edges = topology.num_edges(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "built house graphs"
        );
        Ok(HouseGraphs {
            name: house.to_string(),
            topology,
            features,
            labels,
        })
    }

    /// Builds every configured house in order.
    pub fn build(&self) -> Result<GraphStore> {
        self.build_observed(|_| {})
    }

    /// Builds every configured house, calling `on_house` after each one.
    pub fn build_observed<F>(&self, mut on_house: F) -> Result<GraphStore>
    where
        F: FnMut(&HouseGraphs),
    {
        let mut houses = Vec::with_capacity(self.config.houses.len());
        for house in &self.config.houses {
            let graphs = self.build_house(house)?;
            on_house(&graphs);
            houses.push(graphs);
        }
        let store = GraphStore::new(self.run, houses)?;
        info!(
            run_config = %self.run,
            houses = store.houses().len(),
            graphs = store.num_graphs(),
            "graph store built"
        );
        Ok(store)
    }
}

// =============================================================================
// Tests
// =============================================================================
