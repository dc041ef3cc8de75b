//! Sensor Graphs - Topology and Per-Row Node Features
//!
//! Every row of a house shares one topology; only the node features change.
//! The topology is held behind an `Arc` so that tens of thousands of graphs
//! do not each carry a copy of the edge list.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::sync::Arc;

use homegin_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::features::NodeFeature;
use crate::table::EdgeTable;

// =============================================================================
// GraphTopology
// =============================================================================

/// Node count and directed edge list of a house.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphTopology {
    num_nodes: usize,
    src: Vec<usize>,
    dst: Vec<usize>,
}

impl GraphTopology {
    /// Creates a topology, checking every edge endpoint.
    pub fn new(num_nodes: usize, src: Vec<usize>, dst: Vec<usize>) -> Result<Self> {
        let topology = Self {
            num_nodes,
            src,
            dst,
        };
        topology.validate()?;
        Ok(topology)
    }

    /// Creates a topology from an edge table.
    pub fn from_edges(num_nodes: usize, edges: EdgeTable) -> Result<Self> {
        Self::new(num_nodes, edges.src, edges.dst)
    }

    /// Re-checks invariants, e.g. after deserialization.
    pub fn validate(&self) -> Result<()> {
        if self.src.len() != self.dst.len() {
            return Err(Error::invalid_graph(format!(
                "{} sources but {} destinations",
                self.src.len(),
                self.dst.len()
            )));
        }
        if let Some(&bad) = self
            .src
            .iter()
            .chain(&self.dst)
            .find(|&&n| n >= self.num_nodes)
        {
            return Err(Error::invalid_graph(format!(
                "edge endpoint {bad} out of range for {} nodes",
                self.num_nodes
            )));
        }
        Ok(())
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Number of directed edges.
    pub fn num_edges(&self) -> usize {
        self.src.len()
    }

    /// Edge sources.
    pub fn src(&self) -> &[usize] {
        &self.src
    }

    /// Edge destinations.
    pub fn dst(&self) -> &[usize] {
        &self.dst
    }
}

// =============================================================================
// SensorGraph
// =============================================================================

/// One graph: a shared topology plus the node features of one row.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorGraph {
    topology: Arc<GraphTopology>,
    features: Vec<NodeFeature>,
}

impl SensorGraph {
    /// Pairs features with a topology; one feature per node.
    pub fn new(topology: Arc<GraphTopology>, features: Vec<NodeFeature>) -> Result<Self> {
        if features.len() != topology.num_nodes() {
            return Err(Error::invalid_graph(format!(
                "{} feature rows for {} nodes",
                features.len(),
                topology.num_nodes()
            )));
        }
        Ok(Self { topology, features })
    }

    /// Pairs features already checked against the topology.
    pub(crate) fn from_parts(topology: Arc<GraphTopology>, features: Vec<NodeFeature>) -> Self {
        Self { topology, features }
    }

    /// Shared topology.
    pub fn topology(&self) -> &Arc<GraphTopology> {
        &self.topology
    }

    /// Node features.
    pub fn features(&self) -> &[NodeFeature] {
        &self.features
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.features.len()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_rejects_bad_endpoint() {
        assert!(GraphTopology::new(3, vec![0, 1], vec![1, 2]).is_ok());
        assert!(matches!(
            GraphTopology::new(3, vec![0, 3], vec![1, 2]),
            Err(Error::InvalidGraph { .. })
        ));
        assert!(GraphTopology::new(3, vec![0], vec![1, 2]).is_err());
    }

    #[test]
    fn test_graph_feature_count() {
        let topology = Arc::new(GraphTopology::new(2, vec![0, 1], vec![1, 0]).unwrap());
        let graph = SensorGraph::new(topology.clone(), vec![[0.0; 4]; 2]).unwrap();
        assert_eq!(graph.num_nodes(), 2);
        assert_eq!(graph.topology().num_edges(), 2);
        assert!(SensorGraph::new(topology, vec![[0.0; 4]; 3]).is_err());
    }
}
