//! Collate - Merging Graphs into One Batch
//!
//! A batch is the disjoint union of its graphs: node features are stacked,
//! each graph's edges are shifted by the number of nodes before it, and the
//! per-graph node offsets are recorded for readout.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use homegin_core::{GraphStructure, Result, Tensor};

use crate::activity::ActivityId;
use crate::features::FEATURE_DIM;
use crate::graph::SensorGraph;

// =============================================================================
// GraphBatch
// =============================================================================

/// Several graphs merged into one, with their labels.
#[derive(Debug, Clone)]
pub struct GraphBatch {
    /// Union graph with member offsets.
    pub graph: GraphStructure,
    /// Node features, `[total_nodes, FEATURE_DIM]`.
    pub features: Tensor,
    /// One label per member graph.
    pub labels: Vec<ActivityId>,
}

impl GraphBatch {
    /// Number of graphs in the batch.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if the batch holds no graphs.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

// =============================================================================
// collate_graphs
// =============================================================================

/// Merges `samples` into one batch, preserving their order.
pub fn collate_graphs(samples: Vec<(SensorGraph, ActivityId)>) -> Result<GraphBatch> {
    let total_nodes: usize = samples.iter().map(|(g, _)| g.num_nodes()).sum();
    let total_edges: usize = samples
        .iter()
        .map(|(g, _)| g.topology().num_edges())
        .sum();

    let mut features = Vec::with_capacity(total_nodes * FEATURE_DIM);
    let mut src = Vec::with_capacity(total_edges);
    let mut dst = Vec::with_capacity(total_edges);
    let mut offsets = Vec::with_capacity(samples.len() + 1);
    let mut labels = Vec::with_capacity(samples.len());

    let mut offset = 0;
    offsets.push(0);
    for (graph, label) in samples {
        let topology = graph.topology();
        src.extend(topology.src().iter().map(|&s| s + offset));
        dst.extend(topology.dst().iter().map(|&d| d + offset));
        features.extend(graph.features().iter().flatten().copied());
        offset += graph.num_nodes();
        offsets.push(offset);
        labels.push(label);
    }

    Ok(GraphBatch {
        graph: GraphStructure::new(total_nodes, src, dst, offsets)?,
        features: Tensor::from_vec(features, &[total_nodes, FEATURE_DIM])?,
        labels,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphTopology;
    use std::sync::Arc;

    #[test]
    fn test_collate_offsets_edges() {
        let a = Arc::new(GraphTopology::new(2, vec![0, 1], vec![1, 0]).unwrap());
        let b = Arc::new(GraphTopology::new(3, vec![0, 2], vec![2, 1]).unwrap());
        let samples = vec![
            (SensorGraph::new(a, vec![[1.0; 4], [2.0; 4]]).unwrap(), 3),
            (SensorGraph::new(b, vec![[3.0; 4], [4.0; 4], [5.0; 4]]).unwrap(), 7),
        ];
        let batch = collate_graphs(samples).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.labels, vec![3, 7]);
        assert_eq!(batch.graph.num_nodes(), 5);
        assert_eq!(batch.graph.num_graphs(), 2);
        assert_eq!(batch.graph.src(), &[0, 1, 2, 4]);
        assert_eq!(batch.graph.dst(), &[1, 0, 4, 3]);
        assert_eq!(batch.graph.graph_nodes(1), 2..5);
        assert_eq!(batch.features.shape(), &[5, 4]);
        assert_eq!(batch.features.row(3)[0], 4.0);
    }

    #[test]
    fn test_collate_empty() {
        let batch = collate_graphs(Vec::new()).unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.graph.num_nodes(), 0);
    }
}
