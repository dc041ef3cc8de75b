//! Graph Structure - Batched Message-Passing Layout
//!
//! A `GraphStructure` describes a block-diagonal union of graphs: the
//! directed edge list over the concatenated node set, and the offsets where
//! each member graph's nodes start. The data crate produces it when
//! collating a batch; the nn crate consumes it for neighbour aggregation and
//! graph readout.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use crate::error::{Error, Result};

// =============================================================================
// GraphStructure
// =============================================================================

/// Edge list and graph membership of a batch of graphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphStructure {
    num_nodes: usize,
    src: Vec<usize>,
    dst: Vec<usize>,
    /// `graph_offsets[g]..graph_offsets[g + 1]` are the nodes of graph `g`.
    graph_offsets: Vec<usize>,
    in_degrees: Vec<usize>,
}

impl GraphStructure {
    /// Creates a validated structure.
    ///
    /// `graph_offsets` must start at 0, be non-decreasing and end at
    /// `num_nodes`; every edge endpoint must be a valid node.
    pub fn new(
        num_nodes: usize,
        src: Vec<usize>,
        dst: Vec<usize>,
        graph_offsets: Vec<usize>,
    ) -> Result<Self> {
        if src.len() != dst.len() {
            return Err(Error::invalid_graph(format!(
                "{} sources but {} destinations",
                src.len(),
                dst.len()
            )));
        }
        if graph_offsets.first() != Some(&0) || graph_offsets.last() != Some(&num_nodes) {
            return Err(Error::invalid_graph(format!(
                "graph offsets must span 0..{num_nodes}, got {graph_offsets:?}"
            )));
        }
        if graph_offsets.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::invalid_graph("graph offsets must be non-decreasing"));
        }
        if let Some(&bad) = src.iter().chain(dst.iter()).find(|&&n| n >= num_nodes) {
            return Err(Error::IndexOutOfBounds {
                index: bad,
                size: num_nodes,
            });
        }

        let mut in_degrees = vec![0usize; num_nodes];
        for &d in &dst {
            in_degrees[d] += 1;
        }

        Ok(Self {
            num_nodes,
            src,
            dst,
            graph_offsets,
            in_degrees,
        })
    }

    /// A single graph covering every node.
    pub fn single(num_nodes: usize, src: Vec<usize>, dst: Vec<usize>) -> Result<Self> {
        Self::new(num_nodes, src, dst, vec![0, num_nodes])
    }

    /// Total number of nodes across all graphs.
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Total number of directed edges.
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.src.len()
    }

    /// Number of member graphs.
    #[must_use]
    pub fn num_graphs(&self) -> usize {
        self.graph_offsets.len() - 1
    }

    /// Edge sources.
    #[must_use]
    pub fn src(&self) -> &[usize] {
        &self.src
    }

    /// Edge destinations.
    #[must_use]
    pub fn dst(&self) -> &[usize] {
        &self.dst
    }

    /// Number of incoming edges per node.
    #[must_use]
    pub fn in_degrees(&self) -> &[usize] {
        &self.in_degrees
    }

    /// Node range of graph `g`.
    #[must_use]
    pub fn graph_nodes(&self, g: usize) -> std::ops::Range<usize> {
        self.graph_offsets[g]..self.graph_offsets[g + 1]
    }

    /// Offsets delimiting every graph's nodes.
    #[must_use]
    pub fn graph_offsets(&self) -> &[usize] {
        &self.graph_offsets
    }
}

// =============================================================================
// Tests
// =============================================================================
