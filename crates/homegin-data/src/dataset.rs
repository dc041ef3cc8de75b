//! Dataset Trait - Indexed Access to Labelled Graphs
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::sync::Arc;

use homegin_core::{Error, Result};

use crate::activity::ActivityId;
use crate::graph::SensorGraph;

// =============================================================================
// Dataset Trait
// =============================================================================

/// Core trait for all datasets.
///
/// A dataset provides indexed access to data items.
pub trait Dataset: Send + Sync {
    /// The type of items in the dataset.
    type Item: Send;

    /// Returns the number of items in the dataset.
    fn len(&self) -> usize;

    /// Returns true if the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gets an item by index.
    fn get(&self, index: usize) -> Option<Self::Item>;
}

impl<D: Dataset> Dataset for Arc<D> {
    type Item = D::Item;

    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, index: usize) -> Option<Self::Item> {
        (**self).get(index)
    }
}

// =============================================================================
// GraphDataset
// =============================================================================

/// Graphs with their activity ids in global index order.
#[derive(Debug, Clone, Default)]
pub struct GraphDataset {
    graphs: Vec<SensorGraph>,
    labels: Vec<ActivityId>,
}

impl GraphDataset {
    /// Creates a dataset; graphs and labels must have equal length.
    pub fn new(graphs: Vec<SensorGraph>, labels: Vec<ActivityId>) -> Result<Self> {
        if graphs.len() != labels.len() {
            return Err(Error::invalid_operation(format!(
                "{} graphs but {} labels",
                graphs.len(),
                labels.len()
            )));
        }
        Ok(Self { graphs, labels })
    }

    pub(crate) fn from_parts(graphs: Vec<SensorGraph>, labels: Vec<ActivityId>) -> Self {
        Self { graphs, labels }
    }

    /// Labels in index order.
    pub fn labels(&self) -> &[ActivityId] {
        &self.labels
    }

    /// Graphs in index order.
    pub fn graphs(&self) -> &[SensorGraph] {
        &self.graphs
    }
}

impl Dataset for GraphDataset {
    type Item = (SensorGraph, ActivityId);

    fn len(&self) -> usize {
        self.labels.len()
    }

    fn get(&self, index: usize) -> Option<Self::Item> {
        Some((self.graphs.get(index)?.clone(), *self.labels.get(index)?))
    }
}

// =============================================================================
// SubsetDataset
// =============================================================================

/// A view of a shared dataset restricted to the given indices.
#[derive(Debug, Clone)]
pub struct SubsetDataset<D> {
    dataset: Arc<D>,
    indices: Vec<usize>,
}

impl<D: Dataset> SubsetDataset<D> {
    /// Creates a subset; every index must be in range.
    pub fn new(dataset: Arc<D>, indices: Vec<usize>) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= dataset.len()) {
            return Err(Error::IndexOutOfBounds {
                index: bad,
                size: dataset.len(),
            });
        }
        Ok(Self { dataset, indices })
    }

    /// Indices into the underlying dataset.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

impl<D: Dataset> Dataset for SubsetDataset<D> {
    type Item = D::Item;

    fn len(&self) -> usize {
        self.indices.len()
    }

    fn get(&self, index: usize) -> Option<Self::Item> {
        self.dataset.get(*self.indices.get(index)?)
    }
}

// =============================================================================
// Tests
// =============================================================================
