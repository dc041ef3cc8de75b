//! `GraphDataLoader` - Batched Graph Iteration
//!
//! Groups graphs into merged mini-batches. Iteration is lazy, finite and
//! restartable: each call to `iter` starts a new epoch, with a fresh
//! permutation when shuffling is enabled. The last batch may be short.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use homegin_core::{Error, Result};
use rayon::prelude::*;

use crate::activity::ActivityId;
use crate::collate::{collate_graphs, GraphBatch};
use crate::dataset::Dataset;
use crate::graph::SensorGraph;
use crate::sampler::{RandomSampler, Sampler, SequentialSampler};

/// Item type of datasets the loader accepts.
pub type GraphSample = (SensorGraph, ActivityId);

// =============================================================================
// GraphDataLoader
// =============================================================================

/// Loader producing [`GraphBatch`]es from a graph dataset.
pub struct GraphDataLoader<D>
where
    D: Dataset<Item = GraphSample>,
{
    dataset: D,
    batch_size: usize,
    sampler: Box<dyn Sampler>,
    num_workers: usize,
}

impl<D> GraphDataLoader<D>
where
    D: Dataset<Item = GraphSample>,
{
    /// Creates a sequential loader with the given batch size.
    pub fn new(dataset: D, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::invalid_operation("batch size must be positive"));
        }
        let sampler = Box::new(SequentialSampler::new(dataset.len()));
        Ok(Self {
            dataset,
            batch_size,
            sampler,
            num_workers: 0,
        })
    }

    /// Enables seeded shuffling; every epoch draws a new permutation.
    pub fn shuffle(mut self, shuffle: bool, seed: u64) -> Self {
        self.sampler = if shuffle {
            Box::new(RandomSampler::new(self.dataset.len(), seed))
        } else {
            Box::new(SequentialSampler::new(self.dataset.len()))
        };
        self
    }

    /// Fetches batch samples on the rayon pool when greater than zero.
    pub fn num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    /// Returns the batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns the number of batches.
    pub fn len(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    /// Returns true if the loader yields no batches.
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Returns the dataset length.
    pub fn dataset_len(&self) -> usize {
        self.dataset.len()
    }

    /// Creates an iterator over one epoch of batches.
    pub fn iter(&self) -> GraphDataLoaderIter<'_, D> {
        GraphDataLoaderIter {
            dataset: &self.dataset,
            indices: self.sampler.iter().collect(),
            batch_size: self.batch_size,
            position: 0,
            num_workers: self.num_workers,
        }
    }
}

// =============================================================================
// GraphDataLoaderIter
// =============================================================================

/// Iterator over the batches of one epoch.
pub struct GraphDataLoaderIter<'a, D>
where
    D: Dataset<Item = GraphSample>,
{
    dataset: &'a D,
    indices: Vec<usize>,
    batch_size: usize,
    position: usize,
    num_workers: usize,
}

impl<D> GraphDataLoaderIter<'_, D>
where
    D: Dataset<Item = GraphSample>,
{
    fn fetch(&self, index: usize) -> Result<GraphSample> {
        self.dataset.get(index).ok_or(Error::IndexOutOfBounds {
            index,
            size: self.dataset.len(),
        })
    }
}

impl<D> Iterator for GraphDataLoaderIter<'_, D>
where
    D: Dataset<Item = GraphSample>,
{
    type Item = Result<GraphBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.indices.len() {
            return None;
        }
        let end = (self.position + self.batch_size).min(self.indices.len());
        let batch_indices = &self.indices[self.position..end];

        let samples: Result<Vec<GraphSample>> = if self.num_workers > 0 {
            batch_indices.par_iter().map(|&i| self.fetch(i)).collect()
        } else {
            batch_indices.iter().map(|&i| self.fetch(i)).collect()
        };
        self.position = end;
        Some(samples.and_then(collate_graphs))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.indices.len() - self.position).div_ceil(self.batch_size);
        (remaining, Some(remaining))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::GraphDataset;
    use crate::graph::GraphTopology;
    use std::sync::Arc;

    fn dataset(n: usize) -> GraphDataset {
        let topology = Arc::new(GraphTopology::new(2, vec![0, 1], vec![1, 0]).unwrap());
        let graphs = (0..n)
            .map(|i| SensorGraph::new(topology.clone(), vec![[i as f32; 4]; 2]).unwrap())
            .collect();
        GraphDataset::new(graphs, (0..n).map(|i| i % 15).collect()).unwrap()
    }

    #[test]
    fn test_batch_sizes_in_order() {
        let loader = GraphDataLoader::new(dataset(100), 32).unwrap();
        assert_eq!(loader.len(), 4);

        let batches: Vec<GraphBatch> = loader.iter().collect::<Result<_>>().unwrap();
        let sizes: Vec<usize> = batches.iter().map(GraphBatch::len).collect();
        assert_eq!(sizes, vec![32, 32, 32, 4]);

        let first_values: Vec<f32> = batches
            .iter()
            .flat_map(|b| (0..b.len()).map(move |g| b.features.row(2 * g)[0]))
            .collect();
        let expected: Vec<f32> = (0..100).map(|i| i as f32).collect();
        assert_eq!(first_values, expected);
    }

    #[test]
    fn test_restartable() {
        let loader = GraphDataLoader::new(dataset(10), 4).unwrap();
        assert_eq!(loader.iter().count(), 3);
        assert_eq!(loader.iter().count(), 3);
    }

    #[test]
    fn test_shuffle_covers_every_graph() {
        let loader = GraphDataLoader::new(dataset(20), 6)
            .unwrap()
            .shuffle(true, 0)
            .num_workers(2);
        let mut labels: Vec<usize> = loader
            .iter()
            .flat_map(|b| b.unwrap().labels)
            .collect();
        labels.sort_unstable();
        let mut expected: Vec<usize> = (0..20).map(|i| i % 15).collect();
        expected.sort_unstable();
        assert_eq!(labels, expected);
    }

    #[test]
    fn test_empty_dataset() {
        let loader = GraphDataLoader::new(dataset(0), 32).unwrap();
        assert!(loader.is_empty());
        assert_eq!(loader.len(), 0);
        assert!(loader.iter().next().is_none());
        assert!(GraphDataLoader::new(dataset(1), 0).is_err());
    }
}
