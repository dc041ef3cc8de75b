//! Samplers - Data Access Patterns
//!
//! Provides different strategies for sampling data indices.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

// =============================================================================
// Sampler Trait
// =============================================================================

/// Trait for all samplers.
///
/// A sampler generates indices that define the order of data access.
pub trait Sampler: Send + Sync {
    /// Returns the number of samples.
    fn len(&self) -> usize;

    /// Returns true if empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates an iterator over indices.
    fn iter(&self) -> Box<dyn Iterator<Item = usize> + '_>;
}

// =============================================================================
// SequentialSampler
// =============================================================================

/// Samples elements sequentially.
pub struct SequentialSampler {
    len: usize,
}

impl SequentialSampler {
    /// Creates a new `SequentialSampler`.
    pub fn new(len: usize) -> Self {
        Self { len }
    }
}

impl Sampler for SequentialSampler {
    fn len(&self) -> usize {
        self.len
    }

    fn iter(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        Box::new(0..self.len)
    }
}

// =============================================================================
// RandomSampler
// =============================================================================

/// Samples a fresh permutation on every call to `iter`.
///
/// The generator is seeded, so a fixed seed reproduces the sequence of
/// epoch permutations.
pub struct RandomSampler {
    len: usize,
    rng: Mutex<StdRng>,
}

impl RandomSampler {
    /// Creates a new `RandomSampler` seeded with `seed`.
    pub fn new(len: usize, seed: u64) -> Self {
        Self {
            len,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Sampler for RandomSampler {
    fn len(&self) -> usize {
        self.len
    }

    fn iter(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        let mut indices: Vec<usize> = (0..self.len).collect();
        indices.shuffle(&mut *self.rng.lock());
        Box::new(indices.into_iter())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_sampler() {
        let sampler = SequentialSampler::new(5);
        let indices: Vec<usize> = sampler.iter().collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_random_sampler_is_permutation() {
        let sampler = RandomSampler::new(10, 7);
        let mut indices: Vec<usize> = sampler.iter().collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_random_sampler_reproducible() {
        let a = RandomSampler::new(50, 3);
        let b = RandomSampler::new(50, 3);
        let a1: Vec<usize> = a.iter().collect();
        let a2: Vec<usize> = a.iter().collect();
        assert_eq!(a1, b.iter().collect::<Vec<_>>());
        assert_eq!(a2, b.iter().collect::<Vec<_>>());
        assert_ne!(a1, a2);
    }
}
