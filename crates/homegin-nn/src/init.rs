//! Weight Initialization
//!
//! Seeded initializers. Every constructor that needs randomness takes an
//! explicit RNG so that a run seed reproduces the initial weights.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use homegin_core::Tensor;
use rand::Rng;

/// Creates a tensor with uniform random values in [low, high).
pub fn uniform_range<R: Rng + ?Sized>(rng: &mut R, shape: &[usize], low: f32, high: f32) -> Tensor {
    let numel: usize = shape.iter().product();
    let data: Vec<f32> = (0..numel).map(|_| rng.gen_range(low..high)).collect();
    // numel is derived from shape, so the shapes always agree.
    Tensor::from_vec(data, shape).unwrap_or_else(|_| Tensor::zeros(shape))
}

/// Default linear-layer weight init: U(-1/sqrt(fan_in), 1/sqrt(fan_in)).
///
/// This is Kaiming uniform with `a = sqrt(5)`.
pub fn kaiming_uniform<R: Rng + ?Sized>(rng: &mut R, fan_out: usize, fan_in: usize) -> Tensor {
    let bound = 1.0 / (fan_in.max(1) as f32).sqrt();
    uniform_range(rng, &[fan_out, fan_in], -bound, bound)
}

/// Default linear-layer bias init, using the same bound as the weights.
pub fn bias_uniform<R: Rng + ?Sized>(rng: &mut R, fan_out: usize, fan_in: usize) -> Tensor {
    let bound = 1.0 / (fan_in.max(1) as f32).sqrt();
    uniform_range(rng, &[fan_out], -bound, bound)
}

// =============================================================================
// Tests
// =============================================================================
