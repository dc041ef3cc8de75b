//! Dropout Layers - Regularization via Random Zeroing
//!
//! Randomly zeros elements during training to prevent overfitting.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use homegin_core::{Error, Result, Tensor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::module::{Mode, Module};

// =============================================================================
// Dropout
// =============================================================================

/// During training, randomly zeros some elements with probability p.
///
/// Kept elements are scaled by `1 / (1 - p)`. During evaluation, returns
/// input unchanged.
pub struct Dropout {
    /// Dropout probability.
    p: f32,
    rng: StdRng,
    /// Per-element scale applied in the last training forward pass.
    mask: Option<Vec<f32>>,
}

impl std::fmt::Debug for Dropout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dropout").field("p", &self.p).finish()
    }
}

impl Dropout {
    /// Creates a new Dropout layer with its own seeded generator.
    pub fn new(p: f32, seed: u64) -> Result<Self> {
        if !(0.0..1.0).contains(&p) {
            return Err(Error::invalid_operation(format!(
                "dropout probability must be in [0, 1), got {p}"
            )));
        }
        Ok(Self {
            p,
            rng: StdRng::seed_from_u64(seed),
            mask: None,
        })
    }

    /// Returns the dropout probability.
    pub fn p(&self) -> f32 {
        self.p
    }
}

impl Module for Dropout {
    fn forward(&mut self, input: &Tensor, mode: Mode) -> Result<Tensor> {
        if !mode.is_training() {
            self.mask = None;
            return Ok(input.clone());
        }

        // Scale factor for inverted dropout
        let scale = 1.0 / (1.0 - self.p);
        let p = self.p;
        let mask: Vec<f32> = (0..input.numel())
            .map(|_| if p > 0.0 && self.rng.gen::<f32>() < p { 0.0 } else { scale })
            .collect();

        let mut output = input.clone();
        for (y, m) in output.as_mut_slice().iter_mut().zip(&mask) {
            *y *= m;
        }
        self.mask = Some(mask);
        Ok(output)
    }

    fn backward(&mut self, grad_output: &Tensor) -> Result<Tensor> {
        let mask = self.mask.as_ref().ok_or_else(|| {
            Error::invalid_operation("Dropout::backward without a training forward")
        })?;
        if mask.len() != grad_output.numel() {
            return Err(Error::shape_mismatch(&[mask.len()], grad_output.shape()));
        }
        let mut grad_input = grad_output.clone();
        for (g, m) in grad_input.as_mut_slice().iter_mut().zip(mask) {
            *g *= m;
        }
        Ok(grad_input)
    }

    fn name(&self) -> &'static str {
        "Dropout"
    }
}

// =============================================================================
// Tests
// =============================================================================
