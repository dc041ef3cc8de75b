//! Activation Modules - Non-linear Activation Functions
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use homegin_core::{Error, Result, Tensor};

use crate::module::{Mode, Module};

// =============================================================================
// ReLU
// =============================================================================

/// Applies the rectified linear unit function element-wise.
///
/// ReLU(x) = max(0, x)
#[derive(Debug, Default)]
pub struct ReLU {
    /// Which inputs were positive in the last training forward pass.
    active: Option<Vec<bool>>,
}

impl ReLU {
    /// Creates a new ReLU activation.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Module for ReLU {
    fn forward(&mut self, input: &Tensor, mode: Mode) -> Result<Tensor> {
        self.active = mode
            .is_training()
            .then(|| input.as_slice().iter().map(|&x| x > 0.0).collect());
        Ok(input.map(|x| x.max(0.0)))
    }

    fn backward(&mut self, grad_output: &Tensor) -> Result<Tensor> {
        let active = self
            .active
            .as_ref()
            .ok_or_else(|| Error::invalid_operation("ReLU::backward without a training forward"))?;
        if active.len() != grad_output.numel() {
            return Err(Error::shape_mismatch(&[active.len()], grad_output.shape()));
        }
        let mut grad_input = grad_output.clone();
        for (g, &on) in grad_input.as_mut_slice().iter_mut().zip(active) {
            if !on {
                *g = 0.0;
            }
        }
        Ok(grad_input)
    }

    fn name(&self) -> &'static str {
        "ReLU"
    }
}
