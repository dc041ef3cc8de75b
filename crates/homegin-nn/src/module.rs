//! Module Trait - Neural Network Module Interface
//!
//! Defines the core `Module` trait that every tensor-to-tensor layer
//! implements. Layers cache what they need during a training forward pass
//! and consume it in `backward`, accumulating parameter gradients.
//!
//! The execution mode is an explicit argument of `forward` rather than a flag
//! stored on the module, so evaluation never has to toggle and restore model
//! state.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use homegin_core::{Result, Tensor};

use crate::parameter::Parameter;
use crate::state_dict::StateDict;

// =============================================================================
// Mode
// =============================================================================

/// Execution mode of a forward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Batch statistics, active dropout, activations cached for backward.
    Train,
    /// Running statistics, no dropout, nothing cached.
    Eval,
}

impl Mode {
    /// Returns true for `Mode::Train`.
    pub fn is_training(self) -> bool {
        self == Mode::Train
    }
}

// =============================================================================
// Module Trait
// =============================================================================

/// Core trait for tensor-to-tensor layers.
pub trait Module: Send {
    /// Performs the forward pass.
    fn forward(&mut self, input: &Tensor, mode: Mode) -> Result<Tensor>;

    /// Propagates `grad_output` back through the last training forward pass.
    ///
    /// Accumulates parameter gradients and returns the gradient with respect
    /// to the layer input.
    fn backward(&mut self, grad_output: &Tensor) -> Result<Tensor>;

    /// Returns all parameters, including those of child modules.
    fn parameters(&self) -> Vec<Parameter> {
        Vec::new()
    }

    /// Writes parameters and buffers into `state` under `prefix`.
    fn save_state(&self, prefix: &str, state: &mut StateDict) {
        for param in self.parameters() {
            state.insert_parameter(prefix, &param);
        }
    }

    /// Restores parameters and buffers from `state` under `prefix`.
    fn load_state(&mut self, prefix: &str, state: &StateDict) -> Result<()> {
        for param in self.parameters() {
            state.load_parameter(prefix, &param)?;
        }
        Ok(())
    }

    /// Returns the number of trainable scalars.
    fn num_parameters(&self) -> usize {
        self.parameters().iter().map(Parameter::numel).sum()
    }

    /// Zeros all gradients of parameters.
    fn zero_grad(&self) {
        for param in self.parameters() {
            param.zero_grad();
        }
    }

    /// Returns the module name for debugging.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
