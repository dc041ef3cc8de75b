//! Optimizer Trait - Core Optimizer Interface
//!
//! Defines the trait that all optimizers implement.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use homegin_nn::Parameter;

// =============================================================================
// Optimizer Trait
// =============================================================================

/// Trait for all optimizers.
///
/// Optimizers update model parameters based on gradients.
pub trait Optimizer {
    /// Performs a single optimization step.
    ///
    /// Updates all parameters based on their accumulated gradients.
    fn step(&mut self);

    /// Zeros all parameter gradients.
    fn zero_grad(&mut self);

    /// Returns the current learning rate.
    fn get_lr(&self) -> f32;

    /// Sets the learning rate.
    fn set_lr(&mut self, lr: f32);

    /// Returns the parameters being optimized.
    fn parameters(&self) -> &[Parameter];

    /// Returns the number of parameters.
    fn num_parameters(&self) -> usize {
        self.parameters().len()
    }
}
