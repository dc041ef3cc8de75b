//! Learning Rate Schedulers
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use crate::optimizer::Optimizer;

// =============================================================================
// LRScheduler Trait
// =============================================================================

/// Trait for learning rate schedulers.
pub trait LRScheduler {
    /// Advances one epoch and updates the optimizer's learning rate.
    fn step<O: Optimizer>(&mut self, optimizer: &mut O);

    /// Returns the current learning rate.
    fn get_last_lr(&self) -> f32;

    /// Returns the current epoch/step count.
    fn get_step(&self) -> usize;
}

// =============================================================================
// StepLR
// =============================================================================

/// Decays learning rate by gamma every `step_size` epochs.
///
/// lr = `initial_lr` * gamma^(epoch // `step_size`)
#[derive(Debug, Clone)]
pub struct StepLR {
    initial_lr: f32,
    step_size: usize,
    gamma: f32,
    current_step: usize,
    last_lr: f32,
}

impl StepLR {
    /// Creates a new `StepLR` scheduler.
    ///
    /// A `step_size` of 0 is treated as 1.
    pub fn new<O: Optimizer>(optimizer: &O, step_size: usize, gamma: f32) -> Self {
        let initial_lr = optimizer.get_lr();
        Self {
            initial_lr,
            step_size: step_size.max(1),
            gamma,
            current_step: 0,
            last_lr: initial_lr,
        }
    }
}

impl LRScheduler for StepLR {
    fn step<O: Optimizer>(&mut self, optimizer: &mut O) {
        self.current_step += 1;
        let num_decays = self.current_step / self.step_size;
        let new_lr = self.initial_lr * self.gamma.powi(num_decays as i32);
        optimizer.set_lr(new_lr);
        self.last_lr = new_lr;
    }

    fn get_last_lr(&self) -> f32 {
        self.last_lr
    }

    fn get_step(&self) -> usize {
        self.current_step
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Adam;
    use homegin_core::Tensor;
    use homegin_nn::Parameter;

    fn create_test_optimizer() -> Adam {
        Adam::new(vec![Parameter::named("w", Tensor::zeros(&[3]))], 0.01)
    }

    #[test]
    fn test_step_lr_halves_every_fifty_epochs() {
        let mut optimizer = create_test_optimizer();
        let mut scheduler = StepLR::new(&optimizer, 50, 0.5);

        for _ in 0..49 {
            scheduler.step(&mut optimizer);
        }
        assert!((optimizer.get_lr() - 0.01).abs() < 1e-9);

        scheduler.step(&mut optimizer);
        assert!((optimizer.get_lr() - 0.005).abs() < 1e-9);

        for _ in 0..50 {
            scheduler.step(&mut optimizer);
        }
        assert!((optimizer.get_lr() - 0.0025).abs() < 1e-9);
        assert!((scheduler.get_last_lr() - 0.0025).abs() < 1e-9);
        assert_eq!(scheduler.get_step(), 100);
    }
}
