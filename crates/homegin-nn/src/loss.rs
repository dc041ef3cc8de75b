//! Loss Functions - Training Objectives
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use homegin_core::{Error, Result, Tensor};

use crate::functional::log_softmax;

// =============================================================================
// CrossEntropyLoss
// =============================================================================

/// Loss value together with its gradient with respect to the logits.
#[derive(Debug, Clone)]
pub struct LossOutput {
    /// Mean loss over the batch.
    pub loss: f32,
    /// d(loss)/d(logits), shape (N, C).
    pub grad: Tensor,
}

/// Cross entropy loss with log softmax.
///
/// loss = mean over the batch of -log_softmax(logits)[target]
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossEntropyLoss;

impl CrossEntropyLoss {
    /// Creates a new CrossEntropyLoss.
    pub fn new() -> Self {
        Self
    }

    /// Computes the mean loss and the logits gradient.
    ///
    /// `targets` holds one class index per row of `logits`.
    pub fn compute(&self, logits: &Tensor, targets: &[usize]) -> Result<LossOutput> {
        let (n, c) = (logits.rows()?, logits.cols()?);
        if targets.len() != n {
            return Err(Error::shape_mismatch(&[n], &[targets.len()]));
        }
        if n == 0 {
            return Err(Error::invalid_operation("cross entropy over an empty batch"));
        }

        let log_probs = log_softmax(logits)?;
        let inv_n = 1.0 / n as f32;
        let mut total = 0.0f32;
        let mut grad = log_probs.map(f32::exp);
        for (r, &t) in targets.iter().enumerate() {
            if t >= c {
                return Err(Error::IndexOutOfBounds { index: t, size: c });
            }
            total -= log_probs.row(r)[t];
            grad.row_mut(r)[t] -= 1.0;
        }
        for g in grad.as_mut_slice() {
            *g *= inv_n;
        }

        Ok(LossOutput {
            loss: total * inv_n,
            grad,
        })
    }

    /// Computes the summed loss without a gradient.
    pub fn sum(&self, logits: &Tensor, targets: &[usize]) -> Result<f32> {
        let n = targets.len();
        if n == 0 {
            return Ok(0.0);
        }
        Ok(self.compute(logits, targets)?.loss * n as f32)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_logits() {
        let logits = Tensor::zeros(&[2, 4]);
        let out = CrossEntropyLoss::new().compute(&logits, &[0, 3]).unwrap();
        assert!((out.loss - 4.0f32.ln()).abs() < 1e-5);
    }

    #[test]
    fn test_gradient_matches_finite_differences() {
        let logits = Tensor::from_vec(vec![0.2, -1.0, 0.7, 1.5, 0.1, -0.3], &[2, 3]).unwrap();
        let targets = [2, 0];
        let loss_fn = CrossEntropyLoss::new();
        let out = loss_fn.compute(&logits, &targets).unwrap();

        let h = 1e-3;
        for i in 0..logits.numel() {
            let mut plus = logits.clone();
            plus.as_mut_slice()[i] += h;
            let mut minus = logits.clone();
            minus.as_mut_slice()[i] -= h;
            let numeric = (loss_fn.compute(&plus, &targets).unwrap().loss
                - loss_fn.compute(&minus, &targets).unwrap().loss)
                / (2.0 * h);
            assert!((numeric - out.grad.as_slice()[i]).abs() < 1e-3);
        }
    }

    #[test]
    fn test_invalid_targets() {
        let loss_fn = CrossEntropyLoss::new();
        let logits = Tensor::zeros(&[2, 3]);
        assert!(loss_fn.compute(&logits, &[0]).is_err());
        assert!(loss_fn.compute(&logits, &[0, 3]).is_err());
        assert!(loss_fn.compute(&Tensor::zeros(&[0, 3]), &[]).is_err());
        assert_eq!(loss_fn.sum(&Tensor::zeros(&[0, 3]), &[]).unwrap(), 0.0);
    }
}
