//! Linear Layer - Fully Connected Layer
//!
//! Applies a linear transformation: y = xW^T + b
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use homegin_core::{Error, Result, Tensor};
use rand::Rng;

use crate::init::{bias_uniform, kaiming_uniform};
use crate::module::{Mode, Module};
use crate::parameter::Parameter;

// =============================================================================
// Linear
// =============================================================================

/// Applies a linear transformation to the input.
///
/// y = xW^T + b
///
/// # Shape
/// - Input: (N, in_features)
/// - Output: (N, out_features)
pub struct Linear {
    /// Weight matrix of shape (out_features, in_features).
    pub weight: Parameter,
    /// Bias vector of shape (out_features).
    pub bias: Parameter,
    in_features: usize,
    out_features: usize,
    /// Input of the last training forward pass.
    cached_input: Option<Tensor>,
}

impl Linear {
    /// Creates a new Linear layer with Kaiming-uniform weights and bias.
    pub fn new<R: Rng + ?Sized>(in_features: usize, out_features: usize, rng: &mut R) -> Self {
        Self::from_weights(
            kaiming_uniform(rng, out_features, in_features),
            bias_uniform(rng, out_features, in_features),
        )
    }

    /// Creates a Linear layer from existing weight and bias tensors.
    pub fn from_weights(weight: Tensor, bias: Tensor) -> Self {
        let out_features = weight.shape()[0];
        let in_features = weight.shape()[1];
        Self {
            weight: Parameter::named("weight", weight),
            bias: Parameter::named("bias", bias),
            in_features,
            out_features,
            cached_input: None,
        }
    }

    /// Returns the input feature dimension.
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    /// Returns the output feature dimension.
    pub fn out_features(&self) -> usize {
        self.out_features
    }
}

impl Module for Linear {
    fn forward(&mut self, input: &Tensor, mode: Mode) -> Result<Tensor> {
        if input.cols()? != self.in_features {
            return Err(Error::shape_mismatch(
                &[input.rows()?, self.in_features],
                input.shape(),
            ));
        }
        let projected = self.weight.with_data(|w| input.matmul_t(w))?;
        let output = self
            .bias
            .with_data(|b| projected.add_row_vector(b.as_slice()))?;

        self.cached_input = mode.is_training().then(|| input.clone());
        Ok(output)
    }

    fn backward(&mut self, grad_output: &Tensor) -> Result<Tensor> {
        let input = self
            .cached_input
            .as_ref()
            .ok_or_else(|| Error::invalid_operation("Linear::backward without a training forward"))?;

        // dW = g^T x, db = sum_rows(g), dx = g W
        let grad_weight = grad_output.t_matmul(input)?;
        self.weight.accumulate_grad(&grad_weight)?;
        let grad_bias = Tensor::from_vec(grad_output.sum_rows()?, &[self.out_features])?;
        self.bias.accumulate_grad(&grad_bias)?;

        self.weight.with_data(|w| grad_output.matmul(w))
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![self.weight.clone(), self.bias.clone()]
    }

    fn name(&self) -> &'static str {
        "Linear"
    }
}

impl std::fmt::Debug for Linear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Linear")
            .field("in_features", &self.in_features)
            .field("out_features", &self.out_features)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sum_loss_grad(out: &Tensor) -> Tensor {
        // d/dy of sum(y * y) / 2 is y
        out.clone()
    }

    #[test]
    fn test_linear_forward() {
        let w = Tensor::from_vec(vec![1.0, 2.0, 0.0, -1.0], &[2, 2]).unwrap();
        let b = Tensor::from_vec(vec![0.5, 0.0], &[2]).unwrap();
        let mut linear = Linear::from_weights(w, b);
        let x = Tensor::from_vec(vec![1.0, 1.0, 2.0, 3.0], &[2, 2]).unwrap();
        let y = linear.forward(&x, Mode::Eval).unwrap();
        assert_eq!(y.to_vec(), vec![3.5, -1.0, 8.5, -3.0]);
    }

    #[test]
    fn test_linear_rejects_wrong_width() {
        let mut linear = Linear::new(3, 2, &mut StdRng::seed_from_u64(0));
        assert!(linear.forward(&Tensor::zeros(&[4, 2]), Mode::Eval).is_err());
    }

    #[test]
    fn test_backward_requires_training_forward() {
        let mut linear = Linear::new(2, 2, &mut StdRng::seed_from_u64(0));
        linear.forward(&Tensor::zeros(&[1, 2]), Mode::Eval).unwrap();
        assert!(linear.backward(&Tensor::zeros(&[1, 2])).is_err());
    }

    #[test]
    fn test_linear_gradients_match_finite_differences() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut linear = Linear::new(3, 2, &mut rng);
        let x = Tensor::from_vec(vec![0.3, -1.2, 0.8, 1.5, 0.1, -0.4], &[2, 3]).unwrap();

        let y = linear.forward(&x, Mode::Train).unwrap();
        let grad_x = linear.backward(&sum_loss_grad(&y)).unwrap();
        let grad_w = linear.weight.grad();

        let loss = |l: &mut Linear, input: &Tensor| -> f32 {
            let out = l.forward(input, Mode::Eval).unwrap();
            out.as_slice().iter().map(|v| v * v).sum::<f32>() / 2.0
        };

        let h = 1e-3;
        for i in 0..x.numel() {
            let mut plus = x.clone();
            plus.as_mut_slice()[i] += h;
            let mut minus = x.clone();
            minus.as_mut_slice()[i] -= h;
            let numeric = (loss(&mut linear, &plus) - loss(&mut linear, &minus)) / (2.0 * h);
            assert!((numeric - grad_x.as_slice()[i]).abs() < 1e-2);
        }

        let w0 = linear.weight.data();
        for i in 0..w0.numel() {
            let mut plus = w0.clone();
            plus.as_mut_slice()[i] += h;
            linear.weight.set_data(plus).unwrap();
            let lp = loss(&mut linear, &x);
            let mut minus = w0.clone();
            minus.as_mut_slice()[i] -= h;
            linear.weight.set_data(minus).unwrap();
            let lm = loss(&mut linear, &x);
            linear.weight.set_data(w0.clone()).unwrap();
            let numeric = (lp - lm) / (2.0 * h);
            assert!((numeric - grad_w.as_slice()[i]).abs() < 1e-2);
        }
    }
}
