//! Normalization Layers - BatchNorm1d
//!
//! Normalizes inputs to improve training stability and speed.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use homegin_core::{Error, Result, Tensor};

use crate::module::{Mode, Module};
use crate::parameter::Parameter;
use crate::state_dict::StateDict;

// =============================================================================
// BatchNorm1d
// =============================================================================

struct BatchNormCache {
    normalized: Tensor,
    inv_std: Vec<f32>,
}

/// Applies Batch Normalization over a 2D input.
///
/// y = (x - E[x]) / sqrt(Var[x] + eps) * gamma + beta
///
/// # Shape
/// - Input: (N, C)
/// - Output: Same as input
pub struct BatchNorm1d {
    /// Learnable scale parameter (gamma).
    pub weight: Parameter,
    /// Learnable shift parameter (beta).
    pub bias: Parameter,
    /// Running mean for inference (updated during training).
    running_mean: Tensor,
    /// Running variance for inference (updated during training).
    running_var: Tensor,
    num_features: usize,
    eps: f32,
    /// running = (1 - momentum) * running + momentum * batch
    momentum: f32,
    cache: Option<BatchNormCache>,
}

impl BatchNorm1d {
    /// Creates a new BatchNorm1d layer.
    pub fn new(num_features: usize) -> Self {
        Self::with_options(num_features, 1e-5, 0.1)
    }

    /// Creates a BatchNorm1d with custom options.
    pub fn with_options(num_features: usize, eps: f32, momentum: f32) -> Self {
        Self {
            weight: Parameter::named("weight", Tensor::ones(&[num_features])),
            bias: Parameter::named("bias", Tensor::zeros(&[num_features])),
            running_mean: Tensor::zeros(&[num_features]),
            running_var: Tensor::ones(&[num_features]),
            num_features,
            eps,
            momentum,
            cache: None,
        }
    }

    /// Returns the number of features.
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Returns the running mean.
    pub fn running_mean(&self) -> &Tensor {
        &self.running_mean
    }

    /// Returns the running variance.
    pub fn running_var(&self) -> &Tensor {
        &self.running_var
    }
}

impl Module for BatchNorm1d {
    fn forward(&mut self, input: &Tensor, mode: Mode) -> Result<Tensor> {
        let (n, c) = (input.rows()?, input.cols()?);
        if c != self.num_features {
            return Err(Error::shape_mismatch(&[n, self.num_features], input.shape()));
        }
        let gamma = self.weight.data();
        let beta = self.bias.data();

        let (means, vars) = if mode.is_training() {
            if n == 0 {
                return Err(Error::invalid_operation("BatchNorm1d on an empty batch"));
            }
            let means: Vec<f32> = input
                .sum_rows()?
                .into_iter()
                .map(|s| s / n as f32)
                .collect();
            let mut vars = vec![0.0f32; c];
            for r in 0..n {
                for (j, &x) in input.row(r).iter().enumerate() {
                    let d = x - means[j];
                    vars[j] += d * d;
                }
            }
            for v in &mut vars {
                *v /= n as f32;
            }

            // running variance tracks the unbiased estimate
            let unbias = if n > 1 { n as f32 / (n - 1) as f32 } else { 1.0 };
            for j in 0..c {
                let rm = &mut self.running_mean.as_mut_slice()[j];
                *rm = (1.0 - self.momentum) * *rm + self.momentum * means[j];
                let rv = &mut self.running_var.as_mut_slice()[j];
                *rv = (1.0 - self.momentum) * *rv + self.momentum * vars[j] * unbias;
            }
            (means, vars)
        } else {
            (self.running_mean.to_vec(), self.running_var.to_vec())
        };

        let inv_std: Vec<f32> = vars.iter().map(|v| 1.0 / (v + self.eps).sqrt()).collect();
        let mut normalized = input.clone();
        for r in 0..n {
            for (j, x) in normalized.row_mut(r).iter_mut().enumerate() {
                *x = (*x - means[j]) * inv_std[j];
            }
        }
        let mut output = normalized.clone();
        for r in 0..n {
            for (j, y) in output.row_mut(r).iter_mut().enumerate() {
                *y = *y * gamma.as_slice()[j] + beta.as_slice()[j];
            }
        }

        self.cache = mode
            .is_training()
            .then_some(BatchNormCache { normalized, inv_std });
        Ok(output)
    }

    fn backward(&mut self, grad_output: &Tensor) -> Result<Tensor> {
        let cache = self.cache.as_ref().ok_or_else(|| {
            Error::invalid_operation("BatchNorm1d::backward without a training forward")
        })?;
        let (n, c) = (grad_output.rows()?, grad_output.cols()?);
        if cache.normalized.shape() != grad_output.shape() {
            return Err(Error::shape_mismatch(cache.normalized.shape(), grad_output.shape()));
        }

        let mut sum_g = vec![0.0f32; c];
        let mut sum_g_xhat = vec![0.0f32; c];
        for r in 0..n {
            for j in 0..c {
                let g = grad_output.row(r)[j];
                sum_g[j] += g;
                sum_g_xhat[j] += g * cache.normalized.row(r)[j];
            }
        }
        self.weight
            .accumulate_grad(&Tensor::from_vec(sum_g_xhat.clone(), &[c])?)?;
        self.bias.accumulate_grad(&Tensor::from_vec(sum_g.clone(), &[c])?)?;

        // dx = gamma * inv_std / N * (N * g - sum(g) - x_hat * sum(g * x_hat))
        let gamma = self.weight.data();
        let nf = n as f32;
        let mut grad_input = grad_output.clone();
        for r in 0..n {
            for (j, gx) in grad_input.row_mut(r).iter_mut().enumerate() {
                let x_hat = cache.normalized.row(r)[j];
                *gx = gamma.as_slice()[j] * cache.inv_std[j] / nf
                    * (nf * *gx - sum_g[j] - x_hat * sum_g_xhat[j]);
            }
        }
        Ok(grad_input)
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![self.weight.clone(), self.bias.clone()]
    }

    fn save_state(&self, prefix: &str, state: &mut StateDict) {
        state.insert_parameter(prefix, &self.weight);
        state.insert_parameter(prefix, &self.bias);
        state.insert(
            crate::state_dict::join_key(prefix, "running_mean"),
            self.running_mean.clone(),
        );
        state.insert(
            crate::state_dict::join_key(prefix, "running_var"),
            self.running_var.clone(),
        );
    }

    fn load_state(&mut self, prefix: &str, state: &StateDict) -> Result<()> {
        state.load_parameter(prefix, &self.weight)?;
        state.load_parameter(prefix, &self.bias)?;
        state.load_buffer(prefix, "running_mean", &mut self.running_mean)?;
        state.load_buffer(prefix, "running_var", &mut self.running_var)
    }

    fn name(&self) -> &'static str {
        "BatchNorm1d"
    }
}

// =============================================================================
// Tests
// =============================================================================
