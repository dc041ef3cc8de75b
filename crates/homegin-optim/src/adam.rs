//! Adam Optimizer - Adaptive Moment Estimation
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use homegin_nn::Parameter;

use crate::optimizer::Optimizer;

// =============================================================================
// Adam
// =============================================================================

/// Adam optimizer.
///
/// Maintains per-parameter adaptive learning rates using first and
/// second moment estimates of gradients.
///
/// Update rule:
/// ```text
/// m_t = beta1 * m_{t-1} + (1 - beta1) * grad
/// v_t = beta2 * v_{t-1} + (1 - beta2) * grad^2
/// m_hat = m_t / (1 - beta1^t)
/// v_hat = v_t / (1 - beta2^t)
/// param = param - lr * m_hat / (sqrt(v_hat) + eps)
/// ```
pub struct Adam {
    /// Parameters to optimize.
    params: Vec<Parameter>,
    /// Learning rate.
    lr: f32,
    /// First moment decay rate.
    beta1: f32,
    /// Second moment decay rate.
    beta2: f32,
    /// Small constant for numerical stability.
    eps: f32,
    /// Weight decay (L2 penalty added to the gradient).
    weight_decay: f32,
    /// Per-parameter state, parallel to `params`.
    state: Vec<AdamState>,
}

/// State for Adam optimizer.
#[derive(Debug, Clone)]
struct AdamState {
    /// First moment (mean of gradients).
    exp_avg: Vec<f32>,
    /// Second moment (uncentered variance of gradients).
    exp_avg_sq: Vec<f32>,
    /// Step count for bias correction.
    step: i32,
}

impl AdamState {
    fn new(size: usize) -> Self {
        Self {
            exp_avg: vec![0.0; size],
            exp_avg_sq: vec![0.0; size],
            step: 0,
        }
    }
}

impl Adam {
    /// Creates a new Adam optimizer with default hyperparameters.
    #[must_use]
    pub fn new(params: Vec<Parameter>, lr: f32) -> Self {
        let state = params.iter().map(|p| AdamState::new(p.numel())).collect();
        Self {
            params,
            lr,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            weight_decay: 0.0,
            state,
        }
    }

    /// Builder method to set betas.
    #[must_use]
    pub fn betas(mut self, betas: (f32, f32)) -> Self {
        self.beta1 = betas.0;
        self.beta2 = betas.1;
        self
    }

    /// Builder method to set epsilon.
    #[must_use]
    pub fn eps(mut self, eps: f32) -> Self {
        self.eps = eps;
        self
    }

    /// Builder method to set weight decay.
    #[must_use]
    pub fn weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }
}

impl Optimizer for Adam {
    fn step(&mut self) {
        let (lr, beta1, beta2, eps, weight_decay) =
            (self.lr, self.beta1, self.beta2, self.eps, self.weight_decay);

        for (param, state) in self.params.iter().zip(self.state.iter_mut()) {
            state.step += 1;
            let bias_correction1 = 1.0 - beta1.powi(state.step);
            let bias_correction2 = 1.0 - beta2.powi(state.step);
            let step_size = lr / bias_correction1;

            param.update(|data, grad| {
                for (i, p) in data.iter_mut().enumerate() {
                    let g = grad[i] + weight_decay * *p;
                    let m = &mut state.exp_avg[i];
                    *m = beta1 * *m + (1.0 - beta1) * g;
                    let v = &mut state.exp_avg_sq[i];
                    *v = beta2 * *v + (1.0 - beta2) * g * g;

                    let denom = (*v / bias_correction2).sqrt() + eps;
                    *p -= step_size * *m / denom;
                }
            });
        }
    }

    fn zero_grad(&mut self) {
        for param in &self.params {
            param.zero_grad();
        }
    }

    fn get_lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }

    fn parameters(&self) -> &[Parameter] {
        &self.params
    }
}

// =============================================================================
// Tests
// =============================================================================
