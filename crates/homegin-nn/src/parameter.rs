//! Parameter - Learnable Parameter Wrapper
//!
//! A `Parameter` is a named tensor plus its accumulated gradient. Cloning a
//! parameter yields another handle to the same storage, which is how a model
//! and its optimizer share weights.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::sync::Arc;

use homegin_core::{Error, Result, Tensor};
use parking_lot::RwLock;

// =============================================================================
// Parameter
// =============================================================================

struct ParamState {
    data: Tensor,
    grad: Tensor,
}

/// A learnable parameter of a neural network module.
#[derive(Clone)]
pub struct Parameter {
    inner: Arc<RwLock<ParamState>>,
    name: String,
}

impl Parameter {
    /// Creates a named parameter with a zero gradient.
    pub fn named(name: impl Into<String>, data: Tensor) -> Self {
        let grad = Tensor::zeros(data.shape());
        Self {
            inner: Arc::new(RwLock::new(ParamState { data, grad })),
            name: name.into(),
        }
    }

    /// Returns the parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a copy of the data.
    pub fn data(&self) -> Tensor {
        self.inner.read().data.clone()
    }

    /// Returns a copy of the accumulated gradient.
    pub fn grad(&self) -> Tensor {
        self.inner.read().grad.clone()
    }

    /// Returns the shape.
    pub fn shape(&self) -> Vec<usize> {
        self.inner.read().data.shape().to_vec()
    }

    /// Returns the number of elements.
    pub fn numel(&self) -> usize {
        self.inner.read().data.numel()
    }

    /// Runs `f` with read access to the data, without copying it.
    pub fn with_data<R>(&self, f: impl FnOnce(&Tensor) -> R) -> R {
        f(&self.inner.read().data)
    }

    /// Adds `grad` to the accumulated gradient.
    pub fn accumulate_grad(&self, grad: &Tensor) -> Result<()> {
        self.inner.write().grad.add_assign(grad)
    }

    /// Resets the accumulated gradient to zero.
    pub fn zero_grad(&self) {
        let mut state = self.inner.write();
        state.grad.as_mut_slice().fill(0.0);
    }

    /// Replaces the data with a tensor of identical shape.
    pub fn set_data(&self, data: Tensor) -> Result<()> {
        let mut state = self.inner.write();
        if state.data.shape() != data.shape() {
            return Err(Error::shape_mismatch(state.data.shape(), data.shape()));
        }
        state.data = data;
        Ok(())
    }

    /// Applies an in-place update given mutable data and the gradient.
    ///
    /// Used by optimizers.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut [f32], &[f32]),
    {
        let mut guard = self.inner.write();
        let state = &mut *guard;
        f(state.data.as_mut_slice(), state.grad.as_slice());
    }
}

impl std::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("shape", &self.shape())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
