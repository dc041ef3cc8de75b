//! MLP - Multi-Layer Perceptron Block
//!
//! With one layer this is a plain linear map. With more, every hidden
//! layer is Linear -> BatchNorm1d -> ReLU and the last layer is linear.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use homegin_core::{Error, Result, Tensor};
use rand::Rng;

use crate::activation::ReLU;
use crate::layers::{BatchNorm1d, Linear};
use crate::module::{Mode, Module};
use crate::parameter::Parameter;
use crate::state_dict::StateDict;

// =============================================================================
// MLP
// =============================================================================

/// Stack of linear layers with batch norm and ReLU between them.
pub struct MLP {
    linears: Vec<Linear>,
    batch_norms: Vec<BatchNorm1d>,
    relus: Vec<ReLU>,
    output_dim: usize,
}

impl MLP {
    /// Creates an MLP with `num_layers` linear layers.
    pub fn new<R: Rng + ?Sized>(
        num_layers: usize,
        input_dim: usize,
        hidden_dim: usize,
        output_dim: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if num_layers == 0 {
            return Err(Error::invalid_operation(
                "number of MLP layers must be positive",
            ));
        }

        let mut linears = Vec::with_capacity(num_layers);
        if num_layers == 1 {
            linears.push(Linear::new(input_dim, output_dim, rng));
        } else {
            linears.push(Linear::new(input_dim, hidden_dim, rng));
            for _ in 0..num_layers - 2 {
                linears.push(Linear::new(hidden_dim, hidden_dim, rng));
            }
            linears.push(Linear::new(hidden_dim, output_dim, rng));
        }
        let hidden = num_layers - 1;

        Ok(Self {
            linears,
            batch_norms: (0..hidden).map(|_| BatchNorm1d::new(hidden_dim)).collect(),
            relus: (0..hidden).map(|_| ReLU::new()).collect(),
            output_dim,
        })
    }

    /// Width of the output.
    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    /// Number of linear layers.
    pub fn num_layers(&self) -> usize {
        self.linears.len()
    }
}

impl Module for MLP {
    fn forward(&mut self, input: &Tensor, mode: Mode) -> Result<Tensor> {
        let hidden = self.batch_norms.len();
        let mut h = input.clone();
        for i in 0..hidden {
            h = self.linears[i].forward(&h, mode)?;
            h = self.batch_norms[i].forward(&h, mode)?;
            h = self.relus[i].forward(&h, mode)?;
        }
        self.linears[hidden].forward(&h, mode)
    }

    fn backward(&mut self, grad_output: &Tensor) -> Result<Tensor> {
        let hidden = self.batch_norms.len();
        let mut g = self.linears[hidden].backward(grad_output)?;
        for i in (0..hidden).rev() {
            g = self.relus[i].backward(&g)?;
            g = self.batch_norms[i].backward(&g)?;
            g = self.linears[i].backward(&g)?;
        }
        Ok(g)
    }

    fn parameters(&self) -> Vec<Parameter> {
        self.linears
            .iter()
            .flat_map(Module::parameters)
            .chain(self.batch_norms.iter().flat_map(Module::parameters))
            .collect()
    }

    fn save_state(&self, prefix: &str, state: &mut StateDict) {
        for (i, linear) in self.linears.iter().enumerate() {
            linear.save_state(&format!("{prefix}.linears.{i}"), state);
        }
        for (i, bn) in self.batch_norms.iter().enumerate() {
            bn.save_state(&format!("{prefix}.batch_norms.{i}"), state);
        }
    }

    fn load_state(&mut self, prefix: &str, state: &StateDict) -> Result<()> {
        for (i, linear) in self.linears.iter_mut().enumerate() {
            linear.load_state(&format!("{prefix}.linears.{i}"), state)?;
        }
        for (i, bn) in self.batch_norms.iter_mut().enumerate() {
            bn.load_state(&format!("{prefix}.batch_norms.{i}"), state)?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "MLP"
    }
}

// =============================================================================
// Tests
// =============================================================================
