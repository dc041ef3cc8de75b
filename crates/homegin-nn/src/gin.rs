//! GIN - Graph Isomorphism Network
//!
//! Graph classifier built from `GINConv` message-passing layers. Every
//! hidden representation (the input features included) is pooled per graph
//! and mapped to class scores by its own linear head; the logits are the sum
//! of those heads.
//!
//! ```text
//! h_v' = ApplyNodeFunc((1 + eps) * h_v + AGG_{u in N(v)} h_u)
//! score(G) = sum_k Dropout(Linear_k(READOUT_{v in G} h_v^(k)))
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use homegin_core::{Error, GraphStructure, Result, Tensor};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::ReLU;
use crate::functional::{
    graph_readout, neighbor_aggregate, scatter_reduce_backward, Aggregation, PoolCache,
};
use crate::layers::{BatchNorm1d, Dropout, Linear};
use crate::mlp::MLP;
use crate::module::{Mode, Module};
use crate::parameter::Parameter;
use crate::state_dict::StateDict;

// =============================================================================
// GinConfig
// =============================================================================

/// Architecture of a `GIN` model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GinConfig {
    /// Number of hidden representations, the input included.
    pub num_layers: usize,
    /// Linear layers per node MLP.
    pub num_mlp_layers: usize,
    /// Node feature width.
    pub input_dim: usize,
    /// Hidden width.
    pub hidden_dim: usize,
    /// Number of classes.
    pub output_dim: usize,
    /// Dropout applied to every prediction head.
    pub final_dropout: f32,
    /// Whether `eps` is trained.
    pub learn_eps: bool,
    /// Per-graph readout.
    pub graph_pooling: Aggregation,
    /// Neighbour aggregation inside `GINConv`.
    pub neighbor_pooling: Aggregation,
}

impl Default for GinConfig {
    fn default() -> Self {
        Self {
            num_layers: 5,
            num_mlp_layers: 2,
            input_dim: 4,
            hidden_dim: 64,
            output_dim: 15,
            final_dropout: 0.5,
            learn_eps: false,
            graph_pooling: Aggregation::Sum,
            neighbor_pooling: Aggregation::Sum,
        }
    }
}

// =============================================================================
// ApplyNodeFunc
// =============================================================================

/// Node update applied after aggregation: MLP -> BatchNorm1d -> ReLU.
pub struct ApplyNodeFunc {
    mlp: MLP,
    bn: BatchNorm1d,
    relu: ReLU,
}

impl ApplyNodeFunc {
    /// Wraps an MLP.
    pub fn new(mlp: MLP) -> Self {
        let bn = BatchNorm1d::new(mlp.output_dim());
        Self {
            mlp,
            bn,
            relu: ReLU::new(),
        }
    }
}

impl Module for ApplyNodeFunc {
    fn forward(&mut self, input: &Tensor, mode: Mode) -> Result<Tensor> {
        let h = self.mlp.forward(input, mode)?;
        let h = self.bn.forward(&h, mode)?;
        self.relu.forward(&h, mode)
    }

    fn backward(&mut self, grad_output: &Tensor) -> Result<Tensor> {
        let g = self.relu.backward(grad_output)?;
        let g = self.bn.backward(&g)?;
        self.mlp.backward(&g)
    }

    fn parameters(&self) -> Vec<Parameter> {
        let mut params = self.mlp.parameters();
        params.extend(self.bn.parameters());
        params
    }

    fn save_state(&self, prefix: &str, state: &mut StateDict) {
        self.mlp.save_state(&format!("{prefix}.mlp"), state);
        self.bn.save_state(&format!("{prefix}.bn"), state);
    }

    fn load_state(&mut self, prefix: &str, state: &StateDict) -> Result<()> {
        self.mlp.load_state(&format!("{prefix}.mlp"), state)?;
        self.bn.load_state(&format!("{prefix}.bn"), state)
    }

    fn name(&self) -> &'static str {
        "ApplyNodeFunc"
    }
}

// =============================================================================
// GINConv
// =============================================================================

struct ConvCache {
    input: Tensor,
    pool: PoolCache,
}

/// Graph Isomorphism Network convolution.
pub struct GINConv {
    apply_func: ApplyNodeFunc,
    /// Shape [1]; stays 0 unless `learn_eps`.
    eps: Parameter,
    learn_eps: bool,
    aggregation: Aggregation,
    cache: Option<ConvCache>,
}

impl GINConv {
    /// Creates a convolution with `eps = 0`.
    pub fn new(apply_func: ApplyNodeFunc, aggregation: Aggregation, learn_eps: bool) -> Self {
        Self {
            apply_func,
            eps: Parameter::named("eps", Tensor::zeros(&[1])),
            learn_eps,
            aggregation,
            cache: None,
        }
    }

    /// Current value of `eps`.
    pub fn eps(&self) -> f32 {
        self.eps.with_data(|e| e.as_slice()[0])
    }

    /// Runs one round of message passing over `graph`.
    pub fn forward(&mut self, graph: &GraphStructure, h: &Tensor, mode: Mode) -> Result<Tensor> {
        let (aggregated, pool) = neighbor_aggregate(graph, h, self.aggregation)?;
        let combined = h.scale(1.0 + self.eps()).add(&aggregated)?;
        let output = self.apply_func.forward(&combined, mode)?;

        self.cache = mode.is_training().then(|| ConvCache {
            input: h.clone(),
            pool,
        });
        Ok(output)
    }

    /// Back-propagates through the last training forward pass.
    pub fn backward(&mut self, grad_output: &Tensor) -> Result<Tensor> {
        let grad_combined = self.apply_func.backward(grad_output)?;
        let cache = self.cache.as_ref().ok_or_else(|| {
            Error::invalid_operation("GINConv::backward without a training forward")
        })?;

        if self.learn_eps {
            let d_eps: f32 = grad_combined
                .as_slice()
                .iter()
                .zip(cache.input.as_slice())
                .map(|(g, x)| g * x)
                .sum();
            self.eps.accumulate_grad(&Tensor::full(&[1], d_eps))?;
        }

        let from_neighbors = scatter_reduce_backward(&grad_combined, &cache.pool)?;
        grad_combined.scale(1.0 + self.eps()).add(&from_neighbors)
    }

    /// Trainable parameters; `eps` only when it is learned.
    pub fn parameters(&self) -> Vec<Parameter> {
        let mut params = self.apply_func.parameters();
        if self.learn_eps {
            params.push(self.eps.clone());
        }
        params
    }

    /// Saves the node function and `eps`.
    pub fn save_state(&self, prefix: &str, state: &mut StateDict) {
        self.apply_func
            .save_state(&format!("{prefix}.apply_func"), state);
        state.insert_parameter(prefix, &self.eps);
    }

    /// Restores the node function and `eps`.
    pub fn load_state(&mut self, prefix: &str, state: &StateDict) -> Result<()> {
        self.apply_func
            .load_state(&format!("{prefix}.apply_func"), state)?;
        state.load_parameter(prefix, &self.eps)
    }
}

// =============================================================================
// GIN
// =============================================================================

/// Result of a `GIN` forward pass.
#[derive(Debug, Clone)]
pub struct GinOutput {
    /// Class scores, shape (num_graphs, output_dim).
    pub logits: Tensor,
    /// Pooled last hidden representation, shape (num_graphs, width).
    pub embeddings: Tensor,
}

/// Graph Isomorphism Network for graph classification.
pub struct GIN {
    config: GinConfig,
    ginlayers: Vec<GINConv>,
    batch_norms: Vec<BatchNorm1d>,
    relus: Vec<ReLU>,
    linears_prediction: Vec<Linear>,
    drops: Vec<Dropout>,
    readout_caches: Vec<PoolCache>,
}

impl GIN {
    /// Builds a freshly initialised model.
    pub fn new<R: Rng + ?Sized>(config: GinConfig, rng: &mut R) -> Result<Self> {
        if config.num_layers == 0 {
            return Err(Error::invalid_operation("GIN needs at least one layer"));
        }
        if config.input_dim == 0 || config.hidden_dim == 0 || config.output_dim == 0 {
            return Err(Error::invalid_operation("GIN dimensions must be positive"));
        }
        let num_convs = config.num_layers - 1;

        let mut ginlayers = Vec::with_capacity(num_convs);
        for layer in 0..num_convs {
            let in_dim = if layer == 0 {
                config.input_dim
            } else {
                config.hidden_dim
            };
            let mlp = MLP::new(
                config.num_mlp_layers,
                in_dim,
                config.hidden_dim,
                config.hidden_dim,
                rng,
            )?;
            ginlayers.push(GINConv::new(
                ApplyNodeFunc::new(mlp),
                config.neighbor_pooling,
                config.learn_eps,
            ));
        }

        let mut linears_prediction = Vec::with_capacity(config.num_layers);
        let mut drops = Vec::with_capacity(config.num_layers);
        for layer in 0..config.num_layers {
            let in_dim = if layer == 0 {
                config.input_dim
            } else {
                config.hidden_dim
            };
            linears_prediction.push(Linear::new(in_dim, config.output_dim, rng));
            drops.push(Dropout::new(config.final_dropout, rng.gen())?);
        }

        Ok(Self {
            batch_norms: (0..num_convs)
                .map(|_| BatchNorm1d::new(config.hidden_dim))
                .collect(),
            relus: (0..num_convs).map(|_| ReLU::new()).collect(),
            ginlayers,
            linears_prediction,
            drops,
            readout_caches: Vec::new(),
            config,
        })
    }

    /// Returns the architecture.
    pub fn config(&self) -> &GinConfig {
        &self.config
    }

    /// Classifies every graph of a batch.
    pub fn forward(
        &mut self,
        graph: &GraphStructure,
        features: &Tensor,
        mode: Mode,
    ) -> Result<GinOutput> {
        if features.cols()? != self.config.input_dim {
            return Err(Error::shape_mismatch(
                &[graph.num_nodes(), self.config.input_dim],
                features.shape(),
            ));
        }

        let mut hidden_rep = Vec::with_capacity(self.config.num_layers);
        hidden_rep.push(features.clone());
        for i in 0..self.ginlayers.len() {
            let h = self.ginlayers[i].forward(graph, &hidden_rep[i], mode)?;
            let h = self.batch_norms[i].forward(&h, mode)?;
            hidden_rep.push(self.relus[i].forward(&h, mode)?);
        }

        self.readout_caches.clear();
        let mut logits = Tensor::zeros(&[graph.num_graphs(), self.config.output_dim]);
        let mut embeddings = Tensor::zeros(&[graph.num_graphs(), 0]);
        for (i, h) in hidden_rep.iter().enumerate() {
            let (pooled, cache) = graph_readout(graph, h, self.config.graph_pooling)?;
            if mode.is_training() {
                self.readout_caches.push(cache);
            }
            let score = self.linears_prediction[i].forward(&pooled, mode)?;
            logits.add_assign(&self.drops[i].forward(&score, mode)?)?;
            embeddings = pooled;
        }

        Ok(GinOutput { logits, embeddings })
    }

    /// Accumulates parameter gradients for `grad_logits` and returns the
    /// gradient with respect to the input features.
    pub fn backward(&mut self, grad_logits: &Tensor) -> Result<Tensor> {
        if self.readout_caches.len() != self.config.num_layers {
            return Err(Error::invalid_operation(
                "GIN::backward without a training forward",
            ));
        }

        let mut grad_hidden = Vec::with_capacity(self.config.num_layers);
        for i in 0..self.config.num_layers {
            let g = self.drops[i].backward(grad_logits)?;
            let g = self.linears_prediction[i].backward(&g)?;
            grad_hidden.push(scatter_reduce_backward(&g, &self.readout_caches[i])?);
        }

        let Some(mut g) = grad_hidden.pop() else {
            return Err(Error::invalid_operation("GIN has no hidden representations"));
        };
        for i in (0..self.ginlayers.len()).rev() {
            g = self.relus[i].backward(&g)?;
            g = self.batch_norms[i].backward(&g)?;
            g = self.ginlayers[i].backward(&g)?;
            g.add_assign(&grad_hidden[i])?;
        }
        Ok(g)
    }

    /// All trainable parameters.
    pub fn parameters(&self) -> Vec<Parameter> {
        let mut params: Vec<Parameter> = self
            .ginlayers
            .iter()
            .flat_map(GINConv::parameters)
            .collect();
        params.extend(self.batch_norms.iter().flat_map(Module::parameters));
        params.extend(self.linears_prediction.iter().flat_map(Module::parameters));
        params
    }

    /// Number of trainable scalars.
    pub fn num_parameters(&self) -> usize {
        self.parameters().iter().map(Parameter::numel).sum()
    }

    /// Clears every accumulated gradient.
    pub fn zero_grad(&self) {
        for param in self.parameters() {
            param.zero_grad();
        }
    }

    /// Snapshot of parameters and running statistics.
    pub fn state_dict(&self) -> StateDict {
        let mut state = StateDict::new();
        for (i, conv) in self.ginlayers.iter().enumerate() {
            conv.save_state(&format!("ginlayers.{i}"), &mut state);
        }
        for (i, bn) in self.batch_norms.iter().enumerate() {
            bn.save_state(&format!("batch_norms.{i}"), &mut state);
        }
        for (i, linear) in self.linears_prediction.iter().enumerate() {
            linear.save_state(&format!("linears_prediction.{i}"), &mut state);
        }
        state
    }

    /// Restores a snapshot taken from a model with the same architecture.
    pub fn load_state_dict(&mut self, state: &StateDict) -> Result<()> {
        for (i, conv) in self.ginlayers.iter_mut().enumerate() {
            conv.load_state(&format!("ginlayers.{i}"), state)?;
        }
        for (i, bn) in self.batch_norms.iter_mut().enumerate() {
            bn.load_state(&format!("batch_norms.{i}"), state)?;
        }
        for (i, linear) in self.linears_prediction.iter_mut().enumerate() {
            linear.load_state(&format!("linears_prediction.{i}"), state)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for GIN {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GIN")
            .field("config", &self.config)
            .field("num_parameters", &self.num_parameters())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
