//! homegin-nn - Neural Network Layers and the GIN Classifier
//!
//! Layers with explicit forward and backward passes, graph pooling
//! primitives and the Graph Isomorphism Network used to classify sensor
//! graphs.
//!
//! # Key Components
//!
//! - **Module trait**: forward with an explicit `Mode`, backward, state I/O
//! - **Parameter**: shared tensor + gradient handle used by optimizers
//! - **Layers**: Linear, BatchNorm1d, Dropout, ReLU, MLP
//! - **Graph**: neighbour aggregation, graph readout, GINConv, GIN
//! - **Loss**: CrossEntropyLoss
//! - **StateDict**: named snapshot of parameters and running statistics
//!
//! # Example
//!
//! ```rust
//! use homegin_core::{GraphStructure, Tensor};
//! use homegin_nn::prelude::*;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let config = GinConfig { hidden_dim: 8, output_dim: 3, ..GinConfig::default() };
//! let mut model = GIN::new(config, &mut rng).unwrap();
//!
//! let graph = GraphStructure::single(3, vec![0, 1, 1, 2], vec![1, 0, 2, 1]).unwrap();
//! let features = Tensor::ones(&[3, 4]);
//! let out = model.forward(&graph, &features, Mode::Eval).unwrap();
//! assert_eq!(out.logits.shape(), &[1, 3]);
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// ML/tensor-specific allowances
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::new_without_default)]

// =============================================================================
// Module Declarations
// =============================================================================

pub mod activation;
pub mod functional;
pub mod gin;
pub mod init;
pub mod layers;
pub mod loss;
pub mod mlp;
pub mod module;
pub mod parameter;
pub mod state_dict;

// =============================================================================
// Re-exports
// =============================================================================

pub use activation::ReLU;
pub use functional::Aggregation;
pub use gin::{ApplyNodeFunc, GINConv, GinConfig, GinOutput, GIN};
pub use layers::{BatchNorm1d, Dropout, Linear};
pub use loss::{CrossEntropyLoss, LossOutput};
pub use mlp::MLP;
pub use module::{Mode, Module};
pub use parameter::Parameter;
pub use state_dict::StateDict;

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for model code.
pub mod prelude {
    pub use crate::{
        functional, Aggregation, BatchNorm1d, CrossEntropyLoss, Dropout, GinConfig, GinOutput,
        Linear, Mode, Module, Parameter, ReLU, StateDict, GIN, MLP,
    };
}
