//! # homegin - GIN Activity Recognition for Smart Homes
//!
//! Classifies human activities from smart-home sensor logs. Every row of a
//! house's sensor table becomes one graph over the house's sensors; a Graph
//! Isomorphism Network is trained on all houses but one and tested on the
//! held-out house.
//!
//! ## Crates
//!
//! - [`core`]: error type, dense tensor, batched graph structure
//! - [`data`]: CSV tables, feature encoding, graph store, splits, loaders
//! - [`nn`]: GIN layers with explicit forward and backward passes
//! - [`optim`]: Adam and StepLR
//!
//! This crate adds the training loop, evaluation, metrics, early stopping
//! and the leave-one-house-out driver.
//!
//! # Quick Start
//!
//! ```ignore
//! use homegin::prelude::*;
//!
//! let dataset_config = DatasetConfig::default();
//! let layout = DataLayout::default();
//! let config = ExperimentConfig::default();
//!
//! let builder = GraphBuilder::new(&layout.data_dir, RunConfig::Ob, &dataset_config);
//! let store = GraphStore::load_or_build(layout.store_path(RunConfig::Ob), &builder, false)?;
//!
//! let experiment = HouseExperiment::from_store(&config, &layout, &dataset_config, store, false)?;
//! let results = experiment.run_all(&dataset_config.houses)?;
//! for r in &results.results {
//!     println!("{}: acc {:.3} f1 {:.3}", r.house, r.accuracy, r.f1_score);
//! }
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
#![allow(clippy::doc_markdown)]
#![allow(clippy::float_cmp)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::return_self_not_must_use)]

// =============================================================================
// Re-exports
// =============================================================================

pub use homegin_core as core;
pub use homegin_data as data;
pub use homegin_nn as nn;
pub use homegin_optim as optim;

// =============================================================================
// Module Declarations
// =============================================================================

pub mod early_stopping;
pub mod evaluate;
pub mod experiment;
pub mod metrics;
pub mod trainer;

pub use early_stopping::{
    Checkpointer, EarlyStopping, FileCheckpointer, MemoryCheckpointer, CHECKPOINT_FILE,
};
pub use evaluate::{EmbeddingTable, EvalReport, EvalSplit, Evaluator};
pub use experiment::{DataLayout, ExperimentConfig, HouseExperiment, HouseResult, ResultsFile};
pub use metrics::{ConfusionMatrix, ABSENT_CLASS_ACCURACY};
pub use trainer::{train_epoch, EvalSnapshot, SplitLoaders, Trainer, TrainingHistory};

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for running experiments.
pub mod prelude {
    pub use homegin_core::{Error, GraphStructure, Result, Tensor};
    pub use homegin_data::prelude::*;
    pub use homegin_nn::prelude::*;
    pub use homegin_optim::prelude::*;

    pub use crate::{
        Checkpointer, ConfusionMatrix, DataLayout, EarlyStopping, EvalReport, EvalSplit,
        Evaluator, ExperimentConfig, FileCheckpointer, HouseExperiment, HouseResult,
        ResultsFile, Trainer, TrainingHistory,
    };
}
