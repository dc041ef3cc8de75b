//! homegin-optim - Optimization Algorithms
//!
//! # Optimizers
//!
//! - **Adam** - Adaptive Moment Estimation
//!
//! # Learning Rate Schedulers
//!
//! - **StepLR** - Step decay at fixed intervals
//!
//! # Basic Example
//!
//! ```rust
//! use homegin_core::Tensor;
//! use homegin_nn::Parameter;
//! use homegin_optim::prelude::*;
//!
//! let param = Parameter::named("w", Tensor::ones(&[2]));
//! let mut optimizer = Adam::new(vec![param.clone()], 0.01);
//! let mut scheduler = StepLR::new(&optimizer, 50, 0.5);
//!
//! param.accumulate_grad(&Tensor::ones(&[2])).unwrap();
//! optimizer.step();
//! scheduler.step(&mut optimizer);
//! assert!(param.data().as_slice()[0] < 1.0);
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::upper_case_acronyms)]

// =============================================================================
// Module Declarations
// =============================================================================

pub mod adam;
pub mod lr_scheduler;
pub mod optimizer;

// =============================================================================
// Re-exports
// =============================================================================

pub use adam::Adam;
pub use lr_scheduler::{LRScheduler, StepLR};
pub use optimizer::Optimizer;

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for optimization.
pub mod prelude {
    pub use crate::{Adam, LRScheduler, Optimizer, StepLR};
}
