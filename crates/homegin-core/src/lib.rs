//! homegin Core - Foundation Layer for homegin
//!
//! Provides the pieces every other homegin crate builds on:
//! - `Error` / `Result`, the shared error type
//! - `Tensor`, a dense row-major `f32` array with parallel matrix products
//! - `GraphStructure`, the batched edge list consumed by message passing
//!
//! # Example
//! ```rust
//! use homegin_core::Tensor;
//!
//! let x = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
//! let y = x.matmul(&x).unwrap();
//! assert_eq!(y.to_vec(), vec![7.0, 10.0, 15.0, 22.0]);
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
#![allow(clippy::needless_range_loop)]
#![allow(clippy::return_self_not_must_use)]

// =============================================================================
// Modules
// =============================================================================

pub mod error;
pub mod graph;
pub mod tensor;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{Error, Result};
pub use graph::GraphStructure;
pub use tensor::Tensor;
