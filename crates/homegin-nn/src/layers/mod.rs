//! Neural Network Layers
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

pub mod dropout;
pub mod linear;
pub mod norm;

pub use dropout::Dropout;
pub use linear::Linear;
pub use norm::BatchNorm1d;
