//! Error Types - homegin Error Handling
//!
//! Provides the error type shared by every homegin crate: tensor shape
//! problems, CSV and store I/O, label resolution, node grouping and house
//! range validation.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// The main error type for homegin operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Shape mismatch between tensors.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// The expected shape.
        expected: Vec<usize>,
        /// The actual shape.
        actual: Vec<usize>,
    },

    /// Index out of bounds.
    #[error("Index out of bounds: index {index} for dimension of size {size}")]
    IndexOutOfBounds {
        /// The invalid index.
        index: usize,
        /// The size of the dimension.
        size: usize,
    },

    /// Invalid operation.
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A CSV file could not be read.
    #[error("CSV error in {path}: {message}")]
    Csv {
        /// File being read.
        path: String,
        /// Reader message.
        message: String,
    },

    /// A required column is missing from a table.
    #[error("Missing column '{column}' in {path}")]
    MissingColumn {
        /// File being read.
        path: String,
        /// Column name or index.
        column: String,
    },

    /// A cell could not be parsed as a number.
    #[error("Cannot parse '{value}' in {path} (row {row}, column {column})")]
    Parse {
        /// File being read.
        path: String,
        /// Zero-based data row.
        row: usize,
        /// Column name or index.
        column: String,
        /// Raw cell contents.
        value: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization error.
        message: String,
    },

    /// Activity name that is not part of the class catalog.
    #[error("Unknown activity '{name}' (not in the activity catalog)")]
    UnknownActivity {
        /// Canonical name after merging.
        name: String,
    },

    /// Activity id that is not part of the class catalog.
    #[error("Unknown activity id {id}")]
    UnknownActivityId {
        /// The offending id.
        id: usize,
    },

    /// House name that is not part of the range table.
    #[error("Unknown house '{name}'")]
    UnknownHouse {
        /// House name.
        name: String,
    },

    /// Nodes of one physical object are not contiguous in the node table.
    #[error("Object '{object}' reappears at node {node} after its run of nodes ended")]
    NonContiguousObject {
        /// Object identifier from the node table.
        object: String,
        /// Node row where the object reappeared.
        node: usize,
    },

    /// House ranges do not partition the dataset.
    #[error("Invalid house ranges: {message}")]
    InvalidHouseRanges {
        /// What is wrong with the ranges.
        message: String,
    },

    /// Graph topology or batch is malformed.
    #[error("Invalid graph: {message}")]
    InvalidGraph {
        /// What is wrong with the graph.
        message: String,
    },

    /// A state dictionary does not match the module it is loaded into.
    #[error("State dict error: {message}")]
    StateDict {
        /// What is missing or mismatched.
        message: String,
    },
}

// =============================================================================
// Result Type
// =============================================================================

/// A specialized Result type for homegin operations.
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// Helper Functions
// =============================================================================

impl Error {
    /// Creates a new shape mismatch error.
    #[must_use]
    pub fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Creates a new invalid operation error.
    #[must_use]
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates a new serialization error.
    #[must_use]
    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization {
            message: message.to_string(),
        }
    }

    /// Creates a new CSV error for `path`.
    #[must_use]
    pub fn csv(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Csv {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Creates a new invalid graph error.
    #[must_use]
    pub fn invalid_graph(message: impl Into<String>) -> Self {
        Self::InvalidGraph {
            message: message.into(),
        }
    }

    /// Creates a new state dict error.
    #[must_use]
    pub fn state_dict(message: impl Into<String>) -> Self {
        Self::StateDict {
            message: message.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
