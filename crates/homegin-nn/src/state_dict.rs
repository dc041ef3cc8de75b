//! State Dictionary - Named Tensor Snapshot
//!
//! Provides `StateDict` for storing and restoring parameters and buffers
//! (such as batch-norm running statistics) by dotted name.

use std::collections::BTreeMap;

use homegin_core::{Error, Result, Tensor};
use serde::{Deserialize, Serialize};

use crate::parameter::Parameter;

// =============================================================================
// StateDict
// =============================================================================

/// Snapshot of a model's parameters and buffers keyed by dotted path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDict {
    entries: BTreeMap<String, Tensor>,
}

impl StateDict {
    /// Creates an empty state dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a tensor.
    pub fn insert(&mut self, name: String, tensor: Tensor) {
        self.entries.insert(name, tensor);
    }

    /// Gets a tensor by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.entries.get(name)
    }

    /// Gets a tensor by name, failing if it is absent.
    pub fn require(&self, name: &str) -> Result<&Tensor> {
        self.entries
            .get(name)
            .ok_or_else(|| Error::state_dict(format!("missing entry '{name}'")))
    }

    /// Returns all keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records a parameter under `prefix.name`.
    pub fn insert_parameter(&mut self, prefix: &str, param: &Parameter) {
        self.insert(join_key(prefix, param.name()), param.data());
    }

    /// Restores a parameter from `prefix.name`.
    pub fn load_parameter(&self, prefix: &str, param: &Parameter) -> Result<()> {
        let key = join_key(prefix, param.name());
        param.set_data(self.require(&key)?.clone())
    }

    /// Restores a buffer from `prefix.name`, checking its shape.
    pub fn load_buffer(&self, prefix: &str, name: &str, buffer: &mut Tensor) -> Result<()> {
        let key = join_key(prefix, name);
        let stored = self.require(&key)?;
        if stored.shape() != buffer.shape() {
            return Err(Error::state_dict(format!(
                "'{key}' has shape {:?}, expected {:?}",
                stored.shape(),
                buffer.shape()
            )));
        }
        *buffer = stored.clone();
        Ok(())
    }
}

/// Joins a module prefix and a local name with a dot.
#[must_use]
pub fn join_key(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_key() {
        assert_eq!(join_key("", "weight"), "weight");
        assert_eq!(join_key("layers.0", "weight"), "layers.0.weight");
    }

    #[test]
    fn test_parameter_round_trip() {
        let p = Parameter::named("weight", Tensor::full(&[2, 2], 3.0));
        let mut state = StateDict::new();
        state.insert_parameter("fc", &p);
        assert!(state.get("fc.weight").is_some());

        p.set_data(Tensor::zeros(&[2, 2])).unwrap();
        state.load_parameter("fc", &p).unwrap();
        assert_eq!(p.data().to_vec(), vec![3.0; 4]);
    }

    #[test]
    fn test_missing_and_mismatched_entries() {
        let state = StateDict::new();
        let p = Parameter::named("bias", Tensor::zeros(&[2]));
        assert!(state.load_parameter("fc", &p).is_err());

        let mut state = StateDict::new();
        state.insert("bn.running_mean".to_string(), Tensor::zeros(&[3]));
        let mut buffer = Tensor::zeros(&[2]);
        assert!(state.load_buffer("bn", "running_mean", &mut buffer).is_err());
    }
}
