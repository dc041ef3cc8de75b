//! Early Stopping - Patience on a Monitored Score with Checkpointing
//!
//! Higher scores are better. Every improvement saves the model through a
//! [`Checkpointer`]; after `patience` calls without improvement the
//! controller reports `stopped`.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use homegin_core::{Error, Result};
use homegin_nn::{StateDict, GIN};
use tracing::debug;

/// File name of the best-weights checkpoint inside the output directory.
pub const CHECKPOINT_FILE: &str = "checkpoint.bin";

// =============================================================================
// Checkpointer
// =============================================================================

/// Destination for best-so-far model weights.
pub trait Checkpointer {
    /// Persists the model's current state.
    fn save(&mut self, model: &GIN) -> Result<()>;

    /// Returns the last saved state, if any.
    fn load(&self) -> Result<Option<StateDict>>;

    /// Removes any saved state.
    fn clear(&mut self) -> Result<()>;
}

/// Writes the state dict with `bincode` to a file.
#[derive(Debug, Clone)]
pub struct FileCheckpointer {
    path: PathBuf,
}

impl FileCheckpointer {
    /// Checkpoints to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Checkpoints to `<dir>/checkpoint.bin`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(CHECKPOINT_FILE))
    }

    /// Checkpoint file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Checkpointer for FileCheckpointer {
    fn save(&mut self, model: &GIN) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&self.path)?);
        bincode::serialize_into(&mut writer, &model.state_dict()).map_err(Error::serialization)?;
        writer.flush()?;
        Ok(())
    }

    fn load(&self) -> Result<Option<StateDict>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let state = bincode::deserialize_from(reader).map_err(Error::serialization)?;
        Ok(Some(state))
    }

    fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Keeps the last checkpoint in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointer {
    state: Option<StateDict>,
    saves: usize,
}

impl MemoryCheckpointer {
    /// Creates an empty checkpointer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `save` was called.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl Checkpointer for MemoryCheckpointer {
    fn save(&mut self, model: &GIN) -> Result<()> {
        self.state = Some(model.state_dict());
        self.saves += 1;
        Ok(())
    }

    fn load(&self) -> Result<Option<StateDict>> {
        Ok(self.state.clone())
    }

    fn clear(&mut self) -> Result<()> {
        self.state = None;
        Ok(())
    }
}

// =============================================================================
// EarlyStopping
// =============================================================================

/// Stops training when the monitored score stops improving.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    delta: f32,
    best_score: Option<f32>,
    counter: usize,
    stopped: bool,
}

impl EarlyStopping {
    /// Creates a controller with the given patience and zero delta.
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            delta: 0.0,
            best_score: None,
            counter: 0,
            stopped: false,
        }
    }

    /// Minimum increase that counts as an improvement.
    pub fn delta(mut self, delta: f32) -> Self {
        self.delta = delta;
        self
    }

    /// Feeds one score; checkpoints `model` on improvement.
    pub fn step<C: Checkpointer + ?Sized>(
        &mut self,
        score: f32,
        model: &GIN,
        checkpointer: &mut C,
    ) -> Result<()> {
        let improved = self.best_score.map_or(true, |best| score > best + self.delta);
        if improved {
            checkpointer.save(model)?;
            debug!(score, previous = ?self.best_score, "score improved, checkpoint saved");
            self.best_score = Some(score);
            self.counter = 0;
        } else {
            self.counter += 1;
            debug!(score, counter = self.counter, patience = self.patience, "no improvement");
            if self.counter >= self.patience {
                self.stopped = true;
            }
        }
        Ok(())
    }

    /// Best score seen so far.
    pub fn best_score(&self) -> Option<f32> {
        self.best_score
    }

    /// Calls since the last improvement.
    pub fn counter(&self) -> usize {
        self.counter
    }

    /// Whether training should stop.
    pub fn stopped(&self) -> bool {
        self.stopped
    }

    /// Patience window.
    pub fn patience(&self) -> usize {
        self.patience
    }
}

// =============================================================================
// Tests
// =============================================================================
