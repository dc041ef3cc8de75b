//! Trainer - Epoch Loop with Periodic Evaluation and Early Stopping
//!
//! Each epoch trains on every batch, advances the learning-rate schedule,
//! and every `eval_every`-th epoch evaluates the train, validation and test
//! loaders. The validation macro-F1 (the training macro-F1 when there is no
//! validation data) drives early stopping.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::time::Instant;

use homegin_core::{Error, Result};
use homegin_data::{Dataset, GraphDataLoader, GraphSample};
use homegin_nn::{CrossEntropyLoss, Mode, GIN};
use homegin_optim::{LRScheduler, Optimizer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::early_stopping::{Checkpointer, EarlyStopping};
use crate::evaluate::{EvalReport, EvalSplit, Evaluator};

// =============================================================================
// train_epoch
// =============================================================================

/// Runs one optimisation step per batch.
///
/// Returns the sum of per-batch mean losses divided by the number of
/// batches, so a short final batch weighs as much as a full one.
pub fn train_epoch<D, O>(
    model: &mut GIN,
    loader: &GraphDataLoader<D>,
    optimizer: &mut O,
    criterion: &CrossEntropyLoss,
) -> Result<f32>
where
    D: Dataset<Item = GraphSample>,
    O: Optimizer,
{
    let mut running_loss = 0.0f32;
    let mut batches = 0usize;
    for batch in loader.iter() {
        let batch = batch?;
        let output = model.forward(&batch.graph, &batch.features, Mode::Train)?;
        let loss = criterion.compute(&output.logits, &batch.labels)?;

        optimizer.zero_grad();
        model.backward(&loss.grad)?;
        optimizer.step();

        running_loss += loss.loss;
        batches += 1;
    }
    Ok(if batches == 0 {
        0.0
    } else {
        running_loss / batches as f32
    })
}

// =============================================================================
// Loaders
// =============================================================================

/// Train, validation and test loaders of one experiment.
pub struct SplitLoaders<D>
where
    D: Dataset<Item = GraphSample>,
{
    /// Training graphs.
    pub train: GraphDataLoader<D>,
    /// Validation graphs; may be empty.
    pub valid: GraphDataLoader<D>,
    /// Held-out house.
    pub test: GraphDataLoader<D>,
}

// =============================================================================
// Training History
// =============================================================================

/// Reports of one periodic evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalSnapshot {
    /// Zero-based epoch after which the evaluation ran.
    pub epoch: usize,
    /// Training split.
    pub train: EvalReport,
    /// Validation split.
    pub valid: EvalReport,
    /// Test split.
    pub test: EvalReport,
    /// Score passed to early stopping.
    pub monitored: f32,
}

/// Complete training history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    /// Batch-averaged training loss per epoch.
    pub train_loss: Vec<f32>,
    /// Learning rate in effect after each epoch's schedule step.
    pub learning_rates: Vec<f32>,
    /// Periodic evaluations.
    pub evaluations: Vec<EvalSnapshot>,
    /// Number of epochs completed.
    pub epochs_completed: usize,
    /// Whether early stopping ended training.
    pub early_stopped: bool,
    /// Best monitored score.
    pub best_score: Option<f32>,
    /// Training duration in seconds.
    pub duration_secs: f64,
}

impl TrainingHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lowest training loss.
    pub fn best_train_loss(&self) -> Option<f32> {
        self.train_loss.iter().copied().reduce(f32::min)
    }
}

// =============================================================================
// Trainer
// =============================================================================

/// Drives the epoch loop of one experiment.
#[derive(Debug, Clone)]
pub struct Trainer {
    epochs: usize,
    eval_every: usize,
    early_stopping: EarlyStopping,
    criterion: CrossEntropyLoss,
}

impl Trainer {
    /// Creates a trainer; evaluation runs after every `eval_every`-th epoch.
    pub fn new(epochs: usize, eval_every: usize, patience: usize) -> Result<Self> {
        if eval_every == 0 {
            return Err(Error::invalid_operation("eval_every must be positive"));
        }
        Ok(Self {
            epochs,
            eval_every,
            early_stopping: EarlyStopping::new(patience),
            criterion: CrossEntropyLoss::new(),
        })
    }

    /// Replaces the early-stopping controller.
    pub fn early_stopping(mut self, early_stopping: EarlyStopping) -> Self {
        self.early_stopping = early_stopping;
        self
    }

    /// Current early-stopping state.
    pub fn early_stopping_state(&self) -> &EarlyStopping {
        &self.early_stopping
    }

    /// Whether evaluation runs after zero-based `epoch`.
    pub fn is_eval_epoch(&self, epoch: usize) -> bool {
        epoch % self.eval_every == self.eval_every - 1
    }

    /// Trains `model` until the epoch budget runs out or early stopping fires.
    pub fn fit<D, O, S, C>(
        &mut self,
        model: &mut GIN,
        optimizer: &mut O,
        scheduler: &mut S,
        loaders: &SplitLoaders<D>,
        evaluator: &Evaluator<'_>,
        checkpointer: &mut C,
    ) -> Result<TrainingHistory>
    where
        D: Dataset<Item = GraphSample>,
        O: Optimizer,
        S: LRScheduler,
        C: Checkpointer + ?Sized,
    {
        let start = Instant::now();
        let mut history = TrainingHistory::new();
        info!(
            epochs = self.epochs,
            train_batches = loaders.train.len(),
            valid_graphs = loaders.valid.dataset_len(),
            test_graphs = loaders.test.dataset_len(),
            "training started"
        );

        for epoch in 0..self.epochs {
            let loss = train_epoch(model, &loaders.train, optimizer, &self.criterion)?;
            scheduler.step(optimizer);
            history.train_loss.push(loss);
            history.learning_rates.push(optimizer.get_lr());
            history.epochs_completed = epoch + 1;
            debug!(epoch, loss, lr = optimizer.get_lr(), "epoch finished");

            if !self.is_eval_epoch(epoch) {
                continue;
            }

            let train = evaluator.evaluate(model, &loaders.train, EvalSplit::Train)?;
            let valid = evaluator.evaluate(model, &loaders.valid, EvalSplit::Val)?;
            let test = evaluator.evaluate(model, &loaders.test, EvalSplit::Test)?;
            let monitored = if valid.total == 0 {
                train.macro_f1
            } else {
                valid.macro_f1
            };
            info!(
                epoch,
                train_loss = train.loss,
                train_f1 = train.macro_f1,
                valid_f1 = valid.macro_f1,
                test_accuracy = test.accuracy,
                test_f1 = test.macro_f1,
                "periodic evaluation"
            );

            self.early_stopping.step(monitored, model, checkpointer)?;
            history.evaluations.push(EvalSnapshot {
                epoch,
                train,
                valid,
                test,
                monitored,
            });

            if self.early_stopping.stopped() {
                info!(epoch, best = ?self.early_stopping.best_score(), "early stopping");
                history.early_stopped = true;
                break;
            }
        }

        history.best_score = self.early_stopping.best_score();
        history.duration_secs = start.elapsed().as_secs_f64();
        Ok(history)
    }
}

// =============================================================================
// Tests
// =============================================================================
