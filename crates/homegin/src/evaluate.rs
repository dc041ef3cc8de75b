//! Evaluator - Loss, Accuracy, Macro-F1 and Embedding Export
//!
//! One pass over a loader in evaluation mode. Every pass writes the
//! confusion matrix of its split to `<output_dir>/<split>_confusion_matrix.npy`,
//! replacing the previous one.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use homegin_core::{Error, Result, Tensor};
use homegin_data::{ActivityCatalog, ActivityId, Dataset, GraphDataLoader, GraphSample};
use homegin_nn::{CrossEntropyLoss, Mode, GIN};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::metrics::{ConfusionMatrix, ABSENT_CLASS_ACCURACY};

// =============================================================================
// EvalSplit
// =============================================================================

/// Which split a report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvalSplit {
    /// Training graphs.
    Train,
    /// Validation graphs.
    Val,
    /// Held-out house.
    Test,
}

impl EvalSplit {
    /// Short name used in file names.
    pub fn as_str(self) -> &'static str {
        match self {
            EvalSplit::Train => "train",
            EvalSplit::Val => "val",
            EvalSplit::Test => "test",
        }
    }

    /// Confusion matrix file name.
    pub fn confusion_file_name(self) -> String {
        format!("{}_confusion_matrix.npy", self.as_str())
    }
}

impl fmt::Display for EvalSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// EvalReport
// =============================================================================

/// Metrics of one evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    /// Split evaluated.
    pub split: EvalSplit,
    /// Sample-weighted mean cross entropy.
    pub loss: f32,
    /// Fraction of correct predictions.
    pub accuracy: f32,
    /// Macro-averaged F1.
    pub macro_f1: f32,
    /// Accuracy of every class present in the split, by class name.
    pub per_class_accuracy: BTreeMap<String, f32>,
    /// Truth x prediction counts.
    pub confusion: ConfusionMatrix,
    /// Graphs evaluated.
    pub total: usize,
    /// Correct predictions.
    pub correct: usize,
}

// =============================================================================
// EmbeddingTable
// =============================================================================

/// Pooled last-layer representations with their true labels, in loader order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingTable {
    width: usize,
    values: Vec<f32>,
    labels: Vec<ActivityId>,
}

impl EmbeddingTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one batch of embeddings.
    pub fn push_batch(&mut self, embeddings: &Tensor, labels: &[ActivityId]) -> Result<()> {
        let (rows, cols) = (embeddings.rows()?, embeddings.cols()?);
        if rows != labels.len() {
            return Err(Error::shape_mismatch(&[labels.len(), cols], embeddings.shape()));
        }
        if self.labels.is_empty() {
            self.width = cols;
        } else if cols != self.width {
            return Err(Error::shape_mismatch(&[rows, self.width], embeddings.shape()));
        }
        self.values.extend_from_slice(embeddings.as_slice());
        self.labels.extend_from_slice(labels);
        Ok(())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if no rows were recorded.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Embedding width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Embedding of row `i`.
    pub fn row(&self, i: usize) -> &[f32] {
        &self.values[i * self.width..(i + 1) * self.width]
    }

    /// Labels in row order.
    pub fn labels(&self) -> &[ActivityId] {
        &self.labels
    }

    /// Writes a CSV with header `0,1,...,D-1,activity`.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let csv_err = |e: csv::Error| Error::csv(path.display().to_string(), e);
        let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;

        let mut header: Vec<String> = (0..self.width).map(|i| i.to_string()).collect();
        header.push("activity".to_string());
        writer.write_record(&header).map_err(csv_err)?;

        for (i, label) in self.labels.iter().enumerate() {
            let mut record: Vec<String> = self.row(i).iter().map(f32::to_string).collect();
            record.push(label.to_string());
            writer.write_record(&record).map_err(csv_err)?;
        }
        writer.flush()?;
        debug!(path = %path.display(), rows = self.len(), "wrote embeddings");
        Ok(())
    }
}

// =============================================================================
// Evaluator
// =============================================================================

/// Evaluates a model and records confusion matrices under an output directory.
#[derive(Debug, Clone)]
pub struct Evaluator<'a> {
    activities: &'a ActivityCatalog,
    output_dir: PathBuf,
    criterion: CrossEntropyLoss,
}

impl<'a> Evaluator<'a> {
    /// Creates an evaluator writing into `output_dir`.
    pub fn new(activities: &'a ActivityCatalog, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            activities,
            output_dir: output_dir.into(),
            criterion: CrossEntropyLoss::new(),
        }
    }

    /// Directory receiving confusion matrices.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Evaluates `model` on every batch of `loader`.
    pub fn evaluate<D>(
        &self,
        model: &mut GIN,
        loader: &GraphDataLoader<D>,
        split: EvalSplit,
    ) -> Result<EvalReport>
    where
        D: Dataset<Item = GraphSample>,
    {
        self.run(model, loader, split, None)
    }

    /// Evaluates and also collects the pooled last-layer embeddings.
    pub fn evaluate_with_embeddings<D>(
        &self,
        model: &mut GIN,
        loader: &GraphDataLoader<D>,
        split: EvalSplit,
    ) -> Result<(EvalReport, EmbeddingTable)>
    where
        D: Dataset<Item = GraphSample>,
    {
        let mut table = EmbeddingTable::new();
        let report = self.run(model, loader, split, Some(&mut table))?;
        Ok((report, table))
    }

    fn run<D>(
        &self,
        model: &mut GIN,
        loader: &GraphDataLoader<D>,
        split: EvalSplit,
        mut embeddings: Option<&mut EmbeddingTable>,
    ) -> Result<EvalReport>
    where
        D: Dataset<Item = GraphSample>,
    {
        let num_classes = model.config().output_dim;
        let mut confusion = ConfusionMatrix::new(num_classes);
        let mut total_loss = 0.0f64;
        let mut total = 0usize;

        for batch in loader.iter() {
            let batch = batch?;
            let output = model.forward(&batch.graph, &batch.features, Mode::Eval)?;
            total_loss += f64::from(self.criterion.sum(&output.logits, &batch.labels)?);
            total += batch.len();

            let predicted = output.logits.argmax_rows()?;
            for (&truth, &pred) in batch.labels.iter().zip(&predicted) {
                confusion.record(truth, pred)?;
            }
            if let Some(table) = embeddings.as_deref_mut() {
                table.push_batch(&output.embeddings, &batch.labels)?;
            }
        }

        confusion.write_npy(self.output_dir.join(split.confusion_file_name()))?;

        let mut per_class_accuracy = BTreeMap::new();
        for (class, acc) in confusion.per_class_accuracy().into_iter().enumerate() {
            if acc != ABSENT_CLASS_ACCURACY {
                let name = self.activities.name_for_id(class)?;
                per_class_accuracy.insert(name.to_string(), acc);
            }
        }

        let correct = confusion.correct() as usize;
        let report = EvalReport {
            split,
            loss: if total == 0 {
                0.0
            } else {
                (total_loss / total as f64) as f32
            },
            accuracy: confusion.accuracy(),
            macro_f1: confusion.macro_f1(),
            per_class_accuracy,
            confusion,
            total,
            correct,
        };
        info!(
            split = %split,
            loss = report.loss,
            accuracy = report.accuracy,
            macro_f1 = report.macro_f1,
            total,
            "evaluation"
        );
        Ok(report)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use homegin_data::{GraphDataset, GraphTopology, SensorGraph};
    use homegin_nn::GinConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn dataset(n: usize) -> GraphDataset {
        let topology = Arc::new(GraphTopology::new(3, vec![0, 1, 1, 2], vec![1, 0, 2, 1]).unwrap());
        let graphs = (0..n)
            .map(|i| {
                let v = i as f32 * 0.1;
                SensorGraph::new(
                    topology.clone(),
                    vec![[v, 1.0, 2.0, 3.0], [1.0 - v, 2.0, 2.0, 1.0], [0.5, -1.0, -1.0, -1.0]],
                )
                .unwrap()
            })
            .collect();
        GraphDataset::new(graphs, (0..n).map(|i| i % 3).collect()).unwrap()
    }

    fn model() -> GIN {
        let config = GinConfig {
            num_layers: 3,
            hidden_dim: 8,
            output_dim: 15,
            ..GinConfig::default()
        };
        GIN::new(config, &mut StdRng::seed_from_u64(1)).unwrap()
    }

    #[test]
    fn test_report_consistency() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = ActivityCatalog::default();
        let evaluator = Evaluator::new(&catalog, dir.path());
        let loader = GraphDataLoader::new(dataset(10), 4).unwrap();
        let mut model = model();

        let report = evaluator.evaluate(&mut model, &loader, EvalSplit::Val).unwrap();
        assert_eq!(report.total, 10);
        assert_eq!(report.confusion.correct() as usize, report.correct);
        assert!((report.accuracy - report.correct as f32 / 10.0).abs() < 1e-6);
        assert!(report.loss.is_finite() && report.loss > 0.0);
        // only classes 0..3 occur in the truth
        assert!(report.per_class_accuracy.len() <= 3);
        assert!(report
            .per_class_accuracy
            .values()
            .all(|a| (0.0..=1.0).contains(a)));
        assert!(dir.path().join("val_confusion_matrix.npy").exists());
    }

    #[test]
    fn test_eval_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = ActivityCatalog::default();
        let evaluator = Evaluator::new(&catalog, dir.path());
        let loader = GraphDataLoader::new(dataset(7), 3).unwrap();
        let mut model = model();
        let a = evaluator.evaluate(&mut model, &loader, EvalSplit::Test).unwrap();
        let b = evaluator.evaluate(&mut model, &loader, EvalSplit::Test).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_embeddings_in_loader_order() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = ActivityCatalog::default();
        let evaluator = Evaluator::new(&catalog, dir.path());
        let loader = GraphDataLoader::new(dataset(5), 2).unwrap();
        let mut model = model();

        let (report, table) = evaluator
            .evaluate_with_embeddings(&mut model, &loader, EvalSplit::Test)
            .unwrap();
        assert_eq!(table.len(), report.total);
        assert_eq!(table.width(), 8);
        assert_eq!(table.labels(), &[0, 1, 2, 0, 1]);

        let path = dir.path().join("houseA").join("raw_graph_embeddings.csv");
        table.write_csv(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next().unwrap(), "0,1,2,3,4,5,6,7,activity");
        assert_eq!(lines.count(), 5);
    }

    #[test]
    fn test_empty_loader_gives_zero_report() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = ActivityCatalog::default();
        let evaluator = Evaluator::new(&catalog, dir.path());
        let loader = GraphDataLoader::new(dataset(0), 4).unwrap();
        let report = evaluator
            .evaluate(&mut model(), &loader, EvalSplit::Val)
            .unwrap();
        assert_eq!(report.total, 0);
        assert_eq!(report.loss, 0.0);
        assert_eq!(report.accuracy, 0.0);
        assert_eq!(report.macro_f1, 0.0);
        assert!(report.per_class_accuracy.is_empty());
    }
}
