//! Experiment - Leave-One-House-Out Driver
//!
//! Trains one model per target house: the target house is the test set,
//! the configured validation houses (minus the target) form the validation
//! set, and every other graph trains. After training, the best checkpoint
//! is reloaded into a fresh model for the final test evaluation.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use homegin_core::{Error, Result};
use homegin_data::{
    Dataset, DatasetConfig, DatasetSplit, GraphDataLoader, GraphDataset, GraphStore,
    HouseRanges, RunConfig, SubsetDataset, FEATURE_DIM,
};
use homegin_nn::{Aggregation, GinConfig, GIN};
use homegin_optim::{Adam, StepLR};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::early_stopping::{Checkpointer, FileCheckpointer};
use crate::evaluate::{EvalSplit, Evaluator};
use crate::trainer::{SplitLoaders, Trainer};

// =============================================================================
// ExperimentConfig
// =============================================================================

/// Hyperparameters of one leave-one-house-out run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Maximum number of training epochs.
    pub epochs: usize,
    /// Graphs per batch.
    pub batch_size: usize,
    /// Initial Adam learning rate.
    pub lr: f32,
    /// GIN layers, input layer included.
    pub num_layers: usize,
    /// Layers of each GIN MLP.
    pub num_mlp_layers: usize,
    /// Hidden width.
    pub hidden_dim: usize,
    /// Per-node input features.
    pub input_features: usize,
    /// Output classes.
    pub num_classes: usize,
    /// Dropout on the prediction heads.
    pub final_dropout: f32,
    /// Learn the GIN epsilon.
    pub learn_eps: bool,
    /// Graph readout.
    pub graph_pooling: Aggregation,
    /// Neighbour aggregation.
    pub neighbor_pooling: Aggregation,
    /// Seed for weight init, dropout and shuffling.
    pub seed: u64,
    /// Recorded with the results; no fold split is derived from it.
    pub fold_idx: usize,
    /// Evaluate every n-th epoch.
    pub eval_every: usize,
    /// Evaluations without improvement before stopping.
    pub patience: usize,
    /// Epochs between learning-rate decays.
    pub lr_step_size: usize,
    /// Learning-rate decay factor.
    pub lr_gamma: f32,
    /// Shuffle the training loader every epoch.
    pub shuffle: bool,
    /// Loader workers; above zero, batch samples are fetched on the rayon pool.
    pub num_workers: usize,
    /// Export test embeddings after the final evaluation.
    pub save_embeddings: bool,
    /// Houses held out for validation when they are not the target.
    pub validation_houses: Vec<String>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            epochs: 350,
            batch_size: 32,
            lr: 0.01,
            num_layers: 5,
            num_mlp_layers: 2,
            hidden_dim: 64,
            input_features: FEATURE_DIM,
            num_classes: 15,
            final_dropout: 0.5,
            learn_eps: false,
            graph_pooling: Aggregation::Sum,
            neighbor_pooling: Aggregation::Sum,
            seed: 0,
            fold_idx: 0,
            eval_every: 10,
            patience: 15,
            lr_step_size: 50,
            lr_gamma: 0.5,
            shuffle: false,
            num_workers: 0,
            save_embeddings: true,
            validation_houses: Vec::new(),
        }
    }
}

impl ExperimentConfig {
    /// Model configuration implied by these hyperparameters.
    pub fn gin_config(&self) -> GinConfig {
        GinConfig {
            num_layers: self.num_layers,
            num_mlp_layers: self.num_mlp_layers,
            input_dim: self.input_features,
            hidden_dim: self.hidden_dim,
            output_dim: self.num_classes,
            final_dropout: self.final_dropout,
            learn_eps: self.learn_eps,
            graph_pooling: self.graph_pooling,
            neighbor_pooling: self.neighbor_pooling,
        }
    }

    /// Rejects values the trainer cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::invalid_operation(msg));
        if self.batch_size == 0 {
            return invalid("batch_size must be positive".into());
        }
        if self.eval_every == 0 {
            return invalid("eval_every must be positive".into());
        }
        if self.lr_step_size == 0 {
            return invalid("lr_step_size must be positive".into());
        }
        if !(self.lr >= 0.0 && self.lr.is_finite()) {
            return invalid(format!("learning rate {} must be a non-negative number", self.lr));
        }
        if !(0.0..1.0).contains(&self.final_dropout) {
            return invalid(format!("final_dropout {} must be in [0, 1)", self.final_dropout));
        }
        if self.input_features != FEATURE_DIM {
            return invalid(format!(
                "input_features is {}, graphs carry {FEATURE_DIM} features per node",
                self.input_features
            ));
        }
        Ok(())
    }
}

// =============================================================================
// DataLayout
// =============================================================================

/// Where inputs are read and outputs written.
///
/// Embeddings always go to `<data>/<house>/`. The second copy is written
/// only when `embedding_mirror_dir` is set; it is unset by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataLayout {
    /// One sub-directory per house plus `all_houses/`.
    pub data_dir: PathBuf,
    /// Results files.
    pub logs_dir: PathBuf,
    /// Confusion matrices and the checkpoint.
    pub output_dir: PathBuf,
    /// Second destination for embedding exports, `None` to skip it.
    pub embedding_mirror_dir: Option<PathBuf>,
}

impl Default for DataLayout {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            logs_dir: PathBuf::from("logs"),
            output_dir: PathBuf::from("."),
            embedding_mirror_dir: None,
        }
    }
}

impl DataLayout {
    /// `<logs>/graph_classification/<run>.json`.
    pub fn results_path(&self, run: RunConfig) -> PathBuf {
        self.logs_dir
            .join("graph_classification")
            .join(format!("{run}.json"))
    }

    /// Graph store of `run`.
    pub fn store_path(&self, run: RunConfig) -> PathBuf {
        run.store_path(&self.data_dir)
    }

    /// Every destination of the embeddings of `house`.
    pub fn embedding_paths(&self, house: &str, run: RunConfig) -> Vec<PathBuf> {
        let file = run.embeddings_file_name();
        let mut paths = vec![self.data_dir.join(house).join(&file)];
        if let Some(mirror) = &self.embedding_mirror_dir {
            paths.push(mirror.join(house).join(&file));
        }
        paths
    }
}

// =============================================================================
// Results
// =============================================================================

/// Final test metrics of one held-out house.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseResult {
    /// Held-out house.
    pub house: String,
    /// Test accuracy.
    pub accuracy: f32,
    /// Test macro-F1.
    pub f1_score: f32,
    /// Test accuracy per class present in the house.
    pub test_per_class_accuracy: BTreeMap<String, f32>,
    /// Sample-weighted test loss.
    pub test_loss: f32,
    /// Epochs trained.
    pub epochs_run: usize,
    /// Whether early stopping ended training.
    pub early_stopped: bool,
    /// Best validation score seen.
    pub best_score: Option<f32>,
    /// Test graphs.
    pub test_graphs: usize,
}

/// Contents of a results file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsFile {
    /// Dataset variant.
    pub run_config: RunConfig,
    /// Hyperparameters used.
    pub experiment: ExperimentConfig,
    /// One entry per completed house, in run order.
    pub results: Vec<HouseResult>,
}

impl ResultsFile {
    /// Writes pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self).map_err(Error::serialization)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads a results file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(Error::serialization)
    }
}

// =============================================================================
// HouseExperiment
// =============================================================================

type HouseLoader = GraphDataLoader<SubsetDataset<GraphDataset>>;

/// Leave-one-house-out runs over one graph store.
pub struct HouseExperiment<'a> {
    config: &'a ExperimentConfig,
    layout: &'a DataLayout,
    dataset_config: &'a DatasetConfig,
    run: RunConfig,
    dataset: Arc<GraphDataset>,
    ranges: HouseRanges,
}

impl<'a> HouseExperiment<'a> {
    /// Creates a driver over `dataset`, split with `ranges`.
    pub fn new(
        config: &'a ExperimentConfig,
        layout: &'a DataLayout,
        dataset_config: &'a DatasetConfig,
        run: RunConfig,
        dataset: Arc<GraphDataset>,
        ranges: HouseRanges,
    ) -> Result<Self> {
        config.validate()?;
        if config.num_classes != dataset_config.num_classes() {
            return Err(Error::invalid_operation(format!(
                "num_classes is {}, the activity catalog has {}",
                config.num_classes,
                dataset_config.num_classes()
            )));
        }
        ranges.validate(dataset.len())?;
        Ok(Self {
            config,
            layout,
            dataset_config,
            run,
            dataset,
            ranges,
        })
    }

    /// Creates a driver over a graph store.
    ///
    /// With `derive_ranges` the house ranges come from the stored sample
    /// counts instead of the dataset configuration.
    pub fn from_store(
        config: &'a ExperimentConfig,
        layout: &'a DataLayout,
        dataset_config: &'a DatasetConfig,
        store: GraphStore,
        derive_ranges: bool,
    ) -> Result<Self> {
        let run = store.run_config();
        let ranges = if derive_ranges {
            store.derived_ranges()
        } else {
            dataset_config.house_ranges(run)
        };
        let dataset = Arc::new(store.into_dataset());
        Self::new(config, layout, dataset_config, run, dataset, ranges)
    }

    /// House ranges used for splitting.
    pub fn ranges(&self) -> &HouseRanges {
        &self.ranges
    }

    /// Dataset variant.
    pub fn run_config(&self) -> RunConfig {
        self.run
    }

    fn loader(&self, indices: Vec<usize>, shuffle: bool) -> Result<HouseLoader> {
        let subset = SubsetDataset::new(Arc::clone(&self.dataset), indices)?;
        Ok(GraphDataLoader::new(subset, self.config.batch_size)?
            .shuffle(shuffle, self.config.seed)
            .num_workers(self.config.num_workers))
    }

    /// Trains with `target` held out and evaluates the best checkpoint on it.
    pub fn run(&self, target: &str) -> Result<HouseResult> {
        let start = Instant::now();
        let split = DatasetSplit::leave_one_house_out(
            &self.ranges,
            target,
            &self.config.validation_houses,
            self.dataset.len(),
        )?;
        info!(
            house = target,
            run_config = %self.run,
            fold_idx = self.config.fold_idx,
            train = split.train.len(),
            valid = split.valid.len(),
            test = split.test.len(),
            "leave-one-house-out run"
        );
        let loaders = SplitLoaders {
            train: self.loader(split.train, self.config.shuffle)?,
            valid: self.loader(split.valid, false)?,
            test: self.loader(split.test, false)?,
        };

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let gin_config = self.config.gin_config();
        let mut model = GIN::new(gin_config.clone(), &mut rng)?;
        let mut optimizer = Adam::new(model.parameters(), self.config.lr);
        let mut scheduler = StepLR::new(&optimizer, self.config.lr_step_size, self.config.lr_gamma);

        fs::create_dir_all(&self.layout.output_dir)?;
        let mut checkpointer = FileCheckpointer::in_dir(&self.layout.output_dir);
        checkpointer.clear()?;
        let evaluator = Evaluator::new(&self.dataset_config.activities, &self.layout.output_dir);

        let mut trainer = Trainer::new(self.config.epochs, self.config.eval_every, self.config.patience)?;
        let history = trainer.fit(
            &mut model,
            &mut optimizer,
            &mut scheduler,
            &loaders,
            &evaluator,
            &mut checkpointer,
        )?;

        let mut model = GIN::new(gin_config, &mut rng)?;
        match checkpointer.load()? {
            Some(state) => model.load_state_dict(&state)?,
            None => warn!(
                house = target,
                path = %checkpointer.path().display(),
                "no checkpoint saved, evaluating an untrained model"
            ),
        }

        let (report, embeddings) =
            evaluator.evaluate_with_embeddings(&mut model, &loaders.test, EvalSplit::Test)?;
        if self.config.save_embeddings {
            for path in self.layout.embedding_paths(target, self.run) {
                embeddings.write_csv(&path)?;
                info!(house = target, path = %path.display(), rows = embeddings.len(), "embeddings exported");
            }
        }

        info!(
            house = target,
            accuracy = report.accuracy,
            f1 = report.macro_f1,
            epochs = history.epochs_completed,
            elapsed_secs = start.elapsed().as_secs_f64(),
            "house finished"
        );
        Ok(HouseResult {
            house: target.to_string(),
            accuracy: report.accuracy,
            f1_score: report.macro_f1,
            test_per_class_accuracy: report.per_class_accuracy,
            test_loss: report.loss,
            epochs_run: history.epochs_completed,
            early_stopped: history.early_stopped,
            best_score: history.best_score,
            test_graphs: report.total,
        })
    }

    /// Runs every house in order, rewriting the results file after each one.
    pub fn run_all<S: AsRef<str>>(&self, houses: &[S]) -> Result<ResultsFile> {
        self.run_all_observed(houses, |_| {})
    }

    /// Like [`HouseExperiment::run_all`], calling `on_result` after each house.
    pub fn run_all_observed<S, F>(&self, houses: &[S], mut on_result: F) -> Result<ResultsFile>
    where
        S: AsRef<str>,
        F: FnMut(&HouseResult),
    {
        let path = self.layout.results_path(self.run);
        let mut file = ResultsFile {
            run_config: self.run,
            experiment: self.config.clone(),
            results: Vec::with_capacity(houses.len()),
        };
        for house in houses {
            let result = self.run(house.as_ref())?;
            on_result(&result);
            file.results.push(result);
            file.save(&path)?;
        }
        info!(path = %path.display(), houses = file.results.len(), "results written");
        Ok(file)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use homegin_data::{GraphTopology, HouseRange, SensorGraph};

    fn dataset(n: usize) -> Arc<GraphDataset> {
        let topology = Arc::new(GraphTopology::new(2, vec![0, 1], vec![1, 0]).unwrap());
        let graphs = (0..n)
            .map(|i| {
                let c = (i % 3) as f32;
                SensorGraph::new(topology.clone(), vec![[c, 1.0, 0.0, 2.0 * c], [1.0, c, 3.0, -1.0]])
                    .unwrap()
            })
            .collect();
        Arc::new(GraphDataset::new(graphs, (0..n).map(|i| i % 3).collect()).unwrap())
    }

    fn small_config() -> ExperimentConfig {
        ExperimentConfig {
            epochs: 4,
            batch_size: 4,
            num_layers: 2,
            hidden_dim: 8,
            eval_every: 2,
            ..ExperimentConfig::default()
        }
    }

    fn ranges() -> HouseRanges {
        HouseRanges::new(vec![
            HouseRange::new("houseA", 0..6),
            HouseRange::new("houseB", 6..10),
        ])
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = ExperimentConfig::default();
        assert_eq!(config.epochs, 350);
        assert_eq!(config.batch_size, 32);
        assert!((config.lr - 0.01).abs() < 1e-9);
        assert_eq!(config.patience, 15);
        assert_eq!(config.eval_every, 10);
        assert!(config.save_embeddings);
        assert!(config.validate().is_ok());

        let gin = config.gin_config();
        assert_eq!(gin.num_layers, 5);
        assert_eq!(gin.output_dim, 15);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = ExperimentConfig::default;
        let bad = [
            ExperimentConfig {
                batch_size: 0,
                ..base()
            },
            ExperimentConfig {
                final_dropout: 1.0,
                ..base()
            },
            ExperimentConfig {
                input_features: 3,
                ..base()
            },
            ExperimentConfig {
                lr: -0.1,
                ..base()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: ExperimentConfig =
            serde_json::from_str(r#"{"epochs": 20, "graph_pooling": "mean"}"#).unwrap();
        assert_eq!(config.epochs, 20);
        assert_eq!(config.graph_pooling, Aggregation::Mean);
        assert_eq!(config.hidden_dim, 64);
    }

    #[test]
    fn test_layout_paths() {
        let layout = DataLayout {
            embedding_mirror_dir: Some(PathBuf::from("mirror")),
            ..DataLayout::default()
        };
        assert_eq!(
            layout.results_path(RunConfig::Ob),
            PathBuf::from("logs/graph_classification/ob.json")
        );
        assert_eq!(
            layout.embedding_paths("houseA", RunConfig::Raw),
            vec![
                PathBuf::from("data/houseA/raw_graph_embeddings.csv"),
                PathBuf::from("mirror/houseA/raw_graph_embeddings.csv"),
            ]
        );
        assert_eq!(
            DataLayout::default().embedding_paths("houseA", RunConfig::Ob),
            vec![PathBuf::from("data/houseA/ob_graph_embeddings.csv")]
        );
    }

    #[test]
    fn test_ranges_must_cover_dataset() {
        let config = small_config();
        let layout = DataLayout::default();
        let dataset_config = DatasetConfig::default();
        let result = HouseExperiment::new(
            &config,
            &layout,
            &dataset_config,
            RunConfig::Ob,
            dataset(12),
            ranges(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_run_all_writes_results_after_each_house() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config();
        let layout = DataLayout {
            data_dir: dir.path().join("data"),
            logs_dir: dir.path().join("logs"),
            output_dir: dir.path().join("out"),
            embedding_mirror_dir: None,
        };
        let dataset_config = DatasetConfig::default();
        let experiment = HouseExperiment::new(
            &config,
            &layout,
            &dataset_config,
            RunConfig::Ob,
            dataset(10),
            ranges(),
        )
        .unwrap();

        let mut seen = Vec::new();
        let file = experiment
            .run_all_observed(&["houseB", "houseA"], |r| seen.push(r.house.clone()))
            .unwrap();
        assert_eq!(seen, vec!["houseB", "houseA"]);
        assert_eq!(file.results[0].test_graphs, 4);
        assert_eq!(file.results[1].test_graphs, 6);
        assert_eq!(file.results[0].epochs_run, 4);

        let saved = ResultsFile::load(layout.results_path(RunConfig::Ob)).unwrap();
        assert_eq!(saved, file);

        let embeddings = layout.data_dir.join("houseA").join("ob_graph_embeddings.csv");
        let mut reader = csv::Reader::from_path(&embeddings).unwrap();
        assert_eq!(reader.headers().unwrap().len(), 8 + 1);
        assert_eq!(reader.records().count(), 6);
        assert!(layout.output_dir.join(crate::early_stopping::CHECKPOINT_FILE).exists());
    }

    #[test]
    fn test_new_accepts_matching_ranges() {
        let config = small_config();
        let layout = DataLayout::default();
        let dataset_config = DatasetConfig::default();
        let experiment = HouseExperiment::new(
            &config,
            &layout,
            &dataset_config,
            RunConfig::Ob,
            dataset(10),
            ranges(),
        )
        .unwrap();
        assert_eq!(experiment.ranges().total(), 10);
        assert_eq!(experiment.run_config(), RunConfig::Ob);
    }

    #[test]
    fn test_loader_workers_do_not_change_results() {
        let dataset_config = DatasetConfig::default();
        let run_with = |num_workers: usize| {
            let dir = tempfile::tempdir().unwrap();
            let config = ExperimentConfig {
                num_workers,
                save_embeddings: false,
                ..small_config()
            };
            let layout = DataLayout {
                data_dir: dir.path().join("data"),
                logs_dir: dir.path().join("logs"),
                output_dir: dir.path().join("out"),
                embedding_mirror_dir: None,
            };
            let experiment = HouseExperiment::new(
                &config,
                &layout,
                &dataset_config,
                RunConfig::Ob,
                dataset(10),
                ranges(),
            )
            .unwrap();
            experiment.run("houseB").unwrap()
        };
        assert_eq!(run_with(0), run_with(2));
    }

    #[test]
    fn test_unknown_house_is_an_error() {
        let config = small_config();
        let layout = DataLayout::default();
        let dataset_config = DatasetConfig::default();
        let experiment = HouseExperiment::new(
            &config,
            &layout,
            &dataset_config,
            RunConfig::Ob,
            dataset(10),
            ranges(),
        )
        .unwrap();
        assert!(experiment.run("houseZ").is_err());
    }
}
