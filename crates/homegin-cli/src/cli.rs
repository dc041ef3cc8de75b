//! CLI - Command Line Interface Definitions
//!
//! Defines the CLI structure using clap derive macros.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use homegin_data::RunConfig;
use homegin_nn::Aggregation;

// =============================================================================
// Main CLI Structure
// =============================================================================

/// homegin - GIN activity recognition on smart-home sensor graphs
#[derive(Parser, Debug)]
#[command(
    name = "homegin",
    author = "AutomataNexus Development Team",
    version,
    about = "Leave-one-house-out GIN activity classification for smart-home sensor graphs",
    long_about = "Builds one graph per sensor-log row for every house, trains a Graph Isomorphism \
                  Network on all houses but one and evaluates it on the held-out house.\n\n\
                  Settings are read from homegin.toml (or --config) and overridden by flags."
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the leave-one-house-out experiment
    Run(RunArgs),

    /// Build (or rebuild) the graph store only
    Build(BuildArgs),

    /// Print a summary of the graph store
    Inspect(InspectArgs),
}

// =============================================================================
// Shared Arguments
// =============================================================================

/// Directory layout overrides
#[derive(Args, Debug, Clone, Default)]
pub struct LayoutArgs {
    /// Directory with one sub-directory per house
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Directory receiving results files
    #[arg(long)]
    pub logs_dir: Option<PathBuf>,

    /// Directory receiving confusion matrices and the checkpoint
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Second directory receiving embedding exports
    #[arg(long)]
    pub embedding_mirror_dir: Option<PathBuf>,
}

// =============================================================================
// Run Command
// =============================================================================

/// Arguments for the `run` command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Dataset variant (raw, ob)
    #[arg(long, default_value = "ob")]
    pub run_config: RunConfig,

    /// House to hold out; repeatable (default: every configured house)
    #[arg(long = "house")]
    pub houses: Vec<String>,

    /// House used for validation when it is not the target; repeatable
    #[arg(long = "validation-house")]
    pub validation_houses: Vec<String>,

    /// Device to train on (accepted for compatibility, always CPU)
    #[arg(long, default_value = "cpu")]
    pub device: String,

    /// Disable CUDA (accepted for compatibility)
    #[arg(long)]
    pub disable_cuda: bool,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Learning rate
    #[arg(long)]
    pub lr: Option<f32>,

    /// Maximum number of epochs
    #[arg(long)]
    pub epochs: Option<usize>,

    /// GIN layers, input layer included
    #[arg(long)]
    pub num_layers: Option<usize>,

    /// Layers per GIN MLP
    #[arg(long)]
    pub num_mlp_layers: Option<usize>,

    /// Hidden width
    #[arg(long)]
    pub hidden_dim: Option<usize>,

    /// Graphs per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Dropout on the prediction heads
    #[arg(long)]
    pub final_dropout: Option<f32>,

    /// Learn the GIN epsilon
    #[arg(long)]
    pub learn_eps: bool,

    /// Graph readout (sum, mean, max)
    #[arg(long)]
    pub graph_pooling: Option<Aggregation>,

    /// Neighbour aggregation (sum, mean, max)
    #[arg(long)]
    pub neighbor_pooling: Option<Aggregation>,

    /// Fold index, recorded with the results
    #[arg(long)]
    pub fold_idx: Option<usize>,

    /// Export test embeddings (true, false)
    #[arg(long, action = ArgAction::Set)]
    pub save_embeddings: Option<bool>,

    /// Evaluations without improvement before stopping
    #[arg(long)]
    pub patience: Option<usize>,

    /// Shuffle training batches every epoch
    #[arg(long)]
    pub shuffle: bool,

    /// Loader workers (0 fetches batches on the calling thread)
    #[arg(long)]
    pub num_workers: Option<usize>,

    /// Derive house ranges from the stored sample counts
    #[arg(long)]
    pub derive_ranges: bool,

    /// Rebuild the graph store even if it exists
    #[arg(long)]
    pub rebuild: bool,

    #[command(flatten)]
    pub layout: LayoutArgs,
}

// =============================================================================
// Build Command
// =============================================================================

/// Arguments for the `build` command
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Dataset variant (raw, ob)
    #[arg(long, default_value = "ob")]
    pub run_config: RunConfig,

    /// Rebuild even if the store exists
    #[arg(short, long)]
    pub force: bool,

    #[command(flatten)]
    pub layout: LayoutArgs,
}

// =============================================================================
// Inspect Command
// =============================================================================

/// Arguments for the `inspect` command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Dataset variant (raw, ob)
    #[arg(long, default_value = "ob")]
    pub run_config: RunConfig,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub layout: LayoutArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "homegin",
            "run",
            "--run-config",
            "raw",
            "--house",
            "houseA",
            "--house",
            "houseB",
            "--graph-pooling",
            "mean",
            "--save-embeddings",
            "false",
            "--epochs",
            "5",
            "--data-dir",
            "/tmp/data",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.run_config, RunConfig::Raw);
        assert_eq!(args.houses, vec!["houseA", "houseB"]);
        assert_eq!(args.graph_pooling, Some(Aggregation::Mean));
        assert_eq!(args.save_embeddings, Some(false));
        assert_eq!(args.epochs, Some(5));
        assert_eq!(args.layout.data_dir, Some(PathBuf::from("/tmp/data")));
    }

    #[test]
    fn test_rejects_unknown_run_config() {
        assert!(Cli::try_parse_from(["homegin", "build", "--run-config", "xyz"]).is_err());
    }
}
