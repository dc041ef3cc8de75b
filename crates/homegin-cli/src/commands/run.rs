//! Run - Leave-One-House-Out Experiment Command
//!
//! Loads (or builds) the graph store, then trains and tests one model per
//! held-out house, printing each house's result as it finishes.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::path::Path;
use std::time::Instant;

use homegin::{ExperimentConfig, HouseExperiment, HouseResult};
use tracing::info;

use super::utils::{
    load_or_build_store, percent, print_header, print_info, print_kv, print_step, print_success,
    print_warning,
};
use crate::cli::RunArgs;
use crate::config::ProjectConfig;
use crate::error::{CliError, CliResult};

// =============================================================================
// Execute Command
// =============================================================================

/// Execute the `run` command
pub fn execute(args: RunArgs, config_path: Option<&Path>) -> CliResult<()> {
    print_header("homegin Leave-One-House-Out");

    let mut project = ProjectConfig::resolve(config_path)?;
    project.apply_layout(&args.layout);
    apply_overrides(&mut project.experiment, &args);
    project.experiment.validate()?;

    report_device(&args);
    let houses = if args.houses.is_empty() {
        project.dataset.houses.clone()
    } else {
        args.houses.clone()
    };
    if houses.is_empty() {
        return Err(CliError::InvalidArgument("no houses to evaluate".to_string()));
    }
    print_training_info(&project.experiment, &args, &houses);

    let store = load_or_build_store(&project, args.run_config, args.rebuild)?;
    let experiment = HouseExperiment::from_store(
        &project.experiment,
        &project.layout,
        &project.dataset,
        store,
        args.derive_ranges,
    )?;

    println!();
    let start = Instant::now();
    let total = houses.len();
    let mut step = 0;
    let results = experiment.run_all_observed(&houses, |result| {
        step += 1;
        print_house_result(step, total, result);
    })?;

    print_header("Summary");
    let n = results.results.len() as f32;
    let mean_acc = results.results.iter().map(|r| r.accuracy).sum::<f32>() / n;
    let mean_f1 = results.results.iter().map(|r| r.f1_score).sum::<f32>() / n;
    print_kv("Mean accuracy", &percent(mean_acc));
    print_kv("Mean macro-F1", &format!("{mean_f1:.4}"));
    print_kv(
        "Results",
        &project
            .layout
            .results_path(args.run_config)
            .display()
            .to_string(),
    );
    println!();
    print_success(&format!(
        "Experiment completed in {:.2}s",
        start.elapsed().as_secs_f64()
    ));
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

/// Applies command-line hyperparameters on top of the file configuration.
fn apply_overrides(config: &mut ExperimentConfig, args: &RunArgs) {
    macro_rules! set {
        ($($field:ident),*) => {
            $(if let Some(value) = args.$field {
                config.$field = value;
            })*
        };
    }
    set!(
        seed,
        lr,
        epochs,
        num_layers,
        num_mlp_layers,
        hidden_dim,
        batch_size,
        final_dropout,
        graph_pooling,
        neighbor_pooling,
        fold_idx,
        save_embeddings,
        patience,
        num_workers
    );
    if args.learn_eps {
        config.learn_eps = true;
    }
    if args.shuffle {
        config.shuffle = true;
    }
    if !args.validation_houses.is_empty() {
        config.validation_houses.clone_from(&args.validation_houses);
    }
}

fn report_device(args: &RunArgs) {
    let requested = args.device.to_lowercase();
    info!(device = %requested, disable_cuda = args.disable_cuda, "computation runs on the CPU");
    if requested != "cpu" && !args.disable_cuda {
        print_warning(&format!("Device '{requested}' requested; running on the CPU"));
    }
}

fn print_training_info(config: &ExperimentConfig, args: &RunArgs, houses: &[String]) {
    print_kv("Run config", args.run_config.as_str());
    print_kv("Houses", &houses.join(", "));
    print_kv("Epochs", &config.epochs.to_string());
    print_kv("Batch size", &config.batch_size.to_string());
    print_kv("Learning rate", &config.lr.to_string());
    print_kv(
        "Model",
        &format!(
            "GIN {} layers, {} MLP layers, hidden {}, {}/{} pooling",
            config.num_layers,
            config.num_mlp_layers,
            config.hidden_dim,
            config.graph_pooling,
            config.neighbor_pooling
        ),
    );
    print_kv("Seed", &config.seed.to_string());
    print_kv("Fold", &config.fold_idx.to_string());
    println!();
}

fn print_house_result(step: usize, total: usize, result: &HouseResult) {
    print_step(step, total, &result.house);
    print_kv("Accuracy", &percent(result.accuracy));
    print_kv("Macro-F1", &format!("{:.4}", result.f1_score));
    print_kv(
        "Epochs",
        &format!(
            "{}{}",
            result.epochs_run,
            if result.early_stopped {
                " (early stopped)"
            } else {
                ""
            }
        ),
    );
    if result.test_graphs == 0 {
        print_info("The held-out house has no graphs");
    }
}
