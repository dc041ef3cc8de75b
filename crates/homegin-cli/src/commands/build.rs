//! Build - Graph Store Command
//!
//! Builds the graph store of one run configuration without training.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::path::Path;

use super::utils::{load_or_build_store, print_header, print_kv};
use crate::cli::BuildArgs;
use crate::config::ProjectConfig;
use crate::error::CliResult;

// =============================================================================
// Execute Command
// =============================================================================

/// Execute the `build` command
pub fn execute(args: BuildArgs, config_path: Option<&Path>) -> CliResult<()> {
    print_header("homegin Graph Build");

    let mut project = ProjectConfig::resolve(config_path)?;
    project.apply_layout(&args.layout);
    print_kv("Run config", args.run_config.as_str());
    print_kv("Data dir", &project.layout.data_dir.display().to_string());
    println!();

    let store = load_or_build_store(&project, args.run_config, args.force)?;

    println!();
    for (house, count) in store.house_counts() {
        print_kv(&house, &format!("{count} graphs"));
    }
    print_kv("Total", &format!("{} graphs", store.num_graphs()));
    Ok(())
}
