//! Utils - Common Utilities for CLI Commands
//!
//! Shared utility functions used across CLI commands.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use colored::Colorize;
use homegin_data::{GraphBuilder, GraphStore, RunConfig};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::ProjectConfig;
use crate::error::CliResult;

// =============================================================================
// Output Formatting
// =============================================================================

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print a step in a multi-step process
pub fn print_step(step: usize, total: usize, message: &str) {
    println!("{} {}", format!("[{step}/{total}]").cyan().bold(), message);
}

/// Print a header
pub fn print_header(title: &str) {
    println!();
    println!("{}", title.bold().underline());
    println!();
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Format a fraction as a percentage
pub fn percent(value: f32) -> String {
    format!("{:.2}%", value * 100.0)
}

// =============================================================================
// Progress Bars
// =============================================================================

/// Create a progress bar over houses
pub fn house_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}

// =============================================================================
// Graph Store
// =============================================================================

/// Loads the graph store of `run`, building it first when absent or forced.
pub fn load_or_build_store(
    project: &ProjectConfig,
    run: RunConfig,
    force: bool,
) -> CliResult<GraphStore> {
    let path = project.layout.store_path(run);
    let builder = GraphBuilder::new(&project.layout.data_dir, run, &project.dataset);

    if !force && path.exists() {
        print_info(&format!("Loading graph store {}", path.display()));
        return Ok(GraphStore::load_or_build(&path, &builder, false)?);
    }

    print_info(&format!(
        "Building {run} graphs for {} houses",
        project.dataset.houses.len()
    ));
    let pb = house_progress_bar(project.dataset.houses.len() as u64);
    let store = GraphStore::load_or_build_observed(&path, &builder, true, |house| {
        pb.set_message(format!("{} ({} graphs)", house.name, house.len()));
        pb.inc(1);
    });
    pb.finish_and_clear();
    let store = store?;
    print_success(&format!(
        "Graph store written to {} ({} graphs)",
        path.display(),
        store.num_graphs()
    ));
    Ok(store)
}
