//! Inspect - Graph Store Summary Command
//!
//! Prints the run configuration, per-house sample counts and graph sizes,
//! the label histogram and the house ranges derived from the counts.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::collections::BTreeMap;
use std::path::Path;

use homegin_data::{DatasetConfig, GraphStore, RunConfig};
use serde::Serialize;

use super::utils::{print_header, print_info, print_kv, print_success, print_warning};
use crate::cli::InspectArgs;
use crate::config::ProjectConfig;
use crate::error::{CliError, CliResult};

// =============================================================================
// Summary
// =============================================================================

/// One house of the store.
#[derive(Debug, Serialize)]
pub struct HouseSummary {
    /// House name.
    pub name: String,
    /// Graphs of the house.
    pub graphs: usize,
    /// First global index.
    pub start: usize,
    /// One past the last global index.
    pub end: usize,
    /// Nodes per graph.
    pub nodes: usize,
    /// Directed edges per graph.
    pub edges: usize,
}

/// Everything `inspect` reports.
#[derive(Debug, Serialize)]
pub struct StoreSummary {
    /// Dataset variant.
    pub run_config: RunConfig,
    /// Houses in storage order.
    pub houses: Vec<HouseSummary>,
    /// Total graphs.
    pub total_graphs: usize,
    /// Graphs per activity name.
    pub label_histogram: BTreeMap<String, usize>,
    /// Whether the configured ranges match the stored counts.
    pub configured_ranges_match: bool,
}

impl StoreSummary {
    /// Summarises `store` against `dataset`.
    pub fn new(store: &GraphStore, dataset: &DatasetConfig) -> CliResult<Self> {
        let derived = store.derived_ranges();
        let houses = store
            .houses()
            .iter()
            .zip(derived.iter())
            .map(|(house, range)| HouseSummary {
                name: house.name.clone(),
                graphs: house.len(),
                start: range.start,
                end: range.end,
                nodes: house.topology.num_nodes(),
                edges: house.topology.num_edges(),
            })
            .collect();

        let mut label_histogram = BTreeMap::new();
        for (id, count) in store
            .label_histogram(dataset.num_classes())
            .into_iter()
            .enumerate()
        {
            if count > 0 {
                let name = dataset.activities.name_for_id(id)?;
                label_histogram.insert(name.to_string(), count);
            }
        }

        let configured = dataset.house_ranges(store.run_config());
        Ok(Self {
            run_config: store.run_config(),
            houses,
            total_graphs: store.num_graphs(),
            label_histogram,
            configured_ranges_match: configured == derived,
        })
    }
}

// =============================================================================
// Execute Command
// =============================================================================

/// Execute the `inspect` command
pub fn execute(args: InspectArgs, config_path: Option<&Path>) -> CliResult<()> {
    let mut project = ProjectConfig::resolve(config_path)?;
    project.apply_layout(&args.layout);

    let path = project.layout.store_path(args.run_config);
    if !path.exists() {
        return Err(CliError::StoreNotFound(path.display().to_string()));
    }
    let store = GraphStore::load(&path)?;
    let summary = StoreSummary::new(&store, &project.dataset)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_header("homegin Graph Store");
    print_kv("Path", &path.display().to_string());
    print_kv("Run config", summary.run_config.as_str());
    print_kv("Total graphs", &summary.total_graphs.to_string());

    print_header("Houses");
    for house in &summary.houses {
        print_kv(
            &house.name,
            &format!(
                "{} graphs [{}..{}), {} nodes, {} edges",
                house.graphs, house.start, house.end, house.nodes, house.edges
            ),
        );
    }

    print_header("Activities");
    for (name, count) in &summary.label_histogram {
        print_kv(name, &count.to_string());
    }
    println!();

    if summary.configured_ranges_match {
        print_success("Configured house ranges match the stored counts");
    } else {
        print_warning("Configured house ranges differ from the stored counts");
        print_info("Pass --derive-ranges to `homegin run` to split by the stored counts");
    }
    Ok(())
}
