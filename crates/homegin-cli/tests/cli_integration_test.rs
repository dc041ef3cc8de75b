//! End-to-end integration tests for the homegin CLI.
//!
//! These tests invoke the binary on synthetic house CSVs written to a
//! temporary directory.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use assert_cmd::Command;
use predicates::prelude::*;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// Get a Command for the homegin binary
fn homegin_cmd() -> Command {
    Command::cargo_bin("homegin").unwrap()
}

/// Writes one binarised house with two sensors.
fn write_house(data_dir: &Path, house: &str, rows: usize) {
    let dir = data_dir.join(house);
    fs::create_dir_all(&dir).unwrap();
    let activities = ["eating", "watchTV", "Sleeping"];

    let header = "id,timestamp,activity,time_of_the_day,fridge,tv\n";
    let mut values = String::from(header);
    let mut changes = String::from(header);
    for i in 0..rows {
        let activity = activities[i % activities.len()];
        writeln!(values, "{i},0,{activity},{},{},{}", i % 24, i % 2, (i + 1) % 2).unwrap();
        writeln!(changes, "{i},0,{activity},0,{i},{}", 2 * i).unwrap();
    }
    fs::write(dir.join(format!("ob_{house}.csv")), values).unwrap();
    fs::write(dir.join("ob-house-sensorChangeTime.csv"), changes).unwrap();
    fs::write(
        dir.join("nodes.csv"),
        "Name,Type,place_in_house,Object\n\
         livingroom,1,2,livingroom\n\
         fridge,2,3,fridge\n\
         tv,3,2,tv\n\
         time,5,0,\n",
    )
    .unwrap();
    fs::write(
        dir.join("bidrectional_edges.csv"),
        "Src,Dst\n0,1\n1,0\n0,2\n2,0\n0,3\n3,0\n",
    )
    .unwrap();
}

/// Creates a workspace with two houses and a config naming them.
fn setup() -> TempDir {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    write_house(&data, "houseA", 9);
    write_house(&data, "houseB", 6);
    fs::write(
        temp.path().join("homegin.toml"),
        "[experiment]\n\
         epochs = 4\n\
         batch_size = 4\n\
         num_layers = 2\n\
         hidden_dim = 8\n\
         eval_every = 2\n\
         \n\
         [dataset]\n\
         houses = [\"houseA\", \"houseB\"]\n",
    )
    .unwrap();
    temp
}

// =============================================================================
// Test 1: CLI Help and Version
// =============================================================================

#[test]
fn test_cli_help() {
    homegin_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("inspect"));
}

#[test]
fn test_cli_version() {
    homegin_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("homegin"));
}

// =============================================================================
// Test 2: Build and Inspect
// =============================================================================

#[test]
fn test_build_then_inspect() {
    let temp = setup();

    homegin_cmd()
        .current_dir(temp.path())
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("15 graphs"));
    assert!(temp.path().join("data/all_houses/all_houses_ob.bin").exists());

    let output = homegin_cmd()
        .current_dir(temp.path())
        .args(["inspect", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["total_graphs"], 15);
    assert_eq!(summary["houses"][1]["name"], "houseB");
    assert_eq!(summary["houses"][1]["start"], 9);
    assert_eq!(summary["label_histogram"]["eating"], 5);
    assert_eq!(summary["label_histogram"]["relaxing"], 5);
    assert_eq!(summary["configured_ranges_match"], false);
}

#[test]
fn test_inspect_without_store_fails() {
    let temp = setup();
    homegin_cmd()
        .current_dir(temp.path())
        .arg("inspect")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Graph store not found"));
}

// =============================================================================
// Test 3: Full Run
// =============================================================================

#[test]
fn test_run_writes_results() {
    let temp = setup();

    homegin_cmd()
        .current_dir(temp.path())
        .args([
            "--quiet",
            "run",
            "--derive-ranges",
            "--device",
            "cuda:0",
            "--output-dir",
            "out",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("houseA"))
        .stdout(predicate::str::contains("Mean accuracy"));

    let results = fs::read_to_string(temp.path().join("logs/graph_classification/ob.json")).unwrap();
    let results: serde_json::Value = serde_json::from_str(&results).unwrap();
    assert_eq!(results["results"].as_array().unwrap().len(), 2);
    assert_eq!(results["results"][0]["house"], "houseA");
    assert!(temp.path().join("out/test_confusion_matrix.npy").exists());
    assert!(temp.path().join("data/houseB/ob_graph_embeddings.csv").exists());
}

#[test]
fn test_run_with_published_ranges_fails_on_small_data() {
    let temp = setup();
    homegin_cmd()
        .current_dir(temp.path())
        .args(["run", "--house", "houseA"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_invalid_run_config_is_rejected() {
    homegin_cmd()
        .args(["build", "--run-config", "cooked"])
        .assert()
        .failure();
}

#[test]
fn test_explicit_config_file_must_exist() {
    let temp = TempDir::new().unwrap();
    homegin_cmd()
        .current_dir(temp.path())
        .args(["--config", "missing.toml", "build"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}
