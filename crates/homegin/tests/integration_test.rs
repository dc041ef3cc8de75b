//! End-to-end integration test for homegin.
//! Builds graphs from synthetic house CSVs, runs leave-one-house-out
//! training and checks every artefact a real run leaves behind.

use std::fmt::Write as _;
use std::path::Path;

use homegin::prelude::*;

/// Writes one binarised house: a structural room node, three sensors and
/// the time-of-day node. Activities cycle through `activities`.
fn write_ob_house(data_dir: &Path, house: &str, rows: usize, activities: &[&str]) {
    let dir = data_dir.join(house);
    std::fs::create_dir_all(&dir).unwrap();

    let header = "id,timestamp,activity,time_of_the_day,fridge,door,bed\n";
    let mut values = String::from(header);
    let mut changes = String::from(header);
    for i in 0..rows {
        let activity = activities[i % activities.len()];
        let hot = i % activities.len();
        writeln!(
            values,
            "{i},0,{activity},{},{},{},{}",
            (i % 24) as f32,
            u8::from(hot == 0),
            u8::from(hot == 1),
            u8::from(hot == 2),
        )
        .unwrap();
        writeln!(changes, "{i},0,{activity},0,{},{},{}", i, 2 * i, 3 * i).unwrap();
    }
    std::fs::write(dir.join(format!("ob_{house}.csv")), values).unwrap();
    std::fs::write(dir.join("ob-house-sensorChangeTime.csv"), changes).unwrap();
    std::fs::write(
        dir.join("nodes.csv"),
        "Name,Type,place_in_house,Object\n\
         kitchen,1,3,kitchen\n\
         fridge,2,3,fridge\n\
         door,4,1,door\n\
         bed,3,2,bed\n\
         time,5,0,\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("bidrectional_edges.csv"),
        "Src,Dst\n0,1\n1,0\n0,2\n2,0\n0,3\n3,0\n3,4\n4,3\n",
    )
    .unwrap();
}

fn dataset_config() -> DatasetConfig {
    DatasetConfig {
        houses: vec!["houseA".to_string(), "houseB".to_string()],
        ..DatasetConfig::default()
    }
}

/// Test 1: graphs are built, cached and reloaded
#[test]
fn test_graph_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    write_ob_house(&data, "houseA", 9, &["eating", "prepareLunch", "Sleeping"]);
    write_ob_house(&data, "houseB", 6, &["eating", "watchTV"]);

    let config = dataset_config();
    let builder = GraphBuilder::new(&data, RunConfig::Ob, &config);
    let path = RunConfig::Ob.store_path(&data);
    let built = GraphStore::load_or_build(&path, &builder, false).unwrap();
    assert!(path.exists());
    assert_eq!(built.num_graphs(), 15);
    assert_eq!(
        built.house_counts(),
        vec![("houseA".to_string(), 9), ("houseB".to_string(), 6)]
    );

    let loaded = GraphStore::load(&path).unwrap();
    assert_eq!(loaded.num_graphs(), 15);
    assert_eq!(
        loaded.labels().collect::<Vec<_>>(),
        built.labels().collect::<Vec<_>>()
    );

    let ranges = loaded.derived_ranges();
    assert_eq!(ranges.get("houseB").unwrap().indices(), 9..15);
    println!("✓ Graph store round trip works");
}

/// Test 2: a full leave-one-house-out run writes every artefact
#[test]
fn test_leave_one_house_out_run() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    write_ob_house(&data, "houseA", 12, &["eating", "prepareLunch", "Sleeping"]);
    write_ob_house(&data, "houseB", 8, &["eating", "prepareLunch"]);

    let dataset_config = dataset_config();
    let layout = DataLayout {
        data_dir: data.clone(),
        logs_dir: dir.path().join("logs"),
        output_dir: dir.path().join("out"),
        embedding_mirror_dir: Some(dir.path().join("mirror")),
    };
    let config = ExperimentConfig {
        epochs: 20,
        batch_size: 4,
        num_layers: 3,
        hidden_dim: 16,
        eval_every: 5,
        ..ExperimentConfig::default()
    };

    let builder = GraphBuilder::new(&layout.data_dir, RunConfig::Ob, &dataset_config);
    let store = GraphStore::load_or_build(layout.store_path(RunConfig::Ob), &builder, false).unwrap();
    let experiment =
        HouseExperiment::from_store(&config, &layout, &dataset_config, store, true).unwrap();
    let results = experiment.run_all(&dataset_config.houses).unwrap();

    assert_eq!(results.run_config, RunConfig::Ob);
    assert_eq!(results.results.len(), 2);
    for result in &results.results {
        assert!((0.0..=1.0).contains(&result.accuracy));
        assert!((0.0..=1.0).contains(&result.f1_score));
        assert!(result.test_loss.is_finite());
        assert!(result.epochs_run <= 20);
        assert!(result
            .test_per_class_accuracy
            .values()
            .all(|a| (0.0..=1.0).contains(a)));
    }
    assert_eq!(results.results[0].test_graphs, 12);
    assert_eq!(results.results[1].test_graphs, 8);
    assert!(results.results[1]
        .test_per_class_accuracy
        .keys()
        .all(|k| k == "eating" || k == "prepareLunch"));

    let saved = ResultsFile::load(layout.results_path(RunConfig::Ob)).unwrap();
    assert_eq!(saved, results);

    for split in ["train", "val", "test"] {
        let path = layout.output_dir.join(format!("{split}_confusion_matrix.npy"));
        assert!(path.exists(), "{}", path.display());
    }
    assert!(layout.output_dir.join(homegin::CHECKPOINT_FILE).exists());

    for path in layout.embedding_paths("houseB", RunConfig::Ob) {
        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 17);
        assert_eq!(&headers[16], "activity");
        assert_eq!(reader.records().count(), 8);
    }
    println!("✓ Leave-one-house-out run works");
}

/// Test 3: published ranges that do not match the data are rejected
#[test]
fn test_mismatched_ranges_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    write_ob_house(&data, "houseA", 5, &["eating"]);
    write_ob_house(&data, "houseB", 5, &["eating"]);

    let dataset_config = dataset_config();
    let layout = DataLayout {
        data_dir: data.clone(),
        ..DataLayout::default()
    };
    let config = ExperimentConfig::default();
    let store = GraphBuilder::new(&data, RunConfig::Ob, &dataset_config)
        .build()
        .unwrap();
    assert!(HouseExperiment::from_store(&config, &layout, &dataset_config, store, false).is_err());
    println!("✓ Range validation works");
}
