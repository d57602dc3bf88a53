//! End-to-end runs of the `operations` subcommand against small JSON fixtures.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

/// Two-bus base case with an extendable generator and line; capacities unset.
const UNPREPARED: &str = r#"{
  "version": "1.0",
  "name": "base",
  "buses": {
    "1": { "name": "north", "v_nom": 380.0 },
    "2": { "name": "south", "v_nom": 380.0 }
  },
  "lines": {
    "1": { "bus0": 1, "bus1": 2, "r": 0.01, "x": 0.1, "s_nom": 0.0, "s_nom_extendable": true }
  },
  "generators": {
    "1": { "bus": 1, "carrier": "wind", "p_nom": 0.0, "p_nom_extendable": true, "marginal_cost": 5.0 },
    "2": { "bus": 2, "carrier": "gas", "p_nom": 100.0, "marginal_cost": 50.0 }
  },
  "loads": {
    "1": { "bus": 2, "p_set": 80.0 }
  }
}"#;

/// The same network after a planning run sized the wind farm and the line.
const OPTIMIZED: &str = r#"{
  "version": "1.0",
  "name": "solved",
  "buses": {
    "1": { "name": "north", "v_nom": 380.0 },
    "2": { "name": "south", "v_nom": 380.0 }
  },
  "lines": {
    "1": { "bus0": 1, "bus1": 2, "r": 0.008, "x": 0.08, "s_nom": 200.0, "s_nom_opt": 200.0 }
  },
  "generators": {
    "1": { "bus": 1, "carrier": "wind", "p_nom": 120.0, "p_nom_opt": 120.0, "marginal_cost": 5.0 },
    "2": { "bus": 2, "carrier": "gas", "p_nom": 100.0, "marginal_cost": 50.0 }
  },
  "loads": {
    "1": { "bus": 2, "p_set": 80.0 }
  }
}"#;

fn write_fixtures(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let unprepared = dir.join("base.json");
    let optimized = dir.join("solved.json");
    fs::write(&unprepared, UNPREPARED).unwrap();
    fs::write(&optimized, OPTIMIZED).unwrap();
    (unprepared, optimized)
}

#[test]
fn dispatches_against_transferred_capacities() {
    let dir = tempfile::tempdir().unwrap();
    let (unprepared, optimized) = write_fixtures(dir.path());
    let out = dir.path().join("operations.json");

    Command::cargo_bin("gridop")
        .unwrap()
        .arg("operations")
        .arg("--unprepared")
        .arg(&unprepared)
        .arg("--optimized")
        .arg(&optimized)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();

    // Capacities came from the planning run and are frozen
    let gen = &written["generators"]["1"];
    assert_eq!(gen["p_nom"], 120.0);
    assert_eq!(gen["p_nom_extendable"], false);
    let line = &written["lines"]["1"];
    assert_eq!(line["s_nom"], 200.0);
    assert_eq!(line["x"], 0.08);
    assert_eq!(line["s_nom_extendable"], false);

    // Cheap wind covers the whole load over the transferred line
    let wind_p = gen["p"].as_f64().unwrap();
    assert!((wind_p - 80.0).abs() < 1e-4, "wind dispatch was {wind_p}");
    let gas_p = written["generators"]["2"]["p"].as_f64().unwrap();
    assert!(gas_p.abs() < 1e-4, "gas dispatch was {gas_p}");
}

#[test]
fn leaves_a_run_manifest_next_to_the_output() {
    let dir = tempfile::tempdir().unwrap();
    let (unprepared, optimized) = write_fixtures(dir.path());
    let out = dir.path().join("operations.json");

    Command::cargo_bin("gridop")
        .unwrap()
        .arg("operations")
        .arg("--unprepared")
        .arg(&unprepared)
        .arg("--optimized")
        .arg(&optimized)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let manifest = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .find(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("run-"))
        })
        .expect("run manifest written");

    let record: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(manifest).unwrap()).unwrap();
    assert_eq!(record["command"], "operations");
    assert_eq!(record["status"], "success");
}

#[test]
fn writes_logs_to_the_requested_file() {
    let dir = tempfile::tempdir().unwrap();
    let (unprepared, optimized) = write_fixtures(dir.path());
    let out = dir.path().join("operations.json");
    let log = dir.path().join("operations.log");

    Command::cargo_bin("gridop")
        .unwrap()
        .arg("operations")
        .arg("--unprepared")
        .arg(&unprepared)
        .arg("--optimized")
        .arg(&optimized)
        .arg("--out")
        .arg(&out)
        .arg("--log-file")
        .arg(&log)
        .assert()
        .success();

    let contents = fs::read_to_string(&log).unwrap();
    assert!(contents.contains("peak memory usage"));
    assert!(contents.contains("dispatch solved"));
}

#[test]
fn honors_prepare_options_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let (unprepared, optimized) = write_fixtures(dir.path());
    let out = dir.path().join("operations.json");
    let config = dir.path().join("run.toml");
    fs::write(
        &config,
        "[solving.options]\nload_shedding = 10000.0\nnoisy_costs = true\n",
    )
    .unwrap();

    Command::cargo_bin("gridop")
        .unwrap()
        .arg("operations")
        .arg("--unprepared")
        .arg(&unprepared)
        .arg("--optimized")
        .arg(&optimized)
        .arg("--out")
        .arg(&out)
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();

    // Load shedding adds a "load"-carrier generator at each bus with demand
    let shedders: Vec<_> = written["generators"]
        .as_object()
        .unwrap()
        .values()
        .filter(|g| g["carrier"] == "load")
        .collect();
    assert_eq!(shedders.len(), 1);
    assert_eq!(shedders[0]["p_nom"], 80.0);
}

#[test]
fn fails_cleanly_on_a_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let (_, optimized) = write_fixtures(dir.path());
    let out = dir.path().join("operations.json");

    Command::cargo_bin("gridop")
        .unwrap()
        .arg("operations")
        .arg("--unprepared")
        .arg(dir.path().join("does-not-exist.json"))
        .arg("--optimized")
        .arg(&optimized)
        .arg("--out")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist.json"));

    assert!(!out.exists());
}
