//! Run manifests for downstream tooling.
//!
//! Every pipeline step leaves a JSON record next to its output so workflow
//! runs can be audited and resumed without consulting logs.

use std::{fs, path::Path, time::Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub command: String,
    pub version: String,
    pub timestamp: String,
    pub status: String,
    pub duration_ms: u128,
    pub outputs: Vec<String>,
    pub params: Vec<Param>,
}

#[derive(Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: String,
}

fn write_record(output: &Path, record: &RunRecord) -> Result<()> {
    let dir = output
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(record)?;
    let path = dir.join(format!("run-{}.json", record.run_id));
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Record a run manifest next to `output`; failures are reported, not fatal.
pub fn record_run(
    output: &Path,
    command: &str,
    params: &[(&str, &str)],
    start: Instant,
    result: &Result<()>,
) {
    let record = RunRecord {
        run_id: Uuid::new_v4().to_string(),
        command: command.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        status: if result.is_ok() { "success" } else { "failure" }.to_string(),
        duration_ms: start.elapsed().as_millis(),
        outputs: vec![output.display().to_string()],
        params: params
            .iter()
            .map(|(k, v)| Param {
                name: k.to_string(),
                value: v.to_string(),
            })
            .collect(),
    };
    if let Err(err) = write_record(output, &record) {
        eprintln!("Failed to record run manifest: {err}");
    }
}

/// Read a previously recorded manifest.
pub fn read_manifest(path: &Path) -> Result<RunRecord> {
    let json = fs::read_to_string(path)?;
    let record = serde_json::from_str(&json)?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("net_op.json");
        let start = Instant::now();
        record_run(
            &output,
            "operations",
            &[("unprepared", "a.json"), ("optimized", "b.json")],
            start,
            &Ok(()),
        );

        let manifest_path = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .find(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("run-"))
            })
            .expect("manifest written");

        let record = read_manifest(&manifest_path).unwrap();
        assert_eq!(record.command, "operations");
        assert_eq!(record.status, "success");
        assert_eq!(record.params.len(), 2);
    }
}
