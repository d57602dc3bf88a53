//! On-disk JSON schema for networks.
//!
//! Dictionary-based component storage keyed by stringified component id, with
//! serde defaults on every optional column so files written before a column
//! existed still load. The same mirror structs serve import and export, which
//! keeps the roundtrip lossless by construction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Current format version. The major component must match on load.
pub const FORMAT_VERSION: &str = "1.0";

fn default_version() -> String {
    FORMAT_VERSION.to_string()
}

fn default_one() -> f64 {
    1.0
}

fn default_carrier() -> String {
    "AC".to_string()
}

fn default_inf() -> f64 {
    f64::INFINITY
}

// JSON cannot carry IEEE infinities; unbounded limits are omitted on write
// and restored by the deserialization default.
fn is_inf(value: &f64) -> bool {
    value.is_infinite()
}

/// Top-level network file structure
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NetworkJson {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub buses: BTreeMap<String, BusJson>,
    #[serde(default)]
    pub lines: BTreeMap<String, LineJson>,
    #[serde(default)]
    pub links: BTreeMap<String, LinkJson>,
    #[serde(default)]
    pub generators: BTreeMap<String, GeneratorJson>,
    #[serde(default)]
    pub storage_units: BTreeMap<String, StorageUnitJson>,
    #[serde(default)]
    pub loads: BTreeMap<String, LoadJson>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BusJson {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub v_nom: f64,
    #[serde(default = "default_carrier")]
    pub carrier: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LineJson {
    #[serde(default)]
    pub name: String,
    pub bus0: usize,
    pub bus1: usize,
    #[serde(rename = "type", default)]
    pub type_name: String,
    #[serde(default)]
    pub s_nom: f64,
    #[serde(default)]
    pub s_nom_opt: f64,
    #[serde(default)]
    pub s_nom_extendable: bool,
    #[serde(default)]
    pub s_nom_min: f64,
    #[serde(default = "default_inf", skip_serializing_if = "is_inf")]
    pub s_nom_max: f64,
    #[serde(default)]
    pub r: f64,
    #[serde(default)]
    pub x: f64,
    #[serde(default = "default_one")]
    pub num_parallel: f64,
    #[serde(default = "default_one")]
    pub s_max_pu: f64,
    #[serde(default)]
    pub capital_cost: f64,
    #[serde(default)]
    pub p: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LinkJson {
    #[serde(default)]
    pub name: String,
    pub bus0: usize,
    pub bus1: usize,
    #[serde(default)]
    pub p_nom: f64,
    #[serde(default)]
    pub p_nom_opt: f64,
    #[serde(default)]
    pub p_nom_extendable: bool,
    #[serde(default)]
    pub p_nom_min: f64,
    #[serde(default = "default_inf", skip_serializing_if = "is_inf")]
    pub p_nom_max: f64,
    #[serde(default = "default_one")]
    pub efficiency: f64,
    #[serde(default)]
    pub marginal_cost: f64,
    #[serde(default)]
    pub capital_cost: f64,
    #[serde(default)]
    pub p: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeneratorJson {
    #[serde(default)]
    pub name: String,
    pub bus: usize,
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub p_nom: f64,
    #[serde(default)]
    pub p_nom_opt: f64,
    #[serde(default)]
    pub p_nom_extendable: bool,
    #[serde(default)]
    pub p_nom_min: f64,
    #[serde(default = "default_inf", skip_serializing_if = "is_inf")]
    pub p_nom_max: f64,
    #[serde(default)]
    pub p_min_pu: f64,
    #[serde(default = "default_one")]
    pub p_max_pu: f64,
    #[serde(default)]
    pub marginal_cost: f64,
    #[serde(default)]
    pub capital_cost: f64,
    #[serde(default)]
    pub p: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StorageUnitJson {
    #[serde(default)]
    pub name: String,
    pub bus: usize,
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub p_nom: f64,
    #[serde(default)]
    pub p_nom_opt: f64,
    #[serde(default)]
    pub p_nom_extendable: bool,
    #[serde(default = "default_one")]
    pub max_hours: f64,
    #[serde(default = "default_one")]
    pub efficiency_store: f64,
    #[serde(default = "default_one")]
    pub efficiency_dispatch: f64,
    #[serde(default)]
    pub marginal_cost: f64,
    #[serde(default)]
    pub p: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoadJson {
    #[serde(default)]
    pub name: String,
    pub bus: usize,
    #[serde(default)]
    pub p_set: f64,
}

/// Check that a file's format version is compatible with this reader.
///
/// Only the major component has to match; minor additions are backwards
/// compatible thanks to the serde defaults above.
pub fn version_compatible(file_version: &str) -> bool {
    let major = |v: &str| v.split('.').next().map(str::to_string);
    major(file_version) == major(FORMAT_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_major_match() {
        assert!(version_compatible("1.0"));
        assert!(version_compatible("1.3"));
        assert!(!version_compatible("2.0"));
    }

    #[test]
    fn minimal_line_deserializes_with_defaults() {
        let line: LineJson = serde_json::from_str(r#"{"bus0": 1, "bus1": 2}"#).unwrap();
        assert_eq!(line.num_parallel, 1.0);
        assert_eq!(line.s_max_pu, 1.0);
        assert!(line.s_nom_max.is_infinite());
        assert!(!line.s_nom_extendable);
        assert!(line.type_name.is_empty());
    }

    #[test]
    fn unbounded_limit_is_omitted_on_write() {
        let gen = GeneratorJson {
            name: "g".into(),
            bus: 1,
            carrier: String::new(),
            p_nom: 10.0,
            p_nom_opt: 0.0,
            p_nom_extendable: false,
            p_nom_min: 0.0,
            p_nom_max: f64::INFINITY,
            p_min_pu: 0.0,
            p_max_pu: 1.0,
            marginal_cost: 0.0,
            capital_cost: 0.0,
            p: 0.0,
        };
        let json = serde_json::to_string(&gen).unwrap();
        assert!(!json.contains("p_nom_max"));
    }
}
