//! Run configuration for the pipeline step.
//!
//! The workflow hands each step a TOML file with a `[solving]` table; only
//! the keys a step understands are read, the rest pass through untouched.

use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use gridop_solve::PrepareOptions;
use serde::Deserialize;

/// Top-level run configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub solving: SolvingConfig,
}

/// The `[solving]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SolvingConfig {
    /// Override the solver scratch directory (exported as TMPDIR)
    #[serde(default)]
    pub tmpdir: Option<PathBuf>,
    /// Log level for this run (overridden by RUST_LOG)
    #[serde(default)]
    pub log_level: Option<String>,
    /// Network preparation options
    #[serde(default)]
    pub options: PrepareOptions,
}

/// Load a run configuration, defaulting everything when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    let Some(path) = path else {
        return Ok(RunConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file '{}'", path.display()))?;
    let config: RunConfig = toml::from_str(&contents)
        .with_context(|| format!("parsing config file '{}'", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_solving_table() {
        let raw = r#"
            [solving]
            tmpdir = "/scratch"
            log_level = "debug"

            [solving.options]
            load_shedding = 10000.0
            clip_p_max_pu = 0.01
            noisy_costs = true
        "#;
        let config: RunConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.solving.tmpdir.as_deref(), Some(Path::new("/scratch")));
        assert_eq!(config.solving.log_level.as_deref(), Some("debug"));
        assert_eq!(config.solving.options.load_shedding, Some(10000.0));
        assert!(config.solving.options.noisy_costs);
    }

    #[test]
    fn empty_config_defaults() {
        let config: RunConfig = toml::from_str("").unwrap();
        assert!(config.solving.tmpdir.is_none());
        assert!(config.solving.options.load_shedding.is_none());
        assert!(!config.solving.options.noisy_costs);
    }

    #[test]
    fn no_file_gives_defaults() {
        let config = load_config(None).unwrap();
        assert!(config.solving.log_level.is_none());
    }
}
