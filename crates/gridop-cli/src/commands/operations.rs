//! The `operations` pipeline step.
//!
//! Loads the base-case and the solved planning network, transfers the
//! optimized capacities, re-prepares, dispatches and serializes the result.
//! The prepare+solve+export block runs inside a peak-memory window; a run
//! manifest is recorded whatever the outcome.

use std::env;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use gridop_core::GridopError;
use gridop_io::{load_network, save_network};
use gridop_solve::{
    apply_optimized_capacities, prepare_network, solve_network, DispatchConfig,
};

use crate::cli::OperationsArgs;
use crate::config::RunConfig;
use crate::manifest::record_run;
use crate::memory::MemoryWindow;

pub fn handle(args: &OperationsArgs, config: &RunConfig) -> Result<()> {
    let start = Instant::now();

    let res = run(args, config);

    record_run(
        &args.out,
        "operations",
        &[
            ("unprepared", &args.unprepared.display().to_string()),
            ("optimized", &args.optimized.display().to_string()),
            ("out", &args.out.display().to_string()),
            (
                "config",
                &args
                    .config
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),
        ],
        start,
        &res,
    );
    res
}

fn run(args: &OperationsArgs, config: &RunConfig) -> Result<()> {
    let mut network = load_network(&args.unprepared)?;
    let stats = network.stats();
    info!(
        buses = stats.num_buses,
        lines = stats.num_lines,
        extendable = stats.num_extendable,
        "loaded base network '{}'",
        args.unprepared.display()
    );

    let optimized = load_network(&args.optimized)?;
    apply_optimized_capacities(&mut network, &optimized);
    drop(optimized);
    info!(
        extendable = network.stats().num_extendable,
        "capacities fixed from '{}'",
        args.optimized.display()
    );

    if let Some(tmpdir) = &config.solving.tmpdir {
        env::set_var("TMPDIR", tmpdir);
    }

    {
        let _window = MemoryWindow::open("operations solve");

        prepare_network(&mut network, &config.solving.options)
            .context("preparing network for operations dispatch")?;

        let summary = solve_network(&mut network, &DispatchConfig::default())
            .map_err(GridopError::from)
            .context("solving operations dispatch")?;
        info!(
            objective = summary.objective,
            load_mw = summary.total_load_mw,
            shed_mw = summary.shed_mw,
            solve_time_ms = summary.solve_time_ms as u64,
            "dispatch solved"
        );

        save_network(&args.out, &network)?;
        info!("wrote solved network '{}'", args.out.display());
    }

    Ok(())
}
