//! Network preparation for the operations pass.
//!
//! After capacities are frozen the network is re-prepared before solving:
//! optional load shedding keeps a starved case feasible, small availabilities
//! are clipped, and marginal costs can receive a deterministic jitter to
//! break degenerate merit orders. Finishes with a structural validation so
//! solver failures do not have to be diagnosed backwards.

use gridop_core::{Diagnostics, Generator, GridopError, GridopResult, Network};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Deserialize;

/// Carrier assigned to shedding generators added here.
pub const LOAD_SHEDDING_CARRIER: &str = "load";

/// Fixed seed so re-runs of the same case produce the same jitter.
const NOISE_SEED: u64 = 174;

/// Options controlling [`prepare_network`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrepareOptions {
    /// Marginal cost (EUR/MWh) of unserved energy; adds one shedding
    /// generator per demand-carrying bus when set.
    #[serde(default)]
    pub load_shedding: Option<f64>,
    /// Zero out generator availabilities below this threshold.
    #[serde(default)]
    pub clip_p_max_pu: Option<f64>,
    /// Perturb marginal costs with a small deterministic jitter.
    #[serde(default)]
    pub noisy_costs: bool,
}

/// Prepare a capacity-frozen network for the operations solve.
///
/// Returns `GridopError::Validation` when the prepared network is
/// structurally unsound (the collected diagnostics are embedded in the
/// message).
pub fn prepare_network(n: &mut Network, opts: &PrepareOptions) -> GridopResult<()> {
    if let Some(threshold) = opts.clip_p_max_pu {
        for gen in n.generators.values_mut() {
            if gen.p_max_pu < threshold {
                gen.p_max_pu = 0.0;
            }
        }
    }

    if let Some(cost) = opts.load_shedding {
        add_load_shedding(n, cost);
    }

    if opts.noisy_costs {
        add_cost_noise(n);
    }

    let mut diag = Diagnostics::new();
    n.validate_into(&mut diag);
    if diag.has_errors() {
        let details: Vec<String> = diag.errors().map(|i| i.to_string()).collect();
        return Err(GridopError::Validation(format!(
            "prepared network failed validation: {}",
            details.join("; ")
        )));
    }

    Ok(())
}

/// Add one high-cost shedding generator per bus with attached demand.
///
/// Sized to the bus demand so shedding can never exceed what is actually
/// consumed there.
fn add_load_shedding(n: &mut Network, cost: f64) {
    let mut next_id = n.next_gen_id().value();
    let buses: Vec<_> = n.buses.keys().copied().collect();

    for bus in buses {
        let demand = n.load_at_bus(bus);
        if demand.value() <= 0.0 {
            continue;
        }
        let gen = Generator::new(
            gridop_core::GenId::new(next_id),
            format!("shed bus {}", bus.value()),
            bus,
        )
        .with_p_nom(demand.value())
        .with_marginal_cost(cost)
        .with_carrier(LOAD_SHEDDING_CARRIER);
        n.add_generator(gen);
        next_id += 1;
    }
}

/// Small cost perturbation to break ties between identical plants.
fn add_cost_noise(n: &mut Network) {
    let mut rng = StdRng::seed_from_u64(NOISE_SEED);
    for gen in n.generators.values_mut() {
        gen.marginal_cost += 1e-2 + 2e-3 * (rng.gen::<f64>() - 0.5);
    }
    for su in n.storage_units.values_mut() {
        su.marginal_cost += 1e-2 + 2e-3 * (rng.gen::<f64>() - 0.5);
    }
}
