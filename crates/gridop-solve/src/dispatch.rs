//! Linear operations dispatch.
//!
//! Single-snapshot economic dispatch over the frozen network using the DC
//! approximation:
//! - Ignores reactive power
//! - Assumes flat voltage magnitudes (|V| = 1.0 p.u.)
//! - Linearizes line flows: P_ij = b_ij · (θ_i - θ_j)
//!
//! Problem construction and solving delegate to `good_lp` with the Clarabel
//! backend; this module only extracts the tables into solver-friendly form,
//! states the constraints and writes the dispatch back into the network.

use std::collections::HashMap;
use std::time::Instant;

use good_lp::solvers::clarabel::clarabel;
use good_lp::{
    constraint, variable, variables, Expression, ResolutionError, Solution, SolverModel, Variable,
};
use gridop_core::{BusId, GenId, GridopError, LineId, LinkId, Megawatts, Network, StorageId};
use serde::Serialize;
use thiserror::Error;

/// Dispatch solver errors
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Network data unusable for dispatch
    #[error("Dispatch validation error: {0}")]
    Validation(String),

    /// Component references a bus that is not in the network
    #[error("{component} references unknown bus {bus}")]
    MissingBus { component: String, bus: usize },

    /// No feasible dispatch exists
    #[error("Dispatch problem is infeasible")]
    Infeasible,

    /// Backend failure
    #[error("Solver failed: {0}")]
    Solver(String),
}

// At the pipeline boundary every dispatch failure is a solver error.
impl From<DispatchError> for GridopError {
    fn from(err: DispatchError) -> Self {
        GridopError::Solver(err.to_string())
    }
}

/// Dispatch solver configuration
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Bound on bus voltage angles (radians)
    pub max_angle_rad: f64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_angle_rad: std::f64::consts::PI,
        }
    }
}

/// Dispatch solution summary
#[derive(Debug, Clone, Serialize)]
pub struct DispatchSummary {
    /// Objective value (EUR)
    pub objective: f64,
    /// Total demand served (MW)
    pub total_load_mw: f64,
    /// Energy shed via load-shedding generators (MW)
    pub shed_mw: f64,
    /// Wall time of the solve
    pub solve_time_ms: u128,
}

/// Internal bus data for the solver
#[derive(Debug)]
struct BusData {
    id: BusId,
    index: usize,
}

/// Internal generator data for the solver
#[derive(Debug)]
struct GenData {
    id: GenId,
    bus: BusId,
    pmin_mw: f64,
    pmax_mw: f64,
    marginal_cost: f64,
    is_shedding: bool,
}

/// Internal storage data for the solver
#[derive(Debug)]
struct StorageData {
    id: StorageId,
    bus: BusId,
    pmax_mw: f64,
    marginal_cost: f64,
}

/// Internal link data for the solver
#[derive(Debug)]
struct LinkData {
    id: LinkId,
    bus0: BusId,
    bus1: BusId,
    pmax_mw: f64,
    efficiency: f64,
    marginal_cost: f64,
}

/// Internal line data for the solver
#[derive(Debug)]
struct LineData {
    id: LineId,
    bus0: BusId,
    bus1: BusId,
    susceptance: f64,
    capacity_mw: f64,
}

/// Extract network tables into solver-friendly form
#[allow(clippy::type_complexity)]
fn extract_network_data(
    network: &Network,
) -> Result<
    (
        Vec<BusData>,
        Vec<GenData>,
        Vec<StorageData>,
        Vec<LinkData>,
        Vec<LineData>,
        HashMap<BusId, f64>,
    ),
    DispatchError,
> {
    if network.buses.is_empty() {
        return Err(DispatchError::Validation("No buses in network".into()));
    }

    let buses: Vec<BusData> = network
        .buses
        .keys()
        .enumerate()
        .map(|(index, &id)| BusData { id, index })
        .collect();

    let mut generators = Vec::new();
    for gen in network.generators.values() {
        let pmin = gen.p_nom.value() * gen.p_min_pu;
        let pmax = gen.p_nom.value() * gen.p_max_pu;
        generators.push(GenData {
            id: gen.id,
            bus: gen.bus,
            pmin_mw: pmin.min(pmax),
            pmax_mw: pmax,
            marginal_cost: gen.marginal_cost,
            is_shedding: gen.carrier == crate::prepare::LOAD_SHEDDING_CARRIER,
        });
    }
    if generators.is_empty() {
        return Err(DispatchError::Validation("No generators in network".into()));
    }

    let storage_units: Vec<StorageData> = network
        .storage_units
        .values()
        .map(|su| StorageData {
            id: su.id,
            bus: su.bus,
            pmax_mw: su.p_nom.value(),
            marginal_cost: su.marginal_cost,
        })
        .collect();

    let links: Vec<LinkData> = network
        .links
        .values()
        .map(|link| LinkData {
            id: link.id,
            bus0: link.bus0,
            bus1: link.bus1,
            pmax_mw: link.p_nom.value(),
            efficiency: link.efficiency,
            marginal_cost: link.marginal_cost,
        })
        .collect();

    let mut lines = Vec::new();
    for line in network.lines.values() {
        if line.x.abs() < 1e-12 {
            return Err(DispatchError::Validation(format!(
                "Line {} has zero reactance",
                line.id.value()
            )));
        }
        lines.push(LineData {
            id: line.id,
            bus0: line.bus0,
            bus1: line.bus1,
            susceptance: line.susceptance(),
            capacity_mw: line.s_nom.value() * line.s_max_pu * line.num_parallel,
        });
    }

    let mut loads: HashMap<BusId, f64> = HashMap::new();
    for load in network.loads.values() {
        *loads.entry(load.bus).or_insert(0.0) += load.p_set.value();
    }

    Ok((buses, generators, storage_units, links, lines, loads))
}

fn bus_index(
    bus_map: &HashMap<BusId, usize>,
    bus: BusId,
    component: &str,
) -> Result<usize, DispatchError> {
    bus_map.get(&bus).copied().ok_or(DispatchError::MissingBus {
        component: component.to_string(),
        bus: bus.value(),
    })
}

/// Solve the operations dispatch and write results back into the network.
///
/// Variables are generator outputs, storage dispatch, link flows and bus
/// angles; the single constraint family is nodal power balance; the objective
/// is total marginal cost. On success the `p` columns of generators, storage
/// units, links and lines hold the dispatch.
pub fn solve_network(
    network: &mut Network,
    config: &DispatchConfig,
) -> Result<DispatchSummary, DispatchError> {
    let start = Instant::now();

    let (buses, generators, storage_units, links, lines, loads) =
        extract_network_data(network)?;
    let bus_map: HashMap<BusId, usize> = buses.iter().map(|b| (b.id, b.index)).collect();

    // === LP Formulation ===
    // Variables: P_g per generator, S per storage unit, F per link,
    //            θ per bus (reference bus fixed at 0, not a variable)
    // Objective: minimize Σ marginal_cost · dispatch
    // Constraints: nodal power balance at every bus;
    //              line flows b·(θ_i - θ_j) bounded by the thermal rating

    let mut vars = variables!();

    let mut gen_vars: Vec<(usize, Variable)> = Vec::new(); // (bus index, var)
    let mut cost_expr = Expression::from(0.0);
    for gen in &generators {
        let idx = bus_index(&bus_map, gen.bus, &format!("Generator {}", gen.id.value()))?;
        let p_var = vars.add(variable().min(gen.pmin_mw).max(gen.pmax_mw));
        cost_expr += gen.marginal_cost * p_var;
        gen_vars.push((idx, p_var));
    }

    let mut storage_vars: Vec<(usize, Variable)> = Vec::new();
    for su in &storage_units {
        let idx = bus_index(&bus_map, su.bus, &format!("StorageUnit {}", su.id.value()))?;
        // Signed dispatch within the power rating; negative values charge
        let s_var = vars.add(variable().min(-su.pmax_mw).max(su.pmax_mw));
        cost_expr += su.marginal_cost * s_var;
        storage_vars.push((idx, s_var));
    }

    let mut link_vars: Vec<(usize, usize, f64, Variable)> = Vec::new(); // (from, to, eff, var)
    for link in &links {
        let i = bus_index(&bus_map, link.bus0, &format!("Link {}", link.id.value()))?;
        let j = bus_index(&bus_map, link.bus1, &format!("Link {}", link.id.value()))?;
        let f_var = vars.add(variable().min(0.0).max(link.pmax_mw));
        cost_expr += link.marginal_cost * f_var;
        link_vars.push((i, j, link.efficiency, f_var));
    }

    // Bus angle variables (reference bus = 0, not a variable)
    let ref_bus_idx = 0;
    let mut theta_vars: HashMap<usize, Variable> = HashMap::new();
    for bus in &buses {
        if bus.index != ref_bus_idx {
            let theta = vars.add(
                variable()
                    .min(-config.max_angle_rad)
                    .max(config.max_angle_rad),
            );
            theta_vars.insert(bus.index, theta);
        }
    }

    let mut model = vars.minimise(cost_expr).using(clarabel);

    // Line flow expressions: P_ij = b · (θ_i - θ_j)
    let mut line_flows: Vec<(usize, usize, Expression)> = Vec::new();
    for line in &lines {
        let i = bus_index(&bus_map, line.bus0, &format!("Line {}", line.id.value()))?;
        let j = bus_index(&bus_map, line.bus1, &format!("Line {}", line.id.value()))?;

        let theta_i = theta_vars.get(&i).copied();
        let theta_j = theta_vars.get(&j).copied();
        let flow: Expression = match (theta_i, theta_j) {
            (Some(ti), Some(tj)) => line.susceptance * (ti - tj),
            (Some(ti), None) => line.susceptance * ti, // j is reference
            (None, Some(tj)) => line.susceptance * (-tj), // i is reference
            (None, None) => Expression::from(0.0),
        };

        // Thermal limit
        model = model.with(constraint!(flow.clone() <= line.capacity_mw));
        model = model.with(constraint!(flow.clone() >= -line.capacity_mw));

        line_flows.push((i, j, flow));
    }

    // === Nodal power balance ===
    let mut injections: HashMap<usize, Expression> = buses
        .iter()
        .map(|b| (b.index, Expression::from(0.0)))
        .collect();

    for (idx, p_var) in &gen_vars {
        *injections.get_mut(idx).unwrap() += *p_var;
    }
    for (idx, s_var) in &storage_vars {
        *injections.get_mut(idx).unwrap() += *s_var;
    }
    for (i, j, efficiency, f_var) in &link_vars {
        *injections.get_mut(i).unwrap() -= *f_var;
        *injections.get_mut(j).unwrap() += *efficiency * *f_var;
    }
    for (i, j, flow) in &line_flows {
        *injections.get_mut(i).unwrap() -= flow.clone();
        *injections.get_mut(j).unwrap() += flow.clone();
    }

    for bus in &buses {
        let injection = injections.remove(&bus.index).unwrap();
        let demand = loads.get(&bus.id).copied().unwrap_or(0.0);
        model = model.with(constraint!(injection == demand));
    }

    // === Solve ===
    let solution = model.solve().map_err(|err| match err {
        ResolutionError::Infeasible => DispatchError::Infeasible,
        other => DispatchError::Solver(format!("{other:?}")),
    })?;

    // === Write results back ===
    let mut objective = 0.0;
    let mut shed_mw = 0.0;
    for (gen, (_, p_var)) in generators.iter().zip(gen_vars.iter()) {
        let p = solution.value(*p_var);
        objective += gen.marginal_cost * p;
        if gen.is_shedding {
            shed_mw += p;
        }
        if let Some(g) = network.generators.get_mut(&gen.id) {
            g.p = Megawatts(p);
        }
    }
    for (su, (_, s_var)) in storage_units.iter().zip(storage_vars.iter()) {
        let s = solution.value(*s_var);
        objective += su.marginal_cost * s;
        if let Some(unit) = network.storage_units.get_mut(&su.id) {
            unit.p = Megawatts(s);
        }
    }
    for (link, (_, _, _, f_var)) in links.iter().zip(link_vars.iter()) {
        let f = solution.value(*f_var);
        objective += link.marginal_cost * f;
        if let Some(l) = network.links.get_mut(&link.id) {
            l.p = Megawatts(f);
        }
    }
    for (line, (i, j, _)) in lines.iter().zip(line_flows.iter()) {
        let theta = |idx: usize| {
            if idx == ref_bus_idx {
                0.0
            } else {
                theta_vars.get(&idx).map_or(0.0, |v| solution.value(*v))
            }
        };
        let flow = line.susceptance * (theta(*i) - theta(*j));
        if let Some(l) = network.lines.get_mut(&line.id) {
            l.p = Megawatts(flow);
        }
    }

    Ok(DispatchSummary {
        objective,
        total_load_mw: loads.values().sum(),
        shed_mw,
        solve_time_ms: start.elapsed().as_millis(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepare::{prepare_network, PrepareOptions};
    use gridop_core::{Bus, Generator, Line, Link, Load, LoadId, StorageUnit};

    fn two_bus_network() -> Network {
        let mut n = Network::new();
        let b1 = n.add_bus(Bus::new(BusId::new(1), "Bus 1", 380.0));
        let b2 = n.add_bus(Bus::new(BusId::new(2), "Bus 2", 380.0));
        n.add_generator(
            Generator::new(GenId::new(1), "Cheap", b1)
                .with_p_nom(100.0)
                .with_marginal_cost(10.0),
        );
        n.add_generator(
            Generator::new(GenId::new(2), "Expensive", b2)
                .with_p_nom(100.0)
                .with_marginal_cost(50.0),
        );
        n.add_load(Load::new(LoadId::new(1), "Load", b2, 80.0));
        n.add_line(Line::new(LineId::new(1), "Line 1-2", b1, b2, 0.01, 0.1).with_s_nom(200.0));
        n
    }

    #[test]
    fn merit_order_dispatch() {
        let mut n = two_bus_network();
        let summary = solve_network(&mut n, &DispatchConfig::default()).unwrap();

        // Cheap generator covers the whole demand over the line
        let cheap = n.generators[&GenId::new(1)].p.value();
        let expensive = n.generators[&GenId::new(2)].p.value();
        assert!((cheap - 80.0).abs() < 1e-3, "cheap dispatch {cheap}");
        assert!(expensive.abs() < 1e-3, "expensive dispatch {expensive}");
        assert!((summary.objective - 800.0).abs() < 1.0);
        assert_eq!(summary.total_load_mw, 80.0);
        assert_eq!(summary.shed_mw, 0.0);

        // Line carries the transfer
        assert!((n.lines[&LineId::new(1)].p.value().abs() - 80.0).abs() < 1e-3);
    }

    #[test]
    fn congested_line_forces_local_generation() {
        let mut n = two_bus_network();
        n.lines.get_mut(&LineId::new(1)).unwrap().s_nom =
            gridop_core::MegavoltAmperes(30.0);
        solve_network(&mut n, &DispatchConfig::default()).unwrap();

        let cheap = n.generators[&GenId::new(1)].p.value();
        let expensive = n.generators[&GenId::new(2)].p.value();
        assert!((cheap - 30.0).abs() < 1e-3, "cheap dispatch {cheap}");
        assert!((expensive - 50.0).abs() < 1e-3, "expensive dispatch {expensive}");
    }

    #[test]
    fn link_transfers_with_efficiency() {
        let mut n = Network::new();
        let b1 = n.add_bus(Bus::new(BusId::new(1), "Bus 1", 380.0));
        let b2 = n.add_bus(Bus::new(BusId::new(2), "Bus 2", 380.0));
        n.add_generator(
            Generator::new(GenId::new(1), "Gen", b1)
                .with_p_nom(200.0)
                .with_marginal_cost(10.0),
        );
        n.add_load(Load::new(LoadId::new(1), "Load", b2, 90.0));
        n.add_link(
            Link::new(LinkId::new(1), "HVDC", b1, b2)
                .with_p_nom(150.0)
                .with_efficiency(0.9),
        );

        solve_network(&mut n, &DispatchConfig::default()).unwrap();

        // 90 MW delivered at 0.9 efficiency needs 100 MW drawn
        assert!((n.links[&LinkId::new(1)].p.value() - 100.0).abs() < 1e-3);
        assert!((n.generators[&GenId::new(1)].p.value() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn storage_dispatches_when_cheaper() {
        let mut n = Network::new();
        let b1 = n.add_bus(Bus::new(BusId::new(1), "Bus 1", 380.0));
        n.add_generator(
            Generator::new(GenId::new(1), "Peaker", b1)
                .with_p_nom(100.0)
                .with_marginal_cost(80.0),
        );
        let mut su = StorageUnit::new(StorageId::new(1), "Hydro", b1).with_p_nom(40.0);
        su.marginal_cost = 5.0;
        n.add_storage_unit(su);
        n.add_load(Load::new(LoadId::new(1), "Load", b1, 60.0));

        solve_network(&mut n, &DispatchConfig::default()).unwrap();

        assert!((n.storage_units[&StorageId::new(1)].p.value() - 40.0).abs() < 1e-3);
        assert!((n.generators[&GenId::new(1)].p.value() - 20.0).abs() < 1e-3);
    }

    #[test]
    fn storage_charges_surplus_from_must_run_generation() {
        let mut n = Network::new();
        let b1 = n.add_bus(Bus::new(BusId::new(1), "Bus 1", 380.0));
        let mut must_run = Generator::new(GenId::new(1), "Nuclear", b1)
            .with_p_nom(100.0)
            .with_marginal_cost(10.0);
        must_run.p_min_pu = 1.0;
        n.add_generator(must_run);
        n.add_storage_unit(StorageUnit::new(StorageId::new(1), "Pumped", b1).with_p_nom(50.0));
        n.add_load(Load::new(LoadId::new(1), "Load", b1, 60.0));

        solve_network(&mut n, &DispatchConfig::default()).unwrap();

        // The 40 MW surplus above demand is absorbed by the unit
        assert!((n.storage_units[&StorageId::new(1)].p.value() + 40.0).abs() < 1e-3);
        assert!((n.generators[&GenId::new(1)].p.value() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn typed_line_capacity_scales_with_parallel_circuits() {
        let mut n = two_bus_network();
        n.generators.get_mut(&GenId::new(1)).unwrap().p_nom = Megawatts(200.0);
        n.generators.get_mut(&GenId::new(2)).unwrap().p_nom = Megawatts(200.0);
        n.loads.get_mut(&LoadId::new(1)).unwrap().p_set = Megawatts(150.0);
        {
            let line = n.lines.get_mut(&LineId::new(1)).unwrap();
            line.type_name = "490-AL1/64-ST1A".into();
            line.s_nom = gridop_core::MegavoltAmperes(60.0);
            line.num_parallel = 3.0;
        }

        solve_network(&mut n, &DispatchConfig::default()).unwrap();

        // Three 60 MVA circuits carry the full import, one alone could not
        let cheap = n.generators[&GenId::new(1)].p.value();
        assert!((cheap - 150.0).abs() < 1e-3, "cheap dispatch {cheap}");
        assert!((n.lines[&LineId::new(1)].p.value().abs() - 150.0).abs() < 1e-3);
    }

    #[test]
    fn negative_minimum_output_acts_as_a_sink() {
        let mut n = Network::new();
        let b1 = n.add_bus(Bus::new(BusId::new(1), "Bus 1", 380.0));
        let mut must_run = Generator::new(GenId::new(1), "Nuclear", b1)
            .with_p_nom(100.0)
            .with_marginal_cost(10.0);
        must_run.p_min_pu = 1.0;
        n.add_generator(must_run);
        let mut sink = Generator::new(GenId::new(2), "Electrolyser", b1).with_p_nom(100.0);
        sink.p_min_pu = -1.0;
        sink.p_max_pu = 0.0;
        n.add_generator(sink);
        n.add_load(Load::new(LoadId::new(1), "Load", b1, 60.0));

        solve_network(&mut n, &DispatchConfig::default()).unwrap();

        assert!((n.generators[&GenId::new(2)].p.value() + 40.0).abs() < 1e-3);
    }

    #[test]
    fn starved_network_is_infeasible_without_shedding() {
        let mut n = Network::new();
        let b1 = n.add_bus(Bus::new(BusId::new(1), "Bus 1", 380.0));
        n.add_generator(
            Generator::new(GenId::new(1), "Small", b1)
                .with_p_nom(10.0)
                .with_marginal_cost(10.0),
        );
        n.add_load(Load::new(LoadId::new(1), "Load", b1, 100.0));

        let err = solve_network(&mut n, &DispatchConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Infeasible | DispatchError::Solver(_)
        ));
    }

    #[test]
    fn shedding_restores_feasibility_and_is_reported() {
        let mut n = Network::new();
        let b1 = n.add_bus(Bus::new(BusId::new(1), "Bus 1", 380.0));
        n.add_generator(
            Generator::new(GenId::new(1), "Small", b1)
                .with_p_nom(10.0)
                .with_marginal_cost(10.0),
        );
        n.add_load(Load::new(LoadId::new(1), "Load", b1, 100.0));

        let opts = PrepareOptions {
            load_shedding: Some(1e4),
            ..PrepareOptions::default()
        };
        prepare_network(&mut n, &opts).unwrap();
        let summary = solve_network(&mut n, &DispatchConfig::default()).unwrap();

        assert!((summary.shed_mw - 90.0).abs() < 1e-3, "shed {}", summary.shed_mw);
    }

    #[test]
    fn zero_reactance_line_is_rejected() {
        let mut n = two_bus_network();
        n.lines.get_mut(&LineId::new(1)).unwrap().x = 0.0;
        let err = solve_network(&mut n, &DispatchConfig::default()).unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
    }

    #[test]
    fn dispatch_errors_map_to_solver_errors() {
        let err: GridopError = DispatchError::Infeasible.into();
        assert!(matches!(err, GridopError::Solver(_)));
        assert!(err.to_string().contains("infeasible"));
    }

    #[test]
    fn missing_bus_reference_is_reported() {
        let mut n = two_bus_network();
        n.add_generator(Generator::new(GenId::new(9), "Orphan", BusId::new(99)).with_p_nom(5.0));
        let err = solve_network(&mut n, &DispatchConfig::default()).unwrap_err();
        assert!(matches!(err, DispatchError::MissingBus { bus: 99, .. }));
    }
}
