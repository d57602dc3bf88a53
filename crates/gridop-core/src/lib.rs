//! # gridop-core: Network Model for Operations Re-Dispatch
//!
//! Provides the tabular network model shared by the gridop pipeline: buses,
//! transmission lines, point-to-point links, generators, storage units and
//! loads, each stored in an ordered table keyed by a typed component id.
//!
//! ## Design Philosophy
//!
//! The pipeline works on *two* instances of the same network: an unprepared
//! base case and a previously optimized capacity-expansion result. All of its
//! logic is keyed column transfer between tables of the two instances, so the
//! model keeps components in `BTreeMap`s:
//!
//! - Deterministic iteration and serialization order
//! - Type-safe element access with newtype IDs
//! - Cheap keyed lookup of the "same component" in the other network
//!
//! ## Quick Start
//!
//! ```rust
//! use gridop_core::*;
//!
//! let mut network = Network::new();
//!
//! let b1 = network.add_bus(Bus::new(BusId::new(1), "Bus 1", 380.0));
//! let b2 = network.add_bus(Bus::new(BusId::new(2), "Bus 2", 380.0));
//!
//! network.add_generator(
//!     Generator::new(GenId::new(1), "Gen 1", b1)
//!         .with_p_nom(100.0)
//!         .with_marginal_cost(25.0),
//! );
//!
//! network.add_load(Load::new(LoadId::new(1), "Load 1", b2, 50.0));
//!
//! network.add_line(
//!     Line::new(LineId::new(1), "Line 1-2", b1, b2, 0.01, 0.1).with_s_nom(200.0),
//! );
//!
//! assert_eq!(network.stats().num_buses, 2);
//! ```
//!
//! ## Capacity expansion attributes
//!
//! Sizable components carry three related attributes:
//!
//! - `p_nom` / `s_nom` — the nominal capacity used by operations runs
//! - `p_nom_opt` / `s_nom_opt` — the capacity chosen by a planning run
//! - `*_extendable` — true while the capacity is still a decision variable
//!
//! The operations pipeline copies the `*_opt` values of a solved network onto
//! the nominal attributes of the base case and clears the extendable flags,
//! so the second solve dispatches against fixed sizes.
//!
//! ## Modules
//!
//! - [`diagnostics`] - Validation and diagnostic reporting
//! - [`error`] - Unified error type for the gridop crates
//! - [`units`] - Newtype wrappers for MW / MVA quantities

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub mod diagnostics;
pub mod error;
pub mod units;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{GridopError, GridopResult};
pub use units::{MegavoltAmperes, Megawatts};

// Newtype wrappers for IDs for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoadId(usize);

macro_rules! impl_id {
    ($type:ty) => {
        impl $type {
            #[inline]
            pub fn new(value: usize) -> Self {
                Self(value)
            }
            #[inline]
            pub fn value(&self) -> usize {
                self.0
            }
        }
    };
}

impl_id!(BusId);
impl_id!(LineId);
impl_id!(LinkId);
impl_id!(GenId);
impl_id!(StorageId);
impl_id!(LoadId);

/// A connection point of the network
#[derive(Debug, Clone)]
pub struct Bus {
    pub id: BusId,
    pub name: String,
    /// Nominal voltage in kilovolts
    pub v_nom_kv: f64,
    /// Energy carrier at this bus (e.g. "AC", "DC")
    pub carrier: String,
}

impl Default for Bus {
    fn default() -> Self {
        Self {
            id: BusId(0),
            name: String::new(),
            v_nom_kv: 0.0,
            carrier: "AC".to_string(),
        }
    }
}

impl Bus {
    pub fn new(id: BusId, name: impl Into<String>, v_nom_kv: f64) -> Self {
        Self {
            id,
            name: name.into(),
            v_nom_kv,
            ..Self::default()
        }
    }
}

/// An AC transmission line between two buses
///
/// Lines can reference a standard conductor type by name. For typed lines the
/// electrical parameters follow from the type and the number of parallel
/// circuits; untyped lines (empty `type_name`) carry their impedance and
/// rating directly.
#[derive(Debug, Clone)]
pub struct Line {
    pub id: LineId,
    pub name: String,
    pub bus0: BusId,
    pub bus1: BusId,
    /// Standard line type name, empty when parameters are explicit
    pub type_name: String,
    /// Nominal apparent power rating
    pub s_nom: MegavoltAmperes,
    /// Rating chosen by a capacity-expansion run
    pub s_nom_opt: MegavoltAmperes,
    /// True while the rating is a planning decision variable
    pub s_nom_extendable: bool,
    pub s_nom_min: MegavoltAmperes,
    pub s_nom_max: MegavoltAmperes,
    /// Series resistance (per-unit)
    pub r: f64,
    /// Series reactance (per-unit)
    pub x: f64,
    /// Number of parallel circuits
    pub num_parallel: f64,
    /// Fraction of the rating usable in operations
    pub s_max_pu: f64,
    /// Annualized investment cost per MVA
    pub capital_cost: f64,
    /// Dispatch result: active power flow bus0 -> bus1
    pub p: Megawatts,
}

impl Default for Line {
    fn default() -> Self {
        Self {
            id: LineId(0),
            name: String::new(),
            bus0: BusId(0),
            bus1: BusId(0),
            type_name: String::new(),
            s_nom: MegavoltAmperes(0.0),
            s_nom_opt: MegavoltAmperes(0.0),
            s_nom_extendable: false,
            s_nom_min: MegavoltAmperes(0.0),
            s_nom_max: MegavoltAmperes(f64::INFINITY),
            r: 0.0,
            x: 0.0,
            num_parallel: 1.0,
            s_max_pu: 1.0,
            capital_cost: 0.0,
            p: Megawatts(0.0),
        }
    }
}

impl Line {
    /// Construct an untyped line from explicit impedance parameters.
    pub fn new(
        id: LineId,
        name: impl Into<String>,
        bus0: BusId,
        bus1: BusId,
        r: f64,
        x: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            bus0,
            bus1,
            r,
            x,
            ..Self::default()
        }
    }

    /// Set the nominal rating in MVA
    pub fn with_s_nom(mut self, s_nom_mva: f64) -> Self {
        self.s_nom = MegavoltAmperes(s_nom_mva);
        self
    }

    /// Reference a standard line type
    pub fn with_type(mut self, type_name: impl Into<String>, num_parallel: f64) -> Self {
        self.type_name = type_name.into();
        self.num_parallel = num_parallel;
        self
    }

    /// Mark the rating as a planning decision variable
    pub fn extendable(mut self) -> Self {
        self.s_nom_extendable = true;
        self
    }

    /// Effective susceptance (per-unit), accounting for parallel circuits
    pub fn susceptance(&self) -> f64 {
        if self.x.abs() < 1e-12 {
            0.0
        } else {
            self.num_parallel / self.x
        }
    }

    /// True when electrical parameters are explicit rather than type-derived
    pub fn is_untyped(&self) -> bool {
        self.type_name.is_empty()
    }
}

/// A controllable point-to-point transfer element (HVDC link, converter)
#[derive(Debug, Clone)]
pub struct Link {
    pub id: LinkId,
    pub name: String,
    pub bus0: BusId,
    pub bus1: BusId,
    /// Nominal transfer capacity
    pub p_nom: Megawatts,
    /// Capacity chosen by a capacity-expansion run
    pub p_nom_opt: Megawatts,
    /// True while the capacity is a planning decision variable
    pub p_nom_extendable: bool,
    pub p_nom_min: Megawatts,
    pub p_nom_max: Megawatts,
    /// Transfer efficiency bus0 -> bus1
    pub efficiency: f64,
    /// Cost per MWh transferred
    pub marginal_cost: f64,
    /// Annualized investment cost per MW
    pub capital_cost: f64,
    /// Dispatch result: active power drawn at bus0
    pub p: Megawatts,
}

impl Default for Link {
    fn default() -> Self {
        Self {
            id: LinkId(0),
            name: String::new(),
            bus0: BusId(0),
            bus1: BusId(0),
            p_nom: Megawatts(0.0),
            p_nom_opt: Megawatts(0.0),
            p_nom_extendable: false,
            p_nom_min: Megawatts(0.0),
            p_nom_max: Megawatts(f64::INFINITY),
            efficiency: 1.0,
            marginal_cost: 0.0,
            capital_cost: 0.0,
            p: Megawatts(0.0),
        }
    }
}

impl Link {
    pub fn new(id: LinkId, name: impl Into<String>, bus0: BusId, bus1: BusId) -> Self {
        Self {
            id,
            name: name.into(),
            bus0,
            bus1,
            ..Self::default()
        }
    }

    pub fn with_p_nom(mut self, p_nom_mw: f64) -> Self {
        self.p_nom = Megawatts(p_nom_mw);
        self
    }

    pub fn with_efficiency(mut self, efficiency: f64) -> Self {
        self.efficiency = efficiency;
        self
    }

    /// Mark the capacity as a planning decision variable
    pub fn extendable(mut self) -> Self {
        self.p_nom_extendable = true;
        self
    }
}

/// A generator attached to a bus
#[derive(Debug, Clone)]
pub struct Generator {
    pub id: GenId,
    pub name: String,
    pub bus: BusId,
    /// Energy carrier (e.g. "wind", "gas", "load" for shedding)
    pub carrier: String,
    /// Nominal capacity
    pub p_nom: Megawatts,
    /// Capacity chosen by a capacity-expansion run
    pub p_nom_opt: Megawatts,
    /// True while the capacity is a planning decision variable
    pub p_nom_extendable: bool,
    pub p_nom_min: Megawatts,
    pub p_nom_max: Megawatts,
    /// Minimum output as fraction of `p_nom`
    pub p_min_pu: f64,
    /// Maximum output as fraction of `p_nom` (availability)
    pub p_max_pu: f64,
    /// Cost per MWh produced
    pub marginal_cost: f64,
    /// Annualized investment cost per MW
    pub capital_cost: f64,
    /// Dispatch result
    pub p: Megawatts,
}

impl Default for Generator {
    fn default() -> Self {
        Self {
            id: GenId(0),
            name: String::new(),
            bus: BusId(0),
            carrier: String::new(),
            p_nom: Megawatts(0.0),
            p_nom_opt: Megawatts(0.0),
            p_nom_extendable: false,
            p_nom_min: Megawatts(0.0),
            p_nom_max: Megawatts(f64::INFINITY),
            p_min_pu: 0.0,
            p_max_pu: 1.0,
            marginal_cost: 0.0,
            capital_cost: 0.0,
            p: Megawatts(0.0),
        }
    }
}

impl Generator {
    pub fn new(id: GenId, name: impl Into<String>, bus: BusId) -> Self {
        Self {
            id,
            name: name.into(),
            bus,
            ..Self::default()
        }
    }

    pub fn with_p_nom(mut self, p_nom_mw: f64) -> Self {
        self.p_nom = Megawatts(p_nom_mw);
        self
    }

    pub fn with_marginal_cost(mut self, cost: f64) -> Self {
        self.marginal_cost = cost;
        self
    }

    pub fn with_carrier(mut self, carrier: impl Into<String>) -> Self {
        self.carrier = carrier.into();
        self
    }

    /// Mark the capacity as a planning decision variable
    pub fn extendable(mut self) -> Self {
        self.p_nom_extendable = true;
        self
    }
}

/// A storage unit attached to a bus
#[derive(Debug, Clone)]
pub struct StorageUnit {
    pub id: StorageId,
    pub name: String,
    pub bus: BusId,
    pub carrier: String,
    /// Nominal power rating (charge and discharge)
    pub p_nom: Megawatts,
    /// Rating chosen by a capacity-expansion run
    pub p_nom_opt: Megawatts,
    /// True while the rating is a planning decision variable
    pub p_nom_extendable: bool,
    /// Energy capacity as hours at nominal power
    pub max_hours: f64,
    /// Charging efficiency
    pub efficiency_store: f64,
    /// Discharging efficiency
    pub efficiency_dispatch: f64,
    /// Cost per MWh dispatched
    pub marginal_cost: f64,
    /// Dispatch result (positive = discharging)
    pub p: Megawatts,
}

impl Default for StorageUnit {
    fn default() -> Self {
        Self {
            id: StorageId(0),
            name: String::new(),
            bus: BusId(0),
            carrier: String::new(),
            p_nom: Megawatts(0.0),
            p_nom_opt: Megawatts(0.0),
            p_nom_extendable: false,
            max_hours: 1.0,
            efficiency_store: 1.0,
            efficiency_dispatch: 1.0,
            marginal_cost: 0.0,
            p: Megawatts(0.0),
        }
    }
}

impl StorageUnit {
    pub fn new(id: StorageId, name: impl Into<String>, bus: BusId) -> Self {
        Self {
            id,
            name: name.into(),
            bus,
            ..Self::default()
        }
    }

    pub fn with_p_nom(mut self, p_nom_mw: f64) -> Self {
        self.p_nom = Megawatts(p_nom_mw);
        self
    }

    /// Mark the rating as a planning decision variable
    pub fn extendable(mut self) -> Self {
        self.p_nom_extendable = true;
        self
    }
}

/// A fixed demand attached to a bus
#[derive(Debug, Clone)]
pub struct Load {
    pub id: LoadId,
    pub name: String,
    pub bus: BusId,
    /// Active power demand
    pub p_set: Megawatts,
}

impl Load {
    pub fn new(id: LoadId, name: impl Into<String>, bus: BusId, p_set_mw: f64) -> Self {
        Self {
            id,
            name: name.into(),
            bus,
            p_set: Megawatts(p_set_mw),
        }
    }
}

/// The network model: ordered component tables keyed by typed ids
#[derive(Debug, Default, Clone)]
pub struct Network {
    pub buses: BTreeMap<BusId, Bus>,
    pub lines: BTreeMap<LineId, Line>,
    pub links: BTreeMap<LinkId, Link>,
    pub generators: BTreeMap<GenId, Generator>,
    pub storage_units: BTreeMap<StorageId, StorageUnit>,
    pub loads: BTreeMap<LoadId, Load>,
}

/// Component counts and aggregate quantities for a network
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct NetworkStats {
    pub num_buses: usize,
    pub num_lines: usize,
    pub num_links: usize,
    pub num_gens: usize,
    pub num_storage_units: usize,
    pub num_loads: usize,
    pub total_load_mw: f64,
    pub total_gen_capacity_mw: f64,
    /// Components whose capacity is still a planning decision variable
    pub num_extendable: usize,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_bus(&mut self, bus: Bus) -> BusId {
        let id = bus.id;
        self.buses.insert(id, bus);
        id
    }

    pub fn add_line(&mut self, line: Line) -> LineId {
        let id = line.id;
        self.lines.insert(id, line);
        id
    }

    pub fn add_link(&mut self, link: Link) -> LinkId {
        let id = link.id;
        self.links.insert(id, link);
        id
    }

    pub fn add_generator(&mut self, gen: Generator) -> GenId {
        let id = gen.id;
        self.generators.insert(id, gen);
        id
    }

    pub fn add_storage_unit(&mut self, su: StorageUnit) -> StorageId {
        let id = su.id;
        self.storage_units.insert(id, su);
        id
    }

    pub fn add_load(&mut self, load: Load) -> LoadId {
        let id = load.id;
        self.loads.insert(id, load);
        id
    }

    /// Next free generator id (used when preparation adds shedding generators)
    pub fn next_gen_id(&self) -> GenId {
        GenId(self.generators.keys().last().map_or(1, |id| id.0 + 1))
    }

    /// Total active power demand attached to a bus
    pub fn load_at_bus(&self, bus: BusId) -> Megawatts {
        self.loads
            .values()
            .filter(|l| l.bus == bus)
            .map(|l| l.p_set)
            .sum()
    }

    /// Total active power demand of the network
    pub fn total_load_mw(&self) -> f64 {
        self.loads.values().map(|l| l.p_set.value()).sum()
    }

    /// Compute basic statistics about the network
    pub fn stats(&self) -> NetworkStats {
        let mut stats = NetworkStats {
            num_buses: self.buses.len(),
            num_lines: self.lines.len(),
            num_links: self.links.len(),
            num_gens: self.generators.len(),
            num_storage_units: self.storage_units.len(),
            num_loads: self.loads.len(),
            total_load_mw: self.total_load_mw(),
            ..NetworkStats::default()
        };

        for gen in self.generators.values() {
            stats.total_gen_capacity_mw += gen.p_nom.value() * gen.p_max_pu;
            if gen.p_nom_extendable {
                stats.num_extendable += 1;
            }
        }
        stats.num_extendable += self.lines.values().filter(|l| l.s_nom_extendable).count();
        stats.num_extendable += self.links.values().filter(|l| l.p_nom_extendable).count();
        stats.num_extendable += self
            .storage_units
            .values()
            .filter(|s| s.p_nom_extendable)
            .count();

        stats
    }

    /// Validate network data for common issues that cause solver failures.
    ///
    /// Populates the provided `Diagnostics` with any warnings/errors found.
    pub fn validate_into(&self, diag: &mut Diagnostics) {
        let stats = self.stats();

        if stats.num_buses == 0 {
            diag.add_error("structure", "Network has no buses");
            return; // Can't check further
        }

        if stats.num_loads == 0 {
            diag.add_warning("structure", "Network has no loads");
        }

        if stats.num_gens == 0 {
            diag.add_error("structure", "Network has no generators");
        }

        if stats.total_gen_capacity_mw < stats.total_load_mw {
            diag.add_warning(
                "capacity",
                &format!(
                    "Total generation capacity ({:.1} MW) is less than total load ({:.1} MW)",
                    stats.total_gen_capacity_mw, stats.total_load_mw
                ),
            );
        }

        for line in self.lines.values() {
            if !self.buses.contains_key(&line.bus0) || !self.buses.contains_key(&line.bus1) {
                diag.add_error_with_entity(
                    "reference",
                    "Line references non-existent bus",
                    &format!("Line {}", line.id.value()),
                );
            }
        }
        for link in self.links.values() {
            if !self.buses.contains_key(&link.bus0) || !self.buses.contains_key(&link.bus1) {
                diag.add_error_with_entity(
                    "reference",
                    "Link references non-existent bus",
                    &format!("Link {}", link.id.value()),
                );
            }
        }
        for gen in self.generators.values() {
            if !self.buses.contains_key(&gen.bus) {
                diag.add_error_with_entity(
                    "reference",
                    "Generator references non-existent bus",
                    &format!("Generator {}", gen.id.value()),
                );
            }
        }
        for su in self.storage_units.values() {
            if !self.buses.contains_key(&su.bus) {
                diag.add_error_with_entity(
                    "reference",
                    "Storage unit references non-existent bus",
                    &format!("StorageUnit {}", su.id.value()),
                );
            }
            if su.max_hours <= 0.0 {
                diag.add_error_with_entity(
                    "capacity",
                    "Storage unit has non-positive max_hours",
                    &format!("StorageUnit {}", su.id.value()),
                );
            }
        }
        for load in self.loads.values() {
            if !self.buses.contains_key(&load.bus) {
                diag.add_error_with_entity(
                    "reference",
                    "Load references non-existent bus",
                    &format!("Load {}", load.id.value()),
                );
            }
        }
    }
}
