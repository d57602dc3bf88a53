//! Network JSON importer
//!
//! Reads the dictionary-keyed JSON network format into a [`Network`]. Absent
//! columns take their schema defaults, so the importer accepts files written
//! by older pipeline stages.

use std::{fs, path::Path};

use anyhow::{anyhow, Context, Result};
use gridop_core::{
    Bus, BusId, GenId, Generator, Line, LineId, Link, LinkId, Load, LoadId, MegavoltAmperes,
    Megawatts, Network, StorageId, StorageUnit,
};

use crate::format::{version_compatible, NetworkJson, FORMAT_VERSION};

fn parse_key(table: &str, key: &str) -> Result<usize> {
    key.parse::<usize>()
        .with_context(|| format!("invalid {table} id '{key}' (expected integer key)"))
}

/// Load a network from a JSON file.
pub fn load_network(path: impl AsRef<Path>) -> Result<Network> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading network file '{}'", path.display()))?;
    let json: NetworkJson = serde_json::from_str(&contents)
        .with_context(|| format!("parsing network file '{}'", path.display()))?;
    network_from_json(json).with_context(|| format!("importing network '{}'", path.display()))
}

/// Convert parsed JSON into the in-memory model.
pub fn network_from_json(json: NetworkJson) -> Result<Network> {
    if !version_compatible(&json.version) {
        return Err(anyhow!(
            "unsupported network format version '{}' (reader supports {})",
            json.version,
            FORMAT_VERSION
        ));
    }

    let mut network = Network::new();

    for (key, bus) in &json.buses {
        let id = BusId::new(parse_key("bus", key)?);
        network.add_bus(Bus {
            id,
            name: bus.name.clone(),
            v_nom_kv: bus.v_nom,
            carrier: bus.carrier.clone(),
        });
    }

    for (key, line) in &json.lines {
        let id = LineId::new(parse_key("line", key)?);
        network.add_line(Line {
            id,
            name: line.name.clone(),
            bus0: BusId::new(line.bus0),
            bus1: BusId::new(line.bus1),
            type_name: line.type_name.clone(),
            s_nom: MegavoltAmperes(line.s_nom),
            s_nom_opt: MegavoltAmperes(line.s_nom_opt),
            s_nom_extendable: line.s_nom_extendable,
            s_nom_min: MegavoltAmperes(line.s_nom_min),
            s_nom_max: MegavoltAmperes(line.s_nom_max),
            r: line.r,
            x: line.x,
            num_parallel: line.num_parallel,
            s_max_pu: line.s_max_pu,
            capital_cost: line.capital_cost,
            p: Megawatts(line.p),
        });
    }

    for (key, link) in &json.links {
        let id = LinkId::new(parse_key("link", key)?);
        network.add_link(Link {
            id,
            name: link.name.clone(),
            bus0: BusId::new(link.bus0),
            bus1: BusId::new(link.bus1),
            p_nom: Megawatts(link.p_nom),
            p_nom_opt: Megawatts(link.p_nom_opt),
            p_nom_extendable: link.p_nom_extendable,
            p_nom_min: Megawatts(link.p_nom_min),
            p_nom_max: Megawatts(link.p_nom_max),
            efficiency: link.efficiency,
            marginal_cost: link.marginal_cost,
            capital_cost: link.capital_cost,
            p: Megawatts(link.p),
        });
    }

    for (key, gen) in &json.generators {
        let id = GenId::new(parse_key("generator", key)?);
        network.add_generator(Generator {
            id,
            name: gen.name.clone(),
            bus: BusId::new(gen.bus),
            carrier: gen.carrier.clone(),
            p_nom: Megawatts(gen.p_nom),
            p_nom_opt: Megawatts(gen.p_nom_opt),
            p_nom_extendable: gen.p_nom_extendable,
            p_nom_min: Megawatts(gen.p_nom_min),
            p_nom_max: Megawatts(gen.p_nom_max),
            p_min_pu: gen.p_min_pu,
            p_max_pu: gen.p_max_pu,
            marginal_cost: gen.marginal_cost,
            capital_cost: gen.capital_cost,
            p: Megawatts(gen.p),
        });
    }

    for (key, su) in &json.storage_units {
        let id = StorageId::new(parse_key("storage unit", key)?);
        network.add_storage_unit(StorageUnit {
            id,
            name: su.name.clone(),
            bus: BusId::new(su.bus),
            carrier: su.carrier.clone(),
            p_nom: Megawatts(su.p_nom),
            p_nom_opt: Megawatts(su.p_nom_opt),
            p_nom_extendable: su.p_nom_extendable,
            max_hours: su.max_hours,
            efficiency_store: su.efficiency_store,
            efficiency_dispatch: su.efficiency_dispatch,
            marginal_cost: su.marginal_cost,
            p: Megawatts(su.p),
        });
    }

    for (key, load) in &json.loads {
        let id = LoadId::new(parse_key("load", key)?);
        network.add_load(Load {
            id,
            name: load.name.clone(),
            bus: BusId::new(load.bus),
            p_set: Megawatts(load.p_set),
        });
    }

    Ok(network)
}
