//! Network JSON exporter
//!
//! Serializes a [`Network`] into the dictionary-keyed JSON format. Output is
//! pretty-printed with stable key order so solved networks diff cleanly
//! against their inputs.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use gridop_core::Network;

use crate::format::{
    BusJson, GeneratorJson, LineJson, LinkJson, LoadJson, NetworkJson, StorageUnitJson,
    FORMAT_VERSION,
};

/// Convert the in-memory model into its JSON mirror.
pub fn network_to_json(network: &Network, name: &str) -> NetworkJson {
    let mut json = NetworkJson {
        version: FORMAT_VERSION.to_string(),
        name: name.to_string(),
        ..NetworkJson::default()
    };

    for (id, bus) in &network.buses {
        json.buses.insert(
            id.value().to_string(),
            BusJson {
                name: bus.name.clone(),
                v_nom: bus.v_nom_kv,
                carrier: bus.carrier.clone(),
            },
        );
    }

    for (id, line) in &network.lines {
        json.lines.insert(
            id.value().to_string(),
            LineJson {
                name: line.name.clone(),
                bus0: line.bus0.value(),
                bus1: line.bus1.value(),
                type_name: line.type_name.clone(),
                s_nom: line.s_nom.value(),
                s_nom_opt: line.s_nom_opt.value(),
                s_nom_extendable: line.s_nom_extendable,
                s_nom_min: line.s_nom_min.value(),
                s_nom_max: line.s_nom_max.value(),
                r: line.r,
                x: line.x,
                num_parallel: line.num_parallel,
                s_max_pu: line.s_max_pu,
                capital_cost: line.capital_cost,
                p: line.p.value(),
            },
        );
    }

    for (id, link) in &network.links {
        json.links.insert(
            id.value().to_string(),
            LinkJson {
                name: link.name.clone(),
                bus0: link.bus0.value(),
                bus1: link.bus1.value(),
                p_nom: link.p_nom.value(),
                p_nom_opt: link.p_nom_opt.value(),
                p_nom_extendable: link.p_nom_extendable,
                p_nom_min: link.p_nom_min.value(),
                p_nom_max: link.p_nom_max.value(),
                efficiency: link.efficiency,
                marginal_cost: link.marginal_cost,
                capital_cost: link.capital_cost,
                p: link.p.value(),
            },
        );
    }

    for (id, gen) in &network.generators {
        json.generators.insert(
            id.value().to_string(),
            GeneratorJson {
                name: gen.name.clone(),
                bus: gen.bus.value(),
                carrier: gen.carrier.clone(),
                p_nom: gen.p_nom.value(),
                p_nom_opt: gen.p_nom_opt.value(),
                p_nom_extendable: gen.p_nom_extendable,
                p_nom_min: gen.p_nom_min.value(),
                p_nom_max: gen.p_nom_max.value(),
                p_min_pu: gen.p_min_pu,
                p_max_pu: gen.p_max_pu,
                marginal_cost: gen.marginal_cost,
                capital_cost: gen.capital_cost,
                p: gen.p.value(),
            },
        );
    }

    for (id, su) in &network.storage_units {
        json.storage_units.insert(
            id.value().to_string(),
            StorageUnitJson {
                name: su.name.clone(),
                bus: su.bus.value(),
                carrier: su.carrier.clone(),
                p_nom: su.p_nom.value(),
                p_nom_opt: su.p_nom_opt.value(),
                p_nom_extendable: su.p_nom_extendable,
                max_hours: su.max_hours,
                efficiency_store: su.efficiency_store,
                efficiency_dispatch: su.efficiency_dispatch,
                marginal_cost: su.marginal_cost,
                p: su.p.value(),
            },
        );
    }

    for (id, load) in &network.loads {
        json.loads.insert(
            id.value().to_string(),
            LoadJson {
                name: load.name.clone(),
                bus: load.bus.value(),
                p_set: load.p_set.value(),
            },
        );
    }

    json
}

/// Write a network to a JSON file.
pub fn save_network(path: impl AsRef<Path>, network: &Network) -> Result<()> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let json = network_to_json(network, &name);
    let contents = serde_json::to_string_pretty(&json).context("serializing network to JSON")?;
    fs::write(path, contents)
        .with_context(|| format!("writing network file '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::{load_network, network_from_json};
    use gridop_core::{Bus, BusId, GenId, Generator, Line, LineId, Load, LoadId};

    fn sample_network() -> Network {
        let mut n = Network::new();
        let b1 = n.add_bus(Bus::new(BusId::new(1), "Bus 1", 380.0));
        let b2 = n.add_bus(Bus::new(BusId::new(2), "Bus 2", 220.0));
        n.add_generator(
            Generator::new(GenId::new(1), "Gen 1", b1)
                .with_p_nom(75.0)
                .with_marginal_cost(18.5)
                .extendable(),
        );
        n.add_load(Load::new(LoadId::new(1), "Load 1", b2, 42.0));
        n.add_line(
            Line::new(LineId::new(1), "Line 1-2", b1, b2, 0.02, 0.15)
                .with_s_nom(100.0)
                .with_type("490-AL1/64-ST1A", 2.0),
        );
        n
    }

    #[test]
    fn roundtrip_preserves_tables() {
        let network = sample_network();
        let json = network_to_json(&network, "sample");
        let restored = network_from_json(json).unwrap();

        assert_eq!(restored.buses.len(), 2);
        let gen = &restored.generators[&GenId::new(1)];
        assert_eq!(gen.p_nom.value(), 75.0);
        assert_eq!(gen.marginal_cost, 18.5);
        assert!(gen.p_nom_extendable);

        let line = &restored.lines[&LineId::new(1)];
        assert_eq!(line.type_name, "490-AL1/64-ST1A");
        assert_eq!(line.num_parallel, 2.0);
        assert_eq!(line.x, 0.15);
    }

    #[test]
    fn save_and_load_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.json");
        let network = sample_network();

        save_network(&path, &network).unwrap();
        let restored = load_network(&path).unwrap();

        assert_eq!(restored.stats(), network.stats());
    }
}
