//! Capacity transfer from a solved planning network.
//!
//! A capacity-expansion run decides component sizes; the operations run must
//! dispatch against exactly those sizes. This module copies the optimized
//! capacities onto the base-case network and freezes them, so the second
//! optimization pass sees no remaining expansion variables.

use gridop_core::{Megawatts, Network};

/// Copy optimized sizing decisions onto `n` and mark them non-extendable.
///
/// Component tables of both networks are keyed by the same ids (both files
/// descend from the same base network), so the transfer is a keyed column
/// copy:
///
/// - Lines with a standard type keep their type-derived impedance and only
///   inherit the optimized number of parallel circuits.
/// - Untyped lines inherit rating, resistance and reactance verbatim.
/// - After the line pass no line remains extendable, whatever its prior flag.
/// - Links, generators and storage units that are still extendable in `n`
///   take the optimized capacity of the matching component, defaulting to
///   zero when the reference has no such entry, and lose their flag.
///
/// The function is total: absent reference entries are not an error.
pub fn apply_optimized_capacities(n: &mut Network, optimized: &Network) {
    for (id, line) in n.lines.iter_mut() {
        if let Some(opt) = optimized.lines.get(id) {
            if line.is_untyped() {
                line.s_nom = opt.s_nom;
                line.r = opt.r;
                line.x = opt.x;
            } else {
                line.num_parallel = opt.num_parallel;
            }
        }
        line.s_nom_extendable = false;
    }

    for (id, link) in n.links.iter_mut() {
        if !link.p_nom_extendable {
            continue;
        }
        link.p_nom = optimized
            .links
            .get(id)
            .map_or(Megawatts(0.0), |l| l.p_nom_opt);
        link.p_nom_extendable = false;
    }

    for (id, gen) in n.generators.iter_mut() {
        if !gen.p_nom_extendable {
            continue;
        }
        gen.p_nom = optimized
            .generators
            .get(id)
            .map_or(Megawatts(0.0), |g| g.p_nom_opt);
        gen.p_nom_extendable = false;
    }

    for (id, su) in n.storage_units.iter_mut() {
        if !su.p_nom_extendable {
            continue;
        }
        su.p_nom = optimized
            .storage_units
            .get(id)
            .map_or(Megawatts(0.0), |s| s.p_nom_opt);
        su.p_nom_extendable = false;
    }
}
