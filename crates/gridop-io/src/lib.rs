//! # gridop-io: Network Serialization
//!
//! Reads and writes the JSON network format used between pipeline stages.
//! Component tables are stored as dictionaries keyed by stringified id; every
//! optional column has a schema default so older files keep loading as the
//! format grows (the version field gates incompatible major revisions).
//!
//! ```no_run
//! use gridop_io::{load_network, save_network};
//!
//! # fn main() -> anyhow::Result<()> {
//! let network = load_network("networks/elec_s_45.json")?;
//! // ... transform ...
//! save_network("results/elec_s_45_op.json", &network)?;
//! # Ok(())
//! # }
//! ```

pub mod exporter;
pub mod format;
pub mod importer;

pub use exporter::{network_to_json, save_network};
pub use format::{NetworkJson, FORMAT_VERSION};
pub use importer::{load_network, network_from_json};
