//! # gridop-solve: Operations Re-Dispatch
//!
//! The solving half of the pipeline: takes a base-case network plus a solved
//! capacity-expansion result and produces an operations dispatch against the
//! frozen capacities.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  OPERATIONS RE-DISPATCH                                      │
//! │  ──────────────────────                                      │
//! │                                                              │
//! │  base network ──┐                                            │
//! │                 ├─ transfer ──► frozen network               │
//! │  solved network ┘                   │                        │
//! │                                  prepare                     │
//! │                                     │                        │
//! │                                  dispatch (LP, Clarabel)     │
//! │                                     │                        │
//! │                              network with `p` columns        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`transfer`] copies optimized capacities onto the base case and clears
//!   the extendable flags (the original logic of this pipeline step).
//! - [`prepare`] re-prepares the frozen network: load shedding, availability
//!   clipping, cost jitter, validation.
//! - [`dispatch`] solves the single-snapshot linear dispatch via `good_lp`
//!   with the Clarabel backend and writes results back in place.

pub mod dispatch;
pub mod prepare;
pub mod transfer;

pub use dispatch::{solve_network, DispatchConfig, DispatchError, DispatchSummary};
pub use prepare::{prepare_network, PrepareOptions, LOAD_SHEDDING_CARRIER};
pub use transfer::apply_optimized_capacities;
