//! # Workflows Module
//!
//! Top-level entry points that tie the engine together for a complete task.
//!
//! - **Setup** ([`setup`]) - Places the solvent bath and the chain from a
//!   [`SimulationConfig`](crate::engine::config::SimulationConfig) and returns a simulation
//!   with its initial energies computed.
//! - **Validation** ([`validate`]) - Exercises the trial-move machinery with random
//!   displacements and checks the incremental energies against a brute-force recompute.

pub mod setup;
pub mod validate;
