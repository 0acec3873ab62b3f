//! # poretrans Core Library
//!
//! The energy engine of a Monte Carlo simulator for a polymer chain translocating through a
//! pore, immersed in a bath of soft DPD solvent particles under periodic boundaries.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout:
//!
//! - **[`core`]: The Foundation.** Stateless particle models, periodic-box geometry and the
//!   pure mathematical form of the soft-repulsive pair potential and the FENE bond.
//!
//! - **[`engine`]: The Logic Core.** The stateful layer: the cell-linked-list index, the
//!   per-particle energy evaluator, bulk energy tasks and the [`engine::simulation::Simulation`]
//!   that runs closure-scoped trial moves with exact rollback.
//!
//! - **[`workflows`]: The Public API.** Builds a ready-to-run simulation from a configuration
//!   and checks the incremental energy bookkeeping against the brute-force oracle.

pub mod core;
pub mod engine;
pub mod workflows;
