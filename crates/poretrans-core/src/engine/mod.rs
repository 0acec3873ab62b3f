//! # Engine Module
//!
//! The stateful half of the library. Where [`crate::core`] knows how two particles interact,
//! the engine knows which particles to ask and keeps the cached energies honest while the
//! configuration changes one trial move at a time.
//!
//! ## Architecture
//!
//! - **Spatial Index** ([`cell_index`]) - Cell-linked list over the solvent bath with journaled
//!   incremental relocation
//! - **Evaluation** ([`evaluator`]) - Per-particle energy over a pluggable solvent neighbourhood
//! - **Bulk Tasks** ([`tasks`]) - Whole-system energy passes: brute force, cell path, totals and
//!   the consistency check between the two
//! - **Simulation State** ([`simulation`]) - Owns the system and runs the trial-move transaction
//! - **Placement** ([`placement`]) - Initial solvent and chain configurations
//! - **Configuration** ([`config`]) - Validated run parameters and their builder
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Engine error type wrapping the lower layers

pub mod cell_index;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod placement;
pub mod progress;
pub mod simulation;
pub mod tasks;

#[cfg(test)]
pub(crate) mod test_support;
