//! Whole-system energy passes.
//!
//! Each submodule exposes a single `run` entry point. The brute-force and cell-path passes
//! write cached energies back into the system; the total and consistency passes only read.

pub mod brute_energy;
pub mod cell_energy;
pub mod consistency;
pub mod total_energy;

use super::evaluator::{EnergyEvaluator, ParticleEnergy, SolventNeighborhood};
use super::progress::ProgressReporter;
use crate::core::forcefield::params::ForceField;
use crate::core::forcefield::term::EnergyTerm;
use crate::core::models::ids::ParticleId;
use crate::core::models::system::ParticleSystem;

/// Aggregate result of a pass that recomputed every particle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnergySummary {
    /// Per-type sum over all particles. Pair energies are counted once from each side.
    pub term: EnergyTerm,
    /// Monomers whose evaluation reported a broken bond.
    pub broken_bonds: Vec<usize>,
}

impl EnergySummary {
    pub fn total(&self) -> f64 {
        self.term.total()
    }

    fn from_energies(energies: &[(ParticleId, ParticleEnergy)]) -> Self {
        let term = energies.iter().map(|(_, e)| e.term).sum();
        let broken_bonds = energies
            .iter()
            .filter(|(_, e)| e.bond_broken)
            .map(|(id, _)| id.index())
            .collect();
        Self { term, broken_bonds }
    }
}

/// `true` when `a` and `b` agree to within `tolerance` relative to the larger magnitude, with
/// magnitudes below 1 treated as 1.
#[inline]
pub fn within_tolerance(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance * a.abs().max(b.abs()).max(1.0)
}

fn evaluate_with_progress<N: SolventNeighborhood>(
    system: &ParticleSystem,
    forcefield: &ForceField,
    neighborhood: &N,
    reporter: &ProgressReporter,
) -> Vec<(ParticleId, ParticleEnergy)> {
    let total = (system.solvent_count() + system.monomer_count()) as u64;
    let evaluator = EnergyEvaluator::new(system, forcefield, neighborhood);
    reporter.pass(total, |advance| evaluator.evaluate_all(advance))
}
