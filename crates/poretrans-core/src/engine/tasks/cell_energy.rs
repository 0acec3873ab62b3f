use super::{EnergySummary, evaluate_with_progress};
use crate::core::forcefield::params::ForceField;
use crate::core::models::system::ParticleSystem;
use crate::engine::evaluator::SolventNeighborhood;
use crate::engine::progress::ProgressReporter;
use tracing::{info, instrument, warn};

/// Computes the starting energy of every particle through `neighborhood` and stores it as both
/// the current and the previous energy.
#[instrument(skip_all, name = "cell_energy_task")]
pub fn run<N: SolventNeighborhood>(
    system: &mut ParticleSystem,
    forcefield: &ForceField,
    neighborhood: &N,
    reporter: &ProgressReporter,
) -> EnergySummary {
    let energies = evaluate_with_progress(system, forcefield, neighborhood, reporter);

    for (id, energy) in &energies {
        if let Some(particle) = system.particle_mut(*id) {
            particle.energy = energy.total();
            particle.previous_energy = particle.energy;
        }
    }

    let summary = EnergySummary::from_energies(&energies);
    if !summary.broken_bonds.is_empty() {
        warn!(monomers = ?summary.broken_bonds, "Initial configuration has broken bonds.");
    }
    info!(total = summary.total(), "Initial energies computed.");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::cell_index::CellIndex;
    use crate::engine::tasks::brute_energy;
    use crate::engine::test_support::crowded_system;

    #[test]
    fn stores_matching_current_and_previous_energies() {
        let mut system = crowded_system(21);
        let forcefield = ForceField::default();
        let mut cells = CellIndex::new(system.sim_box(), forcefield.cutoff).unwrap();
        cells.build(system.solvent_mut());

        run(&mut system, &forcefield, &cells, &ProgressReporter::new());

        for p in system.solvent().iter().chain(system.monomers()) {
            assert_eq!(p.energy, p.previous_energy);
        }
        assert!(system.solvent().iter().any(|p| p.energy > 0.0));
    }

    #[test]
    fn agrees_with_the_brute_force_pass() {
        let mut system = crowded_system(22);
        let forcefield = ForceField::default();
        let mut cells = CellIndex::new(system.sim_box(), forcefield.cutoff).unwrap();
        cells.build(system.solvent_mut());

        let fast = run(&mut system, &forcefield, &cells, &ProgressReporter::new());
        let slow = brute_energy::run(&mut system, &forcefield, &ProgressReporter::new());
        assert!((fast.total() - slow.total()).abs() <= 1e-9 * slow.total().abs().max(1.0));
    }
}
