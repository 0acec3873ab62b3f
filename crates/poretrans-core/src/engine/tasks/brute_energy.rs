use super::{EnergySummary, evaluate_with_progress};
use crate::core::forcefield::params::ForceField;
use crate::core::models::system::ParticleSystem;
use crate::engine::evaluator::AllSolvent;
use crate::engine::progress::ProgressReporter;
use tracing::{instrument, warn};

/// Recomputes every particle's energy by scanning all pairs, ignoring any cell index.
///
/// The previous cached energy of each particle is shifted into `previous_energy` before the
/// fresh value is stored, so running the pass twice on an unchanged system leaves every `energy`
/// and `previous_energy` equal.
#[instrument(skip_all, name = "brute_energy_task")]
pub fn run(
    system: &mut ParticleSystem,
    forcefield: &ForceField,
    reporter: &ProgressReporter,
) -> EnergySummary {
    let energies = evaluate_with_progress(system, forcefield, &AllSolvent, reporter);

    for (id, energy) in &energies {
        if let Some(particle) = system.particle_mut(*id) {
            particle.update_energy(energy.total());
        }
    }

    let summary = EnergySummary::from_energies(&energies);
    if !summary.broken_bonds.is_empty() {
        warn!(monomers = ?summary.broken_bonds, "Brute-force pass found broken bonds.");
    }
    summary
}
