use crate::core::models::system::ParticleSystem;

/// Sum of the cached energies of every particle, solvent first.
///
/// No energy is recomputed. Each pair interaction appears once in each partner's cached
/// energy, so the result counts it twice.
pub fn run(system: &ParticleSystem) -> f64 {
    let solvent: f64 = system.solvent().iter().map(|p| p.energy).sum();
    let monomers: f64 = system.monomers().iter().map(|p| p.energy).sum();
    solvent + monomers
}
