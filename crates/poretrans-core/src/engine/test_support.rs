use crate::core::geometry::SimBox;
use crate::core::models::particle::Particle;
use crate::core::models::system::ParticleSystem;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub(crate) fn random_solvent(sim_box: &SimBox, n: usize, seed: u64) -> Vec<Particle> {
    let mut rng = StdRng::seed_from_u64(seed);
    let lengths = *sim_box.lengths();
    (0..n)
        .map(|_| {
            Particle::new(Vector3::new(
                rng.gen_range(0.0..lengths.x),
                rng.gen_range(0.0..lengths.y),
                rng.gen_range(0.0..lengths.z),
            ))
        })
        .collect()
}

pub(crate) fn straight_chain(sim_box: &SimBox, n: usize, spacing: f64) -> Vec<Particle> {
    let lengths = sim_box.lengths();
    (0..n)
        .map(|i| {
            sim_box.wrap(&Vector3::new(
                0.5 * lengths.x,
                0.5 * lengths.y,
                0.25 * lengths.z + i as f64 * spacing,
            ))
        })
        .map(Particle::new)
        .collect()
}

/// 4 monomers and 50 solvent particles in a 10x10x10 box.
pub(crate) fn reference_system(seed: u64) -> ParticleSystem {
    let sim_box = SimBox::cubic(10.0);
    let solvent = random_solvent(&sim_box, 50, seed);
    let monomers = straight_chain(&sim_box, 4, 0.7);
    ParticleSystem::with_particles(sim_box, solvent, monomers)
}

/// A denser system where most particles have several neighbours inside the cutoff.
pub(crate) fn crowded_system(seed: u64) -> ParticleSystem {
    let sim_box = SimBox::new(Vector3::new(5.0, 4.0, 6.0));
    let solvent = random_solvent(&sim_box, 300, seed);
    let monomers = straight_chain(&sim_box, 6, 0.8);
    ParticleSystem::with_particles(sim_box, solvent, monomers)
}
