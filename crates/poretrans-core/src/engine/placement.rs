use nalgebra::Vector3;
use rand::Rng;
use serde::Deserialize;
use tracing::debug;

use super::error::EngineError;
use crate::core::geometry::SimBox;
use crate::core::models::particle::Particle;

/// A region of the box that solvent particles must not be placed in.
pub trait ExclusionZone {
    fn contains(&self, position: &Vector3<f64>) -> bool;

    /// Volume of the region inside the primary box.
    fn excluded_volume(&self, sim_box: &SimBox) -> f64;
}

/// A slab spanning the full box cross-section between two heights, `min_z <= z < max_z`.
///
/// Models the membrane the pore is cut through.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SlabExclusion {
    pub min_z: f64,
    pub max_z: f64,
}

impl SlabExclusion {
    pub fn new(min_z: f64, max_z: f64) -> Self {
        Self { min_z, max_z }
    }
}

impl ExclusionZone for SlabExclusion {
    #[inline]
    fn contains(&self, position: &Vector3<f64>) -> bool {
        position.z >= self.min_z && position.z < self.max_z
    }

    fn excluded_volume(&self, sim_box: &SimBox) -> f64 {
        let lengths = sim_box.lengths();
        let thickness = (self.max_z.min(lengths.z) - self.min_z.max(0.0)).max(0.0);
        lengths.x * lengths.y * thickness
    }
}

/// Box volume left for the solvent once every zone is removed.
///
/// Overlapping zones are subtracted once per zone.
pub fn free_volume<Z: ExclusionZone>(sim_box: &SimBox, zones: &[Z]) -> f64 {
    let excluded: f64 = zones.iter().map(|z| z.excluded_volume(sim_box)).sum();
    (sim_box.volume() - excluded).max(0.0)
}

/// Scatters `count` solvent particles uniformly over the box, outside every exclusion zone.
///
/// Each particle gets at most `max_attempts` draws before placement is abandoned.
///
/// # Errors
///
/// Returns [`EngineError::PlacementExhausted`] for the first particle that runs out of attempts.
pub fn place_solvent<R, Z>(
    rng: &mut R,
    sim_box: &SimBox,
    count: usize,
    zones: &[Z],
    max_attempts: usize,
) -> Result<Vec<Particle>, EngineError>
where
    R: Rng + ?Sized,
    Z: ExclusionZone,
{
    let lengths = *sim_box.lengths();
    let mut placed = Vec::with_capacity(count);
    let mut draws = 0usize;

    for index in 0..count {
        let position = (0..max_attempts)
            .map(|_| {
                draws += 1;
                Vector3::new(
                    rng.gen_range(0.0..lengths.x),
                    rng.gen_range(0.0..lengths.y),
                    rng.gen_range(0.0..lengths.z),
                )
            })
            .find(|r| !zones.iter().any(|zone| zone.contains(r)))
            .ok_or(EngineError::PlacementExhausted {
                index,
                attempts: max_attempts,
            })?;
        placed.push(Particle::new(position));
    }

    debug!(count, draws, "Placed solvent particles.");
    Ok(placed)
}

/// Lays out a straight chain along `z` through the box centre, starting at `start_z`.
///
/// Positions past the top of the box wrap around periodically.
pub fn place_chain(sim_box: &SimBox, count: usize, start_z: f64, bond_length: f64) -> Vec<Particle> {
    let lengths = sim_box.lengths();
    (0..count)
        .map(|i| {
            let r = Vector3::new(
                0.5 * lengths.x,
                0.5 * lengths.y,
                start_z + i as f64 * bond_length,
            );
            Particle::new(sim_box.wrap(&r))
        })
        .collect()
}
