use super::{evaluate_with_progress, within_tolerance};
use crate::core::forcefield::params::ForceField;
use crate::core::models::ids::ParticleId;
use crate::core::models::system::ParticleSystem;
use crate::engine::evaluator::{AllSolvent, SolventNeighborhood};
use crate::engine::progress::ProgressReporter;
use tracing::{debug, instrument};

/// Comparison of the neighbourhood-based energies with a brute-force recompute.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsistencyReport {
    /// Sum of the per-particle energies through the neighbourhood under test.
    pub fast_total: f64,
    /// Sum of the per-particle energies from the all-pairs scan.
    pub brute_total: f64,
    /// Sum of the energies cached on the particles.
    pub cached_total: f64,
    /// Largest per-particle deviation, relative to `max(1, |E|)`.
    pub max_deviation: f64,
    /// Particle with the largest deviation; `None` for an empty system.
    pub worst: Option<ParticleId>,
    pub tolerance: f64,
    /// Number of particles whose cached energy is off by more than the tolerance.
    pub stale_particles: usize,
}

impl ConsistencyReport {
    /// Both evaluation paths agree per particle and in total.
    pub fn is_consistent(&self) -> bool {
        self.max_deviation <= self.tolerance
            && within_tolerance(self.fast_total, self.brute_total, self.tolerance)
    }

    /// The cached energies still describe the current configuration.
    pub fn cache_is_current(&self) -> bool {
        self.stale_particles == 0
    }
}

/// Evaluates every particle twice, once through `neighborhood` and once by brute force, and
/// compares both against each other and against the cached energies. The system is not
/// modified.
#[instrument(skip_all, name = "consistency_task")]
pub fn run<N: SolventNeighborhood>(
    system: &ParticleSystem,
    forcefield: &ForceField,
    neighborhood: &N,
    tolerance: f64,
    reporter: &ProgressReporter,
) -> ConsistencyReport {
    let fast = evaluate_with_progress(system, forcefield, neighborhood, reporter);
    let brute = evaluate_with_progress(system, forcefield, &AllSolvent, reporter);

    let mut report = ConsistencyReport {
        fast_total: 0.0,
        brute_total: 0.0,
        cached_total: 0.0,
        max_deviation: 0.0,
        worst: None,
        tolerance,
        stale_particles: 0,
    };

    for ((id, a), (_, b)) in fast.iter().zip(&brute) {
        let (a, b) = (a.total(), b.total());
        report.fast_total += a;
        report.brute_total += b;

        let deviation = (a - b).abs() / b.abs().max(1.0);
        if report.worst.is_none() || deviation > report.max_deviation {
            report.max_deviation = deviation;
            report.worst = Some(*id);
        }

        if let Some(particle) = system.particle(*id) {
            report.cached_total += particle.energy;
            if !within_tolerance(particle.energy, b, tolerance) {
                report.stale_particles += 1;
            }
        }
    }

    debug!(
        fast = report.fast_total,
        brute = report.brute_total,
        max_deviation = report.max_deviation,
        "Consistency check finished."
    );
    report
}
