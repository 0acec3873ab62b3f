use crate::core::models::ids::ParticleId;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::simulation::{MoveOutcome, MoveStatistics, Simulation, TrialOutcome};
use crate::engine::tasks::consistency::ConsistencyReport;
use nalgebra::Vector3;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialSettings {
    /// Number of random displacement trials.
    pub trials: usize,
    /// Largest displacement per axis.
    pub max_step: f64,
    pub seed: u64,
}

/// Metropolis rule at unit temperature.
pub fn metropolis<R: Rng + ?Sized>(rng: &mut R, trial: &TrialOutcome) -> bool {
    let delta = trial.delta();
    delta <= 0.0 || rng.gen_range(0.0..1.0) < (-delta).exp()
}

/// Runs `settings.trials` random single-particle displacements under the Metropolis rule.
///
/// Particles are picked uniformly over both populations and displaced uniformly within
/// `[-max_step, max_step)` per axis. Every rolled-back bond break is reported as a
/// [`Progress::Message`].
#[instrument(skip_all, name = "random_trials")]
pub fn random_trials(
    simulation: &mut Simulation,
    settings: &TrialSettings,
    reporter: &ProgressReporter,
) -> Result<MoveStatistics, EngineError> {
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let solvent = simulation.system().solvent_count();
    let population = solvent + simulation.system().monomer_count();
    if population == 0 || settings.trials == 0 {
        return Ok(*simulation.statistics());
    }
    if !(settings.max_step.is_finite() && settings.max_step > 0.0) {
        return Err(EngineError::Initialization(format!(
            "maximum trial step must be positive, got {}",
            settings.max_step
        )));
    }

    reporter.pass(settings.trials as u64, |advance| {
        for _ in 0..settings.trials {
            let k = rng.gen_range(0..population);
            let id = if k < solvent {
                ParticleId::Solvent(k)
            } else {
                ParticleId::Monomer(k - solvent)
            };
            let step =
                Vector3::from_fn(|_, _| rng.gen_range(-settings.max_step..settings.max_step));
            let position = simulation
                .system()
                .particle(id)
                .ok_or(EngineError::ParticleNotFound(id))?
                .position
                + step;

            let outcome = simulation.try_move(id, position, |t| metropolis(&mut rng, t))?;
            if let MoveOutcome::BondBroken(trial) = outcome {
                debug!(%id, "Random trial would break a bond.");
                reporter.report(Progress::Message(format!(
                    "Bond break on {} rolled back",
                    trial.particle
                )));
            }
            advance();
        }
        Ok::<_, EngineError>(())
    })?;

    let statistics = *simulation.statistics();
    info!(
        solvent_acceptance = statistics.solvent.acceptance_ratio(),
        monomer_acceptance = statistics.monomer.acceptance_ratio(),
        bond_breaks = statistics.monomer.bond_breaks,
        "Random trials finished."
    );
    Ok(statistics)
}

/// Checks that the simulation's incremental state agrees with a full recompute.
///
/// Verifies the cell index, compares the neighbourhood energies with brute force, and checks
/// the cached energies against both the fresh values and the running total.
///
/// # Errors
///
/// The first failing check: a cell index error, [`EngineError::InconsistentEnergies`] or
/// [`EngineError::EnergyDrift`].
#[instrument(skip_all, name = "validate_workflow")]
pub fn run(
    simulation: &Simulation,
    tolerance: f64,
    reporter: &ProgressReporter,
) -> Result<ConsistencyReport, EngineError> {
    reporter.stage("Verifying cell index", || simulation.verify_cell_index())?;

    let report = reporter.stage("Comparing energies", || {
        simulation.consistency(tolerance, reporter)
    });

    if let (false, Some(worst)) = (report.is_consistent(), report.worst) {
        return Err(EngineError::InconsistentEnergies {
            cell_total: report.fast_total,
            brute_total: report.brute_total,
            max_deviation: report.max_deviation,
            worst,
        });
    }
    if !report.cache_is_current() {
        return Err(EngineError::EnergyDrift {
            cached: report.cached_total,
            expected: report.brute_total,
        });
    }
    simulation.check_drift(tolerance)?;

    info!(
        total = report.brute_total,
        max_deviation = report.max_deviation,
        "Incremental energies agree with brute force."
    );
    Ok(report)
}
