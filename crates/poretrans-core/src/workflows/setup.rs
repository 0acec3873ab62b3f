use crate::core::models::system::ParticleSystem;
use crate::engine::config::SimulationConfig;
use crate::engine::error::EngineError;
use crate::engine::placement;
use crate::engine::progress::ProgressReporter;
use crate::engine::simulation::Simulation;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, instrument};

/// Builds the initial configuration described by `config` and computes its energies.
///
/// Solvent positions are drawn from a generator seeded with `config.seed`, so the same
/// configuration always yields the same system.
#[instrument(skip_all, name = "setup_workflow")]
pub fn run(config: &SimulationConfig, reporter: &ProgressReporter) -> Result<Simulation, EngineError> {
    let sim_box = config.sim_box();
    let solvent_count = config.solvent_count();

    let system = reporter.stage("Placing particles", || {
        info!(
            solvent = solvent_count,
            monomers = config.polymer.monomers,
            seed = config.seed,
            "Placing solvent bath and polymer chain."
        );
        let mut rng = StdRng::seed_from_u64(config.seed);
        let solvent = placement::place_solvent(
            &mut rng,
            &sim_box,
            solvent_count,
            &config.solvent.excluded_slabs,
            config.solvent.max_placement_attempts,
        )?;
        let chain = placement::place_chain(
            &sim_box,
            config.polymer.monomers,
            config.polymer.start_z,
            config.polymer.bond_length,
        );
        Ok::<_, EngineError>(ParticleSystem::with_particles(sim_box, solvent, chain))
    })?;

    reporter.stage("Computing initial energies", || {
        Simulation::new(system, config.forcefield, config.use_cell_list, reporter)
    })
}
