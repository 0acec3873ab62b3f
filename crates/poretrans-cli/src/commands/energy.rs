use crate::cli::EnergyArgs;
use crate::config::PartialSimulationConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use poretrans::core::models::ids::ParticleId;
use poretrans::core::models::system::ParticleSystem;
use poretrans::engine::progress::ProgressReporter;
use poretrans::workflows;
use serde::Serialize;
use std::fs::File;
use std::io;
use tracing::info;

#[derive(Debug, Serialize)]
struct EnergyRecord {
    population: &'static str,
    index: usize,
    x: f64,
    y: f64,
    z: f64,
    energy: f64,
}

pub fn run(args: EnergyArgs) -> Result<()> {
    let partial_config = PartialSimulationConfig::from_file(&args.run.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args.run)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Setting up the initial configuration...");
    let mut simulation = workflows::setup::run(&config, &reporter)?;

    if args.brute_force {
        info!("Recomputing energies by brute force.");
        let summary = simulation.recompute_brute_force(&reporter);
        if !summary.broken_bonds.is_empty() {
            return Err(CliError::Argument(format!(
                "brute-force pass found broken bonds at monomers {:?}",
                summary.broken_bonds
            )));
        }
    }

    let system = simulation.system();
    let solvent: f64 = system.solvent().iter().map(|p| p.energy).sum();
    let monomers: f64 = system.monomers().iter().map(|p| p.energy).sum();
    println!(
        "Particles: {} solvent, {} monomers",
        system.solvent_count(),
        system.monomer_count()
    );
    println!("Solvent energy:  {:.6}", solvent);
    println!("Monomer energy:  {:.6}", monomers);
    println!("Total energy:    {:.6}", simulation.total_energy());

    if let Some(path) = &args.output {
        info!("Writing per-particle energies to {:?}", path);
        let file = File::create(path)?;
        write_energies(system, file).map_err(|source| CliError::Output {
            path: path.clone(),
            source,
        })?;
        println!("✓ Per-particle energies written to: {}", path.display());
    }

    Ok(())
}

/// Writes one CSV row per particle, solvent first.
fn write_energies<W: io::Write>(system: &ParticleSystem, writer: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for id in system.particle_ids() {
        let Some(particle) = system.particle(id) else {
            continue;
        };
        let population = match id {
            ParticleId::Solvent(_) => "solvent",
            ParticleId::Monomer(_) => "monomer",
        };
        writer.serialize(EnergyRecord {
            population,
            index: id.index(),
            x: particle.position.x,
            y: particle.position.y,
            z: particle.position.z,
            energy: particle.energy,
        })?;
    }
    writer.flush()?;
    Ok(())
}
