use crate::cli::ValidateArgs;
use crate::config::PartialSimulationConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use poretrans::engine::progress::ProgressReporter;
use poretrans::engine::simulation::MoveCounter;
use poretrans::workflows::{self, validate::TrialSettings};
use tracing::info;

pub fn run(args: ValidateArgs) -> Result<()> {
    if !(args.max_step.is_finite() && args.max_step > 0.0) {
        return Err(CliError::Argument(format!(
            "--max-step must be a positive number, got {}",
            args.max_step
        )));
    }

    let config = PartialSimulationConfig::from_file(&args.run.config)?.merge_with_cli(&args.run)?;
    let tolerance = args.tolerance.unwrap_or(config.drift_tolerance);
    if !(tolerance.is_finite() && tolerance > 0.0) {
        return Err(CliError::Argument(format!(
            "--tolerance must be a positive number, got {}",
            tolerance
        )));
    }

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Setting up the initial configuration...");
    let mut simulation = workflows::setup::run(&config, &reporter)?;
    workflows::validate::run(&simulation, tolerance, &reporter)?;
    info!("Initial configuration is consistent.");

    let settings = TrialSettings {
        trials: args.trials,
        max_step: args.max_step,
        seed: config.seed.wrapping_add(1),
    };
    println!("Running {} random trial moves...", settings.trials);
    let statistics = reporter.stage("Running trial moves", || {
        workflows::validate::random_trials(&mut simulation, &settings, &reporter)
    })?;

    let report = workflows::validate::run(&simulation, tolerance, &reporter)?;

    print_counter("Solvent", &statistics.solvent);
    print_counter("Monomer", &statistics.monomer);
    println!(
        "Energy: {:.9} (running {:.9}), worst relative deviation {:.3e}",
        report.brute_total,
        simulation.running_energy(),
        report.max_deviation
    );
    println!("✓ Incremental energies agree with brute force within {:e}.", tolerance);
    Ok(())
}

fn print_counter(label: &str, counter: &MoveCounter) {
    println!(
        "{} moves: {} attempted, {} accepted ({:.1}%), {} bond breaks",
        label,
        counter.attempted,
        counter.accepted,
        100.0 * counter.acceptance_ratio(),
        counter.bond_breaks
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::RunArgs;
    use crate::commands::test_support::write_config;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn validate_args(config: PathBuf, no_cell_list: bool) -> ValidateArgs {
        ValidateArgs {
            run: RunArgs {
                config,
                seed: None,
                no_cell_list,
            },
            trials: 500,
            max_step: 0.3,
            tolerance: None,
        }
    }

    #[test]
    fn validate_command_passes_with_and_without_the_cell_list() {
        let dir = tempdir().unwrap();
        let config = write_config(dir.path());
        run(validate_args(config.clone(), false)).unwrap();
        run(validate_args(config, true)).unwrap();
    }

    #[test]
    fn non_positive_step_is_an_argument_error() {
        let dir = tempdir().unwrap();
        let mut args = validate_args(write_config(dir.path()), false);
        args.max_step = -1.0;
        assert!(matches!(run(args), Err(CliError::Argument(_))));
    }

    #[test]
    fn non_positive_tolerance_is_an_argument_error() {
        let dir = tempdir().unwrap();
        let mut args = validate_args(write_config(dir.path()), false);
        args.tolerance = Some(0.0);
        assert!(matches!(run(args), Err(CliError::Argument(_))));
    }
}
