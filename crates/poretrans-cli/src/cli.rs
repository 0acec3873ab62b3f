use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "poretrans developers",
    version,
    about = "poretrans - Energy core of a Monte Carlo simulator for polymer translocation through a pore in a DPD solvent.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Set up the initial configuration and report its energies.
    Energy(EnergyArgs),
    /// Run random trial moves and check the incremental energies against brute force.
    Validate(ValidateArgs),
}

/// Arguments shared by every command that builds a simulation.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Path to the simulation configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Override `engine.seed` from the config file.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Evaluate energies by scanning all pairs instead of using the cell list.
    #[arg(long)]
    pub no_cell_list: bool,
}

/// Arguments for the `energy` subcommand.
#[derive(Args, Debug)]
pub struct EnergyArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Write per-particle positions and energies to a CSV file.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Recompute the energies by brute force after setup.
    #[arg(long)]
    pub brute_force: bool,
}

/// Arguments for the `validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Number of random trial moves to run before the final check.
    #[arg(short = 'n', long, default_value_t = 10_000, value_name = "INT")]
    pub trials: usize,

    /// Largest trial displacement per axis.
    #[arg(long, default_value_t = 0.5, value_name = "FLOAT")]
    pub max_step: f64,

    /// Relative tolerance for the comparison. Defaults to `engine.drift-tolerance`.
    #[arg(short, long, value_name = "FLOAT")]
    pub tolerance: Option<f64>,
}
