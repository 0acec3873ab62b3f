use thiserror::Error;

use super::cell_index::CellIndexError;
use super::config::ConfigError;
use crate::core::forcefield::params::ParamLoadError;
use crate::core::models::ids::ParticleId;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Force field parameters rejected: {source}")]
    Params {
        #[from]
        source: ParamLoadError,
    },

    #[error("Cell index error: {source}")]
    CellIndex {
        #[from]
        source: CellIndexError,
    },

    #[error("Particle not found in system: {0}")]
    ParticleNotFound(ParticleId),

    #[error(
        "Could not place solvent particle {index} outside the excluded regions after {attempts} attempts"
    )]
    PlacementExhausted { index: usize, attempts: usize },

    #[error("Energy drift detected: cached total {cached:.9} differs from expected {expected:.9}")]
    EnergyDrift { cached: f64, expected: f64 },

    #[error(
        "Cell-list energies diverge from brute force: {cell_total:.9} vs {brute_total:.9} (worst deviation {max_deviation:e} on {worst})"
    )]
    InconsistentEnergies {
        cell_total: f64,
        brute_total: f64,
        max_deviation: f64,
        worst: ParticleId,
    },
}
