use nalgebra::Vector3;
use thiserror::Error;

use super::placement::{self, SlabExclusion};
use crate::core::forcefield::params::{ForceField, ParamLoadError};
use crate::core::forcefield::potentials::{self, BondEnergy};
use crate::core::geometry::SimBox;

pub const DEFAULT_MAX_PLACEMENT_ATTEMPTS: usize = 10_000;
pub const DEFAULT_SEED: u64 = 1;
pub const DEFAULT_DRIFT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolventConfig {
    /// Number density of the bath in the volume left free by the excluded slabs.
    pub density: f64,
    pub excluded_slabs: Vec<SlabExclusion>,
    pub max_placement_attempts: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolymerConfig {
    pub monomers: usize,
    /// Height of the first monomer of the initial straight chain.
    pub start_z: f64,
    /// Spacing between consecutive monomers of the initial chain.
    pub bond_length: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub box_lengths: Vector3<f64>,
    pub forcefield: ForceField,
    pub solvent: SolventConfig,
    pub polymer: PolymerConfig,
    pub use_cell_list: bool,
    pub seed: u64,
    /// Relative tolerance used by drift and consistency checks.
    pub drift_tolerance: f64,
}

impl SimulationConfig {
    pub fn sim_box(&self) -> SimBox {
        SimBox::new(self.box_lengths)
    }

    /// Number of solvent particles implied by the density and the free volume, truncated.
    pub fn solvent_count(&self) -> usize {
        let volume = placement::free_volume(&self.sim_box(), &self.solvent.excluded_slabs);
        (self.solvent.density * volume) as usize
    }
}

#[derive(Default)]
pub struct SimulationConfigBuilder {
    box_lengths: Option<Vector3<f64>>,
    forcefield: Option<ForceField>,
    solvent_density: Option<f64>,
    excluded_slabs: Option<Vec<SlabExclusion>>,
    max_placement_attempts: Option<usize>,
    monomers: Option<usize>,
    chain_start_z: Option<f64>,
    chain_bond_length: Option<f64>,
    use_cell_list: Option<bool>,
    seed: Option<u64>,
    drift_tolerance: Option<f64>,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn box_lengths(mut self, lengths: Vector3<f64>) -> Self {
        self.box_lengths = Some(lengths);
        self
    }
    pub fn forcefield(mut self, forcefield: ForceField) -> Self {
        self.forcefield = Some(forcefield);
        self
    }
    pub fn solvent_density(mut self, density: f64) -> Self {
        self.solvent_density = Some(density);
        self
    }
    pub fn excluded_slabs(mut self, slabs: Vec<SlabExclusion>) -> Self {
        self.excluded_slabs = Some(slabs);
        self
    }
    pub fn max_placement_attempts(mut self, attempts: usize) -> Self {
        self.max_placement_attempts = Some(attempts);
        self
    }
    pub fn monomers(mut self, n: usize) -> Self {
        self.monomers = Some(n);
        self
    }
    pub fn chain_start_z(mut self, z: f64) -> Self {
        self.chain_start_z = Some(z);
        self
    }
    pub fn chain_bond_length(mut self, length: f64) -> Self {
        self.chain_bond_length = Some(length);
        self
    }
    pub fn use_cell_list(mut self, enabled: bool) -> Self {
        self.use_cell_list = Some(enabled);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn drift_tolerance(mut self, tolerance: f64) -> Self {
        self.drift_tolerance = Some(tolerance);
        self
    }

    /// Assembles and validates the configuration.
    ///
    /// The box lengths, solvent density and monomer count are required. Everything else has a
    /// default: the reference force field, no excluded slabs, a chain of equilibrium-length
    /// bonds centred on the box, the cell list enabled, seed 1 and a `1e-9` drift tolerance.
    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let box_lengths = self
            .box_lengths
            .ok_or(ConfigError::MissingParameter("box_lengths"))?;
        let forcefield = self.forcefield.unwrap_or_default();
        let monomers = self
            .monomers
            .ok_or(ConfigError::MissingParameter("monomers"))?;
        let bond_length = self.chain_bond_length.unwrap_or(forcefield.fene.r_eq);
        let span = monomers.saturating_sub(1) as f64 * bond_length;

        let config = SimulationConfig {
            box_lengths,
            forcefield,
            solvent: SolventConfig {
                density: self
                    .solvent_density
                    .ok_or(ConfigError::MissingParameter("solvent_density"))?,
                excluded_slabs: self.excluded_slabs.unwrap_or_default(),
                max_placement_attempts: self
                    .max_placement_attempts
                    .unwrap_or(DEFAULT_MAX_PLACEMENT_ATTEMPTS),
            },
            polymer: PolymerConfig {
                monomers,
                start_z: self
                    .chain_start_z
                    .unwrap_or(0.5 * (box_lengths.z - span)),
                bond_length,
            },
            use_cell_list: self.use_cell_list.unwrap_or(true),
            seed: self.seed.unwrap_or(DEFAULT_SEED),
            drift_tolerance: self.drift_tolerance.unwrap_or(DEFAULT_DRIFT_TOLERANCE),
        };
        validate(&config)?;
        Ok(config)
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

fn validate(config: &SimulationConfig) -> Result<(), ConfigError> {
    if !config.box_lengths.iter().all(|l| l.is_finite() && *l > 0.0) {
        return Err(invalid("box_lengths", "every box length must be positive"));
    }

    config.forcefield.validate().map_err(|e| match e {
        ParamLoadError::Invalid { name, reason } => invalid(name, reason),
        other => invalid("forcefield", other.to_string()),
    })?;

    let min_length = config.box_lengths.min();
    if config.forcefield.cutoff > 0.5 * min_length {
        return Err(invalid(
            "cutoff",
            format!(
                "cutoff {} exceeds half the shortest box length {}",
                config.forcefield.cutoff, min_length
            ),
        ));
    }

    let density = config.solvent.density;
    if !(density.is_finite() && density >= 0.0) {
        return Err(invalid("solvent_density", "must be a non-negative number"));
    }
    if config.solvent.max_placement_attempts == 0 {
        return Err(invalid("max_placement_attempts", "must be at least 1"));
    }
    for slab in &config.solvent.excluded_slabs {
        if !(slab.min_z.is_finite() && slab.max_z.is_finite() && slab.min_z < slab.max_z) {
            return Err(invalid(
                "excluded_slabs",
                format!("slab [{}, {}) is empty or not finite", slab.min_z, slab.max_z),
            ));
        }
    }

    let bond_length = config.polymer.bond_length;
    if !(bond_length.is_finite() && bond_length > 0.0) {
        return Err(invalid("chain_bond_length", "must be positive"));
    }
    if config.polymer.monomers > 1
        && matches!(
            potentials::fene(bond_length, &config.forcefield.fene),
            BondEnergy::Broken
        )
    {
        return Err(invalid(
            "chain_bond_length",
            format!("a bond of length {} is already broken", bond_length),
        ));
    }
    if !config.polymer.start_z.is_finite() {
        return Err(invalid("chain_start_z", "must be finite"));
    }

    if !(config.drift_tolerance.is_finite() && config.drift_tolerance > 0.0) {
        return Err(invalid("drift_tolerance", "must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::new()
            .box_lengths(Vector3::new(10.0, 10.0, 20.0))
            .solvent_density(3.0)
            .monomers(8)
    }

    #[test]
    fn builder_fills_defaults_for_optional_parameters() {
        let config = minimal_builder().build().unwrap();
        assert_eq!(config.forcefield, ForceField::default());
        assert!(config.use_cell_list);
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.solvent.max_placement_attempts, DEFAULT_MAX_PLACEMENT_ATTEMPTS);
        assert_eq!(config.polymer.bond_length, 0.7);
        assert!((config.polymer.start_z - 0.5 * (20.0 - 7.0 * 0.7)).abs() < 1e-12);
    }

    #[test]
    fn builder_reports_the_first_missing_parameter() {
        let err = SimulationConfigBuilder::new().build().unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("box_lengths"));

        let err = SimulationConfigBuilder::new()
            .box_lengths(Vector3::repeat(10.0))
            .monomers(4)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("solvent_density"));
    }

    #[test]
    fn solvent_count_uses_the_volume_outside_excluded_slabs() {
        let config = minimal_builder()
            .excluded_slabs(vec![SlabExclusion::new(9.0, 11.0)])
            .build()
            .unwrap();
        assert_eq!(config.solvent_count(), (3.0 * (2000.0 - 200.0)) as usize);
    }

    #[test]
    fn cutoff_longer_than_half_the_box_is_rejected() {
        let forcefield = ForceField {
            cutoff: 6.0,
            ..ForceField::default()
        };
        let err = minimal_builder().forcefield(forcefield).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { name: "cutoff", .. }));
    }

    #[test]
    fn initially_broken_bond_length_is_rejected() {
        let err = minimal_builder().chain_bond_length(2.0).build().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidParameter {
                name: "chain_bond_length",
                ..
            }
        ));
    }

    #[test]
    fn forcefield_validation_errors_are_reported_by_name() {
        let mut forcefield = ForceField::default();
        forcefield.fene.r_max = 0.5;
        let err = minimal_builder().forcefield(forcefield).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { name: "fene.r-max", .. }));
    }

    #[test]
    fn empty_slab_is_rejected() {
        let err = minimal_builder()
            .excluded_slabs(vec![SlabExclusion::new(5.0, 5.0)])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { name: "excluded_slabs", .. }));
    }
}
