use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use nalgebra::Vector3;
use poretrans::core::forcefield::params::ForceField;
use poretrans::engine::config::{SimulationConfig, SimulationConfigBuilder};
use poretrans::engine::placement::SlabExclusion;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialBoxConfig {
    lengths: Option<[f64; 3]>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSolventConfig {
    density: Option<f64>,
    excluded_slabs: Option<Vec<SlabExclusion>>,
    max_placement_attempts: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialPolymerConfig {
    monomers: Option<usize>,
    start_z: Option<f64>,
    bond_length: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialEngineConfig {
    cell_list: Option<bool>,
    seed: Option<u64>,
    drift_tolerance: Option<f64>,
}

/// The configuration file as written: every section and key is optional until merged.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialSimulationConfig {
    #[serde(rename = "box")]
    sim_box: Option<PartialBoxConfig>,
    solvent: Option<PartialSolventConfig>,
    polymer: Option<PartialPolymerConfig>,
    forcefield: Option<ForceField>,
    /// Separate TOML file holding the `[forcefield]` table contents, relative to the config.
    forcefield_file: Option<PathBuf>,
    engine: Option<PartialEngineConfig>,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl PartialSimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    /// Resolves the file values and the command-line overrides into a validated core config.
    pub fn merge_with_cli(self, args: &RunArgs) -> Result<SimulationConfig> {
        let lengths = self
            .sim_box
            .and_then(|b| b.lengths)
            .ok_or_else(|| CliError::Config("`box.lengths` is required.".to_string()))?;
        let solvent = self.solvent.unwrap_or_default();
        let polymer = self.polymer.unwrap_or_default();
        let engine = self.engine.unwrap_or_default();

        let forcefield = match (self.forcefield, self.forcefield_file) {
            (Some(_), Some(_)) => {
                return Err(CliError::Config(
                    "`forcefield` and `forcefield-file` cannot both be set.".to_string(),
                ));
            }
            (Some(inline), None) => inline,
            (None, Some(file)) => {
                let path = self.base_dir.join(file);
                debug!("Loading force field parameters from {:?}", path);
                ForceField::load(&path).map_err(|e| CliError::FileParsing {
                    path: path.clone(),
                    source: e.into(),
                })?
            }
            (None, None) => ForceField::default(),
        };

        let mut builder = SimulationConfigBuilder::new()
            .box_lengths(Vector3::from(lengths))
            .forcefield(forcefield)
            .use_cell_list(!args.no_cell_list && engine.cell_list.unwrap_or(true));

        if let Some(density) = solvent.density {
            builder = builder.solvent_density(density);
        }
        if let Some(slabs) = solvent.excluded_slabs {
            builder = builder.excluded_slabs(slabs);
        }
        if let Some(attempts) = solvent.max_placement_attempts {
            builder = builder.max_placement_attempts(attempts);
        }
        if let Some(monomers) = polymer.monomers {
            builder = builder.monomers(monomers);
        }
        if let Some(z) = polymer.start_z {
            builder = builder.chain_start_z(z);
        }
        if let Some(length) = polymer.bond_length {
            builder = builder.chain_bond_length(length);
        }
        if let Some(seed) = args.seed.or(engine.seed) {
            builder = builder.seed(seed);
        }
        if let Some(tolerance) = engine.drift_tolerance {
            builder = builder.drift_tolerance(tolerance);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn args(path: &Path) -> RunArgs {
        RunArgs {
            config: path.to_path_buf(),
            seed: None,
            no_cell_list: false,
        }
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    const FULL_CONFIG: &str = r#"
[box]
lengths = [10.0, 10.0, 20.0]

[solvent]
density = 3.0
excluded-slabs = [{ min-z = 9.0, max-z = 11.0 }]
max-placement-attempts = 500

[polymer]
monomers = 16
start-z = 2.0
bond-length = 0.8

[forcefield]
cutoff = 1.0
a-ss = 25.0
a-ms = 30.0

[forcefield.fene]
k = 30.0

[engine]
cell-list = true
seed = 12
drift-tolerance = 1e-8
"#;

    #[test]
    fn full_config_file_is_merged_into_the_core_config() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "sim.toml", FULL_CONFIG);
        let config = PartialSimulationConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&args(&path))
            .unwrap();

        assert_eq!(config.box_lengths, Vector3::new(10.0, 10.0, 20.0));
        assert_eq!(config.solvent.density, 3.0);
        assert_eq!(config.solvent.excluded_slabs, vec![SlabExclusion::new(9.0, 11.0)]);
        assert_eq!(config.solvent.max_placement_attempts, 500);
        assert_eq!(config.polymer.monomers, 16);
        assert_eq!(config.polymer.start_z, 2.0);
        assert_eq!(config.polymer.bond_length, 0.8);
        assert_eq!(config.forcefield.a_ms, 30.0);
        assert_eq!(config.forcefield.a_mm, 25.0);
        assert_eq!(config.forcefield.fene.k, 30.0);
        assert_eq!(config.forcefield.fene.r_max, 2.0);
        assert!(config.use_cell_list);
        assert_eq!(config.seed, 12);
        assert_eq!(config.drift_tolerance, 1e-8);
    }

    #[test]
    fn cli_overrides_take_precedence_over_the_file() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "sim.toml", FULL_CONFIG);
        let overrides = RunArgs {
            seed: Some(99),
            no_cell_list: true,
            ..args(&path)
        };
        let config = PartialSimulationConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&overrides)
            .unwrap();
        assert_eq!(config.seed, 99);
        assert!(!config.use_cell_list);
    }

    #[test]
    fn missing_box_lengths_is_a_config_error() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "sim.toml", "[solvent]\ndensity = 3.0\n");
        let err = PartialSimulationConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&args(&path))
            .unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("box.lengths")));
    }

    #[test]
    fn missing_core_parameter_is_reported_by_the_builder() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "sim.toml", "[box]\nlengths = [5.0, 5.0, 5.0]\n");
        let err = PartialSimulationConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&args(&path))
            .unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("monomers")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "sim.toml", "[box]\nlength = 5.0\n");
        let err = PartialSimulationConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, CliError::FileParsing { .. }));
    }

    #[test]
    fn forcefield_file_is_resolved_relative_to_the_config() {
        let dir = tempdir().unwrap();
        write(dir.path(), "ff.toml", "cutoff = 1.2\na-mm = 40.0\n");
        let path = write(
            dir.path(),
            "sim.toml",
            "forcefield-file = \"ff.toml\"\n\n[box]\nlengths = [6.0, 6.0, 6.0]\n\n[solvent]\ndensity = 1.0\n\n[polymer]\nmonomers = 2\n",
        );
        let config = PartialSimulationConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&args(&path))
            .unwrap();
        assert_eq!(config.forcefield.cutoff, 1.2);
        assert_eq!(config.forcefield.a_mm, 40.0);
    }

    #[test]
    fn inline_and_file_forcefield_are_mutually_exclusive() {
        let dir = tempdir().unwrap();
        write(dir.path(), "ff.toml", "cutoff = 1.0\n");
        let path = write(
            dir.path(),
            "sim.toml",
            "forcefield-file = \"ff.toml\"\n\n[box]\nlengths = [6.0, 6.0, 6.0]\n\n[forcefield]\ncutoff = 1.0\n",
        );
        let err = PartialSimulationConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&args(&path))
            .unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
