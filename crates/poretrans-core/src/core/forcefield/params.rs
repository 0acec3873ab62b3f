use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

const DEFAULT_CUTOFF: f64 = 1.0;
const DEFAULT_REPULSION: f64 = 25.0;
const DEFAULT_FENE_R_MAX: f64 = 2.0;
const DEFAULT_FENE_R_EQ: f64 = 0.7;
const DEFAULT_FENE_K: f64 = 40.0;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct FeneParams {
    pub r_max: f64,
    pub r_eq: f64,
    pub k: f64,
}

impl FeneParams {
    /// Half-width of the finite extensibility range, `r_max - r_eq`.
    #[inline]
    pub fn r0(&self) -> f64 {
        self.r_max - self.r_eq
    }
}

impl Default for FeneParams {
    fn default() -> Self {
        Self {
            r_max: DEFAULT_FENE_R_MAX,
            r_eq: DEFAULT_FENE_R_EQ,
            k: DEFAULT_FENE_K,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ForceField {
    /// Interaction cutoff radius `r_c` shared by every pair type.
    pub cutoff: f64,
    /// Solvent-solvent repulsion coefficient.
    pub a_ss: f64,
    /// Monomer-solvent repulsion coefficient.
    pub a_ms: f64,
    /// Monomer-monomer repulsion coefficient.
    pub a_mm: f64,
    pub fene: FeneParams,
}

impl Default for ForceField {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
            a_ss: DEFAULT_REPULSION,
            a_ms: DEFAULT_REPULSION,
            a_mm: DEFAULT_REPULSION,
            fene: FeneParams::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid force field parameter '{name}': {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ForceField {
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let forcefield: Self = toml::from_str(&content).map_err(|e| ParamLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        forcefield.validate()?;
        Ok(forcefield)
    }

    pub fn validate(&self) -> Result<(), ParamLoadError> {
        let invalid = |name: &'static str, reason: &str| -> Result<(), ParamLoadError> {
            Err(ParamLoadError::Invalid {
                name,
                reason: reason.to_string(),
            })
        };

        if !(self.cutoff.is_finite() && self.cutoff > 0.0) {
            return invalid("cutoff", "must be a positive finite number");
        }
        for (name, value) in [("a-ss", self.a_ss), ("a-ms", self.a_ms), ("a-mm", self.a_mm)] {
            if !(value.is_finite() && value >= 0.0) {
                return invalid(name, "repulsion coefficients must be non-negative");
            }
        }
        if !(self.fene.r_eq.is_finite() && self.fene.r_eq >= 0.0) {
            return invalid("fene.r-eq", "must be non-negative");
        }
        if !(self.fene.r_max.is_finite() && self.fene.r_max > self.fene.r_eq) {
            return invalid("fene.r-max", "must exceed the equilibrium bond length");
        }
        if !(self.fene.k.is_finite() && self.fene.k >= 0.0) {
            return invalid("fene.k", "must be non-negative");
        }
        Ok(())
    }
}
