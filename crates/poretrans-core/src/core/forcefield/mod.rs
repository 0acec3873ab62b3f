//! # Force Field Module
//!
//! The interaction model of the simulation: a soft repulsive pair potential acting between
//! every pair of particles within the cutoff radius, and a finite-extensible nonlinear elastic
//! (FENE) bond between consecutive monomers of the chain.
//!
//! ## Key Components
//!
//! - [`potentials`] - Pure functions for the pair and bond potentials
//! - [`params`] - Interaction coefficients, cutoff and FENE constants, loadable from TOML
//! - [`term`] - Per-particle energy decomposition by interaction type
//!
//! ```ignore
//! use poretrans::core::forcefield::{params::ForceField, potentials};
//!
//! let forcefield = ForceField::default();
//! let e = potentials::soft_repulsion(0.5, forcefield.cutoff);
//! ```

pub mod params;
pub mod potentials;
pub mod term;
