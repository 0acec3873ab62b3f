//! # Particle Models
//!
//! Data structures for the two particle populations of the simulation: the solvent bath
//! (DPD particles) and the polymer chain (monomers).
//!
//! - [`particle`] - A single particle record with its trial-move snapshots and cell link
//! - [`system`] - Both populations together with the periodic box they live in
//! - [`ids`] - Stable identifiers addressing a particle in either population
//!
//! ```ignore
//! use poretrans::core::geometry::SimBox;
//! use poretrans::core::models::{particle::Particle, system::ParticleSystem};
//! use nalgebra::Vector3;
//!
//! let mut system = ParticleSystem::new(SimBox::cubic(10.0));
//! system.add_solvent(Particle::new(Vector3::new(1.0, 2.0, 3.0)));
//! system.add_monomer(Particle::new(Vector3::new(5.0, 5.0, 5.0)));
//! ```

pub mod ids;
pub mod particle;
pub mod system;
