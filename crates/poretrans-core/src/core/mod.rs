//! # Core Module
//!
//! Stateless building blocks shared by the engine.
//!
//! - **Geometry** ([`geometry`]) - Periodic simulation box, minimum-image separation and
//!   position wrapping
//! - **Particle Models** ([`models`]) - Particle records and the two-population particle system
//! - **Energy Functions** ([`forcefield`]) - Potentials, parameters and energy term bookkeeping

pub mod forcefield;
pub mod geometry;
pub mod models;
