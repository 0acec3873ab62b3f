use nalgebra::Vector3;

use super::cell_index::CellIndex;
use crate::core::forcefield::params::ForceField;
use crate::core::forcefield::potentials::{self, BondEnergy};
use crate::core::forcefield::term::EnergyTerm;
use crate::core::models::ids::ParticleId;
use crate::core::models::particle::Particle;
use crate::core::models::system::ParticleSystem;

/// Supplies the solvent particles that may interact with a given position.
///
/// Implementations may over-report (anything beyond the cutoff contributes zero) but must not
/// miss a particle within the cutoff, and must report each candidate at most once.
pub trait SolventNeighborhood {
    fn for_each_candidate<F>(&self, position: &Vector3<f64>, solvent: &[Particle], visit: F)
    where
        F: FnMut(usize);
}

impl SolventNeighborhood for CellIndex {
    #[inline]
    fn for_each_candidate<F>(&self, position: &Vector3<f64>, solvent: &[Particle], visit: F)
    where
        F: FnMut(usize),
    {
        self.visit_near(position, solvent, visit);
    }
}

/// Every solvent particle is a candidate: the O(N) scan behind the brute-force energy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllSolvent;

impl SolventNeighborhood for AllSolvent {
    #[inline]
    fn for_each_candidate<F>(&self, _position: &Vector3<f64>, solvent: &[Particle], visit: F)
    where
        F: FnMut(usize),
    {
        (0..solvent.len()).for_each(visit);
    }
}

/// Either neighbourhood, chosen at runtime.
#[derive(Debug, Clone, Copy)]
pub enum Neighborhood<'a> {
    Cells(&'a CellIndex),
    All,
}

impl<'a> From<Option<&'a CellIndex>> for Neighborhood<'a> {
    fn from(cells: Option<&'a CellIndex>) -> Self {
        cells.map_or(Neighborhood::All, Neighborhood::Cells)
    }
}

impl SolventNeighborhood for Neighborhood<'_> {
    #[inline]
    fn for_each_candidate<F>(&self, position: &Vector3<f64>, solvent: &[Particle], visit: F)
    where
        F: FnMut(usize),
    {
        match self {
            Neighborhood::Cells(cells) => cells.for_each_candidate(position, solvent, visit),
            Neighborhood::All => AllSolvent.for_each_candidate(position, solvent, visit),
        }
    }
}

/// Energy of one particle together with the bond-break indicator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParticleEnergy {
    pub term: EnergyTerm,
    /// Set when one of the monomer's bonds left the FENE range. The non-bonded terms are not
    /// evaluated in that case and the energy is meaningless.
    pub bond_broken: bool,
}

impl ParticleEnergy {
    #[inline]
    pub fn total(&self) -> f64 {
        self.term.total()
    }
}

/// Evaluates per-particle energies of a system against one solvent neighbourhood.
pub struct EnergyEvaluator<'a, N> {
    system: &'a ParticleSystem,
    forcefield: &'a ForceField,
    neighborhood: &'a N,
}

impl<'a, N: SolventNeighborhood> EnergyEvaluator<'a, N> {
    pub fn new(system: &'a ParticleSystem, forcefield: &'a ForceField, neighborhood: &'a N) -> Self {
        Self {
            system,
            forcefield,
            neighborhood,
        }
    }

    /// Energy of the particle `id`, or `None` if it does not exist.
    pub fn energy(&self, id: ParticleId) -> Option<ParticleEnergy> {
        match id {
            ParticleId::Solvent(i) if i < self.system.solvent_count() => {
                Some(self.solvent_energy(i))
            }
            ParticleId::Monomer(i) if i < self.system.monomer_count() => {
                Some(self.monomer_energy(i))
            }
            _ => None,
        }
    }

    /// Soft repulsion of solvent `i` with its solvent neighbours (`a_ss`) and every monomer
    /// (`a_ms`).
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn solvent_energy(&self, i: usize) -> ParticleEnergy {
        let solvent = self.system.solvent();
        let position = &solvent[i].position;

        let mut ss = 0.0;
        self.neighborhood.for_each_candidate(position, solvent, |j| {
            if j != i {
                ss += self.pair(position, &solvent[j].position);
            }
        });
        let ms: f64 = self
            .system
            .monomers()
            .iter()
            .map(|m| self.pair(position, &m.position))
            .sum();

        ParticleEnergy {
            term: EnergyTerm {
                solvent_solvent: self.forcefield.a_ss * ss,
                monomer_solvent: self.forcefield.a_ms * ms,
                ..EnergyTerm::default()
            },
            bond_broken: false,
        }
    }

    /// FENE energy of monomer `i` with its chain neighbours plus soft repulsion with nearby
    /// solvent (`a_ms`) and every other monomer (`a_mm`).
    ///
    /// A broken bond short-circuits the evaluation: only the intact bonds are summed and the
    /// result is flagged.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn monomer_energy(&self, i: usize) -> ParticleEnergy {
        let sim_box = self.system.sim_box();
        let monomers = self.system.monomers();
        let position = &monomers[i].position;
        let fene = &self.forcefield.fene;

        let mut bond = 0.0;
        let mut bond_broken = false;
        for j in self.system.bonded_partners(i) {
            match potentials::fene(sim_box.distance(position, &monomers[j].position), fene) {
                BondEnergy::Intact(e) => bond += e,
                BondEnergy::Broken => bond_broken = true,
            }
        }
        let bond = 0.5 * fene.k * bond;

        if bond_broken {
            return ParticleEnergy {
                term: EnergyTerm {
                    bond,
                    ..EnergyTerm::default()
                },
                bond_broken,
            };
        }

        let solvent = self.system.solvent();
        let mut ms = 0.0;
        self.neighborhood.for_each_candidate(position, solvent, |j| {
            ms += self.pair(position, &solvent[j].position);
        });
        let mm: f64 = monomers
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, m)| self.pair(position, &m.position))
            .sum();

        ParticleEnergy {
            term: EnergyTerm::new(
                0.0,
                self.forcefield.a_ms * ms,
                self.forcefield.a_mm * mm,
                bond,
            ),
            bond_broken: false,
        }
    }

    /// Evaluates every particle, solvent first, calling `on_each` after each one.
    pub fn evaluate_all(&self, mut on_each: impl FnMut()) -> Vec<(ParticleId, ParticleEnergy)> {
        self.system
            .particle_ids()
            .map(|id| {
                let energy = match id {
                    ParticleId::Solvent(i) => self.solvent_energy(i),
                    ParticleId::Monomer(i) => self.monomer_energy(i),
                };
                on_each();
                (id, energy)
            })
            .collect()
    }

    #[inline]
    fn pair(&self, a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
        potentials::soft_repulsion(self.system.sim_box().distance(a, b), self.forcefield.cutoff)
    }
}
