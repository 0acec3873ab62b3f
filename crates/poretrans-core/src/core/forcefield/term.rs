use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Energy of one particle split by interaction type, each already scaled by its coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyTerm {
    pub solvent_solvent: f64,
    pub monomer_solvent: f64,
    pub monomer_monomer: f64,
    pub bond: f64,
}

impl EnergyTerm {
    pub fn new(solvent_solvent: f64, monomer_solvent: f64, monomer_monomer: f64, bond: f64) -> Self {
        Self {
            solvent_solvent,
            monomer_solvent,
            monomer_monomer,
            bond,
        }
    }

    #[inline]
    pub fn pair(&self) -> f64 {
        self.solvent_solvent + self.monomer_solvent + self.monomer_monomer
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.pair() + self.bond
    }
}

impl Add for EnergyTerm {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            solvent_solvent: self.solvent_solvent + rhs.solvent_solvent,
            monomer_solvent: self.monomer_solvent + rhs.monomer_solvent,
            monomer_monomer: self.monomer_monomer + rhs.monomer_monomer,
            bond: self.bond + rhs.bond,
        }
    }
}

impl AddAssign for EnergyTerm {
    fn add_assign(&mut self, rhs: Self) {
        self.solvent_solvent += rhs.solvent_solvent;
        self.monomer_solvent += rhs.monomer_solvent;
        self.monomer_monomer += rhs.monomer_monomer;
        self.bond += rhs.bond;
    }
}

impl Sum for EnergyTerm {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, term| acc + term)
    }
}
