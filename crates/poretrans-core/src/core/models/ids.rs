use std::fmt;

/// Addresses one particle by population and stable array index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParticleId {
    Solvent(usize),
    Monomer(usize),
}

impl ParticleId {
    pub fn index(&self) -> usize {
        match *self {
            ParticleId::Solvent(i) | ParticleId::Monomer(i) => i,
        }
    }
}

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticleId::Solvent(i) => write!(f, "solvent #{}", i),
            ParticleId::Monomer(i) => write!(f, "monomer #{}", i),
        }
    }
}
