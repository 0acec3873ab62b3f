use super::ids::ParticleId;
use super::particle::Particle;
use crate::core::geometry::SimBox;

/// The complete particle configuration: solvent bath, polymer chain and the periodic box.
///
/// Both populations are plain arenas addressed by stable indices. The monomer array is
/// ordered along the chain, so monomer `i` is bonded to `i - 1` and `i + 1` where they exist.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    /// The periodic box all particles live in.
    sim_box: SimBox,
    /// Solvent (DPD) particles, the only population tracked by the cell index.
    solvent: Vec<Particle>,
    /// Chain monomers in bond order.
    monomers: Vec<Particle>,
}

impl ParticleSystem {
    /// Creates an empty system inside `sim_box`.
    pub fn new(sim_box: SimBox) -> Self {
        Self {
            sim_box,
            solvent: Vec::new(),
            monomers: Vec::new(),
        }
    }

    /// Creates a system from already-populated particle arrays.
    ///
    /// # Arguments
    ///
    /// * `sim_box` - The periodic box.
    /// * `solvent` - Solvent particles.
    /// * `monomers` - Chain monomers, ordered along the chain.
    pub fn with_particles(sim_box: SimBox, solvent: Vec<Particle>, monomers: Vec<Particle>) -> Self {
        Self {
            sim_box,
            solvent,
            monomers,
        }
    }

    #[inline]
    pub fn sim_box(&self) -> &SimBox {
        &self.sim_box
    }

    /// Appends a solvent particle and returns its index.
    pub fn add_solvent(&mut self, particle: Particle) -> usize {
        self.solvent.push(particle);
        self.solvent.len() - 1
    }

    /// Appends a monomer to the end of the chain and returns its index.
    pub fn add_monomer(&mut self, particle: Particle) -> usize {
        self.monomers.push(particle);
        self.monomers.len() - 1
    }

    #[inline]
    pub fn solvent(&self) -> &[Particle] {
        &self.solvent
    }

    #[inline]
    pub fn solvent_mut(&mut self) -> &mut [Particle] {
        &mut self.solvent
    }

    #[inline]
    pub fn monomers(&self) -> &[Particle] {
        &self.monomers
    }

    #[inline]
    pub fn monomers_mut(&mut self) -> &mut [Particle] {
        &mut self.monomers
    }

    pub fn solvent_count(&self) -> usize {
        self.solvent.len()
    }

    pub fn monomer_count(&self) -> usize {
        self.monomers.len()
    }

    /// Retrieves a particle of either population.
    ///
    /// # Return
    ///
    /// Returns `Some(&Particle)` if the index is in range for its population, otherwise `None`.
    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        match id {
            ParticleId::Solvent(i) => self.solvent.get(i),
            ParticleId::Monomer(i) => self.monomers.get(i),
        }
    }

    /// Retrieves a mutable reference to a particle of either population.
    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        match id {
            ParticleId::Solvent(i) => self.solvent.get_mut(i),
            ParticleId::Monomer(i) => self.monomers.get_mut(i),
        }
    }

    /// Iterates over the identifiers of every particle, solvent first.
    pub fn particle_ids(&self) -> impl Iterator<Item = ParticleId> + use<> {
        let solvent = (0..self.solvent.len()).map(ParticleId::Solvent);
        let monomers = (0..self.monomers.len()).map(ParticleId::Monomer);
        solvent.chain(monomers)
    }

    /// The chain neighbours of monomer `i`: `i - 1` and `i + 1`, where they exist.
    pub fn bonded_partners(&self, i: usize) -> impl Iterator<Item = usize> + use<> {
        let n = self.monomers.len();
        let prev = i.checked_sub(1).filter(|_| i < n);
        let next = Some(i + 1).filter(|&j| j < n);
        prev.into_iter().chain(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn chain_system(n: usize) -> ParticleSystem {
        let mut system = ParticleSystem::new(SimBox::cubic(10.0));
        for i in 0..n {
            system.add_monomer(Particle::new(Vector3::new(5.0, 5.0, i as f64 * 0.7)));
        }
        system
    }

    #[test]
    fn add_returns_sequential_indices_per_population() {
        let mut system = ParticleSystem::new(SimBox::cubic(10.0));
        assert_eq!(system.add_solvent(Particle::new(Vector3::zeros())), 0);
        assert_eq!(system.add_solvent(Particle::new(Vector3::zeros())), 1);
        assert_eq!(system.add_monomer(Particle::new(Vector3::zeros())), 0);
        assert_eq!(system.solvent_count(), 2);
        assert_eq!(system.monomer_count(), 1);
    }

    #[test]
    fn particle_lookup_respects_population_bounds() {
        let system = chain_system(2);
        assert!(system.particle(ParticleId::Monomer(1)).is_some());
        assert!(system.particle(ParticleId::Monomer(2)).is_none());
        assert!(system.particle(ParticleId::Solvent(0)).is_none());
    }

    #[test]
    fn bonded_partners_of_chain_ends_have_one_entry() {
        let system = chain_system(4);
        assert_eq!(system.bonded_partners(0).collect::<Vec<_>>(), vec![1]);
        assert_eq!(system.bonded_partners(3).collect::<Vec<_>>(), vec![2]);
        assert_eq!(system.bonded_partners(1).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn single_monomer_has_no_bonded_partners() {
        let system = chain_system(1);
        assert_eq!(system.bonded_partners(0).count(), 0);
    }

    #[test]
    fn particle_ids_lists_solvent_before_monomers() {
        let mut system = chain_system(1);
        system.add_solvent(Particle::new(Vector3::zeros()));
        let ids: Vec<_> = system.particle_ids().collect();
        assert_eq!(ids, vec![ParticleId::Solvent(0), ParticleId::Monomer(0)]);
    }
}
