use nalgebra::Vector3;
use tracing::{info, trace, warn};

use super::cell_index::{CellIndex, CellSnapshot};
use super::error::EngineError;
use super::evaluator::{EnergyEvaluator, Neighborhood, ParticleEnergy, SolventNeighborhood};
use super::progress::ProgressReporter;
use super::tasks::consistency::{self, ConsistencyReport};
use super::tasks::{EnergySummary, brute_energy, cell_energy, total_energy, within_tolerance};
use crate::core::forcefield::params::ForceField;
use crate::core::models::ids::ParticleId;
use crate::core::models::particle::Particle;
use crate::core::models::system::ParticleSystem;

/// Energies seen by one trial move, both evaluated in the configuration they describe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialOutcome {
    pub particle: ParticleId,
    pub old_energy: f64,
    pub new_energy: f64,
}

impl TrialOutcome {
    #[inline]
    pub fn delta(&self) -> f64 {
        self.new_energy - self.old_energy
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// The move was kept and every affected cached energy updated.
    Accepted(TrialOutcome),
    /// The acceptance rule declined the move; the system is exactly as before.
    Rejected(TrialOutcome),
    /// The trial position broke a bond of the moved monomer. The move was undone without
    /// consulting the acceptance rule and `new_energy` only covers the intact bonds.
    BondBroken(TrialOutcome),
}

impl MoveOutcome {
    pub fn trial(&self) -> &TrialOutcome {
        match self {
            MoveOutcome::Accepted(t) | MoveOutcome::Rejected(t) | MoveOutcome::BondBroken(t) => t,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, MoveOutcome::Accepted(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoveCounter {
    pub attempted: u64,
    pub accepted: u64,
    pub bond_breaks: u64,
}

impl MoveCounter {
    pub fn acceptance_ratio(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempted as f64
        }
    }
}

/// Trial-move bookkeeping per population.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoveStatistics {
    pub solvent: MoveCounter,
    pub monomer: MoveCounter,
}

impl MoveStatistics {
    fn counter(&mut self, id: ParticleId) -> &mut MoveCounter {
        match id {
            ParticleId::Solvent(_) => &mut self.solvent,
            ParticleId::Monomer(_) => &mut self.monomer,
        }
    }
}

/// A particle system with cached energies, an optional cell index over the solvent and a
/// running total of the cached energies kept up to date move by move.
///
/// Between calls every particle's cached `energy` is its true energy in the current
/// configuration, and the cell index (when present) matches the solvent positions.
#[derive(Debug, Clone)]
pub struct Simulation {
    system: ParticleSystem,
    forcefield: ForceField,
    cells: Option<CellIndex>,
    running_energy: f64,
    statistics: MoveStatistics,
}

impl Simulation {
    /// Wraps every position into the box, builds the cell index when `use_cell_list` is set
    /// and computes the initial energies.
    ///
    /// # Errors
    ///
    /// Fails when the force field is invalid, the cutoff cannot partition the box, or a bond
    /// of the initial chain is already broken.
    pub fn new(
        mut system: ParticleSystem,
        forcefield: ForceField,
        use_cell_list: bool,
        reporter: &ProgressReporter,
    ) -> Result<Self, EngineError> {
        forcefield.validate()?;

        let sim_box = *system.sim_box();
        let wrap = |p: &mut Particle| {
            p.position = sim_box.wrap(&p.position);
            p.previous_position = p.position;
        };
        system.solvent_mut().iter_mut().for_each(wrap);
        system.monomers_mut().iter_mut().for_each(wrap);

        let cells = if use_cell_list {
            let mut cells = CellIndex::new(&sim_box, forcefield.cutoff)?;
            cells.build(system.solvent_mut());
            Some(cells)
        } else {
            None
        };

        let summary = cell_energy::run(
            &mut system,
            &forcefield,
            &Neighborhood::from(cells.as_ref()),
            reporter,
        );
        if !summary.broken_bonds.is_empty() {
            return Err(EngineError::Initialization(format!(
                "bonds of monomers {:?} are broken in the initial configuration",
                summary.broken_bonds
            )));
        }

        let running_energy = total_energy::run(&system);
        info!(
            solvent = system.solvent_count(),
            monomers = system.monomer_count(),
            cell_list = use_cell_list,
            energy = running_energy,
            "Simulation initialized."
        );

        Ok(Self {
            system,
            forcefield,
            cells,
            running_energy,
            statistics: MoveStatistics::default(),
        })
    }

    #[inline]
    pub fn system(&self) -> &ParticleSystem {
        &self.system
    }

    #[inline]
    pub fn forcefield(&self) -> &ForceField {
        &self.forcefield
    }

    pub fn cell_index(&self) -> Option<&CellIndex> {
        self.cells.as_ref()
    }

    pub fn statistics(&self) -> &MoveStatistics {
        &self.statistics
    }

    /// Sum of the cached per-particle energies.
    pub fn total_energy(&self) -> f64 {
        total_energy::run(&self.system)
    }

    /// Total maintained incrementally from accepted move deltas.
    pub fn running_energy(&self) -> f64 {
        self.running_energy
    }

    /// Evaluates the current energy of `id` without touching the cache.
    pub fn particle_energy(&self, id: ParticleId) -> Result<ParticleEnergy, EngineError> {
        EnergyEvaluator::new(&self.system, &self.forcefield, &self.neighborhood())
            .energy(id)
            .ok_or(EngineError::ParticleNotFound(id))
    }

    /// Attempts to move `id` to `trial_position` (wrapped into the box).
    ///
    /// `accept` sees the old and new energy of the particle and decides whether the move is
    /// kept; it is not called when the move breaks a bond. A declined or bond-breaking move
    /// restores the particle record and the cell index exactly.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ParticleNotFound`] if `id` does not exist; the system is then
    /// untouched.
    pub fn try_move<F>(
        &mut self,
        id: ParticleId,
        trial_position: Vector3<f64>,
        accept: F,
    ) -> Result<MoveOutcome, EngineError>
    where
        F: FnOnce(&TrialOutcome) -> bool,
    {
        let old = self.particle_energy(id)?;
        let position = self.system.sim_box().wrap(&trial_position);

        let particle = self
            .system
            .particle_mut(id)
            .ok_or(EngineError::ParticleNotFound(id))?;
        let saved = particle.clone();
        particle.snapshot();
        particle.position = position;
        let relocation = self.relocate(id);

        let new = self.particle_energy(id)?;
        let trial = TrialOutcome {
            particle: id,
            old_energy: old.total(),
            new_energy: new.total(),
        };
        self.statistics.counter(id).attempted += 1;

        if new.bond_broken {
            self.rollback(id, saved, relocation);
            self.statistics.counter(id).bond_breaks += 1;
            trace!(%id, "Trial move broke a bond; rolled back.");
            return Ok(MoveOutcome::BondBroken(trial));
        }

        if !accept(&trial) {
            self.rollback(id, saved, relocation);
            trace!(%id, delta = trial.delta(), "Trial move rejected.");
            return Ok(MoveOutcome::Rejected(trial));
        }

        self.commit(id, &saved.position, trial.new_energy);
        self.statistics.counter(id).accepted += 1;
        trace!(%id, delta = trial.delta(), "Trial move accepted.");
        Ok(MoveOutcome::Accepted(trial))
    }

    /// Rebuilds the cell index from scratch. Does nothing without a cell index.
    pub fn rebuild_cell_index(&mut self) {
        if let Some(cells) = self.cells.as_mut() {
            cells.build(self.system.solvent_mut());
        }
    }

    pub fn verify_cell_index(&self) -> Result<(), EngineError> {
        if let Some(cells) = &self.cells {
            cells.verify(self.system.solvent())?;
        }
        Ok(())
    }

    /// Compares the cached total with the running total.
    ///
    /// # Return
    ///
    /// The absolute drift when it is within `tolerance` (relative), otherwise
    /// [`EngineError::EnergyDrift`].
    pub fn check_drift(&self, tolerance: f64) -> Result<f64, EngineError> {
        let cached = self.total_energy();
        if within_tolerance(cached, self.running_energy, tolerance) {
            Ok((cached - self.running_energy).abs())
        } else {
            warn!(cached, running = self.running_energy, "Energy drift exceeds tolerance.");
            Err(EngineError::EnergyDrift {
                cached,
                expected: self.running_energy,
            })
        }
    }

    /// Rebuilds the cell index, recomputes every cached energy and resets the running total.
    pub fn resynchronize(&mut self, reporter: &ProgressReporter) -> EnergySummary {
        self.rebuild_cell_index();
        let summary = cell_energy::run(
            &mut self.system,
            &self.forcefield,
            &Neighborhood::from(self.cells.as_ref()),
            reporter,
        );
        self.running_energy = total_energy::run(&self.system);
        summary
    }

    /// Recomputes every cached energy by brute force and resets the running total.
    pub fn recompute_brute_force(&mut self, reporter: &ProgressReporter) -> EnergySummary {
        let summary = brute_energy::run(&mut self.system, &self.forcefield, reporter);
        self.running_energy = total_energy::run(&self.system);
        summary
    }

    /// Compares the energies of the active neighbourhood with a brute-force recompute.
    pub fn consistency(&self, tolerance: f64, reporter: &ProgressReporter) -> ConsistencyReport {
        consistency::run(
            &self.system,
            &self.forcefield,
            &self.neighborhood(),
            tolerance,
            reporter,
        )
    }

    fn neighborhood(&self) -> Neighborhood<'_> {
        Neighborhood::from(self.cells.as_ref())
    }

    fn relocate(&mut self, id: ParticleId) -> Option<CellSnapshot> {
        match (id, self.cells.as_mut()) {
            (ParticleId::Solvent(i), Some(cells)) => cells.relocate(i, self.system.solvent_mut()),
            _ => None,
        }
    }

    fn rollback(&mut self, id: ParticleId, saved: Particle, relocation: Option<CellSnapshot>) {
        if let (Some(snapshot), Some(cells)) = (relocation, self.cells.as_mut()) {
            cells.restore(snapshot, self.system.solvent_mut());
        }
        if let Some(particle) = self.system.particle_mut(id) {
            *particle = saved;
        }
    }

    fn commit(&mut self, id: ParticleId, old_position: &Vector3<f64>, energy: f64) {
        let mut delta = 0.0;
        if let Some(particle) = self.system.particle_mut(id) {
            delta += energy - particle.energy;
            particle.energy = energy;
        }

        let updates: Vec<(ParticleId, f64)> = {
            let neighborhood = self.neighborhood();
            let evaluator = EnergyEvaluator::new(&self.system, &self.forcefield, &neighborhood);
            self.dependents(id, old_position)
                .into_iter()
                .filter_map(|j| evaluator.energy(j).map(|e| (j, e.total())))
                .collect()
        };

        for (j, e) in updates {
            if let Some(particle) = self.system.particle_mut(j) {
                delta += e - particle.energy;
                particle.update_energy(e);
            }
        }
        self.running_energy += delta;
    }

    /// Particles whose energy may have changed when `id` moved away from `old_position`:
    /// everything within the cutoff of either position, plus the chain neighbours of a
    /// moved monomer.
    fn dependents(&self, id: ParticleId, old_position: &Vector3<f64>) -> Vec<ParticleId> {
        let Some(moved) = self.system.particle(id) else {
            return Vec::new();
        };
        let sim_box = self.system.sim_box();
        let cutoff = self.forcefield.cutoff;
        let positions = [*old_position, moved.position];
        let near = |r: &Vector3<f64>| positions.iter().any(|p| sim_box.distance(p, r) < cutoff);

        let solvent = self.system.solvent();
        let neighborhood = self.neighborhood();
        let mut ids = Vec::new();
        for position in &positions {
            neighborhood.for_each_candidate(position, solvent, |j| {
                if near(&solvent[j].position) {
                    ids.push(ParticleId::Solvent(j));
                }
            });
        }
        ids.extend(
            self.system
                .monomers()
                .iter()
                .enumerate()
                .filter(|(_, m)| near(&m.position))
                .map(|(j, _)| ParticleId::Monomer(j)),
        );
        if let ParticleId::Monomer(i) = id {
            ids.extend(self.system.bonded_partners(i).map(ParticleId::Monomer));
        }

        ids.retain(|&j| j != id);
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::SimBox;
    use crate::engine::test_support::{
        crowded_system, random_solvent, reference_system, straight_chain,
    };
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const TOLERANCE: f64 = 1e-9;

    fn new_simulation(system: ParticleSystem, use_cell_list: bool) -> Simulation {
        Simulation::new(system, ForceField::default(), use_cell_list, &ProgressReporter::new())
            .unwrap()
    }

    fn random_trial(
        sim: &Simulation,
        rng: &mut StdRng,
        max_step: f64,
    ) -> (ParticleId, Vector3<f64>) {
        let system = sim.system();
        let n = system.solvent_count() + system.monomer_count();
        let k = rng.gen_range(0..n);
        let id = if k < system.solvent_count() {
            ParticleId::Solvent(k)
        } else {
            ParticleId::Monomer(k - system.solvent_count())
        };
        let step = Vector3::new(
            rng.gen_range(-max_step..max_step),
            rng.gen_range(-max_step..max_step),
            rng.gen_range(-max_step..max_step),
        );
        let position = system.particle(id).unwrap().position + step;
        (id, position)
    }

    fn assert_cache_matches_brute_force(sim: &Simulation) {
        let mut fresh = sim.system().clone();
        brute_energy::run(&mut fresh, sim.forcefield(), &ProgressReporter::new());
        let cached = sim.system().solvent().iter().chain(sim.system().monomers());
        let expected = fresh.solvent().iter().chain(fresh.monomers());
        for (a, b) in cached.zip(expected) {
            assert!(
                (a.energy - b.energy).abs() <= TOLERANCE * b.energy.abs().max(1.0),
                "{} vs {}",
                a.energy,
                b.energy
            );
        }
    }

    #[test]
    fn new_computes_energies_consistent_with_brute_force() {
        let sim = new_simulation(reference_system(1), true);
        assert_cache_matches_brute_force(&sim);
        assert_eq!(sim.running_energy(), sim.total_energy());
        assert!(sim.consistency(TOLERANCE, &ProgressReporter::new()).is_consistent());
    }

    #[test]
    fn new_wraps_positions_into_the_box() {
        let sim_box = SimBox::cubic(5.0);
        let mut solvent = random_solvent(&sim_box, 10, 2);
        solvent[0].position.x -= 5.0;
        solvent[1].position.z += 10.0;
        let system = ParticleSystem::with_particles(sim_box, solvent, Vec::new());
        let sim = new_simulation(system, true);
        assert!(sim.system().solvent().iter().all(|p| sim_box.contains(&p.position)));
        sim.verify_cell_index().unwrap();
    }

    #[test]
    fn new_rejects_an_initially_broken_chain() {
        let sim_box = SimBox::cubic(10.0);
        let monomers = vec![
            Particle::new(Vector3::new(5.0, 5.0, 1.0)),
            Particle::new(Vector3::new(5.0, 5.0, 4.0)),
        ];
        let system = ParticleSystem::with_particles(sim_box, Vec::new(), monomers);
        let err = Simulation::new(system, ForceField::default(), true, &ProgressReporter::new())
            .unwrap_err();
        assert!(matches!(err, EngineError::Initialization(_)));
    }

    #[test]
    fn rejected_moves_leave_the_system_bit_identical() {
        let mut sim = new_simulation(crowded_system(3), true);
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..200 {
            let before_solvent = sim.system().solvent().to_vec();
            let before_monomers = sim.system().monomers().to_vec();
            let before_cells = sim.cell_index().cloned();
            let before_energy = sim.running_energy();

            let (id, position) = random_trial(&sim, &mut rng, 1.5);
            let outcome = sim.try_move(id, position, |_| false).unwrap();
            assert!(!outcome.is_accepted());

            assert_eq!(sim.system().solvent(), &before_solvent[..]);
            assert_eq!(sim.system().monomers(), &before_monomers[..]);
            assert_eq!(sim.cell_index().cloned(), before_cells);
            assert_eq!(sim.running_energy(), before_energy);
        }
        sim.verify_cell_index().unwrap();
    }

    #[test]
    fn accepted_moves_keep_cached_energies_equal_to_a_fresh_recompute() {
        for use_cell_list in [true, false] {
            let mut sim = new_simulation(crowded_system(5), use_cell_list);
            let mut rng = StdRng::seed_from_u64(99);
            for _ in 0..300 {
                let (id, position) = random_trial(&sim, &mut rng, 0.6);
                let coin: bool = rng.gen_bool(0.5);
                sim.try_move(id, position, |_| coin).unwrap();
            }
            assert!(sim.statistics().solvent.accepted > 0);
            assert_cache_matches_brute_force(&sim);
            sim.verify_cell_index().unwrap();
            sim.check_drift(TOLERANCE).unwrap();
        }
    }

    #[test]
    fn accepted_moves_stay_consistent_on_grids_narrower_than_three_cells() {
        let boxes = [
            (SimBox::cubic(2.0), 20),
            (SimBox::new(Vector3::new(2.5, 3.7, 1.2)), 30),
            (SimBox::cubic(1.5), 10),
        ];
        for (seed, (sim_box, n)) in boxes.into_iter().enumerate() {
            let solvent = random_solvent(&sim_box, n, seed as u64);
            let monomers = straight_chain(&sim_box, 2, 0.7);
            let system = ParticleSystem::with_particles(sim_box, solvent, monomers);
            let mut sim = new_simulation(system, true);
            let dims = sim.cell_index().unwrap().dims();
            assert!(dims.iter().any(|&d| d < 3));

            let mut rng = StdRng::seed_from_u64(40 + seed as u64);
            for _ in 0..500 {
                let (id, position) = random_trial(&sim, &mut rng, 0.5);
                sim.try_move(id, position, |_| true).unwrap();
            }

            assert!(sim.statistics().solvent.accepted > 0);
            sim.verify_cell_index().unwrap();
            let report = sim.consistency(TOLERANCE, &ProgressReporter::new());
            assert!(report.is_consistent(), "{:?} deviates by {}", dims, report.max_deviation);
            assert!(report.cache_is_current());
            let drift = sim.check_drift(TOLERANCE).unwrap();
            assert!(drift < 1e-10 * sim.total_energy().abs().max(1.0));
        }
    }

    #[test]
    fn bond_breaking_move_is_rolled_back_without_consulting_accept() {
        let mut sim = new_simulation(reference_system(4), true);
        let before = sim.system().monomers().to_vec();
        let far = before[1].position + Vector3::new(0.0, 3.0, 0.0);

        let outcome = sim
            .try_move(ParticleId::Monomer(1), far, |_| panic!("accept must not be called"))
            .unwrap();

        assert!(matches!(outcome, MoveOutcome::BondBroken(_)));
        assert_eq!(sim.system().monomers(), &before[..]);
        assert_eq!(sim.statistics().monomer.bond_breaks, 1);
        assert_eq!(sim.statistics().monomer.accepted, 0);
    }

    #[test]
    fn accepted_move_reports_the_energy_delta_of_the_moved_particle() {
        let mut sim = new_simulation(reference_system(6), true);
        let id = ParticleId::Solvent(0);
        let target = Vector3::new(2.5, 2.5, 2.5);
        let before = sim.particle_energy(id).unwrap().total();

        let outcome = sim.try_move(id, target, |_| true).unwrap();
        let trial = outcome.trial();

        assert!(outcome.is_accepted());
        assert_eq!(trial.old_energy, before);
        assert_eq!(sim.system().solvent()[0].energy, trial.new_energy);
        assert_eq!(sim.system().solvent()[0].previous_energy, before);
        assert_eq!(sim.system().solvent()[0].position, target);
    }

    #[test]
    fn trial_positions_outside_the_box_are_wrapped() {
        let mut sim = new_simulation(reference_system(7), true);
        sim.try_move(ParticleId::Solvent(2), Vector3::new(-0.5, 10.25, 3.0), |_| true)
            .unwrap();
        let r = sim.system().solvent()[2].position;
        assert!((r.x - 9.5).abs() < 1e-12);
        assert!((r.y - 0.25).abs() < 1e-12);
        sim.verify_cell_index().unwrap();
    }

    #[test]
    fn unknown_particle_is_an_error_and_changes_nothing() {
        let mut sim = new_simulation(reference_system(8), true);
        let err = sim
            .try_move(ParticleId::Monomer(99), Vector3::zeros(), |_| true)
            .unwrap_err();
        assert!(matches!(err, EngineError::ParticleNotFound(ParticleId::Monomer(99))));
        assert_eq!(sim.statistics(), &MoveStatistics::default());
    }

    #[test]
    fn check_drift_detects_a_corrupted_cache_and_resynchronize_repairs_it() {
        let mut sim = new_simulation(crowded_system(10), true);
        sim.system.solvent_mut()[0].energy += 10.0;
        assert!(matches!(
            sim.check_drift(TOLERANCE),
            Err(EngineError::EnergyDrift { .. })
        ));

        sim.resynchronize(&ProgressReporter::new());
        sim.check_drift(TOLERANCE).unwrap();
        assert_cache_matches_brute_force(&sim);
    }

    #[test]
    fn cell_list_and_brute_force_simulations_follow_the_same_trajectory() {
        let mut fast = new_simulation(crowded_system(13), true);
        let mut slow = new_simulation(crowded_system(13), false);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let (id, position) = random_trial(&fast, &mut rng, 0.5);
            let a = fast.try_move(id, position, |t| t.delta() <= 0.0).unwrap();
            let b = slow.try_move(id, position, |t| t.delta() <= 0.0).unwrap();
            assert_eq!(a.is_accepted(), b.is_accepted());
        }
        assert!(within_tolerance(fast.total_energy(), slow.total_energy(), TOLERANCE));
    }

    #[test]
    fn acceptance_ratio_is_zero_without_attempts() {
        assert_eq!(MoveCounter::default().acceptance_ratio(), 0.0);
        let counter = MoveCounter {
            attempted: 4,
            accepted: 1,
            bond_breaks: 0,
        };
        assert_eq!(counter.acceptance_ratio(), 0.25);
    }
}
