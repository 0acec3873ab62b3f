use nalgebra::Vector3;

/// A single particle of either population.
///
/// Besides its current state, a particle carries the snapshot taken before the pending trial
/// move (`previous_position`, `previous_energy`) and the link to the next particle sharing its
/// cell in the cell-linked list.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Current position, kept inside the primary periodic box `[0, L)`.
    pub position: Vector3<f64>,
    /// Position before the pending trial move.
    pub previous_position: Vector3<f64>,
    /// Cached energy of this particle in the current configuration.
    pub energy: f64,
    /// Energy before the pending trial move.
    pub previous_energy: f64,
    /// Index of the next particle in the same cell, `None` terminates the chain.
    ///
    /// Only meaningful for solvent particles; monomers are never stored in the cell index.
    pub next_in_cell: Option<usize>,
}

impl Particle {
    /// Creates a particle at rest at `position` with zero cached energy.
    ///
    /// # Arguments
    ///
    /// * `position` - The initial position; both the current and previous position are set to it.
    pub fn new(position: Vector3<f64>) -> Self {
        Self {
            position,
            previous_position: position,
            energy: 0.0,
            previous_energy: 0.0,
            next_in_cell: None,
        }
    }

    /// Records the current state as the rollback point for a trial move.
    #[inline]
    pub fn snapshot(&mut self) {
        self.previous_position = self.position;
        self.previous_energy = self.energy;
    }

    /// Replaces the cached energy, shifting the old value into `previous_energy`.
    #[inline]
    pub fn update_energy(&mut self, energy: f64) {
        self.previous_energy = self.energy;
        self.energy = energy;
    }
}
