use crate::core::geometry::{SimBox, wrap_index};
use crate::core::models::particle::Particle;
use nalgebra::Vector3;
use thiserror::Error;
use tracing::debug;

const SIZING_EPSILON: f64 = 1e-9;
const NEIGHBORHOOD_SIZE: usize = 27;

pub type CellCoord = [usize; 3];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CellIndexError {
    #[error("Cutoff {cutoff} cannot partition box length {length} on axis {axis}")]
    InvalidCutoff {
        axis: usize,
        cutoff: f64,
        length: f64,
    },
    #[error("Particle {0} is linked into the cell index more than once")]
    DuplicateEntry(usize),
    #[error("Particle {0} is missing from the cell index")]
    MissingEntry(usize),
    #[error("Particle {particle} is linked into cell {found} but its position lies in cell {expected}")]
    MisplacedEntry {
        particle: usize,
        expected: usize,
        found: usize,
    },
    #[error("A cell chain references particle {0}, which does not exist")]
    DanglingLink(usize),
}

/// Cell-linked list over the solvent population.
///
/// The box is split into a grid of cells whose side is at least the interaction cutoff, so
/// every interaction partner of a particle lies in its own cell or one of the 26 surrounding
/// cells. Each cell stores the head of a singly-linked chain; the chain continues through
/// [`Particle::next_in_cell`]. The grid is a flat row-major array.
#[derive(Debug, Clone, PartialEq)]
pub struct CellIndex {
    dims: [usize; 3],
    cell_size: Vector3<f64>,
    heads: Vec<Option<usize>>,
    assignments: Vec<usize>,
}

/// Journal of one incremental relocation, enough to undo it exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSnapshot {
    particle: usize,
    old_cell: usize,
    new_cell: usize,
    old_head_of_old: Option<usize>,
    old_head_of_new: Option<usize>,
    link: Option<usize>,
    predecessor: Option<usize>,
}

#[cfg(test)]
impl CellSnapshot {
    pub(crate) fn particle(&self) -> usize {
        self.particle
    }

    pub(crate) fn old_cell(&self) -> usize {
        self.old_cell
    }

    pub(crate) fn new_cell(&self) -> usize {
        self.new_cell
    }
}

/// The distinct cells of a 3x3x3 neighbourhood.
#[derive(Debug, Clone, Copy)]
pub struct NeighborCells {
    cells: [usize; NEIGHBORHOOD_SIZE],
    len: usize,
}

impl NeighborCells {
    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.cells[..self.len]
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.as_slice().iter().copied()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Walks one cell chain.
pub struct CellMembers<'p> {
    next: Option<usize>,
    particles: &'p [Particle],
}

impl Iterator for CellMembers<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        let particle = self.particles.get(current)?;
        self.next = particle.next_in_cell;
        Some(current)
    }
}

impl CellIndex {
    /// Sizes an empty grid for `sim_box` so that every cell side is at least `cutoff`.
    ///
    /// Each axis gets `floor(L / cutoff)` cells, and the cell side is stretched to `L / n` so
    /// the cells tile the box exactly.
    pub fn new(sim_box: &SimBox, cutoff: f64) -> Result<Self, CellIndexError> {
        let lengths = sim_box.lengths();
        let mut dims = [0usize; 3];
        let mut cell_size = Vector3::zeros();

        for axis in 0..3 {
            let length = lengths[axis];
            if !(cutoff.is_finite() && cutoff > 0.0 && length.is_finite() && cutoff <= length) {
                return Err(CellIndexError::InvalidCutoff {
                    axis,
                    cutoff,
                    length,
                });
            }
            let fact = ((length / cutoff + SIZING_EPSILON).floor() as usize).max(1);
            let size = length / fact as f64;
            cell_size[axis] = size;
            dims[axis] = ((length / size + SIZING_EPSILON).floor() as usize).max(1);
        }

        debug!(
            "Cell grid sized to {}x{}x{} cells of {:.4}x{:.4}x{:.4}",
            dims[0], dims[1], dims[2], cell_size.x, cell_size.y, cell_size.z
        );

        Ok(Self {
            dims,
            cell_size,
            heads: vec![None; dims[0] * dims[1] * dims[2]],
            assignments: Vec::new(),
        })
    }

    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    #[inline]
    pub fn cell_size(&self) -> &Vector3<f64> {
        &self.cell_size
    }

    pub fn cell_count(&self) -> usize {
        self.heads.len()
    }

    /// Rebuilds every chain from scratch for the current positions.
    pub fn build(&mut self, particles: &mut [Particle]) {
        self.heads.fill(None);
        self.assignments.clear();
        self.assignments.reserve(particles.len());

        for i in 0..particles.len() {
            let cell = self.flat_index(self.cell_of(&particles[i].position));
            particles[i].next_in_cell = self.heads[cell];
            self.heads[cell] = Some(i);
            self.assignments.push(cell);
        }
    }

    /// Grid coordinate of the cell containing `position`.
    #[inline]
    pub fn cell_of(&self, position: &Vector3<f64>) -> CellCoord {
        let mut coord = [0usize; 3];
        for axis in 0..3 {
            let raw = (position[axis] / self.cell_size[axis]).floor() as isize;
            coord[axis] = wrap_index(raw, self.dims[axis]);
        }
        coord
    }

    #[inline]
    pub fn flat_index(&self, coord: CellCoord) -> usize {
        (coord[0] * self.dims[1] + coord[1]) * self.dims[2] + coord[2]
    }

    #[cfg(test)]
    pub(crate) fn coord_of(&self, flat: usize) -> CellCoord {
        let plane = self.dims[1] * self.dims[2];
        [flat / plane, (flat % plane) / self.dims[2], flat % self.dims[2]]
    }

    /// The 27 cells around `coord`, wrapped periodically.
    ///
    /// Axes with fewer than three cells would make the block revisit a cell; duplicates are
    /// removed so each cell appears once.
    pub fn neighbor_cells(&self, coord: CellCoord) -> NeighborCells {
        let mut cells = [0usize; NEIGHBORHOOD_SIZE];
        let mut len = 0;
        for dx in -1isize..=1 {
            for dy in -1isize..=1 {
                for dz in -1isize..=1 {
                    cells[len] = self.flat_index([
                        wrap_index(coord[0] as isize + dx, self.dims[0]),
                        wrap_index(coord[1] as isize + dy, self.dims[1]),
                        wrap_index(coord[2] as isize + dz, self.dims[2]),
                    ]);
                    len += 1;
                }
            }
        }

        if self.dims.iter().any(|&n| n < 3) {
            let unique = &mut cells[..len];
            unique.sort_unstable();
            let mut write = 0;
            for read in 0..len {
                if read == 0 || unique[read] != unique[write - 1] {
                    unique[write] = unique[read];
                    write += 1;
                }
            }
            len = write;
        }

        NeighborCells { cells, len }
    }

    pub fn members<'p>(&self, cell: usize, particles: &'p [Particle]) -> CellMembers<'p> {
        CellMembers {
            next: self.heads.get(cell).copied().flatten(),
            particles,
        }
    }

    /// Calls `visit` for every particle in the neighbourhood of `position`.
    pub fn visit_near<F>(&self, position: &Vector3<f64>, particles: &[Particle], mut visit: F)
    where
        F: FnMut(usize),
    {
        let neighborhood = self.neighbor_cells(self.cell_of(position));
        for cell in neighborhood.iter() {
            for j in self.members(cell, particles) {
                visit(j);
            }
        }
    }

    /// Moves particle `i` to the chain of the cell its position now implies.
    ///
    /// Returns `None` when the particle is still in its cell, otherwise the journal needed by
    /// [`CellIndex::restore`].
    ///
    /// # Panics
    ///
    /// Panics if `i` has not been indexed by [`CellIndex::build`].
    pub fn relocate(&mut self, i: usize, particles: &mut [Particle]) -> Option<CellSnapshot> {
        let new_cell = self.flat_index(self.cell_of(&particles[i].position));
        let old_cell = self.assignments[i];
        if new_cell == old_cell {
            return None;
        }

        let old_head_of_old = self.heads[old_cell];
        let old_head_of_new = self.heads[new_cell];
        let link = particles[i].next_in_cell;

        let predecessor = if old_head_of_old == Some(i) {
            self.heads[old_cell] = link;
            None
        } else {
            let mut cursor = old_head_of_old;
            let mut found = None;
            while let Some(j) = cursor {
                if particles[j].next_in_cell == Some(i) {
                    found = Some(j);
                    break;
                }
                cursor = particles[j].next_in_cell;
            }
            if let Some(j) = found {
                particles[j].next_in_cell = link;
            }
            found
        };

        particles[i].next_in_cell = old_head_of_new;
        self.heads[new_cell] = Some(i);
        self.assignments[i] = new_cell;

        Some(CellSnapshot {
            particle: i,
            old_cell,
            new_cell,
            old_head_of_old,
            old_head_of_new,
            link,
            predecessor,
        })
    }

    /// Undoes a relocation recorded by [`CellIndex::relocate`].
    ///
    /// Must be applied before any other change to the two affected chains.
    pub fn restore(&mut self, snapshot: CellSnapshot, particles: &mut [Particle]) {
        let i = snapshot.particle;
        self.heads[snapshot.new_cell] = snapshot.old_head_of_new;
        particles[i].next_in_cell = snapshot.link;
        match snapshot.predecessor {
            Some(j) => particles[j].next_in_cell = Some(i),
            None => self.heads[snapshot.old_cell] = snapshot.old_head_of_old,
        }
        self.assignments[i] = snapshot.old_cell;
    }

    /// Checks that every particle is reachable exactly once, from the cell its position implies.
    pub fn verify(&self, particles: &[Particle]) -> Result<(), CellIndexError> {
        let mut seen = vec![false; particles.len()];

        for (cell, head) in self.heads.iter().enumerate() {
            let mut cursor = *head;
            while let Some(j) = cursor {
                let particle = particles.get(j).ok_or(CellIndexError::DanglingLink(j))?;
                if std::mem::replace(&mut seen[j], true) {
                    return Err(CellIndexError::DuplicateEntry(j));
                }
                let expected = self.flat_index(self.cell_of(&particle.position));
                if expected != cell {
                    return Err(CellIndexError::MisplacedEntry {
                        particle: j,
                        expected,
                        found: cell,
                    });
                }
                cursor = particle.next_in_cell;
            }
        }

        match seen.iter().position(|&s| !s) {
            Some(missing) => Err(CellIndexError::MissingEntry(missing)),
            None => Ok(()),
        }
    }
}
