use nalgebra::Vector3;

/// An orthorhombic simulation box with periodic boundaries on every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimBox {
    lengths: Vector3<f64>,
}

impl SimBox {
    pub fn new(lengths: Vector3<f64>) -> Self {
        Self { lengths }
    }

    pub fn cubic(length: f64) -> Self {
        Self::new(Vector3::repeat(length))
    }

    #[inline]
    pub fn lengths(&self) -> &Vector3<f64> {
        &self.lengths
    }

    pub fn volume(&self) -> f64 {
        self.lengths.x * self.lengths.y * self.lengths.z
    }

    /// Folds a difference vector into the minimum-image convention.
    ///
    /// Every component of the result lies in `(-L/2, L/2]` for its axis.
    #[inline]
    pub fn minimum_image(&self, dr: Vector3<f64>) -> Vector3<f64> {
        Vector3::new(
            fold_component(dr.x, self.lengths.x),
            fold_component(dr.y, self.lengths.y),
            fold_component(dr.z, self.lengths.z),
        )
    }

    /// Shortest vector from `b` to `a` across all periodic images.
    #[inline]
    pub fn separation(&self, a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
        self.minimum_image(a - b)
    }

    #[inline]
    pub fn distance(&self, a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
        self.separation(a, b).norm()
    }

    /// Maps a position back into the primary box `[0, L)` on every axis.
    pub fn wrap(&self, r: &Vector3<f64>) -> Vector3<f64> {
        Vector3::new(
            wrap_coordinate(r.x, self.lengths.x),
            wrap_coordinate(r.y, self.lengths.y),
            wrap_coordinate(r.z, self.lengths.z),
        )
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, r: &Vector3<f64>) -> bool {
        (0..3).all(|axis| r[axis] >= 0.0 && r[axis] < self.lengths[axis])
    }
}

#[inline]
fn fold_component(d: f64, length: f64) -> f64 {
    let half = 0.5 * length;
    let mut folded = d - length * (d / length).round();
    if folded <= -half {
        folded += length;
    } else if folded > half {
        folded -= length;
    }
    folded
}

#[inline]
fn wrap_coordinate(x: f64, length: f64) -> f64 {
    let wrapped = x.rem_euclid(length);
    // rem_euclid rounds tiny negative inputs up to exactly `length`.
    if wrapped >= length { 0.0 } else { wrapped }
}

/// Non-negative modulo: always returns a value in `[0, n)`, also for negative `i`.
#[inline]
pub fn wrap_index(i: isize, n: usize) -> usize {
    i.rem_euclid(n as isize) as usize
}
