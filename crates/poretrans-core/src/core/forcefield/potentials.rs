use super::params::FeneParams;

/// Outcome of evaluating one FENE bond.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BondEnergy {
    /// The bond holds; the unscaled FENE energy of the pair.
    Intact(f64),
    /// The pair separation left the finite extensibility range and the bond snapped.
    Broken,
}

impl BondEnergy {
    /// Energy contribution of the bond; a broken bond contributes nothing.
    #[inline]
    pub fn energy(&self) -> f64 {
        match *self {
            BondEnergy::Intact(e) => e,
            BondEnergy::Broken => 0.0,
        }
    }

    #[inline]
    pub fn is_broken(&self) -> bool {
        matches!(self, BondEnergy::Broken)
    }
}

/// Soft repulsive DPD pair energy `0.5 * (1 - r/r_c)^2` inside the cutoff, zero outside.
#[inline]
pub fn soft_repulsion(dist: f64, cutoff: f64) -> f64 {
    if dist < cutoff {
        let s = 1.0 - dist / cutoff;
        0.5 * s * s
    } else {
        0.0
    }
}

/// Unscaled FENE energy `-r0^2 * ln(1 - ((r - r_eq) / r0)^2)` of one bonded pair.
///
/// Separations with `|r - r_eq| >= r0` (in particular `r >= r_max`) are reported as
/// [`BondEnergy::Broken`]; the logarithm is only evaluated on a strictly positive argument.
#[inline]
pub fn fene(dist: f64, params: &FeneParams) -> BondEnergy {
    let r0 = params.r0();
    let x = (dist - params.r_eq) / r0;
    let x2 = x * x;
    if x2 < 1.0 {
        BondEnergy::Intact(-r0 * r0 * (1.0 - x2).ln())
    } else {
        BondEnergy::Broken
    }
}
