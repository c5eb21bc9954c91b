//! Four-momentum vectors in the (px, py, pz, E) convention.
//!
//! Azimuth is reported in [0, 2π) and rapidity is the true rapidity
//! y = ½ ln((E + pz)/(E − pz)), not pseudorapidity.

use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

const TWO_PI: f64 = 2.0 * PI;

/// Rapidity assigned to (anti-)longitudinal vectors with E == |pz|.
pub const MAX_RAPIDITY: f64 = 1e5;

/// Four-momentum in natural units (c = 1).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FourMomentum {
    pub px: f64,
    pub py: f64,
    pub pz: f64,
    pub e: f64,
}

impl FourMomentum {
    pub fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self { px, py, pz, e }
    }

    /// Builds a vector from transverse momentum, rapidity, azimuth and mass.
    pub fn from_pt_y_phi_m(pt: f64, y: f64, phi: f64, m: f64) -> Self {
        let mt = (pt * pt + m * m).sqrt();
        Self {
            px: pt * phi.cos(),
            py: pt * phi.sin(),
            pz: mt * y.sinh(),
            e: mt * y.cosh(),
        }
    }

    pub fn pt2(&self) -> f64 {
        self.px * self.px + self.py * self.py
    }

    pub fn pt(&self) -> f64 {
        self.pt2().sqrt()
    }

    /// Invariant mass squared, E² − |p|² (may be slightly negative from rounding).
    pub fn m2(&self) -> f64 {
        (self.e + self.pz) * (self.e - self.pz) - self.pt2()
    }

    /// Invariant mass; spacelike vectors are reported as −√|m²|.
    pub fn m(&self) -> f64 {
        let m2 = self.m2();
        if m2 < 0.0 {
            -(-m2).sqrt()
        } else {
            m2.sqrt()
        }
    }

    /// Transverse mass squared, E² − pz².
    pub fn mt2(&self) -> f64 {
        (self.e + self.pz) * (self.e - self.pz)
    }

    pub fn mt(&self) -> f64 {
        let mt2 = self.mt2();
        if mt2 < 0.0 {
            0.0
        } else {
            mt2.sqrt()
        }
    }

    /// Azimuth in [0, 2π). A vector with zero transverse momentum has azimuth 0.
    pub fn phi(&self) -> f64 {
        if self.px == 0.0 && self.py == 0.0 {
            return 0.0;
        }
        let phi = self.py.atan2(self.px);
        if phi < 0.0 {
            phi + TWO_PI
        } else if phi >= TWO_PI {
            phi - TWO_PI
        } else {
            phi
        }
    }

    pub fn rapidity(&self) -> f64 {
        if self.e == self.pz.abs() && self.pt2() == 0.0 {
            return if self.pz >= 0.0 {
                MAX_RAPIDITY + self.pz
            } else {
                -(MAX_RAPIDITY - self.pz)
            };
        }
        // Guard against E < |pz| from rounding by using the transverse mass.
        let effective_m2 = self.m2().max(0.0);
        let e_plus_pz = self.e + self.pz.abs();
        let y = 0.5 * ((self.pt2() + effective_m2) / (e_plus_pz * e_plus_pz)).ln();
        if self.pz > 0.0 {
            -y
        } else {
            y
        }
    }

    pub fn pseudorapidity(&self) -> f64 {
        let p = (self.pt2() + self.pz * self.pz).sqrt();
        if p == self.pz.abs() {
            return if self.pz >= 0.0 { MAX_RAPIDITY } else { -MAX_RAPIDITY };
        }
        0.5 * ((p + self.pz) / (p - self.pz)).ln()
    }

    /// Squared rapidity–azimuth distance to `other`.
    pub fn delta_r2(&self, other: &FourMomentum) -> f64 {
        let dy = self.rapidity() - other.rapidity();
        let dphi = delta_phi(self.phi(), other.phi());
        dy * dy + dphi * dphi
    }

    /// Rapidity–azimuth distance ΔR to `other`.
    pub fn delta_r(&self, other: &FourMomentum) -> f64 {
        self.delta_r2(other).sqrt()
    }
}

/// Signed azimuthal difference folded into [−π, π].
pub fn delta_phi(phi1: f64, phi2: f64) -> f64 {
    let mut dphi = phi1 - phi2;
    if dphi > PI {
        dphi -= TWO_PI;
    } else if dphi < -PI {
        dphi += TWO_PI;
    }
    dphi
}

impl Add for FourMomentum {
    type Output = FourMomentum;

    fn add(self, rhs: FourMomentum) -> FourMomentum {
        FourMomentum::new(
            self.px + rhs.px,
            self.py + rhs.py,
            self.pz + rhs.pz,
            self.e + rhs.e,
        )
    }
}

impl AddAssign for FourMomentum {
    fn add_assign(&mut self, rhs: FourMomentum) {
        self.px += rhs.px;
        self.py += rhs.py;
        self.pz += rhs.pz;
        self.e += rhs.e;
    }
}

impl Sub for FourMomentum {
    type Output = FourMomentum;

    fn sub(self, rhs: FourMomentum) -> FourMomentum {
        FourMomentum::new(
            self.px - rhs.px,
            self.py - rhs.py,
            self.pz - rhs.pz,
            self.e - rhs.e,
        )
    }
}

impl Mul<f64> for FourMomentum {
    type Output = FourMomentum;

    fn mul(self, scale: f64) -> FourMomentum {
        FourMomentum::new(
            self.px * scale,
            self.py * scale,
            self.pz * scale,
            self.e * scale,
        )
    }
}

impl Zero for FourMomentum {
    fn zero() -> Self {
        FourMomentum::default()
    }

    fn is_zero(&self) -> bool {
        self.px == 0.0 && self.py == 0.0 && self.pz == 0.0 && self.e == 0.0
    }
}

impl Sum for FourMomentum {
    fn sum<I: Iterator<Item = FourMomentum>>(iter: I) -> Self {
        iter.fold(FourMomentum::zero(), |acc, p| acc + p)
    }
}

impl<'a> Sum<&'a FourMomentum> for FourMomentum {
    fn sum<I: Iterator<Item = &'a FourMomentum>>(iter: I) -> Self {
        iter.fold(FourMomentum::zero(), |acc, p| acc + *p)
    }
}
