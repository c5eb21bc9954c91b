//! The `Jet` value type produced by clustering, subtraction and grooming.

use num_traits::Zero;
use serde::{Deserialize, Serialize};

use super::four_momentum::FourMomentum;
use super::particle::Particle;

/// A clustered jet with its constituents and (optional) active catchment area.
///
/// Jets are plain values: matching and grooming copy them between collections.
/// The all-zero `Jet::default()` doubles as the "missing" sentinel used when a
/// tag jet has no matched partner.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Jet {
    pub momentum: FourMomentum,
    /// Constituents including explicit ghosts, when clustering was area-aware.
    pub constituents: Vec<Particle>,
    /// Active area; zero when clustering carried no ghosts.
    pub area: f64,
}

impl Jet {
    pub fn new(momentum: FourMomentum, constituents: Vec<Particle>, area: f64) -> Self {
        Self {
            momentum,
            constituents,
            area,
        }
    }

    /// Builds a jet whose momentum is the vector sum of `constituents`.
    pub fn from_constituents(constituents: Vec<Particle>, area: f64) -> Self {
        let momentum = constituents.iter().map(|p| p.momentum).sum();
        Self::new(momentum, constituents, area)
    }

    /// The "missing" placeholder: zero four-momentum, no constituents, no area.
    pub fn sentinel() -> Self {
        Self::default()
    }

    pub fn is_sentinel(&self) -> bool {
        self.momentum.is_zero() && self.constituents.is_empty()
    }

    /// Real (non-ghost) constituents.
    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.constituents.iter().filter(|p| !p.is_ghost())
    }

    pub fn ghosts(&self) -> impl Iterator<Item = &Particle> {
        self.constituents.iter().filter(|p| p.is_ghost())
    }

    pub fn n_particles(&self) -> usize {
        self.particles().count()
    }

    pub fn is_pure_ghost(&self) -> bool {
        self.particles().next().is_none()
    }

    pub fn pt(&self) -> f64 {
        self.momentum.pt()
    }

    pub fn rapidity(&self) -> f64 {
        self.momentum.rapidity()
    }

    pub fn phi(&self) -> f64 {
        self.momentum.phi()
    }

    pub fn m(&self) -> f64 {
        self.momentum.m()
    }

    pub fn delta_r(&self, other: &Jet) -> f64 {
        self.momentum.delta_r(&other.momentum)
    }
}

/// Sorts jets by decreasing transverse momentum; equal pt keeps input order.
pub fn sorted_by_pt(mut jets: Vec<Jet>) -> Vec<Jet> {
    jets.sort_by(|a, b| b.momentum.pt2().total_cmp(&a.momentum.pt2()));
    jets
}
