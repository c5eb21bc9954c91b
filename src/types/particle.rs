//! Input particles and their provenance tags.

use serde::{Deserialize, Serialize};

use super::four_momentum::FourMomentum;

/// Where a particle came from.
///
/// `Ghost` marks the infinitesimal pseudo-particles added by area-aware
/// clustering; they never appear in the particle supply itself.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Hard-process parton that initiated a signal jet. Not clustered.
    Parton,
    Signal,
    Background,
    Ghost,
}

/// An immutable four-momentum with its provenance.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub momentum: FourMomentum,
    pub origin: Origin,
    #[serde(default)]
    pub user_index: Option<i64>,
}

impl Particle {
    pub fn new(momentum: FourMomentum, origin: Origin) -> Self {
        Self {
            momentum,
            origin,
            user_index: None,
        }
    }

    /// Massless particle from transverse momentum, rapidity and azimuth.
    pub fn massless(pt: f64, y: f64, phi: f64, origin: Origin) -> Self {
        Self::new(FourMomentum::from_pt_y_phi_m(pt, y, phi, 0.0), origin)
    }

    pub fn with_user_index(mut self, index: i64) -> Self {
        self.user_index = Some(index);
        self
    }

    pub fn is_ghost(&self) -> bool {
        self.origin == Origin::Ghost
    }

    /// Signal or background particle, i.e. something that is clustered.
    pub fn is_final_state(&self) -> bool {
        matches!(self.origin, Origin::Signal | Origin::Background)
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
}
