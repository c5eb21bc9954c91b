//! Ghost generation for active-area clustering.
//!
//! Ghosts are placed on a rapidity–azimuth grid covering |y| < ghost_rap_max,
//! each cell holding one ghost jittered inside it. The jitter comes from a
//! seeded `StdRng`, so the same spec always produces the same ghosts.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::HiJetError;
use crate::types::{Origin, Particle};

/// Mean transverse momentum of a ghost.
pub const MEAN_GHOST_PT: f64 = 1e-100;

/// Largest ghost grid a spec may ask for.
pub const MAX_GHOSTS: usize = 2_000_000;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct GhostedAreaSpec {
    pub ghost_rap_max: f64,
    /// Requested area per ghost; the grid rounds it to `actual_ghost_area()`.
    pub ghost_area: f64,
    #[serde(default = "default_grid_scatter")]
    pub grid_scatter: f64,
    #[serde(default = "default_pt_scatter")]
    pub pt_scatter: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_grid_scatter() -> f64 {
    1.0
}

fn default_pt_scatter() -> f64 {
    0.1
}

pub(crate) fn default_seed() -> u64 {
    0x5EED_1E7
}

struct GhostGrid {
    n_rap: usize,
    n_phi: usize,
    drap: f64,
    dphi: f64,
}

impl GhostedAreaSpec {
    pub fn new(ghost_rap_max: f64, ghost_area: f64) -> Self {
        Self {
            ghost_rap_max,
            ghost_area,
            grid_scatter: default_grid_scatter(),
            pt_scatter: default_pt_scatter(),
            seed: default_seed(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), HiJetError> {
        if !(self.ghost_area.is_finite() && self.ghost_area > 0.0) {
            return Err(HiJetError::InvalidGhostArea(self.ghost_area));
        }
        if !(self.ghost_rap_max.is_finite() && self.ghost_rap_max > 0.0) {
            return Err(HiJetError::InvalidConfig(format!(
                "ghost_rap_max must be finite and > 0, got {}",
                self.ghost_rap_max
            )));
        }
        if !(0.0..=1.0).contains(&self.grid_scatter) || !(0.0..=1.0).contains(&self.pt_scatter) {
            return Err(HiJetError::InvalidConfig(
                "ghost grid_scatter and pt_scatter must lie in [0, 1]".to_string(),
            ));
        }
        // Counted in floating point so absurd grids cannot overflow.
        let spacing = self.ghost_area.sqrt();
        let n_ghosts = 2.0 * (self.ghost_rap_max / spacing).ceil() * (2.0 * PI / spacing).ceil();
        if n_ghosts > MAX_GHOSTS as f64 {
            log::warn!(
                "Ghost area {} over |y| < {} needs {:.3e} ghosts (limit {})",
                self.ghost_area,
                self.ghost_rap_max,
                n_ghosts,
                MAX_GHOSTS
            );
            return Err(HiJetError::InvalidGhostArea(self.ghost_area));
        }
        Ok(())
    }

    fn grid(&self) -> GhostGrid {
        let spacing = self.ghost_area.sqrt();
        let n_rap = ((self.ghost_rap_max / spacing).ceil() as usize).max(1);
        let n_phi = ((2.0 * PI / spacing).ceil() as usize).max(1);
        GhostGrid {
            n_rap,
            n_phi,
            drap: self.ghost_rap_max / n_rap as f64,
            dphi: 2.0 * PI / n_phi as f64,
        }
    }

    /// Area actually carried by each ghost after rounding to the grid.
    pub fn actual_ghost_area(&self) -> f64 {
        let grid = self.grid();
        grid.drap * grid.dphi
    }

    /// Total area covered by the ghosts.
    pub fn total_area(&self) -> f64 {
        2.0 * self.ghost_rap_max * 2.0 * PI
    }

    pub fn n_ghosts(&self) -> usize {
        let grid = self.grid();
        2 * grid.n_rap * grid.n_phi
    }

    pub fn generate_ghosts(&self) -> Vec<Particle> {
        let grid = self.grid();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut ghosts = Vec::with_capacity(2 * grid.n_rap * grid.n_phi);

        let n_rap = grid.n_rap as i64;
        for irap in -n_rap..n_rap {
            for iphi in 0..grid.n_phi {
                let y = (irap as f64 + 0.5) * grid.drap
                    + grid.drap * (rng.random::<f64>() - 0.5) * self.grid_scatter;
                let phi = (iphi as f64 + 0.5) * grid.dphi
                    + grid.dphi * (rng.random::<f64>() - 0.5) * self.grid_scatter;
                let pt = MEAN_GHOST_PT * (1.0 + (rng.random::<f64>() - 0.5) * self.pt_scatter);
                ghosts.push(Particle::massless(pt, y, phi, Origin::Ghost));
            }
        }
        ghosts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ghosts_tile_the_acceptance() {
        let spec = GhostedAreaSpec::new(1.0, 0.05);
        let ghosts = spec.generate_ghosts();
        assert_eq!(ghosts.len(), spec.n_ghosts());

        let covered = ghosts.len() as f64 * spec.actual_ghost_area();
        assert!((covered - spec.total_area()).abs() < 1e-9);

        for g in &ghosts {
            assert!(g.is_ghost());
            assert!(g.rapidity().abs() <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn test_same_seed_same_ghosts() {
        let a = GhostedAreaSpec::new(1.0, 0.1).with_seed(7).generate_ghosts();
        let b = GhostedAreaSpec::new(1.0, 0.1).with_seed(7).generate_ghosts();
        let c = GhostedAreaSpec::new(1.0, 0.1).with_seed(8).generate_ghosts();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_invalid_ghost_area_rejected() {
        let spec = GhostedAreaSpec::new(1.0, -0.01);
        assert!(matches!(spec.validate(), Err(HiJetError::InvalidGhostArea(_))));
        let spec = GhostedAreaSpec::new(0.0, 0.01);
        assert!(matches!(spec.validate(), Err(HiJetError::InvalidConfig(_))));
    }

    #[test]
    fn test_oversized_ghost_grid_rejected() {
        let spec = GhostedAreaSpec::new(6.0, 1e-9);
        assert!(matches!(spec.validate(), Err(HiJetError::InvalidGhostArea(_))));
        assert!(GhostedAreaSpec::new(6.0, 0.005).validate().is_ok());
        let spec = GhostedAreaSpec::new(1e300, 1e-300);
        assert!(matches!(spec.validate(), Err(HiJetError::InvalidGhostArea(_))));
    }
}
