//! Generalised angularities, λ^κ_α = Σ_i (pT,i / pT,jet)^κ · (ΔR_i / R)^α.
//!
//! Familiar special cases: girth/width (κ = 1, α = 1) and pT,D (κ = 2, α = 0,
//! reported here without the square root). Ghost constituents are skipped.

use serde::{Deserialize, Serialize};

use crate::collection::JetCollection;
use crate::error::HiJetError;
use crate::types::Jet;

/// A scalar observable computed from one jet.
pub trait JetObservable {
    fn result(&self, jet: &Jet) -> f64;

    /// Evaluates the observable on every jet of `collection` and attaches the
    /// values under `name`.
    fn attach(&self, collection: &mut JetCollection, name: &str) -> Result<(), HiJetError> {
        let values: Vec<f64> = collection.jets().iter().map(|j| self.result(j)).collect();
        collection.add_attribute(name, values)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Angularity {
    /// Momentum-fraction exponent κ.
    pub kappa: f64,
    /// Angular exponent α.
    pub alpha: f64,
    /// Jet radius used to normalise ΔR.
    pub radius: f64,
}

impl Angularity {
    pub fn new(kappa: f64, alpha: f64, radius: f64) -> Self {
        Self {
            kappa,
            alpha,
            radius,
        }
    }

    pub fn width(radius: f64) -> Self {
        Self::new(1.0, 1.0, radius)
    }

    pub fn ptd(radius: f64) -> Self {
        Self::new(2.0, 0.0, radius)
    }
}

impl JetObservable for Angularity {
    fn result(&self, jet: &Jet) -> f64 {
        let jet_pt = jet.pt();
        if jet_pt <= 0.0 || self.radius <= 0.0 {
            return 0.0;
        }
        jet.particles()
            .map(|p| {
                let z = p.pt() / jet_pt;
                let theta = p.momentum.delta_r(&jet.momentum) / self.radius;
                z.powf(self.kappa) * theta.powf(self.alpha)
            })
            .sum()
    }
}
