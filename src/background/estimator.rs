//! Event-wide background density from the median of patch pT/A.
//!
//! The event is re-clustered into patches (kt, R = 0.4 by default) with
//! explicit ghosts over the full ghost acceptance. Patches within
//! |y| < ghost_rap_max − R_patch, minus the few hardest ones, feed the medians
//! ρ = median(pT/A) and ρ_m = median(Σ(mT − pT)/A).
//!
//! The estimate deliberately does not use the narrower jet acceptance, so the
//! signal jets do not bias it.

use crate::clustering::{ClusterSequence, GhostedAreaSpec, JetDefinition, Selector};
use crate::config::HiJetConfig;
use crate::error::HiJetError;
use crate::types::{Jet, Particle};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BackgroundEstimate {
    /// Transverse-momentum density per unit area.
    pub rho: f64,
    /// Mass-term density, Σ(mT − pT) per unit area.
    pub rho_m: f64,
    /// Number of patches entering the medians.
    pub n_patches: usize,
}

impl BackgroundEstimate {
    /// The "no correction" estimate.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_degenerate(&self) -> bool {
        self.n_patches == 0
    }
}

#[derive(Debug, Clone)]
pub struct JetMedianBackgroundEstimator {
    jet_def: JetDefinition,
    area: GhostedAreaSpec,
    selector: Selector,
}

impl JetMedianBackgroundEstimator {
    pub fn new(jet_def: JetDefinition, area: GhostedAreaSpec, selector: Selector) -> Self {
        Self {
            jet_def,
            area,
            selector,
        }
    }

    pub fn from_config(config: &HiJetConfig) -> Result<Self, HiJetError> {
        let jet_def = config.background_jet_definition();
        jet_def.validate()?;
        let area = config.ghost.area_spec();
        area.validate()?;

        let rap_max = config.ghost.ghost_rap_max - config.background.radius;
        let selector = Selector::abs_rap_max(rap_max)
            .and(Selector::n_hardest(config.background.n_hardest_excluded).not());
        Ok(Self::new(jet_def, area, selector))
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Estimates ρ and ρ_m for one event.
    ///
    /// An event without final-state particles, or one leaving no patch after
    /// selection, yields the zero estimate. That is reported, not an error.
    pub fn estimate(&self, particles: &[Particle]) -> Result<BackgroundEstimate, HiJetError> {
        let inputs: Vec<Particle> = particles.iter().filter(|p| p.is_final_state()).copied().collect();
        if inputs.is_empty() {
            log::warn!("Background estimate: no particles in event, using rho = rho_m = 0");
            return Ok(BackgroundEstimate::zero());
        }

        let cs = ClusterSequence::new(&inputs, self.jet_def, Some(&self.area))?;
        let patches = self.selector.apply(&cs.inclusive_jets(0.0));

        let mut pt_densities = Vec::with_capacity(patches.len());
        let mut mt_densities = Vec::with_capacity(patches.len());
        for patch in patches.iter().filter(|p| p.area > 0.0) {
            pt_densities.push(patch.pt() / patch.area);
            mt_densities.push(mt_minus_pt(patch) / patch.area);
        }

        if pt_densities.is_empty() {
            log::warn!(
                "Background estimate: no patches passed the selection ({} particles), using rho = rho_m = 0",
                inputs.len()
            );
            return Ok(BackgroundEstimate::zero());
        }

        let estimate = BackgroundEstimate {
            rho: median(&mut pt_densities),
            rho_m: median(&mut mt_densities),
            n_patches: pt_densities.len(),
        };
        log::debug!(
            "Background estimate: rho = {:.4}, rho_m = {:.4} from {} patches",
            estimate.rho,
            estimate.rho_m,
            estimate.n_patches
        );
        Ok(estimate)
    }
}

/// Σ over real constituents of (mT − pT).
fn mt_minus_pt(jet: &Jet) -> f64 {
    jet.particles()
        .map(|p| (p.momentum.mt() - p.pt()).max(0.0))
        .sum()
}

/// Median with linear interpolation between the two central values.
pub(crate) fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let position = 0.5 * (values.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    values[lower] * (1.0 - fraction) + values[upper] * fraction
}
