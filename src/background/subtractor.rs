//! The event-level constituent subtraction pass.
//!
//! 1. Estimate ρ, ρ_m over the full ghost acceptance.
//! 2. Cluster the merged event with anti-kt and explicit ghosts.
//! 3. Keep jets with |y| < jet_rap_max and pt ≥ min_jet_pt, hardest first.
//! 4. Correct every kept jet constituent by constituent; drop emptied jets.

use crate::clustering::{ClusterSequence, GhostedAreaSpec, JetDefinition, Selector};
use crate::collection::JetCollection;
use crate::config::HiJetConfig;
use crate::error::HiJetError;
use crate::types::{sorted_by_pt, Particle};

use super::constituent::ConstituentSubtractor;
use super::estimator::{BackgroundEstimate, JetMedianBackgroundEstimator};

/// Corrected jets plus the densities that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtractionResult {
    pub jets: JetCollection,
    pub estimate: BackgroundEstimate,
}

impl SubtractionResult {
    pub fn rho(&self) -> f64 {
        self.estimate.rho
    }

    pub fn rho_m(&self) -> f64 {
        self.estimate.rho_m
    }
}

#[derive(Debug, Clone)]
pub struct CsSubtractor {
    jet_def: JetDefinition,
    area: GhostedAreaSpec,
    jet_selector: Selector,
    min_jet_pt: f64,
    estimator: JetMedianBackgroundEstimator,
    subtractor: ConstituentSubtractor,
}

impl CsSubtractor {
    pub fn new(config: &HiJetConfig) -> Result<Self, HiJetError> {
        config.validate()?;
        let area = config.ghost.area_spec();
        Ok(Self {
            jet_def: config.jet_definition(),
            jet_selector: Selector::abs_rap_max(config.jet_rap_max),
            min_jet_pt: config.min_jet_pt,
            estimator: JetMedianBackgroundEstimator::from_config(config)?,
            subtractor: ConstituentSubtractor::new(&config.subtraction, area.actual_ghost_area()),
            area,
        })
    }

    pub fn estimator(&self) -> &JetMedianBackgroundEstimator {
        &self.estimator
    }

    /// Runs the full subtraction on one merged (signal + background) event.
    pub fn do_subtraction(&self, particles: &[Particle]) -> Result<SubtractionResult, HiJetError> {
        let inputs: Vec<Particle> = particles.iter().filter(|p| p.is_final_state()).copied().collect();
        if inputs.is_empty() {
            log::info!("Constituent subtraction: empty event, no jets");
            return Ok(SubtractionResult {
                jets: JetCollection::default(),
                estimate: BackgroundEstimate::zero(),
            });
        }

        let estimate = self.estimator.estimate(&inputs)?;

        let cs = ClusterSequence::new(&inputs, self.jet_def, Some(&self.area))?;
        let jets = sorted_by_pt(self.jet_selector.apply(&cs.inclusive_jets(self.min_jet_pt)));
        let corrected: Vec<_> = jets
            .iter()
            .filter_map(|jet| self.subtractor.subtract(jet, &estimate))
            .collect();

        log::debug!(
            "Constituent subtraction: {} of {} jets kept after correction",
            corrected.len(),
            jets.len()
        );
        log_metric!(
            "event" = "constituent_subtraction",
            "rho" = estimate.rho,
            "rho_m" = estimate.rho_m,
            "jets_out" = corrected.len()
        );

        Ok(SubtractionResult {
            jets: JetCollection::new(corrected),
            estimate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Origin;
    use std::f64::consts::PI;

    fn test_config() -> HiJetConfig {
        let mut config = HiJetConfig::default();
        config.ghost.ghost_rap_max = 1.5;
        config.ghost.ghost_area = 0.02;
        config.jet_rap_max = 1.0;
        config.min_jet_pt = 5.0;
        config
    }

    fn uniform_background(pt: f64, n_rap: usize, n_phi: usize, rap_max: f64) -> Vec<Particle> {
        let mut out = Vec::new();
        for iy in 0..n_rap {
            for iphi in 0..n_phi {
                let y = -rap_max + (iy as f64 + 0.5) * 2.0 * rap_max / n_rap as f64;
                let phi = (iphi as f64 + 0.5) * 2.0 * PI / n_phi as f64;
                out.push(Particle::massless(pt, y, phi, Origin::Background));
            }
        }
        out
    }

    #[test]
    fn test_empty_event() {
        let sub = CsSubtractor::new(&test_config()).unwrap();
        let result = sub.do_subtraction(&[]).unwrap();
        assert!(result.jets.is_empty());
        assert_eq!(result.rho(), 0.0);
        assert_eq!(result.rho_m(), 0.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = test_config();
        config.jet_radius = 0.0;
        assert!(matches!(CsSubtractor::new(&config), Err(HiJetError::InvalidRadius(_))));
    }

    #[test]
    fn test_dense_background_is_removed_from_signal_jet() {
        let signal = Particle::massless(60.0, 0.0, 1.0, Origin::Signal);
        let mut particles = uniform_background(0.5, 15, 30, 1.5);
        particles.push(signal);

        let sub = CsSubtractor::new(&test_config()).unwrap();
        let result = sub.do_subtraction(&particles).unwrap();
        assert!(result.rho() > 0.0);

        let hardest = &result.jets.jets()[0];
        // Anti-kt around an isolated hard particle takes everything within R of it.
        let raw_pt_in_cone: f64 = particles
            .iter()
            .filter(|p| p.momentum.delta_r(&signal.momentum) < 0.4)
            .map(|p| p.pt())
            .sum();
        let corrected_pt: f64 = hardest.constituents.iter().map(|p| p.pt()).sum();
        let expected_removed = (result.rho() * hardest.area).min(raw_pt_in_cone);
        assert!(
            ((raw_pt_in_cone - corrected_pt) - expected_removed).abs() < 0.1 * expected_removed + 1e-6,
            "removed {} expected {}",
            raw_pt_in_cone - corrected_pt,
            expected_removed
        );
        assert!(hardest.pt() > 55.0);
        for jet in result.jets.jets() {
            assert!(jet.constituents.iter().all(|p| !p.is_ghost() && p.pt() > 0.0));
        }
    }
}
