// In: src/config.rs

//! The single source of truth for all hijet run configuration.
//!
//! `HiJetConfig` is created once at the application boundary (from JSON or in
//! code), validated, and then handed by reference to every component at
//! construction. Components copy what they need; nothing reads global state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::clustering::{GhostedAreaSpec, JetAlgorithm, JetDefinition};
use crate::error::HiJetError;

//==================================================================================
// I. Component Configuration Structs
//==================================================================================

/// Ghost placement for active-area clustering.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct GhostConfig {
    /// Requested area per ghost.
    #[serde(default = "default_ghost_area")]
    pub ghost_area: f64,
    /// Ghosts cover |y| < ghost_rap_max.
    #[serde(default = "default_ghost_rap_max")]
    pub ghost_rap_max: f64,
    /// Seed for the ghost jitter.
    #[serde(default = "crate::clustering::ghosts::default_seed")]
    pub seed: u64,
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            ghost_area: default_ghost_area(),
            ghost_rap_max: default_ghost_rap_max(),
            seed: crate::clustering::ghosts::default_seed(),
        }
    }
}

impl GhostConfig {
    pub fn area_spec(&self) -> GhostedAreaSpec {
        GhostedAreaSpec::new(self.ghost_rap_max, self.ghost_area).with_seed(self.seed)
    }
}

/// The event-wide background density estimate (median of pT/A over patches).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct BackgroundConfig {
    #[serde(default = "default_background_algorithm")]
    pub algorithm: JetAlgorithm,
    /// Radius of the patches used for the median.
    #[serde(default = "default_background_radius")]
    pub radius: f64,
    /// Number of hardest patches left out of the median.
    #[serde(default = "default_n_hardest_excluded")]
    pub n_hardest_excluded: usize,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            algorithm: default_background_algorithm(),
            radius: default_background_radius(),
            n_hardest_excluded: default_n_hardest_excluded(),
        }
    }
}

/// Constituent-level correction settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct SubtractionConfig {
    /// Largest ΔR between a particle and a ghost that may exchange momentum.
    /// A value ≤ 0 means no cap.
    #[serde(default = "default_max_distance")]
    pub max_distance: f64,
    /// Exponent of the pT weight in the pairing distance pT^a · ΔR.
    #[serde(default)]
    pub distance_exponent: f64,
}

impl Default for SubtractionConfig {
    fn default() -> Self {
        Self {
            max_distance: default_max_distance(),
            distance_exponent: 0.0,
        }
    }
}

/// One soft-drop grooming setting; `label` names the output attributes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct GroomingConfig {
    pub label: String,
    pub z_cut: f64,
    pub beta: f64,
}

/// One angularity attached to the signal jets as `<label>Sig`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct AngularityConfig {
    pub label: String,
    pub kappa: f64,
    pub alpha: f64,
}

//==================================================================================
// II. The Unified HiJetConfig
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct HiJetConfig {
    /// Anti-kt radius for signal, raw and subtracted jets; also the matching radius.
    #[serde(default = "default_jet_radius")]
    pub jet_radius: f64,

    /// Jets below this transverse momentum are not kept.
    #[serde(default = "default_min_jet_pt")]
    pub min_jet_pt: f64,

    /// Jets are kept for |y| < jet_rap_max.
    #[serde(default = "default_jet_rap_max")]
    pub jet_rap_max: f64,

    #[serde(default)]
    pub ghost: GhostConfig,

    #[serde(default)]
    pub background: BackgroundConfig,

    #[serde(default)]
    pub subtraction: SubtractionConfig,

    #[serde(default = "default_grooming")]
    pub grooming: Vec<GroomingConfig>,

    #[serde(default = "default_angularities")]
    pub angularities: Vec<AngularityConfig>,
}

impl Default for HiJetConfig {
    fn default() -> Self {
        Self {
            jet_radius: default_jet_radius(),
            min_jet_pt: default_min_jet_pt(),
            jet_rap_max: default_jet_rap_max(),
            ghost: GhostConfig::default(),
            background: BackgroundConfig::default(),
            subtraction: SubtractionConfig::default(),
            grooming: default_grooming(),
            angularities: default_angularities(),
        }
    }
}

impl HiJetConfig {
    /// Parses and validates a JSON configuration. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, HiJetError> {
        let config: HiJetConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn jet_definition(&self) -> JetDefinition {
        JetDefinition::anti_kt(self.jet_radius)
    }

    pub fn background_jet_definition(&self) -> JetDefinition {
        JetDefinition::new(self.background.algorithm, self.background.radius)
    }

    /// Checks every setting; all configuration errors surface here.
    pub fn validate(&self) -> Result<(), HiJetError> {
        self.jet_definition().validate()?;
        self.background_jet_definition().validate()?;
        self.ghost.area_spec().validate()?;

        if !(self.jet_rap_max.is_finite() && self.jet_rap_max > 0.0) {
            return Err(HiJetError::InvalidConfig(format!(
                "jet_rap_max must be finite and > 0, got {}",
                self.jet_rap_max
            )));
        }
        if self.jet_rap_max > self.ghost.ghost_rap_max {
            return Err(HiJetError::InvalidConfig(format!(
                "jet_rap_max ({}) exceeds ghost_rap_max ({}); jet areas would be truncated",
                self.jet_rap_max, self.ghost.ghost_rap_max
            )));
        }
        if self.background.radius >= self.ghost.ghost_rap_max {
            return Err(HiJetError::InvalidConfig(format!(
                "background radius ({}) leaves no rapidity range inside ghost_rap_max ({})",
                self.background.radius, self.ghost.ghost_rap_max
            )));
        }
        if !(self.min_jet_pt.is_finite() && self.min_jet_pt >= 0.0) {
            return Err(HiJetError::InvalidConfig(format!(
                "min_jet_pt must be finite and >= 0, got {}",
                self.min_jet_pt
            )));
        }
        if !self.subtraction.max_distance.is_finite()
            || !self.subtraction.distance_exponent.is_finite()
        {
            return Err(HiJetError::InvalidConfig(
                "subtraction parameters must be finite".to_string(),
            ));
        }
        for g in &self.grooming {
            if !(g.z_cut.is_finite() && (0.0..1.0).contains(&g.z_cut)) {
                return Err(HiJetError::InvalidConfig(format!(
                    "grooming '{}': z_cut must lie in [0, 1), got {}",
                    g.label, g.z_cut
                )));
            }
            if !(g.beta.is_finite() && g.beta >= 0.0) {
                return Err(HiJetError::InvalidConfig(format!(
                    "grooming '{}': beta must be finite and >= 0, got {}",
                    g.label, g.beta
                )));
            }
        }
        if let Some(label) = first_duplicate(self.grooming.iter().map(|g| g.label.as_str())) {
            return Err(HiJetError::InvalidConfig(format!(
                "grooming label '{label}' is used more than once"
            )));
        }
        if let Some(label) = first_duplicate(self.angularities.iter().map(|a| a.label.as_str())) {
            return Err(HiJetError::InvalidConfig(format!(
                "angularity label '{label}' is used more than once"
            )));
        }
        for a in &self.angularities {
            if !(a.kappa.is_finite() && a.alpha.is_finite() && a.kappa >= 0.0 && a.alpha >= 0.0) {
                return Err(HiJetError::InvalidConfig(format!(
                    "angularity '{}': exponents must be finite and >= 0",
                    a.label
                )));
            }
        }
        Ok(())
    }
}

/// Labels name output attributes and collections, so each must be unique.
fn first_duplicate<'a>(labels: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = BTreeSet::new();
    labels.into_iter().find(|label| !seen.insert(*label))
}

//==================================================================================
// III. Serde Default Helpers
//==================================================================================

fn default_jet_radius() -> f64 {
    0.4
}

fn default_min_jet_pt() -> f64 {
    10.0
}

fn default_jet_rap_max() -> f64 {
    3.0
}

fn default_ghost_area() -> f64 {
    0.005
}

fn default_ghost_rap_max() -> f64 {
    6.0
}

fn default_background_algorithm() -> JetAlgorithm {
    JetAlgorithm::Kt
}

fn default_background_radius() -> f64 {
    0.4
}

fn default_n_hardest_excluded() -> usize {
    2
}

fn default_max_distance() -> f64 {
    -1.0
}

fn default_grooming() -> Vec<GroomingConfig> {
    vec![GroomingConfig {
        label: "Beta00Z01".to_string(),
        z_cut: 0.1,
        beta: 0.0,
    }]
}

fn default_angularities() -> Vec<AngularityConfig> {
    vec![
        AngularityConfig {
            label: "width".to_string(),
            kappa: 1.0,
            alpha: 1.0,
        },
        AngularityConfig {
            label: "pTD".to_string(),
            kappa: 2.0,
            alpha: 0.0,
        },
    ]
}
