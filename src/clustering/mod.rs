//! Reference sequential-recombination clustering.
//!
//! This module plays the role of the external clustering primitive: it turns
//! particles into jets with constituents, active areas (via explicit ghosts)
//! and an immutable merge tree that grooming can walk backwards.

use serde::{Deserialize, Serialize};

use crate::error::HiJetError;

//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod ghosts;
pub mod history;
pub mod selector;
pub mod sequence;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================
pub use self::ghosts::GhostedAreaSpec;
pub use self::history::{HistoryNode, MergeTree};
pub use self::selector::Selector;
pub use self::sequence::ClusterSequence;

/// Members of the generalised-kt family, d_ij = min(kt_i^2p, kt_j^2p) ΔR²/R².
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JetAlgorithm {
    /// p = 1
    Kt,
    /// p = 0
    CambridgeAachen,
    /// p = -1
    AntiKt,
}

#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct JetDefinition {
    pub algorithm: JetAlgorithm,
    pub radius: f64,
}

impl JetDefinition {
    pub fn new(algorithm: JetAlgorithm, radius: f64) -> Self {
        Self { algorithm, radius }
    }

    pub fn anti_kt(radius: f64) -> Self {
        Self::new(JetAlgorithm::AntiKt, radius)
    }

    pub fn kt(radius: f64) -> Self {
        Self::new(JetAlgorithm::Kt, radius)
    }

    pub fn cambridge(radius: f64) -> Self {
        Self::new(JetAlgorithm::CambridgeAachen, radius)
    }

    pub fn validate(&self) -> Result<(), HiJetError> {
        if self.radius.is_finite() && self.radius > 0.0 {
            Ok(())
        } else {
            Err(HiJetError::InvalidRadius(self.radius))
        }
    }
}
