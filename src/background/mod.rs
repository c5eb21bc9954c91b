//! Heavy-ion background handling: density estimate and constituent subtraction.

pub mod constituent;
pub mod estimator;
pub mod subtractor;

pub use constituent::ConstituentSubtractor;
pub use estimator::{BackgroundEstimate, JetMedianBackgroundEstimator};
pub use subtractor::{CsSubtractor, SubtractionResult};
