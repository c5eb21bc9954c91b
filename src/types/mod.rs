//! This module defines the core, strongly-typed data representations used
//! throughout the hijet pipeline: four-momenta, provenance-tagged particles
//! and clustered jets.

pub mod four_momentum;
pub mod jet;
pub mod particle;

// Re-export the main type(s) for easier access.
pub use four_momentum::{delta_phi, FourMomentum};
pub use jet::{sorted_by_pt, Jet};
pub use particle::{Origin, Particle};
