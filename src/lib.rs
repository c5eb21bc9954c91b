//! This file is the root of the `hijet` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`background`,
//!     `matching`, `grooming`, etc.) so the Rust compiler knows they exist.
//! 2.  Re-exporting the handful of types most callers need.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
pub mod observability; // Make macros available throughout the crate

pub mod angularity;
pub mod background;
pub mod clustering;
pub mod collection;
pub mod config;
pub mod error;
pub mod event;
pub mod grooming;
pub mod matching;
pub mod types;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================
pub use angularity::{Angularity, JetObservable};
pub use background::{BackgroundEstimate, CsSubtractor, SubtractionResult};
pub use collection::{Attribute, JetCollection};
pub use config::HiJetConfig;
pub use error::HiJetError;
pub use event::{EventInput, EventOutput, EventProcessor, EventSink, EventSource};
pub use grooming::{GroomingResult, SoftDropGroomer};
pub use matching::{JetMatcher, MatchRecord};
pub use observability::init_logging;
pub use types::{FourMomentum, Jet, Origin, Particle};
