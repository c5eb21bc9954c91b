// In: src/error.rs

//! This module defines the single, unified error type for the entire hijet library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! Only configuration and usage mistakes are errors. Degenerate events (no
//! particles, jets without constituents, unmatched jets) produce well-defined
//! empty or sentinel results instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HiJetError {
    // =========================================================================
    // === Configuration Errors (fatal, detected before any event is processed)
    // =========================================================================
    #[error("Invalid jet radius: {0} (must be finite and > 0)")]
    InvalidRadius(f64),

    #[error("Invalid ghost area: {0} (must be finite and > 0)")]
    InvalidGhostArea(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // =========================================================================
    // === Usage Errors (JetCollection attribute bookkeeping)
    // =========================================================================
    #[error("Attribute '{name}' has length {actual}, but the collection holds {expected} jets")]
    AttributeLengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Attribute '{0}' is already attached to this collection")]
    DuplicateAttribute(String),

    #[error("Attribute '{0}' is not attached to this collection")]
    UnknownAttribute(String),

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the Arrow library while building export batches.
    #[error("Arrow operation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// An error from the Serde JSON library, typically while parsing a configuration.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// An error from the underlying I/O subsystem (e.g. opening a log file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HiJetError {
    /// True for errors that must abort a run before per-event processing.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            HiJetError::InvalidRadius(_)
                | HiJetError::InvalidGhostArea(_)
                | HiJetError::InvalidConfig(_)
                | HiJetError::SerdeJson(_)
        )
    }
}
