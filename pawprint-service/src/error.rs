//! Service error types.

use pawprint_core::PawprintError;
use thiserror::Error;

/// Failures of the policy predictor.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// No trained model is available for the requested version.
    #[error("policy model unavailable: {0}")]
    Unavailable(String),

    /// The model ran but failed.
    #[error("policy inference failed: {0}")]
    Inference(String),
}

/// Errors surfaced by [`crate::PetService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Upstream policy failure. Propagated untouched.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// The policy answered with an action id outside the catalogue, or a
    /// label failed to parse.
    #[error(transparent)]
    Core(#[from] PawprintError),

    /// The request carried a NaN or out-of-range reading.
    #[error(transparent)]
    InvalidSnapshot(PawprintError),

    /// No profile exists for this cat.
    #[error("Cat not found: {0}")]
    CatNotFound(String),

    /// A profile already exists for this cat.
    #[error("Cat already exists: {0}")]
    CatAlreadyExists(String),

    /// Cat ids must be 1 to 100 characters.
    #[error("Invalid cat id: {0:?}")]
    InvalidCatId(String),

    /// Configuration failed to load or validate.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem failure while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;
