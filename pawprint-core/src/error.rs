//! Error types for the PAWPRINT core library.
//!
//! The behavior engine itself never fails: unknown pets get fresh state and
//! every random draw is bounded. Errors only arise at the edges, when raw
//! ids, labels or snapshots are checked and when configuration is loaded.

use thiserror::Error;

/// Top-level error type for all PAWPRINT core operations.
#[derive(Error, Debug)]
pub enum PawprintError {
    /// An action id outside the known action catalogue.
    #[error("Invalid action id: {0} (expected 0..{max})", max = crate::types::PetAction::COUNT)]
    InvalidAction(u8),

    /// A label that names no known emotion, intensity, stimulus or axis.
    #[error("Unknown {kind} label: {label:?}")]
    UnknownLabel {
        /// Which vocabulary was being parsed.
        kind: &'static str,
        /// The offending label.
        label: String,
    },

    /// A snapshot field is NaN, infinite or outside its range.
    #[error("Invalid snapshot: {field} = {value} (expected {expected})")]
    InvalidSnapshot {
        /// Offending field.
        field: &'static str,
        /// Value received.
        value: f64,
        /// Accepted range.
        expected: &'static str,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PawprintError {
    pub(crate) fn unknown_label(kind: &'static str, label: &str) -> Self {
        Self::UnknownLabel {
            kind,
            label: label.to_string(),
        }
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, PawprintError>;
