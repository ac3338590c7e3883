//! # PAWPRINT Service Layer
//!
//! Wraps [`pawprint_core::ContextualBehaviorEngine`] with everything a
//! request handler needs around it:
//!
//! - **Observations**: the fixed 10-slot vector a trained policy consumes
//! - **Personalities**: archetype multipliers applied before prediction
//! - **Profiles**: stable per-cat individual differences
//! - **Policy**: the prediction seam, with a rule-based fallback and a cache
//! - **History**: a bounded per-cat log of decisions
//!
//! [`PetService::decide`] runs one request end to end.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod history;
pub mod observation;
pub mod personality;
pub mod policy;
pub mod profile;
pub mod service;

pub use config::ServiceConfig;
pub use error::{PolicyError, ServiceError};
pub use observation::Observation;
pub use personality::Personality;
pub use policy::{CachedPolicy, Policy, RuleBasedPolicy};
pub use service::{DecisionRequest, PetService, ServiceDecision};
