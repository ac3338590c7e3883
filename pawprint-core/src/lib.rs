//! # PAWPRINT Core Library
//!
//! Contextual behavior engine for virtual pets.
//!
//! A learned policy picks *what* a cat does; this crate decides *how it
//! feels about it* and whether it does something else instead:
//!
//! - **Emotions**: ordered threshold rules over mood, hunger, energy, arousal
//! - **Reactions**: scripted responses to petting, noise, new toys, …
//! - **Quirks & noise**: bounded randomness over the policy's choice
//! - **Memory**: a short rolling window of what the cat has been doing
//! - **Stabilization**: hold times and voting so the face does not flicker
//! - **Visual layers**: base, mood and reaction axes blended for display
//!
//! The entry point is [`ContextualBehaviorEngine::process_action`].
//!
//! ## Performance Contract
//!
//! A decision is pure in-memory computation with no I/O:
//! - `process_action`: < 50μs
//! - Emotion classification: < 1μs

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod behavior;
pub mod config;
pub mod emotion;
pub mod engine;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod reaction;
pub mod registry;
pub mod rules;
pub mod stabilizer;
pub mod types;
pub mod visual;

pub use config::PawprintConfig;
pub use engine::{BehaviorDecision, ContextualBehaviorEngine, DEFAULT_PET_ID, PetSnapshot};
pub use error::PawprintError;
pub use memory::CatMemory;
pub use registry::{LruPetRegistry, PetStateStore};
pub use types::*;
