//! Persona derivation and topic learning for Waggle agents.
//!
//! Pure, I/O-free logic: given the identity fields and free-text
//! personality of a pet, produce a deterministic behavioral [`Profile`];
//! given text an agent produced or consumed, update its bounded learned
//! vocabulary.
//!
//! # Modules
//!
//! - [`derive`] -- deterministic input -> profile derivation
//! - [`learner`] -- probabilistic bounded topic memory
//! - [`keywords`] -- declarative keyword families and trigger tables
//! - [`topics`] -- fixed topic/dislike/catchphrase candidate pools
//!
//! [`Profile`]: waggle_types::Profile

pub mod derive;
pub mod keywords;
pub mod learner;
pub mod topics;

pub use derive::{PersonaInput, derive};
pub use keywords::{GENERIC_REPLIES, Trigger, contains_distress, find_trigger};
pub use learner::{learn_from_text, tokenize};
