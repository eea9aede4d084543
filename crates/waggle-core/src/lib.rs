//! Scheduling core of the Waggle social simulation.
//!
//! This crate owns everything between the persistence boundary and the
//! outer surfaces: the per-round [`ActionScheduler`], affinity scoring,
//! buzz detection, the [`TickDriver`] overlap guard, the
//! [`SocialStore`] and [`ContentSynthesizer`] traits, and typed
//! configuration.
//!
//! # Architecture
//!
//! ```text
//! timer / trigger API
//!         |
//!     TickDriver            (one round at a time)
//!         |
//!   ActionScheduler         (agent walk + buzz pass)
//!      /        \
//! SocialStore  ContentSynthesizer
//! (waggle-db)  (templates or a model)
//! ```
//!
//! [`ActionScheduler`]: scheduler::ActionScheduler
//! [`TickDriver`]: driver::TickDriver
//! [`SocialStore`]: store::SocialStore
//! [`ContentSynthesizer`]: synth::ContentSynthesizer

pub mod affinity;
pub mod buzz;
pub mod config;
pub mod driver;
pub mod error;
pub mod memory;
pub mod scheduler;
pub mod store;
pub mod synth;

pub use config::{AffinityWeights, BuzzConfig, ConfigError, SchedulerConfig, WaggleConfig};
pub use driver::{RoundOutcome, TickDriver};
pub use error::SchedulerError;
pub use memory::MemoryStore;
pub use scheduler::{ActionScheduler, RoundSummary};
pub use store::{AgentRecord, NewComment, NewNotification, NewPost, SocialStore, StoreError};
pub use synth::{ContentSynthesizer, SynthError, TemplateSynthesizer};
