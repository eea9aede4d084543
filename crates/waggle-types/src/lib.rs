//! Shared type definitions for the Waggle pet social simulation.
//!
//! This crate is the single source of truth for all types used across the
//! Waggle workspace. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for the dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Enumeration types (tone, actions, notifications, buzz)
//! - [`structs`] -- Core entity structs (agents, profiles, posts, notifications)

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ActionKind, BuzzTier, FriendshipStatus, NotificationKind, ToneCategory};
pub use ids::{AgentId, CommentId, MediaId, NotificationId, OwnerId, PostId};
pub use structs::{
    ActionCounts, Agent, Comment, DailyQuota, EXPRESSIVENESS_MAX, MediaRef, Notification,
    NotificationPrefs, Post, Profile, TRAIT_MAX, TraitScores,
};
