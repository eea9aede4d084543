//! Enumeration types for the Waggle simulation.
//!
//! Tone categories, action kinds, notification kinds, buzz tiers, and the
//! friendship edge status.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Tone
// ---------------------------------------------------------------------------

/// The voice an agent writes in, chosen once at persona derivation.
///
/// Tone is decided by a fixed priority order: explicit keyword overrides in
/// the personality text, then diagnostic-driven overrides, then trait
/// thresholds, then a seeded random fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum ToneCategory {
    /// Upbeat and enthusiastic; the high-sociability default.
    Cheerful,
    /// Soft and soothing; the high-calmness default.
    Gentle,
    /// Detached and brief.
    Cool,
    /// Clingy, playful, attention-seeking.
    Childlike,
    /// Polite and well-mannered.
    Formal,
}

impl ToneCategory {
    /// All tone categories, in fallback-draw order.
    pub const ALL: [Self; 5] = [
        Self::Cheerful,
        Self::Gentle,
        Self::Cool,
        Self::Childlike,
        Self::Formal,
    ];

    /// Stable lowercase name used at the persistence boundary.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cheerful => "cheerful",
            Self::Gentle => "gentle",
            Self::Cool => "cool",
            Self::Childlike => "childlike",
            Self::Formal => "formal",
        }
    }

    /// Parse the stable lowercase name back into a tone.
    ///
    /// Unknown names fall back to [`ToneCategory::Cheerful`] rather than
    /// failing; a row written by a newer build must never wedge the round.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "gentle" => Self::Gentle,
            "cool" => Self::Cool,
            "childlike" => Self::Childlike,
            "formal" => Self::Formal,
            _ => Self::Cheerful,
        }
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// The four quota-governed action types an agent can take in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Author a new post.
    Post,
    /// Like another agent's post (at most one per agent per post).
    Like,
    /// Comment on another agent's post.
    Comment,
    /// Repost another agent's post (at most one per agent per post).
    Repost,
}

impl ActionKind {
    /// Stable lowercase name used at the persistence boundary.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Repost => "repost",
        }
    }
}

// ---------------------------------------------------------------------------
// Buzz
// ---------------------------------------------------------------------------

/// Popularity tier a post can reach based on its like count.
///
/// Tiers are monotonic: a post only ever moves upward, and each tier emits
/// exactly one notification. Reaching a higher tier suppresses any lower
/// tier that was never notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum BuzzTier {
    /// First threshold crossed; no synthetic amplification.
    Small,
    /// Mid threshold; a small batch of synthetic engagement.
    Mid,
    /// Top threshold; a large batch of synthetic engagement.
    Max,
}

impl BuzzTier {
    /// Numeric rank used for monotonicity comparisons (higher = bigger).
    pub const fn rank(self) -> u8 {
        match self {
            Self::Small => 1,
            Self::Mid => 2,
            Self::Max => 3,
        }
    }

    /// The notification kind that announces this tier.
    pub const fn notification_kind(self) -> NotificationKind {
        match self {
            Self::Small => NotificationKind::BuzzSmall,
            Self::Mid => NotificationKind::BuzzMid,
            Self::Max => NotificationKind::BuzzMax,
        }
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Type tag carried by a [`Notification`](crate::structs::Notification).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone liked one of your agent's posts.
    Like,
    /// Someone commented on one of your agent's posts.
    Comment,
    /// Someone's agent now follows your agent.
    Follow,
    /// Someone reposted one of your agent's posts.
    Repost,
    /// A post reached the small buzz tier.
    BuzzSmall,
    /// A post reached the mid buzz tier.
    BuzzMid,
    /// A post reached the max buzz tier.
    BuzzMax,
}

impl NotificationKind {
    /// Stable lowercase name used at the persistence boundary.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Follow => "follow",
            Self::Repost => "repost",
            Self::BuzzSmall => "buzz_small",
            Self::BuzzMid => "buzz_mid",
            Self::BuzzMax => "buzz_max",
        }
    }

    /// Parse the stable lowercase name back into a kind.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "like" => Some(Self::Like),
            "comment" => Some(Self::Comment),
            "follow" => Some(Self::Follow),
            "repost" => Some(Self::Repost),
            "buzz_small" => Some(Self::BuzzSmall),
            "buzz_mid" => Some(Self::BuzzMid),
            "buzz_max" => Some(Self::BuzzMax),
            _ => None,
        }
    }

    /// The buzz tier this kind announces, if it is a buzz notification.
    pub const fn buzz_tier(self) -> Option<BuzzTier> {
        match self {
            Self::BuzzSmall => Some(BuzzTier::Small),
            Self::BuzzMid => Some(BuzzTier::Mid),
            Self::BuzzMax => Some(BuzzTier::Max),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Friendships
// ---------------------------------------------------------------------------

/// Status of a friendship edge between two owning principals.
///
/// The edge is undirected by convention: rows are stored with the two
/// owner IDs in canonical (sorted) order so at most one row exists per
/// unordered pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum FriendshipStatus {
    /// Requested, not yet confirmed. Carries no affinity bonus.
    Pending,
    /// Confirmed. Agents of accepted friends are "affiliated."
    Accepted,
}
