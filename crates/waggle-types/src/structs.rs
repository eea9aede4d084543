//! Core entity structs for the Waggle simulation.
//!
//! Covers the agent identity record, the derived behavioral profile, the
//! social action records the scheduler reads and writes, notifications,
//! and the per-round aggregate counts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ActionKind, NotificationKind, ToneCategory};
use crate::ids::{AgentId, CommentId, MediaId, NotificationId, OwnerId, PostId};

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// Identity record of a simulated pet persona.
///
/// Created once at registration and owned by exactly one principal. The
/// free-text `personality_text` is the input to persona derivation; the
/// derived [`Profile`] lives alongside this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Agent {
    /// Unique agent identifier.
    pub id: AgentId,
    /// The owning principal this agent belongs to.
    pub owner_id: OwnerId,
    /// Display name.
    pub name: String,
    /// Species or breed (biases the derived topic set).
    pub species: String,
    /// Birth date, if known.
    pub birth_date: Option<NaiveDate>,
    /// Where the pet came from (shelter, breeder, street, ...).
    pub origin: String,
    /// Current home location, free text.
    pub location: String,
    /// Free-form personality description supplied by the owner.
    pub personality_text: String,
    /// When the agent was registered.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Maximum value for each behavioral trait score.
pub const TRAIT_MAX: u8 = 10;

/// Maximum expressiveness level.
pub const EXPRESSIVENESS_MAX: u8 = 5;

/// The three bounded behavioral trait scores (0 to [`TRAIT_MAX`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TraitScores {
    /// Desire for interaction; drives posting and liking volume.
    pub sociability: u8,
    /// Novelty seeking; drives commenting and topic learning.
    pub curiosity: u8,
    /// Placidity; high values soften tone and suppress commenting.
    pub calmness: u8,
}

impl TraitScores {
    /// Build trait scores, clamping each component to the declared bound.
    pub fn clamped(sociability: u8, curiosity: u8, calmness: u8) -> Self {
        Self {
            sociability: sociability.min(TRAIT_MAX),
            curiosity: curiosity.min(TRAIT_MAX),
            calmness: calmness.min(TRAIT_MAX),
        }
    }
}

/// Per-day target counts for each action type.
///
/// Targets are derived from trait scores at persona derivation time. The
/// scheduler never exceeds a target within a local calendar day (and acts
/// below it when the agent appears distressed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DailyQuota {
    /// Target number of new posts per day.
    pub posts: u32,
    /// Target number of likes per day.
    pub likes: u32,
    /// Target number of comments per day.
    pub comments: u32,
    /// Target number of reposts per day.
    pub reposts: u32,
}

impl DailyQuota {
    /// The target count for a specific action kind.
    pub const fn target_for(&self, kind: ActionKind) -> u32 {
        match kind {
            ActionKind::Post => self.posts,
            ActionKind::Like => self.likes,
            ActionKind::Comment => self.comments,
            ActionKind::Repost => self.reposts,
        }
    }

    /// Reduce every target by `penalty`, flooring at zero.
    ///
    /// Applied when the agent's recent diary context contains distress
    /// keywords: agents in apparent distress act less.
    pub const fn penalized(&self, penalty: u32) -> Self {
        Self {
            posts: self.posts.saturating_sub(penalty),
            likes: self.likes.saturating_sub(penalty),
            comments: self.comments.saturating_sub(penalty),
            reposts: self.reposts.saturating_sub(penalty),
        }
    }
}

/// The derived behavioral profile governing an agent's activity.
///
/// Produced deterministically from the agent's identity fields and
/// personality text; re-derivation with identical inputs yields an
/// identical profile. List sub-fields are first-class typed structures
/// here and JSON-encoded only at the persistence boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Profile {
    /// The agent this profile belongs to.
    pub agent_id: AgentId,
    /// Voice category for synthesized text.
    pub tone: ToneCategory,
    /// Emotional intensity of synthesized text (1 to [`EXPRESSIVENESS_MAX`]).
    pub expressiveness: u8,
    /// Bounded behavioral trait scores.
    pub traits: TraitScores,
    /// Short generated biography shown on the agent's page.
    pub biography: String,
    /// Topics the agent likes to talk about.
    pub topics: Vec<String>,
    /// Topics the agent avoids.
    pub dislikes: Vec<String>,
    /// Signature phrases woven into synthesized text.
    pub catchphrases: Vec<String>,
    /// Long-term learned vocabulary, oldest first, bounded in length.
    pub learned_topics: Vec<String>,
    /// Per-day action targets.
    pub quota: DailyQuota,
}

// ---------------------------------------------------------------------------
// Action records
// ---------------------------------------------------------------------------

/// A post authored by an agent, with denormalized engagement counts.
///
/// The engagement counts reflect the state at snapshot-load time; within a
/// round they are treated as immutable inputs for scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Post {
    /// Unique post identifier.
    pub id: PostId,
    /// Authoring agent.
    pub agent_id: AgentId,
    /// Owner of the authoring agent (used for affiliation checks).
    pub author_owner_id: OwnerId,
    /// Post body text.
    pub body: String,
    /// Optional attached media reference.
    pub media_ref: Option<MediaId>,
    /// Number of likes at snapshot time.
    pub like_count: u32,
    /// Number of comments at snapshot time.
    pub comment_count: u32,
    /// Number of reposts at snapshot time.
    pub repost_count: u32,
    /// When the post was created.
    pub created_at: DateTime<Utc>,
}

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Comment {
    /// Unique comment identifier.
    pub id: CommentId,
    /// The post this comment belongs to.
    pub post_id: PostId,
    /// The commenting agent.
    pub agent_id: AgentId,
    /// Comment body text.
    pub body: String,
    /// When the comment was created.
    pub created_at: DateTime<Utc>,
}

/// A previously uploaded media reference an agent can attach to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MediaRef {
    /// Unique media identifier.
    pub id: MediaId,
    /// The agent the media belongs to.
    pub agent_id: AgentId,
    /// Storage URL or path (opaque to the scheduler).
    pub url: String,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// A notification addressed to an owning principal.
///
/// Append-only except for `read_at`, which is set once when the owner (or
/// the reply-threading pass, acting for the owner) consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Notification {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// The owner this notification is addressed to.
    pub owner_id: OwnerId,
    /// What happened.
    pub kind: NotificationKind,
    /// The post involved, if any.
    pub post_id: Option<PostId>,
    /// The agent whose action triggered this, if any.
    pub actor_agent_id: Option<AgentId>,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// When the owner read it, if they have.
    pub read_at: Option<DateTime<Utc>>,
}

/// Per-owner opt-in configuration for notification kinds.
///
/// The scheduler always writes notifications; suppression happens purely
/// on the read side using these flags. Buzz tiers share one flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NotificationPrefs {
    /// Show like notifications.
    pub likes: bool,
    /// Show comment notifications.
    pub comments: bool,
    /// Show follow notifications.
    pub follows: bool,
    /// Show repost notifications.
    pub reposts: bool,
    /// Show buzz tier notifications.
    pub buzz: bool,
}

impl NotificationPrefs {
    /// Whether this configuration allows showing `kind`.
    pub const fn allows(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::Like => self.likes,
            NotificationKind::Comment => self.comments,
            NotificationKind::Follow => self.follows,
            NotificationKind::Repost => self.reposts,
            NotificationKind::BuzzSmall | NotificationKind::BuzzMid | NotificationKind::BuzzMax => {
                self.buzz
            }
        }
    }
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            likes: true,
            comments: true,
            follows: true,
            reposts: true,
            buzz: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Round counts
// ---------------------------------------------------------------------------

/// Aggregate action counts produced by one scheduling round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActionCounts {
    /// New posts created.
    pub posts: u32,
    /// New likes created.
    pub likes: u32,
    /// New comments created (including threaded replies).
    pub comments: u32,
    /// New reposts created.
    pub reposts: u32,
}

impl ActionCounts {
    /// Add another set of counts into this one, saturating.
    pub const fn absorb(&mut self, other: Self) {
        self.posts = self.posts.saturating_add(other.posts);
        self.likes = self.likes.saturating_add(other.likes);
        self.comments = self.comments.saturating_add(other.comments);
        self.reposts = self.reposts.saturating_add(other.reposts);
    }

    /// Total number of actions across all kinds.
    pub const fn total(&self) -> u32 {
        self.posts
            .saturating_add(self.likes)
            .saturating_add(self.comments)
            .saturating_add(self.reposts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_scores_clamp_to_bound() {
        let t = TraitScores::clamped(12, 5, 11);
        assert_eq!(t.sociability, TRAIT_MAX);
        assert_eq!(t.curiosity, 5);
        assert_eq!(t.calmness, TRAIT_MAX);
    }

    #[test]
    fn quota_penalty_floors_at_zero() {
        let q = DailyQuota {
            posts: 1,
            likes: 10,
            comments: 3,
            reposts: 0,
        };
        let p = q.penalized(2);
        assert_eq!(p.posts, 0);
        assert_eq!(p.likes, 8);
        assert_eq!(p.comments, 1);
        assert_eq!(p.reposts, 0);
    }

    #[test]
    fn quota_target_lookup() {
        let q = DailyQuota {
            posts: 5,
            likes: 40,
            comments: 10,
            reposts: 3,
        };
        assert_eq!(q.target_for(ActionKind::Post), 5);
        assert_eq!(q.target_for(ActionKind::Like), 40);
        assert_eq!(q.target_for(ActionKind::Comment), 10);
        assert_eq!(q.target_for(ActionKind::Repost), 3);
    }

    #[test]
    fn prefs_default_allows_everything() {
        let prefs = NotificationPrefs::default();
        assert!(prefs.allows(NotificationKind::Like));
        assert!(prefs.allows(NotificationKind::BuzzMax));
    }

    #[test]
    fn prefs_buzz_flag_covers_all_tiers() {
        let prefs = NotificationPrefs {
            buzz: false,
            ..NotificationPrefs::default()
        };
        assert!(!prefs.allows(NotificationKind::BuzzSmall));
        assert!(!prefs.allows(NotificationKind::BuzzMid));
        assert!(!prefs.allows(NotificationKind::BuzzMax));
        assert!(prefs.allows(NotificationKind::Comment));
    }

    #[test]
    fn counts_absorb_and_total() {
        let mut a = ActionCounts {
            posts: 1,
            likes: 2,
            comments: 3,
            reposts: 4,
        };
        a.absorb(ActionCounts {
            posts: 1,
            likes: 1,
            comments: 1,
            reposts: 1,
        });
        assert_eq!(a.total(), 14);
    }
}
