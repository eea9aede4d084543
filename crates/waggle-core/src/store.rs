//! The persistence boundary of the scheduling core.
//!
//! [`SocialStore`] is the single trait through which the scheduler, buzz
//! detector, and API read and write social state. The production
//! implementation lives in `waggle-db`; tests use the in-memory
//! implementation in [`crate::memory`].
//!
//! Contract notes that every implementation must honor:
//!
//! - `create_like_if_absent` / `create_repost_if_absent` /
//!   `create_follow_if_absent` absorb uniqueness conflicts and report
//!   them as `Ok(false)`. A duplicate attempt is a benign no-op, never an
//!   error, and must not create a notification on the caller's side.
//! - Denormalized post counts (`like_count` etc.) are maintained by the
//!   store when the corresponding record is actually created.
//! - Reads used for round snapshots are point-in-time; the scheduler
//!   tolerates staleness within a round.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use waggle_types::{
    ActionKind, Agent, AgentId, BuzzTier, Comment, MediaRef, NotificationId, NotificationKind,
    NotificationPrefs, OwnerId, PostId, Profile,
};

/// Errors surfaced by a [`SocialStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The storage backend failed (connection, query, constraint other
    /// than the absorbed uniqueness conflicts).
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A JSON-encoded column could not be decoded.
    #[error("stored value could not be decoded: {source}")]
    Serialization {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// A referenced record does not exist.
    #[error("record not found: {0}")]
    NotFound(String),
}

/// An agent together with its derived profile, as loaded for a round.
///
/// A missing profile means derivation has not run for this agent yet;
/// the scheduler skips such agents.
#[derive(Debug, Clone)]
pub struct AgentRecord {
    /// The identity record.
    pub agent: Agent,
    /// The derived behavioral profile, if one exists.
    pub profile: Option<Profile>,
}

/// Fields of a new post.
#[derive(Debug, Clone)]
pub struct NewPost {
    /// Authoring agent.
    pub agent_id: AgentId,
    /// Post body text.
    pub body: String,
    /// Optional attached media reference.
    pub media_ref: Option<waggle_types::MediaId>,
}

/// Fields of a new comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    /// The post being commented on.
    pub post_id: PostId,
    /// The commenting agent.
    pub agent_id: AgentId,
    /// Comment body text.
    pub body: String,
}

/// Fields of a new notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    /// The owner the notification is addressed to.
    pub owner_id: OwnerId,
    /// What happened.
    pub kind: NotificationKind,
    /// The post involved, if any.
    pub post_id: Option<PostId>,
    /// The agent whose action triggered it, if any.
    pub actor_agent_id: Option<AgentId>,
}

/// Async persistence boundary for all social state.
///
/// Held as `Arc<dyn SocialStore>` by the scheduler and the API.
#[async_trait]
pub trait SocialStore: Send + Sync {
    // -- agents and profiles ------------------------------------------------

    /// Load every agent with its profile (if derived).
    async fn load_agents(&self) -> Result<Vec<AgentRecord>, StoreError>;

    /// Persist a freshly derived or re-derived profile.
    async fn update_profile(&self, profile: &Profile) -> Result<(), StoreError>;

    /// Persist only the learned-topic list of an agent's profile.
    async fn update_learned_topics(
        &self,
        agent_id: AgentId,
        learned: &[String],
    ) -> Result<(), StoreError>;

    /// Resolve the owning principal of an agent.
    async fn agent_owner(&self, agent_id: AgentId) -> Result<Option<OwnerId>, StoreError>;

    // -- posts and engagement ----------------------------------------------

    /// The `limit` most recent posts, newest first.
    async fn load_recent_posts(
        &self,
        limit: u32,
    ) -> Result<Vec<waggle_types::Post>, StoreError>;

    /// Load one post by ID.
    async fn load_post(&self, post_id: PostId) -> Result<Option<waggle_types::Post>, StoreError>;

    /// Create a post and return its ID.
    async fn create_post(&self, post: NewPost) -> Result<PostId, StoreError>;

    /// Create a like unless this agent already liked this post.
    ///
    /// Returns `true` if the like was created, `false` on the benign
    /// duplicate no-op.
    async fn create_like_if_absent(
        &self,
        agent_id: AgentId,
        post_id: PostId,
    ) -> Result<bool, StoreError>;

    /// Create a comment and return its ID.
    async fn create_comment(&self, comment: NewComment)
    -> Result<waggle_types::CommentId, StoreError>;

    /// Create a repost unless this agent already reposted this post.
    async fn create_repost_if_absent(
        &self,
        agent_id: AgentId,
        post_id: PostId,
    ) -> Result<bool, StoreError>;

    /// Create a follow edge unless it already exists.
    async fn create_follow_if_absent(
        &self,
        follower: AgentId,
        followee: AgentId,
    ) -> Result<bool, StoreError>;

    /// IDs of posts this agent has already liked.
    async fn liked_post_ids(&self, agent_id: AgentId) -> Result<BTreeSet<PostId>, StoreError>;

    /// IDs of posts this agent has already reposted.
    async fn reposted_post_ids(&self, agent_id: AgentId) -> Result<BTreeSet<PostId>, StoreError>;

    /// Per-post count of this agent's own comments (thread depth input).
    async fn comment_counts_by_agent(
        &self,
        agent_id: AgentId,
    ) -> Result<BTreeMap<PostId, u32>, StoreError>;

    /// The most recent comment on `post_id` by any agent other than
    /// `agent_id`, if one exists.
    async fn latest_opposing_comment(
        &self,
        post_id: PostId,
        agent_id: AgentId,
    ) -> Result<Option<Comment>, StoreError>;

    /// Bodies of the `limit` most recent comments by any agent, newest
    /// first. Input to the novelty constraint.
    async fn recent_comment_bodies(&self, limit: u32) -> Result<Vec<String>, StoreError>;

    /// How many actions of `kind` this agent has taken since `since`.
    async fn count_actions_since(
        &self,
        agent_id: AgentId,
        kind: ActionKind,
        since: DateTime<Utc>,
    ) -> Result<u32, StoreError>;

    // -- media and diary ----------------------------------------------------

    /// Media references this agent can attach to a post.
    async fn load_media_refs(&self, agent_id: AgentId) -> Result<Vec<MediaRef>, StoreError>;

    /// The agent's most recent diary text, if any. Feeds distress
    /// detection and post synthesis context.
    async fn load_diary_context(&self, agent_id: AgentId) -> Result<Option<String>, StoreError>;

    // -- notifications ------------------------------------------------------

    /// Append a notification.
    async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> Result<NotificationId, StoreError>;

    /// Unread comment notifications addressed to `owner_id`, oldest
    /// first, at most `limit`. Input to reply threading.
    async fn unread_comment_notifications(
        &self,
        owner_id: OwnerId,
        limit: u32,
    ) -> Result<Vec<waggle_types::Notification>, StoreError>;

    /// Set `read_at` on a notification if not already set.
    async fn mark_notification_read(
        &self,
        id: NotificationId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Whether a buzz notification at `tier` or above already exists for
    /// this post. Enforces tier monotonicity across rounds.
    async fn has_buzz_notification_at_or_above(
        &self,
        post_id: PostId,
        tier: BuzzTier,
    ) -> Result<bool, StoreError>;

    /// The `limit` most recent notifications for an owner, newest first.
    async fn list_notifications(
        &self,
        owner_id: OwnerId,
        limit: u32,
    ) -> Result<Vec<waggle_types::Notification>, StoreError>;

    /// Number of unread notifications for an owner.
    async fn unread_notification_count(&self, owner_id: OwnerId) -> Result<u32, StoreError>;

    /// Notification preferences for an owner (defaults when unset).
    async fn notification_prefs(
        &self,
        owner_id: OwnerId,
    ) -> Result<NotificationPrefs, StoreError>;

    // -- friendships --------------------------------------------------------

    /// Owners with an accepted friendship edge to `owner_id`.
    async fn accepted_friend_owners(
        &self,
        owner_id: OwnerId,
    ) -> Result<BTreeSet<OwnerId>, StoreError>;
}
