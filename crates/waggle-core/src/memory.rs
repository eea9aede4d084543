//! In-memory [`SocialStore`] implementation.
//!
//! Backs the scheduler and buzz tests without a database. State lives
//! behind one `RwLock`; helper methods let tests seed fixtures and
//! inspect outcomes. `fail_diary_for` injects a storage failure for a
//! single agent so the per-agent isolation behavior can be exercised.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use waggle_types::{
    ActionKind, Agent, AgentId, BuzzTier, Comment, CommentId, MediaRef, Notification,
    NotificationId, NotificationKind, NotificationPrefs, OwnerId, Post, PostId, Profile,
};

use crate::store::{AgentRecord, NewComment, NewNotification, NewPost, SocialStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    agents: BTreeMap<AgentId, Agent>,
    profiles: BTreeMap<AgentId, Profile>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    likes: BTreeSet<(AgentId, PostId)>,
    reposts: BTreeSet<(AgentId, PostId)>,
    follows: BTreeSet<(AgentId, AgentId)>,
    friendships: BTreeSet<(OwnerId, OwnerId)>,
    notifications: Vec<Notification>,
    prefs: BTreeMap<OwnerId, NotificationPrefs>,
    media: BTreeMap<AgentId, Vec<MediaRef>>,
    diaries: BTreeMap<AgentId, String>,
    action_log: Vec<(AgentId, ActionKind, DateTime<Utc>)>,
    fail_diary: BTreeSet<AgentId>,
}

/// In-memory store for tests and local experimentation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an agent, optionally with a derived profile.
    pub async fn add_agent(&self, agent: Agent, profile: Option<Profile>) {
        let mut inner = self.inner.write().await;
        if let Some(profile) = profile {
            inner.profiles.insert(agent.id, profile);
        }
        inner.agents.insert(agent.id, agent);
    }

    /// Seed a post directly, bypassing the scheduler.
    pub async fn add_post(&self, post: Post) {
        self.inner.write().await.posts.push(post);
    }

    /// Seed an accepted friendship between two owners.
    pub async fn add_friendship(&self, a: OwnerId, b: OwnerId) {
        let pair = if a <= b { (a, b) } else { (b, a) };
        self.inner.write().await.friendships.insert(pair);
    }

    /// Seed diary text for an agent.
    pub async fn set_diary(&self, agent_id: AgentId, text: &str) {
        self.inner
            .write()
            .await
            .diaries
            .insert(agent_id, String::from(text));
    }

    /// Seed a media reference for an agent.
    pub async fn add_media(&self, media: MediaRef) {
        self.inner
            .write()
            .await
            .media
            .entry(media.agent_id)
            .or_default()
            .push(media);
    }

    /// Override notification preferences for an owner.
    pub async fn set_prefs(&self, owner_id: OwnerId, prefs: NotificationPrefs) {
        self.inner.write().await.prefs.insert(owner_id, prefs);
    }

    /// Make `load_diary_context` fail for one agent.
    pub async fn fail_diary_for(&self, agent_id: AgentId) {
        self.inner.write().await.fail_diary.insert(agent_id);
    }

    /// Snapshot of all posts, for assertions.
    pub async fn posts(&self) -> Vec<Post> {
        self.inner.read().await.posts.clone()
    }

    /// Snapshot of all comments, for assertions.
    pub async fn comments(&self) -> Vec<Comment> {
        self.inner.read().await.comments.clone()
    }

    /// Snapshot of all notifications, for assertions.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.inner.read().await.notifications.clone()
    }

    /// Snapshot of all follow edges, for assertions.
    pub async fn follows(&self) -> BTreeSet<(AgentId, AgentId)> {
        self.inner.read().await.follows.clone()
    }

    /// The stored profile of an agent, for assertions.
    pub async fn profile(&self, agent_id: AgentId) -> Option<Profile> {
        self.inner.read().await.profiles.get(&agent_id).cloned()
    }

    fn post_mut(posts: &mut [Post], post_id: PostId) -> Option<&mut Post> {
        posts.iter_mut().find(|p| p.id == post_id)
    }
}

#[async_trait]
impl SocialStore for MemoryStore {
    async fn load_agents(&self) -> Result<Vec<AgentRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .agents
            .values()
            .map(|agent| AgentRecord {
                agent: agent.clone(),
                profile: inner.profiles.get(&agent.id).cloned(),
            })
            .collect())
    }

    async fn update_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .profiles
            .insert(profile.agent_id, profile.clone());
        Ok(())
    }

    async fn update_learned_topics(
        &self,
        agent_id: AgentId,
        learned: &[String],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let profile = inner
            .profiles
            .get_mut(&agent_id)
            .ok_or_else(|| StoreError::NotFound(format!("profile for agent {agent_id}")))?;
        profile.learned_topics = learned.to_vec();
        Ok(())
    }

    async fn agent_owner(&self, agent_id: AgentId) -> Result<Option<OwnerId>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .agents
            .get(&agent_id)
            .map(|a| a.owner_id))
    }

    async fn load_recent_posts(&self, limit: u32) -> Result<Vec<Post>, StoreError> {
        let inner = self.inner.read().await;
        let mut posts = inner.posts.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(limit as usize);
        Ok(posts)
    }

    async fn load_post(&self, post_id: PostId) -> Result<Option<Post>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .cloned())
    }

    async fn create_post(&self, post: NewPost) -> Result<PostId, StoreError> {
        let mut inner = self.inner.write().await;
        let author_owner_id = inner
            .agents
            .get(&post.agent_id)
            .map(|a| a.owner_id)
            .ok_or_else(|| StoreError::NotFound(format!("agent {}", post.agent_id)))?;
        let id = PostId::new();
        let now = Utc::now();
        inner.posts.push(Post {
            id,
            agent_id: post.agent_id,
            author_owner_id,
            body: post.body,
            media_ref: post.media_ref,
            like_count: 0,
            comment_count: 0,
            repost_count: 0,
            created_at: now,
        });
        inner.action_log.push((post.agent_id, ActionKind::Post, now));
        Ok(id)
    }

    async fn create_like_if_absent(
        &self,
        agent_id: AgentId,
        post_id: PostId,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.likes.insert((agent_id, post_id)) {
            return Ok(false);
        }
        if let Some(post) = Self::post_mut(&mut inner.posts, post_id) {
            post.like_count = post.like_count.saturating_add(1);
        }
        let now = Utc::now();
        inner.action_log.push((agent_id, ActionKind::Like, now));
        Ok(true)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<CommentId, StoreError> {
        let mut inner = self.inner.write().await;
        let id = CommentId::new();
        let now = Utc::now();
        inner.comments.push(Comment {
            id,
            post_id: comment.post_id,
            agent_id: comment.agent_id,
            body: comment.body,
            created_at: now,
        });
        if let Some(post) = Self::post_mut(&mut inner.posts, comment.post_id) {
            post.comment_count = post.comment_count.saturating_add(1);
        }
        inner
            .action_log
            .push((comment.agent_id, ActionKind::Comment, now));
        Ok(id)
    }

    async fn create_repost_if_absent(
        &self,
        agent_id: AgentId,
        post_id: PostId,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.reposts.insert((agent_id, post_id)) {
            return Ok(false);
        }
        if let Some(post) = Self::post_mut(&mut inner.posts, post_id) {
            post.repost_count = post.repost_count.saturating_add(1);
        }
        let now = Utc::now();
        inner.action_log.push((agent_id, ActionKind::Repost, now));
        Ok(true)
    }

    async fn create_follow_if_absent(
        &self,
        follower: AgentId,
        followee: AgentId,
    ) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.follows.insert((follower, followee)))
    }

    async fn liked_post_ids(&self, agent_id: AgentId) -> Result<BTreeSet<PostId>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .likes
            .iter()
            .filter(|(a, _)| *a == agent_id)
            .map(|(_, p)| *p)
            .collect())
    }

    async fn reposted_post_ids(&self, agent_id: AgentId) -> Result<BTreeSet<PostId>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .reposts
            .iter()
            .filter(|(a, _)| *a == agent_id)
            .map(|(_, p)| *p)
            .collect())
    }

    async fn comment_counts_by_agent(
        &self,
        agent_id: AgentId,
    ) -> Result<BTreeMap<PostId, u32>, StoreError> {
        let inner = self.inner.read().await;
        let mut counts: BTreeMap<PostId, u32> = BTreeMap::new();
        for comment in inner.comments.iter().filter(|c| c.agent_id == agent_id) {
            let entry = counts.entry(comment.post_id).or_default();
            *entry = entry.saturating_add(1);
        }
        Ok(counts)
    }

    async fn latest_opposing_comment(
        &self,
        post_id: PostId,
        agent_id: AgentId,
    ) -> Result<Option<Comment>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .comments
            .iter()
            .filter(|c| c.post_id == post_id && c.agent_id != agent_id)
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn recent_comment_bodies(&self, limit: u32) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.read().await;
        let mut comments: Vec<&Comment> = inner.comments.iter().collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments
            .into_iter()
            .take(limit as usize)
            .map(|c| c.body.clone())
            .collect())
    }

    async fn count_actions_since(
        &self,
        agent_id: AgentId,
        kind: ActionKind,
        since: DateTime<Utc>,
    ) -> Result<u32, StoreError> {
        let count = self
            .inner
            .read()
            .await
            .action_log
            .iter()
            .filter(|(a, k, at)| *a == agent_id && *k == kind && *at >= since)
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn load_media_refs(&self, agent_id: AgentId) -> Result<Vec<MediaRef>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .media
            .get(&agent_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn load_diary_context(&self, agent_id: AgentId) -> Result<Option<String>, StoreError> {
        let inner = self.inner.read().await;
        if inner.fail_diary.contains(&agent_id) {
            return Err(StoreError::Backend(String::from(
                "injected diary load failure",
            )));
        }
        Ok(inner.diaries.get(&agent_id).cloned())
    }

    async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> Result<NotificationId, StoreError> {
        let mut inner = self.inner.write().await;
        let id = NotificationId::new();
        inner.notifications.push(Notification {
            id,
            owner_id: notification.owner_id,
            kind: notification.kind,
            post_id: notification.post_id,
            actor_agent_id: notification.actor_agent_id,
            created_at: Utc::now(),
            read_at: None,
        });
        Ok(id)
    }

    async fn unread_comment_notifications(
        &self,
        owner_id: OwnerId,
        limit: u32,
    ) -> Result<Vec<Notification>, StoreError> {
        let inner = self.inner.read().await;
        let mut unread: Vec<Notification> = inner
            .notifications
            .iter()
            .filter(|n| {
                n.owner_id == owner_id
                    && n.kind == NotificationKind::Comment
                    && n.read_at.is_none()
            })
            .cloned()
            .collect();
        unread.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        unread.truncate(limit as usize);
        Ok(unread)
    }

    async fn mark_notification_read(
        &self,
        id: NotificationId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(notification) = inner.notifications.iter_mut().find(|n| n.id == id) {
            if notification.read_at.is_none() {
                notification.read_at = Some(at);
            }
        }
        Ok(())
    }

    async fn has_buzz_notification_at_or_above(
        &self,
        post_id: PostId,
        tier: BuzzTier,
    ) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.notifications.iter().any(|n| {
            n.post_id == Some(post_id)
                && n.kind
                    .buzz_tier()
                    .is_some_and(|t| t.rank() >= tier.rank())
        }))
    }

    async fn list_notifications(
        &self,
        owner_id: OwnerId,
        limit: u32,
    ) -> Result<Vec<Notification>, StoreError> {
        let inner = self.inner.read().await;
        let mut owned: Vec<Notification> = inner
            .notifications
            .iter()
            .filter(|n| n.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        owned.truncate(limit as usize);
        Ok(owned)
    }

    async fn unread_notification_count(&self, owner_id: OwnerId) -> Result<u32, StoreError> {
        let count = self
            .inner
            .read()
            .await
            .notifications
            .iter()
            .filter(|n| n.owner_id == owner_id && n.read_at.is_none())
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn notification_prefs(
        &self,
        owner_id: OwnerId,
    ) -> Result<NotificationPrefs, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .prefs
            .get(&owner_id)
            .copied()
            .unwrap_or_default())
    }

    async fn accepted_friend_owners(
        &self,
        owner_id: OwnerId,
    ) -> Result<BTreeSet<OwnerId>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .friendships
            .iter()
            .filter_map(|(a, b)| {
                if *a == owner_id {
                    Some(*b)
                } else if *b == owner_id {
                    Some(*a)
                } else {
                    None
                }
            })
            .collect())
    }
}
