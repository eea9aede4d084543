//! [`SocialStore`] implementation backed by `PostgreSQL`.
//!
//! All queries are runtime-constructed and parameterized. The duplicate
//! engagement guards (`likes`, `reposts`, `follows`) rely on composite
//! primary keys plus `ON CONFLICT DO NOTHING`: a conflicting insert
//! reports zero affected rows and the operation returns `Ok(false)`
//! without touching the denormalized counters.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use waggle_core::{AgentRecord, NewComment, NewNotification, NewPost, SocialStore, StoreError};
use waggle_types::{
    ActionKind, Agent, AgentId, BuzzTier, Comment, CommentId, DailyQuota, MediaId, MediaRef,
    Notification, NotificationId, NotificationKind, NotificationPrefs, OwnerId, Post, PostId,
    Profile, ToneCategory, TraitScores,
};

use crate::error::pg_err;
use crate::postgres::PostgresPool;

/// `PostgreSQL`-backed social store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connected pool.
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.pool().clone(),
        }
    }

    // -- registration-side writes (used by seeding and tests) --------------

    /// Insert an agent identity record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the insert fails.
    pub async fn insert_agent(&self, agent: &Agent) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO agents
              (id, owner_id, name, species, birth_date, origin, location, personality_text, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(agent.id.into_inner())
        .bind(agent.owner_id.into_inner())
        .bind(&agent.name)
        .bind(&agent.species)
        .bind(agent.birth_date)
        .bind(&agent.origin)
        .bind(&agent.location)
        .bind(&agent.personality_text)
        .bind(agent.created_at)
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(())
    }

    /// Append a diary entry for an agent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the insert fails.
    pub async fn insert_diary_entry(
        &self,
        agent_id: AgentId,
        body: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO diary_entries (id, agent_id, body) VALUES ($1, $2, $3)",
        )
        .bind(Uuid::now_v7())
        .bind(agent_id.into_inner())
        .bind(body)
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(())
    }

    /// Create or accept a friendship between two owners.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the upsert fails.
    pub async fn accept_friendship(&self, a: OwnerId, b: OwnerId) -> Result<(), StoreError> {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        sqlx::query(
            r"INSERT INTO friendships (owner_a, owner_b, status)
              VALUES ($1, $2, 'accepted')
              ON CONFLICT (owner_a, owner_b) DO UPDATE SET status = 'accepted'",
        )
        .bind(low.into_inner())
        .bind(high.into_inner())
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(())
    }

    /// Upsert an agent's media reference.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the insert fails.
    pub async fn insert_media_ref(&self, media: &MediaRef) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO media_refs (id, agent_id, url) VALUES ($1, $2, $3)
              ON CONFLICT (id) DO NOTHING",
        )
        .bind(media.id.into_inner())
        .bind(media.agent_id.into_inner())
        .bind(&media.url)
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(())
    }

    /// Upsert an owner's notification preferences.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the upsert fails.
    pub async fn set_notification_prefs(
        &self,
        owner_id: OwnerId,
        prefs: NotificationPrefs,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO notification_prefs (owner_id, likes, comments, follows, reposts, buzz)
              VALUES ($1, $2, $3, $4, $5, $6)
              ON CONFLICT (owner_id) DO UPDATE SET
                likes = EXCLUDED.likes,
                comments = EXCLUDED.comments,
                follows = EXCLUDED.follows,
                reposts = EXCLUDED.reposts,
                buzz = EXCLUDED.buzz",
        )
        .bind(owner_id.into_inner())
        .bind(prefs.likes)
        .bind(prefs.comments)
        .bind(prefs.follows)
        .bind(prefs.reposts)
        .bind(prefs.buzz)
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, sqlx::FromRow)]
struct AgentRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    species: String,
    birth_date: Option<NaiveDate>,
    origin: String,
    location: String,
    personality_text: String,
    created_at: DateTime<Utc>,
}

impl From<AgentRow> for Agent {
    fn from(row: AgentRow) -> Self {
        Self {
            id: AgentId::from(row.id),
            owner_id: OwnerId::from(row.owner_id),
            name: row.name,
            species: row.species,
            birth_date: row.birth_date,
            origin: row.origin,
            location: row.location,
            personality_text: row.personality_text,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    agent_id: Uuid,
    tone: String,
    expressiveness: i16,
    sociability: i16,
    curiosity: i16,
    calmness: i16,
    biography: String,
    topics: serde_json::Value,
    dislikes: serde_json::Value,
    catchphrases: serde_json::Value,
    learned_topics: serde_json::Value,
    quota_posts: i32,
    quota_likes: i32,
    quota_comments: i32,
    quota_reposts: i32,
}

impl ProfileRow {
    fn into_profile(self) -> Result<Profile, StoreError> {
        Ok(Profile {
            agent_id: AgentId::from(self.agent_id),
            tone: ToneCategory::from_str_lossy(&self.tone),
            expressiveness: clamp_u8(self.expressiveness),
            traits: TraitScores::clamped(
                clamp_u8(self.sociability),
                clamp_u8(self.curiosity),
                clamp_u8(self.calmness),
            ),
            biography: self.biography,
            topics: serde_json::from_value(self.topics)?,
            dislikes: serde_json::from_value(self.dislikes)?,
            catchphrases: serde_json::from_value(self.catchphrases)?,
            learned_topics: serde_json::from_value(self.learned_topics)?,
            quota: DailyQuota {
                posts: clamp_u32(self.quota_posts),
                likes: clamp_u32(self.quota_likes),
                comments: clamp_u32(self.quota_comments),
                reposts: clamp_u32(self.quota_reposts),
            },
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    agent_id: Uuid,
    author_owner_id: Uuid,
    body: String,
    media_ref: Option<Uuid>,
    like_count: i32,
    comment_count: i32,
    repost_count: i32,
    created_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: PostId::from(row.id),
            agent_id: AgentId::from(row.agent_id),
            author_owner_id: OwnerId::from(row.author_owner_id),
            body: row.body,
            media_ref: row.media_ref.map(MediaId::from),
            like_count: clamp_u32(row.like_count),
            comment_count: clamp_u32(row.comment_count),
            repost_count: clamp_u32(row.repost_count),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    agent_id: Uuid,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: CommentId::from(row.id),
            post_id: PostId::from(row.post_id),
            agent_id: AgentId::from(row.agent_id),
            body: row.body,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    owner_id: Uuid,
    kind: String,
    post_id: Option<Uuid>,
    actor_agent_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    read_at: Option<DateTime<Utc>>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: NotificationId::from(row.id),
            owner_id: OwnerId::from(row.owner_id),
            kind: NotificationKind::parse(&row.kind).unwrap_or(NotificationKind::Comment),
            post_id: row.post_id.map(PostId::from),
            actor_agent_id: row.actor_agent_id.map(AgentId::from),
            created_at: row.created_at,
            read_at: row.read_at,
        }
    }
}

fn clamp_u8(v: i16) -> u8 {
    u8::try_from(v.max(0)).unwrap_or(u8::MAX)
}

fn clamp_u32(v: i32) -> u32 {
    u32::try_from(v.max(0)).unwrap_or(0)
}

fn count_to_u32(v: i64) -> u32 {
    u32::try_from(v.max(0)).unwrap_or(u32::MAX)
}

const POST_COLUMNS: &str = r"p.id, p.agent_id, a.owner_id AS author_owner_id, p.body,
    p.media_ref, p.like_count, p.comment_count, p.repost_count, p.created_at";

// ---------------------------------------------------------------------------
// SocialStore
// ---------------------------------------------------------------------------

#[async_trait]
impl SocialStore for PgStore {
    async fn load_agents(&self) -> Result<Vec<AgentRecord>, StoreError> {
        let agent_rows = sqlx::query_as::<_, AgentRow>(
            r"SELECT id, owner_id, name, species, birth_date, origin, location,
                     personality_text, created_at
              FROM agents ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(pg_err)?;

        let profile_rows = sqlx::query_as::<_, ProfileRow>(
            r"SELECT agent_id, tone, expressiveness, sociability, curiosity, calmness,
                     biography, topics, dislikes, catchphrases, learned_topics,
                     quota_posts, quota_likes, quota_comments, quota_reposts
              FROM profiles",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(pg_err)?;

        let mut profiles: BTreeMap<AgentId, Profile> = BTreeMap::new();
        for row in profile_rows {
            let profile = row.into_profile()?;
            profiles.insert(profile.agent_id, profile);
        }

        Ok(agent_rows
            .into_iter()
            .map(|row| {
                let agent = Agent::from(row);
                let profile = profiles.remove(&agent.id);
                AgentRecord { agent, profile }
            })
            .collect())
    }

    async fn update_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO profiles
              (agent_id, tone, expressiveness, sociability, curiosity, calmness,
               biography, topics, dislikes, catchphrases, learned_topics,
               quota_posts, quota_likes, quota_comments, quota_reposts, updated_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, now())
              ON CONFLICT (agent_id) DO UPDATE SET
                tone = EXCLUDED.tone,
                expressiveness = EXCLUDED.expressiveness,
                sociability = EXCLUDED.sociability,
                curiosity = EXCLUDED.curiosity,
                calmness = EXCLUDED.calmness,
                biography = EXCLUDED.biography,
                topics = EXCLUDED.topics,
                dislikes = EXCLUDED.dislikes,
                catchphrases = EXCLUDED.catchphrases,
                learned_topics = EXCLUDED.learned_topics,
                quota_posts = EXCLUDED.quota_posts,
                quota_likes = EXCLUDED.quota_likes,
                quota_comments = EXCLUDED.quota_comments,
                quota_reposts = EXCLUDED.quota_reposts,
                updated_at = now()",
        )
        .bind(profile.agent_id.into_inner())
        .bind(profile.tone.as_str())
        .bind(i16::from(profile.expressiveness))
        .bind(i16::from(profile.traits.sociability))
        .bind(i16::from(profile.traits.curiosity))
        .bind(i16::from(profile.traits.calmness))
        .bind(&profile.biography)
        .bind(serde_json::to_value(&profile.topics)?)
        .bind(serde_json::to_value(&profile.dislikes)?)
        .bind(serde_json::to_value(&profile.catchphrases)?)
        .bind(serde_json::to_value(&profile.learned_topics)?)
        .bind(i32::try_from(profile.quota.posts).unwrap_or(i32::MAX))
        .bind(i32::try_from(profile.quota.likes).unwrap_or(i32::MAX))
        .bind(i32::try_from(profile.quota.comments).unwrap_or(i32::MAX))
        .bind(i32::try_from(profile.quota.reposts).unwrap_or(i32::MAX))
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(())
    }

    async fn update_learned_topics(
        &self,
        agent_id: AgentId,
        learned: &[String],
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"UPDATE profiles SET learned_topics = $2, updated_at = now() WHERE agent_id = $1",
        )
        .bind(agent_id.into_inner())
        .bind(serde_json::to_value(learned)?)
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("profile for agent {agent_id}")));
        }
        Ok(())
    }

    async fn agent_owner(&self, agent_id: AgentId) -> Result<Option<OwnerId>, StoreError> {
        let row: Option<(Uuid,)> =
            sqlx::query_as(r"SELECT owner_id FROM agents WHERE id = $1")
                .bind(agent_id.into_inner())
                .fetch_optional(&self.pool)
                .await
                .map_err(pg_err)?;
        Ok(row.map(|(id,)| OwnerId::from(id)))
    }

    async fn load_recent_posts(&self, limit: u32) -> Result<Vec<Post>, StoreError> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            r"SELECT {POST_COLUMNS}
              FROM posts p JOIN agents a ON a.id = p.agent_id
              ORDER BY p.created_at DESC LIMIT $1"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn load_post(&self, post_id: PostId) -> Result<Option<Post>, StoreError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r"SELECT {POST_COLUMNS}
              FROM posts p JOIN agents a ON a.id = p.agent_id
              WHERE p.id = $1"
        ))
        .bind(post_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(row.map(Post::from))
    }

    async fn create_post(&self, post: NewPost) -> Result<PostId, StoreError> {
        let id = PostId::new();
        sqlx::query(
            r"INSERT INTO posts (id, agent_id, body, media_ref) VALUES ($1, $2, $3, $4)",
        )
        .bind(id.into_inner())
        .bind(post.agent_id.into_inner())
        .bind(&post.body)
        .bind(post.media_ref.map(MediaId::into_inner))
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(id)
    }

    async fn create_like_if_absent(
        &self,
        agent_id: AgentId,
        post_id: PostId,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await.map_err(pg_err)?;
        let inserted = sqlx::query(
            r"INSERT INTO likes (agent_id, post_id) VALUES ($1, $2)
              ON CONFLICT (agent_id, post_id) DO NOTHING",
        )
        .bind(agent_id.into_inner())
        .bind(post_id.into_inner())
        .execute(&mut *tx)
        .await
        .map_err(pg_err)?;
        if inserted.rows_affected() == 0 {
            tx.rollback().await.map_err(pg_err)?;
            return Ok(false);
        }
        sqlx::query(r"UPDATE posts SET like_count = like_count + 1 WHERE id = $1")
            .bind(post_id.into_inner())
            .execute(&mut *tx)
            .await
            .map_err(pg_err)?;
        tx.commit().await.map_err(pg_err)?;
        Ok(true)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<CommentId, StoreError> {
        let id = CommentId::new();
        let mut tx = self.pool.begin().await.map_err(pg_err)?;
        sqlx::query(
            r"INSERT INTO comments (id, post_id, agent_id, body) VALUES ($1, $2, $3, $4)",
        )
        .bind(id.into_inner())
        .bind(comment.post_id.into_inner())
        .bind(comment.agent_id.into_inner())
        .bind(&comment.body)
        .execute(&mut *tx)
        .await
        .map_err(pg_err)?;
        sqlx::query(r"UPDATE posts SET comment_count = comment_count + 1 WHERE id = $1")
            .bind(comment.post_id.into_inner())
            .execute(&mut *tx)
            .await
            .map_err(pg_err)?;
        tx.commit().await.map_err(pg_err)?;
        Ok(id)
    }

    async fn create_repost_if_absent(
        &self,
        agent_id: AgentId,
        post_id: PostId,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await.map_err(pg_err)?;
        let inserted = sqlx::query(
            r"INSERT INTO reposts (agent_id, post_id) VALUES ($1, $2)
              ON CONFLICT (agent_id, post_id) DO NOTHING",
        )
        .bind(agent_id.into_inner())
        .bind(post_id.into_inner())
        .execute(&mut *tx)
        .await
        .map_err(pg_err)?;
        if inserted.rows_affected() == 0 {
            tx.rollback().await.map_err(pg_err)?;
            return Ok(false);
        }
        sqlx::query(r"UPDATE posts SET repost_count = repost_count + 1 WHERE id = $1")
            .bind(post_id.into_inner())
            .execute(&mut *tx)
            .await
            .map_err(pg_err)?;
        tx.commit().await.map_err(pg_err)?;
        Ok(true)
    }

    async fn create_follow_if_absent(
        &self,
        follower: AgentId,
        followee: AgentId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"INSERT INTO follows (follower_id, followee_id) VALUES ($1, $2)
              ON CONFLICT (follower_id, followee_id) DO NOTHING",
        )
        .bind(follower.into_inner())
        .bind(followee.into_inner())
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn liked_post_ids(&self, agent_id: AgentId) -> Result<BTreeSet<PostId>, StoreError> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as(r"SELECT post_id FROM likes WHERE agent_id = $1")
                .bind(agent_id.into_inner())
                .fetch_all(&self.pool)
                .await
                .map_err(pg_err)?;
        Ok(rows.into_iter().map(|(id,)| PostId::from(id)).collect())
    }

    async fn reposted_post_ids(&self, agent_id: AgentId) -> Result<BTreeSet<PostId>, StoreError> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as(r"SELECT post_id FROM reposts WHERE agent_id = $1")
                .bind(agent_id.into_inner())
                .fetch_all(&self.pool)
                .await
                .map_err(pg_err)?;
        Ok(rows.into_iter().map(|(id,)| PostId::from(id)).collect())
    }

    async fn comment_counts_by_agent(
        &self,
        agent_id: AgentId,
    ) -> Result<BTreeMap<PostId, u32>, StoreError> {
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            r"SELECT post_id, COUNT(*) FROM comments WHERE agent_id = $1 GROUP BY post_id",
        )
        .bind(agent_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(rows
            .into_iter()
            .map(|(id, n)| (PostId::from(id), count_to_u32(n)))
            .collect())
    }

    async fn latest_opposing_comment(
        &self,
        post_id: PostId,
        agent_id: AgentId,
    ) -> Result<Option<Comment>, StoreError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r"SELECT id, post_id, agent_id, body, created_at
              FROM comments
              WHERE post_id = $1 AND agent_id <> $2
              ORDER BY created_at DESC LIMIT 1",
        )
        .bind(post_id.into_inner())
        .bind(agent_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(row.map(Comment::from))
    }

    async fn recent_comment_bodies(&self, limit: u32) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r"SELECT body FROM comments ORDER BY created_at DESC LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(rows.into_iter().map(|(body,)| body).collect())
    }

    async fn count_actions_since(
        &self,
        agent_id: AgentId,
        kind: ActionKind,
        since: DateTime<Utc>,
    ) -> Result<u32, StoreError> {
        let sql = match kind {
            ActionKind::Post => {
                r"SELECT COUNT(*) FROM posts WHERE agent_id = $1 AND created_at >= $2"
            }
            ActionKind::Like => {
                r"SELECT COUNT(*) FROM likes WHERE agent_id = $1 AND created_at >= $2"
            }
            ActionKind::Comment => {
                r"SELECT COUNT(*) FROM comments WHERE agent_id = $1 AND created_at >= $2"
            }
            ActionKind::Repost => {
                r"SELECT COUNT(*) FROM reposts WHERE agent_id = $1 AND created_at >= $2"
            }
        };
        let (count,): (i64,) = sqlx::query_as(sql)
            .bind(agent_id.into_inner())
            .bind(since)
            .fetch_one(&self.pool)
            .await
            .map_err(pg_err)?;
        Ok(count_to_u32(count))
    }

    async fn load_media_refs(&self, agent_id: AgentId) -> Result<Vec<MediaRef>, StoreError> {
        let rows: Vec<(Uuid, Uuid, String)> = sqlx::query_as(
            r"SELECT id, agent_id, url FROM media_refs WHERE agent_id = $1",
        )
        .bind(agent_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(rows
            .into_iter()
            .map(|(id, agent, url)| MediaRef {
                id: MediaId::from(id),
                agent_id: AgentId::from(agent),
                url,
            })
            .collect())
    }

    async fn load_diary_context(&self, agent_id: AgentId) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as(
            r"SELECT body FROM diary_entries
              WHERE agent_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(agent_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(row.map(|(body,)| body))
    }

    async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> Result<NotificationId, StoreError> {
        let id = NotificationId::new();
        sqlx::query(
            r"INSERT INTO notifications (id, owner_id, kind, post_id, actor_agent_id)
              VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id.into_inner())
        .bind(notification.owner_id.into_inner())
        .bind(notification.kind.as_str())
        .bind(notification.post_id.map(PostId::into_inner))
        .bind(notification.actor_agent_id.map(AgentId::into_inner))
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(id)
    }

    async fn unread_comment_notifications(
        &self,
        owner_id: OwnerId,
        limit: u32,
    ) -> Result<Vec<Notification>, StoreError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r"SELECT id, owner_id, kind, post_id, actor_agent_id, created_at, read_at
              FROM notifications
              WHERE owner_id = $1 AND kind = 'comment' AND read_at IS NULL
              ORDER BY created_at ASC LIMIT $2",
        )
        .bind(owner_id.into_inner())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(rows.into_iter().map(Notification::from).collect())
    }

    async fn mark_notification_read(
        &self,
        id: NotificationId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r"UPDATE notifications SET read_at = $2 WHERE id = $1 AND read_at IS NULL",
        )
        .bind(id.into_inner())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(())
    }

    async fn has_buzz_notification_at_or_above(
        &self,
        post_id: PostId,
        tier: BuzzTier,
    ) -> Result<bool, StoreError> {
        let kinds: Vec<String> = [BuzzTier::Small, BuzzTier::Mid, BuzzTier::Max]
            .into_iter()
            .filter(|t| t.rank() >= tier.rank())
            .map(|t| t.notification_kind().as_str().to_owned())
            .collect();
        let (exists,): (bool,) = sqlx::query_as(
            r"SELECT EXISTS (
                SELECT 1 FROM notifications WHERE post_id = $1 AND kind = ANY($2)
              )",
        )
        .bind(post_id.into_inner())
        .bind(&kinds)
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(exists)
    }

    async fn list_notifications(
        &self,
        owner_id: OwnerId,
        limit: u32,
    ) -> Result<Vec<Notification>, StoreError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r"SELECT id, owner_id, kind, post_id, actor_agent_id, created_at, read_at
              FROM notifications
              WHERE owner_id = $1
              ORDER BY created_at DESC LIMIT $2",
        )
        .bind(owner_id.into_inner())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(rows.into_iter().map(Notification::from).collect())
    }

    async fn unread_notification_count(&self, owner_id: OwnerId) -> Result<u32, StoreError> {
        let (count,): (i64,) = sqlx::query_as(
            r"SELECT COUNT(*) FROM notifications WHERE owner_id = $1 AND read_at IS NULL",
        )
        .bind(owner_id.into_inner())
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(count_to_u32(count))
    }

    async fn notification_prefs(
        &self,
        owner_id: OwnerId,
    ) -> Result<NotificationPrefs, StoreError> {
        let row: Option<(bool, bool, bool, bool, bool)> = sqlx::query_as(
            r"SELECT likes, comments, follows, reposts, buzz
              FROM notification_prefs WHERE owner_id = $1",
        )
        .bind(owner_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(row.map_or_else(NotificationPrefs::default, |(likes, comments, follows, reposts, buzz)| {
            NotificationPrefs {
                likes,
                comments,
                follows,
                reposts,
                buzz,
            }
        }))
    }

    async fn accepted_friend_owners(
        &self,
        owner_id: OwnerId,
    ) -> Result<BTreeSet<OwnerId>, StoreError> {
        let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
            r"SELECT owner_a, owner_b FROM friendships
              WHERE status = 'accepted' AND (owner_a = $1 OR owner_b = $1)",
        )
        .bind(owner_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(rows
            .into_iter()
            .map(|(a, b)| {
                if OwnerId::from(a) == owner_id {
                    OwnerId::from(b)
                } else {
                    OwnerId::from(a)
                }
            })
            .collect())
    }
}
