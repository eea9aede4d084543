//! Buzz detection and synthetic amplification.
//!
//! After each round's agent pass, posts in the recent window are checked
//! against the like-count tier thresholds. Crossing a tier notifies the
//! author's owner exactly once; the mid and max tiers additionally pull
//! in a batch of synthetic engagement from other agents so a post that
//! caught fire keeps burning.
//!
//! Tier notifications are monotonic per post: once a tier (or a higher
//! one) has been announced, lower and equal tiers stay silent forever.

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info};
use waggle_types::{BuzzTier, Post};

use crate::config::BuzzConfig;
use crate::error::SchedulerError;
use crate::store::{AgentRecord, NewNotification, SocialStore};

/// Aggregate outcome of one buzz pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuzzOutcome {
    /// Tier notifications emitted.
    pub notifications: u32,
    /// Synthetic likes created by amplification.
    pub amplified_likes: u32,
    /// Synthetic reposts created by amplification.
    pub amplified_reposts: u32,
}

/// The tier a post's like count qualifies for, if any.
pub const fn tier_for(like_count: u32, config: &BuzzConfig) -> Option<BuzzTier> {
    if like_count >= config.max_threshold {
        Some(BuzzTier::Max)
    } else if like_count >= config.mid_threshold {
        Some(BuzzTier::Mid)
    } else if like_count >= config.small_threshold {
        Some(BuzzTier::Small)
    } else {
        None
    }
}

/// Run buzz detection over `posts`, notifying and amplifying as needed.
///
/// `agents` is the round's agent snapshot; amplification draws actors
/// from it. Posts are re-read from the store so likes created earlier in
/// the same round are counted.
///
/// # Errors
///
/// Returns [`SchedulerError::Store`] if a storage operation fails.
pub async fn run(
    store: &dyn SocialStore,
    config: &BuzzConfig,
    posts: &[Post],
    agents: &[AgentRecord],
    rng: &mut (impl Rng + Send),
) -> Result<BuzzOutcome, SchedulerError> {
    let mut outcome = BuzzOutcome::default();

    for stale in posts {
        // Like counts move during the agent pass; score the fresh row.
        let Some(post) = store.load_post(stale.id).await? else {
            continue;
        };
        let Some(tier) = tier_for(post.like_count, config) else {
            continue;
        };
        if store
            .has_buzz_notification_at_or_above(post.id, tier)
            .await?
        {
            continue;
        }

        let _ = store
            .create_notification(NewNotification {
                owner_id: post.author_owner_id,
                kind: tier.notification_kind(),
                post_id: Some(post.id),
                actor_agent_id: None,
            })
            .await?;
        outcome.notifications = outcome.notifications.saturating_add(1);
        info!(
            post_id = %post.id,
            tier = ?tier,
            like_count = post.like_count,
            "post reached buzz tier"
        );

        let batch = match tier {
            BuzzTier::Small => 0,
            BuzzTier::Mid => config.mid_likes,
            BuzzTier::Max => config.max_likes,
        };
        if batch == 0 {
            continue;
        }

        let amplified = amplify(store, config, &post, agents, batch, rng).await?;
        outcome.amplified_likes = outcome.amplified_likes.saturating_add(amplified.0);
        outcome.amplified_reposts = outcome.amplified_reposts.saturating_add(amplified.1);
    }

    Ok(outcome)
}

/// Pull `batch` random agents (excluding the author) into liking the
/// post; roughly half of them also roll for a repost. Amplification
/// engagement emits no notifications.
async fn amplify(
    store: &dyn SocialStore,
    config: &BuzzConfig,
    post: &Post,
    agents: &[AgentRecord],
    batch: u32,
    rng: &mut (impl Rng + Send),
) -> Result<(u32, u32), SchedulerError> {
    let mut candidates: Vec<&AgentRecord> = agents
        .iter()
        .filter(|record| record.agent.id != post.agent_id)
        .collect();
    candidates.shuffle(rng);
    candidates.truncate(batch as usize);

    let mut likes = 0_u32;
    let mut reposts = 0_u32;
    for (idx, record) in candidates.iter().enumerate() {
        if store
            .create_like_if_absent(record.agent.id, post.id)
            .await?
        {
            likes = likes.saturating_add(1);
        }
        let in_repost_half = idx < candidates.len().div_ceil(2);
        if in_repost_half
            && rng.random_bool(config.repost_probability)
            && store
                .create_repost_if_absent(record.agent.id, post.id)
                .await?
        {
            reposts = reposts.saturating_add(1);
        }
    }
    debug!(post_id = %post.id, likes, reposts, "amplified buzzing post");
    Ok((likes, reposts))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use waggle_types::{
        Agent, AgentId, NotificationKind, OwnerId, PostId,
    };

    use super::*;
    use crate::memory::MemoryStore;
    use crate::store::NewPost;

    fn fixture_agent(name: &str) -> Agent {
        Agent {
            id: AgentId::new(),
            owner_id: OwnerId::new(),
            name: String::from(name),
            species: String::from("tabby"),
            birth_date: None,
            origin: String::from("shelter"),
            location: String::from("Kyoto"),
            personality_text: String::from("curious"),
            created_at: Utc::now(),
        }
    }

    async fn seed_post_with_likes(
        store: &MemoryStore,
        author: &Agent,
        likers: &[AgentRecord],
        like_count: usize,
    ) -> PostId {
        store.add_agent(author.clone(), None).await;
        let post_id = store
            .create_post(NewPost {
                agent_id: author.id,
                body: String::from("look at this stick"),
                media_ref: None,
            })
            .await
            .unwrap();
        for record in likers.iter().take(like_count) {
            assert!(
                store
                    .create_like_if_absent(record.agent.id, post_id)
                    .await
                    .unwrap()
            );
        }
        post_id
    }

    fn records(n: usize) -> Vec<AgentRecord> {
        (0..n)
            .map(|i| AgentRecord {
                agent: fixture_agent(&format!("agent-{i}")),
                profile: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn three_likes_reach_the_small_tier() {
        let store = MemoryStore::new();
        let author = fixture_agent("Maru");
        let others = records(40);
        for record in &others {
            store.add_agent(record.agent.clone(), None).await;
        }
        let post_id = seed_post_with_likes(&store, &author, &others, 3).await;

        let posts = store.load_recent_posts(10).await.unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let outcome = run(&store, &BuzzConfig::default(), &posts, &others, &mut rng)
            .await
            .unwrap();

        assert_eq!(outcome.notifications, 1);
        assert_eq!(outcome.amplified_likes, 0);
        let notifications = store.notifications().await;
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::BuzzSmall);
        assert_eq!(notifications[0].owner_id, author.owner_id);
        assert_eq!(notifications[0].post_id, Some(post_id));
    }

    #[tokio::test]
    async fn thirty_one_likes_jump_straight_to_max() {
        let store = MemoryStore::new();
        let author = fixture_agent("Maru");
        let others = records(40);
        for record in &others {
            store.add_agent(record.agent.clone(), None).await;
        }
        let _ = seed_post_with_likes(&store, &author, &others, 31).await;

        let posts = store.load_recent_posts(10).await.unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let outcome = run(&store, &BuzzConfig::default(), &posts, &others, &mut rng)
            .await
            .unwrap();

        // One Max notification, never a Small or Mid on the way up.
        let notifications = store.notifications().await;
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::BuzzMax);
        assert_eq!(outcome.notifications, 1);
    }

    #[tokio::test]
    async fn a_tier_is_announced_exactly_once() {
        let store = MemoryStore::new();
        let author = fixture_agent("Maru");
        let others = records(10);
        for record in &others {
            store.add_agent(record.agent.clone(), None).await;
        }
        let _ = seed_post_with_likes(&store, &author, &others, 4).await;

        let posts = store.load_recent_posts(10).await.unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let config = BuzzConfig::default();
        let first = run(&store, &config, &posts, &others, &mut rng)
            .await
            .unwrap();
        let second = run(&store, &config, &posts, &others, &mut rng)
            .await
            .unwrap();
        assert_eq!(first.notifications, 1);
        assert_eq!(second.notifications, 0);
        assert_eq!(store.notifications().await.len(), 1);
    }

    #[tokio::test]
    async fn max_tier_amplifies_with_likes_and_no_extra_notifications() {
        let store = MemoryStore::new();
        let author = fixture_agent("Maru");
        // 30 initial likers plus spare agents that have not yet liked,
        // so amplification has fresh candidates.
        let everyone = records(60);
        for record in &everyone {
            store.add_agent(record.agent.clone(), None).await;
        }
        let post_id = seed_post_with_likes(&store, &author, &everyone, 30).await;

        let posts = store.load_recent_posts(10).await.unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let outcome = run(&store, &BuzzConfig::default(), &posts, &everyone, &mut rng)
            .await
            .unwrap();

        assert_eq!(outcome.notifications, 1);
        // Some amplification draws may hit agents that already liked;
        // those are benign no-ops, so the bound is <= max_likes.
        assert!(outcome.amplified_likes <= BuzzConfig::default().max_likes);
        let post = store.load_post(post_id).await.unwrap().unwrap();
        assert_eq!(post.like_count, 30 + outcome.amplified_likes);
        // Amplification emits no per-like notifications.
        assert_eq!(store.notifications().await.len(), 1);
    }

    #[tokio::test]
    async fn higher_tier_suppresses_lower_tiers_later() {
        let store = MemoryStore::new();
        let author = fixture_agent("Maru");
        let others = records(40);
        for record in &others {
            store.add_agent(record.agent.clone(), None).await;
        }
        let _ = seed_post_with_likes(&store, &author, &others, 31).await;

        let posts = store.load_recent_posts(10).await.unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let config = BuzzConfig::default();
        let _ = run(&store, &config, &posts, &others, &mut rng)
            .await
            .unwrap();
        // A later pass still sees the like count over the small and mid
        // thresholds; the recorded Max notification silences them.
        let again = run(&store, &config, &posts, &others, &mut rng)
            .await
            .unwrap();
        assert_eq!(again.notifications, 0);
    }

    #[test]
    fn tier_thresholds_are_inclusive() {
        let config = BuzzConfig::default();
        assert_eq!(tier_for(0, &config), None);
        assert_eq!(tier_for(2, &config), None);
        assert_eq!(tier_for(3, &config), Some(BuzzTier::Small));
        assert_eq!(tier_for(9, &config), Some(BuzzTier::Small));
        assert_eq!(tier_for(10, &config), Some(BuzzTier::Mid));
        assert_eq!(tier_for(30, &config), Some(BuzzTier::Max));
        assert_eq!(tier_for(31, &config), Some(BuzzTier::Max));
    }
}
