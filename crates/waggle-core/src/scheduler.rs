//! The per-round action scheduler.
//!
//! One round walks every agent in random order and lets each take
//! quota-bounded probabilistic actions: posting, liking, commenting,
//! threading replies, and reposting. A buzz pass follows the agent walk.
//!
//! Failure handling is layered: a failure while loading the round
//! snapshot aborts the round; a failure inside one agent's turn is
//! logged and skips only that agent; a synthesis failure downgrades to
//! "nothing to say" and costs nothing.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};
use waggle_persona::{GENERIC_REPLIES, PersonaInput, contains_distress, find_trigger};
use waggle_types::{
    ActionCounts, ActionKind, Agent, AgentId, NotificationKind, OwnerId, Post, Profile,
};

use crate::affinity::{ScorePurpose, rank_top_n, score_post};
use crate::buzz::{self, BuzzOutcome};
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::store::{
    AgentRecord, NewComment, NewNotification, NewPost, SocialStore, StoreError,
};
use crate::synth::ContentSynthesizer;

/// Aggregate result of one completed round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundSummary {
    /// Actions taken by agents during the walk.
    pub counts: ActionCounts,
    /// Agents whose turn completed.
    pub agents_processed: u32,
    /// Agents whose turn failed and was skipped.
    pub agents_failed: u32,
    /// Outcome of the buzz pass.
    pub buzz: BuzzOutcome,
}

/// Drives one round of agent activity against a [`SocialStore`].
pub struct ActionScheduler {
    store: Arc<dyn SocialStore>,
    synth: Arc<dyn ContentSynthesizer>,
    config: SchedulerConfig,
}

impl ActionScheduler {
    /// Build a scheduler over the given store and synthesizer.
    pub fn new(
        store: Arc<dyn SocialStore>,
        synth: Arc<dyn ContentSynthesizer>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            synth,
            config,
        }
    }

    /// The store this scheduler operates on.
    pub fn store(&self) -> Arc<dyn SocialStore> {
        Arc::clone(&self.store)
    }

    /// Run one full round: agent walk, then buzz pass.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Store`] only for failures outside any
    /// single agent's turn (snapshot loads, the buzz pass).
    pub async fn run_round(&self) -> Result<RoundSummary, SchedulerError> {
        let mut rng = StdRng::from_os_rng();
        let now = Utc::now();
        let day_start = day_start(now, self.config.day_offset_hours);

        let agents = self.store.load_agents().await?;
        let names: BTreeMap<AgentId, String> = agents
            .iter()
            .map(|r| (r.agent.id, r.agent.name.clone()))
            .collect();
        let recent = self
            .store
            .load_recent_posts(self.config.recent_post_window)
            .await?;

        let mut order: Vec<&AgentRecord> = agents.iter().collect();
        order.shuffle(&mut rng);

        let mut summary = RoundSummary::default();
        for record in order {
            // Derivation has not run for this agent yet; it takes no turn.
            let Some(profile) = record.profile.clone() else {
                continue;
            };
            match self
                .process_agent(&record.agent, &profile, &names, &recent, day_start, &mut rng)
                .await
            {
                Ok(counts) => {
                    summary.counts.absorb(counts);
                    summary.agents_processed = summary.agents_processed.saturating_add(1);
                }
                Err(error) => {
                    warn!(
                        agent_id = %record.agent.id,
                        %error,
                        "agent turn failed, skipping"
                    );
                    summary.agents_failed = summary.agents_failed.saturating_add(1);
                }
            }
        }

        // Re-snapshot so posts and likes from this walk are visible.
        let after = self
            .store
            .load_recent_posts(self.config.recent_post_window)
            .await?;
        summary.buzz =
            buzz::run(self.store.as_ref(), &self.config.buzz, &after, &agents, &mut rng).await?;

        info!(
            posts = summary.counts.posts,
            likes = summary.counts.likes,
            comments = summary.counts.comments,
            reposts = summary.counts.reposts,
            agents_processed = summary.agents_processed,
            agents_failed = summary.agents_failed,
            buzz_notifications = summary.buzz.notifications,
            "round complete"
        );
        Ok(summary)
    }

    /// Compose the daily activity report for one agent's owner.
    ///
    /// Returns `None` when the agent does not exist, has no profile yet,
    /// or the synthesizer fails (a report is never worth an error).
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Store`] if loading the agent or its
    /// action counts fails.
    pub async fn agent_report(
        &self,
        agent_id: AgentId,
    ) -> Result<Option<String>, SchedulerError> {
        let agents = self.store.load_agents().await?;
        let Some(record) = agents.into_iter().find(|r| r.agent.id == agent_id) else {
            return Ok(None);
        };
        let Some(profile) = record.profile else {
            return Ok(None);
        };
        let day_start = day_start(Utc::now(), self.config.day_offset_hours);
        let counts = ActionCounts {
            posts: self.actions_since(agent_id, ActionKind::Post, day_start).await?,
            likes: self.actions_since(agent_id, ActionKind::Like, day_start).await?,
            comments: self
                .actions_since(agent_id, ActionKind::Comment, day_start)
                .await?,
            reposts: self
                .actions_since(agent_id, ActionKind::Repost, day_start)
                .await?,
        };
        let distressed = self
            .store
            .load_diary_context(agent_id)
            .await?
            .as_deref()
            .is_some_and(contains_distress);
        match self
            .synth
            .synthesize_report(&record.agent, &profile, counts, distressed)
            .await
        {
            Ok(report) => Ok(Some(report)),
            Err(error) => {
                warn!(agent_id = %agent_id, %error, "report synthesis failed");
                Ok(None)
            }
        }
    }

    /// Derive and persist profiles for agents that have none.
    ///
    /// Rounds skip profile-less agents entirely; this is the explicit
    /// provisioning path, run at startup to back-fill agents registered
    /// before derivation existed or whose derivation was interrupted.
    /// Returns how many profiles were derived.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Store`] if loading agents or persisting
    /// a derived profile fails.
    pub async fn provision_missing_profiles(&self) -> Result<u32, SchedulerError> {
        let agents = self.store.load_agents().await?;
        let mut derived = 0_u32;
        for record in agents {
            if record.profile.is_some() {
                continue;
            }
            let agent = &record.agent;
            let input = PersonaInput {
                name: agent.name.clone(),
                species: agent.species.clone(),
                birth_date: agent.birth_date,
                origin: agent.origin.clone(),
                personality_text: agent.personality_text.clone(),
                diagnostics: Vec::new(),
            };
            let profile = waggle_persona::derive(agent.id, &input);
            self.store.update_profile(&profile).await?;
            info!(agent_id = %agent.id, tone = ?profile.tone, "derived profile for new agent");
            derived = derived.saturating_add(1);
        }
        Ok(derived)
    }

    // -- one agent's turn ---------------------------------------------------

    async fn process_agent(
        &self,
        agent: &Agent,
        profile: &Profile,
        names: &BTreeMap<AgentId, String>,
        recent: &[Post],
        day_start: DateTime<Utc>,
        rng: &mut StdRng,
    ) -> Result<ActionCounts, StoreError> {
        let diary = self.store.load_diary_context(agent.id).await?;
        let distressed = diary.as_deref().is_some_and(contains_distress);
        let quota = if distressed {
            debug!(agent_id = %agent.id, "distress detected, reducing quota");
            profile.quota.penalized(self.config.distress_penalty)
        } else {
            profile.quota
        };

        let friends = self.store.accepted_friend_owners(agent.owner_id).await?;
        let mut learned = profile.learned_topics.clone();
        let mut counts = ActionCounts::default();

        self.do_posts(
            agent,
            profile,
            quota.posts,
            diary.as_deref(),
            day_start,
            &mut learned,
            &mut counts,
            rng,
        )
        .await?;
        self.do_likes(
            agent, profile, quota.likes, recent, &friends, day_start, &mut learned, &mut counts,
            rng,
        )
        .await?;

        let used_comments = self
            .actions_since(agent.id, ActionKind::Comment, day_start)
            .await?;
        let mut remaining_comments = quota.comments.saturating_sub(used_comments);
        self.do_comments(
            agent,
            profile,
            &mut remaining_comments,
            recent,
            &friends,
            names,
            &mut learned,
            &mut counts,
            rng,
        )
        .await?;
        self.do_replies(
            agent,
            profile,
            &mut remaining_comments,
            names,
            &mut counts,
            rng,
        )
        .await?;
        self.do_reposts(agent, quota.reposts, recent, &friends, day_start, &mut counts, rng)
            .await?;

        if learned != profile.learned_topics {
            self.store.update_learned_topics(agent.id, &learned).await?;
        }
        Ok(counts)
    }

    async fn actions_since(
        &self,
        agent_id: AgentId,
        kind: ActionKind,
        since: DateTime<Utc>,
    ) -> Result<u32, StoreError> {
        self.store.count_actions_since(agent_id, kind, since).await
    }

    /// Whether the agent acts this round given how much quota remains.
    ///
    /// The probability spreads the remaining quota over the expected
    /// rounds left in a day, floored so a last trickle of quota does not
    /// take forever to drain.
    fn acts_now(&self, remaining: u32, rng: &mut StdRng) -> bool {
        if remaining == 0 {
            return false;
        }
        let spread = f64::from(remaining) / f64::from(self.config.rounds_per_day.max(1));
        let p = spread.max(self.config.min_act_probability).min(1.0);
        rng.random_bool(p)
    }

    #[allow(clippy::too_many_arguments)]
    async fn do_posts(
        &self,
        agent: &Agent,
        profile: &Profile,
        target: u32,
        diary: Option<&str>,
        day_start: DateTime<Utc>,
        learned: &mut Vec<String>,
        counts: &mut ActionCounts,
        rng: &mut StdRng,
    ) -> Result<(), StoreError> {
        let used = self.actions_since(agent.id, ActionKind::Post, day_start).await?;
        let remaining = target.saturating_sub(used);
        if !self.acts_now(remaining, rng) {
            return Ok(());
        }

        let body = match self.synth.synthesize_post(agent, profile, diary).await {
            Ok(body) => body,
            Err(error) => {
                warn!(agent_id = %agent.id, %error, "post synthesis failed");
                return Ok(());
            }
        };
        if body.trim().is_empty() {
            return Ok(());
        }

        let media_ref = if rng.random_bool(self.config.media_attach_probability) {
            let media = self.store.load_media_refs(agent.id).await?;
            if media.is_empty() {
                None
            } else {
                media.get(rng.random_range(0..media.len())).map(|m| m.id)
            }
        } else {
            None
        };

        self.learn(profile, learned, &body, rng);
        let post_id = self
            .store
            .create_post(NewPost {
                agent_id: agent.id,
                body,
                media_ref,
            })
            .await?;
        debug!(agent_id = %agent.id, post_id = %post_id, "created post");
        counts.posts = counts.posts.saturating_add(1);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn do_likes(
        &self,
        agent: &Agent,
        profile: &Profile,
        target: u32,
        recent: &[Post],
        friends: &BTreeSet<OwnerId>,
        day_start: DateTime<Utc>,
        learned: &mut Vec<String>,
        counts: &mut ActionCounts,
        rng: &mut StdRng,
    ) -> Result<(), StoreError> {
        let used = self.actions_since(agent.id, ActionKind::Like, day_start).await?;
        let remaining = target.saturating_sub(used);
        if remaining == 0 {
            return Ok(());
        }

        let already_liked = self.store.liked_post_ids(agent.id).await?;
        let mut affiliated: Vec<&Post> = Vec::new();
        let mut other: Vec<&Post> = Vec::new();
        for post in recent {
            if post.agent_id == agent.id || already_liked.contains(&post.id) {
                continue;
            }
            if friends.contains(&post.author_owner_id) {
                affiliated.push(post);
            } else {
                other.push(post);
            }
        }

        let sociable_reach = (u32::from(profile.traits.sociability) / 2).saturating_add(1);
        let attempts = remaining
            .min(self.config.like_attempt_ceiling)
            .min(sociable_reach);

        for _ in 0..attempts {
            let pool = if !affiliated.is_empty()
                && (other.is_empty() || rng.random_bool(self.config.affiliated_pool_weight))
            {
                &mut affiliated
            } else if !other.is_empty() {
                &mut other
            } else {
                break;
            };

            let scores: Vec<f64> = pool
                .iter()
                .map(|post| {
                    let affiliated_author = friends.contains(&post.author_owner_id);
                    score_post(
                        profile,
                        post,
                        affiliated_author,
                        ScorePurpose::Like,
                        &self.config.affinity,
                        rng,
                    )
                })
                .collect();
            let Some(&best) = rank_top_n(&scores, 1).first() else {
                break;
            };
            let post = pool.swap_remove(best);

            if self.store.create_like_if_absent(agent.id, post.id).await? {
                counts.likes = counts.likes.saturating_add(1);
                let _ = self
                    .store
                    .create_notification(NewNotification {
                        owner_id: post.author_owner_id,
                        kind: NotificationKind::Like,
                        post_id: Some(post.id),
                        actor_agent_id: Some(agent.id),
                    })
                    .await?;
                self.learn(profile, learned, &post.body, rng);
                self.maybe_follow(agent, post, friends, rng).await?;
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn do_comments(
        &self,
        agent: &Agent,
        profile: &Profile,
        remaining: &mut u32,
        recent: &[Post],
        friends: &BTreeSet<OwnerId>,
        names: &BTreeMap<AgentId, String>,
        learned: &mut Vec<String>,
        counts: &mut ActionCounts,
        rng: &mut StdRng,
    ) -> Result<(), StoreError> {
        if *remaining == 0 {
            return Ok(());
        }
        let own_counts = self.store.comment_counts_by_agent(agent.id).await?;
        let mut pool: Vec<&Post> = recent
            .iter()
            .filter(|post| {
                // Outward commenting hits a post once; repeat exchanges on
                // the same post go through reply threading only.
                post.agent_id != agent.id
                    && post.comment_count < self.config.max_comments_per_post
                    && !own_counts.contains_key(&post.id)
            })
            .collect();
        if pool.is_empty() {
            return Ok(());
        }

        let curious_extra =
            u32::from(profile.traits.curiosity >= self.config.affinity.high_curiosity);
        let attempts = curious_extra.saturating_add(1).min(*remaining);

        for _ in 0..attempts {
            if pool.is_empty() || *remaining == 0 {
                break;
            }
            if !self.acts_now(*remaining, rng) {
                continue;
            }
            let scores: Vec<f64> = pool
                .iter()
                .map(|post| {
                    score_post(
                        profile,
                        post,
                        friends.contains(&post.author_owner_id),
                        ScorePurpose::Comment,
                        &self.config.affinity,
                        rng,
                    )
                })
                .collect();
            let Some(&best) = rank_top_n(&scores, 1).first() else {
                break;
            };
            let post = pool.swap_remove(best);
            let author_name = names
                .get(&post.agent_id)
                .map_or("friend", String::as_str);

            let Some(body) = self
                .compose_comment(profile, author_name, &post.body, rng)
                .await?
            else {
                continue;
            };

            self.learn(profile, learned, &post.body, rng);
            let _ = self
                .store
                .create_comment(NewComment {
                    post_id: post.id,
                    agent_id: agent.id,
                    body,
                })
                .await?;
            counts.comments = counts.comments.saturating_add(1);
            *remaining = remaining.saturating_sub(1);
            let _ = self
                .store
                .create_notification(NewNotification {
                    owner_id: post.author_owner_id,
                    kind: NotificationKind::Comment,
                    post_id: Some(post.id),
                    actor_agent_id: Some(agent.id),
                })
                .await?;
            self.maybe_follow(agent, post, friends, rng).await?;
        }
        Ok(())
    }

    /// Answer unread comment notifications with threaded replies.
    ///
    /// Each consumed notification is marked read whether or not it earns
    /// a reply; skipped ones (wrong agent, thread too deep) must not
    /// come back next round.
    async fn do_replies(
        &self,
        agent: &Agent,
        profile: &Profile,
        remaining: &mut u32,
        names: &BTreeMap<AgentId, String>,
        counts: &mut ActionCounts,
        rng: &mut StdRng,
    ) -> Result<(), StoreError> {
        if *remaining == 0 {
            return Ok(());
        }
        let batch = self
            .store
            .unread_comment_notifications(agent.owner_id, self.config.reply_batch_per_round)
            .await?;
        let own_counts = self.store.comment_counts_by_agent(agent.id).await?;

        for notification in batch {
            if *remaining == 0 {
                break;
            }
            self.store
                .mark_notification_read(notification.id, Utc::now())
                .await?;

            let Some(post_id) = notification.post_id else {
                continue;
            };
            let Some(post) = self.store.load_post(post_id).await? else {
                continue;
            };
            if post.agent_id != agent.id {
                // Addressed to a sibling agent under the same owner.
                continue;
            }
            if own_counts.get(&post_id).copied().unwrap_or(0) >= self.config.max_thread_depth {
                continue;
            }

            let context = self
                .store
                .latest_opposing_comment(post_id, agent.id)
                .await?
                .map_or_else(|| post.body.clone(), |c| c.body);
            let actor_name = notification
                .actor_agent_id
                .and_then(|id| names.get(&id))
                .map_or("friend", String::as_str);

            let Some(body) = self
                .compose_comment(profile, actor_name, &context, rng)
                .await?
            else {
                continue;
            };

            let _ = self
                .store
                .create_comment(NewComment {
                    post_id,
                    agent_id: agent.id,
                    body,
                })
                .await?;
            counts.comments = counts.comments.saturating_add(1);
            *remaining = remaining.saturating_sub(1);

            if let Some(actor_id) = notification.actor_agent_id
                && let Some(actor_owner) = self.store.agent_owner(actor_id).await?
            {
                let _ = self
                    .store
                    .create_notification(NewNotification {
                        owner_id: actor_owner,
                        kind: NotificationKind::Comment,
                        post_id: Some(post_id),
                        actor_agent_id: Some(agent.id),
                    })
                    .await?;
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn do_reposts(
        &self,
        agent: &Agent,
        target: u32,
        recent: &[Post],
        friends: &BTreeSet<OwnerId>,
        day_start: DateTime<Utc>,
        counts: &mut ActionCounts,
        rng: &mut StdRng,
    ) -> Result<(), StoreError> {
        // Reposts are rare enough that the raw target almost never fires
        // within a day; headroom keeps them occurring at all.
        let effective = target.saturating_mul(self.config.repost_headroom_multiplier);
        let used = self
            .actions_since(agent.id, ActionKind::Repost, day_start)
            .await?;
        let remaining = effective.saturating_sub(used);
        if !self.acts_now(remaining, rng) {
            return Ok(());
        }

        let already = self.store.reposted_post_ids(agent.id).await?;
        let pool: Vec<&Post> = recent
            .iter()
            .filter(|post| {
                post.agent_id != agent.id
                    && !already.contains(&post.id)
                    && !friends.contains(&post.author_owner_id)
            })
            .collect();
        if pool.is_empty() {
            return Ok(());
        }
        let Some(post) = pool.get(rng.random_range(0..pool.len())) else {
            return Ok(());
        };

        if self
            .store
            .create_repost_if_absent(agent.id, post.id)
            .await?
        {
            counts.reposts = counts.reposts.saturating_add(1);
            let _ = self
                .store
                .create_notification(NewNotification {
                    owner_id: post.author_owner_id,
                    kind: NotificationKind::Repost,
                    post_id: Some(post.id),
                    actor_agent_id: Some(agent.id),
                })
                .await?;
            self.maybe_follow(agent, post, friends, rng).await?;
        }
        Ok(())
    }

    // -- shared helpers -----------------------------------------------------

    /// Decide what a comment says: a canned trigger reaction, a short
    /// generic acknowledgment, or a full synthesis run through the
    /// novelty check. `None` means the agent stays quiet.
    async fn compose_comment(
        &self,
        profile: &Profile,
        target_author_name: &str,
        target_text: &str,
        rng: &mut StdRng,
    ) -> Result<Option<String>, StoreError> {
        if let Some(trigger) = find_trigger(target_text)
            && rng.random_bool(self.config.quick_reaction_probability)
        {
            let reaction = trigger
                .reactions
                .get(rng.random_range(0..trigger.reactions.len().max(1)))
                .copied()
                .unwrap_or_default();
            if !reaction.is_empty() {
                return Ok(Some(String::from(reaction)));
            }
        }

        if rng.random_bool(self.config.generic_reply_probability) {
            let generic = GENERIC_REPLIES
                .get(rng.random_range(0..GENERIC_REPLIES.len().max(1)))
                .copied()
                .unwrap_or_default();
            if !generic.is_empty() {
                return Ok(Some(String::from(generic)));
            }
        }

        let recent_bodies = self
            .store
            .recent_comment_bodies(self.config.recent_comment_window)
            .await?;
        let mut body = None;
        for _ in 0..=self.config.novelty_retries {
            match self
                .synth
                .synthesize_comment(target_author_name, profile, target_text)
                .await
            {
                Ok(candidate) => {
                    if candidate.trim().is_empty() {
                        return Ok(None);
                    }
                    let stale = recent_bodies.contains(&candidate);
                    body = Some(candidate);
                    if !stale {
                        break;
                    }
                }
                Err(error) => {
                    warn!(%error, "comment synthesis failed");
                    return Ok(None);
                }
            }
        }
        Ok(body)
    }

    /// One learning opportunity from consumed or produced text.
    fn learn(
        &self,
        profile: &Profile,
        learned: &mut Vec<String>,
        text: &str,
        rng: &mut StdRng,
    ) {
        let _ = waggle_persona::learn_from_text(
            learned,
            profile.traits.curiosity,
            self.config.learned_topic_cap,
            text,
            rng,
        );
    }

    /// Roll for following the author of a post the agent just engaged.
    async fn maybe_follow(
        &self,
        agent: &Agent,
        post: &Post,
        friends: &BTreeSet<OwnerId>,
        rng: &mut StdRng,
    ) -> Result<(), StoreError> {
        let p = if friends.contains(&post.author_owner_id) {
            self.config.follow_probability_affiliated
        } else {
            self.config.follow_probability_other
        };
        if !rng.random_bool(p) {
            return Ok(());
        }
        if self
            .store
            .create_follow_if_absent(agent.id, post.agent_id)
            .await?
        {
            let _ = self
                .store
                .create_notification(NewNotification {
                    owner_id: post.author_owner_id,
                    kind: NotificationKind::Follow,
                    post_id: None,
                    actor_agent_id: Some(agent.id),
                })
                .await?;
        }
        Ok(())
    }
}

/// Start of the current local calendar day, in UTC.
///
/// The simulation day follows a fixed UTC offset rather than a civil
/// time zone; quota windows reset at local midnight.
pub fn day_start(now: DateTime<Utc>, offset_hours: i32) -> DateTime<Utc> {
    let offset = Duration::hours(i64::from(offset_hours));
    let local = now + offset;
    let midnight = local
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_else(|| local.naive_utc());
    DateTime::from_naive_utc_and_offset(midnight, Utc) - offset
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use waggle_types::{DailyQuota, MediaId, MediaRef, ToneCategory, TraitScores};

    use super::*;
    use crate::memory::MemoryStore;
    use crate::synth::TemplateSynthesizer;

    fn fixture_agent(name: &str) -> Agent {
        Agent {
            id: AgentId::new(),
            owner_id: OwnerId::new(),
            name: String::from(name),
            species: String::from("beagle"),
            birth_date: None,
            origin: String::from("shelter"),
            location: String::from("Nara"),
            personality_text: String::from("friendly and curious"),
            created_at: Utc::now(),
        }
    }

    fn fixture_profile(agent_id: AgentId, traits: TraitScores, quota: DailyQuota) -> Profile {
        Profile {
            agent_id,
            tone: ToneCategory::Cheerful,
            expressiveness: 3,
            traits,
            biography: String::from("a good dog"),
            topics: vec![String::from("walks"), String::from("snacks")],
            dislikes: vec![String::from("thunder")],
            catchphrases: vec![String::from("woof!")],
            learned_topics: Vec::new(),
            quota,
        }
    }

    fn scheduler_over(store: Arc<MemoryStore>, config: SchedulerConfig) -> ActionScheduler {
        ActionScheduler::new(store, Arc::new(TemplateSynthesizer), config)
    }

    fn eager_config() -> SchedulerConfig {
        // One round is "the whole day," so every remaining unit of quota
        // converts to near-certain action.
        SchedulerConfig {
            rounds_per_day: 1,
            ..SchedulerConfig::default()
        }
    }

    #[tokio::test]
    async fn round_on_empty_store_completes() {
        let store = Arc::new(MemoryStore::new());
        let scheduler = scheduler_over(Arc::clone(&store), SchedulerConfig::default());
        let summary = scheduler.run_round().await.unwrap();
        assert_eq!(summary.agents_processed, 0);
        assert_eq!(summary.counts.total(), 0);
    }

    #[tokio::test]
    async fn agent_without_profile_takes_no_turn() {
        let store = Arc::new(MemoryStore::new());
        let agent = fixture_agent("Biscuit");
        let agent_id = agent.id;
        store.add_agent(agent, None).await;

        let scheduler = scheduler_over(Arc::clone(&store), eager_config());
        for _ in 0..5 {
            let summary = scheduler.run_round().await.unwrap();
            assert_eq!(summary.agents_processed, 0);
            assert_eq!(summary.agents_failed, 0);
        }
        // Rounds never derive or persist a profile on their own.
        assert!(store.profile(agent_id).await.is_none());
        assert!(store.posts().await.is_empty());
    }

    #[tokio::test]
    async fn provisioning_derives_missing_profiles() {
        let store = Arc::new(MemoryStore::new());
        let agent = fixture_agent("Biscuit");
        let agent_id = agent.id;
        store.add_agent(agent, None).await;

        let scheduler = scheduler_over(Arc::clone(&store), SchedulerConfig::default());
        let derived = scheduler.provision_missing_profiles().await.unwrap();
        assert_eq!(derived, 1);
        let profile = store.profile(agent_id).await.unwrap();
        assert_eq!(profile.agent_id, agent_id);
        assert!(profile.quota.likes >= 5);

        // Already-profiled agents are left alone.
        let derived = scheduler.provision_missing_profiles().await.unwrap();
        assert_eq!(derived, 0);

        let summary = scheduler.run_round().await.unwrap();
        assert_eq!(summary.agents_processed, 1);
    }

    #[tokio::test]
    async fn quota_is_never_exceeded_within_a_day() {
        let store = Arc::new(MemoryStore::new());
        let agent = fixture_agent("Pepper");
        let agent_id = agent.id;
        let profile = fixture_profile(
            agent_id,
            TraitScores::clamped(9, 5, 5),
            DailyQuota {
                posts: 2,
                likes: 3,
                comments: 2,
                reposts: 1,
            },
        );
        store.add_agent(agent, Some(profile)).await;

        // A second agent supplies posts to engage with.
        let other = fixture_agent("Maple");
        let other_id = other.id;
        store
            .add_agent(
                other,
                Some(fixture_profile(
                    other_id,
                    TraitScores::clamped(5, 5, 5),
                    DailyQuota {
                        posts: 0,
                        likes: 0,
                        comments: 0,
                        reposts: 0,
                    },
                )),
            )
            .await;
        for _ in 0..10 {
            let _ = store
                .create_post(crate::store::NewPost {
                    agent_id: other_id,
                    body: String::from("a long walk by the river"),
                    media_ref: None,
                })
                .await
                .unwrap();
        }

        let scheduler = scheduler_over(Arc::clone(&store), eager_config());
        for _ in 0..60 {
            let _ = scheduler.run_round().await.unwrap();
        }

        let start = day_start(Utc::now(), 9);
        let store_dyn: Arc<dyn SocialStore> = store;
        for (kind, target) in [
            (ActionKind::Post, 2),
            (ActionKind::Like, 3),
            (ActionKind::Comment, 2),
        ] {
            let used = store_dyn
                .count_actions_since(agent_id, kind, start)
                .await
                .unwrap();
            assert!(used <= target, "{kind:?}: {used} > {target}");
        }
    }

    #[tokio::test]
    async fn distress_reduces_activity_to_penalized_targets() {
        let store = Arc::new(MemoryStore::new());
        let agent = fixture_agent("Clover");
        let agent_id = agent.id;
        let profile = fixture_profile(
            agent_id,
            TraitScores::clamped(9, 5, 5),
            DailyQuota {
                posts: 2,
                likes: 2,
                comments: 2,
                reposts: 0,
            },
        );
        store.add_agent(agent, Some(profile)).await;
        store
            .set_diary(agent_id, "trip to the vet today, she seemed sick")
            .await;

        let scheduler = scheduler_over(Arc::clone(&store), eager_config());
        for _ in 0..40 {
            let _ = scheduler.run_round().await.unwrap();
        }

        // Penalty of 2 floors every target at zero.
        assert!(store.posts().await.is_empty());
        assert!(store.comments().await.is_empty());
    }

    #[tokio::test]
    async fn one_failing_agent_does_not_stop_the_others() {
        let store = Arc::new(MemoryStore::new());
        let healthy = fixture_agent("Biscuit");
        let healthy_id = healthy.id;
        let broken = fixture_agent("Gremlin");
        let broken_id = broken.id;
        for (agent, id) in [(healthy, healthy_id), (broken, broken_id)] {
            let profile = fixture_profile(
                id,
                TraitScores::clamped(9, 5, 5),
                DailyQuota {
                    posts: 5,
                    likes: 5,
                    comments: 5,
                    reposts: 0,
                },
            );
            store.add_agent(agent, Some(profile)).await;
        }
        store.fail_diary_for(broken_id).await;

        let scheduler = scheduler_over(Arc::clone(&store), eager_config());
        let mut total_failed: u32 = 0;
        for _ in 0..20 {
            let summary = scheduler.run_round().await.unwrap();
            assert_eq!(summary.agents_failed, 1);
            total_failed = total_failed.saturating_add(summary.agents_failed);
        }
        assert_eq!(total_failed, 20);
        // The healthy agent still posted.
        assert!(
            store
                .posts()
                .await
                .iter()
                .any(|p| p.agent_id == healthy_id)
        );
        assert!(store.posts().await.iter().all(|p| p.agent_id != broken_id));
    }

    #[tokio::test]
    async fn likes_notify_the_author_owner() {
        let store = Arc::new(MemoryStore::new());
        let liker = fixture_agent("Biscuit");
        let liker_id = liker.id;
        store
            .add_agent(
                liker,
                Some(fixture_profile(
                    liker_id,
                    TraitScores::clamped(9, 5, 5),
                    DailyQuota {
                        posts: 0,
                        likes: 10,
                        comments: 0,
                        reposts: 0,
                    },
                )),
            )
            .await;
        let author = fixture_agent("Maple");
        let author_id = author.id;
        let author_owner = author.owner_id;
        store
            .add_agent(
                author,
                Some(fixture_profile(
                    author_id,
                    TraitScores::clamped(5, 5, 5),
                    DailyQuota {
                        posts: 0,
                        likes: 0,
                        comments: 0,
                        reposts: 0,
                    },
                )),
            )
            .await;
        let _ = store
            .create_post(crate::store::NewPost {
                agent_id: author_id,
                body: String::from("sunny spot secured"),
                media_ref: None,
            })
            .await
            .unwrap();

        let scheduler = scheduler_over(Arc::clone(&store), eager_config());
        for _ in 0..30 {
            let _ = scheduler.run_round().await.unwrap();
        }

        let notifications = store.notifications().await;
        assert!(
            notifications
                .iter()
                .any(|n| n.kind == NotificationKind::Like
                    && n.owner_id == author_owner
                    && n.actor_agent_id == Some(liker_id))
        );
    }

    #[tokio::test]
    async fn thread_depth_is_bounded() {
        let store = Arc::new(MemoryStore::new());
        let commenter = fixture_agent("Biscuit");
        let commenter_id = commenter.id;
        store
            .add_agent(
                commenter,
                Some(fixture_profile(
                    commenter_id,
                    TraitScores::clamped(9, 9, 2),
                    DailyQuota {
                        posts: 0,
                        likes: 0,
                        comments: 50,
                        reposts: 0,
                    },
                )),
            )
            .await;
        let author = fixture_agent("Maple");
        let author_id = author.id;
        store
            .add_agent(
                author,
                Some(fixture_profile(
                    author_id,
                    TraitScores::clamped(0, 0, 9),
                    DailyQuota {
                        posts: 0,
                        likes: 0,
                        comments: 0,
                        reposts: 0,
                    },
                )),
            )
            .await;
        let post_id = store
            .create_post(crate::store::NewPost {
                agent_id: author_id,
                body: String::from("one single post"),
                media_ref: None,
            })
            .await
            .unwrap();

        let config = SchedulerConfig {
            rounds_per_day: 1,
            generic_reply_probability: 1.0,
            ..SchedulerConfig::default()
        };
        let scheduler = scheduler_over(Arc::clone(&store), config);
        for _ in 0..40 {
            let _ = scheduler.run_round().await.unwrap();
        }

        let own_comments = store
            .comments()
            .await
            .iter()
            .filter(|c| c.post_id == post_id && c.agent_id == commenter_id)
            .count();
        assert!(own_comments <= 3, "thread depth exceeded: {own_comments}");
    }

    #[tokio::test]
    async fn outward_comments_hit_a_post_at_most_once() {
        let store = Arc::new(MemoryStore::new());
        let commenter = fixture_agent("Biscuit");
        let commenter_id = commenter.id;
        store
            .add_agent(
                commenter,
                Some(fixture_profile(
                    commenter_id,
                    TraitScores::clamped(9, 9, 2),
                    DailyQuota {
                        posts: 0,
                        likes: 0,
                        comments: 50,
                        reposts: 0,
                    },
                )),
            )
            .await;
        let author = fixture_agent("Maple");
        let author_id = author.id;
        store
            .add_agent(
                author,
                Some(fixture_profile(
                    author_id,
                    TraitScores::clamped(0, 0, 9),
                    DailyQuota {
                        posts: 0,
                        likes: 0,
                        comments: 0,
                        reposts: 0,
                    },
                )),
            )
            .await;
        let post_id = store
            .create_post(crate::store::NewPost {
                agent_id: author_id,
                body: String::from("one single post"),
                media_ref: None,
            })
            .await
            .unwrap();

        let config = SchedulerConfig {
            rounds_per_day: 1,
            generic_reply_probability: 1.0,
            follow_probability_other: 0.0,
            ..SchedulerConfig::default()
        };
        let scheduler = scheduler_over(Arc::clone(&store), config);
        for _ in 0..30 {
            let _ = scheduler.run_round().await.unwrap();
        }

        // The author never replies (zero quota), so no thread forms and
        // the commenter's only path back to this post is outward.
        let outward = store
            .comments()
            .await
            .iter()
            .filter(|c| c.post_id == post_id && c.agent_id == commenter_id)
            .count();
        assert_eq!(outward, 1);
    }

    #[tokio::test]
    async fn comments_and_reposts_roll_for_follow() {
        // Comment-driven follow.
        let store = Arc::new(MemoryStore::new());
        let commenter = fixture_agent("Biscuit");
        let commenter_id = commenter.id;
        store
            .add_agent(
                commenter,
                Some(fixture_profile(
                    commenter_id,
                    TraitScores::clamped(9, 5, 5),
                    DailyQuota {
                        posts: 0,
                        likes: 0,
                        comments: 5,
                        reposts: 0,
                    },
                )),
            )
            .await;
        let author = fixture_agent("Maple");
        let author_id = author.id;
        let author_owner = author.owner_id;
        store
            .add_agent(
                author,
                Some(fixture_profile(
                    author_id,
                    TraitScores::clamped(0, 0, 9),
                    DailyQuota {
                        posts: 0,
                        likes: 0,
                        comments: 0,
                        reposts: 0,
                    },
                )),
            )
            .await;
        let _ = store
            .create_post(crate::store::NewPost {
                agent_id: author_id,
                body: String::from("a quiet afternoon"),
                media_ref: None,
            })
            .await
            .unwrap();

        let config = SchedulerConfig {
            rounds_per_day: 1,
            generic_reply_probability: 1.0,
            follow_probability_other: 1.0,
            ..SchedulerConfig::default()
        };
        let scheduler = scheduler_over(Arc::clone(&store), config);
        let _ = scheduler.run_round().await.unwrap();

        assert!(store.follows().await.contains(&(commenter_id, author_id)));
        assert!(
            store
                .notifications()
                .await
                .iter()
                .any(|n| n.kind == NotificationKind::Follow && n.owner_id == author_owner)
        );

        // Repost-driven follow.
        let store = Arc::new(MemoryStore::new());
        let reposter = fixture_agent("Pepper");
        let reposter_id = reposter.id;
        store
            .add_agent(
                reposter,
                Some(fixture_profile(
                    reposter_id,
                    TraitScores::clamped(5, 5, 5),
                    DailyQuota {
                        posts: 0,
                        likes: 0,
                        comments: 0,
                        reposts: 2,
                    },
                )),
            )
            .await;
        let author = fixture_agent("Maple");
        let author_id = author.id;
        store
            .add_agent(
                author,
                Some(fixture_profile(
                    author_id,
                    TraitScores::clamped(0, 0, 9),
                    DailyQuota {
                        posts: 0,
                        likes: 0,
                        comments: 0,
                        reposts: 0,
                    },
                )),
            )
            .await;
        let _ = store
            .create_post(crate::store::NewPost {
                agent_id: author_id,
                body: String::from("a very good stick"),
                media_ref: None,
            })
            .await
            .unwrap();

        let config = SchedulerConfig {
            rounds_per_day: 1,
            follow_probability_other: 1.0,
            ..SchedulerConfig::default()
        };
        let scheduler = scheduler_over(Arc::clone(&store), config);
        let _ = scheduler.run_round().await.unwrap();

        assert!(store.follows().await.contains(&(reposter_id, author_id)));
    }

    #[tokio::test]
    async fn media_can_attach_to_posts() {
        let store = Arc::new(MemoryStore::new());
        let agent = fixture_agent("Biscuit");
        let agent_id = agent.id;
        store
            .add_agent(
                agent,
                Some(fixture_profile(
                    agent_id,
                    TraitScores::clamped(9, 5, 5),
                    DailyQuota {
                        posts: 20,
                        likes: 0,
                        comments: 0,
                        reposts: 0,
                    },
                )),
            )
            .await;
        store
            .add_media(MediaRef {
                id: MediaId::new(),
                agent_id,
                url: String::from("s3://waggle/biscuit/1.jpg"),
            })
            .await;

        let config = SchedulerConfig {
            rounds_per_day: 1,
            media_attach_probability: 1.0,
            ..SchedulerConfig::default()
        };
        let scheduler = scheduler_over(Arc::clone(&store), config);
        for _ in 0..10 {
            let _ = scheduler.run_round().await.unwrap();
        }

        let posts = store.posts().await;
        assert!(!posts.is_empty());
        assert!(posts.iter().all(|p| p.media_ref.is_some()));
    }

    #[tokio::test]
    async fn report_summarizes_the_day() {
        let store = Arc::new(MemoryStore::new());
        let agent = fixture_agent("Biscuit");
        let agent_id = agent.id;
        store
            .add_agent(
                agent,
                Some(fixture_profile(
                    agent_id,
                    TraitScores::clamped(5, 5, 5),
                    DailyQuota {
                        posts: 1,
                        likes: 1,
                        comments: 1,
                        reposts: 1,
                    },
                )),
            )
            .await;

        let scheduler = scheduler_over(Arc::clone(&store), SchedulerConfig::default());
        let report = scheduler.agent_report(agent_id).await.unwrap();
        assert!(report.is_some_and(|r| r.contains("Biscuit")));
        let missing = scheduler.agent_report(AgentId::new()).await.unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn day_start_respects_the_offset() {
        // 2026-03-10 20:00 UTC is 2026-03-11 05:00 at +9; the local day
        // started at 2026-03-10 15:00 UTC.
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 20, 0, 0).unwrap();
        let start = day_start(now, 9);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 10, 15, 0, 0).unwrap());

        // With no offset the day starts at UTC midnight.
        let start = day_start(now, 0);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap());
    }
}
