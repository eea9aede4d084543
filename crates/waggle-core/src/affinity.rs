//! Affinity scoring: how much a candidate post appeals to an agent.
//!
//! Scores are additive over a uniform random jitter, so the bonuses act
//! as soft preferences rather than hard filters. A score is meaningful
//! only relative to the other candidates in the same round.

use rand::Rng;
use waggle_types::{Post, Profile};

use crate::config::AffinityWeights;

/// What the score will be used to select.
///
/// Comment selection applies the introvert penalty; like selection does
/// not (liking is low-effort even for withdrawn agents).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorePurpose {
    /// Choosing posts to like.
    Like,
    /// Choosing posts to comment on.
    Comment,
}

/// Score one candidate post for `profile`.
///
/// `author_affiliated` is whether the post author's owner has an
/// accepted friendship with this agent's owner.
pub fn score_post(
    profile: &Profile,
    post: &Post,
    author_affiliated: bool,
    purpose: ScorePurpose,
    weights: &AffinityWeights,
    rng: &mut impl Rng,
) -> f64 {
    let mut score: f64 = rng.random::<f64>();

    if author_affiliated {
        score += weights.friend_bonus;
    }

    let body = post.body.to_lowercase();
    let known_topic = profile
        .topics
        .iter()
        .chain(profile.learned_topics.iter())
        .any(|topic| body.contains(&topic.to_lowercase()));
    if known_topic {
        score += weights.topic_bonus;
    }

    if profile.traits.curiosity >= weights.high_curiosity && has_novel_vocabulary(profile, &body) {
        score += weights.novelty_bonus;
    }

    if purpose == ScorePurpose::Comment
        && profile.traits.sociability <= weights.low_sociability
        && profile.traits.calmness >= weights.high_calmness
    {
        score -= weights.introvert_penalty;
    }

    score
}

/// Whether `body` contains any learnable token the agent has not yet
/// learned and does not already list as a topic.
fn has_novel_vocabulary(profile: &Profile, body: &str) -> bool {
    waggle_persona::tokenize(body).iter().any(|token| {
        !profile.learned_topics.contains(token) && !profile.topics.contains(token)
    })
}

/// The indices of the `n` highest-scoring candidates, best first.
///
/// NaN scores sort last; ties keep the candidates' original order.
pub fn rank_top_n(scores: &[f64], n: usize) -> Vec<usize> {
    let mut indexed: Vec<(usize, f64)> = scores.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indexed.into_iter().take(n).map(|(idx, _)| idx).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use waggle_types::{AgentId, DailyQuota, OwnerId, PostId, ToneCategory, TraitScores};

    use super::*;

    fn profile_with_traits(sociability: u8, curiosity: u8, calmness: u8) -> Profile {
        Profile {
            agent_id: AgentId::new(),
            tone: ToneCategory::Cheerful,
            expressiveness: 3,
            traits: TraitScores::clamped(sociability, curiosity, calmness),
            biography: String::new(),
            topics: vec![String::from("squirrels")],
            dislikes: Vec::new(),
            catchphrases: Vec::new(),
            learned_topics: vec![String::from("birch")],
            quota: DailyQuota {
                posts: 2,
                likes: 10,
                comments: 4,
                reposts: 1,
            },
        }
    }

    fn post_with_body(body: &str) -> Post {
        Post {
            id: PostId::new(),
            agent_id: AgentId::new(),
            author_owner_id: OwnerId::new(),
            body: String::from(body),
            media_ref: None,
            like_count: 0,
            comment_count: 0,
            repost_count: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn friend_bonus_dominates_jitter() {
        let weights = AffinityWeights::default();
        let profile = profile_with_traits(5, 5, 5);
        let post = post_with_body("an unremarkable day");
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..50 {
            let friend = score_post(&profile, &post, true, ScorePurpose::Like, &weights, &mut rng);
            let stranger =
                score_post(&profile, &post, false, ScorePurpose::Like, &weights, &mut rng);
            // friend_bonus (2.0) exceeds the [0, 1) jitter range, so a
            // friend's post always outscores the same post from a stranger.
            assert!(friend > stranger);
        }
    }

    #[test]
    fn topic_overlap_includes_learned_topics() {
        let weights = AffinityWeights::default();
        let profile = profile_with_traits(5, 0, 5);
        let post = post_with_body("found a birch tree");
        let mut rng = SmallRng::seed_from_u64(11);
        let score = score_post(&profile, &post, false, ScorePurpose::Like, &weights, &mut rng);
        assert!(score >= weights.topic_bonus);
    }

    #[test]
    fn introvert_penalty_applies_only_to_comments() {
        let weights = AffinityWeights::default();
        let introvert = profile_with_traits(2, 0, 9);
        let post = post_with_body("mmm");
        let mut rng = SmallRng::seed_from_u64(11);
        let comment_score = score_post(
            &introvert,
            &post,
            false,
            ScorePurpose::Comment,
            &weights,
            &mut rng,
        );
        // Jitter is below 1.0, so the penalized comment score must land
        // below 1.0 - penalty.
        assert!(comment_score < 1.0 - weights.introvert_penalty);
        let like_score = score_post(
            &introvert,
            &post,
            false,
            ScorePurpose::Like,
            &weights,
            &mut rng,
        );
        assert!(like_score >= 0.0);
    }

    #[test]
    fn novelty_bonus_requires_high_curiosity() {
        let weights = AffinityWeights::default();
        let curious = profile_with_traits(5, 9, 5);
        let incurious = profile_with_traits(5, 2, 5);
        let post = post_with_body("zzz");
        // Empty learnable vocabulary: "zzz" tokenizes but is novel.
        let mut rng = SmallRng::seed_from_u64(3);
        let curious_score = score_post(&curious, &post, false, ScorePurpose::Like, &weights, &mut rng);
        let mut rng = SmallRng::seed_from_u64(3);
        let incurious_score =
            score_post(&incurious, &post, false, ScorePurpose::Like, &weights, &mut rng);
        assert!((curious_score - incurious_score - weights.novelty_bonus).abs() < f64::EPSILON);
    }

    #[test]
    fn rank_top_n_orders_descending() {
        let scores = [0.5, 2.0, 1.0, 0.1];
        assert_eq!(rank_top_n(&scores, 2), vec![1, 2]);
        assert_eq!(rank_top_n(&scores, 10), vec![1, 2, 0, 3]);
    }
}
