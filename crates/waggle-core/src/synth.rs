//! The content synthesis boundary.
//!
//! Everything that turns a persona plus context into actual text sits
//! behind [`ContentSynthesizer`]. The scheduler treats the implementation
//! as opaque; a failed or empty synthesis downgrades to "the agent had
//! nothing to say this round" rather than an error.
//!
//! [`TemplateSynthesizer`] is the built-in implementation: tone-keyed
//! templates over the profile's topics and catchphrases. A model-backed
//! implementation can replace it without touching the scheduler.

use async_trait::async_trait;
use waggle_types::{ActionCounts, Agent, Profile, ToneCategory};

/// Errors a synthesizer implementation can report.
///
/// The scheduler logs these at warn level and moves on; synthesis
/// failure never aborts a round or an agent's remaining actions.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// The backing text source failed.
    #[error("synthesis backend error: {0}")]
    Backend(String),
}

/// Produces all agent-authored text.
///
/// Implementations must be cheap to call repeatedly within a round and
/// must never panic on unusual profile contents.
#[async_trait]
pub trait ContentSynthesizer: Send + Sync {
    /// Compose a new post body for `agent`.
    ///
    /// `diary_context` is the agent's latest diary text, if any; it may
    /// color the post but must not be quoted verbatim.
    async fn synthesize_post(
        &self,
        agent: &Agent,
        profile: &Profile,
        diary_context: Option<&str>,
    ) -> Result<String, SynthError>;

    /// Compose a comment on another agent's post.
    ///
    /// `target_text` is the text being responded to (the post body, or
    /// the latest opposing comment when threading).
    async fn synthesize_comment(
        &self,
        target_author_name: &str,
        profile: &Profile,
        target_text: &str,
    ) -> Result<String, SynthError>;

    /// Compose a daily activity report addressed to the agent's owner.
    async fn synthesize_report(
        &self,
        agent: &Agent,
        profile: &Profile,
        counts: ActionCounts,
        distressed: bool,
    ) -> Result<String, SynthError>;
}

/// Deterministic template-based synthesizer.
///
/// Rotates through its topic list using a simple counter derived from
/// the input so repeated calls vary without any internal state.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateSynthesizer;

impl TemplateSynthesizer {
    /// Pick a profile topic keyed off `salt` so consecutive calls with
    /// different context rotate through the list.
    fn pick_topic<'a>(profile: &'a Profile, salt: usize) -> &'a str {
        profile
            .topics
            .get(salt % profile.topics.len().max(1))
            .map_or("naps", String::as_str)
    }

    fn catchphrase(profile: &Profile, salt: usize) -> Option<&str> {
        profile
            .catchphrases
            .get(salt % profile.catchphrases.len().max(1))
            .map(String::as_str)
    }

    fn exclaim(profile: &Profile) -> &'static str {
        if profile.expressiveness >= 4 {
            "!!"
        } else if profile.expressiveness >= 2 {
            "!"
        } else {
            "."
        }
    }
}

#[async_trait]
impl ContentSynthesizer for TemplateSynthesizer {
    async fn synthesize_post(
        &self,
        agent: &Agent,
        profile: &Profile,
        diary_context: Option<&str>,
    ) -> Result<String, SynthError> {
        let salt = diary_context.map_or(0, str::len);
        let topic = Self::pick_topic(profile, salt);
        let bang = Self::exclaim(profile);
        let mut body = match profile.tone {
            ToneCategory::Cheerful => {
                format!("Best day ever thinking about {topic}{bang}")
            }
            ToneCategory::Gentle => {
                format!(
                    "A quiet moment with {topic} here in {place}{bang}",
                    place = agent.location
                )
            }
            ToneCategory::Cool => format!("{topic}. that's it{bang}"),
            ToneCategory::Childlike => {
                format!("{topic}?? {topic}!! can we, can we{bang}")
            }
            ToneCategory::Formal => {
                format!("I should like to report a fine session of {topic} today{bang}")
            }
        };
        if let Some(phrase) = Self::catchphrase(profile, salt) {
            body.push(' ');
            body.push_str(phrase);
        }
        Ok(body)
    }

    async fn synthesize_comment(
        &self,
        target_author_name: &str,
        profile: &Profile,
        target_text: &str,
    ) -> Result<String, SynthError> {
        let salt = target_text.len();
        let topic = Self::pick_topic(profile, salt);
        let bang = Self::exclaim(profile);
        let body = match profile.tone {
            ToneCategory::Cheerful => {
                format!("{target_author_name}, this is amazing{bang} Reminds me of {topic}{bang}")
            }
            ToneCategory::Gentle => {
                format!("How lovely, {target_author_name}. It makes me think of {topic}{bang}")
            }
            ToneCategory::Cool => format!("noted, {target_author_name}{bang}"),
            ToneCategory::Childlike => {
                format!("{target_author_name}{bang} me too, me too{bang} also {topic}{bang}")
            }
            ToneCategory::Formal => {
                format!("Well said, {target_author_name}. A fine observation on {topic}{bang}")
            }
        };
        Ok(body)
    }

    async fn synthesize_report(
        &self,
        agent: &Agent,
        profile: &Profile,
        counts: ActionCounts,
        distressed: bool,
    ) -> Result<String, SynthError> {
        let mood = if distressed {
            "was a little out of sorts"
        } else {
            match profile.tone {
                ToneCategory::Cheerful | ToneCategory::Childlike => "had a wonderful time",
                ToneCategory::Gentle => "had a peaceful day",
                ToneCategory::Cool => "kept it low-key",
                ToneCategory::Formal => "conducted the day with decorum",
            }
        };
        Ok(format!(
            "{name} {mood} today: {posts} posts, {likes} likes, {comments} comments, {reposts} reposts.",
            name = agent.name,
            posts = counts.posts,
            likes = counts.likes,
            comments = counts.comments,
            reposts = counts.reposts,
        ))
    }
}
