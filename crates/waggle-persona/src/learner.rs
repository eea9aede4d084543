//! Incremental topic learning.
//!
//! Whenever an agent produces or consumes text, the learner extracts
//! candidate vocabulary and, with a probability proportional to the
//! agent's curiosity, folds exactly one novel token into the agent's
//! long-term learned-topic list. The list is bounded; the oldest entry
//! is evicted when the cap is exceeded.

use rand::Rng;
use waggle_types::TRAIT_MAX;

/// Filler and grammatical tokens never learned as topics.
const TOKEN_BLOCKLIST: &[&str] = &[
    "the", "and", "for", "with", "this", "that", "was", "are", "you", "have", "had", "has",
    "just", "today", "very", "really", "then", "than", "but", "not", "all", "too", "out", "its",
    "will", "when", "what", "where", "from", "they", "them", "she", "his", "her", "our", "your",
    "got", "get", "about", "into", "some", "there", "here", "been", "did", "does", "also",
];

/// Minimum token length considered a candidate topic.
const MIN_TOKEN_LEN: usize = 3;

/// Extract learnable tokens from `text`: lowercased, alphanumeric runs of
/// at least [`MIN_TOKEN_LEN`] characters, excluding pure numbers and the
/// block list.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|tok| tok.chars().count() >= MIN_TOKEN_LEN)
        .filter(|tok| !tok.chars().all(|c| c.is_ascii_digit()))
        .filter(|tok| !TOKEN_BLOCKLIST.contains(tok))
        .map(ToOwned::to_owned)
        .collect()
}

/// Maybe fold one novel token from `text` into `learned`.
///
/// The fold happens with probability `curiosity / TRAIT_MAX`. At most one
/// token is learned per call; if the list exceeds `cap` afterwards, the
/// oldest entry is evicted. Returns the learned token, if any.
pub fn learn_from_text(
    learned: &mut Vec<String>,
    curiosity: u8,
    cap: usize,
    text: &str,
    rng: &mut impl Rng,
) -> Option<String> {
    let candidates: Vec<String> = tokenize(text)
        .into_iter()
        .filter(|tok| !learned.contains(tok))
        .collect();
    if candidates.is_empty() {
        return None;
    }

    let roll: u8 = rng.random_range(0..TRAIT_MAX);
    if roll >= curiosity {
        return None;
    }

    let idx = rng.random_range(0..candidates.len());
    let token = candidates.get(idx)?.clone();
    learned.push(token.clone());
    while learned.len() > cap {
        learned.remove(0);
    }
    Some(token)
}
