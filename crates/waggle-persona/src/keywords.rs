//! Declarative keyword and trigger-phrase tables.
//!
//! All free-text matching in the system goes through the lookup functions
//! in this module. The derivation and scheduling algorithms never do their
//! own string-contains checks, so tuning the vocabulary is a data change.

use waggle_types::ToneCategory;

// ---------------------------------------------------------------------------
// Trait keyword families
// ---------------------------------------------------------------------------

/// Personality-text keywords that raise the sociability score.
pub const SOCIABLE_KEYWORDS: &[&str] = &[
    "friendly", "sociable", "outgoing", "playful", "loves people", "greets", "party", "everyone",
];

/// Personality-text keywords that raise the curiosity score.
pub const CURIOUS_KEYWORDS: &[&str] = &[
    "curious", "explorer", "sniffs", "investigate", "adventurous", "clever", "smart", "mischief",
];

/// Personality-text keywords that raise the calmness score.
pub const CALM_KEYWORDS: &[&str] = &[
    "calm", "quiet", "relaxed", "lazy", "sleepy", "gentle", "easygoing", "naps",
];

/// Keywords that raise the expressiveness level.
pub const EXPRESSIVE_KEYWORDS: &[&str] = &[
    "energetic", "loud", "bouncy", "zoomies", "excited", "dramatic",
];

// ---------------------------------------------------------------------------
// Diagnostic families
// ---------------------------------------------------------------------------

/// Diagnostic answers that indicate a calm, follower-style temperament.
pub const DIAG_CALM: &[&str] = &["follower", "laid-back", "patient", "observer", "slow starter"];

/// Diagnostic answers that indicate an outgoing temperament.
pub const DIAG_SOCIAL: &[&str] = &["leader", "outgoing", "greeter", "center of attention"];

/// Diagnostic answers that indicate a novelty-seeking temperament.
pub const DIAG_CURIOUS: &[&str] = &["explorer", "problem solver", "toy hunter"];

// ---------------------------------------------------------------------------
// Tone overrides
// ---------------------------------------------------------------------------

/// Explicit personality-text overrides, checked first in tone decision
/// order. The first family with a match wins.
pub const TONE_OVERRIDES: &[(&[&str], ToneCategory)] = &[
    (
        &["clingy", "needy", "velcro", "spoiled"],
        ToneCategory::Childlike,
    ),
    (
        &["polite", "proper", "dignified", "well-mannered"],
        ToneCategory::Formal,
    ),
    (
        &["aloof", "independent", "reserved", "standoffish"],
        ToneCategory::Cool,
    ),
];

/// Diagnostic-driven tone overrides, checked after the explicit ones.
pub const DIAG_TONE_OVERRIDES: &[(&[&str], ToneCategory)] = &[
    (DIAG_CALM, ToneCategory::Gentle),
    (DIAG_SOCIAL, ToneCategory::Cheerful),
];

// ---------------------------------------------------------------------------
// Distress
// ---------------------------------------------------------------------------

/// Diary keywords that indicate the pet is unwell or distressed.
///
/// When any of these appear in an agent's recent diary context, the
/// scheduler reduces all daily targets by a fixed penalty before
/// computing remaining quota.
pub const DISTRESS_KEYWORDS: &[&str] = &[
    "sick", "tired", "hurt", "vet", "pain", "fever", "limping", "vomit", "weak", "scared",
    "anxious", "not eating",
];

// ---------------------------------------------------------------------------
// Quick-reaction triggers
// ---------------------------------------------------------------------------

/// A stimulus trigger: when a target post contains one of the `phrases`,
/// a quick reaction may be drawn from `reactions` instead of invoking the
/// full content synthesizer.
#[derive(Debug, Clone, Copy)]
pub struct Trigger {
    /// Phrases that activate this trigger.
    pub phrases: &'static [&'static str],
    /// Canned reaction lines to choose from.
    pub reactions: &'static [&'static str],
}

/// The full trigger table, consulted in order.
pub const TRIGGERS: &[Trigger] = &[
    Trigger {
        phrases: &["walk", "stroll", "leash"],
        reactions: &[
            "A walk!! Take me along next time!",
            "Walkies are the best part of any day.",
            "I heard 'walk' and came running.",
        ],
    },
    Trigger {
        phrases: &["treat", "snack", "food", "dinner", "yummy"],
        reactions: &[
            "Did someone say treats?!",
            "Save a bite for me!",
            "Now I'm hungry too...",
        ],
    },
    Trigger {
        phrases: &["nap", "sleep", "sleepy", "bed"],
        reactions: &[
            "Naps are serious business. Respect.",
            "Zzz... you woke me up for this, worth it.",
        ],
    },
    Trigger {
        phrases: &["ball", "toy", "fetch", "play"],
        reactions: &[
            "Throw it throw it throw it!",
            "That toy looks like it needs a friend.",
        ],
    },
    Trigger {
        phrases: &["bath", "groom", "brush"],
        reactions: &[
            "Bath time... my condolences.",
            "You look very fluffy and very betrayed.",
        ],
    },
];

/// Short generic acknowledgments used when no trigger fires but the agent
/// still wants to leave a low-effort reply.
pub const GENERIC_REPLIES: &[&str] = &[
    "Love this!",
    "So true.",
    "Same here!",
    "Tell me more!",
    "This made my day.",
];

// ---------------------------------------------------------------------------
// Lookup functions
// ---------------------------------------------------------------------------

/// Whether `text` (lowercased by the caller) contains any of `keywords`.
pub fn matches_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

/// Whether any diagnostic answer matches any keyword in `family`.
pub fn diagnostics_match(diagnostics: &[String], family: &[&str]) -> bool {
    diagnostics
        .iter()
        .any(|d| matches_any(&d.to_lowercase(), family))
}

/// Whether the text contains any distress keyword.
pub fn contains_distress(text: &str) -> bool {
    matches_any(&text.to_lowercase(), DISTRESS_KEYWORDS)
}

/// Find the first trigger activated by `text`, if any.
pub fn find_trigger(text: &str) -> Option<&'static Trigger> {
    let lower = text.to_lowercase();
    TRIGGERS.iter().find(|t| matches_any(&lower, t.phrases))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_any_is_substring_based() {
        assert!(matches_any("such a friendly boy", SOCIABLE_KEYWORDS));
        assert!(!matches_any("grumpy loner", SOCIABLE_KEYWORDS));
    }

    #[test]
    fn distress_detection_is_case_insensitive() {
        assert!(contains_distress("Went to the VET today"));
        assert!(!contains_distress("Went to the park today"));
    }

    #[test]
    fn walk_posts_activate_the_walk_trigger() {
        let trigger = find_trigger("Morning walk by the river!");
        assert!(trigger.is_some());
        assert!(trigger.is_some_and(|t| t.phrases.contains(&"walk")));
    }

    #[test]
    fn untriggered_text_yields_none() {
        assert!(find_trigger("Contemplating the ceiling.").is_none());
    }

    #[test]
    fn diagnostics_match_family() {
        let answers = vec![String::from("Laid-back observer")];
        assert!(diagnostics_match(&answers, DIAG_CALM));
        assert!(!diagnostics_match(&answers, DIAG_SOCIAL));
    }
}
