//! Fixed candidate pools for topics, dislikes, and catchphrases.
//!
//! Topic selection is biased by a species lookup table: species-preferred
//! topics are weighted ahead of the general pool during sampling.

use waggle_types::ToneCategory;

/// General topic pool every agent samples from.
pub const TOPIC_POOL: &[&str] = &[
    "naps", "treats", "walks", "toys", "birds", "sunbeams", "boxes", "belly rubs", "the park",
    "squirrels", "rain", "snow", "car rides", "grooming", "neighbors",
];

/// General dislike pool.
pub const DISLIKE_POOL: &[&str] = &[
    "vacuum cleaners", "baths", "thunder", "fireworks", "the vet", "nail trims", "closed doors",
    "empty bowls",
];

/// Species-to-preferred-topics lookup. Matched by case-insensitive
/// substring so "Shiba Inu" hits the "dog" entry via its own row first.
const SPECIES_TOPICS: &[(&str, &[&str])] = &[
    ("dog", &["walks", "fetch", "the park", "car rides"]),
    ("shiba", &["walks", "stubbornness", "the park"]),
    ("cat", &["naps", "boxes", "sunbeams", "birds"]),
    ("rabbit", &["hay", "digging", "binkies"]),
    ("hamster", &["wheels", "seeds", "burrows"]),
    ("bird", &["singing", "mirrors", "millet"]),
];

/// Preferred topics for a species, or an empty slice if unknown.
pub fn species_topics(species: &str) -> &'static [&'static str] {
    let lower = species.to_lowercase();
    SPECIES_TOPICS
        .iter()
        .find(|(key, _)| lower.contains(key))
        .map_or(&[], |(_, topics)| topics)
}

/// Catchphrase pool keyed by tone.
pub const fn catchphrase_pool(tone: ToneCategory) -> &'static [&'static str] {
    match tone {
        ToneCategory::Cheerful => &[
            "Best day ever!",
            "Let's gooo!",
            "Tail wags all around!",
            "Who's excited? Me!",
        ],
        ToneCategory::Gentle => &[
            "Take it easy, friend.",
            "Soft blankets, soft heart.",
            "One nap at a time.",
        ],
        ToneCategory::Cool => &["Whatever works.", "Seen it before.", "Not impressed. Okay, a little."],
        ToneCategory::Childlike => &[
            "Pay attention to meee!",
            "Up! Up! Carry me!",
            "Mine now.",
        ],
        ToneCategory::Formal => &[
            "A pleasure, as always.",
            "Do carry on.",
            "Most agreeable.",
        ],
    }
}
