//! Canned caption table.
//!
//! Captions are a static lookup keyed by tone. There is no randomness and
//! no I/O: the same key always yields the same ordered list.

use serde::{Deserialize, Serialize};

/// Caption tone ("style" in the UI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionTone {
    #[default]
    Funny,
    Sarcastic,
    Motivational,
    Dark,
    Tech,
}

impl CaptionTone {
    pub const ALL: [CaptionTone; 5] = [
        CaptionTone::Funny,
        CaptionTone::Sarcastic,
        CaptionTone::Motivational,
        CaptionTone::Dark,
        CaptionTone::Tech,
    ];

    /// Resolve a tone key. Unknown keys yield `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "funny" => Some(Self::Funny),
            "sarcastic" => Some(Self::Sarcastic),
            "motivational" => Some(Self::Motivational),
            "dark" => Some(Self::Dark),
            "tech" => Some(Self::Tech),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Funny => "funny",
            Self::Sarcastic => "sarcastic",
            Self::Motivational => "motivational",
            Self::Dark => "dark",
            Self::Tech => "tech",
        }
    }

    /// The fixed caption list for this tone.
    pub fn captions(&self) -> &'static [&'static str] {
        match self {
            Self::Funny => FUNNY,
            Self::Sarcastic => SARCASTIC,
            Self::Motivational => MOTIVATIONAL,
            Self::Dark => DARK,
            Self::Tech => TECH,
        }
    }
}

/// A tone key that names no known tone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown caption tone: {0}")]
pub struct UnknownTone(pub String);

impl std::str::FromStr for CaptionTone {
    type Err = UnknownTone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| UnknownTone(s.to_string()))
    }
}

impl std::fmt::Display for CaptionTone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const FUNNY: &[&str] = &[
    "When you finally understand the JavaScript code you wrote 3 months ago.",
    "That moment when your code works on the first try and you have no idea why.",
    "Nobody: Me debugging at 3AM: *this image*",
    "How I look trying to explain programming to my non-tech friends.",
];

const SARCASTIC: &[&str] = &[
    "Oh sure, let me just quickly learn quantum physics while I'm waiting for this npm install.",
    "My face when someone says 'it should be an easy fix'.",
    "Wow, another Stack Overflow solution that's only 5 years outdated.",
    "Yeah, I totally meant to write that bug. It's a feature now.",
];

const MOTIVATIONAL: &[&str] = &[
    "Code like nobody's watching your GitHub commits.",
    "Every expert was once a beginner. Keep pushing forward.",
    "Bugs are just opportunities for improvement in disguise.",
    "Dream in code. Build with passion. Debug with patience.",
];

const DARK: &[&str] = &[
    "My code doesn't have bugs. It develops random unexpected features.",
    "The only thing darker than this meme is my code without comments.",
    "I told them I'd fix the bug. I never said when.",
    "How my soul looks after looking at legacy code.",
];

const TECH: &[&str] = &[
    "It works on my machine. Ship the machine.",
    "There are 10 kinds of people: those who read binary and those who don't.",
    "Turned it off and on again. Now it's a different problem.",
    "git commit -m 'final fix (for real this time)'",
];

/// Canned captions for a tone key, falling back to the funny list for
/// unknown keys.
pub fn generate_captions(style: &str) -> &'static [&'static str] {
    CaptionTone::from_key(style)
        .unwrap_or_default()
        .captions()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_from_str() {
        assert_eq!(" Tech ".parse::<CaptionTone>(), Ok(CaptionTone::Tech));
        assert_eq!(
            "wholesome".parse::<CaptionTone>(),
            Err(UnknownTone("wholesome".to_string()))
        );
    }

    #[test]
    fn test_every_tone_has_non_empty_captions() {
        for tone in CaptionTone::ALL {
            let captions = generate_captions(tone.as_str());
            assert!(!captions.is_empty(), "{tone} has no captions");
            assert!(captions.iter().all(|c| !c.trim().is_empty()));
        }
    }

    #[test]
    fn test_unknown_style_falls_back_to_funny() {
        assert_eq!(generate_captions("techjokes"), generate_captions("funny"));
        assert_eq!(generate_captions(""), FUNNY);
    }

    #[test]
    fn test_lookup_is_deterministic_and_case_insensitive() {
        assert_eq!(generate_captions("Tech"), generate_captions(" tech "));
        assert_eq!(generate_captions("dark")[0], DARK[0]);
    }

    #[test]
    fn test_canned_caption_wording() {
        assert_eq!(
            generate_captions("funny")[0],
            "When you finally understand the JavaScript code you wrote 3 months ago."
        );
        assert_eq!(
            generate_captions("sarcastic")[0],
            "Oh sure, let me just quickly learn quantum physics while I'm waiting for this npm install."
        );
        assert_eq!(
            generate_captions("sarcastic")[2],
            "Wow, another Stack Overflow solution that's only 5 years outdated."
        );
        assert_eq!(
            generate_captions("motivational")[0],
            "Code like nobody's watching your GitHub commits."
        );
        assert_eq!(
            generate_captions("dark")[3],
            "How my soul looks after looking at legacy code."
        );
    }

    #[test]
    fn test_tones_have_distinct_lists() {
        assert_ne!(generate_captions("funny"), generate_captions("tech"));
    }
}
