use serde::Deserialize;

use super::azure::GenerationError;

pub const MAX_DESCRIPTION_WORDS: usize = 25;

pub const DUPLICATE_REPLACEMENT: &str = "#lifestyle";

pub const FALLBACK_DESCRIPTION: &str =
    "Discover a must-have upgrade that makes everyday life easier—bring it home today!";
pub const FALLBACK_HASHTAGS: [&str; 2] = ["#home", "#lifestyle"];

/// A description plus exactly two category hashtags, ready to compose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetContent {
    pub description: String,
    pub hashtags: [String; 2],
}

#[derive(Debug, Deserialize)]
struct RawContent {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    hashtag1: Option<String>,
    #[serde(default)]
    hashtag2: Option<String>,
}

impl TweetContent {
    pub fn fallback() -> Self {
        Self {
            description: FALLBACK_DESCRIPTION.to_string(),
            hashtags: FALLBACK_HASHTAGS.map(str::to_string),
        }
    }

    /// Parse a model reply and normalize it: trimmed fields, lowercase
    /// `#`-prefixed hashtags that differ, at most 25 words of description.
    pub fn from_completion(raw: &str) -> Result<Self, GenerationError> {
        let parsed: RawContent = serde_json::from_str(raw.trim())?;

        let description = parsed.description.unwrap_or_default().trim().to_string();
        let hashtag1 = parsed.hashtag1.unwrap_or_default().trim().to_lowercase();
        let hashtag2 = parsed.hashtag2.unwrap_or_default().trim().to_lowercase();

        if description.is_empty() || hashtag1.is_empty() || hashtag2.is_empty() {
            return Err(GenerationError::Incomplete);
        }

        let hashtag1 = with_hash(hashtag1);
        let mut hashtag2 = with_hash(hashtag2);
        if hashtag1 == hashtag2 {
            hashtag2 = DUPLICATE_REPLACEMENT.to_string();
        }

        Ok(Self {
            description: truncate_words(&description, MAX_DESCRIPTION_WORDS),
            hashtags: [hashtag1, hashtag2],
        })
    }
}

fn with_hash(tag: String) -> String {
    if tag.starts_with('#') {
        tag
    } else {
        format!("#{tag}")
    }
}

// Only rewrites when over the limit, so shorter text keeps its spacing.
fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > max_words {
        words[..max_words].join(" ")
    } else {
        text.to_string()
    }
}
