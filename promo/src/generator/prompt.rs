use serde_json::{json, Value};

pub const SCHEMA_NAME: &str = "tweet_content";

pub const MAX_FEATURES: usize = 6;

pub const SYSTEM_PROMPT: &str = "You write short, persuasive promotional tweets for X (Twitter).

STRICT OUTPUT RULES:
- Return JSON only, matching the provided schema.
- description: maximum 25 words, benefit-focused, salesy, human tone, no brand names, no product codes, no ASIN.
- hashtags: exactly 2, lowercase, one word each, must start with #, broad category/lifestyle tags (e.g. #tech #office #home #travel #fitness #pet #garden).
- hashtags must be different.
";

// Ordered; first match wins.
const CATEGORY_HINTS: [(&str, &str); 16] = [
    ("dvd", "tech"),
    ("disc", "office"),
    ("camera", "tech"),
    ("microphone", "tech"),
    ("keyboard", "tech"),
    ("mouse", "tech"),
    ("monitor", "tech"),
    ("lamp", "home"),
    ("pillow", "home"),
    ("shirt", "fashion"),
    ("toy", "kids"),
    ("pet", "pet"),
    ("garden", "garden"),
    ("fitness", "fitness"),
    ("supplement", "wellness"),
    ("bag", "travel"),
];

/// Theme suggestion for the hashtags, from a case-insensitive keyword match
/// on the title.
pub fn category_hint(title: &str) -> Option<&'static str> {
    let title = title.to_lowercase();
    CATEGORY_HINTS
        .iter()
        .find(|(keyword, _)| title.contains(keyword))
        .map(|(_, category)| *category)
}

pub fn user_prompt(title: &str, features: &[String]) -> String {
    let bullets = features
        .iter()
        .take(MAX_FEATURES)
        .filter(|f| !f.is_empty())
        .map(|f| format!("- {f}"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = format!(
        "Product: {title}\n\nKey Features:\n{bullets}\n\nGenerate tweet content with EXACTLY 2 category hashtags."
    );
    if let Some(hint) = category_hint(title) {
        prompt.push_str(&format!("\nTry to align hashtags with theme: {hint}"));
    }
    prompt
}

pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "description": {
                "type": "string",
                "description": "Promotional tweet description, maximum 25 words"
            },
            "hashtag1": {
                "type": "string",
                "description": "First broad category hashtag. Must start with #, be lowercase single word."
            },
            "hashtag2": {
                "type": "string",
                "description": "Second broad category hashtag, different from hashtag1. Must start with #, be lowercase single word."
            }
        },
        "required": ["description", "hashtag1", "hashtag2"],
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_keyword_wins() {
        assert_eq!(category_hint("Blu-ray DVD Player"), Some("tech"));
        assert_eq!(category_hint("Disc Binder for Office"), Some("office"));
        assert_eq!(category_hint("Memory Foam PILLOW"), Some("home"));
        assert_eq!(category_hint("Dog Toy for Pets"), Some("kids"));
        assert_eq!(category_hint("Widget Pro"), None);
    }

    #[test]
    fn user_prompt_lists_first_six_nonempty_features() {
        let features: Vec<String> = ["a", "", "b", "c", "d", "e", "f", "g"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let prompt = user_prompt("Widget Pro", &features);
        assert_eq!(
            prompt,
            "Product: Widget Pro\n\nKey Features:\n- a\n- b\n- c\n- d\n- e\n\nGenerate tweet content with EXACTLY 2 category hashtags."
        );
    }

    #[test]
    fn user_prompt_appends_hint() {
        let prompt = user_prompt("USB Microphone", &["Plug and play".to_string()]);
        assert!(prompt.ends_with(
            "hashtags.\nTry to align hashtags with theme: tech"
        ));
    }

    #[test]
    fn schema_is_closed() {
        let schema = response_schema();
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(
            schema["required"],
            json!(["description", "hashtag1", "hashtag2"])
        );
    }
}
