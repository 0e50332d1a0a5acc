//! Prompts and response cleanup for short-form video titles.

use regex::Regex;
use std::sync::OnceLock;

pub const MAX_TITLE_CHARS: usize = 100;
pub const BODY_EXCERPT_CHARS: usize = 500;

pub const PERPLEXITY_SYSTEM_PROMPT: &str =
    "You are a viral social media expert specializing in TikTok content.";

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

pub fn gemini_title_prompt(title: &str, body: &str) -> String {
    format!(
        r#"Act as a viral social media expert specializing in TikTok. Your goal is to create a highly engaging, provocative, and clickable title for a TikTok video based on a Reddit post.

**Constraints:**
- The title MUST be in English.
- The title MUST be {MAX_TITLE_CHARS} characters or less.
- The title should be formatted in a way that sparks curiosity, like a classic "AITA" (Am I The A**hole) post title.
- Do NOT use emojis.
- Do NOT include hashtags.
- Do NOT add quotation marks around the title.

**Reddit Post Title:** "{title}"

**Reddit Post Body (excerpt):**
"{}..."

Now, generate the perfect viral TikTok title."#,
        excerpt(body)
    )
}

pub fn perplexity_title_prompt(title: &str, body: &str) -> String {
    format!(
        r#"Create a viral TikTok title for a Reddit post.

STRICT RULES:
- Output ONLY the title text, nothing else
- Maximum {MAX_TITLE_CHARS} characters
- No emojis, no hashtags, no quotation marks
- No explanations, no sources, no additional text
- Format like AITA posts to spark curiosity

Reddit Post: "{title}"
Content: "{}..."

Output only the title:"#,
        excerpt(body)
    )
}

/// Trims, then removes at most one leading and one trailing double quote.
pub fn strip_wrapping_quotes(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_leading = trimmed.strip_prefix('"').unwrap_or(trimmed);
    without_leading
        .strip_suffix('"')
        .unwrap_or(without_leading)
        .to_string()
}

fn explanation_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)\s+This title.*",
            r"(?i)\s+The title.*",
            r"(?i)\s+It's.*",
            r"\s+\[.*\].*$",
            r"(?i)\s+Sources?:.*",
        ]
        .into_iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    })
}

/// Reduces a chatty completion to a bare title of at most [`MAX_TITLE_CHARS`].
pub fn clean_perplexity_title(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix(['"', '\''])
        .unwrap_or(trimmed);
    let unquoted = unquoted.strip_suffix(['"', '\'']).unwrap_or(unquoted);

    let mut title = unquoted.lines().next().unwrap_or_default().to_string();
    for pattern in explanation_patterns() {
        title = pattern.replace(&title, "").into_owned();
    }

    let title = title.trim();
    if title.chars().count() > MAX_TITLE_CHARS {
        title
            .chars()
            .take(MAX_TITLE_CHARS)
            .collect::<String>()
            .trim()
            .to_string()
    } else {
        title.to_string()
    }
}
