use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedditAward {
    pub id: String,
    pub name: String,
    pub count: u32,
    pub icon_url: String,
}

/// Flat projection of an upstream post, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedditPostRecord {
    pub id: String,
    pub title: String,
    pub selftext: String,
    pub author: String,
    pub subreddit: String,
    pub subreddit_name_prefixed: String,
    pub score: i64,
    pub num_comments: u64,
    pub created_utc: i64,
    pub permalink: String,
    pub all_awardings: Vec<RedditAward>,
    pub author_avatar: Option<String>,
    pub link_flair_text: Option<String>,
    pub total_awards_received: u32,
    pub upvote_ratio: f64,
    pub gilded: u32,
}

impl RedditPostRecord {
    pub fn with_author_avatar(mut self, avatar: Option<String>) -> Self {
        self.author_avatar = avatar;
        self
    }

    pub fn has_deleted_author(&self) -> bool {
        self.author.is_empty() || self.author == DELETED_AUTHOR
    }
}

pub const DELETED_AUTHOR: &str = "[deleted]";

/// A post together with the AI-generated title shown on the second card.
#[derive(Debug, Clone, Serialize)]
pub struct ClonedPost {
    pub post: RedditPostRecord,
    pub ai_title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TitleProviderKind {
    #[default]
    Gemini,
    Perplexity,
}

impl std::str::FromStr for TitleProviderKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "perplexity" => Ok(Self::Perplexity),
            other => Err(format!("unknown title provider '{other}'")),
        }
    }
}
