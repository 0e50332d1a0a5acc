use kloner_core::{CoreError, RedditApiError, RedditAward, RedditPostRecord};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, error};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    #[serde(default)]
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    #[serde(default)]
    pub kind: String,
    pub data: T,
}

/// Post object as the upstream API sends it. Fields the cards cannot do
/// without are required; everything decorative is defaulted.
#[derive(Debug, Clone, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: Option<String>,
    pub author: String,
    pub subreddit: String,
    #[serde(default)]
    pub subreddit_name_prefixed: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub num_comments: Option<u64>,
    pub created_utc: f64,
    pub permalink: String,
    #[serde(default, deserialize_with = "lenient_awardings")]
    pub all_awardings: Vec<RedditAward>,
    #[serde(default)]
    pub link_flair_text: Option<String>,
    #[serde(default)]
    pub total_awards_received: Option<u32>,
    #[serde(default)]
    pub upvote_ratio: Option<f64>,
    #[serde(default)]
    pub gilded: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedditUserAbout {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub snoovatar_img: Option<String>,
    #[serde(default)]
    pub icon_img: Option<String>,
}

impl RedditUserAbout {
    /// Snoovatar if set, else the classic icon, without its query string.
    pub fn avatar_url(&self) -> Option<String> {
        [&self.snoovatar_img, &self.icon_img]
            .into_iter()
            .flatten()
            .map(|url| url.trim())
            .find(|url| !url.is_empty())
            .and_then(|url| url.split('?').next())
            .map(str::to_string)
    }
}

#[derive(Debug, Deserialize)]
struct RawAward {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    count: Option<u32>,
    #[serde(default)]
    icon_url: Option<String>,
}

fn lenient_awardings<'de, D>(deserializer: D) -> Result<Vec<RedditAward>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RawAward>(item).ok())
        .map(|award| RedditAward {
            id: award.id.unwrap_or_default(),
            name: award.name,
            count: award.count.unwrap_or(1),
            icon_url: award.icon_url.unwrap_or_default(),
        })
        .collect())
}

impl From<RedditPostData> for RedditPostRecord {
    fn from(post_data: RedditPostData) -> Self {
        let subreddit_name_prefixed = post_data
            .subreddit_name_prefixed
            .unwrap_or_else(|| format!("r/{}", post_data.subreddit));

        Self {
            id: post_data.id,
            title: post_data.title,
            selftext: post_data.selftext.unwrap_or_default(),
            author: post_data.author,
            subreddit: post_data.subreddit,
            subreddit_name_prefixed,
            score: post_data.score.unwrap_or(0),
            num_comments: post_data.num_comments.unwrap_or(0),
            created_utc: post_data.created_utc as i64,
            permalink: post_data.permalink,
            all_awardings: post_data.all_awardings,
            author_avatar: None,
            link_flair_text: post_data.link_flair_text,
            total_awards_received: post_data.total_awards_received.unwrap_or(0),
            upvote_ratio: post_data.upvote_ratio.unwrap_or(0.0),
            gilded: post_data.gilded.unwrap_or(0),
        }
    }
}

/// Human-readable name of a JSON value's shape, used in format errors.
pub fn describe_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(items) if items.is_empty() => "empty array",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Extracts the post from a comments-page response: `[listing, comments]`
/// where `listing.data.children[0].data` is the post.
pub fn parse_post_listing(value: Value) -> Result<RedditPostRecord, CoreError> {
    let items = match value {
        Value::Array(items) if !items.is_empty() => items,
        other => {
            return Err(RedditApiError::UnexpectedFormat {
                shape: describe_shape(&other).to_string(),
            }
            .into())
        }
    };

    let Some(first) = items.into_iter().next() else {
        return Err(RedditApiError::UnexpectedFormat {
            shape: "empty array".to_string(),
        }
        .into());
    };
    let listing: RedditListing<Value> = serde_json::from_value(first).map_err(|e| {
        error!("Failed to parse listing envelope: {}", e);
        RedditApiError::UnexpectedFormat {
            shape: format!("array without a listing envelope ({e})"),
        }
    })?;

    let child = listing.data.children.into_iter().next().ok_or_else(|| {
        RedditApiError::UnexpectedFormat {
            shape: "listing without children".to_string(),
        }
    })?;
    if !child.data.is_object() {
        return Err(RedditApiError::UnexpectedFormat {
            shape: format!("post data as {}", describe_shape(&child.data)),
        }
        .into());
    }

    let post_data: RedditPostData = serde_json::from_value(child.data).map_err(|e| {
        error!("Failed to parse post data: {}", e);
        RedditApiError::InvalidResponse {
            details: format!("post object is incomplete: {e}"),
        }
    })?;

    debug!("Parsed post {} from r/{}", post_data.id, post_data.subreddit);
    Ok(post_data.into())
}

/// Reads the avatar URL out of a `/user/<name>/about.json` response.
pub fn parse_user_avatar(value: Value) -> Result<Option<String>, CoreError> {
    let about: RedditListingChild<RedditUserAbout> =
        serde_json::from_value(value).map_err(|e| RedditApiError::InvalidResponse {
            details: format!("user about response: {e}"),
        })?;
    Ok(about.data.avatar_url())
}
