use kloner_core::{format_number, format_time_ago, format_upvote_ratio, RedditPostRecord};
use std::fmt::Write;

const BODY_PREVIEW_CHARS: usize = 280;

/// Plain-text rendering of a post card. `now` is epoch seconds.
pub fn post_card(post: &RedditPostRecord, title: &str, now: i64) -> String {
    let mut card = String::new();
    let _ = writeln!(
        card,
        "{} · u/{} · {}",
        post.subreddit_name_prefixed,
        post.author,
        format_time_ago(post.created_utc, now)
    );
    if let Some(flair) = post.link_flair_text.as_deref().filter(|flair| !flair.is_empty()) {
        let _ = writeln!(card, "[{flair}]");
    }
    let _ = writeln!(card, "{title}");

    if !post.selftext.is_empty() {
        let preview: String = post.selftext.chars().take(BODY_PREVIEW_CHARS).collect();
        let ellipsis = if post.selftext.chars().count() > BODY_PREVIEW_CHARS { "..." } else { "" };
        let _ = writeln!(card, "{preview}{ellipsis}");
    }

    let _ = write!(
        card,
        "▲ {} ({} upvoted) · 💬 {}",
        format_number(post.score),
        format_upvote_ratio(post.upvote_ratio),
        format_number(post.num_comments as i64)
    );
    if post.total_awards_received > 0 {
        let _ = write!(card, " · 🏆 {}", post.total_awards_received);
    }
    if let Some(avatar) = &post.author_avatar {
        let _ = write!(card, "\navatar: {avatar}");
    }
    card
}
