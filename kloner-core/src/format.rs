//! Display helpers for post cards.

/// Compact score/comment counts: `1.5M`, `2.5k`, `42`.
pub fn format_number(num: i64) -> String {
    if num >= 1_000_000 {
        format!("{:.1}M", num as f64 / 1_000_000.0)
    } else if num >= 1_000 {
        format!("{:.1}k", num as f64 / 1_000.0)
    } else {
        num.to_string()
    }
}

/// Relative age of a post created at `created_utc`, measured at `now_utc` (both epoch seconds).
pub fn format_time_ago(created_utc: i64, now_utc: i64) -> String {
    let diff = now_utc - created_utc;

    if diff < 60 {
        "just now".to_string()
    } else if diff < 3_600 {
        format!("{}m", diff / 60)
    } else if diff < 86_400 {
        format!("{}h", diff / 3_600)
    } else if diff < 2_592_000 {
        format!("{}d", diff / 86_400)
    } else if diff < 31_536_000 {
        format!("{}mo", diff / 2_592_000)
    } else {
        format!("{}y", diff / 31_536_000)
    }
}

/// Upvote ratio (0..1) as a whole percentage.
pub fn format_upvote_ratio(ratio: f64) -> String {
    format!("{}%", (ratio.clamp(0.0, 1.0) * 100.0).round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_thresholds() {
        assert_eq!(format_number(1_500_000), "1.5M");
        assert_eq!(format_number(2_500), "2.5k");
        assert_eq!(format_number(42), "42");
        assert_eq!(format_number(1_000), "1.0k");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(-12), "-12");
    }

    #[test]
    fn test_format_time_ago_buckets() {
        let now = 1_700_000_000;
        assert_eq!(format_time_ago(now - 30, now), "just now");
        assert_eq!(format_time_ago(now - 125, now), "2m");
        assert_eq!(format_time_ago(now - 7_200, now), "2h");
        assert_eq!(format_time_ago(now - 3 * 86_400, now), "3d");
        assert_eq!(format_time_ago(now - 2 * 2_592_000, now), "2mo");
        assert_eq!(format_time_ago(now - 2 * 31_536_000, now), "2y");
    }

    #[test]
    fn test_format_upvote_ratio() {
        assert_eq!(format_upvote_ratio(0.934), "93%");
        assert_eq!(format_upvote_ratio(0.0), "0%");
        assert_eq!(format_upvote_ratio(1.4), "100%");
    }
}
