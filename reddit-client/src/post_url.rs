//! Turning a pasted post link into the JSON endpoint path.

use kloner_core::FetchError;
use url::Url;

pub const RAW_JSON_QUERY: &str = "raw_json=1";

/// Trims, drops query string and fragment, and completes a missing scheme.
/// Applying it twice gives the same result as applying it once.
pub fn normalize_post_url(raw: &str) -> Result<String, FetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FetchError::EmptyUrl);
    }

    let end = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
    let without_query = &trimmed[..end];

    if without_query.contains("://") {
        Ok(without_query.to_string())
    } else {
        Ok(format!("https://{without_query}"))
    }
}

fn parse(raw: &str) -> Result<Url, FetchError> {
    let normalized = normalize_post_url(raw)?;
    Url::parse(&normalized).map_err(|e| FetchError::InvalidUrl {
        url: raw.trim().to_string(),
        reason: e.to_string(),
    })
}

/// `/r/<sub>/comments/<id>/<slug>/.json?raw_json=1` for a post URL on any host.
pub fn json_api_path(raw: &str) -> Result<String, FetchError> {
    let url = parse(raw)?;
    let mut path = url.path().to_string();

    if let Some(stripped) = path.strip_suffix(".json") {
        path = stripped.to_string();
    }
    if path.is_empty() || path == "/" {
        return Err(FetchError::InvalidUrl {
            url: raw.trim().to_string(),
            reason: "URL has no post path".to_string(),
        });
    }
    if !path.ends_with('/') {
        path.push('/');
    }

    Ok(format!("{path}.json?{RAW_JSON_QUERY}"))
}

/// Post id from `/comments/<id>/...`, or from a `redd.it/<id>` short link.
pub fn extract_post_id(raw: &str) -> Option<String> {
    let url = parse(raw).ok()?;
    let segments: Vec<&str> = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .collect();

    if url.host_str() == Some("redd.it") {
        return segments.first().map(|id| id.to_string());
    }

    segments
        .iter()
        .position(|segment| *segment == "comments")
        .and_then(|index| segments.get(index + 1))
        .map(|id| id.trim_end_matches(".json").to_string())
        .filter(|id| !id.is_empty())
}
