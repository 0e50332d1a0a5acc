use crate::api;
use crate::post_url;
use kloner_core::{
    AppConfig, AttemptFailure, CoreError, ErrorExt, FetchError, RedditApiError, RedditPostRecord,
    DELETED_AUTHOR,
};
use reqwest::header::{ACCEPT, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, error, info, warn};

const BODY_PREVIEW_CHARS: usize = 80;

/// One way of reaching the upstream JSON API.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchStrategy {
    /// Straight to the public Reddit host.
    Direct { base: String },
    /// Through a running `kloner serve`, which adds the bearer token.
    LocalProxy { base: String },
    /// A CORS relay that returns the upstream document unchanged.
    Mirror { relay: String, upstream_base: String },
}

impl FetchStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            FetchStrategy::Direct { .. } => "direct",
            FetchStrategy::LocalProxy { .. } => "local-proxy",
            FetchStrategy::Mirror { .. } => "mirror",
        }
    }

    pub fn url_for(&self, path_and_query: &str) -> String {
        match self {
            FetchStrategy::Direct { base } => {
                format!("{}{}", base.trim_end_matches('/'), path_and_query)
            }
            FetchStrategy::LocalProxy { base } => {
                format!("{}/api/reddit{}", base.trim_end_matches('/'), path_and_query)
            }
            FetchStrategy::Mirror {
                relay,
                upstream_base,
            } => {
                let upstream = format!("{}{}", upstream_base.trim_end_matches('/'), path_and_query);
                let encoded: String = url::form_urlencoded::byte_serialize(upstream.as_bytes()).collect();
                format!("{relay}{encoded}")
            }
        }
    }

    /// The mirror is only worth trying for URLs that name a concrete post.
    fn requires_post_id(&self) -> bool {
        matches!(self, FetchStrategy::Mirror { .. })
    }
}

/// Loads a post by trying each strategy in order until one succeeds.
#[derive(Debug, Clone)]
pub struct PostFetcher {
    http: Client,
    strategies: Vec<FetchStrategy>,
}

impl PostFetcher {
    pub fn new(http: Client, strategies: Vec<FetchStrategy>) -> Self {
        Self { http, strategies }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        let mut builder = Client::builder().user_agent(&config.user_agent);
        if let Some(timeout) = config.http_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        let endpoints = &config.endpoints;
        let mut strategies = vec![FetchStrategy::Direct {
            base: endpoints.reddit_www.clone(),
        }];
        if let Some(base) = &endpoints.local_proxy {
            strategies.push(FetchStrategy::LocalProxy { base: base.clone() });
        }
        if let Some(relay) = &endpoints.mirror_relay {
            strategies.push(FetchStrategy::Mirror {
                relay: relay.clone(),
                upstream_base: endpoints.reddit_www.clone(),
            });
        }

        Ok(Self::new(http, strategies))
    }

    pub fn strategies(&self) -> &[FetchStrategy] {
        &self.strategies
    }

    pub async fn fetch_post(&self, url: &str) -> Result<RedditPostRecord, CoreError> {
        let json_path = post_url::json_api_path(url)?;
        let post_id = post_url::extract_post_id(url);
        info!("Fetching Reddit post {}", json_path);

        let mut attempts = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            if strategy.requires_post_id() && post_id.is_none() {
                debug!("Skipping {} strategy, no post id in {}", strategy.name(), url);
                continue;
            }

            match self.fetch_listing(strategy, &json_path).await {
                Ok(post) => {
                    info!("Loaded post {} via {}", post.id, strategy.name());
                    let avatar = self.fetch_author_avatar(strategy, &post.author).await;
                    return Ok(post.with_author_avatar(avatar));
                }
                Err(e) => {
                    warn!("Strategy {} failed", strategy.name());
                    e.log_warn();
                    attempts.push(AttemptFailure {
                        strategy: strategy.name().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(FetchError::AllStrategiesFailed { attempts }.into())
    }

    async fn fetch_listing(
        &self,
        strategy: &FetchStrategy,
        json_path: &str,
    ) -> Result<RedditPostRecord, CoreError> {
        let value = self.get_json(&strategy.url_for(json_path)).await?;
        api::parse_post_listing(value)
    }

    /// Best effort: any failure yields `None`, deleted authors are not looked up.
    pub async fn fetch_author_avatar(&self, strategy: &FetchStrategy, author: &str) -> Option<String> {
        if author.is_empty() || author == DELETED_AUTHOR {
            return None;
        }

        let path = format!("/user/{author}/about.json?{}", post_url::RAW_JSON_QUERY);
        let result = match self.get_json(&strategy.url_for(&path)).await {
            Ok(value) => api::parse_user_avatar(value),
            Err(e) => Err(e),
        };

        match result {
            Ok(avatar) => avatar,
            Err(e) => {
                debug!("No avatar for u/{}: {}", author, e);
                None
            }
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value, CoreError> {
        let start_time = Instant::now();
        debug!("GET {}", url);

        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                error!("Network error for {}: {}", url, e);
                CoreError::Network(e)
            })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());
        let body = response.text().await?;
        debug!("{} {} in {:?}", status, url, start_time.elapsed());

        if !status.is_success() {
            return Err(status_error(status, retry_after, url));
        }

        let trimmed = body.trim();
        if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
            return Err(RedditApiError::NotJson {
                status_code: status.as_u16(),
                preview: trimmed.chars().take(BODY_PREVIEW_CHARS).collect(),
            }
            .into());
        }

        serde_json::from_str(trimmed).map_err(|e| {
            RedditApiError::InvalidResponse {
                details: format!("malformed JSON: {e}"),
            }
            .into()
        })
    }
}

fn status_error(status: StatusCode, retry_after: Option<u64>, url: &str) -> CoreError {
    let error = match status.as_u16() {
        429 => RedditApiError::RateLimitExceeded {
            retry_after: retry_after.unwrap_or(60),
        },
        403 => RedditApiError::Forbidden {
            resource: url.to_string(),
        },
        404 => RedditApiError::PostNotFound {
            post_id: url.to_string(),
        },
        code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
        code => {
            return CoreError::RequestFailed {
                message: format!("Post could not be loaded (status {code})"),
                status_code: Some(code),
            }
        }
    };
    CoreError::RedditApi(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_urls() {
        let path = "/r/test/comments/abc123/title/.json?raw_json=1";

        let direct = FetchStrategy::Direct {
            base: "https://www.reddit.com/".to_string(),
        };
        assert_eq!(
            direct.url_for(path),
            "https://www.reddit.com/r/test/comments/abc123/title/.json?raw_json=1"
        );

        let proxy = FetchStrategy::LocalProxy {
            base: "http://localhost:3001".to_string(),
        };
        assert_eq!(
            proxy.url_for(path),
            "http://localhost:3001/api/reddit/r/test/comments/abc123/title/.json?raw_json=1"
        );

        let mirror = FetchStrategy::Mirror {
            relay: "https://corsproxy.io/?".to_string(),
            upstream_base: "https://www.reddit.com".to_string(),
        };
        assert_eq!(
            mirror.url_for(path),
            "https://corsproxy.io/?https%3A%2F%2Fwww.reddit.com%2Fr%2Ftest%2Fcomments%2Fabc123%2Ftitle%2F.json%3Fraw_json%3D1"
        );
    }

    #[test]
    fn test_default_strategy_order() {
        let fetcher = PostFetcher::from_config(&AppConfig::default()).unwrap();
        let names: Vec<_> = fetcher.strategies().iter().map(FetchStrategy::name).collect();
        assert_eq!(names, vec!["direct", "local-proxy", "mirror"]);
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, Some(7), "u"),
            CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 7 })
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, None, "u"),
            CoreError::RedditApi(RedditApiError::ServerError { status_code: 502 })
        ));
        assert!(matches!(
            status_error(StatusCode::IM_A_TEAPOT, None, "u"),
            CoreError::RequestFailed {
                status_code: Some(418),
                ..
            }
        ));
    }
}
