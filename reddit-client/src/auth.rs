use chrono::Utc;
use kloner_core::{AppConfig, CoreError, RedditApiError};
use oauth2::basic::{BasicClient, BasicErrorResponse};
use oauth2::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use oauth2::{
    AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, RequestTokenError,
    TokenResponse, TokenUrl,
};
use reqwest::header::USER_AGENT;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Tokens are treated as expired this long before the upstream deadline.
pub const EXPIRY_MARGIN_MILLIS: i64 = 60_000;

/// Lifetime assumed when the token response omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3_600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at_epoch_millis: i64,
}

impl AccessToken {
    pub fn issued_at(value: String, now_millis: i64, expires_in_secs: u64) -> Self {
        Self {
            value,
            expires_at_epoch_millis: now_millis + (expires_in_secs as i64) * 1_000
                - EXPIRY_MARGIN_MILLIS,
        }
    }

    pub fn is_valid_at(&self, now_millis: i64) -> bool {
        now_millis < self.expires_at_epoch_millis
    }

    pub fn remaining_secs_at(&self, now_millis: i64) -> u64 {
        ((self.expires_at_epoch_millis - now_millis) / 1_000).max(0) as u64
    }
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Holds the single current token. Shared by every caller of a [`TokenProvider`].
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: RwLock<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn valid_at(&self, now_millis: i64) -> Option<AccessToken> {
        self.slot
            .read()
            .await
            .as_ref()
            .filter(|token| token.is_valid_at(now_millis))
            .cloned()
    }

    pub async fn snapshot(&self) -> Option<AccessToken> {
        self.slot.read().await.clone()
    }

    /// Stores `token` unless the cache already holds one that lives longer.
    /// Returns whichever token is cached afterwards.
    pub async fn store(&self, token: AccessToken) -> AccessToken {
        let mut slot = self.slot.write().await;
        match slot.as_ref() {
            Some(existing) if existing.expires_at_epoch_millis > token.expires_at_epoch_millis => {
                debug!("Keeping cached token, it outlives the refreshed one");
                existing.clone()
            }
            _ => {
                *slot = Some(token.clone());
                token
            }
        }
    }

    pub async fn clear(&self) {
        *self.slot.write().await = None;
    }
}

#[derive(Debug, Clone)]
pub struct TokenProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    pub token_url: String,
    pub authorize_url: String,
    pub timeout: Option<Duration>,
}

impl TokenProviderConfig {
    pub fn from_app_config(config: &AppConfig) -> Result<Self, CoreError> {
        let (client_id, client_secret) = config.reddit_credentials()?;
        Ok(Self {
            client_id,
            client_secret,
            user_agent: config.user_agent.clone(),
            token_url: config.endpoints.token_url.clone(),
            authorize_url: config.endpoints.authorize_url.clone(),
            timeout: config.http_timeout(),
        })
    }
}

/// Client-credentials token source backed by an injected [`TokenCache`].
///
/// A cache miss refreshes without holding the cache lock, so concurrent misses
/// may each hit the identity endpoint. The refreshes are idempotent and the
/// cache keeps the longest-lived result.
#[derive(Debug)]
pub struct TokenProvider {
    oauth: BasicClient,
    http: reqwest::Client,
    user_agent: String,
    cache: Arc<TokenCache>,
}

impl TokenProvider {
    pub fn new(config: TokenProviderConfig, cache: Arc<TokenCache>) -> Result<Self, CoreError> {
        let invalid = |field: &str, e: oauth2::url::ParseError| {
            CoreError::Config(kloner_core::ConfigError::InvalidValue {
                field: field.to_string(),
                value: e.to_string(),
            })
        };

        let oauth = BasicClient::new(
            ClientId::new(config.client_id),
            Some(ClientSecret::new(config.client_secret)),
            AuthUrl::new(config.authorize_url).map_err(|e| invalid("authorize_url", e))?,
            Some(TokenUrl::new(config.token_url).map_err(|e| invalid("token_url", e))?),
        );

        let mut builder = reqwest::Client::builder().user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            oauth,
            http,
            user_agent: config.user_agent,
            cache,
        })
    }

    pub fn from_app_config(config: &AppConfig, cache: Arc<TokenCache>) -> Result<Self, CoreError> {
        Self::new(TokenProviderConfig::from_app_config(config)?, cache)
    }

    pub async fn get_access_token(&self) -> Result<AccessToken, CoreError> {
        self.get_access_token_at(now_millis()).await
    }

    pub async fn get_access_token_at(&self, now_millis: i64) -> Result<AccessToken, CoreError> {
        if let Some(token) = self.cache.valid_at(now_millis).await {
            debug!("Using cached Reddit access token");
            return Ok(token);
        }

        info!("Requesting new Reddit access token");
        let (value, expires_in) = self.request_token().await?;
        let token = AccessToken::issued_at(value, now_millis, expires_in);
        let stored = self.cache.store(token).await;
        info!("Reddit access token acquired and cached");
        Ok(stored)
    }

    async fn request_token(&self) -> Result<(String, u64), CoreError> {
        let status = Arc::new(AtomicU16::new(0));
        let http = self.http.clone();
        let user_agent = self.user_agent.clone();
        let recorded = Arc::clone(&status);

        let result = self
            .oauth
            .exchange_client_credentials()
            .request_async(move |request| send_token_request(http, user_agent, recorded, request))
            .await;

        match result {
            Ok(response) => {
                let expires_in = response
                    .expires_in()
                    .map(|lifetime| lifetime.as_secs())
                    .unwrap_or(DEFAULT_EXPIRES_IN_SECS);
                Ok((response.access_token().secret().clone(), expires_in))
            }
            Err(e) => Err(map_token_error(status.load(Ordering::SeqCst), e)),
        }
    }
}

async fn send_token_request(
    http: reqwest::Client,
    user_agent: String,
    status: Arc<AtomicU16>,
    request: HttpRequest,
) -> Result<HttpResponse, CoreError> {
    let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes()).map_err(|e| {
        CoreError::InvalidInput {
            message: format!("invalid token request method: {e}"),
        }
    })?;

    let mut builder = http
        .request(method, request.url.as_str())
        .header(USER_AGENT, user_agent)
        .body(request.body);
    for (name, value) in request.headers.iter() {
        builder = builder.header(name.as_str(), value.as_bytes());
    }

    let response = builder.send().await.map_err(|e| {
        error!("Token request to {} failed: {}", request.url, e);
        CoreError::Network(e)
    })?;

    let status_code = response.status().as_u16();
    status.store(status_code, Ordering::SeqCst);
    debug!("Token endpoint responded with {}", status_code);

    let mut headers = HeaderMap::new();
    for (name, value) in response.headers() {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_str().as_bytes()),
            HeaderValue::from_bytes(value.as_bytes()),
        ) {
            headers.append(name, value);
        }
    }
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code: StatusCode::from_u16(status_code).unwrap_or(StatusCode::BAD_GATEWAY),
        headers,
        body,
    })
}

fn map_token_error(
    status_code: u16,
    error: RequestTokenError<CoreError, BasicErrorResponse>,
) -> CoreError {
    let rejected = status_code != 0 && !(200..300).contains(&status_code);

    let mapped = match error {
        RequestTokenError::Request(e) => return e,
        RequestTokenError::ServerResponse(response) => RedditApiError::TokenRejected {
            status_code: if rejected { status_code } else { 400 },
            body: response.to_string(),
        },
        RequestTokenError::Parse(e, body) => {
            let body_text = String::from_utf8_lossy(&body).into_owned();
            if rejected {
                RedditApiError::TokenRejected {
                    status_code,
                    body: body_text,
                }
            } else if !has_access_token(&body) {
                RedditApiError::MissingAccessToken
            } else {
                RedditApiError::AuthenticationFailed {
                    reason: format!("unreadable token response: {e}"),
                }
            }
        }
        RequestTokenError::Other(message) if rejected => RedditApiError::TokenRejected {
            status_code,
            body: message,
        },
        RequestTokenError::Other(message) => RedditApiError::AuthenticationFailed { reason: message },
    };

    warn!("Reddit token request failed: {}", mapped);
    CoreError::RedditApi(mapped)
}

fn has_access_token(body: &[u8]) -> bool {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("access_token").cloned())
        .is_some_and(|token| token.as_str().is_some_and(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_applies_safety_margin() {
        let token = AccessToken::issued_at("abc".to_string(), 1_000_000, 3_600);
        assert_eq!(token.expires_at_epoch_millis, 1_000_000 + 3_600_000 - 60_000);
        assert!(token.is_valid_at(1_000_000));
        assert!(!token.is_valid_at(token.expires_at_epoch_millis));
        assert_eq!(token.remaining_secs_at(1_000_000), 3_540);
        assert_eq!(token.remaining_secs_at(i64::MAX / 2), 0);
    }

    #[tokio::test]
    async fn test_cache_returns_only_unexpired_tokens() {
        let cache = TokenCache::new();
        assert!(cache.valid_at(0).await.is_none());

        cache
            .store(AccessToken {
                value: "t".to_string(),
                expires_at_epoch_millis: 5_000,
            })
            .await;
        assert_eq!(cache.valid_at(4_999).await.unwrap().value, "t");
        assert!(cache.valid_at(5_000).await.is_none());
        assert!(cache.snapshot().await.is_some());

        cache.clear().await;
        assert!(cache.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_cache_keeps_longest_lived_token() {
        let cache = TokenCache::new();
        let long = AccessToken {
            value: "long".to_string(),
            expires_at_epoch_millis: 10_000,
        };
        let short = AccessToken {
            value: "short".to_string(),
            expires_at_epoch_millis: 9_000,
        };

        cache.store(long.clone()).await;
        assert_eq!(cache.store(short).await, long);
        assert_eq!(cache.snapshot().await.unwrap().value, "long");
    }

    #[test]
    fn test_has_access_token() {
        assert!(has_access_token(br#"{"access_token":"x","expires_in":10}"#));
        assert!(!has_access_token(br#"{"expires_in":10}"#));
        assert!(!has_access_token(br#"{"access_token":""}"#));
        assert!(!has_access_token(b"<html>"));
    }
}
