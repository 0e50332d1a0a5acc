//! Local reverse proxy in front of the Reddit and Perplexity APIs.
//!
//! Adds credentials the caller must not hold, rewrites CORS headers and
//! exposes the cached Reddit application token.

pub mod failure;
pub mod forward;
pub mod token;

mod tests;

use axum::http::HeaderValue;
use axum::middleware;
use axum::response::Response;
use axum::routing::{any, get};
use axum::Router;
use kloner_core::{AppConfig, CoreError, ErrorReporter, ProxyError};
use reddit_client::{TokenCache, TokenProvider};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

pub use failure::ProxyFailure;
pub use forward::Upstream;

/// Browser-like agent for the public www host, which rejects bot agents more often.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct UpstreamTargets {
    pub reddit_oauth: String,
    pub reddit_www: String,
    pub perplexity: String,
}

impl UpstreamTargets {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            reddit_oauth: config.endpoints.reddit_oauth.clone(),
            reddit_www: config.endpoints.reddit_www.clone(),
            perplexity: config.endpoints.perplexity.clone(),
        }
    }

    pub fn base_for(&self, upstream: Upstream) -> &str {
        match upstream {
            Upstream::RedditOauth => &self.reddit_oauth,
            Upstream::RedditWww => &self.reddit_www,
            Upstream::Perplexity => &self.perplexity,
        }
    }
}

/// Shared by every request handler. The token cache inside `tokens` is the
/// only mutable state of the process.
#[derive(Debug, Clone)]
pub struct ProxyState {
    pub tokens: Option<Arc<TokenProvider>>,
    pub http: reqwest::Client,
    pub targets: UpstreamTargets,
    pub user_agent: String,
    pub perplexity_api_key: Option<String>,
}

impl ProxyState {
    /// Missing Reddit credentials do not stop the proxy: the token route
    /// answers 503 and authenticated forwards go out without a bearer.
    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        let tokens = match TokenProvider::from_app_config(config, Arc::new(TokenCache::new())) {
            Ok(provider) => Some(Arc::new(provider)),
            Err(e @ CoreError::Config(_)) => {
                warn!("Reddit token provider disabled");
                ErrorReporter::new().report_warning(&e);
                None
            }
            Err(e) => return Err(e),
        };

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.http_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            tokens,
            http: builder.build()?,
            targets: UpstreamTargets::from_config(config),
            user_agent: config.user_agent.clone(),
            perplexity_api_key: config.perplexity_api_key.clone(),
        })
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/api/reddit-token", get(token::reddit_token))
        .route("/api/reddit/*path", any(forward::reddit_oauth))
        .route("/api/reddit-www/*path", any(forward::reddit_www))
        .route("/api/perplexity/*path", any(forward::perplexity))
        .layer(middleware::map_response(allow_any_origin))
        .with_state(state)
}

/// Every response is readable cross-origin, including local error bodies.
async fn allow_any_origin(mut response: Response) -> Response {
    response
        .headers_mut()
        .entry("access-control-allow-origin")
        .or_insert(HeaderValue::from_static("*"));
    response
}

pub async fn serve(config: &AppConfig) -> Result<(), CoreError> {
    let state = ProxyState::from_config(config)?;
    let address = format!("{}:{}", config.proxy.host, config.proxy.port);

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| ProxyError::Bind {
            address: address.clone(),
            reason: e.to_string(),
        })?;
    info!("Proxy server listening on http://{}", address);
    info!("Reddit token endpoint: http://{}/api/reddit-token", address);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Proxy server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl+C received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
}
