use crate::{ProxyFailure, ProxyState, BROWSER_USER_AGENT};
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use kloner_core::{ErrorExt, ProxyError};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Not forwarded in either direction. Lengths and encodings are recomputed
/// for the rebuilt message.
const SKIPPED_HEADERS: [&str; 11] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
    "accept-encoding",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    RedditOauth,
    RedditWww,
    Perplexity,
}

impl Upstream {
    pub fn label(&self) -> &'static str {
        match self {
            Upstream::RedditOauth => "reddit",
            Upstream::RedditWww => "reddit-www",
            Upstream::Perplexity => "perplexity",
        }
    }

    pub fn route_prefix(&self) -> &'static str {
        match self {
            Upstream::RedditOauth => "/api/reddit/",
            Upstream::RedditWww => "/api/reddit-www/",
            Upstream::Perplexity => "/api/perplexity/",
        }
    }

    pub fn allowed_methods(&self) -> &'static str {
        match self {
            Upstream::RedditOauth | Upstream::RedditWww => "GET, OPTIONS",
            Upstream::Perplexity => "POST, OPTIONS",
        }
    }
}

pub struct Forwarded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// `ANY /api/reddit/*path`, authenticated with the cached application token.
pub async fn reddit_oauth(
    State(state): State<ProxyState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = Forwarded::new(Upstream::RedditOauth, method, &uri, headers, body);
    if request.method == Method::OPTIONS {
        return preflight(Upstream::RedditOauth);
    }

    let bearer = match &state.tokens {
        Some(provider) => match provider.get_access_token().await {
            Ok(token) => Some(token.value),
            Err(e) => {
                warn!("Forwarding without a token, refresh failed");
                e.log_warn();
                None
            }
        },
        None => None,
    };

    let user_agent = state.user_agent.clone();
    respond(forward(&state, Upstream::RedditOauth, request, &user_agent, bearer.as_deref()).await)
}

/// `ANY /api/reddit-www/*path`, unauthenticated.
pub async fn reddit_www(
    State(state): State<ProxyState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = Forwarded::new(Upstream::RedditWww, method, &uri, headers, body);
    if request.method == Method::OPTIONS {
        return preflight(Upstream::RedditWww);
    }
    respond(forward(&state, Upstream::RedditWww, request, BROWSER_USER_AGENT, None).await)
}

/// `ANY /api/perplexity/*path`, authenticated with the configured API key.
pub async fn perplexity(
    State(state): State<ProxyState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = Forwarded::new(Upstream::Perplexity, method, &uri, headers, body);
    if request.method == Method::OPTIONS {
        return preflight(Upstream::Perplexity);
    }

    let Some(api_key) = state.perplexity_api_key.clone() else {
        return ProxyFailure::from(ProxyError::NotConfigured {
            route: "Perplexity".to_string(),
            reason: "PERPLEXITY_API_KEY is not set".to_string(),
        })
        .into_response();
    };

    let user_agent = state.user_agent.clone();
    respond(forward(&state, Upstream::Perplexity, request, &user_agent, Some(&api_key)).await)
}

impl Forwarded {
    /// The path is taken from the raw request URI, so percent-escapes reach
    /// the upstream unchanged.
    pub fn new(upstream: Upstream, method: Method, uri: &Uri, headers: HeaderMap, body: Bytes) -> Self {
        let raw = uri.path();
        Self {
            method,
            path: raw.strip_prefix(upstream.route_prefix()).unwrap_or(raw).to_string(),
            query: uri.query().map(str::to_string),
            headers,
            body,
        }
    }

    pub fn target_url(&self, base: &str) -> String {
        let mut url = format!(
            "{}/{}",
            base.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        );
        if let Some(query) = &self.query {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

fn respond(result: Result<Response, ProxyFailure>) -> Response {
    result.unwrap_or_else(IntoResponse::into_response)
}

fn is_skipped(name: &str) -> bool {
    SKIPPED_HEADERS.contains(&name)
}

fn cors_headers(upstream: Upstream) -> [(&'static str, &'static str); 3] {
    [
        ("access-control-allow-origin", "*"),
        ("access-control-allow-methods", upstream.allowed_methods()),
        ("access-control-allow-headers", "*"),
    ]
}

pub fn preflight(upstream: Upstream) -> Response {
    debug!("Answering {} preflight locally", upstream.label());
    (StatusCode::NO_CONTENT, cors_headers(upstream)).into_response()
}

async fn forward(
    state: &ProxyState,
    upstream: Upstream,
    request: Forwarded,
    user_agent: &str,
    bearer: Option<&str>,
) -> Result<Response, ProxyFailure> {
    let target = request.target_url(state.targets.base_for(upstream));
    let start_time = Instant::now();
    info!(
        "[{}] {} /{} -> {}{}",
        upstream.label(),
        request.method,
        request.path.trim_start_matches('/'),
        target,
        if bearer.is_some() { " (authenticated)" } else { "" }
    );

    let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes()).map_err(|e| {
        ProxyError::UpstreamUnreachable {
            target: target.clone(),
            reason: e.to_string(),
        }
    })?;

    let mut builder = state.http.request(method, &target);
    for (name, value) in request.headers.iter() {
        let name = name.as_str();
        if is_skipped(name) || matches!(name, "authorization" | "user-agent" | "accept" | "cookie") {
            continue;
        }
        builder = builder.header(name, value.as_bytes());
    }

    builder = builder.header(reqwest::header::USER_AGENT, user_agent);
    if upstream != Upstream::Perplexity {
        builder = builder.header(reqwest::header::ACCEPT, "application/json");
    } else if let Some(accept) = request.headers.get("accept") {
        builder = builder.header(reqwest::header::ACCEPT, accept.as_bytes());
    }
    if let Some(token) = bearer {
        builder = builder.bearer_auth(token);
    }
    if !request.body.is_empty() {
        builder = builder.body(request.body.to_vec());
    }

    let upstream_response = builder.send().await.map_err(|e| ProxyError::UpstreamUnreachable {
        target: target.clone(),
        reason: e.to_string(),
    })?;

    let status = upstream_response.status().as_u16();
    let upstream_headers = upstream_response.headers().clone();
    let body = upstream_response.bytes().await.map_err(|e| ProxyError::BodyRead {
        target: target.clone(),
        reason: e.to_string(),
    })?;

    if status >= 400 {
        error!(
            "[{}] upstream {} for {}: {}",
            upstream.label(),
            status,
            target,
            String::from_utf8_lossy(&body).chars().take(200).collect::<String>()
        );
    } else {
        debug!("[{}] {} in {:?}", upstream.label(), status, start_time.elapsed());
    }

    let mut response = Response::builder().status(
        StatusCode::from_u16(status).map_err(|e| ProxyError::ResponseBuild {
            reason: e.to_string(),
        })?,
    );
    if let Some(headers) = response.headers_mut() {
        for (name, value) in upstream_headers.iter() {
            let name = name.as_str();
            if is_skipped(name) || name.starts_with("access-control-") || name == "content-encoding" {
                continue;
            }
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_bytes(value.as_bytes()),
            ) {
                headers.append(name, value);
            }
        }
        for (name, value) in cors_headers(upstream) {
            headers.insert(name, HeaderValue::from_static(value));
        }
    }

    response
        .body(Body::from(body))
        .map_err(|e| ProxyError::ResponseBuild { reason: e.to_string() }.into())
}
