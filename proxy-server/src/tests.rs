#[cfg(test)]
mod tests {
    use crate::{router, ProxyState, UpstreamTargets};
    use axum::body::{to_bytes, Body, Bytes};
    use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};
    use axum::response::Response;
    use axum::routing::post;
    use axum::{Json, Router};
    use reddit_client::{TokenCache, TokenProvider, TokenProviderConfig};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    async fn spawn_mock(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn header(headers: &HeaderMap, name: &str) -> Value {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(|value| Value::String(value.to_string()))
            .unwrap_or(Value::Null)
    }

    async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> (StatusCode, Json<Value>) {
        let status = if uri.path().starts_with("/missing") {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::OK
        };
        let echoed = json!({
            "method": method.as_str(),
            "path": uri.path(),
            "query": uri.query(),
            "authorization": header(&headers, "authorization"),
            "user_agent": header(&headers, "user-agent"),
            "accept": header(&headers, "accept"),
            "body": String::from_utf8_lossy(&body),
        });
        (status, Json(echoed))
    }

    /// Upstream double for the identity, API and completion hosts.
    async fn spawn_upstream(token_status: StatusCode) -> (String, Arc<AtomicUsize>) {
        let token_hits = Arc::new(AtomicUsize::new(0));
        let hits = Arc::clone(&token_hits);
        let router = Router::new()
            .route(
                "/api/v1/access_token",
                post(move || {
                    let hits = Arc::clone(&hits);
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        if token_status.is_success() {
                            (
                                token_status,
                                Json(json!({"access_token": "app-token", "token_type": "bearer", "expires_in": 3600})),
                            )
                        } else {
                            (token_status, Json(json!({"message": "Unauthorized", "error": 401})))
                        }
                    }
                }),
            )
            .fallback(echo);
        (spawn_mock(router).await, token_hits)
    }

    fn token_provider(base: &str) -> Arc<TokenProvider> {
        let config = TokenProviderConfig {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            user_agent: "kloner-proxy-tests/1.0".to_string(),
            token_url: format!("{base}/api/v1/access_token"),
            authorize_url: format!("{base}/api/v1/authorize"),
            timeout: Some(Duration::from_secs(5)),
        };
        Arc::new(TokenProvider::new(config, Arc::new(TokenCache::new())).unwrap())
    }

    fn proxy_state(base: &str, tokens: Option<Arc<TokenProvider>>, perplexity_key: Option<&str>) -> ProxyState {
        ProxyState {
            tokens,
            http: reqwest::Client::new(),
            targets: UpstreamTargets {
                reddit_oauth: base.to_string(),
                reddit_www: base.to_string(),
                perplexity: base.to_string(),
            },
            user_agent: "kloner-proxy-tests/1.0".to_string(),
            perplexity_api_key: perplexity_key.map(str::to_string),
        }
    }

    async fn send(state: ProxyState, request: Request<Body>) -> Response {
        router(state).oneshot(request).await.unwrap()
    }

    async fn get_request(state: ProxyState, uri: &str) -> Response {
        send(state, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    async fn json_body(response: Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn header_str<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
        response.headers().get(name).and_then(|value| value.to_str().ok())
    }

    #[tokio::test]
    async fn test_token_endpoint_returns_remaining_lifetime() {
        let (base, hits) = spawn_upstream(StatusCode::OK).await;
        let state = proxy_state(&base, Some(token_provider(&base)), None);

        let response = get_request(state.clone(), "/api/reddit-token").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["token"], "app-token");
        let expires_in = body["expires_in"].as_u64().unwrap();
        assert!((3_530..=3_540).contains(&expires_in));

        let response = get_request(state, "/api/reddit-token").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_token_endpoint_passes_upstream_rejection() {
        let (base, _) = spawn_upstream(StatusCode::UNAUTHORIZED).await;
        let state = proxy_state(&base, Some(token_provider(&base)), None);

        let response = get_request(state, "/api/reddit-token").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Failed to get Reddit token");
        assert!(body["details"].as_str().unwrap().contains("Unauthorized"));
    }

    #[tokio::test]
    async fn test_token_endpoint_without_credentials() {
        let (base, _) = spawn_upstream(StatusCode::OK).await;
        let response = get_request(proxy_state(&base, None, None), "/api/reddit-token").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_reddit_forward_adds_bearer_and_cors() {
        let (base, _) = spawn_upstream(StatusCode::OK).await;
        let state = proxy_state(&base, Some(token_provider(&base)), None);

        let response = get_request(state, "/api/reddit/r/test/comments/abc/.json?raw_json=1").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_str(&response, "access-control-allow-origin"), Some("*"));
        assert_eq!(
            header_str(&response, "access-control-allow-methods"),
            Some("GET, OPTIONS")
        );
        assert_eq!(header_str(&response, "access-control-allow-headers"), Some("*"));

        let echoed = json_body(response).await;
        assert_eq!(echoed["path"], "/r/test/comments/abc/.json");
        assert_eq!(echoed["query"], "raw_json=1");
        assert_eq!(echoed["authorization"], "Bearer app-token");
        assert_eq!(echoed["user_agent"], "kloner-proxy-tests/1.0");
        assert_eq!(echoed["accept"], "application/json");
    }

    #[tokio::test]
    async fn test_reddit_forward_degrades_without_token() {
        let (base, hits) = spawn_upstream(StatusCode::UNAUTHORIZED).await;
        let state = proxy_state(&base, Some(token_provider(&base)), None);

        let response = get_request(state, "/api/reddit/r/test/about.json").await;
        assert_eq!(response.status(), StatusCode::OK);
        let echoed = json_body(response).await;
        assert_eq!(echoed["authorization"], Value::Null);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_upstream_error_status_is_preserved() {
        let (base, _) = spawn_upstream(StatusCode::OK).await;
        let response = get_request(proxy_state(&base, None, None), "/api/reddit-www/missing/post.json").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(header_str(&response, "access-control-allow-origin"), Some("*"));
    }

    #[tokio::test]
    async fn test_www_forward_uses_browser_agent() {
        let (base, _) = spawn_upstream(StatusCode::OK).await;
        let response = get_request(
            proxy_state(&base, Some(token_provider(&base)), None),
            "/api/reddit-www/user/someone/about.json",
        )
        .await;
        let echoed = json_body(response).await;
        assert!(echoed["user_agent"].as_str().unwrap().starts_with("Mozilla/5.0"));
        assert_eq!(echoed["authorization"], Value::Null);
    }

    #[tokio::test]
    async fn test_preflight_answered_locally() {
        let (base, hits) = spawn_upstream(StatusCode::OK).await;
        let state = proxy_state(&base, Some(token_provider(&base)), None);

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/reddit/r/test/.json")
            .body(Body::empty())
            .unwrap();
        let response = send(state, request).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(header_str(&response, "access-control-allow-origin"), Some("*"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_perplexity_forward_uses_api_key() {
        let (base, _) = spawn_upstream(StatusCode::OK).await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/perplexity/chat/completions")
            .header("content-type", "application/json")
            .header("authorization", "Bearer client-supplied")
            .body(Body::from(r#"{"model":"sonar"}"#))
            .unwrap();

        let response = send(proxy_state(&base, None, Some("pplx-key")), request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            header_str(&response, "access-control-allow-methods"),
            Some("POST, OPTIONS")
        );
        let echoed = json_body(response).await;
        assert_eq!(echoed["method"], "POST");
        assert_eq!(echoed["path"], "/chat/completions");
        assert_eq!(echoed["authorization"], "Bearer pplx-key");
        assert_eq!(echoed["body"], r#"{"model":"sonar"}"#);
    }

    #[tokio::test]
    async fn test_perplexity_without_key_is_unavailable() {
        let (base, _) = spawn_upstream(StatusCode::OK).await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/perplexity/chat/completions")
            .body(Body::empty())
            .unwrap();
        let response = send(proxy_state(&base, None, None), request).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_a_proxy_error() {
        let state = proxy_state("http://127.0.0.1:1", None, None);
        let response = get_request(state, "/api/reddit-www/r/test/.json").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Proxy error");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_token_and_error_responses_allow_any_origin() {
        let (base, _) = spawn_upstream(StatusCode::OK).await;
        let response = get_request(
            proxy_state(&base, Some(token_provider(&base)), None),
            "/api/reddit-token",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_str(&response, "access-control-allow-origin"), Some("*"));

        let response = get_request(proxy_state(&base, None, None), "/api/reddit-token").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(header_str(&response, "access-control-allow-origin"), Some("*"));

        let response = get_request(proxy_state("http://127.0.0.1:1", None, None), "/api/reddit-www/r/test/.json").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(header_str(&response, "access-control-allow-origin"), Some("*"));
    }

    #[tokio::test]
    async fn test_percent_escapes_reach_upstream() {
        let (base, _) = spawn_upstream(StatusCode::OK).await;
        let response = get_request(
            proxy_state(&base, None, None),
            "/api/reddit-www/r/test/comments/abc/why%3F/.json?raw_json=1",
        )
        .await;
        let echoed = json_body(response).await;
        assert_eq!(echoed["path"], "/r/test/comments/abc/why%3F/.json");
        assert_eq!(echoed["query"], "raw_json=1");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sigterm_stops_the_server() {
        let waiting = tokio::spawn(crate::shutdown_signal());
        tokio::time::sleep(Duration::from_millis(200)).await;

        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), waiting)
            .await
            .expect("shutdown signal did not resolve")
            .unwrap();
    }
}
