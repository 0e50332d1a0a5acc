use kloner_core::{
    AttemptFailure, ConfigError, CoreError, ErrorExt, ErrorReporter, FetchError, LlmError,
    ProxyError, RedditApiError,
};

#[test]
fn test_error_codes() {
    let reddit_error = CoreError::RedditApi(RedditApiError::MissingAccessToken);
    assert_eq!(reddit_error.error_code(), "REDDIT_API");

    let fetch_error = CoreError::Fetch(FetchError::EmptyUrl);
    assert_eq!(fetch_error.error_code(), "FETCH");

    let llm_error = CoreError::Llm(LlmError::EmptyResponse {
        provider: "gemini".to_string(),
    });
    assert_eq!(llm_error.error_code(), "LLM");

    let proxy_error = CoreError::Proxy(ProxyError::UpstreamUnreachable {
        target: "https://oauth.reddit.com".to_string(),
        reason: "connection refused".to_string(),
    });
    assert_eq!(proxy_error.error_code(), "PROXY");

    let config_error = CoreError::Config(ConfigError::MissingField {
        field: "api_key".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG");
}

#[test]
fn test_composite_fetch_error_keeps_every_attempt() {
    let error = FetchError::AllStrategiesFailed {
        attempts: vec![
            AttemptFailure {
                strategy: "direct".to_string(),
                reason: "status 403".to_string(),
            },
            AttemptFailure {
                strategy: "local-proxy".to_string(),
                reason: "connection refused".to_string(),
            },
        ],
    };

    let message = error.to_string();
    assert!(message.contains("[direct] status 403"));
    assert!(message.contains("[local-proxy] connection refused"));
    assert!(message.find("direct").unwrap() < message.find("local-proxy").unwrap());
}

#[test]
fn test_user_friendly_messages() {
    let reddit_error = CoreError::RedditApi(RedditApiError::TokenRejected {
        status_code: 401,
        body: "unauthorized".to_string(),
    });
    let message = reddit_error.user_friendly_message();
    assert!(message.contains("authentication failed"));

    let config_error = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "GEMINI_API_KEY".to_string(),
    });
    assert!(config_error
        .user_friendly_message()
        .contains("GEMINI_API_KEY"));

    let voice_error = CoreError::Llm(LlmError::NoAudioData {
        provider: "gemini".to_string(),
    });
    assert!(voice_error.user_friendly_message().contains("voiceover"));
}

#[test]
fn test_error_reporter() {
    let reporter = ErrorReporter::new();
    let error = CoreError::Fetch(FetchError::EmptyUrl);

    // This test just ensures the methods don't panic
    reporter.report_error(&error);
    reporter.report_warning(&error);
}
