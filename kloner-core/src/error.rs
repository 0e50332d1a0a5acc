use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Reddit API error: {0}")]
    RedditApi(#[from] RedditApiError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Proxy error: {0}")]
    Proxy(#[from] ProxyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Request failed: {message}")]
    RequestFailed {
        message: String,
        status_code: Option<u16>,
    },
}

#[derive(Error, Debug, Clone)]
pub enum RedditApiError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Token endpoint rejected the request with status {status_code}: {body}")]
    TokenRejected { status_code: u16, body: String },

    #[error("Token response did not contain an access token")]
    MissingAccessToken,

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden { resource: String },

    #[error("Post not found: {post_id}")]
    PostNotFound { post_id: String },

    #[error("Unexpected data format from Reddit: received {shape}")]
    UnexpectedFormat { shape: String },

    #[error("Response was not JSON (status {status_code}): {preview}")]
    NotJson { status_code: u16, preview: String },

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },
}

/// A single failed strategy inside a post fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptFailure {
    pub strategy: String,
    pub reason: String,
}

#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("URL must not be empty")]
    EmptyUrl,

    #[error("Invalid post URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Could not load the Reddit post: {}", describe_attempts(.attempts))]
    AllStrategiesFailed { attempts: Vec<AttemptFailure> },
}

fn describe_attempts(attempts: &[AttemptFailure]) -> String {
    if attempts.is_empty() {
        return "no strategy was attempted".to_string();
    }
    attempts
        .iter()
        .map(|attempt| format!("[{}] {}", attempt.strategy, attempt.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Provider authentication failed: {provider}")]
    AuthenticationFailed { provider: String },

    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded { provider: String },

    #[error("Generation failed for {provider}: {reason}")]
    GenerationFailed { provider: String, reason: String },

    #[error("{provider} returned an empty result")]
    EmptyResponse { provider: String },

    #[error("No audio data received from {provider}")]
    NoAudioData { provider: String },

    #[error("Invalid response format from {provider}")]
    InvalidResponseFormat { provider: String },

    #[error("Audio payload could not be decoded: {reason}")]
    AudioDecodeFailed { reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Environment variable not set: {var_name}")]
    MissingEnvironmentVariable { var_name: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Upstream {target} unreachable: {reason}")]
    UpstreamUnreachable { target: String, reason: String },

    #[error("Failed to read upstream body from {target}: {reason}")]
    BodyRead { target: String, reason: String },

    #[error("Failed to build response: {reason}")]
    ResponseBuild { reason: String },

    #[error("Upstream {route} is not configured: {reason}")]
    NotConfigured { route: String, reason: String },

    #[error("Failed to bind {address}: {reason}")]
    Bind { address: String, reason: String },
}
