use crate::error::*;
use tracing::{error, info, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::RedditApi(e) => {
                error!("Reddit API error details: {:?}", e);
            }
            CoreError::Fetch(e) => {
                error!("Fetch error details: {:?}", e);
            }
            CoreError::Llm(e) => {
                error!("LLM error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            CoreError::Proxy(e) => {
                error!("Proxy error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::RedditApi(e) => e.user_friendly_message(),
            CoreError::Fetch(e) => e.user_friendly_message(),
            CoreError::Llm(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Proxy(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::InvalidInput { message } => format!("Invalid input: {}", message),
            CoreError::RequestFailed { message, .. } => {
                format!("Request failed: {}", message)
            }
            _ => "An unexpected error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::RedditApi(_) => "REDDIT_API".to_string(),
            CoreError::Fetch(_) => "FETCH".to_string(),
            CoreError::Llm(_) => "LLM".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Proxy(_) => "PROXY".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::InvalidInput { .. } => "INVALID_INPUT".to_string(),
            CoreError::RequestFailed { .. } => "REQUEST_FAILED".to_string(),
        }
    }
}

impl ErrorExt for RedditApiError {
    fn log_error(&self) -> &Self {
        error!("RedditApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("RedditApiError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. }
            | RedditApiError::TokenRejected { .. }
            | RedditApiError::MissingAccessToken => {
                "Reddit authentication failed. Please check your credentials.".to_string()
            }
            RedditApiError::RateLimitExceeded { retry_after } => format!(
                "Too many requests. Please wait {} seconds before trying again.",
                retry_after
            ),
            RedditApiError::Forbidden { resource } => format!(
                "Access denied to {}. You may not have permission to view this content.",
                resource
            ),
            RedditApiError::PostNotFound { .. } => {
                "The requested post could not be found.".to_string()
            }
            RedditApiError::UnexpectedFormat { .. } | RedditApiError::NotJson { .. } => {
                "Reddit returned data in an unexpected format.".to_string()
            }
            _ => "Reddit API error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => "REDDIT_AUTH_FAILED".to_string(),
            RedditApiError::TokenRejected { .. } => "REDDIT_TOKEN_REJECTED".to_string(),
            RedditApiError::MissingAccessToken => "REDDIT_MISSING_TOKEN".to_string(),
            RedditApiError::RateLimitExceeded { .. } => "REDDIT_RATE_LIMIT".to_string(),
            RedditApiError::Forbidden { .. } => "REDDIT_FORBIDDEN".to_string(),
            RedditApiError::PostNotFound { .. } => "REDDIT_POST_NOT_FOUND".to_string(),
            RedditApiError::UnexpectedFormat { .. } => "REDDIT_UNEXPECTED_FORMAT".to_string(),
            RedditApiError::NotJson { .. } => "REDDIT_NOT_JSON".to_string(),
            RedditApiError::InvalidResponse { .. } => "REDDIT_INVALID_RESPONSE".to_string(),
            RedditApiError::ServerError { .. } => "REDDIT_SERVER_ERROR".to_string(),
        }
    }
}

impl ErrorExt for FetchError {
    fn log_error(&self) -> &Self {
        error!("FetchError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("FetchError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            FetchError::EmptyUrl => "Please paste a Reddit post URL.".to_string(),
            FetchError::InvalidUrl { url, .. } => {
                format!("'{}' does not look like a Reddit post URL.", url)
            }
            FetchError::AllStrategiesFailed { .. } => {
                format!("Error loading Reddit data: {}", self)
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            FetchError::EmptyUrl => "FETCH_EMPTY_URL".to_string(),
            FetchError::InvalidUrl { .. } => "FETCH_INVALID_URL".to_string(),
            FetchError::AllStrategiesFailed { .. } => "FETCH_ALL_STRATEGIES_FAILED".to_string(),
        }
    }
}

impl ErrorExt for LlmError {
    fn log_error(&self) -> &Self {
        error!("LlmError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("LlmError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            LlmError::AuthenticationFailed { provider } => format!(
                "Authentication failed for {}. Please check your API key.",
                provider
            ),
            LlmError::RateLimitExceeded { provider } => format!(
                "Rate limit exceeded for {}. Please wait before trying again.",
                provider
            ),
            LlmError::NoAudioData { .. } | LlmError::AudioDecodeFailed { .. } => {
                "Could not generate a voiceover with the AI.".to_string()
            }
            _ => "Could not generate a title with the AI.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            LlmError::AuthenticationFailed { .. } => "LLM_AUTH_FAILED".to_string(),
            LlmError::RateLimitExceeded { .. } => "LLM_RATE_LIMIT".to_string(),
            LlmError::GenerationFailed { .. } => "LLM_GENERATION_FAILED".to_string(),
            LlmError::EmptyResponse { .. } => "LLM_EMPTY_RESPONSE".to_string(),
            LlmError::NoAudioData { .. } => "LLM_NO_AUDIO".to_string(),
            LlmError::InvalidResponseFormat { .. } => "LLM_INVALID_RESPONSE".to_string(),
            LlmError::AudioDecodeFailed { .. } => "LLM_AUDIO_DECODE_FAILED".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file '{}' not found.", path)
            }
            ConfigError::MissingField { field } => {
                format!("Required configuration field '{}' is missing.", field)
            }
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
            ConfigError::MissingEnvironmentVariable { var_name } => format!(
                "Environment variable '{}' is required but not set.",
                var_name
            ),
            ConfigError::Parse(_) => {
                "Configuration file format is invalid. Please check the settings.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::MissingEnvironmentVariable { .. } => "CONFIG_MISSING_ENV_VAR".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

impl ErrorExt for ProxyError {
    fn log_error(&self) -> &Self {
        error!("ProxyError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ProxyError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ProxyError::UpstreamUnreachable { target, .. } => {
                format!("The proxy could not reach {}.", target)
            }
            ProxyError::NotConfigured { route, .. } => {
                format!("The proxy route {} is not configured.", route)
            }
            ProxyError::Bind { address, .. } => {
                format!("Could not start the proxy on {}.", address)
            }
            _ => "The proxy failed to relay the request.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            ProxyError::UpstreamUnreachable { .. } => "PROXY_UPSTREAM_UNREACHABLE".to_string(),
            ProxyError::BodyRead { .. } => "PROXY_BODY_READ".to_string(),
            ProxyError::ResponseBuild { .. } => "PROXY_RESPONSE_BUILD".to_string(),
            ProxyError::NotConfigured { .. } => "PROXY_NOT_CONFIGURED".to_string(),
            ProxyError::Bind { .. } => "PROXY_BIND".to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ErrorReporter;

impl ErrorReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn report_error(&self, error: &CoreError) {
        error.log_error();
        info!("Error code: {}", error.error_code());
        info!("User message: {}", error.user_friendly_message());
    }

    /// For failures the caller recovers from.
    pub fn report_warning(&self, error: &CoreError) {
        error.log_warn();
        info!("Error code: {}", error.error_code());
    }
}
