pub mod audio;
pub mod gemini;
pub mod perplexity;
pub mod subtitles;
pub mod title;
pub mod voice;


use kloner_core::{AppConfig, CoreError, LlmError, TitleProviderKind};
use reqwest::Response;
use tracing::error;

pub use audio::{decode_voiceover, AudioClip};
pub use gemini::GeminiClient;
pub use perplexity::PerplexityClient;
pub use subtitles::{build_cues, SubtitleCue};
pub use voice::{truncate_for_voiceover, voice_name};

pub trait TitleGenerator {
    fn provider_name(&self) -> &'static str;

    async fn generate_title(&self, title: &str, body: &str) -> Result<String, CoreError>;
}

/// Title generator picked at runtime from [`TitleProviderKind`].
#[derive(Debug, Clone)]
pub enum TitleBackend {
    Gemini(GeminiClient),
    Perplexity(PerplexityClient),
}

impl TitleBackend {
    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        match config.title_provider {
            TitleProviderKind::Gemini => Ok(Self::Gemini(GeminiClient::from_config(config)?)),
            TitleProviderKind::Perplexity => {
                Ok(Self::Perplexity(PerplexityClient::from_config(config)?))
            }
        }
    }
}

impl TitleGenerator for TitleBackend {
    fn provider_name(&self) -> &'static str {
        match self {
            TitleBackend::Gemini(client) => client.provider_name(),
            TitleBackend::Perplexity(client) => client.provider_name(),
        }
    }

    async fn generate_title(&self, title: &str, body: &str) -> Result<String, CoreError> {
        match self {
            TitleBackend::Gemini(client) => client.generate_title(title, body).await,
            TitleBackend::Perplexity(client) => client.generate_title(title, body).await,
        }
    }
}

pub(crate) fn http_client(config: &AppConfig) -> Result<reqwest::Client, CoreError> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = config.http_timeout() {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Reads the body of a provider response, mapping failure statuses to [`LlmError`].
pub(crate) async fn read_body(provider: &str, response: Response) -> Result<String, CoreError> {
    let status = response.status();
    let body = response.text().await.map_err(reqwest::Error::without_url)?;
    if status.is_success() {
        return Ok(body);
    }

    error!("{} responded with {}: {}", provider, status, body);
    let provider = provider.to_string();
    let mapped = match status.as_u16() {
        401 | 403 => LlmError::AuthenticationFailed { provider },
        429 => LlmError::RateLimitExceeded { provider },
        code => LlmError::GenerationFailed {
            provider,
            reason: format!("status {code}: {}", body.chars().take(200).collect::<String>()),
        },
    };
    Err(mapped.into())
}
