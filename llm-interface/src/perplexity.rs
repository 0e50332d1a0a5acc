use crate::title::{clean_perplexity_title, perplexity_title_prompt, PERPLEXITY_SYSTEM_PROMPT};
use crate::{http_client, read_body, TitleGenerator};
use kloner_core::{AppConfig, ConfigError, CoreError, LlmError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const PROVIDER: &str = "Perplexity";
pub const MODEL: &str = "sonar";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl ChatCompletionRequest {
    pub fn for_title(title: &str, body: &str) -> Self {
        Self {
            model: MODEL.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: PERPLEXITY_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: perplexity_title_prompt(title, body),
                },
            ],
            max_tokens: 150,
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Chat-completions client. `base_url` may point at the upstream API or at
/// the `/api/perplexity` route of the local proxy.
#[derive(Debug, Clone)]
pub struct PerplexityClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
}

impl PerplexityClient {
    pub fn new(http: Client, api_key: Option<String>, base_url: String) -> Self {
        Self {
            http,
            api_key,
            base_url,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        let api_key = config.perplexity_api_key.clone().ok_or_else(|| {
            ConfigError::MissingEnvironmentVariable {
                var_name: "PERPLEXITY_API_KEY".to_string(),
            }
        })?;
        Ok(Self::new(
            http_client(config)?,
            Some(api_key),
            config.endpoints.perplexity.clone(),
        ))
    }
}

impl TitleGenerator for PerplexityClient {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    async fn generate_title(&self, title: &str, body: &str) -> Result<String, CoreError> {
        info!("Generating title with {} model {}", PROVIDER, MODEL);
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let mut request = self
            .http
            .post(&url)
            .json(&ChatCompletionRequest::for_title(title, body));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let raw = read_body(PROVIDER, request.send().await?).await?;
        let response: ChatCompletionResponse = serde_json::from_str(&raw).map_err(|_| {
            LlmError::InvalidResponseFormat {
                provider: PROVIDER.to_string(),
            }
        })?;

        let content = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();
        debug!("Raw {} completion: {}", PROVIDER, content);

        let cleaned = clean_perplexity_title(&content);
        if cleaned.is_empty() {
            return Err(LlmError::EmptyResponse {
                provider: PROVIDER.to_string(),
            }
            .into());
        }
        Ok(cleaned)
    }
}
