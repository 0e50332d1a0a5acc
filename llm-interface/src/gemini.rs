use crate::title::{gemini_title_prompt, strip_wrapping_quotes};
use crate::voice::voice_name;
use crate::{http_client, read_body, TitleGenerator};
use kloner_core::{AppConfig, ConfigError, CoreError, LlmError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const PROVIDER: &str = "Gemini";
pub const TITLE_MODEL: &str = "gemini-2.5-flash";
pub const TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<ContentRequest>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct ContentRequest {
    parts: Vec<PartRequest>,
}

#[derive(Debug, Serialize)]
struct PartRequest {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseModalities")]
    response_modalities: Vec<String>,
    #[serde(rename = "speechConfig")]
    speech_config: SpeechConfig,
}

#[derive(Debug, Serialize)]
struct SpeechConfig {
    #[serde(rename = "voiceConfig")]
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
struct VoiceConfig {
    #[serde(rename = "prebuiltVoiceConfig")]
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
struct PrebuiltVoiceConfig {
    #[serde(rename = "voiceName")]
    voice_name: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
    #[serde(rename = "inlineData", default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType", default)]
    mime_type: Option<String>,
    data: String,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[ContentPart] {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.as_slice())
            .unwrap_or_default()
    }
}

/// Google Gemini client for title text and speech.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(http: Client, api_key: String, base_url: String) -> Self {
        Self {
            http,
            api_key,
            base_url,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        let api_key = config.gemini_api_key.clone().ok_or_else(|| {
            ConfigError::MissingEnvironmentVariable {
                var_name: "GEMINI_API_KEY".to_string(),
            }
        })?;
        Ok(Self::new(
            http_client(config)?,
            api_key,
            config.endpoints.gemini.clone(),
        ))
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, CoreError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        );
        debug!("Calling {} model {}", PROVIDER, model);

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(request)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let body = read_body(PROVIDER, response).await?;

        serde_json::from_str(&body).map_err(|_| {
            LlmError::InvalidResponseFormat {
                provider: PROVIDER.to_string(),
            }
            .into()
        })
    }

    /// Returns the base64 PCM payload for `text` spoken in `voice_style`.
    pub async fn generate_voiceover(&self, text: &str, voice_style: &str) -> Result<String, CoreError> {
        let voice = voice_name(voice_style);
        info!("Generating voiceover with voice {}", voice);

        let request = GenerateContentRequest {
            contents: vec![ContentRequest {
                parts: vec![PartRequest {
                    text: text.to_string(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice.to_string(),
                        },
                    },
                },
            }),
        };

        let response = self.generate_content(TTS_MODEL, &request).await?;
        let audio = response
            .first_parts()
            .iter()
            .filter_map(|part| part.inline_data.as_ref())
            .find(|inline| !inline.data.is_empty())
            .ok_or_else(|| LlmError::NoAudioData {
                provider: PROVIDER.to_string(),
            })?;

        debug!(
            "Received audio payload ({})",
            audio.mime_type.as_deref().unwrap_or("unknown type")
        );
        Ok(audio.data.clone())
    }
}

impl TitleGenerator for GeminiClient {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    async fn generate_title(&self, title: &str, body: &str) -> Result<String, CoreError> {
        info!("Generating title with {}", TITLE_MODEL);
        let request = GenerateContentRequest {
            contents: vec![ContentRequest {
                parts: vec![PartRequest {
                    text: gemini_title_prompt(title, body),
                }],
            }],
            generation_config: None,
        };

        let response = self.generate_content(TITLE_MODEL, &request).await?;
        let text: String = response
            .first_parts()
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();

        let cleaned = strip_wrapping_quotes(&text);
        if cleaned.trim().is_empty() {
            return Err(LlmError::EmptyResponse {
                provider: PROVIDER.to_string(),
            }
            .into());
        }
        Ok(cleaned)
    }
}
