use crate::error::ConfigError;
use crate::types::TitleProviderKind;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_USER_AGENT: &str = "web:reddit-post-kloner:v1.0.0 (by /u/kloner-dev)";
pub const DEFAULT_CONFIG_FILE: &str = "kloner.toml";

/// Application settings: optional TOML file overlaid by environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub user_agent: String,
    pub gemini_api_key: Option<String>,
    pub perplexity_api_key: Option<String>,
    pub title_provider: TitleProviderKind,
    pub proxy: ProxyConfig,
    pub endpoints: EndpointConfig,
    pub streak_file: PathBuf,
    /// No timeout is applied to upstream calls unless this is set.
    pub http_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
}

/// Upstream base URLs. Overridable so tests and self-hosted mirrors can point elsewhere.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub reddit_www: String,
    pub reddit_oauth: String,
    pub token_url: String,
    pub authorize_url: String,
    pub perplexity: String,
    pub gemini: String,
    /// Base URL of a running `kloner serve`, used by the fetcher's proxy strategy.
    pub local_proxy: Option<String>,
    /// CORS relay used as the last fetch strategy; the upstream URL is appended url-encoded.
    pub mirror_relay: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            reddit_client_id: None,
            reddit_client_secret: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            gemini_api_key: None,
            perplexity_api_key: None,
            title_provider: TitleProviderKind::default(),
            proxy: ProxyConfig::default(),
            endpoints: EndpointConfig::default(),
            streak_file: PathBuf::from(".kloner-streak.json"),
            http_timeout_secs: None,
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            reddit_www: "https://www.reddit.com".to_string(),
            reddit_oauth: "https://oauth.reddit.com".to_string(),
            token_url: "https://www.reddit.com/api/v1/access_token".to_string(),
            authorize_url: "https://www.reddit.com/api/v1/authorize".to_string(),
            perplexity: "https://api.perplexity.ai".to_string(),
            gemini: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            local_proxy: Some("http://localhost:3001".to_string()),
            mirror_relay: Some("https://corsproxy.io/?".to_string()),
        }
    }
}

impl AppConfig {
    /// Loads the TOML file at `path` (or `kloner.toml` if it exists) and applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        let config = Self::from_toml(&raw)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Overlays environment values read through `lookup`. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(value) = get("REDDIT_CLIENT_ID") {
            self.reddit_client_id = Some(value);
        }
        if let Some(value) = get("REDDIT_CLIENT_SECRET") {
            self.reddit_client_secret = Some(value);
        }
        if let Some(value) = get("REDDIT_USER_AGENT") {
            self.user_agent = value;
        }
        if let Some(value) = get("GEMINI_API_KEY").or_else(|| get("API_KEY")) {
            self.gemini_api_key = Some(value);
        }
        if let Some(value) = get("PERPLEXITY_API_KEY") {
            self.perplexity_api_key = Some(value);
        }
        if let Some(value) = get("KLONER_TITLE_PROVIDER") {
            self.title_provider =
                value
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        field: "KLONER_TITLE_PROVIDER".to_string(),
                        value: value.clone(),
                    })?;
        }
        if let Some(value) = get("KLONER_PROXY_PORT") {
            self.proxy.port = value.parse().map_err(|_| ConfigError::InvalidValue {
                field: "KLONER_PROXY_PORT".to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(value) = get("KLONER_PROXY_URL") {
            self.endpoints.local_proxy = Some(value);
        }
        Ok(())
    }

    pub fn reddit_credentials(&self) -> Result<(String, String), ConfigError> {
        let client_id = self
            .reddit_client_id
            .clone()
            .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
                var_name: "REDDIT_CLIENT_ID".to_string(),
            })?;
        let client_secret = self.reddit_client_secret.clone().ok_or_else(|| {
            ConfigError::MissingEnvironmentVariable {
                var_name: "REDDIT_CLIENT_SECRET".to_string(),
            }
        })?;
        Ok((client_id, client_secret))
    }

    pub fn http_timeout(&self) -> Option<std::time::Duration> {
        self.http_timeout_secs.map(std::time::Duration::from_secs)
    }
}
