use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Main configuration structure loaded from email_mentor.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Remote model settings shared by the analysis call and the chat session
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    pub model: String,
    pub api_base: String,
    /// Per-request timeout. There is no automatic retry.
    pub timeout_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// HTTP transport settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http_bind: std::net::SocketAddr,
    pub bearer_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_bind: std::net::SocketAddr::from(([127, 0, 0, 1], 8787)),
            bearer_token: None,
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub api_key: Option<String>,
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            log_level: "email_mentor=info,tower_http=info".to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn load_from_env() -> Self {
        let mut config = Self::default();

        // GEMINI_API_KEY wins; API_KEY is the name the hosted front-end used
        config.api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty());

        if let Ok(level) = std::env::var("MENTOR_LOG_LEVEL")
            && !level.trim().is_empty()
        {
            config.log_level = level;
        }

        config
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables.
    /// `path` wins over EMAIL_MENTOR_CONFIG, which defaults to "email_mentor.toml".
    pub fn load_from(path: Option<&str>) -> anyhow::Result<Self> {
        crate::load_env();

        let config_path = match path {
            Some(p) => p.to_string(),
            None => std::env::var("EMAIL_MENTOR_CONFIG")
                .unwrap_or_else(|_| "email_mentor.toml".to_string()),
        };

        let mut config = Self::from_file(&config_path)?;
        config.apply_env_overrides();
        config.runtime = RuntimeConfig::load_from_env();

        if config.runtime.api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY not set; model requests will be rejected by the provider");
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file, falling back to defaults when it does not exist
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(_) => {
                tracing::warn!("Config file {} not found, using defaults", path);
                Ok(Self::default())
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("MENTOR_MODEL") {
            self.model.model = model;
            tracing::debug!("MENTOR_MODEL env override applied");
        }
        if let Ok(base) = std::env::var("MENTOR_API_BASE") {
            self.model.api_base = base;
            tracing::debug!("MENTOR_API_BASE env override applied");
        }
        if let Some(timeout) = std::env::var("MENTOR_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            self.model.timeout_ms = timeout;
        }
        if let Some(bind) = std::env::var("MENTOR_HTTP_BIND")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.server.http_bind = bind;
        }
        if let Ok(token) = std::env::var("MENTOR_BEARER_TOKEN")
            && !token.is_empty()
        {
            self.server.bearer_token = Some(token);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.model.timeout_ms == 0 {
            anyhow::bail!("MENTOR_TIMEOUT_MS must be greater than 0");
        }
        if !self.model.api_base.starts_with("http://") && !self.model.api_base.starts_with("https://")
        {
            anyhow::bail!(
                "Model API base '{}' must start with http:// or https://",
                self.model.api_base
            );
        }
        if self.model.model.trim().is_empty() {
            anyhow::bail!("Model id must not be empty");
        }
        Ok(())
    }
}
