use crate::{
    error::{Result, VidnoteError},
    provider::Provider,
};

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const NOTION_API_KEY: &str = "NOTION_API_KEY";
pub const NOTION_DATABASE_ID: &str = "NOTION_DATABASE_ID";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const NOTION_BASE_URL: &str = "NOTION_BASE_URL";

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_NOTION_BASE_URL: &str = "https://api.notion.com/v1";

/// Runtime settings read from the environment (and `.env`, if present).
#[derive(Clone, Debug, Default)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub xai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub notion_api_key: Option<String>,
    pub notion_database_id: Option<String>,
    pub openai_base_url: String,
    pub notion_base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            openai_api_key: get(OPENAI_API_KEY),
            xai_api_key: get(Provider::Grok.config().env_var),
            gemini_api_key: get(Provider::Gemini.config().env_var),
            notion_api_key: get(NOTION_API_KEY),
            notion_database_id: get(NOTION_DATABASE_ID),
            openai_base_url: get(OPENAI_BASE_URL)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            notion_base_url: get(NOTION_BASE_URL)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_NOTION_BASE_URL.to_string()),
        }
    }

    /// Key for the transcription endpoint, which is always OpenAI.
    pub fn openai_key(&self) -> Result<&str> {
        require(&self.openai_api_key, OPENAI_API_KEY)
    }

    pub fn notion_key(&self) -> Result<&str> {
        require(&self.notion_api_key, NOTION_API_KEY)
    }

    /// Validate that the chat-completion key is set for `provider`.
    pub fn provider_key(&self, provider: &Provider) -> Result<&str> {
        let key = match provider {
            Provider::Openai => &self.openai_api_key,
            Provider::Grok => &self.xai_api_key,
            Provider::Gemini => &self.gemini_api_key,
        };
        require(key, provider.config().env_var)
    }

    pub fn chat_url(&self, provider: &Provider) -> String {
        match provider {
            Provider::Openai => format!("{}/chat/completions", self.openai_base_url),
            other => other.config().api_url.to_string(),
        }
    }

    pub fn transcription_url(&self) -> String {
        format!("{}/audio/transcriptions", self.openai_base_url)
    }
}

fn require<'a>(value: &'a Option<String>, env_var: &str) -> Result<&'a str> {
    value.as_deref().ok_or_else(|| VidnoteError::MissingApiKey {
        env_var: env_var.to_string(),
    })
}
