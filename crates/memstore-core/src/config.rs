//! Configuration loader and typed settings.
//!
//! Uses Figment to merge defaults + `memstore.toml` + `memstore.<env>.toml` +
//! `APP_*` env vars (`__` separates nesting, e.g. `APP_SEARCH__ENDPOINT`).
//! The credential variables used by the Azure samples (`CLIENT_KEY`,
//! `AZURE_AISEARCH_ENDPOINT`, ...) are honoured as well and win over
//! everything else. Load once at startup and pass [`Settings`] down by value.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{Error, Result};
use crate::schema::DEFAULT_EMBEDDING_DIM;

pub const DEFAULT_COLLECTION: &str = "skgithub";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_SEARCH_API_VERSION: &str = "2023-11-01";
pub const DEFAULT_AZURE_OPENAI_API_VERSION: &str = "2024-02-01";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_APPLICATION_ID: &str = "Semantic-Kernel";
pub const DEFAULT_SOURCE_NAME: &str = "GitHub";

/// Raw environment variables and the settings key each one fills.
const CREDENTIAL_VARS: [(&str, &str); 6] = [
    ("CLIENT_KEY", "embedding.api_key"),
    ("AZURE_CLIENT_KEY", "embedding.azure_api_key"),
    ("CLIENT_ENDPOINT", "embedding.endpoint"),
    ("MODEL_ID", "embedding.model_id"),
    ("AZURE_AISEARCH_ENDPOINT", "search.endpoint"),
    ("AZURE_AISEARCH_KEY", "search.api_key"),
];

/// String-typed settings keys. Figment parses an all-digit env value as a
/// number, so `APP_*` overrides for these are re-read verbatim.
const STRING_KEYS: [&str; 12] = [
    "embedding.api_key",
    "embedding.azure_api_key",
    "embedding.endpoint",
    "embedding.model_id",
    "embedding.openai_base_url",
    "embedding.azure_api_version",
    "search.endpoint",
    "search.api_key",
    "search.collection",
    "search.api_version",
    "search.application_id",
    "memory.source_name",
];

fn app_env_var(key: &str) -> String { format!("APP_{}", key.replace('.', "__").to_uppercase()) }

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub embedding: EmbeddingSettings,
    pub search: SearchSettings,
    pub memory: MemorySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// OpenAI API key; used when no Azure key is set.
    pub api_key: Option<String>,
    /// Azure OpenAI key; requires `endpoint`.
    pub azure_api_key: Option<String>,
    /// Azure OpenAI resource endpoint.
    pub endpoint: Option<String>,
    /// Model (OpenAI) or deployment (Azure) name.
    pub model_id: String,
    pub dimensions: usize,
    pub openai_base_url: String,
    pub azure_api_version: String,
    /// Use the deterministic offline embedder instead of a remote service.
    pub use_fake: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            azure_api_key: None,
            endpoint: None,
            model_id: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIM,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            azure_api_version: DEFAULT_AZURE_OPENAI_API_VERSION.to_string(),
            use_fake: false,
        }
    }
}

/// Which embedding service to call and how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingCredential {
    Azure { api_key: String, endpoint: String },
    OpenAi { api_key: String },
}

impl EmbeddingSettings {
    /// An Azure key takes precedence over an OpenAI key.
    pub fn credential(&self) -> Result<EmbeddingCredential> {
        if let Some(api_key) = non_empty(self.azure_api_key.as_ref()) {
            let endpoint = non_empty(self.endpoint.as_ref())
                .ok_or_else(|| Error::InvalidConfig("embedding.endpoint (CLIENT_ENDPOINT) is required with an Azure key".into()))?;
            return Ok(EmbeddingCredential::Azure { api_key, endpoint });
        }
        if let Some(api_key) = non_empty(self.api_key.as_ref()) {
            return Ok(EmbeddingCredential::OpenAi { api_key });
        }
        Err(Error::InvalidConfig("no embedding key: set CLIENT_KEY or AZURE_CLIENT_KEY".into()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Index the records are written to.
    pub collection: String,
    pub api_version: String,
    /// Sent as the `User-Agent` of every request.
    pub application_id: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            collection: DEFAULT_COLLECTION.to_string(),
            api_version: DEFAULT_SEARCH_API_VERSION.to_string(),
            application_id: DEFAULT_APPLICATION_ID.to_string(),
        }
    }
}

impl SearchSettings {
    /// Endpoint and key, both required to reach the index.
    pub fn credentials(&self) -> Result<(String, String)> {
        let endpoint = non_empty(self.endpoint.as_ref())
            .ok_or_else(|| Error::InvalidConfig("search.endpoint (AZURE_AISEARCH_ENDPOINT) is not set".into()))?;
        let api_key = non_empty(self.api_key.as_ref())
            .ok_or_else(|| Error::InvalidConfig("search.api_key (AZURE_AISEARCH_KEY) is not set".into()))?;
        Ok((endpoint, api_key))
    }
}

/// Constants stamped on every record the sample flow stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    pub source_name: String,
    pub is_reference: bool,
}

impl Default for MemorySettings {
    fn default() -> Self { Self { source_name: DEFAULT_SOURCE_NAME.to_string(), is_reference: false } }
}

fn non_empty(v: Option<&String>) -> Option<String> {
    v.map(|s| s.trim()).filter(|s| !s.is_empty()).map(str::to_string)
}

pub struct Config {
    figment: Figment,
    env_name: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("memstore.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("memstore.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("memstore.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("memstore.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        for key in STRING_KEYS {
            if let Ok(value) = env::var(app_env_var(key)) {
                figment = figment.merge(Serialized::default(key, value));
            }
        }
        for (var, key) in CREDENTIAL_VARS {
            if let Ok(value) = env::var(var) {
                figment = figment.merge(Serialized::default(key, value));
            }
        }
        if let Ok(value) = env::var("APP_USE_FAKE_EMBEDDINGS") {
            let use_fake = value == "1" || value.eq_ignore_ascii_case("true");
            figment = figment.merge(Serialized::default("embedding.use_fake", use_fake));
        }

        let config = Self { figment, env_name: env_name.to_string() };
        config.validate_for_env(&config.settings()?)?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{key}': {e}")))
    }

    pub fn settings(&self) -> Result<Settings> {
        self.figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    fn validate_for_env(&self, settings: &Settings) -> Result<()> {
        if settings.embedding.dimensions == 0 {
            return Err(Error::InvalidConfig("embedding.dimensions must be positive".into()));
        }
        if settings.search.collection.trim().is_empty() {
            return Err(Error::InvalidConfig("search.collection must not be empty".into()));
        }
        match self.env_name.as_str() {
            "prod" | "production" => {
                if settings.embedding.use_fake {
                    return Err(Error::InvalidConfig("fake embeddings are not allowed in production".into()));
                }
                settings.search.credentials()?;
                settings.embedding.credential()?;
            }
            _ => {}
        }
        Ok(())
    }
}
