//! Embedding generation over the OpenAI REST API, directly or through an
//! Azure OpenAI deployment. Both speak the same request/response shape and
//! differ only in URL and auth header.

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use memstore_core::config::{EmbeddingCredential, EmbeddingSettings};
use memstore_core::error::{Error, Result};
use memstore_core::traits::Embedder;

const SERVICE: &str = "embedding";

#[derive(Debug, Clone)]
enum Auth {
    Bearer(String),
    ApiKey(String),
}

pub struct OpenAiEmbedder {
    client: reqwest::Client,
    url: Url,
    auth: Auth,
    model_id: String,
    dim: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

impl OpenAiEmbedder {
    /// Build from settings, picking Azure or OpenAI from the configured keys.
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        match settings.credential()? {
            EmbeddingCredential::Azure { api_key, endpoint } => {
                Self::azure(&endpoint, &api_key, &settings.model_id, &settings.azure_api_version, settings.dimensions)
            }
            EmbeddingCredential::OpenAi { api_key } => {
                Self::openai(&settings.openai_base_url, &api_key, &settings.model_id, settings.dimensions)
            }
        }
    }

    pub fn openai(base_url: &str, api_key: &str, model_id: &str, dim: usize) -> Result<Self> {
        let url = endpoint_url(base_url, &["embeddings"])?;
        Self::build(url, Auth::Bearer(api_key.to_string()), model_id, dim)
    }

    /// `deployment` is the Azure deployment name of the embedding model.
    pub fn azure(endpoint: &str, api_key: &str, deployment: &str, api_version: &str, dim: usize) -> Result<Self> {
        let mut url = endpoint_url(endpoint, &["openai", "deployments", deployment, "embeddings"])?;
        url.query_pairs_mut().append_pair("api-version", api_version);
        Self::build(url, Auth::ApiKey(api_key.to_string()), deployment, dim)
    }

    fn build(url: Url, auth: Auth, model_id: &str, dim: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::service(SERVICE, format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, url, auth, model_id: model_id.to_string(), dim })
    }

    pub fn url(&self) -> &str { self.url.as_str() }
}

/// `base` with `segments` appended, each percent-escaped as one path segment.
fn endpoint_url(base: &str, segments: &[&str]) -> Result<Url> {
    let invalid = || Error::InvalidConfig(format!("embedding endpoint '{base}' cannot be a base URL"));
    let mut url = Url::parse(base).map_err(|e| Error::InvalidConfig(format!("invalid embedding endpoint '{base}': {e}")))?;
    url.path_segments_mut().map_err(|()| invalid())?.pop_if_empty().extend(segments);
    Ok(url)
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_id(&self) -> &str { &self.model_id }

    fn dim(&self) -> usize { self.dim }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        debug!(model = %self.model_id, count = texts.len(), "requesting embeddings");

        let request = self.client.post(self.url.clone()).json(&EmbeddingRequest { model: &self.model_id, input: texts });
        let request = match &self.auth {
            Auth::Bearer(key) => request.bearer_auth(key),
            Auth::ApiKey(key) => request.header("api-key", key),
        };
        let response = request
            .send()
            .await
            .map_err(|e| Error::service(SERVICE, format!("failed to call embedding API: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "embedding request rejected");
            return Err(Error::service_status(SERVICE, status.as_u16(), body));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::service(SERVICE, format!("failed to parse embedding response: {e}")))?;
        if parsed.data.len() != texts.len() {
            return Err(Error::service(SERVICE, format!("expected {} embeddings, got {}", texts.len(), parsed.data.len())));
        }

        let mut vectors: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        for item in parsed.data {
            let slot = vectors
                .get_mut(item.index)
                .ok_or_else(|| Error::service(SERVICE, format!("embedding index {} out of range", item.index)))?;
            if item.embedding.len() != self.dim {
                warn!(expected = self.dim, got = item.embedding.len(), "embedding dimension differs from configuration");
            }
            *slot = Some(item.embedding);
        }
        vectors
            .into_iter()
            .enumerate()
            .map(|(i, v)| v.ok_or_else(|| Error::service(SERVICE, format!("no embedding returned for input {i}"))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_openai_and_azure_urls() {
        let openai = OpenAiEmbedder::openai("https://api.openai.com/v1/", "sk", "text-embedding-ada-002", 1536).unwrap();
        assert_eq!(openai.url(), "https://api.openai.com/v1/embeddings");

        let azure = OpenAiEmbedder::azure("https://res.openai.azure.com/", "az", "ada", "2024-02-01", 1536).unwrap();
        assert_eq!(azure.url(), "https://res.openai.azure.com/openai/deployments/ada/embeddings?api-version=2024-02-01");
        assert_eq!(azure.model_id(), "ada");
    }

    #[test]
    fn deployment_and_api_version_are_escaped() {
        let azure = OpenAiEmbedder::azure("https://res.openai.azure.com", "az", "ada v2/east", "2024-02-01&x=1", 8).unwrap();
        let url = Url::parse(azure.url()).unwrap();
        assert_eq!(url.path(), "/openai/deployments/ada%20v2%2Feast/embeddings");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("api-version".to_string(), "2024-02-01&x=1".to_string())]);
    }

    #[test]
    fn unusable_endpoints_are_config_errors() {
        assert!(matches!(OpenAiEmbedder::openai("not a url", "sk", "m", 4), Err(Error::InvalidConfig(_))));
        assert!(matches!(OpenAiEmbedder::azure("mailto:x@y.z", "az", "ada", "2024-02-01", 4), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn from_settings_prefers_azure() {
        let settings = EmbeddingSettings {
            api_key: Some("sk".into()),
            azure_api_key: Some("az".into()),
            endpoint: Some("https://res.openai.azure.com".into()),
            ..EmbeddingSettings::default()
        };
        let e = OpenAiEmbedder::from_settings(&settings).unwrap();
        assert!(e.url().contains("/openai/deployments/text-embedding-ada-002/"));
    }

    #[test]
    fn from_settings_without_keys_is_a_config_error() {
        let err = OpenAiEmbedder::from_settings(&EmbeddingSettings::default()).err().unwrap();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
