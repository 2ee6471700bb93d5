//! Azure AI Search backed [`RecordStore`].
//!
//! Records go through [`memstore_core::mapper`] on the way in and out, so the
//! index only ever sees encoded keys. Every call is a single REST request;
//! failures surface as [`Error::Service`] and are never retried here.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use memstore_core::config::{SearchSettings, DEFAULT_APPLICATION_ID, DEFAULT_COLLECTION, DEFAULT_SEARCH_API_VERSION};
use memstore_core::error::{Error, Result};
use memstore_core::mapper::{from_storage, to_storage, FlatDocument};
use memstore_core::schema::{self, DEFAULT_EMBEDDING_DIM};
use memstore_core::traits::{GetRecordOptions, RecordStore};
use memstore_core::types::{Record, SearchHit};

pub mod index;
pub mod search;

const SERVICE: &str = "search";

/// Connection-independent knobs of the store, with the defaults the sample uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureSearchStoreOptions {
    /// Index name.
    pub collection: String,
    pub api_version: String,
    /// Sent as the `User-Agent`.
    pub application_id: String,
    /// Vector size declared when the index is created.
    pub dimensions: usize,
}

impl Default for AzureSearchStoreOptions {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            api_version: DEFAULT_SEARCH_API_VERSION.to_string(),
            application_id: DEFAULT_APPLICATION_ID.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIM,
        }
    }
}

pub struct AzureSearchStore {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    options: AzureSearchStoreOptions,
}

/// Per-document outcome of an indexing batch.
#[derive(Debug, Deserialize)]
struct IndexingResult {
    key: String,
    status: bool,
    #[serde(rename = "errorMessage")]
    error_message: Option<String>,
    #[serde(rename = "statusCode")]
    status_code: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct IndexingResponse {
    value: Vec<IndexingResult>,
}

impl AzureSearchStore {
    pub fn new(endpoint: &str, api_key: &str, options: AzureSearchStoreOptions) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| Error::InvalidConfig(format!("invalid search endpoint '{endpoint}': {e}")))?;
        if endpoint.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!("search endpoint '{endpoint}' cannot be a base URL")));
        }
        let client = reqwest::Client::builder()
            .user_agent(options.application_id.clone())
            .build()
            .map_err(|e| Error::service(SERVICE, format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, endpoint, api_key: api_key.to_string(), options })
    }

    pub fn from_settings(settings: &SearchSettings, dimensions: usize) -> Result<Self> {
        let (endpoint, api_key) = settings.credentials()?;
        let options = AzureSearchStoreOptions {
            collection: settings.collection.clone(),
            api_version: settings.api_version.clone(),
            application_id: settings.application_id.clone(),
            dimensions,
        };
        Self::new(&endpoint, &api_key, options)
    }

    pub fn options(&self) -> &AzureSearchStoreOptions { &self.options }

    /// `{endpoint}/{segments...}?api-version=...`
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidConfig(format!("search endpoint '{}' cannot be a base URL", self.endpoint)))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().append_pair("api-version", &self.options.api_version);
        Ok(url)
    }

    pub(crate) fn docs_url(&self, action: &str) -> Result<Url> {
        self.url(&["indexes", self.options.collection.as_str(), "docs", action])
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url).header("api-key", &self.api_key)
    }

    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response> {
        request.send().await.map_err(|e| Error::service(SERVICE, format!("request failed: {e}")))
    }

    pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "search request rejected");
            return Err(Error::service_status(SERVICE, status.as_u16(), body));
        }
        response.json().await.map_err(|e| Error::service(SERVICE, format!("failed to parse response: {e}")))
    }

    async fn index_documents(&self, action: &str, documents: Vec<Value>) -> Result<Vec<String>> {
        if documents.is_empty() { return Ok(Vec::new()); }
        let actions: Vec<Value> = documents
            .into_iter()
            .map(|mut doc| {
                if let Value::Object(map) = &mut doc {
                    map.insert("@search.action".to_string(), Value::String(action.to_string()));
                }
                doc
            })
            .collect();
        debug!(collection = %self.options.collection, action, count = actions.len(), "indexing documents");
        let url = self.docs_url("index")?;
        let response = self.send(self.request(Method::POST, url).json(&json!({ "value": actions }))).await?;
        let parsed: IndexingResponse = Self::read_json(response).await?;

        let mut keys = Vec::with_capacity(parsed.value.len());
        for result in parsed.value {
            if !result.status {
                let message = result.error_message.unwrap_or_else(|| "unknown error".to_string());
                return Err(match result.status_code {
                    Some(code) => Error::service_status(SERVICE, code, format!("document '{}': {message}", result.key)),
                    None => Error::service(SERVICE, format!("document '{}': {message}", result.key)),
                });
            }
            keys.push(result.key);
        }
        Ok(keys)
    }
}

fn document_value(doc: FlatDocument) -> Value { Value::Object(doc.into_inner()) }

#[async_trait]
impl RecordStore for AzureSearchStore {
    fn collection(&self) -> &str { &self.options.collection }

    async fn upsert(&self, record: &Record) -> Result<String> {
        let keys = self.upsert_batch(std::slice::from_ref(record)).await?;
        keys.into_iter().next().ok_or_else(|| Error::service(SERVICE, "indexing response had no results"))
    }

    async fn upsert_batch(&self, records: &[Record]) -> Result<Vec<String>> {
        let documents = records.iter().map(|r| document_value(to_storage(r))).collect();
        let keys = self.index_documents("mergeOrUpload", documents).await?;
        info!(collection = %self.options.collection, count = keys.len(), "upserted records");
        Ok(keys)
    }

    async fn get(&self, key: &str, options: &GetRecordOptions) -> Result<Option<Record>> {
        let mut url = self.url(&["indexes", self.options.collection.as_str(), "docs", key])?;
        url.query_pairs_mut().append_pair("$select", &schema::storage_names(options.include_vectors).join(","));
        debug!(collection = %self.options.collection, key, "looking up document");
        let response = self.send(self.request(Method::GET, url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let doc: FlatDocument = Self::read_json(response).await?;
        from_storage(&doc).map(Some)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut doc = Map::new();
        doc.insert(schema::key_field().storage_name.to_string(), Value::String(key.to_string()));
        self.index_documents("delete", vec![Value::Object(doc)]).await?;
        Ok(())
    }

    async fn search_vec(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        self.vector_search(vector, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_carry_api_version_and_escape_keys() {
        let store = AzureSearchStore::new("https://demo.search.windows.net/", "k", AzureSearchStoreOptions::default()).unwrap();
        let url = store.docs_url("index").unwrap();
        assert_eq!(url.as_str(), "https://demo.search.windows.net/indexes/skgithub/docs/index?api-version=2023-11-01");

        let raw = store.url(&["indexes", "skgithub", "docs", "a/b c"]).unwrap();
        assert_eq!(raw.path(), "/indexes/skgithub/docs/a%2Fb%20c");
    }

    #[test]
    fn rejects_unusable_endpoints() {
        assert!(matches!(AzureSearchStore::new("not a url", "k", AzureSearchStoreOptions::default()), Err(Error::InvalidConfig(_))));
        assert!(matches!(AzureSearchStore::new("mailto:x@y.z", "k", AzureSearchStoreOptions::default()), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn from_settings_requires_credentials() {
        let settings = SearchSettings::default();
        assert!(matches!(AzureSearchStore::from_settings(&settings, 4), Err(Error::InvalidConfig(_))));

        let settings = SearchSettings {
            endpoint: Some("https://demo.search.windows.net".into()),
            api_key: Some("key".into()),
            collection: "docs".into(),
            ..SearchSettings::default()
        };
        let store = AzureSearchStore::from_settings(&settings, 4).unwrap();
        assert_eq!(store.collection(), "docs");
        assert_eq!(store.options().dimensions, 4);
    }
}
