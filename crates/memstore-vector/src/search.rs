//! Pure vector similarity queries against the `Embedding` field.

use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use memstore_core::error::Result;
use memstore_core::mapper::{from_storage, FlatDocument};
use memstore_core::schema::{self, vector_field};
use memstore_core::types::SearchHit;

use crate::AzureSearchStore;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    value: Vec<Map<String, Value>>,
}

/// Body of a `docs/search` request with a single vector query.
pub fn vector_query(vector: &[f32], limit: usize) -> Value {
    json!({
        "select": schema::storage_names(false).join(","),
        "top": limit,
        "vectorQueries": [ {
            "kind": "vector",
            "vector": vector,
            "fields": vector_field().storage_name,
            "k": limit,
        } ],
    })
}

impl AzureSearchStore {
    /// Nearest neighbours of `vector`, best first. Hits come back without
    /// their embedding.
    pub async fn vector_search(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        if limit == 0 { return Ok(Vec::new()); }
        debug!(collection = %self.options.collection, limit, "vector search");
        let url = self.docs_url("search")?;
        let response = self.send(self.request(Method::POST, url).json(&vector_query(vector, limit))).await?;
        let parsed: SearchResponse = Self::read_json(response).await?;

        let mut hits = Vec::with_capacity(parsed.value.len());
        for mut doc in parsed.value {
            let score = doc.remove("@search.score").and_then(|v| v.as_f64()).unwrap_or(0.0);
            let record = from_storage(&FlatDocument::from(doc))?;
            hits.push(SearchHit { record, score });
        }
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(hits)
    }
}
