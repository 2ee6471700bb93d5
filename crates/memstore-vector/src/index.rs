//! Index (collection) housekeeping.
//!
//! The index definition is generated from [`RECORD_FIELDS`]: the key field
//! becomes the document key, the vector field an HNSW-searchable
//! `Collection(Edm.Single)` and the rest plain attributes.

use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, info};

use memstore_core::error::{Error, Result};
use memstore_core::schema::{FieldKind, FieldRole, RECORD_FIELDS};

use crate::{AzureSearchStore, SERVICE};

pub const HNSW_ALGORITHM: &str = "memstore-hnsw";
pub const VECTOR_PROFILE: &str = "memstore-hnsw-profile";

fn edm_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::String => "Edm.String",
        FieldKind::Bool => "Edm.Boolean",
        FieldKind::Vector => "Collection(Edm.Single)",
    }
}

/// Azure AI Search index definition for records of `dimensions`-sized vectors.
pub fn index_definition(name: &str, dimensions: usize) -> Value {
    let fields: Vec<Value> = RECORD_FIELDS
        .iter()
        .map(|f| match f.role {
            FieldRole::Key => json!({
                "name": f.storage_name,
                "type": edm_type(f.kind),
                "key": true,
                "filterable": true,
            }),
            FieldRole::Vector => json!({
                "name": f.storage_name,
                "type": edm_type(f.kind),
                "searchable": true,
                "retrievable": true,
                "dimensions": dimensions,
                "vectorSearchProfile": VECTOR_PROFILE,
            }),
            FieldRole::Data => json!({
                "name": f.storage_name,
                "type": edm_type(f.kind),
                "searchable": f.kind == FieldKind::String,
                "filterable": f.kind == FieldKind::Bool,
            }),
        })
        .collect();
    json!({
        "name": name,
        "fields": fields,
        "vectorSearch": {
            "algorithms": [ { "name": HNSW_ALGORITHM, "kind": "hnsw", "hnswParameters": { "metric": "cosine" } } ],
            "profiles": [ { "name": VECTOR_PROFILE, "algorithm": HNSW_ALGORITHM } ],
        },
    })
}

impl AzureSearchStore {
    pub async fn collection_exists(&self) -> Result<bool> {
        let url = self.url(&["indexes", self.options.collection.as_str()])?;
        let response = self.send(self.request(Method::GET, url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            s => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::service_status(SERVICE, s.as_u16(), body))
            }
        }
    }

    /// Create the index from the record schema unless it already exists.
    /// Returns true when it was created.
    pub async fn create_collection_if_not_exists(&self) -> Result<bool> {
        if self.collection_exists().await? {
            debug!(collection = %self.options.collection, "index already exists");
            return Ok(false);
        }
        let url = self.url(&["indexes", self.options.collection.as_str()])?;
        let definition = index_definition(&self.options.collection, self.options.dimensions);
        let response = self.send(self.request(Method::PUT, url).json(&definition)).await?;
        let _: Value = Self::read_json(response).await?;
        info!(collection = %self.options.collection, dimensions = self.options.dimensions, "created index");
        Ok(true)
    }

    /// Drop the index. Missing indexes are not an error.
    pub async fn delete_collection(&self) -> Result<()> {
        let url = self.url(&["indexes", self.options.collection.as_str()])?;
        let response = self.send(self.request(Method::DELETE, url)).await?;
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            info!(collection = %self.options.collection, "deleted index");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::service_status(SERVICE, status.as_u16(), body))
    }
}
