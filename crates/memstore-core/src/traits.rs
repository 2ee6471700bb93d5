use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Record, SearchHit};

/// Produces one vector per input text, in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model or deployment the vectors come from.
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetRecordOptions {
    /// Also return the embedding; without it records come back with an empty vector.
    pub include_vectors: bool,
}

/// A keyed collection of records in a vector index.
///
/// Keys are storage keys, i.e. the output of [`crate::codec::encode_id`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    fn collection(&self) -> &str;
    /// Insert or replace `record`, returning its storage key.
    async fn upsert(&self, record: &Record) -> Result<String>;
    async fn upsert_batch(&self, records: &[Record]) -> Result<Vec<String>>;
    async fn get(&self, key: &str, options: &GetRecordOptions) -> Result<Option<Record>>;
    async fn delete(&self, key: &str) -> Result<()>;
    /// Nearest neighbours of `vector`, best first.
    async fn search_vec(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>>;
}
