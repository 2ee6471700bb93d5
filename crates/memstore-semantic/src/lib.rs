//! Semantic memory on top of a [`RecordStore`] and an [`Embedder`].
//!
//! Entries are `(id, text)` pairs. Each is embedded and stored as a record
//! whose text and description both hold the entry text; lookups go through
//! the storage key produced by [`encode_id`].

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use memstore_core::codec::encode_id;
use memstore_core::config::MemorySettings;
use memstore_core::error::{Error, Result};
use memstore_core::traits::{Embedder, GetRecordOptions, RecordStore};
use memstore_core::types::{Record, SearchHit};

mod samples;

pub use samples::{sample_data, sample_data_with_no_mapping, README_URL};

pub struct SemanticMemory<S: RecordStore> {
    store: S,
    embedder: Box<dyn Embedder>,
    settings: MemorySettings,
}

impl<S: RecordStore> SemanticMemory<S> {
    pub fn new(store: S, embedder: Box<dyn Embedder>, settings: MemorySettings) -> Self { Self { store, embedder, settings } }

    pub fn store(&self) -> &S { &self.store }

    /// Embed and upsert every entry in order, returning the storage keys.
    /// Stops at the first failure; records already written stay written.
    pub async fn store_data(&self, entries: &[(String, String)]) -> Result<Vec<String>> {
        println!("Storing {} entries in collection: {}", entries.len(), self.store.collection());
        let pb = ProgressBar::new(entries.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} entries ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style.progress_chars("#>-"));

        let mut keys = Vec::with_capacity(entries.len());
        for (id, text) in entries {
            pb.println(format!("Save '{id}' to memory."));
            let record = match self.embed_entry(id, text).await {
                Ok(record) => record,
                Err(e) => { pb.abandon_with_message(format!("failed on '{id}'")); return Err(e); }
            };
            let key = match self.store.upsert(&record).await {
                Ok(key) => key,
                Err(e) => { pb.abandon_with_message(format!("failed on '{id}'")); return Err(e); }
            };
            info!(id = %id, key = %key, "stored record");
            keys.push(key);
            pb.inc(1);
        }
        pb.finish_with_message("done");
        Ok(keys)
    }

    async fn embed_entry(&self, id: &str, text: &str) -> Result<Record> {
        let embedding = self.embed_one(text).await?;
        Ok(Record::new(
            id,
            Some(text.to_string()),
            Some(text.to_string()),
            None,
            Some(embedding),
            Some(self.settings.source_name.clone()),
            self.settings.is_reference,
        ))
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embedder.embed_batch(&[text.to_string()]).await?;
        if vectors.len() != 1 {
            return Err(Error::service("embedding", format!("expected 1 embedding, got {}", vectors.len())));
        }
        Ok(vectors.remove(0))
    }

    /// Look up by storage key.
    pub async fn get(&self, key: &str) -> Result<Option<Record>> {
        debug!(key, "get");
        self.store.get(key, &GetRecordOptions::default()).await
    }

    /// Look up by natural id.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Record>> { self.get(&encode_id(Some(id))).await }

    /// Like [`Self::get_by_id`], but a missing record is [`Error::NotFound`].
    pub async fn require(&self, id: &str) -> Result<Record> {
        self.get_by_id(id).await?.ok_or_else(|| Error::NotFound(format!("no record with id '{id}' in {}", self.store.collection())))
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(key).await?;
        info!(key, "deleted record");
        Ok(())
    }

    /// Embed `query` and return the `limit` closest records.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let q_vec = self.embed_one(query).await?;
        self.store.search_vec(&q_vec, limit).await
    }
}
