use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use memstore_core::config::MemorySettings;
use memstore_core::error::{Error, Result};
use memstore_core::traits::{Embedder, GetRecordOptions, RecordStore};
use memstore_core::{encode_id, to_storage, Record, SearchHit};
use memstore_embed::FakeEmbedder;
use memstore_semantic::{sample_data, sample_data_with_no_mapping, SemanticMemory, README_URL};

/// Keeps records keyed by their storage key; optionally rejects one key.
#[derive(Default)]
struct InMemoryStore {
    records: Mutex<BTreeMap<String, Record>>,
    reject: Option<String>,
}

impl InMemoryStore {
    fn rejecting(key: &str) -> Self { Self { reject: Some(key.to_string()), ..Self::default() } }
    fn len(&self) -> usize { self.records.lock().unwrap().len() }
}

fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    f64::from(dot / (na * nb).max(1e-6))
}

#[async_trait]
impl RecordStore for InMemoryStore {
    fn collection(&self) -> &str { "memory" }

    async fn upsert(&self, record: &Record) -> Result<String> {
        let key = to_storage(record).key().unwrap_or_default().to_string();
        if self.reject.as_deref() == Some(key.as_str()) {
            return Err(Error::service_status("search", 400, "rejected"));
        }
        self.records.lock().unwrap().insert(key.clone(), record.clone());
        Ok(key)
    }

    async fn upsert_batch(&self, records: &[Record]) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for r in records { keys.push(self.upsert(r).await?); }
        Ok(keys)
    }

    async fn get(&self, key: &str, options: &GetRecordOptions) -> Result<Option<Record>> {
        let found = self.records.lock().unwrap().get(key).cloned();
        Ok(found.map(|r| if options.include_vectors { r } else { strip(&r) }))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.records.lock().unwrap().remove(key);
        Ok(())
    }

    async fn search_vec(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        let mut hits: Vec<SearchHit> = self
            .records
            .lock()
            .unwrap()
            .values()
            .map(|r| SearchHit { score: cosine(vector, r.embedding()), record: strip(r) })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        hits.truncate(limit);
        Ok(hits)
    }
}

fn strip(r: &Record) -> Record {
    Record::new(
        r.id(),
        r.text().map(String::from),
        r.description().map(String::from),
        r.additional_metadata().map(String::from),
        None,
        r.external_source_name().map(String::from),
        r.is_reference(),
    )
}

struct BrokenEmbedder;

#[async_trait]
impl Embedder for BrokenEmbedder {
    fn model_id(&self) -> &str { "broken" }
    fn dim(&self) -> usize { 8 }
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(Error::service_status("embedding", 429, "Too Many Requests"))
    }
}

fn memory(store: InMemoryStore) -> SemanticMemory<InMemoryStore> {
    SemanticMemory::new(store, Box::new(FakeEmbedder::new(64)), MemorySettings::default())
}

#[tokio::test]
async fn stores_every_entry_under_its_encoded_key() {
    let memory = memory(InMemoryStore::default());
    let keys = memory.store_data(&sample_data()).await.unwrap();

    assert_eq!(keys.len(), 7);
    assert_eq!(keys[0], "aHR0cHM6Ly9naXRodWIuY29tL21pY3Jvc29mdC9zZW1hbnRpYy1rZXJuZWwvYmxvYi9tYWluL1JFQURNRS5tZA==");
    for ((id, _), key) in sample_data().iter().zip(&keys) {
        assert_eq!(key, &encode_id(Some(id)));
    }
    assert_eq!(memory.store().len(), 7);
}

#[tokio::test]
async fn stored_record_carries_text_description_and_source() {
    let memory = memory(InMemoryStore::default());
    memory.store_data(&sample_data_with_no_mapping()).await.unwrap();

    let record = memory.require("id_1").await.unwrap();
    assert_eq!(record.id(), "id_1");
    assert_eq!(record.text(), Some("This is test 1"));
    assert_eq!(record.description(), Some("This is test 1"));
    assert_eq!(record.additional_metadata(), None);
    assert_eq!(record.external_source_name(), Some("GitHub"));
    assert!(!record.is_reference());
    assert!(record.embedding().is_empty());

    let with_vec = memory.store().get(&encode_id(Some("id_1")), &GetRecordOptions { include_vectors: true }).await.unwrap().unwrap();
    assert_eq!(with_vec.embedding(), FakeEmbedder::new(64).embed_text("This is test 1").as_slice());
}

#[tokio::test]
async fn configured_source_and_reference_flag_are_applied() {
    let settings = MemorySettings { source_name: "docs".into(), is_reference: true };
    let memory = SemanticMemory::new(InMemoryStore::default(), Box::new(FakeEmbedder::new(16)), settings);
    memory.store_data(&[("a".to_string(), "alpha".to_string())]).await.unwrap();

    let record = memory.get_by_id("a").await.unwrap().unwrap();
    assert_eq!(record.external_source_name(), Some("docs"));
    assert!(record.is_reference());
}

#[tokio::test]
async fn first_failure_aborts_remaining_entries() {
    let entries = sample_data();
    let memory = memory(InMemoryStore::rejecting(&encode_id(Some(&entries[1].0))));

    let err = memory.store_data(&entries).await.unwrap_err();
    assert!(matches!(err, Error::Service { status: Some(400), .. }));
    // first entry stays, nothing after the failing one is written
    assert_eq!(memory.store().len(), 1);
    assert!(memory.get_by_id(README_URL).await.unwrap().is_some());
}

#[tokio::test]
async fn embedding_failure_writes_nothing() {
    let memory = SemanticMemory::new(InMemoryStore::default(), Box::new(BrokenEmbedder), MemorySettings::default());
    let err = memory.store_data(&sample_data_with_no_mapping()).await.unwrap_err();
    assert!(err.is_service());
    assert_eq!(memory.store().len(), 0);
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let memory = memory(InMemoryStore::default());
    assert!(memory.store_data(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_records_and_deletes() {
    let memory = memory(InMemoryStore::default());
    assert!(memory.get("bm9uZQ==").await.unwrap().is_none());
    assert!(matches!(memory.require("none").await, Err(Error::NotFound(_))));

    let keys = memory.store_data(&sample_data_with_no_mapping()).await.unwrap();
    memory.delete(&keys[0]).await.unwrap();
    assert!(memory.get(&keys[0]).await.unwrap().is_none());
    assert!(memory.get(&keys[1]).await.unwrap().is_some());
}

#[tokio::test]
async fn search_finds_closest_entry() {
    let memory = memory(InMemoryStore::default());
    memory.store_data(&sample_data()).await.unwrap();

    let hits = memory.search("C# class that defines a volatile embedding store", 3).await.unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits[0].record.id().ends_with("VolatileMemoryStore.cs"));
    assert!(hits[0].score >= hits[1].score);
}
