//! Domain types shared by the embedding, store and orchestration crates.

/// One searchable item as the application sees it.
///
/// - `id`: natural identifier, any characters (usually a URL); encoded only
///   when written to the index
/// - `text`: the content itself
/// - `description`: short label; the field embeddings are generated from
/// - `additional_metadata`: opaque serialized side-data (e.g. JSON as text)
/// - `embedding`: dense vector, never absent (empty when not supplied)
/// - `external_source_name`: provenance tag when the content lives elsewhere
/// - `is_reference`: true when the record points at external content
///
/// Records are immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: String,
    text: Option<String>,
    description: Option<String>,
    additional_metadata: Option<String>,
    embedding: Vec<f32>,
    external_source_name: Option<String>,
    is_reference: bool,
}

impl Record {
    pub fn new(
        id: impl Into<String>,
        text: Option<String>,
        description: Option<String>,
        additional_metadata: Option<String>,
        embedding: Option<Vec<f32>>,
        external_source_name: Option<String>,
        is_reference: bool,
    ) -> Self {
        Self {
            id: id.into(),
            text,
            description,
            additional_metadata,
            embedding: embedding.unwrap_or_default(),
            external_source_name,
            is_reference,
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn text(&self) -> Option<&str> { self.text.as_deref() }
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }
    pub fn additional_metadata(&self) -> Option<&str> { self.additional_metadata.as_deref() }
    pub fn embedding(&self) -> &[f32] { &self.embedding }
    pub fn external_source_name(&self) -> Option<&str> { self.external_source_name.as_deref() }
    pub fn is_reference(&self) -> bool { self.is_reference }
}

/// A record returned by a similarity query. Higher `score` is better.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub record: Record,
    pub score: f64,
}
