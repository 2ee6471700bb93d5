//! Static description of how a [`Record`] is laid out in the index.
//!
//! The mapper and the index definition both walk [`RECORD_FIELDS`] instead of
//! hard-coding field names, so the storage shape is declared in one place.

use serde_json::Value;

use crate::types::Record;

pub const ID: &str = "Id";
pub const TEXT: &str = "Text";
pub const DESCRIPTION: &str = "Description";
pub const ADDITIONAL_METADATA: &str = "AdditionalMetadata";
pub const EMBEDDING: &str = "Embedding";
pub const EXTERNAL_SOURCE_NAME: &str = "ExternalSourceName";
pub const IS_REFERENCE: &str = "Reference";

/// Output size of `text-embedding-ada-002`.
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Key,
    Data,
    Vector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Bool,
    Vector,
}

#[derive(Clone, Copy)]
pub struct FieldDescriptor {
    /// Name on the Rust side.
    pub name: &'static str,
    /// Name of the slot in the index document.
    pub storage_name: &'static str,
    pub role: FieldRole,
    pub kind: FieldKind,
    /// Marks the text field embeddings are generated from.
    pub embedding_source: bool,
    read: fn(&Record) -> Value,
}

impl std::fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("storage_name", &self.storage_name)
            .field("role", &self.role)
            .field("kind", &self.kind)
            .field("embedding_source", &self.embedding_source)
            .finish_non_exhaustive()
    }
}

impl FieldDescriptor {
    /// Raw value of this field on `record`. Keys are returned unencoded.
    pub fn read(&self, record: &Record) -> Value { (self.read)(record) }
}

fn read_id(r: &Record) -> Value { Value::from(r.id()) }
fn read_text(r: &Record) -> Value { Value::from(r.text()) }
fn read_description(r: &Record) -> Value { Value::from(r.description()) }
fn read_additional_metadata(r: &Record) -> Value { Value::from(r.additional_metadata()) }
fn read_embedding(r: &Record) -> Value { Value::from(r.embedding()) }
fn read_external_source_name(r: &Record) -> Value { Value::from(r.external_source_name()) }
fn read_is_reference(r: &Record) -> Value { Value::from(r.is_reference()) }

pub static RECORD_FIELDS: [FieldDescriptor; 7] = [
    FieldDescriptor { name: "id", storage_name: ID, role: FieldRole::Key, kind: FieldKind::String, embedding_source: false, read: read_id },
    FieldDescriptor { name: "text", storage_name: TEXT, role: FieldRole::Data, kind: FieldKind::String, embedding_source: false, read: read_text },
    FieldDescriptor { name: "description", storage_name: DESCRIPTION, role: FieldRole::Data, kind: FieldKind::String, embedding_source: true, read: read_description },
    FieldDescriptor { name: "additional_metadata", storage_name: ADDITIONAL_METADATA, role: FieldRole::Data, kind: FieldKind::String, embedding_source: false, read: read_additional_metadata },
    FieldDescriptor { name: "embedding", storage_name: EMBEDDING, role: FieldRole::Vector, kind: FieldKind::Vector, embedding_source: false, read: read_embedding },
    FieldDescriptor { name: "external_source_name", storage_name: EXTERNAL_SOURCE_NAME, role: FieldRole::Data, kind: FieldKind::String, embedding_source: false, read: read_external_source_name },
    FieldDescriptor { name: "is_reference", storage_name: IS_REFERENCE, role: FieldRole::Data, kind: FieldKind::Bool, embedding_source: false, read: read_is_reference },
];

pub fn key_field() -> &'static FieldDescriptor { by_role(FieldRole::Key) }

pub fn vector_field() -> &'static FieldDescriptor { by_role(FieldRole::Vector) }

fn by_role(role: FieldRole) -> &'static FieldDescriptor {
    // RECORD_FIELDS declares exactly one key and one vector field.
    RECORD_FIELDS.iter().find(|f| f.role == role).unwrap_or(&RECORD_FIELDS[0])
}

/// Look a field up by its storage name.
pub fn field(storage_name: &str) -> Option<&'static FieldDescriptor> {
    RECORD_FIELDS.iter().find(|f| f.storage_name == storage_name)
}

/// Storage names to request from the index, optionally without the vector.
pub fn storage_names(include_vectors: bool) -> Vec<&'static str> {
    RECORD_FIELDS
        .iter()
        .filter(|f| include_vectors || f.role != FieldRole::Vector)
        .map(|f| f.storage_name)
        .collect()
}
