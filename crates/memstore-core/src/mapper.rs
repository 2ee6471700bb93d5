//! Conversion between [`Record`] and the flat document the index stores.
//!
//! The mapper owns the storage boundary: records keep their natural id and
//! [`to_storage`] is the only place the key is encoded.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codec::{decode_id, encode_id};
use crate::error::{Error, Result};
use crate::schema::{self, FieldKind, FieldRole, RECORD_FIELDS};
use crate::types::Record;

/// Field name → value document as sent to and returned by the index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatDocument(Map<String, Value>);

impl FlatDocument {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, name: &str) -> Option<&Value> { self.0.get(name) }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) { self.0.insert(name.into(), value); }

    /// Storage key, if the document carries one.
    pub fn key(&self) -> Option<&str> { self.get(schema::key_field().storage_name).and_then(Value::as_str) }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn field_names(&self) -> impl Iterator<Item = &str> { self.0.keys().map(String::as_str) }

    pub fn into_inner(self) -> Map<String, Value> { self.0 }
}

impl From<Map<String, Value>> for FlatDocument {
    fn from(map: Map<String, Value>) -> Self { Self(map) }
}

/// Build the storage document for `record`.
///
/// Every field in [`RECORD_FIELDS`] gets a slot; absent optionals become
/// `null` and the key is URL-safe base64 encoded.
pub fn to_storage(record: &Record) -> FlatDocument {
    let mut doc = FlatDocument::new();
    for field in &RECORD_FIELDS {
        let value = match field.role {
            FieldRole::Key => Value::String(encode_id(Some(record.id()))),
            FieldRole::Data | FieldRole::Vector => field.read(record),
        };
        doc.insert(field.storage_name, value);
    }
    doc
}

/// Rebuild a record from a document returned by the index.
///
/// Slots the index did not return (e.g. the vector when it was not selected)
/// fall back to their empty value. Unknown slots such as `@search.score` are
/// ignored.
pub fn from_storage(doc: &FlatDocument) -> Result<Record> {
    let key_name = schema::key_field().storage_name;
    let key = match doc.get(key_name) {
        Some(Value::String(key)) => key.as_str(),
        Some(other) => return Err(Error::InvalidDocument(format!("{key_name} must be a string, got {other}"))),
        None => return Err(Error::InvalidDocument(format!("missing {key_name}"))),
    };
    let id = decode_id(Some(key))?;
    Ok(Record::new(
        id,
        string_slot(doc, schema::TEXT)?,
        string_slot(doc, schema::DESCRIPTION)?,
        string_slot(doc, schema::ADDITIONAL_METADATA)?,
        vector_slot(doc, schema::EMBEDDING)?,
        string_slot(doc, schema::EXTERNAL_SOURCE_NAME)?,
        bool_slot(doc, schema::IS_REFERENCE)?,
    ))
}

fn expect_kind(name: &str, kind: FieldKind) {
    debug_assert_eq!(schema::field(name).map(|f| f.kind), Some(kind), "{name} declared with another kind");
}

fn string_slot(doc: &FlatDocument, name: &str) -> Result<Option<String>> {
    expect_kind(name, FieldKind::String);
    match doc.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(Error::InvalidDocument(format!("{name} must be a string, got {other}"))),
    }
}

fn bool_slot(doc: &FlatDocument, name: &str) -> Result<bool> {
    expect_kind(name, FieldKind::Bool);
    match doc.get(name) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(Error::InvalidDocument(format!("{name} must be a boolean, got {other}"))),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn vector_slot(doc: &FlatDocument, name: &str) -> Result<Option<Vec<f32>>> {
    expect_kind(name, FieldKind::Vector);
    match doc.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_f64().map(|x| x as f32).ok_or_else(|| Error::InvalidDocument(format!("{name} holds a non-numeric item {v}"))))
            .collect::<Result<Vec<f32>>>()
            .map(Some),
        Some(other) => Err(Error::InvalidDocument(format!("{name} must be an array, got {other}"))),
    }
}
