//! Record Store
//!
//! Abstract CRUD + filtered-query seam to the external record storage that
//! holds bays, bay models, nomenclature lines, intermediate members,
//! material products and generated pieces. Records are schema-less JSON
//! objects; the typed views live in [`records`].

pub mod batch;
pub mod memory;
pub mod persistence;
pub mod records;

pub use memory::InMemoryRecordStore;
pub use persistence::SledRecordStore;
pub use records::Entity;

use crate::error::StorageError;
use crate::types::RecordId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Field map of one record.
pub type Fields = Map<String, Value>;

/// Entity types known to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Bay,
    BayModel,
    NomenclatureLine,
    Member,
    MaterialProduct,
    GeneratedPiece,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Bay => "bay",
            EntityKind::BayModel => "bay_model",
            EntityKind::NomenclatureLine => "nomenclature_line",
            EntityKind::Member => "member",
            EntityKind::MaterialProduct => "material_product",
            EntityKind::GeneratedPiece => "generated_piece",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored record: identifier plus fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    pub fields: Fields,
}

/// Conjunction of field-equality clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    /// Matches every record.
    pub fn all() -> Self {
        Filter::default()
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::all().and_eq(field, value)
    }

    pub fn and_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        self.clauses.iter().all(|(field, expected)| {
            fields
                .get(field)
                .map(|actual| values_equal(actual, expected))
                .unwrap_or(expected.is_null())
        })
    }
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => actual == expected,
    }
}

/// Restrict a field map to the selected fields; an empty selection keeps all.
pub fn project(fields: Fields, select: &[&str]) -> Fields {
    if select.is_empty() {
        return fields;
    }
    fields
        .into_iter()
        .filter(|(key, _)| select.contains(&key.as_str()))
        .collect()
}

/// Opaque continuation token for paginated queries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageToken(String);

impl PageToken {
    pub fn new(token: impl Into<String>) -> Self {
        PageToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub records: Vec<Record>,
    pub next: Option<PageToken>,
}

/// Record store interface
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch one record; `select` limits the returned fields (empty = all).
    async fn get(
        &self,
        kind: EntityKind,
        id: &RecordId,
        select: &[&str],
    ) -> Result<Record, StorageError>;

    /// Fetch one page of records matching `filter`.
    async fn query(
        &self,
        kind: EntityKind,
        filter: &Filter,
        select: &[&str],
        page: Option<&PageToken>,
    ) -> Result<Page, StorageError>;

    async fn create(&self, kind: EntityKind, fields: Fields) -> Result<RecordId, StorageError>;

    /// Merge `fields` into an existing record.
    async fn update(
        &self,
        kind: EntityKind,
        id: &RecordId,
        fields: Fields,
    ) -> Result<(), StorageError>;

    async fn delete(&self, kind: EntityKind, id: &RecordId) -> Result<(), StorageError>;
}

/// Load and decode one typed record.
pub async fn fetch<T: Entity>(store: &dyn RecordStore, id: &RecordId) -> Result<T, StorageError> {
    let record = store.get(T::KIND, id, &[]).await?;
    records::decode(record.fields)
}

/// Load every record matching `filter`, following continuation tokens.
pub async fn fetch_all<T: Entity>(
    store: &dyn RecordStore,
    filter: &Filter,
) -> Result<Vec<(RecordId, T)>, StorageError> {
    let mut out = Vec::new();
    let mut token: Option<PageToken> = None;
    loop {
        let page = store.query(T::KIND, filter, &[], token.as_ref()).await?;
        for record in page.records {
            out.push((record.id, records::decode(record.fields)?));
        }
        match page.next {
            Some(next) => token = Some(next),
            None => break,
        }
    }
    Ok(out)
}

/// Encode and create one typed record.
pub async fn insert<T: Entity>(store: &dyn RecordStore, entity: &T) -> Result<RecordId, StorageError> {
    store.create(T::KIND, records::encode(entity)?).await
}
