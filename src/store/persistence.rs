//! Sled-backed record store
//!
//! One sled tree per entity kind; values are JSON-encoded field maps and ids
//! come from sled's monotonic id generator, zero-padded so that key order is
//! creation order. Blocking sled calls run on the tokio blocking pool.

use crate::config::StoreConfig;
use crate::error::StorageError;
use crate::store::{project, EntityKind, Fields, Filter, Page, PageToken, Record, RecordStore};
use crate::types::RecordId;
use async_trait::async_trait;
use std::ops::Bound;
use std::path::Path;
use tracing::debug;

/// Sled-based implementation of RecordStore
pub struct SledRecordStore {
    db: sled::Db,
    page_size: usize,
}

fn backend(context: &str, e: impl std::fmt::Display) -> StorageError {
    StorageError::Backend(format!("{}: {}", context, e))
}

impl SledRecordStore {
    /// Open (or create) a store at the given directory.
    pub fn new<P: AsRef<Path>>(path: P, page_size: usize) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| backend("Failed to open sled database", e))?;
        Ok(Self {
            db,
            page_size: page_size.max(1),
        })
    }

    /// Open the store described by the `[store]` configuration section.
    pub fn from_config(config: &StoreConfig) -> Result<Self, StorageError> {
        debug!(path = %config.path.display(), page_size = config.page_size, "Opening sled store");
        Self::new(&config.path, config.page_size)
    }

    /// Get the underlying sled database (for advanced operations)
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    fn tree(&self, kind: EntityKind) -> Result<sled::Tree, StorageError> {
        self.db
            .open_tree(kind.as_str())
            .map_err(|e| backend("Failed to open tree", e))
    }

    /// Flush all pending writes to disk
    pub async fn flush(&self) -> Result<(), StorageError> {
        self.db
            .flush_async()
            .await
            .map_err(|e| backend("Failed to flush database", e))?;
        Ok(())
    }
}

fn encode_fields(kind: EntityKind, fields: &Fields) -> Result<Vec<u8>, StorageError> {
    serde_json::to_vec(fields).map_err(|e| StorageError::Serialization {
        kind,
        message: e.to_string(),
    })
}

fn decode_fields(kind: EntityKind, bytes: &[u8]) -> Result<Fields, StorageError> {
    serde_json::from_slice(bytes).map_err(|e| StorageError::Serialization {
        kind,
        message: e.to_string(),
    })
}

async fn blocking<T, F>(f: F) -> Result<T, StorageError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| backend("Blocking storage task failed", e))?
}

/// Tokens are the zero-padded hex id of the last record of a page.
fn parse_token(token: &PageToken) -> Result<Vec<u8>, StorageError> {
    let raw = token.as_str();
    if raw.len() != 16 || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(StorageError::InvalidPageToken(raw.to_string()));
    }
    Ok(raw.as_bytes().to_vec())
}

#[async_trait]
impl RecordStore for SledRecordStore {
    async fn get(
        &self,
        kind: EntityKind,
        id: &RecordId,
        select: &[&str],
    ) -> Result<Record, StorageError> {
        let tree = self.tree(kind)?;
        let key = id.clone();
        let fields = blocking(move || {
            let value = tree
                .get(key.as_str().as_bytes())
                .map_err(|e| backend("Failed to get record", e))?;
            match value {
                Some(bytes) => decode_fields(kind, &bytes),
                None => Err(StorageError::NotFound { kind, id: key }),
            }
        })
        .await?;
        Ok(Record {
            id: id.clone(),
            fields: project(fields, select),
        })
    }

    async fn query(
        &self,
        kind: EntityKind,
        filter: &Filter,
        select: &[&str],
        page: Option<&PageToken>,
    ) -> Result<Page, StorageError> {
        let tree = self.tree(kind)?;
        let filter = filter.clone();
        let lower = page.map(parse_token).transpose()?;
        let page_size = self.page_size;

        let (matches, next) = blocking(move || {
            let start = match lower {
                Some(key) => Bound::Excluded(key),
                None => Bound::Unbounded,
            };
            let mut matches: Vec<(RecordId, Fields)> = Vec::new();
            let mut next = None;
            for item in tree.range::<Vec<u8>, _>((start, Bound::Unbounded)) {
                let (key, value) = item.map_err(|e| backend("Failed to iterate tree", e))?;
                let fields = decode_fields(kind, &value)?;
                if !filter.matches(&fields) {
                    continue;
                }
                if matches.len() == page_size {
                    next = matches.last().map(|(id, _)| PageToken::new(id.as_str()));
                    break;
                }
                let id = String::from_utf8(key.to_vec())
                    .map_err(|e| backend("Corrupt record key", e))?;
                matches.push((RecordId::new(id), fields));
            }
            Ok((matches, next))
        })
        .await?;

        let records = matches
            .into_iter()
            .map(|(id, fields)| Record {
                id,
                fields: project(fields, select),
            })
            .collect();
        Ok(Page { records, next })
    }

    async fn create(&self, kind: EntityKind, fields: Fields) -> Result<RecordId, StorageError> {
        let tree = self.tree(kind)?;
        let value = encode_fields(kind, &fields)?;
        // Allocated before the first await so concurrent creates polled in
        // order get ids in that order.
        let n = self
            .db
            .generate_id()
            .map_err(|e| backend("Failed to generate id", e))?;
        let id = RecordId::new(format!("{:016x}", n));
        blocking(move || {
            tree.insert(id.as_str().as_bytes(), value)
                .map_err(|e| backend("Failed to insert record", e))?;
            Ok(id)
        })
        .await
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: &RecordId,
        fields: Fields,
    ) -> Result<(), StorageError> {
        let tree = self.tree(kind)?;
        let key = id.clone();
        blocking(move || {
            let existing = tree
                .get(key.as_str().as_bytes())
                .map_err(|e| backend("Failed to get record", e))?
                .ok_or_else(|| StorageError::NotFound {
                    kind,
                    id: key.clone(),
                })?;
            let mut merged = decode_fields(kind, &existing)?;
            merged.extend(fields);
            tree.insert(key.as_str().as_bytes(), encode_fields(kind, &merged)?)
                .map_err(|e| backend("Failed to update record", e))?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, kind: EntityKind, id: &RecordId) -> Result<(), StorageError> {
        let tree = self.tree(kind)?;
        let key = id.clone();
        blocking(move || {
            let removed = tree
                .remove(key.as_str().as_bytes())
                .map_err(|e| backend("Failed to delete record", e))?;
            match removed {
                Some(_) => Ok(()),
                None => Err(StorageError::NotFound { kind, id: key }),
            }
        })
        .await
    }
}
