//! In-memory record store.
//!
//! Records are kept per entity kind in id order, so queries and pagination
//! are deterministic. Used by tests and by callers that stage a bay before
//! handing it to a persistent backend.

use crate::error::StorageError;
use crate::store::{project, EntityKind, Fields, Filter, Page, PageToken, Record, RecordStore};
use crate::types::RecordId;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct InMemoryRecordStore {
    tables: RwLock<HashMap<EntityKind, BTreeMap<RecordId, Fields>>>,
    next_id: AtomicU64,
    page_size: usize,
    failing_writes: RwLock<HashSet<EntityKind>>,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRecordStore {
    pub const DEFAULT_PAGE_SIZE: usize = 5000;

    pub fn new() -> Self {
        Self::with_page_size(Self::DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            page_size: page_size.max(1),
            failing_writes: RwLock::new(HashSet::new()),
        }
    }

    /// Make every subsequent create/update/delete on `kind` fail.
    pub fn fail_writes_for(&self, kind: EntityKind) {
        self.failing_writes.write().insert(kind);
    }

    /// Number of stored records of `kind`.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.tables.read().get(&kind).map(|t| t.len()).unwrap_or(0)
    }

    fn check_writable(&self, kind: EntityKind) -> Result<(), StorageError> {
        if self.failing_writes.read().contains(&kind) {
            return Err(StorageError::Backend(format!(
                "writes to {} are failing",
                kind
            )));
        }
        Ok(())
    }

    fn mint_id(&self) -> RecordId {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        RecordId::new(format!("{:016x}", n))
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get(
        &self,
        kind: EntityKind,
        id: &RecordId,
        select: &[&str],
    ) -> Result<Record, StorageError> {
        let tables = self.tables.read();
        let fields = tables
            .get(&kind)
            .and_then(|t| t.get(id))
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                kind,
                id: id.clone(),
            })?;
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
        let tables = self.tables.read();
        let Some(table) = tables.get(&kind) else {
            return Ok(Page::default());
        };
        let lower = match page {
            Some(token) => Bound::Excluded(RecordId::new(token.as_str())),
            None => Bound::Unbounded,
        };

        let mut records = Vec::new();
        let mut next = None;
        for (id, fields) in table.range((lower, Bound::Unbounded)) {
            if !filter.matches(fields) {
                continue;
            }
            if records.len() == self.page_size {
                // More matches remain; resume after the last returned id.
                next = records
                    .last()
                    .map(|r: &Record| PageToken::new(r.id.as_str()));
                break;
            }
            records.push(Record {
                id: id.clone(),
                fields: project(fields.clone(), select),
            });
        }
        Ok(Page { records, next })
    }

    async fn create(&self, kind: EntityKind, fields: Fields) -> Result<RecordId, StorageError> {
        self.check_writable(kind)?;
        let id = self.mint_id();
        self.tables
            .write()
            .entry(kind)
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: &RecordId,
        fields: Fields,
    ) -> Result<(), StorageError> {
        self.check_writable(kind)?;
        let mut tables = self.tables.write();
        let existing = tables
            .get_mut(&kind)
            .and_then(|t| t.get_mut(id))
            .ok_or_else(|| StorageError::NotFound {
                kind,
                id: id.clone(),
            })?;
        existing.extend(fields);
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: &RecordId) -> Result<(), StorageError> {
        self.check_writable(kind)?;
        let removed = self
            .tables
            .write()
            .get_mut(&kind)
            .and_then(|t| t.remove(id));
        match removed {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound {
                kind,
                id: id.clone(),
            }),
        }
    }
}
