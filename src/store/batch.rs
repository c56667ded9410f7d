//! Chunked concurrent writes.
//!
//! Pieces are independent records, so the writes of one pass are issued
//! concurrently in bounded chunks. Chunks run one after another; the first
//! failure aborts the remaining chunks and earlier writes stay in place.

use crate::error::StorageError;
use crate::store::{EntityKind, Fields, Filter, PageToken, RecordStore};
use crate::types::RecordId;
use futures::future::try_join_all;
use tracing::debug;

/// Create every record, `chunk_size` at a time. Ids come back in input order.
pub async fn create_all(
    store: &dyn RecordStore,
    kind: EntityKind,
    records: Vec<Fields>,
    chunk_size: usize,
) -> Result<Vec<RecordId>, StorageError> {
    let chunk_size = chunk_size.max(1);
    let mut ids = Vec::with_capacity(records.len());
    let mut records = records.into_iter().peekable();
    while records.peek().is_some() {
        let chunk: Vec<Fields> = records.by_ref().take(chunk_size).collect();
        debug!(kind = %kind, count = chunk.len(), "Creating record chunk");
        let created = try_join_all(chunk.into_iter().map(|fields| store.create(kind, fields))).await?;
        ids.extend(created);
    }
    Ok(ids)
}

/// Merge `fields` into each listed record, `chunk_size` at a time.
pub async fn update_all(
    store: &dyn RecordStore,
    kind: EntityKind,
    updates: Vec<(RecordId, Fields)>,
    chunk_size: usize,
) -> Result<usize, StorageError> {
    let chunk_size = chunk_size.max(1);
    let total = updates.len();
    for chunk in updates.chunks(chunk_size) {
        debug!(kind = %kind, count = chunk.len(), "Updating record chunk");
        try_join_all(
            chunk
                .iter()
                .map(|(id, fields)| store.update(kind, id, fields.clone())),
        )
        .await?;
    }
    Ok(total)
}

/// Delete every record matching `filter`, walking the result pages.
///
/// Each page is deleted before the next one is requested; the continuation
/// token is the last id of the page, which keyset pagination tolerates even
/// though that record is gone by then.
pub async fn delete_matching(
    store: &dyn RecordStore,
    kind: EntityKind,
    filter: &Filter,
    chunk_size: usize,
) -> Result<usize, StorageError> {
    let chunk_size = chunk_size.max(1);
    let mut deleted = 0usize;
    let mut token: Option<PageToken> = None;
    loop {
        let page = store.query(kind, filter, &[], token.as_ref()).await?;
        let ids: Vec<RecordId> = page.records.into_iter().map(|r| r.id).collect();
        for chunk in ids.chunks(chunk_size) {
            try_join_all(chunk.iter().map(|id| store.delete(kind, id))).await?;
            deleted += chunk.len();
        }
        match page.next {
            Some(next) => token = Some(next),
            None => break,
        }
    }
    debug!(kind = %kind, deleted, "Deleted matching records");
    Ok(deleted)
}
