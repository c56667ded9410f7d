//! Regeneration on the sled-backed store

use crate::integration::test_utils::{pieces_of, seed_bay, FixtureOptions};
use baycut::confirm::AlwaysConfirm;
use baycut::store::SledRecordStore;
use baycut::{BaycutConfig, Regenerator};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test(flavor = "multi_thread")]
async fn regeneration_survives_reopening_the_store() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store");

    let (bay_id, expected) = {
        let store = Arc::new(SledRecordStore::new(&path, 7).unwrap());
        let bay = seed_bay(store.as_ref(), &FixtureOptions::default()).await;
        let report = Regenerator::new(store.clone(), BaycutConfig::default())
            .regenerate(&bay.bay_id, &AlwaysConfirm)
            .await
            .unwrap();
        assert_eq!(report.total_pieces(), 25);
        store.flush().await.unwrap();
        (bay.bay_id.clone(), pieces_of(store.as_ref(), &bay.bay_id).await)
    };

    let store = SledRecordStore::new(&path, 7).unwrap();
    let reopened = pieces_of(&store, &bay_id).await;
    assert_eq!(reopened.len(), 25);
    assert_eq!(reopened, expected);
}

#[tokio::test(flavor = "multi_thread")]
async fn small_pages_give_the_same_layout_as_memory() {
    let temp_dir = TempDir::new().unwrap();
    let sled_store = Arc::new(SledRecordStore::new(temp_dir.path().join("store"), 3).unwrap());
    let memory_store = Arc::new(baycut::store::InMemoryRecordStore::new());

    let mut layouts = Vec::new();
    for store in [
        sled_store as Arc<dyn baycut::store::RecordStore>,
        memory_store as Arc<dyn baycut::store::RecordStore>,
    ] {
        let bay = seed_bay(store.as_ref(), &FixtureOptions::default()).await;
        Regenerator::new(store.clone(), BaycutConfig::default())
            .regenerate(&bay.bay_id, &AlwaysConfirm)
            .await
            .unwrap();
        let mut pieces: Vec<String> = pieces_of(store.as_ref(), &bay.bay_id)
            .await
            .into_iter()
            .map(|mut piece| {
                // Ids differ between backends.
                piece.bay_id = "bay".into();
                piece.material_id = None;
                piece.nomenclature_id = None;
                serde_json::to_string(&piece).unwrap()
            })
            .collect();
        pieces.sort();
        layouts.push(pieces);
    }
    assert_eq!(layouts[0], layouts[1]);
}

#[tokio::test(flavor = "multi_thread")]
async fn configured_store_regenerates_deterministically() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = BaycutConfig::default();
    config.store.path = temp_dir.path().join("configured");
    config.store.page_size = 4;
    config.store.write_chunk_size = 25;

    let regenerator = Regenerator::open(config).unwrap();
    let bay = seed_bay(regenerator.store(), &FixtureOptions::default()).await;

    regenerator
        .regenerate(&bay.bay_id, &AlwaysConfirm)
        .await
        .unwrap();
    let first = pieces_of(regenerator.store(), &bay.bay_id).await;
    let report = regenerator
        .regenerate(&bay.bay_id, &AlwaysConfirm)
        .await
        .unwrap();
    let second = pieces_of(regenerator.store(), &bay.bay_id).await;

    assert_eq!(report.deleted_pieces, 25);
    assert_eq!(first.len(), 25);
    // Same pieces in the same store order, lengths included.
    assert_eq!(first, second);
    assert!(temp_dir.path().join("configured").exists());
}
