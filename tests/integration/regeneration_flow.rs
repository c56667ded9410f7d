//! End-to-end regeneration against the in-memory store

use crate::integration::test_utils::{labelled, members_of, pieces_of, seed_bay, FixtureOptions};
use baycut::confirm::{AlwaysConfirm, Decline};
use baycut::geometry::Zone;
use baycut::piece::{Role, Side};
use baycut::regeneration::ImposteOutcome;
use baycut::store::{EntityKind, InMemoryRecordStore};
use baycut::{BaycutConfig, ChassisError, Regenerator};
use std::collections::BTreeMap;
use std::sync::Arc;

fn regenerator(store: &Arc<InMemoryRecordStore>) -> Regenerator {
    Regenerator::new(store.clone(), BaycutConfig::default())
}

#[tokio::test]
async fn reference_bay_produces_every_pass() {
    let store = Arc::new(InMemoryRecordStore::new());
    let bay = seed_bay(store.as_ref(), &FixtureOptions::default()).await;

    let report = regenerator(&store)
        .regenerate(&bay.bay_id, &AlwaysConfirm)
        .await
        .unwrap();

    assert_eq!(report.deleted_pieces, 0);
    assert_eq!(report.frame_pieces, 7);
    assert_eq!(report.skipped_lines, 1);
    assert_eq!(report.top_transom_segments, 0);
    assert!(matches!(report.imposte, ImposteOutcome::Inserted(_)));
    assert_eq!(report.mullion_pieces, 1);
    assert_eq!(report.transom_pieces, 1);
    assert_eq!(report.cells, 4);
    assert_eq!(report.bead_pieces, 16);
    assert_eq!(report.total_pieces(), 25);
    assert_eq!(store.count(EntityKind::GeneratedPiece), 25);
}

#[tokio::test]
async fn passage_is_left_unglazed_below_the_imposte() {
    let store = Arc::new(InMemoryRecordStore::new());
    let bay = seed_bay(store.as_ref(), &FixtureOptions::default()).await;
    regenerator(&store)
        .regenerate(&bay.bay_id, &AlwaysConfirm)
        .await
        .unwrap();

    let pieces = pieces_of(store.as_ref(), &bay.bay_id).await;
    let bottoms: Vec<_> = pieces
        .iter()
        .filter(|p| p.role == Role::Bead && p.side == Some(Side::Bottom))
        .collect();
    assert_eq!(bottoms.len(), 4);

    for bead in &bottoms {
        let (start, end) = (bead.span_start.unwrap(), bead.span_end.unwrap());
        if bead.position == Some(0.0) {
            // Fixed zones only under the imposte.
            assert!(end <= 400.0 || start >= 800.0);
            assert_ne!(bead.zone, Zone::Passage);
        } else {
            // Full width above, split by the resting mullion.
            assert_eq!(bead.position, Some(1800.0));
            assert_eq!(bead.zone, Zone::Bay);
            assert!(start == 0.0 || start == 600.0);
        }
    }

    // Every cell key groups exactly four beads.
    let mut cells: BTreeMap<String, usize> = BTreeMap::new();
    for bead in pieces.iter().filter(|p| p.role == Role::Bead) {
        *cells
            .entry(bead.cell_key.as_ref().unwrap().as_str().to_string())
            .or_default() += 1;
    }
    assert_eq!(cells.len(), 4);
    assert!(cells.values().all(|count| *count == 4));
}

#[tokio::test]
async fn frame_mullions_on_the_passage_stop_at_the_imposte() {
    let store = Arc::new(InMemoryRecordStore::new());
    let bay = seed_bay(store.as_ref(), &FixtureOptions::default()).await;
    regenerator(&store)
        .regenerate(&bay.bay_id, &AlwaysConfirm)
        .await
        .unwrap();

    let pieces = pieces_of(store.as_ref(), &bay.bay_id).await;
    let left_post = labelled(&pieces, "FIXED_LEFT_MULLION_RIGHT");
    assert_eq!(left_post.len(), 1);
    assert_eq!(left_post[0].position, Some(400.0));
    assert_eq!(left_post[0].span_end, Some(1800.0));

    let filler = labelled(&pieces, "PASSAGE_FILLER_LEFT");
    assert_eq!(filler.len(), 1);
    assert_eq!(filler[0].orientation, None);
    assert!(labelled(&pieces, "ATTIC_TRANSOM_TOP").is_empty());
    assert!(labelled(&pieces, "BAY_GASKET").is_empty());
}

#[tokio::test]
async fn top_transom_is_split_when_mullions_run_through() {
    let store = Arc::new(InMemoryRecordStore::new());
    let options = FixtureOptions {
        mullions_through: true,
        resting_mullion: false,
        ..FixtureOptions::default()
    };
    let bay = seed_bay(store.as_ref(), &options).await;

    let report = regenerator(&store)
        .regenerate(&bay.bay_id, &AlwaysConfirm)
        .await
        .unwrap();
    assert_eq!(report.top_transom_segments, 3);
    assert_eq!(report.frame_pieces, 9);

    let pieces = pieces_of(store.as_ref(), &bay.bay_id).await;
    let top = labelled(&pieces, "BAY_TRANSOM_TOP");
    let spans: Vec<(f64, f64)> = top
        .iter()
        .map(|p| (p.span_start.unwrap(), p.span_end.unwrap()))
        .collect();
    assert_eq!(spans, vec![(0.0, 400.0), (400.0, 800.0), (800.0, 1200.0)]);
    assert!(top.iter().all(|p| p.quantity == 1));

    // The imposte is cut by the two posts that now run through it.
    assert_eq!(report.transom_pieces, 3);
}

#[tokio::test]
async fn regeneration_is_deterministic() {
    let store = Arc::new(InMemoryRecordStore::new());
    let bay = seed_bay(store.as_ref(), &FixtureOptions::default()).await;
    let regenerator = regenerator(&store);

    regenerator
        .regenerate(&bay.bay_id, &AlwaysConfirm)
        .await
        .unwrap();
    let first = pieces_of(store.as_ref(), &bay.bay_id).await;

    let report = regenerator
        .regenerate(&bay.bay_id, &AlwaysConfirm)
        .await
        .unwrap();
    let second = pieces_of(store.as_ref(), &bay.bay_id).await;

    assert_eq!(report.deleted_pieces, first.len());
    assert_eq!(first, second);
}

#[tokio::test]
async fn imposte_is_updated_in_place_on_rerun() {
    let store = Arc::new(InMemoryRecordStore::new());
    let bay = seed_bay(store.as_ref(), &FixtureOptions::default()).await;
    let regenerator = regenerator(&store);

    let first = regenerator
        .regenerate(&bay.bay_id, &AlwaysConfirm)
        .await
        .unwrap();
    let imposte_id = match &first.imposte {
        ImposteOutcome::Inserted(id) => id.clone(),
        other => panic!("expected an inserted imposte, got {:?}", other),
    };

    let second = regenerator
        .regenerate(&bay.bay_id, &AlwaysConfirm)
        .await
        .unwrap();
    assert_eq!(second.imposte, ImposteOutcome::Updated(imposte_id.clone()));

    let members = members_of(store.as_ref(), &bay.bay_id).await;
    assert_eq!(members.len(), 2);
    let (_, imposte) = members.iter().find(|(id, _)| *id == imposte_id).unwrap();
    assert_eq!(imposte.position, 1800.0);
    assert_eq!(imposte.run_end, Some(1200.0));
    assert_eq!(imposte.material_id, Some(bay.materials.imposte.clone()));
}

#[tokio::test]
async fn missing_imposte_material_only_skips_the_imposte() {
    let store = Arc::new(InMemoryRecordStore::new());
    let options = FixtureOptions {
        imposte_material: false,
        ..FixtureOptions::default()
    };
    let bay = seed_bay(store.as_ref(), &options).await;

    let report = regenerator(&store)
        .regenerate(&bay.bay_id, &AlwaysConfirm)
        .await
        .unwrap();
    assert!(matches!(report.imposte, ImposteOutcome::Failed(_)));
    assert!(report.warnings.iter().any(|w| w.contains("Imposte")));
    assert_eq!(report.transom_pieces, 0);
    assert_eq!(report.frame_pieces, 7);
    assert!(report.bead_pieces > 0);
    assert_eq!(members_of(store.as_ref(), &bay.bay_id).await.len(), 1);
}

#[tokio::test]
async fn declined_confirmation_changes_nothing() {
    let store = Arc::new(InMemoryRecordStore::new());
    let bay = seed_bay(store.as_ref(), &FixtureOptions::default()).await;
    let regenerator = regenerator(&store);
    regenerator
        .regenerate(&bay.bay_id, &AlwaysConfirm)
        .await
        .unwrap();
    let before = pieces_of(store.as_ref(), &bay.bay_id).await;

    let err = regenerator
        .regenerate(&bay.bay_id, &Decline)
        .await
        .unwrap_err();
    assert!(matches!(err, ChassisError::Cancelled));
    assert_eq!(pieces_of(store.as_ref(), &bay.bay_id).await, before);
}

#[tokio::test]
async fn failing_piece_writes_abort_the_regeneration() {
    let store = Arc::new(InMemoryRecordStore::new());
    let bay = seed_bay(store.as_ref(), &FixtureOptions::default()).await;
    store.fail_writes_for(EntityKind::GeneratedPiece);

    let err = regenerator(&store)
        .regenerate(&bay.bay_id, &AlwaysConfirm)
        .await
        .unwrap_err();
    assert!(matches!(err, ChassisError::StorageError(_)));
    assert_eq!(store.count(EntityKind::GeneratedPiece), 0);
}

#[tokio::test]
async fn reset_removes_only_this_bays_pieces() {
    let store = Arc::new(InMemoryRecordStore::new());
    let first = seed_bay(store.as_ref(), &FixtureOptions::default()).await;
    let second = seed_bay(store.as_ref(), &FixtureOptions::default()).await;
    let regenerator = regenerator(&store);
    for bay in [&first, &second] {
        regenerator
            .regenerate(&bay.bay_id, &AlwaysConfirm)
            .await
            .unwrap();
    }

    let deleted = regenerator.reset(&first.bay_id).await.unwrap();
    assert_eq!(deleted, 25);
    assert!(pieces_of(store.as_ref(), &first.bay_id).await.is_empty());
    assert_eq!(pieces_of(store.as_ref(), &second.bay_id).await.len(), 25);
}
