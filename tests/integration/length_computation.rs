//! Cut lengths computed after a full regeneration

use crate::integration::test_utils::{labelled, pieces_of, seed_bay, FixtureOptions, SeededBay};
use baycut::confirm::AlwaysConfirm;
use baycut::piece::{Role, Side};
use baycut::store::records::{encode, NomenclatureRecord};
use baycut::store::{fetch_all, EntityKind, Filter, InMemoryRecordStore, RecordStore};
use baycut::{BaycutConfig, Regenerator};
use std::sync::Arc;

async fn regenerated(options: &FixtureOptions) -> (Arc<InMemoryRecordStore>, Regenerator, SeededBay) {
    let store = Arc::new(InMemoryRecordStore::new());
    let bay = seed_bay(store.as_ref(), options).await;
    let regenerator = Regenerator::new(store.clone(), BaycutConfig::default());
    regenerator
        .regenerate(&bay.bay_id, &AlwaysConfirm)
        .await
        .unwrap();
    (store, regenerator, bay)
}

#[tokio::test]
async fn engine_and_formulas_cover_the_reference_bay() {
    let (store, _, bay) = regenerated(&FixtureOptions::default()).await;
    let pieces = pieces_of(store.as_ref(), &bay.bay_id).await;

    // Formula lengths on the plain frame lines.
    assert_eq!(labelled(&pieces, "BAY_TRANSOM_TOP")[0].cut_length, Some(1200));
    assert_eq!(labelled(&pieces, "BAY_MULLION_LEFT")[0].cut_length, Some(1960));
    assert_eq!(labelled(&pieces, "FIXED_LEFT_MULLION_RIGHT")[0].cut_length, Some(1780));
    // No formula, no engine rule.
    assert_eq!(labelled(&pieces, "PASSAGE_FILLER_LEFT")[0].cut_length, None);

    // Mullion standing on the imposte: 200 - (60/2 + 24/2) - 20.
    let mullion = pieces.iter().find(|p| p.role == Role::Mullion).unwrap();
    assert_eq!(mullion.cut_length, Some(138));

    // Imposte between the two bay jambs.
    let imposte = pieces.iter().find(|p| p.role == Role::Transom).unwrap();
    assert_eq!(imposte.cut_length, Some(1160));
}

#[tokio::test]
async fn beads_lose_their_neighbours_and_cell_rails() {
    let (store, _, bay) = regenerated(&FixtureOptions::default()).await;
    let pieces = pieces_of(store.as_ref(), &bay.bay_id).await;
    let beads = |side: Side, y: f64| -> Vec<Option<u32>> {
        pieces
            .iter()
            .filter(|p| p.role == Role::Bead && p.side == Some(side))
            .filter(|p| match side {
                Side::Left | Side::Right => p.span_start == Some(y),
                Side::Bottom | Side::Top => p.position == Some(y),
            })
            .map(|p| p.cut_length)
            .collect()
    };

    // Lower fixed cells: 1800 - 20 (sill) - 12 (half imposte) - 16 (rails).
    assert_eq!(beads(Side::Left, 0.0), vec![Some(1752), Some(1752)]);
    // 400 - 20 (jamb) - 30 (post).
    assert_eq!(beads(Side::Bottom, 0.0), vec![Some(350), Some(350)]);
    // Upper cells: 200 - 12 (half imposte) - 20 (head) - 16 (rails).
    assert_eq!(beads(Side::Right, 1800.0), vec![Some(152), Some(152)]);
    // 600 - 20 (jamb) - 15 (half mullion).
    assert_eq!(beads(Side::Top, 2000.0), vec![Some(565), Some(565)]);
}

#[tokio::test]
async fn passage_head_segment_gets_the_filler_bonus() {
    let options = FixtureOptions {
        mullions_through: true,
        resting_mullion: false,
        ..FixtureOptions::default()
    };
    let (store, _, bay) = regenerated(&options).await;
    let pieces = pieces_of(store.as_ref(), &bay.bay_id).await;
    let head: Vec<Option<u32>> = labelled(&pieces, "BAY_TRANSOM_TOP")
        .iter()
        .map(|p| p.cut_length)
        .collect();
    assert_eq!(head, vec![Some(365), Some(412), Some(365)]);
}

#[tokio::test]
async fn lengths_can_be_recomputed_without_regenerating() {
    let (store, regenerator, bay) = regenerated(&FixtureOptions::default()).await;
    let before = pieces_of(store.as_ref(), &bay.bay_id).await;

    let report = regenerator.compute_lengths(&bay.bay_id).await.unwrap();
    assert_eq!(report.by_engine, 18);
    assert_eq!(report.by_formula, 6);
    assert_eq!(report.unresolved, 1);
    assert!(report.formula_failures.is_empty());
    assert_eq!(store.count(EntityKind::GeneratedPiece), before.len());
    assert_eq!(pieces_of(store.as_ref(), &bay.bay_id).await, before);
}

#[tokio::test]
async fn broken_formulas_are_reported_and_skipped() {
    let (store, regenerator, bay) = regenerated(&FixtureOptions::default()).await;

    let lines: Vec<_> = fetch_all::<NomenclatureRecord>(
        store.as_ref(),
        &Filter::eq("model_id", bay.model_id.as_str()),
    )
    .await
    .unwrap();
    let (line_id, mut line) = lines
        .into_iter()
        .find(|(_, line)| line.position == "BAY_TRANSOM_TOP")
        .unwrap();
    line.formula = Some("BAY_WIDTH / (PASSAGE_HEIGHT - 1800)".to_string());
    store
        .update(
            EntityKind::NomenclatureLine,
            &line_id,
            encode(&line).unwrap(),
        )
        .await
        .unwrap();

    let report = regenerator.compute_lengths(&bay.bay_id).await.unwrap();
    assert_eq!(report.formula_failures.len(), 1);
    assert_eq!(report.formula_failures[0].nomenclature_id, line_id);
    assert_eq!(report.by_formula, 5);

    // The previous value is kept when nothing new was computed.
    let pieces = pieces_of(store.as_ref(), &bay.bay_id).await;
    assert_eq!(labelled(&pieces, "BAY_TRANSOM_TOP")[0].cut_length, Some(1200));
}
