//! Property-based tests for segmentation and cut-length guarantees

use baycut::cutting::{CutLengthEngine, EngineSettings, Thickness, ThicknessCache};
use baycut::generation::{generate_cells, materialize_members, segment_transoms, Member, MemberKind};
use baycut::geometry::{segment_band, Crosser, CrossingRule, FrameContext, Span, Zone};
use baycut::types::RecordId;
use proptest::prelude::*;

const TOL: f64 = FrameContext::DEFAULT_TOLERANCE;

fn context(width: f64, height: f64) -> FrameContext {
    FrameContext {
        bay_width: width,
        bay_height: height,
        fixed_left_width: 0.0,
        fixed_right_width: 0.0,
        passage_width: 0.0,
        passage_height: None,
        mullions_through: false,
        has_imposte: false,
        tolerance: TOL,
    }
}

fn member(kind: MemberKind, position: f64) -> Member {
    Member {
        id: RecordId::from("member"),
        kind,
        zone: Zone::Bay,
        position,
        run: None,
        material: Some(RecordId::from("profile")),
    }
}

proptest! {
    /// Segments tile the band exactly: contiguous, ordered, no gaps.
    #[test]
    fn segments_tile_the_band(
        cuts in prop::collection::vec(1.0f64..999.0, 0..12),
    ) {
        let band = Span::new(0.0, 1000.0);
        let crossers: Vec<Crosser> = cuts.iter().map(|x| Crosser::new(*x, None)).collect();
        let segments = segment_band(band, &crossers, CrossingRule::Unconditional, 2000.0, TOL);

        prop_assert!(!segments.is_empty());
        prop_assert_eq!(segments[0].start, band.start);
        prop_assert_eq!(segments[segments.len() - 1].end, band.end);
        for pair in segments.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
        }
        for segment in &segments {
            prop_assert!(segment.len() > TOL);
        }
    }

    /// Input order of the crossers never changes the result.
    #[test]
    fn segmentation_ignores_crosser_order(
        cuts in prop::collection::vec(1.0f64..999.0, 0..12),
    ) {
        let band = Span::new(0.0, 1000.0);
        let forward: Vec<Crosser> = cuts.iter().map(|x| Crosser::new(*x, None)).collect();
        let mut reversed = forward.clone();
        reversed.reverse();
        prop_assert_eq!(
            segment_band(band, &forward, CrossingRule::Unconditional, 2000.0, TOL),
            segment_band(band, &reversed, CrossingRule::Unconditional, 2000.0, TOL)
        );
    }

    /// With non-negative thicknesses no covered piece is longer than its span.
    #[test]
    fn cut_lengths_never_exceed_raw_spans(
        mullions in prop::collection::vec(50.0f64..950.0, 0..4),
        transoms in prop::collection::vec(50.0f64..1450.0, 0..3),
        interior in 0.0f64..40.0,
        exterior in 0.0f64..60.0,
    ) {
        let ctx = context(1000.0, 1500.0);
        let mut members: Vec<Member> = mullions
            .iter()
            .map(|x| member(MemberKind::Mullion, *x))
            .collect();
        members.extend(transoms.iter().map(|y| member(MemberKind::Transom, *y)));

        let layout = materialize_members(&ctx, &members, &[]);
        let mut pieces = layout.pieces.clone();
        pieces.extend(segment_transoms(&ctx, &members, &layout));
        let heights: Vec<(Zone, f64)> = transoms.iter().map(|y| (Zone::Bay, *y)).collect();
        pieces.extend(
            generate_cells(&ctx, &heights, &layout.cross_zone, &RecordId::from("bead")).pieces,
        );

        let cache = ThicknessCache::from_products([
            (RecordId::from("profile"), Thickness::new(interior, exterior)),
            (RecordId::from("bead"), Thickness::new(interior / 4.0, exterior / 4.0)),
        ]);
        let lengths = CutLengthEngine::new(&ctx, EngineSettings::default(), &cache).compute(&pieces);

        prop_assert_eq!(lengths.len(), pieces.len());
        for (piece, length) in pieces.iter().zip(&lengths) {
            let length = length.expect("intermediate pieces are always covered");
            prop_assert!(f64::from(length) <= piece.raw_length().floor());
        }
    }

    /// Generating twice from the same inputs gives identical pieces.
    #[test]
    fn glazing_is_deterministic(
        transoms in prop::collection::vec(10.0f64..1490.0, 0..5),
    ) {
        let ctx = context(1000.0, 1500.0);
        let heights: Vec<(Zone, f64)> = transoms.iter().map(|y| (Zone::Bay, *y)).collect();
        let bead = RecordId::from("bead");
        let first = generate_cells(&ctx, &heights, &[], &bead);
        let second = generate_cells(&ctx, &heights, &[], &bead);
        prop_assert_eq!(first.pieces, second.pieces);
        prop_assert_eq!(first.cells, first.bands);
    }
}
