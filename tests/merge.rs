//! Region merging: unioning basins and reconciling border joins.

use hydronet::testing::{joins_of, line_in, store_of};
use hydronet::{Diagnostics, Error, FlowlineId, merge_regions};

fn id(raw: u64) -> FlowlineId {
    FlowlineId::new(raw)
}

#[test]
fn union_keeps_all_rows_and_edges() {
    let basin_x = (
        store_of(vec![
            line_in(1, "0101", &[(0.0, 0.0), (10.0, 0.0)]),
            line_in(2, "0101", &[(10.0, 0.0), (20.0, 0.0)]),
        ]),
        joins_of(&[(1, 2), (2, 0)]),
    );
    let basin_y = (
        store_of(vec![line_in(5, "0102", &[(50.0, 0.0), (60.0, 0.0)])]),
        joins_of(&[(0, 5)]),
    );

    let mut diags = Diagnostics::new();
    let (store, joins) = merge_regions(vec![basin_x, basin_y], &mut diags).unwrap();
    assert_eq!(store.len(), 3);
    assert_eq!(joins.len(), 3);
    assert!(joins.contains(id(1), id(2)));
    assert!(joins.contains(FlowlineId::SENTINEL, id(5)));
    assert!(diags.is_empty());
}

#[test]
fn duplicate_id_across_basins_is_fatal() {
    let basin_x = (
        store_of(vec![line_in(1, "0101", &[(0.0, 0.0), (10.0, 0.0)])]),
        joins_of(&[]),
    );
    let basin_y = (
        store_of(vec![line_in(1, "0102", &[(90.0, 0.0), (99.0, 0.0)])]),
        joins_of(&[]),
    );

    let mut diags = Diagnostics::new();
    let err = merge_regions(vec![basin_x, basin_y], &mut diags).unwrap_err();
    match err {
        Error::DuplicateAcrossBasins { id, first, second } => {
            assert_eq!(id.raw(), 1);
            assert_eq!((first.as_str(), second.as_str()), ("0101", "0102"));
        }
        other => panic!("expected DuplicateAcrossBasins, got {other}"),
    }
}

#[test]
fn border_stitch_requires_sentinels_on_both_sides() {
    // a ends at the border, but b already has a real upstream neighbor, so
    // no stitch happens.
    let basin_x = (
        store_of(vec![line_in(1, "0101", &[(0.0, 0.0), (10.0, 0.0)])]),
        joins_of(&[(1, 0)]),
    );
    let basin_y = (
        store_of(vec![
            line_in(2, "0102", &[(10.0, 0.0), (20.0, 0.0)]),
            line_in(3, "0102", &[(10.0, 5.0), (10.0, 0.0)]),
        ]),
        joins_of(&[(3, 2), (2, 0), (0, 3)]),
    );

    let mut diags = Diagnostics::new();
    let (_, joins) = merge_regions(vec![basin_x, basin_y], &mut diags).unwrap();
    assert!(joins.contains(id(1), FlowlineId::SENTINEL));
    assert!(!joins.contains(id(1), id(2)));
}

#[test]
fn border_stitch_ignores_same_basin_matches() {
    // Same-basin flowlines sharing a point stay connected through their own
    // join table, never through border stitching.
    let basin = (
        store_of(vec![
            line_in(1, "0101", &[(0.0, 0.0), (10.0, 0.0)]),
            line_in(2, "0101", &[(10.0, 0.0), (20.0, 0.0)]),
        ]),
        joins_of(&[(1, 0), (0, 2)]),
    );

    let mut diags = Diagnostics::new();
    let (_, joins) = merge_regions(vec![basin], &mut diags).unwrap();
    assert!(joins.contains(id(1), FlowlineId::SENTINEL));
    assert!(joins.contains(FlowlineId::SENTINEL, id(2)));
    assert!(diags.is_empty());
}

#[test]
fn two_termini_converging_on_one_origin_is_ambiguous() {
    let basin_x = (
        store_of(vec![
            line_in(1, "0101", &[(0.0, 0.0), (10.0, 0.0)]),
            line_in(2, "0103", &[(10.0, 10.0), (10.0, 0.0)]),
        ]),
        joins_of(&[(1, 0), (2, 0)]),
    );
    let basin_y = (
        store_of(vec![line_in(3, "0102", &[(10.0, 0.0), (20.0, 0.0)])]),
        joins_of(&[(0, 3)]),
    );

    let mut diags = Diagnostics::new();
    let (_, joins) = merge_regions(vec![basin_x, basin_y], &mut diags).unwrap();
    // Neither terminus wins; all sentinels stay.
    assert!(joins.contains(id(1), FlowlineId::SENTINEL));
    assert!(joins.contains(id(2), FlowlineId::SENTINEL));
    assert!(joins.contains(FlowlineId::SENTINEL, id(3)));
    assert_eq!(diags.len(), 2);
}

#[test]
fn merge_is_commutative_up_to_row_order() {
    let make_x = || {
        (
            store_of(vec![line_in(1, "0101", &[(0.0, 0.0), (10.0, 0.0)])]),
            joins_of(&[(0, 1), (1, 0)]),
        )
    };
    let make_y = || {
        (
            store_of(vec![line_in(2, "0102", &[(10.0, 0.0), (20.0, 0.0)])]),
            joins_of(&[(0, 2), (2, 0)]),
        )
    };

    let mut diags_xy = Diagnostics::new();
    let (store_xy, joins_xy) = merge_regions(vec![make_x(), make_y()], &mut diags_xy).unwrap();
    let mut diags_yx = Diagnostics::new();
    let (store_yx, joins_yx) = merge_regions(vec![make_y(), make_x()], &mut diags_yx).unwrap();

    assert_eq!(
        store_xy.iter().collect::<Vec<_>>(),
        store_yx.iter().collect::<Vec<_>>()
    );
    assert_eq!(joins_xy, joins_yx);
    assert_eq!(diags_xy.len(), diags_yx.len());
}

#[test]
fn stitch_tolerance_is_one_centimeter() {
    let near = (
        store_of(vec![line_in(1, "0101", &[(0.0, 0.0), (10.0, 0.0)])]),
        joins_of(&[(1, 0)]),
    );
    // Start point 9 mm away: stitched.
    let close_enough = (
        store_of(vec![line_in(2, "0102", &[(10.009, 0.0), (20.0, 0.0)])]),
        joins_of(&[(0, 2)]),
    );
    let mut diags = Diagnostics::new();
    let (_, joins) = merge_regions(vec![near.clone(), close_enough], &mut diags).unwrap();
    assert!(joins.contains(id(1), id(2)));

    // Start point 2 cm away: left apart.
    let too_far = (
        store_of(vec![line_in(2, "0102", &[(10.02, 0.0), (20.0, 0.0)])]),
        joins_of(&[(0, 2)]),
    );
    let mut diags = Diagnostics::new();
    let (_, joins) = merge_regions(vec![near, too_far], &mut diags).unwrap();
    assert!(!joins.contains(id(1), id(2)));
    assert!(joins.contains(id(1), FlowlineId::SENTINEL));
    assert!(diags.is_empty());
}
