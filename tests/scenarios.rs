//! Literal end-to-end scenarios exercising the full pipeline.

use hydronet::ingest::BarrierRecord;
use hydronet::{
    BarrierInput, BarrierKind, BasinInput, Config, Diagnostic, FlowlineId, FlowlineRecord,
    JoinRecord, Pipeline, RegionInput, SizeClass,
};

const CRS: &str = "ESRI:102003";

fn flowline_record(id: u64, huc4: &str, geometry: Vec<(f64, f64)>) -> FlowlineRecord {
    FlowlineRecord {
        id,
        geometry,
        huc4: huc4.into(),
        gnis_name: None,
        size_class: SizeClass::Headwater,
        is_loop: false,
        perennial: true,
    }
}

fn barrier_record(id: u64, x: f64, y: f64) -> BarrierRecord {
    BarrierRecord {
        id,
        kind: BarrierKind::Dam,
        x,
        y,
        gnis_name: None,
        attributes: Default::default(),
    }
}

fn join(upstream: u64, downstream: u64) -> JoinRecord {
    JoinRecord { upstream, downstream }
}

fn id(raw: u64) -> FlowlineId {
    FlowlineId::new(raw)
}

fn run(basins: Vec<BasinInput>, barriers: Vec<BarrierRecord>) -> hydronet::AnalysisOutputs {
    Pipeline::new(Config::default())
        .run(RegionInput {
            basins,
            barriers: BarrierInput { crs: CRS.into(), records: barriers },
            floodplain: Default::default(),
        })
        .expect("pipeline run")
}

/// One flowline, one dam mid-span: two cut products, two networks.
#[test]
fn single_flowline_one_barrier_mid_span() {
    let basin = BasinInput {
        crs: CRS.into(),
        flowlines: vec![flowline_record(1, "0101", vec![(0.0, 0.0), (100.0, 0.0)])],
        joins: vec![join(0, 1), join(1, 0)],
    };
    let outputs = run(vec![basin], vec![barrier_record(10, 50.0, 0.0)]);

    // The parent is gone; two children with minted ids 2 and 3 replace it.
    assert_eq!(outputs.store.len(), 2);
    assert!(outputs.store.get(id(1)).is_err());
    let upstream_child = outputs.store.get(id(2)).expect("upstream child");
    let downstream_child = outputs.store.get(id(3)).expect("downstream child");
    assert_eq!(upstream_child.length, 50.0);
    assert_eq!(downstream_child.length, 50.0);
    assert_eq!(upstream_child.geometry.first(), hydronet::Point::new(0.0, 0.0));
    assert_eq!(upstream_child.geometry.last(), hydronet::Point::new(50.0, 0.0));
    assert_eq!(downstream_child.geometry.last(), hydronet::Point::new(100.0, 0.0));

    // Joins rewired through the cut point.
    assert!(outputs.joins.contains(id(2), id(3)));
    assert!(outputs.joins.contains(FlowlineId::SENTINEL, id(2)));
    assert!(outputs.joins.contains(id(3), FlowlineId::SENTINEL));

    // Barrier mapped to (upstream child, downstream child).
    let span = outputs.cut.spans[0];
    assert_eq!((span.upstream, span.downstream), (id(2), id(3)));

    // Two networks: the origin-rooted upstream piece, the outflow-rooted
    // downstream piece.
    assert_eq!(outputs.networks.len(), 2);
    assert_eq!(outputs.networks[0].members, vec![id(2)]);
    assert_eq!(outputs.networks[1].members, vec![id(3)]);

    let row = &outputs.barriers[0];
    assert_eq!(row.upstream_network, Some(id(2)));
    assert_eq!(row.downstream_network, Some(id(3)));
    assert!(!row.at_endpoint);
    assert_eq!(row.snap_dist, 0.0);
}

/// A barrier within 1 m of the upstream endpoint collapses onto it: no cut.
#[test]
fn endpoint_collapse_produces_no_cut() {
    let basin = BasinInput {
        crs: CRS.into(),
        flowlines: vec![flowline_record(1, "0101", vec![(0.0, 0.0), (100.0, 0.0)])],
        joins: vec![join(0, 1), join(1, 0)],
    };
    let outputs = run(vec![basin], vec![barrier_record(10, 0.2, 0.0)]);

    // No cut: the store still holds the single original flowline.
    assert_eq!(outputs.store.len(), 1);
    assert!(outputs.store.get(id(1)).is_ok());

    let snap = outputs.snapped[0].snap.expect("snapped");
    assert!(snap.at_endpoint);
    assert_eq!(snap.measure, 0.0);
    assert_eq!(snap.point, hydronet::Point::new(0.0, 0.0));

    // The barrier is an origin marker: nothing upstream of it.
    let row = &outputs.barriers[0];
    assert!(row.at_endpoint);
    assert_eq!(row.upstream_network, None);
    assert_eq!(row.downstream_network, Some(id(1)));
    assert_eq!(outputs.networks.len(), 1);
}

/// Two basins sharing a border point are stitched back together.
#[test]
fn border_stitch_reconnects_basins() {
    let basin_x = BasinInput {
        crs: CRS.into(),
        flowlines: vec![flowline_record(1, "0101", vec![(0.0, 0.0), (10.0, 0.0)])],
        joins: vec![join(0, 1), join(1, 0)],
    };
    let basin_y = BasinInput {
        crs: CRS.into(),
        flowlines: vec![flowline_record(2, "0102", vec![(10.0, 0.0), (20.0, 0.0)])],
        joins: vec![join(0, 2), join(2, 0)],
    };
    let outputs = run(vec![basin_x, basin_y], vec![]);

    assert!(outputs.joins.contains(id(1), id(2)));
    assert!(!outputs.joins.contains(id(1), FlowlineId::SENTINEL));
    assert!(!outputs.joins.contains(FlowlineId::SENTINEL, id(2)));
    assert!(outputs.diagnostics.is_empty());

    // Both sides of the border are assigned.
    assert!(outputs.assignment.network_of(id(1)).is_some());
    assert!(outputs.assignment.network_of(id(2)).is_some());
}

/// Two candidate continuations at the border: refuse to guess.
#[test]
fn border_ambiguity_leaves_sentinels() {
    let basin_x = BasinInput {
        crs: CRS.into(),
        flowlines: vec![flowline_record(1, "0101", vec![(0.0, 0.0), (10.0, 0.0)])],
        joins: vec![join(0, 1), join(1, 0)],
    };
    let basin_y = BasinInput {
        crs: CRS.into(),
        flowlines: vec![
            flowline_record(2, "0102", vec![(10.0, 0.0), (20.0, 0.0)]),
            flowline_record(3, "0102", vec![(10.0, 0.0), (10.0, 10.0)]),
        ],
        joins: vec![join(0, 2), join(2, 0), join(0, 3), join(3, 0)],
    };
    let outputs = run(vec![basin_x, basin_y], vec![]);

    assert!(outputs.joins.contains(id(1), FlowlineId::SENTINEL));
    assert!(outputs.joins.contains(FlowlineId::SENTINEL, id(2)));
    assert!(outputs.joins.contains(FlowlineId::SENTINEL, id(3)));
    assert!(!outputs.joins.contains(id(1), id(2)));
    assert!(outputs.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::BorderAmbiguity { upstream, candidates }
            if *upstream == id(1) && candidates == &vec![id(2), id(3)]
    )));
}

/// A barrier equidistant from two flowlines snaps to the lower id.
#[test]
fn nearest_tie_breaks_by_ascending_id() {
    let basin = BasinInput {
        crs: CRS.into(),
        flowlines: vec![
            flowline_record(7, "0101", vec![(0.0, 5.0), (100.0, 5.0)]),
            flowline_record(3, "0101", vec![(0.0, -5.0), (100.0, -5.0)]),
        ],
        joins: vec![join(0, 7), join(7, 0), join(0, 3), join(3, 0)],
    };
    let outputs = run(vec![basin], vec![barrier_record(10, 50.0, 0.0)]);

    let snapped = &outputs.snapped[0];
    assert_eq!(snapped.snap.expect("snapped").flowline, id(3));
    assert!(snapped.candidates_within_100m >= 2);
    assert!(outputs.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::AmbiguousSnap { chosen, .. } if *chosen == id(3)
    )));
}

/// An upstream walk stops at a barrier instead of crossing it.
#[test]
fn traversal_stops_at_barrier() {
    let basin = BasinInput {
        crs: CRS.into(),
        flowlines: vec![
            flowline_record(1, "0101", vec![(0.0, 0.0), (10.0, 0.0)]),
            flowline_record(2, "0101", vec![(10.0, 0.0), (20.0, 0.0)]),
            flowline_record(3, "0101", vec![(20.0, 0.0), (30.0, 0.0)]),
        ],
        joins: vec![join(0, 1), join(1, 2), join(2, 3), join(3, 0)],
    };
    // The barrier sits on the shared endpoint of 1 and 2; the distance tie
    // resolves to flowline 1, at its downstream end.
    let outputs = run(vec![basin], vec![barrier_record(10, 10.0, 0.0)]);

    let span = outputs.cut.spans[0];
    assert_eq!((span.upstream, span.downstream), (id(1), id(2)));

    let net_of = |raw: u64| outputs.assignment.network_of(id(raw)).unwrap();
    // Walking upstream from 2 must not cross into 1.
    assert_ne!(net_of(2), net_of(1));
    assert_eq!(
        outputs
            .networks
            .iter()
            .find(|n| n.root == net_of(2))
            .unwrap()
            .members,
        vec![id(2)]
    );
    assert_eq!(
        outputs
            .networks
            .iter()
            .find(|n| n.root == net_of(1))
            .unwrap()
            .members,
        vec![id(1)]
    );
}
