//! Round-trips through the columnar on-disk format.
#![cfg(feature = "io-parquet")]

use hydronet::io::parquet::{
    BarrierTableRow, read_barrier_table, read_flowlines, read_network_stats,
    write_barrier_table, write_flowlines, write_network_stats,
};
use hydronet::testing::{line, named_line, store_of};
use hydronet::{
    BarrierId, BarrierNetworkRow, FlowlineId, FunctionalNetwork, NameMatch, Point, SizeClass,
    summarize_networks,
};
use std::collections::BTreeMap;

fn id(raw: u64) -> FlowlineId {
    FlowlineId::new(raw)
}

#[test]
fn flowline_store_round_trip_is_identical() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("flowlines.parquet");

    let mut looped = line(9, &[(5.0, 5.0), (9.0, 8.0), (5.0, 5.0 + 1e-9)]);
    looped.is_loop = true;
    looped.perennial = false;
    let mut sized = named_line(2, "Alder Creek", &[(0.0, 0.0), (250.0, 100.0)]);
    sized.size_class = SizeClass::River;
    let store = store_of(vec![
        line(1, &[(0.0, 0.0), (123.456, -77.001), (300.0, 4.0)]),
        sized,
        looped,
    ]);

    let written = write_flowlines(&path, &store, None)?;
    assert_eq!(written, 3);
    let (read_back, networks) = read_flowlines(&path)?;

    assert_eq!(read_back.len(), store.len());
    assert!(networks.is_empty());
    for (a, b) in read_back.iter().zip(store.iter()) {
        assert_eq!(a, b);
        assert_eq!(a.length.to_bits(), b.length.to_bits());
        assert_eq!(a.sinuosity.to_bits(), b.sinuosity.to_bits());
    }

    // The rebuilt spatial index answers queries identically.
    assert_eq!(
        read_back.nearest(&Point::new(10.0, 10.0), 500.0, usize::MAX),
        store.nearest(&Point::new(10.0, 10.0), 500.0, usize::MAX)
    );
    Ok(())
}

#[test]
fn flowline_table_carries_network_ids() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("flowlines.parquet");

    let store = store_of(vec![
        line(1, &[(0.0, 0.0), (100.0, 0.0)]),
        line(2, &[(100.0, 0.0), (200.0, 0.0)]),
    ]);
    let mut joins = hydronet::JoinTable::new();
    joins.add(FlowlineId::SENTINEL, id(1));
    joins.add(id(1), id(2));
    let mut diags = hydronet::Diagnostics::new();
    let (_, assignment) = hydronet::build_networks(&store, &joins, &[], &mut diags);

    write_flowlines(&path, &store, Some(&assignment))?;
    let (_, networks) = read_flowlines(&path)?;
    let expected: BTreeMap<FlowlineId, FlowlineId> = store
        .ids()
        .map(|fid| (fid, assignment.network_of(fid).unwrap()))
        .collect();
    assert_eq!(networks, expected);
    Ok(())
}

#[test]
fn barrier_table_round_trip() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("barriers.parquet");

    let rows = vec![
        BarrierNetworkRow {
            barrier: BarrierId::new(10),
            upstream_network: Some(id(2)),
            downstream_network: Some(id(3)),
            snap_dist: 4.25,
            candidates_within_100m: 2,
            name_match: NameMatch::Fuzzy,
            at_endpoint: false,
        },
        BarrierNetworkRow {
            barrier: BarrierId::new(11),
            upstream_network: None,
            downstream_network: None,
            snap_dist: f64::INFINITY,
            candidates_within_100m: 0,
            name_match: NameMatch::None,
            at_endpoint: false,
        },
    ];
    write_barrier_table(&path, &rows)?;
    let read_back = read_barrier_table(&path)?;

    let expected: Vec<BarrierTableRow> = rows.iter().map(BarrierTableRow::from).collect();
    assert_eq!(read_back, expected);
    assert_eq!(read_back[1].snap_dist, f64::INFINITY);
    assert_eq!(read_back[0].name_match, "fuzzy");
    Ok(())
}

#[test]
fn network_stats_round_trip() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("stats.parquet");

    let store = store_of(vec![
        line(1, &[(0.0, 0.0), (1500.0, 0.0)]),
        line(2, &[(1500.0, 0.0), (2000.0, 400.0)]),
    ]);
    let networks = [FunctionalNetwork {
        root: id(1),
        members: vec![id(1), id(2)],
    }];
    let stats = summarize_networks(&store, &networks, &Default::default());

    write_network_stats(&path, &stats)?;
    let read_back = read_network_stats(&path)?;
    assert_eq!(read_back.len(), 1);
    assert_eq!(read_back[0].network, 1);
    assert_eq!(read_back[0].total_length_km.to_bits(), stats[0].total_length_km.to_bits());
    assert_eq!(read_back[0].n_headwater, 2);
    assert_eq!(read_back[0].floodplain_natural_pct, None);
    Ok(())
}

#[test]
fn empty_tables_round_trip() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;

    let flowlines = dir.path().join("empty_flowlines.parquet");
    write_flowlines(&flowlines, &hydronet::FlowlineStore::new(), None)?;
    let (store, networks) = read_flowlines(&flowlines)?;
    assert!(store.is_empty());
    assert!(networks.is_empty());

    let barriers = dir.path().join("empty_barriers.parquet");
    write_barrier_table(&barriers, &[])?;
    assert!(read_barrier_table(&barriers)?.is_empty());
    Ok(())
}
