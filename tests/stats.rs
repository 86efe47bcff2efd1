//! Per-network statistics aggregation.

use hydronet::testing::{line, store_of};
use hydronet::{
    FloodplainRow, FloodplainTable, FlowlineId, FunctionalNetwork, SizeClass,
    summarize_networks,
};

fn id(raw: u64) -> FlowlineId {
    FlowlineId::new(raw)
}

fn network(root: u64, members: &[u64]) -> FunctionalNetwork {
    FunctionalNetwork {
        root: id(root),
        members: members.iter().map(|&m| id(m)).collect(),
    }
}

#[test]
fn lengths_classes_and_weighted_sinuosity() {
    // 1: straight 1 km headwater; 2: bent 2 km small river, intermittent.
    let mut bent = line(2, &[(1000.0, 0.0), (1600.0, 800.0), (2200.0, 800.0), (2200.0, 1200.0)]);
    bent.size_class = SizeClass::SmallRiver;
    bent.perennial = false;
    let straight = line(1, &[(0.0, 0.0), (1000.0, 0.0)]);
    assert_eq!(bent.length, 2000.0);

    let store = store_of(vec![straight, bent]);
    let stats = summarize_networks(
        &store,
        &[network(1, &[1, 2])],
        &FloodplainTable::new(),
    );
    assert_eq!(stats.len(), 1);
    let s = &stats[0];
    assert_eq!(s.network, id(1));
    assert_eq!(s.total_length_km, 3.0);
    assert_eq!(s.perennial_length_km, 1.0);
    assert_eq!(s.num_segments, 2);
    assert_eq!(s.size_class_counts[SizeClass::Headwater.index()], 1);
    assert_eq!(s.size_class_counts[SizeClass::SmallRiver.index()], 1);

    // Weighted: (1.0 * 1000 + sinuosity_2 * 2000) / 3000.
    let sinuosity_2 = store.get(id(2)).unwrap().sinuosity;
    let expected = (1000.0 + sinuosity_2 * 2000.0) / 3000.0;
    assert_eq!(s.sinuosity, expected);
}

#[test]
fn floodplain_join_skips_members_without_data() {
    let store = store_of(vec![
        line(1, &[(0.0, 0.0), (1000.0, 0.0)]),
        line(2, &[(1000.0, 0.0), (2000.0, 0.0)]),
        line(3, &[(2000.0, 0.0), (3000.0, 0.0)]),
    ]);
    let mut floodplain = FloodplainTable::new();
    floodplain.insert(id(1), FloodplainRow { natural_m2: 600.0, total_m2: 1000.0 });
    floodplain.insert(id(2), FloodplainRow { natural_m2: 100.0, total_m2: 1000.0 });
    // No row for 3: excluded from the denominator entirely.

    let stats = summarize_networks(&store, &[network(1, &[1, 2, 3])], &floodplain);
    assert_eq!(stats[0].floodplain_natural_pct, Some(35.0));

    // A network with no data at all reports no percentage.
    let stats = summarize_networks(&store, &[network(3, &[3])], &floodplain);
    assert_eq!(stats[0].floodplain_natural_pct, None);
}

#[test]
fn networks_report_in_ascending_root_order() {
    let store = store_of(vec![
        line(4, &[(0.0, 0.0), (100.0, 0.0)]),
        line(7, &[(0.0, 50.0), (100.0, 50.0)]),
        line(9, &[(0.0, 90.0), (100.0, 90.0)]),
    ]);
    let networks = [network(4, &[4]), network(7, &[7]), network(9, &[9])];
    let stats = summarize_networks(&store, &networks, &FloodplainTable::new());
    let roots: Vec<u64> = stats.iter().map(|s| s.network.raw()).collect();
    assert_eq!(roots, vec![4, 7, 9]);
}

#[test]
fn repeated_runs_are_bit_identical() {
    let store = store_of(vec![
        line(1, &[(0.0, 0.0), (312.5, 77.3), (901.0, 64.0)]),
        line(2, &[(901.0, 64.0), (1444.4, -12.0)]),
    ]);
    let mut floodplain = FloodplainTable::new();
    floodplain.insert(id(2), FloodplainRow { natural_m2: 33.3, total_m2: 77.7 });
    let networks = [network(1, &[1, 2])];

    let first = summarize_networks(&store, &networks, &floodplain);
    let second = summarize_networks(&store, &networks, &floodplain);
    assert_eq!(first, second);
    assert_eq!(first[0].sinuosity.to_bits(), second[0].sinuosity.to_bits());
    assert_eq!(
        first[0].total_length_km.to_bits(),
        second[0].total_length_km.to_bits()
    );
}
