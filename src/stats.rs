//! Per-network summary statistics.
//!
//! Aggregation is deterministic: networks are processed ascending by root,
//! members ascending within each, so float summation order is fixed and the
//! output is bit-identical across runs. With the `parallel-stats` feature
//! the per-network work fans out over Rayon; networks are disjoint and the
//! store is read-only here, so the parallel path collects back into the same
//! order and produces the same bits.

use crate::flowline::{FlowlineId, SizeClass};
use crate::network::FunctionalNetwork;
use crate::store::FlowlineStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[cfg(feature = "parallel-stats")]
use rayon::prelude::*;

/// Per-catchment floodplain metrics, keyed by the catchment's NHDPlusID.
///
/// Produced upstream of this crate (zonal statistics over landcover) and
/// joined in here. Catchments missing from the table are excluded from the
/// floodplain denominator.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FloodplainTable {
    rows: BTreeMap<FlowlineId, FloodplainRow>,
}

/// Natural vs. total floodplain area for one catchment, in square meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloodplainRow {
    pub natural_m2: f64,
    pub total_m2: f64,
}

impl FloodplainTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, catchment: FlowlineId, row: FloodplainRow) {
        self.rows.insert(catchment, row);
    }

    pub fn get(&self, catchment: FlowlineId) -> Option<&FloodplainRow> {
        self.rows.get(&catchment)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<(FlowlineId, FloodplainRow)> for FloodplainTable {
    fn from_iter<I: IntoIterator<Item = (FlowlineId, FloodplainRow)>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Aggregate metrics for one functional network.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NetworkStats {
    /// Root flowline id of the network.
    pub network: FlowlineId,
    pub total_length_km: f64,
    pub perennial_length_km: f64,
    pub num_segments: u32,
    /// Segment counts per size class, indexed like [`SizeClass::ALL`].
    pub size_class_counts: [u32; 7],
    /// Length-weighted mean sinuosity.
    pub sinuosity: f64,
    /// Percent of floodplain area in natural landcover, over the members
    /// with floodplain data. `None` when no member has data.
    pub floodplain_natural_pct: Option<f64>,
}

/// Summarize every network, ascending by root id.
pub fn summarize_networks(
    store: &FlowlineStore,
    networks: &[FunctionalNetwork],
    floodplain: &FloodplainTable,
) -> Vec<NetworkStats> {
    #[cfg(feature = "parallel-stats")]
    {
        networks
            .par_iter()
            .map(|n| summarize_one(store, n, floodplain))
            .collect()
    }
    #[cfg(not(feature = "parallel-stats"))]
    {
        networks
            .iter()
            .map(|n| summarize_one(store, n, floodplain))
            .collect()
    }
}

/// Summarize a single network. Members are visited in ascending id order.
pub fn summarize_one(
    store: &FlowlineStore,
    network: &FunctionalNetwork,
    floodplain: &FloodplainTable,
) -> NetworkStats {
    let mut total_m = 0.0;
    let mut perennial_m = 0.0;
    let mut sinuosity_weighted = 0.0;
    let mut size_class_counts = [0u32; 7];
    let mut natural_m2 = 0.0;
    let mut floodplain_m2 = 0.0;
    let mut with_floodplain = 0u32;
    let mut num_segments = 0u32;

    for &id in &network.members {
        let Ok(flowline) = store.get(id) else { continue };
        num_segments += 1;
        total_m += flowline.length;
        if flowline.perennial {
            perennial_m += flowline.length;
        }
        sinuosity_weighted += flowline.sinuosity * flowline.length;
        size_class_counts[flowline.size_class.index()] += 1;
        if let Some(row) = floodplain.get(id) {
            natural_m2 += row.natural_m2;
            floodplain_m2 += row.total_m2;
            with_floodplain += 1;
        }
    }

    NetworkStats {
        network: network.root,
        total_length_km: total_m / 1000.0,
        perennial_length_km: perennial_m / 1000.0,
        num_segments,
        size_class_counts,
        sinuosity: if total_m > 0.0 { sinuosity_weighted / total_m } else { 0.0 },
        floodplain_natural_pct: (with_floodplain > 0 && floodplain_m2 > 0.0)
            .then(|| 100.0 * natural_m2 / floodplain_m2),
    }
}

/// Count of networks per size class across a whole region, useful for
/// reporting.
pub fn size_class_totals(stats: &[NetworkStats]) -> BTreeMap<SizeClass, u32> {
    let mut totals = BTreeMap::new();
    for s in stats {
        for (class, &count) in SizeClass::ALL.iter().zip(&s.size_class_counts) {
            if count > 0 {
                *totals.entry(*class).or_insert(0) += count;
            }
        }
    }
    totals
}
