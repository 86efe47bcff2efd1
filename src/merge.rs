//! Merging per-basin stores into one region graph.
//!
//! NHD exports are cut along HUC4 boundaries: a river crossing a boundary
//! shows up as a terminus (`downstream = {0}`) in the upstream basin and an
//! origin (`upstream = {0}`) in the downstream basin, at the same coordinate.
//! After unioning the per-basin tables, border reconciliation finds those
//! pairs and reconnects them. When more than one continuation shares the
//! point we refuse to guess and leave the sentinels in place, surfacing a
//! [`Diagnostic::BorderAmbiguity`].

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{Error, Result};
use crate::flowline::FlowlineId;
use crate::geom::BORDER_TOLERANCE_M;
use crate::joins::JoinTable;
use crate::store::FlowlineStore;
use rstar::RTree;
use rstar::primitives::GeomWithData;
use std::collections::BTreeMap;

/// Merge per-basin `(store, joins)` pairs into one region pair.
///
/// Merging is commutative up to row ordering: the same basins in any order
/// produce the same store contents, join edges, and diagnostics set.
///
/// # Errors
/// `DuplicateAcrossBasins` if a flowline id appears in more than one basin.
pub fn merge_regions(
    basins: Vec<(FlowlineStore, JoinTable)>,
    diagnostics: &mut Diagnostics,
) -> Result<(FlowlineStore, JoinTable)> {
    let mut store = FlowlineStore::new();
    let mut joins = JoinTable::new();

    for (basin_store, basin_joins) in basins {
        for flowline in basin_store.iter() {
            if let Ok(existing) = store.get(flowline.id) {
                return Err(Error::DuplicateAcrossBasins {
                    id: flowline.id,
                    first: existing.huc4.clone(),
                    second: flowline.huc4.clone(),
                });
            }
            store.insert(flowline.clone())?;
        }
        joins.absorb(basin_joins);
    }

    stitch_borders(&store, &mut joins, diagnostics);
    Ok((store, joins))
}

/// Reconnect flowlines split by a basin border.
///
/// For every pair `(a, b)` with `a.end ≈ b.start` (within 1 cm), different
/// `huc4`, `downstream_of(a) = {0}`, and `upstream_of(b) = {0}`: drop both
/// sentinel joins and add the edge `(a, b)`.
fn stitch_borders(store: &FlowlineStore, joins: &mut JoinTable, diagnostics: &mut Diagnostics) {
    // Index the start points of every border-origin candidate.
    let origin_starts: Vec<GeomWithData<[f64; 2], FlowlineId>> = store
        .iter()
        .filter(|f| {
            joins.contains(FlowlineId::SENTINEL, f.id)
                && joins.upstream_of(f.id).all(|u| u.is_sentinel())
        })
        .map(|f| {
            let start = f.geometry.first();
            GeomWithData::new([start.x, start.y], f.id)
        })
        .collect();
    if origin_starts.is_empty() {
        return;
    }
    let start_tree = RTree::bulk_load(origin_starts);

    let terminus_ids: Vec<FlowlineId> = store
        .iter()
        .filter(|f| {
            joins.contains(f.id, FlowlineId::SENTINEL)
                && joins.downstream_of(f.id).all(|d| d.is_sentinel())
        })
        .map(|f| f.id)
        .collect();

    // Resolve every terminus before mutating anything, so the outcome does
    // not depend on basin input order.
    let mut matches: Vec<(FlowlineId, Vec<FlowlineId>)> = Vec::new();
    for a in terminus_ids {
        let Ok(upstream) = store.get(a) else { continue };
        let end = upstream.geometry.last();
        let mut candidates: Vec<FlowlineId> = start_tree
            .locate_within_distance([end.x, end.y], BORDER_TOLERANCE_M * BORDER_TOLERANCE_M)
            .map(|entry| entry.data)
            .filter(|&b| match store.get(b) {
                Ok(downstream) => downstream.huc4 != upstream.huc4,
                Err(_) => false,
            })
            .collect();
        candidates.sort_unstable();
        if !candidates.is_empty() {
            matches.push((a, candidates));
        }
    }

    // An origin claimed by more than one terminus is just as ambiguous as a
    // terminus with more than one origin.
    let mut claims: BTreeMap<FlowlineId, usize> = BTreeMap::new();
    for (_, candidates) in &matches {
        if let [b] = candidates.as_slice() {
            *claims.entry(*b).or_insert(0) += 1;
        }
    }

    for (a, candidates) in matches {
        match candidates.as_slice() {
            &[b] if claims[&b] == 1 => {
                joins.remove(a, FlowlineId::SENTINEL);
                joins.remove(FlowlineId::SENTINEL, b);
                joins.add(a, b);
            }
            _ => {
                diagnostics.push(Diagnostic::BorderAmbiguity {
                    upstream: a,
                    candidates,
                });
            }
        }
    }
}
