//! Splitting flowlines at snapped barrier positions.
//!
//! After cutting, every barrier that severs the network sits exactly on an
//! endpoint between two flowlines. Cut products get freshly minted ids from
//! a pipeline-scoped [`IdMinter`]; the parent's joins are rewired onto the
//! first and last child and the children are chained in between.
//!
//! The [`CutOutcome`] records a sidecar span per barrier (its upstream and
//! downstream neighbor ids) and, per cut parent, the measure range each
//! child covers. The latter lets later stages resolve any pre-cut
//! `(flowline, measure)` position to a post-cut id, and lets tests rejoin
//! children to verify geometry conservation.

use crate::barrier::{BarrierId, SnappedBarrier};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::flowline::FlowlineId;
use crate::geom::CUT_MERGE_EPSILON_M;
use crate::joins::JoinTable;
use crate::store::FlowlineStore;
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

/// Mints ids for cut products from a reserved range above the vendor ids.
///
/// Pipeline-scoped: one minter per run, seeded either from
/// `Config::id_counter_base` or one above the store's maximum id.
#[derive(Clone, Debug)]
pub struct IdMinter {
    next: u64,
}

impl IdMinter {
    pub fn new(base: u64) -> Self {
        Self { next: base.max(1) }
    }

    /// Seed one above the largest id in `store`.
    pub fn above(store: &FlowlineStore) -> Self {
        Self::new(store.max_id().map_or(1, |id| id.raw() + 1))
    }

    /// Mint the next id, verifying it does not collide with an existing row.
    ///
    /// # Errors
    /// `IdCollision` if the minted id is already present in the store.
    pub fn mint(&mut self, store: &FlowlineStore) -> Result<FlowlineId> {
        let id = FlowlineId::new(self.next);
        if store.contains(id) {
            return Err(Error::IdCollision(id));
        }
        self.next += 1;
        Ok(id)
    }
}

/// Sidecar row mapping a barrier to its post-cut neighbors.
///
/// `upstream`/`downstream` are sentinel when the barrier sits on a network
/// origin or terminus endpoint with no neighbor on that side (or with an
/// ambiguous one, at a confluence).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarrierSpan {
    pub barrier: BarrierId,
    pub upstream: FlowlineId,
    pub downstream: FlowlineId,
}

/// One child of a cut parent, with the parent-measure range it covers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CutPiece {
    pub id: FlowlineId,
    /// Measure on the parent where this piece starts.
    pub start: f64,
    /// Measure on the parent where this piece ends.
    pub end: f64,
}

/// Everything the cutter produced besides the mutated store and joins.
#[derive(Clone, Debug, Default)]
pub struct CutOutcome {
    /// Barrier neighbor spans, ascending by barrier id.
    pub spans: Vec<BarrierSpan>,
    /// For each cut parent, its children in upstream-to-downstream order.
    pub pieces: BTreeMap<FlowlineId, Vec<CutPiece>>,
}

impl CutOutcome {
    /// Resolve a pre-cut `(flowline, measure)` position to the post-cut id
    /// covering it. Ids of uncut flowlines resolve to themselves.
    pub fn resolve(&self, flowline: FlowlineId, measure: f64) -> FlowlineId {
        match self.pieces.get(&flowline) {
            None => flowline,
            Some(pieces) => pieces
                .iter()
                .find(|p| measure <= p.end)
                .or(pieces.last())
                .map(|p| p.id)
                .unwrap_or(flowline),
        }
    }

    /// The span recorded for a barrier, if it was used for cutting.
    pub fn span_of(&self, barrier: BarrierId) -> Option<&BarrierSpan> {
        self.spans.iter().find(|s| s.barrier == barrier)
    }
}

/// A barrier position on one flowline, pre-sorted for cutting.
struct CutPosition {
    barrier: BarrierId,
    measure: f64,
    at_endpoint: bool,
}

/// Split flowlines at the snapped barrier positions and rewire the joins.
///
/// Off-network barriers and barriers rejected by the configured cut
/// predicate are ignored. Positions on the same flowline within 1 mm of
/// each other merge into a single cut whose endpoint all of their spans
/// share. Positions collapsed onto a flowline endpoint never cut (the
/// endpoint is already a segment boundary) but still receive spans.
///
/// # Errors
/// `IdCollision` if a minted id already exists (fatal for the region).
pub fn cut_at_barriers(
    store: &mut FlowlineStore,
    joins: &mut JoinTable,
    snapped: &[SnappedBarrier],
    minter: &mut IdMinter,
    config: &Config,
) -> Result<CutOutcome> {
    // Group cut positions per target flowline.
    let mut by_flowline: BTreeMap<FlowlineId, Vec<CutPosition>> = BTreeMap::new();
    for sb in snapped {
        let Some(snap) = &sb.snap else { continue };
        if !(config.barrier_cuts)(&sb.barrier) {
            continue;
        }
        by_flowline.entry(snap.flowline).or_default().push(CutPosition {
            barrier: sb.barrier.id,
            measure: snap.measure,
            at_endpoint: snap.at_endpoint,
        });
    }

    let mut outcome = CutOutcome::default();
    for (parent_id, mut positions) in by_flowline {
        positions.sort_by_key(|p| (OrderedFloat(p.measure), p.barrier));
        cut_one(store, joins, parent_id, &positions, minter, &mut outcome)?;
    }

    outcome.spans.sort_by_key(|s| s.barrier);
    store.rebuild();
    Ok(outcome)
}

fn cut_one(
    store: &mut FlowlineStore,
    joins: &mut JoinTable,
    parent_id: FlowlineId,
    positions: &[CutPosition],
    minter: &mut IdMinter,
    outcome: &mut CutOutcome,
) -> Result<()> {
    let parent_length = store.get(parent_id)?.length;

    // Cluster consecutive interior positions within 1 mm; endpoint
    // positions never cut.
    let mut clusters: Vec<(f64, Vec<BarrierId>)> = Vec::new();
    let mut at_start: Vec<BarrierId> = Vec::new();
    let mut at_end: Vec<BarrierId> = Vec::new();
    let mut prev_measure = f64::NEG_INFINITY;
    for p in positions {
        if p.at_endpoint {
            if p.measure <= parent_length / 2.0 {
                at_start.push(p.barrier);
            } else {
                at_end.push(p.barrier);
            }
            continue;
        }
        match clusters.last_mut() {
            Some((_, barriers)) if p.measure - prev_measure <= CUT_MERGE_EPSILON_M => {
                barriers.push(p.barrier);
            }
            _ => clusters.push((p.measure, vec![p.barrier])),
        }
        prev_measure = p.measure;
    }

    // Single non-sentinel neighbor, if unambiguous; sentinel otherwise.
    let sole = |ids: Vec<FlowlineId>| -> FlowlineId {
        match ids.as_slice() {
            &[only] => only,
            _ => FlowlineId::SENTINEL,
        }
    };
    let predecessors: Vec<FlowlineId> =
        joins.upstream_of(parent_id).filter(|u| !u.is_sentinel()).collect();
    let successors: Vec<FlowlineId> =
        joins.downstream_of(parent_id).filter(|d| !d.is_sentinel()).collect();

    if clusters.is_empty() {
        // Nothing to cut; endpoint barriers span the existing boundaries.
        for barrier in at_start {
            outcome.spans.push(BarrierSpan {
                barrier,
                upstream: sole(predecessors.clone()),
                downstream: parent_id,
            });
        }
        for barrier in at_end {
            outcome.spans.push(BarrierSpan {
                barrier,
                upstream: parent_id,
                downstream: sole(successors.clone()),
            });
        }
        return Ok(());
    }

    // Mint child ids upstream-to-downstream so ids ascend with flow.
    let mut child_ids = Vec::with_capacity(clusters.len() + 1);
    for _ in 0..=clusters.len() {
        child_ids.push(minter.mint(store)?);
    }

    let parent = store.remove(parent_id)?;
    let measures: Vec<f64> = clusters.iter().map(|&(m, _)| m).collect();
    let child_geometries = parent.geometry.split_at(&measures);
    debug_assert_eq!(child_geometries.len(), child_ids.len());

    let mut pieces = Vec::with_capacity(child_ids.len());
    let mut start = 0.0;
    for (i, (&id, geometry)) in child_ids.iter().zip(child_geometries).enumerate() {
        let end = measures.get(i).copied().unwrap_or(parent.length);
        store.insert(parent.child_of(id, geometry))?;
        pieces.push(CutPiece { id, start, end });
        start = end;
    }

    // Rewire: incoming joins onto the first child, outgoing onto the last,
    // and chain the children in between.
    let first = child_ids[0];
    let last = child_ids[child_ids.len() - 1];
    let incoming: Vec<FlowlineId> = joins.upstream_of(parent_id).collect();
    for u in incoming {
        joins.remove(u, parent_id);
        joins.add(u, first);
    }
    let outgoing: Vec<FlowlineId> = joins.downstream_of(parent_id).collect();
    for d in outgoing {
        joins.remove(parent_id, d);
        joins.add(last, d);
    }
    for pair in child_ids.windows(2) {
        joins.add(pair[0], pair[1]);
    }

    // Spans: each cluster sits between child i and child i+1.
    for (i, (_, barriers)) in clusters.iter().enumerate() {
        for &barrier in barriers {
            outcome.spans.push(BarrierSpan {
                barrier,
                upstream: child_ids[i],
                downstream: child_ids[i + 1],
            });
        }
    }
    for barrier in at_start {
        outcome.spans.push(BarrierSpan {
            barrier,
            upstream: sole(predecessors.clone()),
            downstream: first,
        });
    }
    for barrier in at_end {
        outcome.spans.push(BarrierSpan {
            barrier,
            upstream: last,
            downstream: sole(successors.clone()),
        });
    }

    outcome.pieces.insert(parent_id, pieces);
    Ok(())
}
