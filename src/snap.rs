//! Barrier snapping with QA heuristics.
//!
//! Each barrier point is projected onto the closest flowline within
//! `max_snap_dist`. Alongside the snap itself we record the heuristics a
//! reviewer needs to judge it: the snap distance, how many flowlines were
//! within 100 m (a crowded neighborhood means the snap is less certain), and
//! whether the barrier's name agrees with the flowline's GNIS name.
//!
//! Snapping is deterministic: candidates are ordered by ascending
//! `(distance, id)`, so re-running a region reproduces every snap bit for
//! bit.

use crate::barrier::{Barrier, NameMatch, Snap, SnappedBarrier};
use crate::config::Config;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::names;
use crate::store::FlowlineStore;

/// Radius for the `candidates_within_100m` QA count, independent of the
/// configured snap distance.
pub const QA_RADIUS_M: f64 = 100.0;

/// Two candidates within this distance of each other make a snap ambiguous.
pub const AMBIGUITY_EPSILON_M: f64 = 0.1;

/// Snap a batch of barriers, ascending by barrier id.
pub fn snap_barriers(
    store: &FlowlineStore,
    mut barriers: Vec<Barrier>,
    config: &Config,
    diagnostics: &mut Diagnostics,
) -> Vec<SnappedBarrier> {
    barriers.sort_by_key(|b| b.id);
    barriers
        .into_iter()
        .map(|b| snap_one(store, b, config, diagnostics))
        .collect()
}

/// Snap a single barrier.
pub fn snap_one(
    store: &FlowlineStore,
    barrier: Barrier,
    config: &Config,
    diagnostics: &mut Diagnostics,
) -> SnappedBarrier {
    let radius = config.max_snap_dist.max(QA_RADIUS_M);
    let hits = store.nearest(&barrier.location, radius, usize::MAX);

    let candidates_within_100m =
        hits.iter().filter(|&&(_, d)| d <= QA_RADIUS_M).count() as u32;
    let mut reachable = hits.iter().filter(|&&(_, d)| d <= config.max_snap_dist);

    let Some(&(target, dist)) = reachable.next() else {
        diagnostics.push(Diagnostic::OffNetworkBarrier { barrier: barrier.id });
        return SnappedBarrier {
            barrier,
            snap: None,
            candidates_within_100m,
            name_match: NameMatch::None,
        };
    };

    // Two candidates nearly the same distance away: report, keep the first
    // (closest, ties by ascending id).
    let contenders: Vec<_> = reachable
        .take_while(|&&(_, d)| d - dist <= AMBIGUITY_EPSILON_M)
        .map(|&(id, _)| id)
        .collect();
    if !contenders.is_empty() {
        diagnostics.push(Diagnostic::AmbiguousSnap {
            barrier: barrier.id,
            chosen: target,
            contenders,
        });
    }

    let flowline = store
        .get(target)
        .expect("nearest() only yields ids present in the store");
    let projection = flowline.geometry.project(&barrier.location);

    // Collapse onto an exact endpoint rather than cutting off a sliver.
    let mut measure = projection.measure;
    let mut point = projection.point;
    let mut at_endpoint = false;
    if measure < config.endpoint_epsilon {
        measure = 0.0;
        point = flowline.geometry.first();
        at_endpoint = true;
    } else if flowline.length - measure < config.endpoint_epsilon {
        measure = flowline.length;
        point = flowline.geometry.last();
        at_endpoint = true;
    }

    let name_match = names::classify(
        barrier.gnis_name.as_deref(),
        flowline.gnis_name.as_deref(),
        config.name_similarity_threshold,
    );

    SnappedBarrier {
        barrier,
        snap: Some(Snap {
            flowline: target,
            measure,
            point,
            distance: projection.distance,
            at_endpoint,
        }),
        candidates_within_100m,
        name_match,
    }
}
