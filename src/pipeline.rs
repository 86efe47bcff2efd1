//! End-to-end region analysis.
//!
//! One [`Pipeline::run`] call takes a region's basin exports, barrier
//! inventory, and floodplain table through ingest → merge → snap → cut →
//! network assembly → statistics, and returns the outputs as one bundle.
//! Outputs are atomic: any fatal error returns `Err` and nothing partial
//! escapes. Non-fatal findings ride along in
//! [`AnalysisOutputs::diagnostics`].
//!
//! The stages are also public on their own (`merge_regions`,
//! `snap_barriers`, `cut_at_barriers`, `build_networks`,
//! `summarize_networks`) for callers that need to interleave their own
//! steps.

use crate::barrier::{Barrier, BarrierId, NameMatch, SnappedBarrier};
use crate::config::Config;
use crate::cut::{CutOutcome, IdMinter, cut_at_barriers};
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::flowline::FlowlineId;
use crate::ingest::{BarrierInput, BasinInput, ingest_basin};
use crate::joins::JoinTable;
use crate::merge::merge_regions;
use crate::network::{FunctionalNetwork, NetworkAssignment, build_networks};
use crate::snap::snap_barriers;
use crate::stats::{FloodplainTable, NetworkStats, summarize_networks};
use crate::store::FlowlineStore;
use serde::Serialize;
use std::collections::BTreeMap;

/// All inputs for one region (or region-group) run.
#[derive(Clone, Debug, Default)]
pub struct RegionInput {
    pub basins: Vec<BasinInput>,
    pub barriers: BarrierInput,
    pub floodplain: FloodplainTable,
}

/// One row of the barrier-to-network output table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BarrierNetworkRow {
    pub barrier: BarrierId,
    /// Network upstream of the barrier; `None` when off-network or when the
    /// barrier sits on an origin with no upstream neighbor.
    pub upstream_network: Option<FlowlineId>,
    /// Network the barrier drains into; `None` when off-network or at a
    /// terminus.
    pub downstream_network: Option<FlowlineId>,
    pub snap_dist: f64,
    pub candidates_within_100m: u32,
    pub name_match: NameMatch,
    pub at_endpoint: bool,
}

/// Everything a successful region run produces.
#[derive(Clone, Debug)]
pub struct AnalysisOutputs {
    /// The cut flowline store.
    pub store: FlowlineStore,
    /// The rewired join table matching `store`.
    pub joins: JoinTable,
    /// Snap results per barrier, ascending by barrier id.
    pub snapped: Vec<SnappedBarrier>,
    /// Cut sidecar: barrier spans and parent-to-children piece ranges.
    pub cut: CutOutcome,
    pub networks: Vec<FunctionalNetwork>,
    pub assignment: NetworkAssignment,
    pub barriers: Vec<BarrierNetworkRow>,
    pub stats: Vec<NetworkStats>,
    pub diagnostics: Diagnostics,
}

/// The region analysis driver.
#[derive(Clone, Copy, Debug, Default)]
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the full analysis for one region.
    ///
    /// # Errors
    /// Any ingestion, topology, or cutting error named in [`Error`] aborts
    /// the region with no partial output.
    pub fn run(&self, input: RegionInput) -> Result<AnalysisOutputs> {
        let mut diagnostics = Diagnostics::new();

        // Ingest: CRS agreement, then per-basin validation.
        let expected_crs = input
            .basins
            .first()
            .map(|b| b.crs.clone())
            .unwrap_or_else(|| input.barriers.crs.clone());
        for crs in input
            .basins
            .iter()
            .map(|b| b.crs.as_str())
            .chain(std::iter::once(input.barriers.crs.as_str()))
        {
            if crs != expected_crs {
                return Err(Error::CrsMismatch {
                    expected: expected_crs,
                    found: crs.to_string(),
                });
            }
        }
        let mut parts = Vec::new();
        parts
            .try_reserve(input.basins.len())
            .map_err(|_| Error::OutOfMemory)?;
        for basin in input.basins {
            parts.push(ingest_basin(basin)?);
        }

        // Merge basins and verify the merged topology.
        let (mut store, mut joins) = merge_regions(parts, &mut diagnostics)?;
        detect_cycles(&store, &joins)?;

        // Snap, cut, assemble.
        let barriers: Vec<Barrier> =
            input.barriers.records.into_iter().map(Barrier::from).collect();
        let snapped = snap_barriers(&store, barriers, &self.config, &mut diagnostics);

        let mut minter = match self.config.id_counter_base {
            Some(base) => IdMinter::new(base),
            None => IdMinter::above(&store),
        };
        let cut = cut_at_barriers(&mut store, &mut joins, &snapped, &mut minter, &self.config)?;

        let (networks, assignment) = build_networks(&store, &joins, &cut.spans, &mut diagnostics);
        let barriers = barrier_rows(&snapped, &cut, &assignment);
        let stats = summarize_networks(&store, &networks, &input.floodplain);

        Ok(AnalysisOutputs {
            store,
            joins,
            snapped,
            cut,
            networks,
            assignment,
            barriers,
            stats,
            diagnostics,
        })
    }
}

/// Build the barrier-to-network table from the snap results and cut sidecar.
fn barrier_rows(
    snapped: &[SnappedBarrier],
    cut: &CutOutcome,
    assignment: &NetworkAssignment,
) -> Vec<BarrierNetworkRow> {
    let network_of = |id: FlowlineId| -> Option<FlowlineId> {
        if id.is_sentinel() { None } else { assignment.network_of(id) }
    };

    snapped
        .iter()
        .map(|sb| {
            let (upstream_network, downstream_network, at_endpoint) = match &sb.snap {
                None => (None, None, false),
                Some(snap) => match cut.span_of(sb.barrier.id) {
                    // Severing barrier: the two sides of its span.
                    Some(span) => (
                        network_of(span.upstream),
                        network_of(span.downstream),
                        snap.at_endpoint,
                    ),
                    // Snapped but not severing: both sides are the network
                    // of the piece the barrier lies on.
                    None => {
                        let piece = cut.resolve(snap.flowline, snap.measure);
                        let network = network_of(piece);
                        (network, network, snap.at_endpoint)
                    }
                },
            };
            BarrierNetworkRow {
                barrier: sb.barrier.id,
                upstream_network,
                downstream_network,
                snap_dist: sb.snap_dist(),
                candidates_within_100m: sb.candidates_within_100m,
                name_match: sb.name_match,
                at_endpoint,
            }
        })
        .collect()
}

/// Reject cycles not fully marked as loop features.
///
/// An edge participates in cycle detection unless both of its endpoints
/// carry `loop = true`; braided loop channels are legal and are flattened
/// later by the traversal's visited-set.
fn detect_cycles(store: &FlowlineStore, joins: &JoinTable) -> Result<()> {
    const WHITE: u8 = 0;
    const GRAY: u8 = 1;
    const BLACK: u8 = 2;

    enum Step {
        Enter(FlowlineId),
        Exit(FlowlineId),
    }

    let successors = |id: FlowlineId| -> Vec<FlowlineId> {
        let Ok(from) = store.get(id) else { return Vec::new() };
        joins
            .downstream_of(id)
            .filter(|d| !d.is_sentinel())
            .filter(|&d| match store.get(d) {
                Ok(to) => !(from.is_loop && to.is_loop),
                Err(_) => false,
            })
            .collect()
    };

    let mut color: BTreeMap<FlowlineId, u8> = BTreeMap::new();
    for start in store.ids() {
        if color.get(&start).copied().unwrap_or(WHITE) != WHITE {
            continue;
        }
        let mut stack = vec![Step::Enter(start)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(x) => {
                    if color.get(&x).copied().unwrap_or(WHITE) != WHITE {
                        continue;
                    }
                    color.insert(x, GRAY);
                    stack.push(Step::Exit(x));
                    for d in successors(x) {
                        match color.get(&d).copied().unwrap_or(WHITE) {
                            GRAY => return Err(Error::CycleDetected(d)),
                            WHITE => stack.push(Step::Enter(d)),
                            _ => {}
                        }
                    }
                }
                Step::Exit(x) => {
                    color.insert(x, BLACK);
                }
            }
        }
    }
    Ok(())
}
