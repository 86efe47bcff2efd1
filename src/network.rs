//! Functional network assembly.
//!
//! A functional network is a maximal connected set of cut flowlines
//! delimited upstream by barriers (or natural origins) and downstream by a
//! single barrier or terminus. Every network is identified by its root: the
//! downstream-most flowline in it.
//!
//! Roots are the flowlines immediately downstream of a barrier plus every
//! natural origin. Walking upstream from each root claims flowlines until
//! another root is reached (that flowline belongs to its own network).
//! Loop edges are traversed at most once: the assigned-set refuses
//! re-entry, projecting braided cycles onto a tree.

use crate::cut::BarrierSpan;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::flowline::FlowlineId;
use crate::joins::JoinTable;
use crate::store::FlowlineStore;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// One functional network: its root id and all member flowlines.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FunctionalNetwork {
    /// The downstream-most flowline id; the network's stable identifier.
    pub root: FlowlineId,
    /// All member flowline ids, ascending. Always contains `root`.
    pub members: Vec<FlowlineId>,
}

/// The flowline-to-network mapping produced by network assembly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetworkAssignment {
    owners: BTreeMap<FlowlineId, FlowlineId>,
}

impl NetworkAssignment {
    /// The root id of the network owning `id`, if assigned.
    pub fn network_of(&self, id: FlowlineId) -> Option<FlowlineId> {
        self.owners.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    fn assign(&mut self, id: FlowlineId, root: FlowlineId) {
        self.owners.insert(id, root);
    }
}

/// Assign every flowline to exactly one functional network.
///
/// Networks are returned ascending by root id, members ascending within
/// each. Given identical inputs the output is identical, including the
/// order of diagnostics.
pub fn build_networks(
    store: &FlowlineStore,
    joins: &JoinTable,
    spans: &[BarrierSpan],
    diagnostics: &mut Diagnostics,
) -> (Vec<FunctionalNetwork>, NetworkAssignment) {
    // Roots: barrier outflows plus natural origins.
    let mut roots: BTreeSet<FlowlineId> = spans
        .iter()
        .map(|s| s.downstream)
        .filter(|d| !d.is_sentinel() && store.contains(*d))
        .collect();
    for flowline in store.iter() {
        if joins.is_origin(flowline.id) {
            roots.insert(flowline.id);
        }
    }

    // Edges severed by a barrier are never walked, in either role: the
    // upstream side belongs to the network above the barrier.
    let cut_edges: BTreeSet<(FlowlineId, FlowlineId)> = spans
        .iter()
        .map(|s| (s.upstream, s.downstream))
        .collect();

    let mut assignment = NetworkAssignment::default();
    let mut networks: Vec<FunctionalNetwork> = Vec::new();

    for &root in &roots {
        let mut members = vec![root];
        assignment.assign(root, root);
        let mut frontier = vec![root];
        while let Some(x) = frontier.pop() {
            for u in joins.upstream_of(x) {
                if u.is_sentinel() || roots.contains(&u) || cut_edges.contains(&(u, x)) {
                    continue;
                }
                if let Some(prior) = assignment.network_of(u) {
                    if prior != root {
                        diagnostics.push(Diagnostic::DoubleAssignment {
                            flowline: u,
                            network: root,
                            prior,
                        });
                    }
                    continue;
                }
                if !store.contains(u) {
                    continue;
                }
                assignment.assign(u, root);
                members.push(u);
                frontier.push(u);
            }
        }
        members.sort_unstable();
        networks.push(FunctionalNetwork { root, members });
    }

    // Anything left is a disconnected island (e.g. an isolated loop); each
    // connected component becomes its own network.
    let mut unassigned: BTreeSet<FlowlineId> = store
        .ids()
        .filter(|id| assignment.network_of(*id).is_none())
        .collect();
    while let Some(&seed) = unassigned.iter().next() {
        let component = collect_component(joins, &unassigned, seed);
        let root = island_root(joins, &component);
        for &id in &component {
            assignment.assign(id, root);
            unassigned.remove(&id);
        }
        networks.push(FunctionalNetwork {
            root,
            members: component.into_iter().collect(),
        });
    }

    networks.sort_by_key(|n| n.root);
    (networks, assignment)
}

/// Undirected reachability from `seed` within the unassigned set.
fn collect_component(
    joins: &JoinTable,
    unassigned: &BTreeSet<FlowlineId>,
    seed: FlowlineId,
) -> BTreeSet<FlowlineId> {
    let mut component = BTreeSet::from([seed]);
    let mut frontier = vec![seed];
    while let Some(x) = frontier.pop() {
        let neighbors = joins.upstream_of(x).chain(joins.downstream_of(x));
        for n in neighbors {
            if !n.is_sentinel() && unassigned.contains(&n) && component.insert(n) {
                frontier.push(n);
            }
        }
    }
    component
}

/// The downstream-most member of an island: no successor inside the
/// component. Pure cycles have none; fall back to the lowest id.
fn island_root(joins: &JoinTable, component: &BTreeSet<FlowlineId>) -> FlowlineId {
    component
        .iter()
        .copied()
        .find(|&id| !joins.downstream_of(id).any(|d| component.contains(&d)))
        .or_else(|| component.iter().copied().next())
        .expect("island component is never empty")
}
