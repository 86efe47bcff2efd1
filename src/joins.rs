//! Directed topological joins between flowlines.
//!
//! A join `(upstream, downstream)` says water flows from `upstream` into
//! `downstream`. Either side may be the sentinel id `0`: upstream sentinel
//! means the flowline is a network origin, downstream sentinel means it
//! drains to a terminus (ocean, sink, region boundary).
//!
//! The table is a bidirectional multimap with constant-time lookup both
//! ways. Duplicate edges are idempotent. Iteration order is ascending
//! everywhere so downstream stages are deterministic.

use crate::flowline::FlowlineId;
use std::collections::{BTreeMap, BTreeSet};

/// Bidirectional multimap of directed join edges.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JoinTable {
    /// upstream id -> successor ids
    forward: BTreeMap<FlowlineId, BTreeSet<FlowlineId>>,
    /// downstream id -> predecessor ids
    reverse: BTreeMap<FlowlineId, BTreeSet<FlowlineId>>,
}

impl JoinTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the edge `(upstream, downstream)`. Re-adding is a no-op.
    pub fn add(&mut self, upstream: FlowlineId, downstream: FlowlineId) {
        self.forward.entry(upstream).or_default().insert(downstream);
        self.reverse.entry(downstream).or_default().insert(upstream);
    }

    /// Remove the edge `(upstream, downstream)` if present.
    pub fn remove(&mut self, upstream: FlowlineId, downstream: FlowlineId) {
        if let Some(set) = self.forward.get_mut(&upstream) {
            set.remove(&downstream);
            if set.is_empty() {
                self.forward.remove(&upstream);
            }
        }
        if let Some(set) = self.reverse.get_mut(&downstream) {
            set.remove(&upstream);
            if set.is_empty() {
                self.reverse.remove(&downstream);
            }
        }
    }

    pub fn contains(&self, upstream: FlowlineId, downstream: FlowlineId) -> bool {
        self.forward
            .get(&upstream)
            .is_some_and(|set| set.contains(&downstream))
    }

    /// Predecessors of `id`, ascending. May yield the sentinel.
    pub fn upstream_of(&self, id: FlowlineId) -> impl Iterator<Item = FlowlineId> + '_ {
        self.reverse.get(&id).into_iter().flatten().copied()
    }

    /// Successors of `id`, ascending. May yield the sentinel.
    pub fn downstream_of(&self, id: FlowlineId) -> impl Iterator<Item = FlowlineId> + '_ {
        self.forward.get(&id).into_iter().flatten().copied()
    }

    /// True when the only predecessor of `id` is the sentinel, or there is
    /// none at all: `id` is a network origin.
    pub fn is_origin(&self, id: FlowlineId) -> bool {
        self.upstream_of(id).all(|u| u.is_sentinel())
    }

    /// True when the only successor of `id` is the sentinel, or there is
    /// none at all.
    pub fn is_terminus(&self, id: FlowlineId) -> bool {
        self.downstream_of(id).all(|d| d.is_sentinel())
    }

    /// All edges `(upstream, downstream)`, ascending by upstream then
    /// downstream id.
    pub fn edges(&self) -> impl Iterator<Item = (FlowlineId, FlowlineId)> + '_ {
        self.forward
            .iter()
            .flat_map(|(&u, set)| set.iter().map(move |&d| (u, d)))
    }

    /// Total number of edges.
    pub fn len(&self) -> usize {
        self.forward.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Union another table into this one (idempotent per edge).
    pub fn absorb(&mut self, other: JoinTable) {
        for (u, d) in other.edges() {
            self.add(u, d);
        }
    }
}
