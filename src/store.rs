//! In-memory flowline table with a spatial index.
//!
//! Rows live in a `BTreeMap` keyed by id, so [`FlowlineStore::iter`] is
//! stable and ascending, and every downstream tie-break in the pipeline leans
//! on that. Spatial queries go through an R-tree over flowline bounding
//! boxes; candidates from the index are refined with exact point-to-polyline
//! distance.
//!
//! The index is maintained incrementally on insert/remove. [`FlowlineStore::rebuild`]
//! bulk-reloads it from scratch; the cutter calls it once after a batch of
//! structural mutations.

use crate::error::{Error, Result};
use crate::flowline::{Flowline, FlowlineId};
use crate::geom::{Envelope, Point};
use ordered_float::OrderedFloat;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};
use std::collections::BTreeMap;

type IndexEntry = GeomWithData<Rectangle<[f64; 2]>, FlowlineId>;

fn index_entry(flowline: &Flowline) -> IndexEntry {
    let env = flowline.geometry.envelope();
    GeomWithData::new(
        Rectangle::from_corners([env.min_x, env.min_y], [env.max_x, env.max_y]),
        flowline.id,
    )
}

/// All flowlines of one region (or region-group), spatially indexed.
#[derive(Clone, Debug, Default)]
pub struct FlowlineStore {
    rows: BTreeMap<FlowlineId, Flowline>,
    index: RTree<IndexEntry>,
}

impl FlowlineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a flowline.
    ///
    /// # Errors
    /// `DuplicateId` if the id is already present.
    pub fn insert(&mut self, flowline: Flowline) -> Result<()> {
        if self.rows.contains_key(&flowline.id) {
            return Err(Error::DuplicateId(flowline.id));
        }
        self.index.insert(index_entry(&flowline));
        self.rows.insert(flowline.id, flowline);
        Ok(())
    }

    /// Remove and return a flowline.
    ///
    /// # Errors
    /// `UnknownId` if the id is not present.
    pub fn remove(&mut self, id: FlowlineId) -> Result<Flowline> {
        let flowline = self.rows.remove(&id).ok_or(Error::UnknownId(id))?;
        self.index.remove(&index_entry(&flowline));
        Ok(flowline)
    }

    /// Look up a flowline.
    ///
    /// # Errors
    /// `UnknownId` if the id is not present.
    pub fn get(&self, id: FlowlineId) -> Result<&Flowline> {
        self.rows.get(&id).ok_or(Error::UnknownId(id))
    }

    pub fn contains(&self, id: FlowlineId) -> bool {
        self.rows.contains_key(&id)
    }

    /// All flowlines, ascending by id. Restartable; stable for a given
    /// store snapshot.
    pub fn iter(&self) -> impl Iterator<Item = &Flowline> {
        self.rows.values()
    }

    /// All ids, ascending.
    pub fn ids(&self) -> impl Iterator<Item = FlowlineId> + '_ {
        self.rows.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The largest id present, if any. Seeds the cut-product id minter.
    pub fn max_id(&self) -> Option<FlowlineId> {
        self.rows.keys().next_back().copied()
    }

    /// Flowlines within `max_dist` of `point`, as `(id, distance)` pairs in
    /// ascending distance (ties by ascending id), at most `limit` of them.
    ///
    /// Distance is exact point-to-polyline distance; the R-tree only
    /// pre-filters by bounding box.
    pub fn nearest(&self, point: &Point, max_dist: f64, limit: usize) -> Vec<(FlowlineId, f64)> {
        let query = AABB::from_corners(
            [point.x - max_dist, point.y - max_dist],
            [point.x + max_dist, point.y + max_dist],
        );
        let mut hits: Vec<(FlowlineId, f64)> = self
            .index
            .locate_in_envelope_intersecting(&query)
            .filter_map(|entry| {
                let flowline = self.rows.get(&entry.data)?;
                let dist = flowline.geometry.distance_to(point);
                (dist <= max_dist).then_some((entry.data, dist))
            })
            .collect();
        hits.sort_by_key(|&(id, dist)| (OrderedFloat(dist), id));
        hits.truncate(limit);
        hits
    }

    /// Ids whose bounding box intersects `envelope`. Lazy; order is
    /// unspecified.
    pub fn within(&self, envelope: &Envelope) -> impl Iterator<Item = FlowlineId> + '_ {
        let query = AABB::from_corners(
            [envelope.min_x, envelope.min_y],
            [envelope.max_x, envelope.max_y],
        );
        self.index
            .locate_in_envelope_intersecting(&query)
            .map(|entry| entry.data)
    }

    /// Rebuild the spatial index from the current rows.
    pub fn rebuild(&mut self) {
        self.index = RTree::bulk_load(self.rows.values().map(index_entry).collect());
    }
}
