//! Building per-basin stores from reader-shaped inputs.
//!
//! Reading the vendor geodatabase is a collaborator's concern; this module
//! only defines the record shapes the core requires and validates them on
//! the way in. All coordinates must already be in the shared equal-area
//! planar CRS; each input bundle declares its CRS tag and the pipeline
//! refuses mismatched bundles.

use crate::barrier::{Barrier, BarrierId, BarrierKind};
use crate::error::{Error, Result};
use crate::flowline::{Flowline, FlowlineId, SizeClass};
use crate::geom::{Point, Polyline};
use crate::joins::JoinTable;
use crate::store::FlowlineStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One flowline as yielded by a flowline reader.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowlineRecord {
    pub id: u64,
    /// Vertices upstream to downstream.
    pub geometry: Vec<(f64, f64)>,
    pub huc4: String,
    pub gnis_name: Option<String>,
    pub size_class: SizeClass,
    pub is_loop: bool,
    pub perennial: bool,
}

/// One join edge as yielded by a joins reader. `0` is the sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRecord {
    pub upstream: u64,
    pub downstream: u64,
}

/// One barrier as yielded by a barriers reader.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarrierRecord {
    pub id: u64,
    pub kind: BarrierKind,
    pub x: f64,
    pub y: f64,
    pub gnis_name: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl From<BarrierRecord> for Barrier {
    fn from(rec: BarrierRecord) -> Self {
        Barrier {
            id: BarrierId::new(rec.id),
            kind: rec.kind,
            location: Point::new(rec.x, rec.y),
            gnis_name: rec.gnis_name,
            attributes: rec.attributes,
        }
    }
}

/// Everything one basin export contributes to a region run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BasinInput {
    /// CRS tag of the export, e.g. an `ESRI:`/`EPSG:` code. All bundles in
    /// one run must agree.
    pub crs: String,
    pub flowlines: Vec<FlowlineRecord>,
    pub joins: Vec<JoinRecord>,
}

/// The barrier inventory for a region run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BarrierInput {
    pub crs: String,
    pub records: Vec<BarrierRecord>,
}

/// Build a basin's `(store, joins)` pair, validating geometry, id
/// uniqueness, and join references.
///
/// # Errors
/// - `EmptyGeometry` for geometries with fewer than two vertices or shorter
///   than the 1 cm minimum.
/// - `DuplicateId` for a repeated flowline id.
/// - `InvalidJoin` for a join referencing an id that is neither in this
///   basin nor the sentinel.
/// - `OutOfMemory` if buffering the geometry is refused by the allocator.
pub fn ingest_basin(basin: BasinInput) -> Result<(FlowlineStore, JoinTable)> {
    let mut store = FlowlineStore::new();
    for rec in basin.flowlines {
        let id = FlowlineId::new(rec.id);
        let mut points = Vec::new();
        points
            .try_reserve(rec.geometry.len())
            .map_err(|_| Error::OutOfMemory)?;
        points.extend(rec.geometry.iter().map(|&(x, y)| Point::new(x, y)));
        let geometry = Polyline::new(points).ok_or(Error::EmptyGeometry { id })?;
        store.insert(Flowline::new(
            id,
            geometry,
            rec.huc4,
            rec.gnis_name,
            rec.size_class,
            rec.is_loop,
            rec.perennial,
        )?)?;
    }

    let mut joins = JoinTable::new();
    for rec in basin.joins {
        let upstream = FlowlineId::new(rec.upstream);
        let downstream = FlowlineId::new(rec.downstream);
        for id in [upstream, downstream] {
            if !id.is_sentinel() && !store.contains(id) {
                return Err(Error::InvalidJoin { upstream, downstream });
            }
        }
        joins.add(upstream, downstream);
    }

    Ok((store, joins))
}
