//! Fixture builders for tests.
//!
//! Small constructors for flowlines, barriers, stores, and join tables so
//! test scenarios read like the network sketches they encode. Defaults are
//! deliberately boring: basin `0101`, headwater class, perennial, unnamed,
//! not a loop.

use crate::barrier::{Barrier, BarrierId, BarrierKind};
use crate::flowline::{Flowline, FlowlineId, SizeClass};
use crate::geom::Polyline;
use crate::joins::JoinTable;
use crate::store::FlowlineStore;

/// A plain flowline through the given coordinates.
pub fn line(id: u64, coords: &[(f64, f64)]) -> Flowline {
    line_in(id, "0101", coords)
}

/// A flowline in a specific basin.
pub fn line_in(id: u64, huc4: &str, coords: &[(f64, f64)]) -> Flowline {
    Flowline::new(
        FlowlineId::new(id),
        Polyline::from_coords(coords).expect("fixture geometry needs two points"),
        huc4,
        None,
        SizeClass::Headwater,
        false,
        true,
    )
    .expect("fixture geometry is degenerate")
}

/// A named flowline.
pub fn named_line(id: u64, name: &str, coords: &[(f64, f64)]) -> Flowline {
    let mut flowline = line(id, coords);
    flowline.gnis_name = Some(name.to_string());
    flowline
}

/// A loop-flagged flowline.
pub fn loop_line(id: u64, coords: &[(f64, f64)]) -> Flowline {
    let mut flowline = line(id, coords);
    flowline.is_loop = true;
    flowline
}

/// A dam at the given location.
pub fn dam(id: u64, x: f64, y: f64) -> Barrier {
    Barrier::new(BarrierId::new(id), BarrierKind::Dam, x, y)
}

/// A named dam.
pub fn named_dam(id: u64, name: &str, x: f64, y: f64) -> Barrier {
    dam(id, x, y).with_name(name)
}

/// A store holding the given flowlines.
pub fn store_of(flowlines: Vec<Flowline>) -> FlowlineStore {
    let mut store = FlowlineStore::new();
    for flowline in flowlines {
        store.insert(flowline).expect("fixture ids must be unique");
    }
    store
}

/// A join table holding the given `(upstream, downstream)` raw-id pairs.
pub fn joins_of(pairs: &[(u64, u64)]) -> JoinTable {
    let mut joins = JoinTable::new();
    for &(u, d) in pairs {
        joins.add(FlowlineId::new(u), FlowlineId::new(d));
    }
    joins
}
