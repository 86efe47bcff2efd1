//! Barrier point features and their snap results.

use crate::flowline::FlowlineId;
use crate::geom::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Unique identifier of a barrier feature.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BarrierId(u64);

impl BarrierId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BarrierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of obstruction a barrier is.
///
/// Which kinds sever the network for a given analysis is decided by the
/// predicate in [`crate::config::Config`], not here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarrierKind {
    Dam,
    Waterfall,
    SmallBarrier,
}

/// A point obstruction on the network, as read from the barrier inventory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Barrier {
    pub id: BarrierId,
    pub kind: BarrierKind,
    pub location: Point,
    pub gnis_name: Option<String>,
    /// Inventory attributes carried through untouched.
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Barrier {
    pub fn new(id: BarrierId, kind: BarrierKind, x: f64, y: f64) -> Self {
        Self {
            id,
            kind,
            location: Point::new(x, y),
            gnis_name: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.gnis_name = Some(name.into());
        self
    }
}

/// Agreement between a barrier's name and its snapped flowline's name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatch {
    Exact,
    Fuzzy,
    None,
}

impl NameMatch {
    pub fn as_str(self) -> &'static str {
        match self {
            NameMatch::Exact => "exact",
            NameMatch::Fuzzy => "fuzzy",
            NameMatch::None => "none",
        }
    }
}

/// Where a barrier landed on the network.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Snap {
    /// The flowline the barrier snapped onto.
    pub flowline: FlowlineId,
    /// Distance along that flowline from its upstream end, in meters.
    pub measure: f64,
    /// The snapped coordinate.
    pub point: Point,
    /// Euclidean distance from the raw barrier point to the projection foot.
    pub distance: f64,
    /// The snap collapsed onto an exact flowline endpoint.
    pub at_endpoint: bool,
}

/// A barrier after snapping, with its QA heuristics.
#[derive(Clone, Debug, PartialEq)]
pub struct SnappedBarrier {
    pub barrier: Barrier,
    /// `None` means off-network: nothing within the configured snap distance.
    pub snap: Option<Snap>,
    pub candidates_within_100m: u32,
    pub name_match: NameMatch,
}

impl SnappedBarrier {
    pub fn is_off_network(&self) -> bool {
        self.snap.is_none()
    }

    /// The recorded snap distance; infinite for off-network barriers.
    pub fn snap_dist(&self) -> f64 {
        self.snap.as_ref().map_or(f64::INFINITY, |s| s.distance)
    }
}
