//! Flowline records and their identifiers.
//!
//! A [`Flowline`] is one directed polyline segment of a stream. Ids are the
//! vendor `NHDPlusID` for unmodified flowlines and freshly minted values for
//! cut products; the reserved value `0` is the join-table sentinel meaning
//! "network origin" upstream or "network terminus" downstream.

use crate::error::{Error, Result};
use crate::geom::{MIN_LENGTH_M, Polyline};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Globally unique 64-bit flowline identifier.
///
/// Small, `Copy`, and ordered; every deterministic tie-break in the crate is
/// "ascending id", so `Ord` is load-bearing here.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowlineId(u64);

impl FlowlineId {
    /// The join-table sentinel: origin upstream, terminus downstream.
    pub const SENTINEL: FlowlineId = FlowlineId(0);

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Return the underlying numeric value.
    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_sentinel(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for FlowlineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordinal stream size class derived from mean annual flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    Headwater,
    SmallCreek,
    Creek,
    SmallRiver,
    River,
    LargeRiver,
    GreatRiver,
}

impl SizeClass {
    /// All classes in ascending order.
    pub const ALL: [SizeClass; 7] = [
        SizeClass::Headwater,
        SizeClass::SmallCreek,
        SizeClass::Creek,
        SizeClass::SmallRiver,
        SizeClass::River,
        SizeClass::LargeRiver,
        SizeClass::GreatRiver,
    ];

    /// Classify from mean annual flow in cubic meters per second.
    pub fn from_mean_annual_flow(cms: f64) -> Self {
        match cms {
            f if f < 0.28 => SizeClass::Headwater,
            f if f < 1.42 => SizeClass::SmallCreek,
            f if f < 2.83 => SizeClass::Creek,
            f if f < 14.16 => SizeClass::SmallRiver,
            f if f < 85.0 => SizeClass::River,
            f if f < 850.0 => SizeClass::LargeRiver,
            _ => SizeClass::GreatRiver,
        }
    }

    /// Position in [`SizeClass::ALL`], useful for histogram slots.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: u8) -> Option<Self> {
        Self::ALL.get(i as usize).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            SizeClass::Headwater => "headwater",
            SizeClass::SmallCreek => "small_creek",
            SizeClass::Creek => "creek",
            SizeClass::SmallRiver => "small_river",
            SizeClass::River => "river",
            SizeClass::LargeRiver => "large_river",
            SizeClass::GreatRiver => "great_river",
        }
    }
}

/// A directed stream segment with its derived metrics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flowline {
    pub id: FlowlineId,
    pub geometry: Polyline,
    /// Polyline length in meters, derived from `geometry`.
    pub length: f64,
    /// Straight-line endpoint distance over length, derived from `geometry`.
    pub sinuosity: f64,
    pub size_class: SizeClass,
    /// 4-digit hydrologic unit code of the containing basin.
    pub huc4: String,
    pub gnis_name: Option<String>,
    /// Participates in a braided/loop feature.
    pub is_loop: bool,
    /// Carries flow year-round (NHD FCode distinction).
    pub perennial: bool,
}

impl Flowline {
    /// Build a flowline, deriving `length` and `sinuosity` from the geometry.
    ///
    /// # Errors
    /// `EmptyGeometry` if the polyline is shorter than the 1 cm minimum.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: FlowlineId,
        geometry: Polyline,
        huc4: impl Into<String>,
        gnis_name: Option<String>,
        size_class: SizeClass,
        is_loop: bool,
        perennial: bool,
    ) -> Result<Self> {
        let length = geometry.length();
        if length < MIN_LENGTH_M {
            return Err(Error::EmptyGeometry { id });
        }
        let sinuosity = geometry.sinuosity();
        Ok(Self {
            id,
            geometry,
            length,
            sinuosity,
            size_class,
            huc4: huc4.into(),
            gnis_name,
            is_loop,
            perennial,
        })
    }

    /// Build a cut product: inherits `huc4`, `gnis_name`, `size_class`,
    /// `loop`, and `perennial` from the parent; `length` and `sinuosity`
    /// are recomputed from the child geometry.
    ///
    /// Children of a valid parent are not re-validated: two barriers just
    /// over 1 mm apart legally produce a sliver shorter than the ingest
    /// minimum.
    pub fn child_of(&self, id: FlowlineId, geometry: Polyline) -> Self {
        let length = geometry.length();
        let sinuosity = geometry.sinuosity();
        Self {
            id,
            geometry,
            length,
            sinuosity,
            size_class: self.size_class,
            huc4: self.huc4.clone(),
            gnis_name: self.gnis_name.clone(),
            is_loop: self.is_loop,
            perennial: self.perennial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Polyline;

    #[test]
    fn size_class_thresholds_are_ordered() {
        assert_eq!(SizeClass::from_mean_annual_flow(0.1), SizeClass::Headwater);
        assert_eq!(SizeClass::from_mean_annual_flow(2.0), SizeClass::Creek);
        assert_eq!(SizeClass::from_mean_annual_flow(50.0), SizeClass::River);
        assert_eq!(SizeClass::from_mean_annual_flow(10_000.0), SizeClass::GreatRiver);
        for (i, class) in SizeClass::ALL.iter().enumerate() {
            assert_eq!(class.index(), i);
            assert_eq!(SizeClass::from_index(i as u8), Some(*class));
        }
    }

    #[test]
    fn degenerate_geometry_is_rejected() {
        let dot = Polyline::from_coords(&[(0.0, 0.0), (0.0, 0.001)]).unwrap();
        let err = Flowline::new(
            FlowlineId::new(1),
            dot,
            "0101",
            None,
            SizeClass::Headwater,
            false,
            true,
        );
        assert!(matches!(err, Err(Error::EmptyGeometry { .. })));
    }
}
