//! Planar geometry primitives for flowline polylines.
//!
//! All coordinates live in a shared equal-area planar CRS with meter units,
//! so Euclidean distance is meaningful everywhere. The interesting pieces are
//! the linear-referencing operations on [`Polyline`]:
//!
//! - [`Polyline::project`] - closest point on the polyline to an arbitrary
//!   point, reported as a measure from the upstream end.
//! - [`Polyline::point_at`] - the inverse: interpolate a point at a measure.
//! - [`Polyline::split_at`] - split into children at interior measures,
//!   sharing the cut vertices exactly so child lengths sum to the parent.

use serde::{Deserialize, Serialize};

/// Minimum legal flowline length in meters. Anything shorter is rejected at
/// ingest as empty geometry.
pub const MIN_LENGTH_M: f64 = 0.01;

/// Two cut positions closer than this (1 mm) collapse into a single cut.
pub const CUT_MERGE_EPSILON_M: f64 = 0.001;

/// Basin-border endpoints match within this tolerance (1 cm).
pub const BORDER_TOLERANCE_M: f64 = 0.01;

/// A 2-D point in the common planar CRS.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// An axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Envelope {
    /// A square envelope centered on `p` with half-width `pad`.
    pub fn around(p: &Point, pad: f64) -> Self {
        Self {
            min_x: p.x - pad,
            min_y: p.y - pad,
            max_x: p.x + pad,
            max_y: p.y + pad,
        }
    }

    pub fn intersects(&self, other: &Envelope) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }
}

/// The result of projecting a point onto a polyline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    /// Distance along the polyline from the upstream end to the foot point.
    pub measure: f64,
    /// The closest point on the polyline.
    pub point: Point,
    /// Euclidean distance from the query point to [`Projection::point`].
    pub distance: f64,
}

/// An ordered, directed polyline. The first vertex is the upstream end, the
/// last vertex the downstream end.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Point>,
}

impl Polyline {
    /// Build a polyline from at least two vertices. Returns `None` for fewer.
    pub fn new(points: Vec<Point>) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        Some(Self { points })
    }

    /// Convenience constructor from coordinate pairs.
    pub fn from_coords(coords: &[(f64, f64)]) -> Option<Self> {
        Self::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The upstream endpoint.
    pub fn first(&self) -> Point {
        self.points[0]
    }

    /// The downstream endpoint.
    pub fn last(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// Total polyline length in meters.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance(&w[1]))
            .sum()
    }

    /// Straight-line distance between the two endpoints.
    pub fn straight_line(&self) -> f64 {
        self.first().distance(&self.last())
    }

    /// Sinuosity: straight-line endpoint distance over polyline length.
    ///
    /// A perfectly straight segment scores 1.0; a meandering one approaches
    /// 0. Degenerate zero-length geometry scores 0.
    pub fn sinuosity(&self) -> f64 {
        let length = self.length();
        if length < MIN_LENGTH_M {
            return 0.0;
        }
        self.straight_line() / length
    }

    /// Bounding box over all vertices.
    pub fn envelope(&self) -> Envelope {
        let mut env = Envelope {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for p in &self.points {
            env.min_x = env.min_x.min(p.x);
            env.min_y = env.min_y.min(p.y);
            env.max_x = env.max_x.max(p.x);
            env.max_y = env.max_y.max(p.y);
        }
        env
    }

    /// Minimum Euclidean distance from `p` to the polyline.
    pub fn distance_to(&self, p: &Point) -> f64 {
        self.project(p).distance
    }

    /// Project `p` onto the polyline: the foot of the perpendicular on the
    /// nearest segment, clamped to segment endpoints.
    ///
    /// Ties in distance resolve to the smaller measure, so the result is
    /// deterministic even when a point is equidistant from two segments.
    pub fn project(&self, p: &Point) -> Projection {
        let mut best = Projection {
            measure: 0.0,
            point: self.first(),
            distance: p.distance(&self.first()),
        };
        let mut traversed = 0.0;
        for w in self.points.windows(2) {
            let (a, b) = (w[0], w[1]);
            let seg_len = a.distance(&b);
            if seg_len > 0.0 {
                let t = (((p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y))
                    / (seg_len * seg_len))
                    .clamp(0.0, 1.0);
                let q = Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y));
                let d = p.distance(&q);
                if d < best.distance {
                    best = Projection {
                        measure: traversed + t * seg_len,
                        point: q,
                        distance: d,
                    };
                }
            }
            traversed += seg_len;
        }
        best
    }

    /// Interpolate the point at `measure` meters from the upstream end.
    /// Measures are clamped to `[0, length]`.
    pub fn point_at(&self, measure: f64) -> Point {
        if measure <= 0.0 {
            return self.first();
        }
        let mut remaining = measure;
        for w in self.points.windows(2) {
            let (a, b) = (w[0], w[1]);
            let seg_len = a.distance(&b);
            if remaining <= seg_len && seg_len > 0.0 {
                let t = remaining / seg_len;
                return Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y));
            }
            remaining -= seg_len;
        }
        self.last()
    }

    /// Split the polyline at the given measures, producing `measures.len() + 1`
    /// children ordered upstream to downstream.
    ///
    /// Measures must be strictly ascending and strictly inside `(0, length)`;
    /// the caller (the cutter) is responsible for merging near-duplicate
    /// positions and dropping endpoint positions beforehand. Adjacent
    /// children share the interpolated cut vertex exactly, so the child
    /// lengths sum to the parent length up to floating-point error.
    pub fn split_at(&self, measures: &[f64]) -> Vec<Polyline> {
        if measures.is_empty() {
            return vec![self.clone()];
        }

        let mut children = Vec::with_capacity(measures.len() + 1);
        let mut current = vec![self.first()];
        let mut cuts = measures.iter().copied().peekable();
        let mut traversed = 0.0;

        for w in self.points.windows(2) {
            let (a, b) = (w[0], w[1]);
            let seg_len = a.distance(&b);
            // Place every cut that falls inside this segment.
            while let Some(&m) = cuts.peek() {
                if m > traversed + seg_len {
                    break;
                }
                cuts.next();
                let q = if seg_len > 0.0 {
                    let t = ((m - traversed) / seg_len).clamp(0.0, 1.0);
                    Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y))
                } else {
                    b
                };
                if current.last() != Some(&q) {
                    current.push(q);
                }
                children.push(Polyline { points: current });
                current = vec![q];
            }
            if current.last() != Some(&b) {
                current.push(b);
            }
            traversed += seg_len;
        }

        // Whatever is left of the final segment is the last child.
        if current.len() < 2 {
            current.push(self.last());
        }
        children.push(Polyline { points: current });
        children
    }
}
