//! Network value objects
//!
//! Value objects are immutable types that represent concepts in the pipe network domain.
//! They are compared by value rather than identity: two coincident endpoints read from
//! different source lines are the same `Coordinate` once snapped by a `PrecisionModel`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::errors::{NetworkError, NetworkResult};

/// Folds `-0.0` onto `0.0` so that both share one bit pattern.
fn canonical(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else {
        v
    }
}

/// A planar point of the network, with an optional third ordinate.
///
/// Equality, ordering and hashing use `x` and `y` only. The `z` ordinate is carried
/// through for rendering but never takes part in matching or weighting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Coordinate {
    /// Create a new planar coordinate
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    /// Create a coordinate carrying an elevation
    pub fn with_z(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// Planar (2D) distance to another coordinate
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Whether both planar ordinates are finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Lexicographic XY comparison
    pub fn cmp_xy(&self, other: &Coordinate) -> Ordering {
        canonical(self.x)
            .total_cmp(&canonical(other.x))
            .then_with(|| canonical(self.y).total_cmp(&canonical(other.y)))
    }

    fn key_bits(&self) -> (u64, u64) {
        (canonical(self.x).to_bits(), canonical(self.y).to_bits())
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.key_bits() == other.key_bits()
    }
}

impl Eq for Coordinate {}

impl Hash for Coordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key_bits().hash(state);
    }
}

impl PartialOrd for Coordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_xy(other)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.z {
            Some(z) => write!(f, "({}, {}, {})", self.x, self.y, z),
            None => write!(f, "({}, {})", self.x, self.y),
        }
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

/// Hashable identity of a snapped coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexKey {
    x_bits: u64,
    y_bits: u64,
}

/// Rule for snapping raw ordinates before they are compared.
///
/// One model is fixed for the lifetime of a graph.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrecisionModel {
    /// Full double precision; only the sign of zero is normalized
    #[default]
    Floating,
    /// Round every ordinate to the nearest multiple of `1 / scale`
    Fixed { scale: f64 },
}

impl PrecisionModel {
    /// Create a fixed precision model, e.g. `fixed(1000.0)` keeps three decimals
    pub fn fixed(scale: f64) -> NetworkResult<Self> {
        let model = PrecisionModel::Fixed { scale };
        model.validate()?;
        Ok(model)
    }

    /// Check that the model can snap values
    pub fn validate(&self) -> NetworkResult<()> {
        match *self {
            PrecisionModel::Floating => Ok(()),
            PrecisionModel::Fixed { scale } if scale.is_finite() && scale > 0.0 => Ok(()),
            PrecisionModel::Fixed { scale } => Err(NetworkError::Config(format!(
                "precision scale must be finite and positive, got {scale}"
            ))),
        }
    }

    /// Snap a single ordinate
    pub fn make_precise(&self, value: f64) -> f64 {
        match *self {
            PrecisionModel::Floating => canonical(value),
            PrecisionModel::Fixed { scale } => canonical((value * scale).round() / scale),
        }
    }

    /// Snap every ordinate of a coordinate
    pub fn snap(&self, coordinate: &Coordinate) -> Coordinate {
        Coordinate {
            x: self.make_precise(coordinate.x),
            y: self.make_precise(coordinate.y),
            z: coordinate.z.map(|z| self.make_precise(z)),
        }
    }

    /// Canonical key of a coordinate under this model
    pub fn key(&self, coordinate: &Coordinate) -> VertexKey {
        let (x_bits, y_bits) = self.snap(coordinate).key_bits();
        VertexKey { x_bits, y_bits }
    }

    /// Size of one grid cell, zero for floating precision
    pub fn grid_size(&self) -> f64 {
        match *self {
            PrecisionModel::Floating => 0.0,
            PrecisionModel::Fixed { scale } => 1.0 / scale,
        }
    }
}

/// An undirected straight segment between two distinct coordinates.
///
/// `{a, b}` and `{b, a}` are the same edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Edge {
    pub a: Coordinate,
    pub b: Coordinate,
}

impl Edge {
    /// Create an edge, or `None` when both endpoints coincide
    pub fn new(a: Coordinate, b: Coordinate) -> Option<Self> {
        if a == b {
            None
        } else {
            Some(Self { a, b })
        }
    }

    /// Euclidean length of the segment
    pub fn weight(&self) -> f64 {
        self.a.distance_to(&self.b)
    }

    /// Whether `coordinate` is one of the endpoints
    pub fn touches(&self, coordinate: &Coordinate) -> bool {
        self.a == *coordinate || self.b == *coordinate
    }

    /// The endpoint opposite `coordinate`
    pub fn opposite(&self, coordinate: &Coordinate) -> Option<Coordinate> {
        if self.a == *coordinate {
            Some(self.b)
        } else if self.b == *coordinate {
            Some(self.a)
        } else {
            None
        }
    }

    /// The same edge walked the other way
    pub fn reversed(&self) -> Self {
        Self {
            a: self.b,
            b: self.a,
        }
    }

    fn ordered(&self) -> (Coordinate, Coordinate) {
        if self.a <= self.b {
            (self.a, self.b)
        } else {
            (self.b, self.a)
        }
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.ordered() == other.ordered()
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ordered().hash(state);
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.a, self.b)
    }
}

/// Decomposition tier: 0 is the main route, N > 0 a branch nested N levels deep
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HierarchyLevel(pub u32);

impl HierarchyLevel {
    /// The main route level
    pub const MAIN: HierarchyLevel = HierarchyLevel(0);

    /// The level nested one deeper
    pub fn next(self) -> Self {
        HierarchyLevel(self.0 + 1)
    }

    /// Numeric value of the level
    pub fn value(self) -> u32 {
        self.0
    }

    /// Whether this is the main route level
    pub fn is_main(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}
