//! Identifier and classification types shared by the model and the core.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque identifier of a part in the host model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartRef(pub u64);

impl fmt::Display for PartRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for PartRef {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A connector is addressed by its owning part and its position in the
/// owner's connector list.
///
/// The derived `Ord` (owner first, then index) is the stable order used
/// whenever connectors are iterated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(PartRef, u32)", into = "(PartRef, u32)")]
pub struct ConnectorId {
    pub owner: PartRef,
    pub index: u32,
}

impl ConnectorId {
    pub fn new(owner: impl Into<PartRef>, index: u32) -> Self {
        Self {
            owner: owner.into(),
            index,
        }
    }
}

impl From<(PartRef, u32)> for ConnectorId {
    fn from((owner, index): (PartRef, u32)) -> Self {
        Self { owner, index }
    }
}

impl From<ConnectorId> for (PartRef, u32) {
    fn from(c: ConnectorId) -> Self {
        (c.owner, c.index)
    }
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.owner, self.index)
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Spatial origin of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance.
    pub fn distance_to(&self, other: &Point3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl From<[f64; 3]> for Point3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Point3> for [f64; 3] {
    fn from(p: Point3) -> Self {
        [p.x, p.y, p.z]
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Measurable geometry of a fabrication part, read once when the part is
/// classified.
#[derive(Debug, Clone, PartialEq)]
pub struct FabricationGeometry {
    pub size: String,
    /// Centerline length, in model units.
    pub length: f64,
    pub insulation_type: String,
    pub straight: bool,
    /// Display value of the angle attribute. Only looked up for bent parts.
    pub angle: Option<String>,
}

/// What a part is, as far as numbering is concerned.
#[derive(Debug, Clone, PartialEq)]
pub enum PartKind {
    Fabrication(FabricationGeometry),
    Accessory,
    /// Anything else in the model. Never visited past classification.
    Other,
}

impl PartKind {
    /// Whether the traversal walks through parts of this kind.
    pub fn is_traversable(&self) -> bool {
        !matches!(self, PartKind::Other)
    }

    pub fn is_straight_fabrication(&self) -> bool {
        matches!(self, PartKind::Fabrication(g) if g.straight)
    }

    pub fn as_fabrication(&self) -> Option<&FabricationGeometry> {
        match self {
            PartKind::Fabrication(g) => Some(g),
            _ => None,
        }
    }
}
