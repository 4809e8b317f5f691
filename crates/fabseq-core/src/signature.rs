//! Geometry signatures.
//!
//! Fabrication parts: `size_length_insulation_straight_angle`, with the
//! length rounded half-to-even at three decimals and printed in its shortest
//! form (`2.0` prints as `2`, `2.3450` as `2.345`). Straightness prints as
//! `True`/`False`. The angle is empty for straight parts and for bent parts
//! without an angle value.
//!
//! Accessories share the sentinel [`NOT_FABRICATION_PART`], which is never
//! numbered.

use fabseq_model::{FabricationGeometry, PartKind};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NOT_FABRICATION_PART: &str = "NotFabricationPart";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeometrySignature(String);

impl GeometrySignature {
    pub fn not_fabrication_part() -> Self {
        Self(NOT_FABRICATION_PART.to_string())
    }

    pub fn fabrication(geometry: &FabricationGeometry) -> Self {
        let straight = if geometry.straight { "True" } else { "False" };
        let angle = if geometry.straight {
            ""
        } else {
            geometry.angle.as_deref().unwrap_or("")
        };
        Self(format!(
            "{}_{}_{}_{}_{}",
            geometry.size,
            format_length(geometry.length),
            geometry.insulation_type,
            straight,
            angle
        ))
    }

    pub fn is_sentinel(&self) -> bool {
        self.0 == NOT_FABRICATION_PART
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeometrySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A signature read back from a trace attribute.
impl From<String> for GeometrySignature {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for GeometrySignature {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl AsRef<str> for GeometrySignature {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Signature of a classified part. `None` for parts that are not traversed.
pub fn signature_of(kind: &PartKind) -> Option<GeometrySignature> {
    match kind {
        PartKind::Fabrication(geometry) => Some(GeometrySignature::fabrication(geometry)),
        PartKind::Accessory => Some(GeometrySignature::not_fabrication_part()),
        PartKind::Other => None,
    }
}

/// Round to three decimals, ties to even. `-0` comes back as `0`.
pub fn round_length(length: f64) -> f64 {
    let rounded = (length * 1000.0).round_ties_even() / 1000.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Rounded length in its shortest round-trip decimal form.
pub fn format_length(length: f64) -> String {
    round_length(length).to_string()
}
