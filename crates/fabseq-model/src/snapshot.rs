//! JSON model snapshots.
//!
//! A snapshot is a self-contained copy of the part network a run operates on:
//! parts with their category, fabrication geometry, connectors and writable
//! parameters, plus the list of connector joins.
//!
//! ```json
//! {
//!   "parts": [
//!     { "id": 1, "category": "fabrication_part",
//!       "geometry": { "size": "10x10", "length": 2.345, "insulation_type": "None", "straight": true },
//!       "connectors": [ { "origin": [0, 0, 0] }, { "origin": [2.345, 0, 0] } ],
//!       "parameters": { "Item Number": { "value": "" }, "Comments": { "value": "" } } },
//!     { "id": 2, "category": "duct_accessory", "connectors": [ { "origin": [0, 0, 0] } ] }
//!   ],
//!   "joins": [ [[1, 0], [2, 0]] ]
//! }
//! ```

use crate::error::ModelError;
use crate::graph::{ModelGraph, ParameterWriter, SkipReason, WriteOutcome};
use crate::types::{ConnectorId, FabricationGeometry, PartKind, PartRef, Point3};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Parameter holding the display value of a bent part's angle.
pub const DEFAULT_ANGLE_PARAMETER: &str = "Angle";

// ============================================================================
// File format
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub parts: Vec<PartRecord>,
    #[serde(default)]
    pub joins: Vec<JoinRecord>,
    /// Fields this tool does not read, written back untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartRecord {
    pub id: PartRef,
    pub category: PartCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<GeometryRecord>,
    #[serde(default)]
    pub connectors: Vec<ConnectorRecord>,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterRecord>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PartRecord {
    pub fn new(id: impl Into<PartRef>, category: PartCategory) -> Self {
        Self {
            id: id.into(),
            category,
            name: None,
            geometry: None,
            connectors: Vec::new(),
            parameters: BTreeMap::new(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Host category of a part. Unrecognised categories keep their text so a
/// saved snapshot reads back exactly as it was loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PartCategory {
    FabricationPart,
    DuctAccessory,
    Other(String),
}

impl PartCategory {
    pub fn as_str(&self) -> &str {
        match self {
            PartCategory::FabricationPart => "fabrication_part",
            PartCategory::DuctAccessory => "duct_accessory",
            PartCategory::Other(name) => name,
        }
    }
}

impl From<String> for PartCategory {
    fn from(name: String) -> Self {
        match name.as_str() {
            "fabrication_part" => PartCategory::FabricationPart,
            "duct_accessory" => PartCategory::DuctAccessory,
            _ => PartCategory::Other(name),
        }
    }
}

impl From<PartCategory> for String {
    fn from(category: PartCategory) -> Self {
        match category {
            PartCategory::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// Raw fabrication fields. Every field is optional on disk so that a
/// damaged export is reported at classification time instead of at load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insulation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub straight: Option<bool>,
}

impl GeometryRecord {
    pub fn straight(size: &str, length: f64, insulation_type: &str) -> Self {
        Self {
            size: Some(size.to_string()),
            length: Some(length),
            insulation_type: Some(insulation_type.to_string()),
            straight: Some(true),
        }
    }

    pub fn bent(size: &str, length: f64, insulation_type: &str) -> Self {
        Self {
            straight: Some(false),
            ..Self::straight(size, length, insulation_type)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectorRecord {
    pub origin: Point3,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterRecord {
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub read_only: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A physical join between two connectors on different parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRecord(pub ConnectorId, pub ConnectorId);

// ============================================================================
// Model
// ============================================================================

/// In-memory model over a [`SnapshotFile`].
#[derive(Debug, Clone)]
pub struct SnapshotModel {
    file: SnapshotFile,
    index: AHashMap<PartRef, usize>,
    pairings: AHashMap<ConnectorId, Vec<ConnectorId>>,
    angle_parameter: String,
}

impl SnapshotModel {
    pub fn from_file(file: SnapshotFile) -> Result<Self, ModelError> {
        let mut index = AHashMap::with_capacity(file.parts.len());
        for (pos, part) in file.parts.iter().enumerate() {
            if index.insert(part.id, pos).is_some() {
                return Err(ModelError::InvalidSnapshot(format!(
                    "duplicate part id {}",
                    part.id
                )));
            }
        }

        let connector_exists = |c: ConnectorId| {
            index
                .get(&c.owner)
                .map(|&pos| (c.index as usize) < file.parts[pos].connectors.len())
                .unwrap_or(false)
        };

        let mut pairings: AHashMap<ConnectorId, Vec<ConnectorId>> = AHashMap::new();
        for JoinRecord(a, b) in &file.joins {
            for c in [a, b] {
                if !connector_exists(*c) {
                    return Err(ModelError::UnknownConnector(*c));
                }
            }
            if a.owner == b.owner {
                return Err(ModelError::InvalidSnapshot(format!(
                    "join {a} <-> {b} connects a part to itself"
                )));
            }
            pairings.entry(*a).or_default().push(*b);
            pairings.entry(*b).or_default().push(*a);
        }
        for paired in pairings.values_mut() {
            paired.sort();
            paired.dedup();
        }

        tracing::debug!(
            parts = file.parts.len(),
            joins = file.joins.len(),
            "loaded model snapshot"
        );

        Ok(Self {
            file,
            index,
            pairings,
            angle_parameter: DEFAULT_ANGLE_PARAMETER.to_string(),
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self, ModelError> {
        let file: SnapshotFile = serde_json::from_str(text)?;
        Self::from_file(file)
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    pub fn to_json_string(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(&self.file)?)
    }

    /// Name of the parameter the angle of bent parts is read from.
    pub fn with_angle_parameter(mut self, name: impl Into<String>) -> Self {
        self.angle_parameter = name.into();
        self
    }

    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::default()
    }

    pub fn file(&self) -> &SnapshotFile {
        &self.file
    }

    pub fn part(&self, id: PartRef) -> Option<&PartRecord> {
        self.index.get(&id).map(|&pos| &self.file.parts[pos])
    }

    fn part_mut(&mut self, id: PartRef) -> Option<&mut PartRecord> {
        let pos = *self.index.get(&id)?;
        self.file.parts.get_mut(pos)
    }

    pub fn parameter(&self, id: PartRef, name: &str) -> Option<&str> {
        self.part(id)?
            .parameters
            .get(name)
            .map(|p| p.value.as_str())
    }

    pub fn part_ids(&self) -> impl Iterator<Item = PartRef> + '_ {
        self.file.parts.iter().map(|p| p.id)
    }

    fn read_fabrication(&self, part: &PartRecord) -> Result<FabricationGeometry, ModelError> {
        let geometry_error = |field: &'static str, message: &str| ModelError::GeometryRead {
            part: part.id,
            field,
            message: message.to_string(),
        };

        let Some(g) = part.geometry.as_ref() else {
            return Err(geometry_error("geometry", "no fabrication geometry recorded"));
        };
        let size = g
            .size
            .clone()
            .ok_or_else(|| geometry_error("size", "missing"))?;
        let length = g.length.ok_or_else(|| geometry_error("length", "missing"))?;
        if !length.is_finite() {
            return Err(geometry_error("length", "not a finite number"));
        }
        let straight = g
            .straight
            .ok_or_else(|| geometry_error("straight", "missing"))?;
        let insulation_type = g.insulation_type.clone().unwrap_or_default();

        let angle = if straight {
            None
        } else {
            part.parameters
                .get(&self.angle_parameter)
                .map(|p| p.value.clone())
        };

        Ok(FabricationGeometry {
            size,
            length,
            insulation_type,
            straight,
            angle,
        })
    }
}

impl ModelGraph for SnapshotModel {
    fn kind_of(&self, part: PartRef) -> Result<Option<PartKind>, ModelError> {
        let Some(record) = self.part(part) else {
            return Ok(None);
        };
        let kind = match &record.category {
            PartCategory::FabricationPart => PartKind::Fabrication(self.read_fabrication(record)?),
            PartCategory::DuctAccessory => PartKind::Accessory,
            PartCategory::Other(_) => PartKind::Other,
        };
        Ok(Some(kind))
    }

    fn connectors_of(&self, part: PartRef) -> Vec<ConnectorId> {
        let Some(record) = self.part(part) else {
            return Vec::new();
        };
        (0..record.connectors.len() as u32)
            .map(|index| ConnectorId { owner: part, index })
            .collect()
    }

    fn paired_connectors(&self, connector: ConnectorId) -> Vec<ConnectorId> {
        self.pairings.get(&connector).cloned().unwrap_or_default()
    }

    fn origin_of(&self, connector: ConnectorId) -> Option<Point3> {
        self.part(connector.owner)?
            .connectors
            .get(connector.index as usize)
            .map(|c| c.origin)
    }
}

impl ParameterWriter for SnapshotModel {
    fn write_attribute(&mut self, part: PartRef, attribute: &str, value: &str) -> WriteOutcome {
        let Some(record) = self.part_mut(part) else {
            return WriteOutcome::Skipped(SkipReason::UnresolvedPart);
        };
        let Some(param) = record.parameters.get_mut(attribute) else {
            return WriteOutcome::Skipped(SkipReason::MissingAttribute);
        };
        if param.read_only {
            return WriteOutcome::Skipped(SkipReason::ReadOnlyAttribute);
        }
        param.value = value.to_string();
        WriteOutcome::Written
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Programmatic construction of a snapshot.
///
/// Connectors, joins and parameters may be declared before the part they
/// belong to; everything is resolved in [`SnapshotBuilder::build`].
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    parts: Vec<PartRecord>,
    connectors: Vec<(PartRef, Point3)>,
    parameters: Vec<(PartRef, String, ParameterRecord)>,
    writable_everywhere: Vec<String>,
    joins: Vec<JoinRecord>,
    angle_parameter: Option<String>,
}

impl SnapshotBuilder {
    pub fn part(mut self, record: PartRecord) -> Self {
        self.parts.push(record);
        self
    }

    pub fn fabrication(self, id: u64, geometry: GeometryRecord) -> Self {
        let mut record = PartRecord::new(id, PartCategory::FabricationPart);
        record.geometry = Some(geometry);
        self.part(record)
    }

    pub fn accessory(self, id: u64) -> Self {
        self.part(PartRecord::new(id, PartCategory::DuctAccessory))
    }

    pub fn other(self, id: u64) -> Self {
        self.part(PartRecord::new(id, PartCategory::Other("generic_model".to_string())))
    }

    /// Append a connector to `part`. Its index is its position among the
    /// part's connectors, in declaration order.
    pub fn connector(mut self, part: u64, origin: impl Into<Point3>) -> Self {
        self.connectors.push((PartRef(part), origin.into()));
        self
    }

    pub fn join(mut self, a: (u64, u32), b: (u64, u32)) -> Self {
        self.joins
            .push(JoinRecord(ConnectorId::new(a.0, a.1), ConnectorId::new(b.0, b.1)));
        self
    }

    pub fn parameter(mut self, part: u64, name: &str, value: &str) -> Self {
        self.parameters.push((
            PartRef(part),
            name.to_string(),
            ParameterRecord {
                value: value.to_string(),
                read_only: false,
            },
        ));
        self
    }

    pub fn read_only_parameter(mut self, part: u64, name: &str, value: &str) -> Self {
        self.parameters.push((
            PartRef(part),
            name.to_string(),
            ParameterRecord {
                value: value.to_string(),
                read_only: true,
            },
        ));
        self
    }

    /// Give every part an empty, writable parameter with each of `names`
    /// unless the part already declares one.
    pub fn writable(mut self, names: &[&str]) -> Self {
        self.writable_everywhere
            .extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn angle_parameter(mut self, name: &str) -> Self {
        self.angle_parameter = Some(name.to_string());
        self
    }

    pub fn build(self) -> Result<SnapshotModel, ModelError> {
        let SnapshotBuilder {
            mut parts,
            connectors,
            parameters,
            writable_everywhere,
            joins,
            angle_parameter,
        } = self;

        let position = |parts: &[PartRecord], id: PartRef| {
            parts.iter().position(|p| p.id == id).ok_or_else(|| {
                ModelError::InvalidSnapshot(format!("part {id} is not declared"))
            })
        };

        for (id, origin) in connectors {
            let pos = position(&parts, id)?;
            parts[pos].connectors.push(ConnectorRecord { origin });
        }
        for (id, name, record) in parameters {
            let pos = position(&parts, id)?;
            parts[pos].parameters.insert(name, record);
        }
        for part in &mut parts {
            for name in &writable_everywhere {
                part.parameters.entry(name.clone()).or_default();
            }
        }

        let model = SnapshotModel::from_file(SnapshotFile {
            parts,
            joins,
            ..SnapshotFile::default()
        })?;
        Ok(match angle_parameter {
            Some(name) => model.with_angle_parameter(name),
            None => model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEE_JSON: &str = r#"
    {
      "name": "tee",
      "parts": [
        { "id": 1, "category": "fabrication_part",
          "geometry": { "size": "10x10", "length": 2.345, "insulation_type": "None", "straight": true },
          "connectors": [ { "origin": [0, 0, 0] }, { "origin": [2.345, 0, 0] }, { "origin": [1.0, 0.5, 0] } ],
          "parameters": { "Item Number": { "value": "" }, "Comments": { "value": "" } } },
        { "id": 2, "category": "duct_accessory", "connectors": [ { "origin": [0, 0, 0] } ] },
        { "id": 3, "category": "duct_accessory", "connectors": [ { "origin": [2.345, 0, 0] } ] },
        { "id": 4, "category": "pipe_hanger" }
      ],
      "joins": [ [[1, 0], [2, 0]], [[3, 0], [1, 1]] ]
    }"#;

    #[test]
    fn test_load_classifies_parts() {
        let model = SnapshotModel::from_json_str(TEE_JSON).unwrap();

        let kind = model.kind_of(PartRef(1)).unwrap().unwrap();
        let g = kind.as_fabrication().unwrap();
        assert_eq!(g.size, "10x10");
        assert_eq!(g.length, 2.345);
        assert!(g.straight);
        assert_eq!(g.angle, None);

        assert_eq!(model.kind_of(PartRef(2)).unwrap(), Some(PartKind::Accessory));
        assert_eq!(model.kind_of(PartRef(4)).unwrap(), Some(PartKind::Other));
        assert_eq!(model.kind_of(PartRef(99)).unwrap(), None);
    }

    #[test]
    fn test_pairing_is_symmetric() {
        let model = SnapshotModel::from_json_str(TEE_JSON).unwrap();
        assert_eq!(
            model.paired_connectors(ConnectorId::new(1u64, 1)),
            vec![ConnectorId::new(3u64, 0)]
        );
        assert_eq!(
            model.paired_connectors(ConnectorId::new(3u64, 0)),
            vec![ConnectorId::new(1u64, 1)]
        );
        assert!(model.paired_connectors(ConnectorId::new(1u64, 2)).is_empty());
        assert_eq!(model.connectors_of(PartRef(1)).len(), 3);
        assert!(model.connectors_of(PartRef(4)).is_empty());
    }

    #[test]
    fn test_join_to_unknown_connector_is_rejected() {
        let err = SnapshotModel::builder()
            .accessory(1)
            .accessory(2)
            .connector(1, [0.0, 0.0, 0.0])
            .join((1, 0), (2, 5))
            .build()
            .unwrap_err();
        assert!(
            matches!(err, ModelError::UnknownConnector(c) if c == ConnectorId::new(2u64, 5)),
            "{err}"
        );
    }

    #[test]
    fn test_duplicate_part_ids_are_rejected() {
        let err = SnapshotModel::builder()
            .accessory(1)
            .accessory(1)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("duplicate part id #1"));
    }

    #[test]
    fn test_missing_length_is_a_geometry_error() {
        let model = SnapshotModel::builder()
            .fabrication(
                5,
                GeometryRecord {
                    length: None,
                    ..GeometryRecord::straight("20x20", 1.0, "None")
                },
            )
            .build()
            .unwrap();
        match model.kind_of(PartRef(5)) {
            Err(ModelError::GeometryRead { part, field, .. }) => {
                assert_eq!(part, PartRef(5));
                assert_eq!(field, "length");
            }
            other => panic!("expected geometry error, got {other:?}"),
        }
    }

    #[test]
    fn test_angle_is_read_only_for_bent_parts() {
        let model = SnapshotModel::builder()
            .fabrication(1, GeometryRecord::bent("10x10", 0.5, "None"))
            .fabrication(2, GeometryRecord::straight("10x10", 0.5, "None"))
            .parameter(1, "Bend", "90.00°")
            .parameter(2, "Bend", "45.00°")
            .angle_parameter("Bend")
            .build()
            .unwrap();

        let bent = model.kind_of(PartRef(1)).unwrap().unwrap();
        assert_eq!(bent.as_fabrication().unwrap().angle.as_deref(), Some("90.00°"));
        let straight = model.kind_of(PartRef(2)).unwrap().unwrap();
        assert_eq!(straight.as_fabrication().unwrap().angle, None);
    }

    #[test]
    fn test_write_outcomes() {
        let mut model = SnapshotModel::builder()
            .accessory(1)
            .parameter(1, "Item Number", "")
            .read_only_parameter(1, "Comments", "locked")
            .build()
            .unwrap();

        assert_eq!(
            model.write_attribute(PartRef(1), "Item Number", "P-7"),
            WriteOutcome::Written
        );
        assert_eq!(model.parameter(PartRef(1), "Item Number"), Some("P-7"));
        assert_eq!(
            model.write_attribute(PartRef(1), "Comments", "x"),
            WriteOutcome::Skipped(SkipReason::ReadOnlyAttribute)
        );
        assert_eq!(model.parameter(PartRef(1), "Comments"), Some("locked"));
        assert_eq!(
            model.write_attribute(PartRef(1), "Mark", "x"),
            WriteOutcome::Skipped(SkipReason::MissingAttribute)
        );
        assert_eq!(
            model.write_attribute(PartRef(9), "Item Number", "x"),
            WriteOutcome::Skipped(SkipReason::UnresolvedPart)
        );
    }

    #[test]
    fn test_save_and_reload_keeps_written_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let mut model = SnapshotModel::from_json_str(TEE_JSON).unwrap();
        model.write_attribute(PartRef(1), "Item Number", "P-07");
        model.save(&path).unwrap();

        let reloaded = SnapshotModel::load(&path).unwrap();
        assert_eq!(reloaded.parameter(PartRef(1), "Item Number"), Some("P-07"));
        assert_eq!(reloaded.file().name.as_deref(), Some("tee"));
        assert_eq!(reloaded.file().joins.len(), 2);
        assert_eq!(
            reloaded.part(PartRef(4)).unwrap().category,
            PartCategory::Other("pipe_hanger".to_string())
        );
    }

    #[test]
    fn test_save_keeps_unknown_categories_and_fields() {
        let json = r#"{
            "parts": [ { "id": 4, "category": "pipe_hanger", "extra": 1, "level": { "name": "L2" } } ],
            "exported_by": "host 2024"
        }"#;
        let model = SnapshotModel::from_json_str(json).unwrap();
        assert_eq!(model.kind_of(PartRef(4)).unwrap(), Some(PartKind::Other));

        let out = model.to_json_string().unwrap();
        let saved: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(saved["parts"][0]["category"], "pipe_hanger");
        assert_eq!(saved["parts"][0]["extra"], 1);
        assert_eq!(saved["parts"][0]["level"]["name"], "L2");
        assert_eq!(saved["exported_by"], "host 2024");
    }

    #[test]
    fn test_known_categories_round_trip_as_text() {
        for (text, category) in [
            ("fabrication_part", PartCategory::FabricationPart),
            ("duct_accessory", PartCategory::DuctAccessory),
            ("other", PartCategory::Other("other".to_string())),
        ] {
            assert_eq!(PartCategory::from(text.to_string()), category);
            assert_eq!(String::from(category), text);
        }
    }
}
