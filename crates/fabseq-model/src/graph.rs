//! Capabilities consumed by the numbering core.

use crate::error::ModelError;
use crate::types::{ConnectorId, PartKind, PartRef, Point3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Read-only view of the connector graph.
///
/// Implementations are borrowed for the duration of one run. Return order of
/// the collection-valued methods is not relied upon; callers that need a
/// stable order sort by [`ConnectorId`].
pub trait ModelGraph {
    /// Classify a part.
    ///
    /// `Ok(None)` means the id does not resolve in the model. `Err` means the
    /// part resolved but its geometry fields could not be read.
    fn kind_of(&self, part: PartRef) -> Result<Option<PartKind>, ModelError>;

    /// Connectors owned by `part` (empty if the part does not resolve).
    fn connectors_of(&self, part: PartRef) -> Vec<ConnectorId>;

    /// Connectors joined to `connector`. Pairing is symmetric.
    fn paired_connectors(&self, connector: ConnectorId) -> Vec<ConnectorId>;

    fn owner_of(&self, connector: ConnectorId) -> PartRef {
        connector.owner
    }

    fn origin_of(&self, connector: ConnectorId) -> Option<Point3>;
}

impl<G: ModelGraph + ?Sized> ModelGraph for &G {
    fn kind_of(&self, part: PartRef) -> Result<Option<PartKind>, ModelError> {
        (**self).kind_of(part)
    }

    fn connectors_of(&self, part: PartRef) -> Vec<ConnectorId> {
        (**self).connectors_of(part)
    }

    fn paired_connectors(&self, connector: ConnectorId) -> Vec<ConnectorId> {
        (**self).paired_connectors(connector)
    }

    fn owner_of(&self, connector: ConnectorId) -> PartRef {
        (**self).owner_of(connector)
    }

    fn origin_of(&self, connector: ConnectorId) -> Option<Point3> {
        (**self).origin_of(connector)
    }
}

/// Why a write was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    UnresolvedPart,
    MissingAttribute,
    ReadOnlyAttribute,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::UnresolvedPart => "part no longer resolves",
            SkipReason::MissingAttribute => "attribute is missing",
            SkipReason::ReadOnlyAttribute => "attribute is read-only",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Skipped(SkipReason),
}

/// Attribute write-back. Failures are reported, never raised.
pub trait ParameterWriter {
    fn write_attribute(&mut self, part: PartRef, attribute: &str, value: &str) -> WriteOutcome;
}

impl<W: ParameterWriter + ?Sized> ParameterWriter for &mut W {
    fn write_attribute(&mut self, part: PartRef, attribute: &str, value: &str) -> WriteOutcome {
        (**self).write_attribute(part, attribute, value)
    }
}
