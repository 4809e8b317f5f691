//! Model capabilities for fabrication-part numbering.
//!
//! The numbering core never talks to a host model store directly. It sees the
//! store through two narrow capabilities:
//!
//! - [`ModelGraph`]: part classification, connector sets, connector pairings
//!   and connector origins (read-only for the duration of a run).
//! - [`ParameterWriter`]: attribute write-back, reporting per-write outcomes
//!   instead of failing.
//!
//! [`SnapshotModel`] implements both over a JSON snapshot of a connected
//! network, which is what the `fabseq` CLI and the tests run against.
//!
//! ```text
//!  seeds ──► ModelGraph ──► traversal ──► numbering ──► ParameterWriter
//! ```

pub mod error;
pub mod graph;
pub mod snapshot;
pub mod types;

pub use error::ModelError;
pub use graph::{ModelGraph, ParameterWriter, SkipReason, WriteOutcome};
pub use snapshot::{
    ConnectorRecord, GeometryRecord, JoinRecord, ParameterRecord, PartCategory, PartRecord,
    SnapshotBuilder, SnapshotFile, SnapshotModel, DEFAULT_ANGLE_PARAMETER,
};
pub use types::{ConnectorId, FabricationGeometry, PartKind, PartRef, Point3};
