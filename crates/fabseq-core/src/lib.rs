//! fabseq core: stable sequence labels for connected fabrication parts.
//!
//! A run has three stages:
//!
//! 1. [`traversal`] walks the connector graph from the seed parts and
//!    produces each reachable part exactly once, paired with its
//!    [`GeometrySignature`].
//! 2. [`numbering`] groups the records by signature, handing out sequence
//!    numbers in first-seen order and formatting them with the branch prefix
//!    and the padding width inferred from the start number ([`padding`]).
//! 3. The labels and signatures are written back through a
//!    [`ParameterWriter`](fabseq_model::ParameterWriter).
//!
//! [`run::run_numbering`] composes all three. Every piece of per-run state
//! (visited set, caches, signature map) lives in explicit context values, so
//! concurrent runs never share anything.

pub mod config;
pub mod error;
pub mod numbering;
pub mod padding;
pub mod run;
pub mod signature;
pub mod traversal;

pub use config::{NumberingConfig, DEFAULT_NUMBER_ATTRIBUTE, DEFAULT_TRACE_ATTRIBUTE};
pub use error::FabseqError;
pub use numbering::{
    write_labels, LabelAssignment, NumberAssigner, NumberingReport, NumberingState, SkippedWrite,
};
pub use padding::{padding_width, MalformedPrecisionInput, StartNumber};
pub use run::{collect_network, run_numbering, select_seeds, RunSummary};
pub use signature::{signature_of, GeometrySignature, NOT_FABRICATION_PART};
pub use traversal::{traverse, traverse_with, TraversalContext, TraversalError, VisitRecord};
