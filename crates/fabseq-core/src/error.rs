use crate::signature::GeometrySignature;
use crate::traversal::TraversalError;
use fabseq_model::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum FabseqError {
    /// Nothing to number: no seeds, or no traversable part reachable from them.
    #[error("no elements selected")]
    EmptySelection,

    /// The run was cancelled before touching the model.
    #[error("invalid numbering input: {0}")]
    InvalidInput(String),

    /// A new signature appeared after the largest sequence number was used.
    #[error("no sequence number left for signature `{0}`")]
    NumbersExhausted(GeometrySignature),

    #[error(transparent)]
    Traversal(#[from] TraversalError),

    #[error(transparent)]
    Model(#[from] ModelError),
}
