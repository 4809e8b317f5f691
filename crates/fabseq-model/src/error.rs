use crate::types::{ConnectorId, PartRef};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A classified part whose geometry could not be read. Never swallowed:
    /// a partial signature would corrupt grouping.
    #[error("failed to read `{field}` of part {part}: {message}")]
    GeometryRead {
        part: PartRef,
        field: &'static str,
        message: String,
    },

    #[error("unknown connector {0}")]
    UnknownConnector(ConnectorId),

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
