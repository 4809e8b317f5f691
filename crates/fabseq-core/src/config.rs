//! Numbering run configuration.

use crate::error::FabseqError;
use crate::padding::StartNumber;
use serde::{Deserialize, Serialize};

/// Attribute receiving the label.
pub const DEFAULT_NUMBER_ATTRIBUTE: &str = "Item Number";
/// Attribute receiving the geometry signature, so a label can be traced back
/// to the geometry it groups.
pub const DEFAULT_TRACE_ATTRIBUTE: &str = "Comments";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingConfig {
    /// Prefix prepended to every label.
    pub branch: String,
    pub start: StartNumber,
    pub number_attribute: String,
    pub trace_attribute: String,
    /// Render labels as `{branch}{number}---{signature}`.
    pub embed_signature_in_label: bool,
}

impl NumberingConfig {
    pub fn new(branch: impl Into<String>, start: StartNumber) -> Self {
        Self {
            branch: branch.into(),
            start,
            number_attribute: DEFAULT_NUMBER_ATTRIBUTE.to_string(),
            trace_attribute: DEFAULT_TRACE_ATTRIBUTE.to_string(),
            embed_signature_in_label: false,
        }
    }

    pub fn with_attributes(
        mut self,
        number_attribute: impl Into<String>,
        trace_attribute: impl Into<String>,
    ) -> Self {
        self.number_attribute = number_attribute.into();
        self.trace_attribute = trace_attribute.into();
        self
    }

    pub fn with_embedded_signature(mut self, embed: bool) -> Self {
        self.embed_signature_in_label = embed;
        self
    }

    /// A run needs a branch prefix, a start number above zero, and two
    /// named attributes.
    pub fn validate(&self) -> Result<(), FabseqError> {
        if self.branch.is_empty() {
            return Err(FabseqError::InvalidInput(
                "branch prefix must not be empty".to_string(),
            ));
        }
        if self.start.value == 0 {
            return Err(FabseqError::InvalidInput(
                "start number must be greater than zero".to_string(),
            ));
        }
        if self.number_attribute.trim().is_empty() || self.trace_attribute.trim().is_empty() {
            return Err(FabseqError::InvalidInput(
                "attribute names must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
