//! Defines custom error types for the library.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Error type returned when locating or rewriting fails.
pub enum LocatorError {
    #[error("Invalid locator expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("The element does not belong to the document it was minimized against.")]
    DetachedNode,

    #[error("Unsupported model format '{0}'. Use a .json, .yaml, .yml or .toml file.")]
    UnsupportedModelFormat(String),

    #[error("Failed to parse field model: {0}")]
    ModelParse(String),

    #[error("Failed to parse locator configuration: {0}")]
    ConfigParse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl LocatorError {
    pub(crate) fn invalid(expression: &str, reason: impl Into<String>) -> Self {
        LocatorError::InvalidExpression {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}
