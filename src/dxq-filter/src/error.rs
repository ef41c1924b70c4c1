//! Error types for filter compilation and data loading

use dxq_parser::ParseError;
use thiserror::Error;

/// Errors raised while compiling a filter or loading a data map.
///
/// Conversion itself never fails: unresolvable placeholders degrade to
/// their literal `{Entity.Attribute}` spelling.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The filter string could not be tokenized or parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// The data map has an unexpected shape
    #[error("Invalid data for entity '{entity}': {reason}")]
    InvalidData {
        /// Offending entity (or `<root>`)
        entity: String,
        /// What was wrong
        reason: String,
    },

    /// JSON could not be read or written
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The data file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An option value was not recognised
    #[error("Invalid value '{value}' for {option}")]
    InvalidOption {
        /// Option name
        option: String,
        /// The rejected value
        value: String,
    },
}

impl FilterError {
    /// Create an invalid data error
    pub fn invalid_data(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidData {
            entity: entity.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for filter operations
pub type Result<T> = std::result::Result<T, FilterError>;
