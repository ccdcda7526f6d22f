//! SQL generation error types

use thiserror::Error;

use crate::adapter::Vendor;
use crate::column::ColumnType;

/// Result type for SQL generation
pub type SqlResult<T> = std::result::Result<T, SqlError>;

/// Errors raised while turning a schema description into SQL.
///
/// All of these are raised at definition time, before any statement is
/// sent to the database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SqlError {
    /// A column or option could not be constructed from its arguments
    #[error("Construction error: {0}")]
    Construction(String),

    /// The vendor has no faithful representation of a portable column type
    #[error("{vendor} does not support the {column_type} column type")]
    UnsupportedColumnType { vendor: Vendor, column_type: ColumnType },

    /// The vendor rejects a statement or clause the caller asked for
    #[error("{vendor} does not support {feature}")]
    UnsupportedFeature { vendor: Vendor, feature: String },

    /// An argument was empty or otherwise unusable
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),
}

impl SqlError {
    /// Shorthand for an unsupported-feature error
    pub fn unsupported(vendor: Vendor, feature: impl Into<String>) -> Self {
        SqlError::UnsupportedFeature {
            vendor,
            feature: feature.into(),
        }
    }

    /// Get error code for reporting
    pub fn error_code(&self) -> &'static str {
        match self {
            SqlError::Construction(_) => "CONSTRUCTION_ERROR",
            SqlError::UnsupportedColumnType { .. } => "UNSUPPORTED_COLUMN_TYPE",
            SqlError::UnsupportedFeature { .. } => "UNSUPPORTED_FEATURE",
            SqlError::IllegalArgument(_) => "ILLEGAL_ARGUMENT",
        }
    }
}
