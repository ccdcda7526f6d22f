//! Planner error types

use thiserror::Error;

use crate::Version;

/// Result type for planning operations
pub type PlanResult<T> = std::result::Result<T, PlanError>;

/// Errors raised while building or validating a migration plan.
///
/// All of these are illegal-argument conditions: they are detected before
/// any database state is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The requested target version is not among the available migrations
    #[error("Target version {0} does not exist")]
    TargetVersionNotFound(Version),

    /// More migrations were asked to be rolled back than are installed
    #[error("Cannot roll back {requested} migrations, only {installed} installed")]
    RollbackExceedsInstalled { requested: usize, installed: usize },

    /// A rollback was requested with a count below one
    #[error("Rollback count must be at least 1, got {0}")]
    InvalidRollbackCount(usize),
}

impl PlanError {
    /// Get error code for reporting
    pub fn error_code(&self) -> &'static str {
        match self {
            PlanError::TargetVersionNotFound(_) => "TARGET_VERSION_NOT_FOUND",
            PlanError::RollbackExceedsInstalled { .. } => "ROLLBACK_EXCEEDS_INSTALLED",
            PlanError::InvalidRollbackCount(_) => "INVALID_ROLLBACK_COUNT",
        }
    }
}
