//! Core migration vocabulary for Pawl
//!
//! This crate contains the pure, I/O-free parts of the migration engine:
//! version numbers, the operations a caller can request, the commit
//! policies a unit of work can run under, and the planner that turns an
//! operation into ordered install and remove lists.

pub mod error;
pub mod operation;
pub mod plan;
pub mod status;

// Re-export commonly used types at the crate root
pub use error::{PlanError, PlanResult};
pub use operation::{CommitBehavior, MigratorOperation};
pub use plan::{plan, MigrationPlan};
pub use status::MigrationStatuses;

/// A migration version number.
///
/// Versions are compared numerically; by convention they are timestamps
/// such as `20080717013526`.
pub type Version = i64;
