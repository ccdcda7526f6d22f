//! Migration operations and commit policies

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;

use crate::{PlanError, PlanResult, Version};

/// An operation a caller can ask the migrator to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MigratorOperation {
    /// Install every available migration that is not installed yet
    InstallAll,

    /// Remove every installed migration, newest first
    RemoveAll,

    /// Install everything up to and including the version, remove everything above it
    MigrateToVersion(Version),

    /// Remove the given number of most recent migrations
    Rollback(NonZeroUsize),
}

impl MigratorOperation {
    /// Create a `MigrateToVersion` operation
    pub fn migrate_to(version: Version) -> Self {
        MigratorOperation::MigrateToVersion(version)
    }

    /// Create a `Rollback` operation, rejecting counts below one
    pub fn rollback(count: usize) -> PlanResult<Self> {
        NonZeroUsize::new(count)
            .map(MigratorOperation::Rollback)
            .ok_or(PlanError::InvalidRollbackCount(count))
    }
}

impl fmt::Display for MigratorOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigratorOperation::InstallAll => write!(f, "install all migrations"),
            MigratorOperation::RemoveAll => write!(f, "remove all migrations"),
            MigratorOperation::MigrateToVersion(version) => {
                write!(f, "migrate to version {}", version)
            }
            MigratorOperation::Rollback(count) => write!(f, "roll back {} migration(s)", count),
        }
    }
}

/// How the transaction around a unit of work is finalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitBehavior {
    /// No transaction is opened; every statement commits on its own
    AutoCommit,

    /// A transaction is opened and committed whether the work succeeds or fails
    CommitRegardless,

    /// A transaction is committed when the work succeeds and rolled back when it fails
    CommitOnSuccessRollbackOnException,
}

impl CommitBehavior {
    /// Whether a transaction must be opened before the work runs
    pub fn opens_transaction(&self) -> bool {
        !matches!(self, CommitBehavior::AutoCommit)
    }
}

impl fmt::Display for CommitBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitBehavior::AutoCommit => write!(f, "auto-commit"),
            CommitBehavior::CommitRegardless => write!(f, "commit-regardless"),
            CommitBehavior::CommitOnSuccessRollbackOnException => {
                write!(f, "commit-on-success-rollback-on-exception")
            }
        }
    }
}
