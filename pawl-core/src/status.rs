//! Read-only view of installed versus available migrations

use serde::Serialize;
use std::collections::BTreeSet;

use crate::Version;

/// Partition of installed and available versions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationStatuses {
    /// Available migrations that have not been installed
    pub not_installed: BTreeSet<Version>,

    /// Installed migrations whose implementation is still available
    pub installed_with_available_implementation: BTreeSet<Version>,

    /// Installed migrations whose implementation can no longer be found.
    /// These cannot be backed out.
    pub installed_without_available_implementation: BTreeSet<Version>,
}

impl MigrationStatuses {
    /// Partition the two version sets
    pub fn new(installed: &BTreeSet<Version>, available: &BTreeSet<Version>) -> Self {
        Self {
            not_installed: available.difference(installed).copied().collect(),
            installed_with_available_implementation: installed
                .intersection(available)
                .copied()
                .collect(),
            installed_without_available_implementation: installed
                .difference(available)
                .copied()
                .collect(),
        }
    }

    /// Whether every available migration is installed
    pub fn is_fully_installed(&self) -> bool {
        self.not_installed.is_empty()
    }

    /// All installed versions, with or without an implementation
    pub fn installed(&self) -> BTreeSet<Version> {
        self.installed_with_available_implementation
            .union(&self.installed_without_available_implementation)
            .copied()
            .collect()
    }
}
