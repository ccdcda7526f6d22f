//! Migration planning
//!
//! The planner is a pure function of the installed versions, the available
//! versions and the requested operation. It never looks at the database and
//! never fails after deciding on a plan, so every planning error surfaces
//! before a single migration runs.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::{MigratorOperation, PlanError, PlanResult, Version};

/// The ordered work a migrator run will perform.
///
/// `remove` is always executed before `install`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationPlan {
    /// Versions to install, ascending
    pub install: Vec<Version>,

    /// Versions to remove, descending
    pub remove: Vec<Version>,
}

impl MigrationPlan {
    /// Whether the plan has nothing to do
    pub fn is_empty(&self) -> bool {
        self.install.is_empty() && self.remove.is_empty()
    }

    /// The installed-version set that results from executing this plan
    pub fn apply_to(&self, installed: &BTreeSet<Version>) -> BTreeSet<Version> {
        let mut result = installed.clone();
        for version in &self.remove {
            result.remove(version);
        }
        result.extend(self.install.iter().copied());
        result
    }
}

/// Compute the install and remove lists for an operation
pub fn plan(
    installed: &BTreeSet<Version>,
    available: &BTreeSet<Version>,
    operation: MigratorOperation,
) -> PlanResult<MigrationPlan> {
    match operation {
        MigratorOperation::InstallAll => Ok(MigrationPlan {
            install: available.difference(installed).copied().collect(),
            remove: Vec::new(),
        }),

        MigratorOperation::RemoveAll => Ok(MigrationPlan {
            install: Vec::new(),
            remove: installed.iter().rev().copied().collect(),
        }),

        MigratorOperation::MigrateToVersion(target) => {
            if !available.contains(&target) {
                return Err(PlanError::TargetVersionNotFound(target));
            }

            let install = available
                .range(..=target)
                .filter(|version| !installed.contains(version))
                .copied()
                .collect();

            let remove = installed
                .iter()
                .rev()
                .take_while(|version| **version > target)
                .copied()
                .collect();

            Ok(MigrationPlan { install, remove })
        }

        MigratorOperation::Rollback(count) => {
            let count = count.get();
            if count > installed.len() {
                return Err(PlanError::RollbackExceedsInstalled {
                    requested: count,
                    installed: installed.len(),
                });
            }

            Ok(MigrationPlan {
                install: Vec::new(),
                remove: installed.iter().rev().take(count).copied().collect(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn versions(values: &[Version]) -> BTreeSet<Version> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_install_all_from_empty() {
        let result = plan(&versions(&[]), &versions(&[1, 2]), MigratorOperation::InstallAll).unwrap();
        assert_eq!(result.install, vec![1, 2]);
        assert!(result.remove.is_empty());
    }

    #[test]
    fn test_install_all_when_fully_installed_is_empty() {
        let installed = versions(&[1, 2, 3]);
        let result = plan(&installed, &installed, MigratorOperation::InstallAll).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_install_all_fills_gaps() {
        let result = plan(
            &versions(&[1, 3]),
            &versions(&[1, 2, 3, 4]),
            MigratorOperation::InstallAll,
        )
        .unwrap();
        assert_eq!(result.install, vec![2, 4]);
    }

    #[test]
    fn test_remove_all_is_descending() {
        let result = plan(&versions(&[5, 1, 3]), &versions(&[1]), MigratorOperation::RemoveAll).unwrap();
        assert_eq!(result.remove, vec![5, 3, 1]);
        assert!(result.install.is_empty());
    }

    #[test]
    fn test_migrate_to_version_installs_and_removes() {
        let result = plan(
            &versions(&[1, 4, 5]),
            &versions(&[1, 2, 3, 4, 5]),
            MigratorOperation::migrate_to(3),
        )
        .unwrap();
        assert_eq!(result.install, vec![2, 3]);
        assert_eq!(result.remove, vec![5, 4]);
    }

    #[test]
    fn test_migrate_to_version_removes_installed_without_implementation() {
        let result = plan(
            &versions(&[1, 2, 9]),
            &versions(&[1, 2]),
            MigratorOperation::migrate_to(2),
        )
        .unwrap();
        assert_eq!(result.remove, vec![9]);
        assert!(result.install.is_empty());
    }

    #[test]
    fn test_migrate_to_unknown_version_fails() {
        let result = plan(&versions(&[1]), &versions(&[1, 2]), MigratorOperation::migrate_to(7));
        assert_eq!(result, Err(PlanError::TargetVersionNotFound(7)));
    }

    #[test]
    fn test_rollback_removes_highest_versions() {
        let result = plan(
            &versions(&[1, 2]),
            &versions(&[1, 2]),
            MigratorOperation::rollback(1).unwrap(),
        )
        .unwrap();
        assert_eq!(result.remove, vec![2]);
        assert!(result.install.is_empty());
        assert_eq!(result.apply_to(&versions(&[1, 2])), versions(&[1]));
    }

    #[test]
    fn test_rollback_exceeding_installed_fails() {
        let result = plan(
            &versions(&[1]),
            &versions(&[1, 2]),
            MigratorOperation::rollback(2).unwrap(),
        );
        assert_eq!(
            result,
            Err(PlanError::RollbackExceedsInstalled { requested: 2, installed: 1 })
        );
    }

    fn version_set() -> impl Strategy<Value = BTreeSet<Version>> {
        prop::collection::btree_set(1i64..40, 0..12)
    }

    proptest! {
        #[test]
        fn prop_plans_are_disjoint_and_ordered(
            installed in version_set(),
            available in version_set(),
            target in 1i64..40,
            count in 1usize..6,
        ) {
            let operations = [
                MigratorOperation::InstallAll,
                MigratorOperation::RemoveAll,
                MigratorOperation::migrate_to(target),
                MigratorOperation::rollback(count).unwrap(),
            ];

            for operation in operations {
                if let Ok(result) = plan(&installed, &available, operation) {
                    let install: BTreeSet<_> = result.install.iter().copied().collect();
                    let remove: BTreeSet<_> = result.remove.iter().copied().collect();
                    prop_assert!(install.is_disjoint(&remove));
                    prop_assert!(result.install.windows(2).all(|w| w[0] < w[1]));
                    prop_assert!(result.remove.windows(2).all(|w| w[0] > w[1]));
                    prop_assert!(remove.is_subset(&installed));
                    prop_assert!(install.is_disjoint(&installed));
                }
            }
        }

        #[test]
        fn prop_install_all_reaches_union(installed in version_set(), available in version_set()) {
            let result = plan(&installed, &available, MigratorOperation::InstallAll).unwrap();
            let expected: BTreeSet<_> = installed.union(&available).copied().collect();
            prop_assert_eq!(result.apply_to(&installed), expected);
        }

        #[test]
        fn prop_migrate_to_version_reaches_prefix(
            installed in version_set(),
            available in version_set(),
            target in 1i64..40,
        ) {
            match plan(&installed, &available, MigratorOperation::migrate_to(target)) {
                Ok(result) => {
                    let resulting = result.apply_to(&installed);
                    prop_assert!(resulting.iter().all(|version| *version <= target));
                    prop_assert!(available.range(..=target).all(|version| resulting.contains(version)));
                }
                Err(error) => {
                    prop_assert!(!available.contains(&target));
                    prop_assert_eq!(error, PlanError::TargetVersionNotFound(target));
                }
            }
        }

        #[test]
        fn prop_rollback_removes_exactly_count(installed in version_set(), count in 1usize..6) {
            let operation = MigratorOperation::rollback(count).unwrap();
            match plan(&installed, &BTreeSet::new(), operation) {
                Ok(result) => {
                    prop_assert_eq!(result.remove.len(), count);
                    prop_assert_eq!(result.apply_to(&installed).len(), installed.len() - count);
                }
                Err(_) => prop_assert!(count > installed.len()),
            }
        }
    }
}
