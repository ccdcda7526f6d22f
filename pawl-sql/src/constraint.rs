//! Index, foreign key and check constraint options

use std::fmt;

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{SqlError, SqlResult};

/// A table together with an ordered list of its columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumns {
    pub table: String,
    pub columns: Vec<String>,
}

impl TableColumns {
    pub fn new(
        table: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(String::as_str).collect()
    }

    pub(crate) fn require_columns(&self, what: &str) -> SqlResult<()> {
        if self.columns.is_empty() {
            return Err(SqlError::IllegalArgument(format!(
                "{} on table '{}' needs at least one column",
                what, self.table
            )));
        }
        Ok(())
    }
}

/// The referencing side of a foreign key, or the target of a check
pub fn on(
    table: impl Into<String>,
    columns: impl IntoIterator<Item = impl Into<String>>,
) -> TableColumns {
    TableColumns::new(table, columns)
}

/// The referenced side of a foreign key
pub fn references(
    table: impl Into<String>,
    columns: impl IntoIterator<Item = impl Into<String>>,
) -> TableColumns {
    TableColumns::new(table, columns)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOption {
    Name(String),
    Unique,
}

/// Referential action for ON DELETE and ON UPDATE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForeignKeyAction {
    Cascade,
    NoAction,
    Restrict,
    SetDefault,
    SetNull,
}

impl ForeignKeyAction {
    pub fn sql(&self) -> &'static str {
        match self {
            ForeignKeyAction::Cascade => "CASCADE",
            ForeignKeyAction::NoAction => "NO ACTION",
            ForeignKeyAction::Restrict => "RESTRICT",
            ForeignKeyAction::SetDefault => "SET DEFAULT",
            ForeignKeyAction::SetNull => "SET NULL",
        }
    }
}

impl fmt::Display for ForeignKeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForeignKeyOption {
    Name(String),
    OnDelete(ForeignKeyAction),
    OnUpdate(ForeignKeyAction),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOption {
    Name(String),
}

/// First explicit name wins; later conflicting names are reported
pub(crate) fn resolve_name<'a>(
    kind: &'static str,
    explicit: impl IntoIterator<Item = &'a str>,
    derived: impl FnOnce() -> String,
    sink: &dyn DiagnosticSink,
) -> String {
    let mut kept: Option<&str> = None;
    for name in explicit {
        match kept {
            None => kept = Some(name),
            Some(first) if first != name => sink.report(Diagnostic::ConflictingName {
                kind,
                kept: first.to_string(),
                ignored: name.to_string(),
            }),
            Some(_) => {}
        }
    }
    kept.map(str::to_string).unwrap_or_else(derived)
}

/// Resolved index options
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IndexSpec {
    pub name: String,
    pub unique: bool,
}

pub(crate) fn resolve_index_options(
    table: &str,
    columns: &[&str],
    options: &[IndexOption],
    sink: &dyn DiagnosticSink,
) -> IndexSpec {
    let names = options.iter().filter_map(|option| match option {
        IndexOption::Name(name) => Some(name.as_str()),
        IndexOption::Unique => None,
    });
    IndexSpec {
        name: resolve_name("index", names, || crate::naming::index_name(table, columns), sink),
        unique: options.contains(&IndexOption::Unique),
    }
}

/// Resolved foreign key options
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ForeignKeySpec {
    pub name: String,
    pub on_delete: Option<ForeignKeyAction>,
    pub on_update: Option<ForeignKeyAction>,
}

fn keep_last_action(
    slot: &mut Option<ForeignKeyAction>,
    action: ForeignKeyAction,
    clause: &'static str,
    sink: &dyn DiagnosticSink,
) {
    if let Some(previous) = *slot {
        if previous != action {
            sink.report(Diagnostic::ActionRedefined {
                clause,
                previous: previous.to_string(),
                current: action.to_string(),
            });
        }
    }
    *slot = Some(action);
}

pub(crate) fn resolve_foreign_key_options(
    on: &TableColumns,
    references: &TableColumns,
    options: &[ForeignKeyOption],
    sink: &dyn DiagnosticSink,
) -> ForeignKeySpec {
    let mut on_delete = None;
    let mut on_update = None;
    for option in options {
        match option {
            ForeignKeyOption::OnDelete(action) => {
                keep_last_action(&mut on_delete, *action, "ON DELETE", sink)
            }
            ForeignKeyOption::OnUpdate(action) => {
                keep_last_action(&mut on_update, *action, "ON UPDATE", sink)
            }
            ForeignKeyOption::Name(_) => {}
        }
    }

    let names = options.iter().filter_map(|option| match option {
        ForeignKeyOption::Name(name) => Some(name.as_str()),
        _ => None,
    });
    let name = resolve_name(
        "foreign key",
        names,
        || {
            crate::naming::foreign_key_name(
                &on.table,
                &on.column_names(),
                &references.table,
                &references.column_names(),
            )
        },
        sink,
    );

    ForeignKeySpec {
        name,
        on_delete,
        on_update,
    }
}

pub(crate) fn resolve_check_name(
    on: &TableColumns,
    options: &[CheckOption],
    sink: &dyn DiagnosticSink,
) -> String {
    let names = options.iter().map(|CheckOption::Name(name)| name.as_str());
    resolve_name(
        "check",
        names,
        || crate::naming::check_name(&on.table, &on.column_names()),
        sink,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;

    #[test]
    fn test_index_name_derived() {
        let sink = CollectingSink::new();
        let spec = resolve_index_options("people", &["last", "first"], &[IndexOption::Unique], sink.as_ref());
        assert_eq!(spec.name, "idx_people_last_first");
        assert!(spec.unique);
    }

    #[test]
    fn test_first_explicit_name_kept() {
        let sink = CollectingSink::new();
        let spec = resolve_index_options(
            "people",
            &["last"],
            &[
                IndexOption::Name("by_last".to_string()),
                IndexOption::Name("by_last".to_string()),
                IndexOption::Name("other".to_string()),
            ],
            sink.as_ref(),
        );
        assert_eq!(spec.name, "by_last");
        assert_eq!(
            sink.take(),
            vec![Diagnostic::ConflictingName {
                kind: "index",
                kept: "by_last".to_string(),
                ignored: "other".to_string(),
            }]
        );
    }

    #[test]
    fn test_foreign_key_options() {
        let sink = CollectingSink::new();
        let spec = resolve_foreign_key_options(
            &on("people", ["location_id"]),
            &references("locations", ["id"]),
            &[
                ForeignKeyOption::OnDelete(ForeignKeyAction::Cascade),
                ForeignKeyOption::OnDelete(ForeignKeyAction::SetNull),
            ],
            sink.as_ref(),
        );
        assert_eq!(spec.name, "fk_people_location_id_locations_id");
        assert_eq!(spec.on_delete, Some(ForeignKeyAction::SetNull));
        assert_eq!(spec.on_update, None);
        assert_eq!(sink.take().len(), 1);
    }

    #[test]
    fn test_check_name() {
        let sink = CollectingSink::new();
        assert_eq!(
            resolve_check_name(&on("people", ["age"]), &[], sink.as_ref()),
            "chk_people_age"
        );
        assert_eq!(
            resolve_check_name(
                &on("people", ["age"]),
                &[CheckOption::Name("adult".to_string())],
                sink.as_ref()
            ),
            "adult"
        );
    }

    #[test]
    fn test_require_columns() {
        let empty = on("people", Vec::<String>::new());
        assert!(matches!(empty.require_columns("An index"), Err(SqlError::IllegalArgument(_))));
    }
}
