//! Soft diagnostics raised while building DDL
//!
//! Problems that do not make a definition unusable are reported here
//! instead of failing: a redefined option, an option the column type
//! ignores, a character set the vendor cannot honor. Adapters hold a
//! [`DiagnosticSink`]; the default sink forwards to `tracing`.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::adapter::Vendor;
use crate::column::ColumnType;

/// A non-fatal observation about a schema definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A single-valued column option was given twice with different values
    OptionRedefined {
        column: String,
        option: &'static str,
        previous: String,
        current: String,
    },

    /// The column type does not recognize the option
    UnusedColumnOption { column: String, option: String },

    /// A primary key column was declared nullable
    PrimaryKeyNullable { column: String },

    /// An option is implied by PRIMARY KEY
    RedundantWithPrimaryKey { column: String, option: &'static str },

    /// A character set was requested on a non-character column
    CharacterSetOnNonCharacterType { column: String, column_type: ColumnType },

    /// The vendor ignores the requested character set
    CharacterSetIgnored {
        column: String,
        vendor: Vendor,
        character_set: String,
    },

    /// The vendor does not enforce CHECK constraints so the request was dropped
    CheckConstraintIgnored { name: String, vendor: Vendor },

    /// Conflicting explicit names were supplied; the first one is kept
    ConflictingName {
        kind: &'static str,
        kept: String,
        ignored: String,
    },

    /// A foreign key action was given twice with different values
    ActionRedefined {
        clause: &'static str,
        previous: String,
        current: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::OptionRedefined {
                column,
                option,
                previous,
                current,
            } => write!(
                f,
                "Redefining {} on column '{}' from '{}' to '{}'",
                option, column, previous, current
            ),
            Diagnostic::UnusedColumnOption { column, option } => {
                write!(f, "Option {} is not used by column '{}'", option, column)
            }
            Diagnostic::PrimaryKeyNullable { column } => write!(
                f,
                "Column '{}' is a primary key and cannot be nullable",
                column
            ),
            Diagnostic::RedundantWithPrimaryKey { column, option } => write!(
                f,
                "Option {} on column '{}' is redundant with PRIMARY KEY",
                option, column
            ),
            Diagnostic::CharacterSetOnNonCharacterType { column, column_type } => write!(
                f,
                "Character set on column '{}' is ignored because {} is not a character type",
                column, column_type
            ),
            Diagnostic::CharacterSetIgnored {
                column,
                vendor,
                character_set,
            } => write!(
                f,
                "{} ignores character set {} on column '{}'",
                vendor, character_set, column
            ),
            Diagnostic::CheckConstraintIgnored { name, vendor } => write!(
                f,
                "{} does not support CHECK constraints, dropping '{}'",
                vendor, name
            ),
            Diagnostic::ConflictingName { kind, kept, ignored } => write!(
                f,
                "Ignoring {} name '{}', keeping '{}'",
                kind, ignored, kept
            ),
            Diagnostic::ActionRedefined {
                clause,
                previous,
                current,
            } => write!(f, "Overriding {} from {} to {}", clause, previous, current),
        }
    }
}

/// Destination for diagnostics
pub trait DiagnosticSink: Send + Sync + fmt::Debug {
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards every diagnostic to `tracing` at warn level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::warn!("{}", diagnostic);
    }
}

/// Keeps diagnostics in memory so callers can inspect them
#[derive(Debug, Default)]
pub struct CollectingSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of everything reported so far
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Drain the collected diagnostics
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(
            &mut *self
                .diagnostics
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::debug!("Collected diagnostic: {}", diagnostic);
        self.diagnostics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingSink::new();
        sink.report(Diagnostic::PrimaryKeyNullable {
            column: "id".to_string(),
        });

        assert_eq!(sink.diagnostics().len(), 1);
        assert_eq!(sink.take().len(), 1);
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn test_display() {
        let diagnostic = Diagnostic::OptionRedefined {
            column: "name".to_string(),
            option: "Limit",
            previous: "10".to_string(),
            current: "20".to_string(),
        };
        assert_eq!(
            diagnostic.to_string(),
            "Redefining Limit on column 'name' from '10' to '20'"
        );
    }
}
