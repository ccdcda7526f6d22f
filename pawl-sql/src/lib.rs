//! Portable schema definitions and SQL dialect adapters
//!
//! A migration describes tables, columns and constraints in vendor-neutral
//! terms. This crate turns those descriptions into DDL for a specific
//! database through a [`DatabaseAdapter`]:
//!
//! - [`ColumnOption`]s are resolved into validated [`ColumnAttributes`]
//! - [`ColumnDefinition`] and [`TableDefinition`] render DDL fragments
//! - adapters decide quoting, type names, constraint phrasing, grants and
//!   the statement used to lock the version table
//!
//! Soft problems (redefined options, ignored character sets, unsupported
//! check constraints) are reported as [`Diagnostic`]s to a
//! [`DiagnosticSink`] rather than failing the migration.

pub mod adapter;
pub mod column;
pub mod constraint;
pub mod diagnostics;
pub mod error;
pub mod grant;
pub mod naming;
pub mod table;

// Re-export core types for convenience
pub use adapter::{create_adapter, DatabaseAdapter, Vendor};
pub use column::{
    CharacterSet, CharacterSetName, ColumnAttributes, ColumnCapabilities, ColumnCheck,
    ColumnDefinition, ColumnOption, ColumnType,
};
pub use constraint::{on, references, CheckOption, ForeignKeyAction, ForeignKeyOption, IndexOption, TableColumns};
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, TracingSink};
pub use error::{SqlError, SqlResult};
pub use grant::{GrantPrivilege, SchemaPrivilege};
pub use naming::UnquotedNameConverter;
pub use table::TableDefinition;
