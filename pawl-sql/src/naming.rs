//! Identifier case folding and derived constraint names

use serde::{Deserialize, Serialize};

/// How a vendor folds identifiers that are not quoted.
///
/// Every identifier this crate emits is quoted, so names are folded first
/// to keep quoted and unquoted references to the same object equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnquotedNameConverter {
    /// Names are used exactly as written
    Preserve,
    Lowercase,
    Uppercase,
}

impl UnquotedNameConverter {
    pub fn apply(&self, name: &str) -> String {
        match self {
            UnquotedNameConverter::Preserve => name.to_string(),
            UnquotedNameConverter::Lowercase => name.to_lowercase(),
            UnquotedNameConverter::Uppercase => name.to_uppercase(),
        }
    }
}

/// `idx_<table>_<col1>_<col2>`
pub fn index_name(table: &str, columns: &[&str]) -> String {
    format!("idx_{}_{}", table, columns.join("_"))
}

/// `fk_<on_table>_<on_cols>_<ref_table>_<ref_cols>`
pub fn foreign_key_name(
    on_table: &str,
    on_columns: &[&str],
    references_table: &str,
    references_columns: &[&str],
) -> String {
    format!(
        "fk_{}_{}_{}_{}",
        on_table,
        on_columns.join("_"),
        references_table,
        references_columns.join("_")
    )
}

/// `chk_<table>_<col1>_<col2>`
pub fn check_name(table: &str, columns: &[&str]) -> String {
    format!("chk_{}_{}", table, columns.join("_"))
}

/// `unique_<table>`
pub fn unique_index_name(table: &str) -> String {
    format!("unique_{}", table)
}
