//! Column options and their resolution into validated attributes

use std::fmt;

use super::ColumnCapabilities;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{SqlError, SqlResult};

/// Name of a character set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CharacterSetName {
    /// Whatever the vendor uses for Unicode text
    Unicode,
    /// A vendor-specific character set name
    Named(String),
}

/// Character set, optionally with a collation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharacterSet {
    pub name: CharacterSetName,
    pub collation: Option<String>,
}

impl CharacterSet {
    pub fn unicode() -> Self {
        Self {
            name: CharacterSetName::Unicode,
            collation: None,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: CharacterSetName::Named(name.into()),
            collation: None,
        }
    }

    pub fn with_collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    pub fn is_unicode(&self) -> bool {
        self.name == CharacterSetName::Unicode
    }
}

impl fmt::Display for CharacterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            CharacterSetName::Unicode => write!(f, "Unicode")?,
            CharacterSetName::Named(name) => write!(f, "{}", name)?,
        }
        if let Some(collation) = &self.collation {
            write!(f, " COLLATE {}", collation)?;
        }
        Ok(())
    }
}

/// A modifier attached to a column definition.
///
/// Value options (default, limit, precision, scale, nullability, character
/// set) keep the last occurrence. Flags are idempotent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnOption {
    /// Literal SQL default expression
    Default(String),
    /// Length limit; build with [`ColumnOption::limit`]
    Limit(i64),
    NotNull,
    Nullable,
    PrimaryKey,
    Unique,
    Precision(u32),
    Scale(u32),
    AutoIncrement,
    CharacterSet(CharacterSet),
    /// Column-level CHECK with a derived name
    Check(String),
    /// Column-level CHECK with an explicit name
    NamedCheck { name: String, expression: String },
}

impl ColumnOption {
    /// A length limit, rejecting negative values
    pub fn limit(length: i64) -> SqlResult<Self> {
        if length < 0 {
            return Err(SqlError::Construction(format!(
                "Limit must be non-negative, got {}",
                length
            )));
        }
        Ok(ColumnOption::Limit(length))
    }

    pub fn default_value(expression: impl Into<String>) -> Self {
        ColumnOption::Default(expression.into())
    }

    pub fn check(expression: impl Into<String>) -> Self {
        ColumnOption::Check(expression.into())
    }

    pub fn named_check(name: impl Into<String>, expression: impl Into<String>) -> Self {
        ColumnOption::NamedCheck {
            name: name.into(),
            expression: expression.into(),
        }
    }

    pub fn character_set(character_set: CharacterSet) -> Self {
        ColumnOption::CharacterSet(character_set)
    }
}

impl fmt::Display for ColumnOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnOption::Default(value) => write!(f, "Default({})", value),
            ColumnOption::Limit(limit) => write!(f, "Limit({})", limit),
            ColumnOption::NotNull => write!(f, "NotNull"),
            ColumnOption::Nullable => write!(f, "Nullable"),
            ColumnOption::PrimaryKey => write!(f, "PrimaryKey"),
            ColumnOption::Unique => write!(f, "Unique"),
            ColumnOption::Precision(precision) => write!(f, "Precision({})", precision),
            ColumnOption::Scale(scale) => write!(f, "Scale({})", scale),
            ColumnOption::AutoIncrement => write!(f, "AutoIncrement"),
            ColumnOption::CharacterSet(character_set) => {
                write!(f, "CharacterSet({})", character_set)
            }
            ColumnOption::Check(expression) => write!(f, "Check({})", expression),
            ColumnOption::NamedCheck { name, expression } => {
                write!(f, "NamedCheck({}, {})", name, expression)
            }
        }
    }
}

/// A column-level CHECK before its name has been derived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnCheck {
    pub name: Option<String>,
    pub expression: String,
}

/// Validated result of resolving a column's options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnAttributes {
    pub default: Option<String>,
    pub limit: Option<u32>,
    /// `Some(true)` for NOT NULL, `Some(false)` for an explicit NULL
    pub not_null: Option<bool>,
    pub primary_key: bool,
    pub unique: bool,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub auto_increment: bool,
    pub character_set: Option<CharacterSet>,
    pub checks: Vec<ColumnCheck>,
}

fn keep_last<T>(
    slot: &mut Option<T>,
    value: T,
    column: &str,
    option: &'static str,
    sink: &dyn DiagnosticSink,
) where
    T: PartialEq + fmt::Display,
{
    if let Some(previous) = slot.as_ref() {
        if *previous != value {
            sink.report(Diagnostic::OptionRedefined {
                column: column.to_string(),
                option,
                previous: previous.to_string(),
                current: value.to_string(),
            });
        }
    }
    *slot = Some(value);
}

/// Resolve `options` against what the column type accepts.
///
/// Returns the attributes plus every option the type did not consume, in
/// the order given. Negative limits, precision below one, a scale without
/// a precision, a scale above the precision and auto-increment on a type
/// that cannot honor it are hard errors.
pub fn resolve_column_options(
    column: &str,
    options: Vec<ColumnOption>,
    capabilities: ColumnCapabilities,
    sink: &dyn DiagnosticSink,
) -> SqlResult<(ColumnAttributes, Vec<ColumnOption>)> {
    let mut attributes = ColumnAttributes::default();
    let mut residual = Vec::new();

    for option in options {
        match option {
            ColumnOption::Default(value) if capabilities.default => {
                keep_last(&mut attributes.default, value, column, "Default", sink);
            }
            ColumnOption::Limit(limit) if limit < 0 => {
                return Err(SqlError::Construction(format!(
                    "Limit on column '{}' must be non-negative, got {}",
                    column, limit
                )));
            }
            ColumnOption::Limit(limit) if capabilities.limit => {
                let limit = u32::try_from(limit).map_err(|_| {
                    SqlError::Construction(format!(
                        "Limit on column '{}' must be between 0 and {}, got {}",
                        column,
                        u32::MAX,
                        limit
                    ))
                })?;
                keep_last(&mut attributes.limit, limit, column, "Limit", sink);
            }
            ColumnOption::Precision(precision) if capabilities.precision => {
                if precision < 1 {
                    return Err(SqlError::Construction(format!(
                        "Precision on column '{}' must be at least 1",
                        column
                    )));
                }
                keep_last(&mut attributes.precision, precision, column, "Precision", sink);
            }
            ColumnOption::Scale(scale) if capabilities.scale => {
                keep_last(&mut attributes.scale, scale, column, "Scale", sink);
            }
            ColumnOption::CharacterSet(character_set) if capabilities.character_set => {
                keep_last(
                    &mut attributes.character_set,
                    character_set,
                    column,
                    "CharacterSet",
                    sink,
                );
            }
            ColumnOption::NotNull => {
                keep_last(&mut attributes.not_null, true, column, "nullability", sink);
            }
            ColumnOption::Nullable => {
                keep_last(&mut attributes.not_null, false, column, "nullability", sink);
            }
            ColumnOption::PrimaryKey => attributes.primary_key = true,
            ColumnOption::Unique => attributes.unique = true,
            ColumnOption::AutoIncrement => {
                if !capabilities.auto_increment {
                    return Err(SqlError::Construction(format!(
                        "AutoIncrement is not supported on column '{}'",
                        column
                    )));
                }
                attributes.auto_increment = true;
            }
            ColumnOption::Check(expression) => attributes.checks.push(ColumnCheck {
                name: None,
                expression,
            }),
            ColumnOption::NamedCheck { name, expression } => {
                attributes.checks.push(ColumnCheck {
                    name: Some(name),
                    expression,
                })
            }
            other => residual.push(other),
        }
    }

    match (attributes.precision, attributes.scale) {
        (None, Some(_)) => {
            return Err(SqlError::Construction(format!(
                "Scale on column '{}' requires a Precision",
                column
            )));
        }
        (Some(precision), Some(scale)) if scale > precision => {
            return Err(SqlError::Construction(format!(
                "Scale {} on column '{}' exceeds precision {}",
                scale, column, precision
            )));
        }
        _ => {}
    }

    if attributes.primary_key {
        match attributes.not_null {
            Some(false) => sink.report(Diagnostic::PrimaryKeyNullable {
                column: column.to_string(),
            }),
            Some(true) => sink.report(Diagnostic::RedundantWithPrimaryKey {
                column: column.to_string(),
                option: "NotNull",
            }),
            None => {}
        }
        if attributes.unique {
            sink.report(Diagnostic::RedundantWithPrimaryKey {
                column: column.to_string(),
                option: "Unique",
            });
        }
    }

    Ok((attributes, residual))
}
