//! Portable column types and their definitions

mod definition;
mod option;

pub use definition::ColumnDefinition;
pub use option::{
    resolve_column_options, CharacterSet, CharacterSetName, ColumnAttributes, ColumnCheck,
    ColumnOption,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Vendor-neutral column types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Bigint,
    Blob,
    Boolean,
    Char,
    Decimal,
    Integer,
    Smallint,
    Timestamp,
    Varbinary,
    Varchar,
}

impl ColumnType {
    /// Whether values are character data
    pub fn is_character(&self) -> bool {
        matches!(self, ColumnType::Char | ColumnType::Varchar)
    }

    /// Whether the type is an integral number
    pub fn is_integral(&self) -> bool {
        matches!(self, ColumnType::Bigint | ColumnType::Integer | ColumnType::Smallint)
    }

    /// The options every vendor accepts for this type.
    ///
    /// Adapters widen these where the vendor accepts more, for example a
    /// TIMESTAMP precision or auto-increment on integral columns.
    pub fn base_capabilities(&self) -> ColumnCapabilities {
        let capabilities = ColumnCapabilities::default();
        match self {
            ColumnType::Bigint | ColumnType::Integer | ColumnType::Smallint => {
                capabilities.with_default()
            }
            ColumnType::Blob => capabilities,
            ColumnType::Boolean | ColumnType::Timestamp => capabilities.with_default(),
            ColumnType::Char | ColumnType::Varchar => capabilities
                .with_default()
                .with_limit()
                .with_character_set(),
            ColumnType::Decimal => capabilities.with_default().with_precision().with_scale(),
            ColumnType::Varbinary => capabilities.with_default().with_limit(),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Bigint => "bigint",
            ColumnType::Blob => "blob",
            ColumnType::Boolean => "boolean",
            ColumnType::Char => "char",
            ColumnType::Decimal => "decimal",
            ColumnType::Integer => "integer",
            ColumnType::Smallint => "smallint",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Varbinary => "varbinary",
            ColumnType::Varchar => "varchar",
        };
        write!(f, "{}", name)
    }
}

/// Which value options a concrete column type consumes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnCapabilities {
    pub default: bool,
    pub limit: bool,
    pub precision: bool,
    pub scale: bool,
    pub auto_increment: bool,
    pub character_set: bool,
}

impl ColumnCapabilities {
    pub fn with_default(mut self) -> Self {
        self.default = true;
        self
    }

    pub fn with_limit(mut self) -> Self {
        self.limit = true;
        self
    }

    pub fn with_precision(mut self) -> Self {
        self.precision = true;
        self
    }

    pub fn with_scale(mut self) -> Self {
        self.scale = true;
        self
    }

    pub fn with_auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn with_character_set(mut self) -> Self {
        self.character_set = true;
        self
    }
}

/// `BASE(limit)` or just `BASE`
pub(crate) fn sized(base: &str, limit: Option<u32>) -> String {
    match limit {
        Some(limit) => format!("{}({})", base, limit),
        None => base.to_string(),
    }
}

/// `BASE(precision, scale)`, `BASE(precision)` or `BASE`
pub(crate) fn numeric(base: &str, precision: Option<u32>, scale: Option<u32>) -> String {
    match (precision, scale) {
        (Some(precision), Some(scale)) => format!("{}({}, {})", base, precision, scale),
        (Some(precision), None) => format!("{}({})", base, precision),
        _ => base.to_string(),
    }
}
