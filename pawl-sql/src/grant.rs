//! Table and schema privileges

use std::fmt;

/// A privilege on a table. Column lists scope the privilege to those
/// columns; an empty list means the whole table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantPrivilege {
    All,
    Alter,
    Delete,
    Index,
    Insert(Vec<String>),
    References(Vec<String>),
    Select(Vec<String>),
    Trigger,
    Update(Vec<String>),
}

impl GrantPrivilege {
    pub fn select() -> Self {
        GrantPrivilege::Select(Vec::new())
    }

    pub fn insert() -> Self {
        GrantPrivilege::Insert(Vec::new())
    }

    pub fn update() -> Self {
        GrantPrivilege::Update(Vec::new())
    }

    pub fn references() -> Self {
        GrantPrivilege::References(Vec::new())
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            GrantPrivilege::All => "ALL PRIVILEGES",
            GrantPrivilege::Alter => "ALTER",
            GrantPrivilege::Delete => "DELETE",
            GrantPrivilege::Index => "INDEX",
            GrantPrivilege::Insert(_) => "INSERT",
            GrantPrivilege::References(_) => "REFERENCES",
            GrantPrivilege::Select(_) => "SELECT",
            GrantPrivilege::Trigger => "TRIGGER",
            GrantPrivilege::Update(_) => "UPDATE",
        }
    }

    /// Columns the privilege is limited to, empty for table-wide
    pub fn columns(&self) -> &[String] {
        match self {
            GrantPrivilege::Insert(columns)
            | GrantPrivilege::References(columns)
            | GrantPrivilege::Select(columns)
            | GrantPrivilege::Update(columns) => columns,
            _ => &[],
        }
    }
}

impl fmt::Display for GrantPrivilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())?;
        if !self.columns().is_empty() {
            write!(f, " ({})", self.columns().join(", "))?;
        }
        Ok(())
    }
}

/// A privilege on a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaPrivilege {
    All,
    Usage,
    Create,
}

impl SchemaPrivilege {
    pub fn keyword(&self) -> &'static str {
        match self {
            SchemaPrivilege::All => "ALL PRIVILEGES",
            SchemaPrivilege::Usage => "USAGE",
            SchemaPrivilege::Create => "CREATE",
        }
    }
}

impl fmt::Display for SchemaPrivilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_columns() {
        let select = GrantPrivilege::Select(vec!["id".to_string(), "name".to_string()]);
        assert_eq!(select.columns().len(), 2);
        assert_eq!(select.to_string(), "SELECT (id, name)");
        assert!(GrantPrivilege::select().columns().is_empty());
        assert!(GrantPrivilege::All.columns().is_empty());
        assert_eq!(GrantPrivilege::All.to_string(), "ALL PRIVILEGES");
    }
}
