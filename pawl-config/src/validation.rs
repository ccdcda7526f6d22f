//! Configuration validation traits and utilities

use crate::error::{ConfigError, ConfigResult};

/// Trait for validatable configuration
pub trait Validatable {
    /// Validate the configuration
    fn validate(&self) -> ConfigResult<()>;

    /// Get the domain name for error reporting
    fn domain_name(&self) -> &'static str;

    /// Helper to create a domain-specific validation error
    fn validation_error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::DomainError {
            domain: self.domain_name().to_string(),
            message: message.into(),
        }
    }
}

/// Validate a required string field
pub fn validate_required_string(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot be empty", field_name),
        });
    }
    Ok(())
}

/// Validate a positive number
pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value <= T::default() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be greater than 0, got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate a plain SQL identifier: letters, digits and underscores, not
/// starting with a digit
pub fn validate_identifier(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    validate_required_string(value, field_name, domain)?;
    let valid = value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !value.starts_with(|c: char| c.is_ascii_digit());
    if !valid {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} '{}' is not a valid identifier", field_name, value),
        });
    }
    Ok(())
}

/// Validate a database URL.
///
/// The URL must parse and carry something after its scheme. Hierarchical
/// URLs (`scheme://...`) need a host, except for SQLite where the part
/// after `//` is a file path. Opaque forms such as `sqlite::memory:` or
/// `jdbc:oracle:thin:@host:1521:xe` are accepted as they are.
pub fn validate_database_url(url: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    validate_required_string(url, field_name, domain)?;
    let parsed = url::Url::parse(url)?;

    let domain_error = |problem: &str| ConfigError::DomainError {
        domain: domain.to_string(),
        message: format!("{} '{}' {}", field_name, url, problem),
    };
    let after_scheme = parsed.as_str()[parsed.scheme().len() + 1..].trim();
    if after_scheme.is_empty() || after_scheme == "//" {
        return Err(domain_error("has nothing after the scheme"));
    }
    if !parsed.cannot_be_a_base()
        && parsed.scheme() != "sqlite"
        && parsed.host_str().map_or(true, str::is_empty)
    {
        return Err(domain_error("has no host"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required_string() {
        assert!(validate_required_string("value", "field", "test").is_ok());
        assert!(validate_required_string("", "field", "test").is_err());
        assert!(validate_required_string("   ", "field", "test").is_err());
    }

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive(1u64, "field", "test").is_ok());
        assert!(validate_positive(0u64, "field", "test").is_err());
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("schema_migrations", "table", "test").is_ok());
        assert!(validate_identifier("1st", "table", "test").is_err());
        assert!(validate_identifier("drop table;", "table", "test").is_err());
    }

    #[test]
    fn test_validate_database_url() {
        assert!(validate_database_url("sqlite::memory:", "url", "test").is_ok());
        assert!(validate_database_url("postgres://localhost/app", "url", "test").is_ok());
        assert!(validate_database_url("sqlite:///tmp/app.db?mode=rwc", "url", "test").is_ok());
        assert!(validate_database_url("jdbc:h2:mem:test", "url", "test").is_ok());
    }

    #[test]
    fn test_invalid_database_urls() {
        assert!(matches!(
            validate_database_url("app.db", "url", "test"),
            Err(ConfigError::UrlError(_))
        ));
        assert!(matches!(
            validate_database_url("sqlite:", "url", "test"),
            Err(ConfigError::DomainError { .. })
        ));
        let error = validate_database_url("postgres:///app", "url", "test").unwrap_err();
        assert!(error.to_string().contains("has no host"));
    }
}
