//! Identifier checks
//!
//! Schema, procedure and parameter names are spliced into command text, so
//! they must be plain SQL identifiers before anything is rendered.

use thiserror::Error;

/// PostgreSQL truncates identifiers past this many bytes
const MAX_LENGTH: usize = 63;

/// Fully reserved PostgreSQL keywords; the non-reserved ones (`key`, `name`,
/// `class`, ...) work as parameter names in named notation.
const RESERVED: &[&str] = &[
    "ALL", "ANALYSE", "ANALYZE", "AND", "ANY", "ARRAY", "AS", "ASC", "ASYMMETRIC", "BOTH",
    "CASE", "CAST", "CHECK", "COLLATE", "COLUMN", "CONSTRAINT", "CREATE", "CURRENT_DATE",
    "CURRENT_ROLE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "CURRENT_USER", "DEFAULT",
    "DEFERRABLE", "DESC", "DISTINCT", "DO", "ELSE", "END", "EXCEPT", "FALSE", "FETCH", "FOR",
    "FOREIGN", "FROM", "GRANT", "GROUP", "HAVING", "IN", "INITIALLY", "INTERSECT", "INTO",
    "LATERAL", "LEADING", "LIMIT", "LOCALTIME", "LOCALTIMESTAMP", "NOT", "NULL", "OFFSET",
    "ON", "ONLY", "OR", "ORDER", "PLACING", "PRIMARY", "REFERENCES", "RETURNING", "SELECT",
    "SESSION_USER", "SOME", "SYMMETRIC", "TABLE", "THEN", "TO", "TRAILING", "TRUE", "UNION",
    "UNIQUE", "USER", "USING", "VARIADIC", "WHEN", "WHERE", "WINDOW", "WITH",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("identifier is empty")]
    Empty,
    #[error("identifier '{0}' is longer than 63 bytes")]
    TooLong(String),
    #[error("identifier '{0}' must be a letter or underscore followed by letters, digits or underscores")]
    Malformed(String),
    #[error("'{0}' is a reserved keyword")]
    Reserved(String),
    #[error("'{0}' is not of the form name or schema.name")]
    Qualified(String),
}

/// Check that `name` is a plain, unquoted SQL identifier
pub fn validate_identifier(name: &str) -> Result<(), IdentifierError> {
    let mut chars = name.chars();
    let first = chars.next().ok_or(IdentifierError::Empty)?;
    if name.len() > MAX_LENGTH {
        return Err(IdentifierError::TooLong(name.to_string()));
    }
    if !(first.is_ascii_alphabetic() || first == '_') || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(IdentifierError::Malformed(name.to_string()));
    }
    Ok(())
}

/// Check a procedure name, optionally qualified by one schema
pub fn validate_qualified_name(name: &str) -> Result<(), IdentifierError> {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 {
        return Err(IdentifierError::Qualified(name.to_string()));
    }
    parts.into_iter().try_for_each(validate_identifier)
}

/// Check a parameter name for named call notation
pub fn validate_parameter_name(name: &str) -> Result<(), IdentifierError> {
    validate_identifier(name)?;
    if RESERVED.contains(&name.to_ascii_uppercase().as_str()) {
        return Err(IdentifierError::Reserved(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers() {
        assert!(validate_identifier("warehouse").is_ok());
        assert!(validate_identifier("_private").is_ok());
        assert!(validate_identifier(&"a".repeat(63)).is_ok());

        assert_eq!(validate_identifier(""), Err(IdentifierError::Empty));
        assert!(matches!(validate_identifier(&"a".repeat(64)), Err(IdentifierError::TooLong(_))));
        assert!(matches!(validate_identifier("1stock"), Err(IdentifierError::Malformed(_))));
        assert!(matches!(validate_identifier("stock; DROP TABLE x"), Err(IdentifierError::Malformed(_))));
    }

    #[test]
    fn test_qualified_names() {
        assert!(validate_qualified_name("find_entity_type_by_alias").is_ok());
        assert!(validate_qualified_name("warehouse.find_entity_type_by_alias").is_ok());

        assert_eq!(validate_qualified_name("warehouse."), Err(IdentifierError::Empty));
        assert!(matches!(validate_qualified_name("a.b.c"), Err(IdentifierError::Qualified(_))));
        assert!(matches!(
            validate_qualified_name("warehouse.proc(); DROP TABLE x"),
            Err(IdentifierError::Malformed(_))
        ));
    }

    #[test]
    fn test_parameter_names() {
        assert!(validate_parameter_name("key").is_ok());
        assert!(validate_parameter_name("class").is_ok());

        assert_eq!(
            validate_parameter_name("select"),
            Err(IdentifierError::Reserved("select".to_string()))
        );
        assert!(validate_parameter_name("entity-id").is_err());
    }
}
