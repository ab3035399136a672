//! Save-time validation for entity and attribute edits
//!
//! All checks run before a mutation is accepted; the compiler trusts its
//! inputs and performs no validation of its own. Every function here is
//! pure and returns a descriptive, user-displayable error.

use std::collections::HashSet;
use std::sync::LazyLock;

use crate::core::model::{Attribute, Entity};

/// SQL reserved keywords that cannot be used as table or column names.
/// Combined list covering the SQL standard plus common MySQL/PostgreSQL
/// extensions.
static RESERVED_KEYWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "SELECT", "FROM", "WHERE", "INSERT", "UPDATE", "DELETE", "JOIN", "INNER", "LEFT", "RIGHT",
        "FULL", "OUTER", "GROUP", "BY", "ORDER", "ASC", "DESC", "HAVING", "LIMIT", "OFFSET",
        "DISTINCT", "AND", "OR", "NOT", "IS", "NULL", "TRUE", "FALSE", "BETWEEN", "IN", "EXISTS",
        "ANY", "ALL", "LIKE", "SIMILAR", "ILIKE", "EXCEPT", "INTERSECT", "UNION", "VALUES",
        "CASE", "WHEN", "THEN", "ELSE", "END", "CAST", "AS", "CONVERT", "ALTER", "CREATE", "DROP",
        "TRUNCATE", "TABLE", "COLUMN", "INDEX", "VIEW", "SEQUENCE", "DATABASE", "USER", "ROLE",
        "GRANT", "REVOKE", "TRANSACTION", "COMMIT", "ROLLBACK", "SAVEPOINT", "LOCK", "UNLOCK",
        "WITH", "REPLACE", "PROCEDURE", "FUNCTION", "TRIGGER", "PRIMARY", "FOREIGN", "KEY",
        "CHECK", "REFERENCES", "DEFAULT", "UNIQUE", "AUTO_INCREMENT", "SERIAL", "BIGINT",
        "VARCHAR", "TEXT", "BOOLEAN", "DATE", "TIMESTAMP", "DECIMAL",
    ]
    .into_iter()
    .collect()
});

/// Reasons an entity or attribute edit is rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Name cannot be empty")]
    Empty,
    #[error("'{keyword}' is a reserved SQL keyword")]
    ReservedKeyword { keyword: String },
    #[error("Name must start with a letter or underscore and contain only letters, digits, or underscores")]
    InvalidIdentifier,
    #[error("An entity named '{name}' already exists")]
    DuplicateEntityName { name: String },
    #[error("Attribute name '{name}' must be unique within the entity")]
    DuplicateAttributeName { name: String },
    #[error("Entity must define a primary key")]
    MissingPrimaryKey,
    #[error("Entity must have exactly one primary key")]
    MultiplePrimaryKeys,
    #[error("Length must be a positive number for {type_name}")]
    MissingLength { type_name: String },
    #[error("Precision must be a positive number for {type_name}")]
    MissingPrecision { type_name: String },
    #[error("{type_name} does not take a length")]
    UnexpectedLength { type_name: String },
    #[error("{type_name} does not take a precision or scale")]
    UnexpectedPrecision { type_name: String },
    #[error("Scale cannot exceed precision")]
    ScaleExceedsPrecision,
}

/// Whether `name` matches `^[A-Za-z_][A-Za-z0-9_]*$`.
fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Check whether a string is a reserved keyword, case-insensitively.
pub fn is_reserved_keyword(name: &str) -> bool {
    RESERVED_KEYWORDS.contains(name.trim().to_uppercase().as_str())
}

/// Shared keyword and pattern checks applied to any identifier.
fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    if is_reserved_keyword(trimmed) {
        return Err(ValidationError::ReservedKeyword {
            keyword: trimmed.to_string(),
        });
    }
    if !is_valid_identifier(trimmed) {
        return Err(ValidationError::InvalidIdentifier);
    }
    Ok(())
}

/// Validate a table name against the identifier rules and against every
/// other entity's name, case-insensitively. The entity currently being
/// edited (`editing_id`) is excluded from the collision check so that
/// re-saving under the same name succeeds.
pub fn validate_entity_name(
    name: &str,
    existing: &[Entity],
    editing_id: Option<&str>,
) -> Result<(), ValidationError> {
    validate_identifier(name)?;

    let trimmed = name.trim();
    let collision = existing
        .iter()
        .any(|e| e.name.eq_ignore_ascii_case(trimmed) && editing_id != Some(e.id.as_str()));
    if collision {
        return Err(ValidationError::DuplicateEntityName {
            name: trimmed.to_string(),
        });
    }
    Ok(())
}

/// Validate a column name; uniqueness is scoped to the attributes already
/// present on the one owning entity, never globally.
pub fn validate_attribute_name(
    name: &str,
    attributes: &[Attribute],
) -> Result<(), ValidationError> {
    validate_identifier(name)?;

    let trimmed = name.trim();
    if attributes.iter().any(|a| a.name.eq_ignore_ascii_case(trimmed)) {
        return Err(ValidationError::DuplicateAttributeName {
            name: trimmed.to_string(),
        });
    }
    Ok(())
}

/// Enforce the length/precision invariants on a single attribute:
/// `length` is set iff the type is length-bearing, `precision`/`scale` iff
/// precision-bearing, and the figures are positive.
pub fn validate_attribute(attribute: &Attribute) -> Result<(), ValidationError> {
    let type_name = attribute.data_type.to_string();

    if attribute.data_type.supports_length() {
        match attribute.length {
            Some(l) if l > 0 => {}
            _ => return Err(ValidationError::MissingLength { type_name }),
        }
        if attribute.precision.is_some() || attribute.scale.is_some() {
            return Err(ValidationError::UnexpectedPrecision { type_name });
        }
    } else if attribute.data_type.supports_precision() {
        let precision = match attribute.precision {
            Some(p) if p > 0 => p,
            _ => return Err(ValidationError::MissingPrecision { type_name }),
        };
        if attribute.scale.is_some_and(|s| s > precision) {
            return Err(ValidationError::ScaleExceedsPrecision);
        }
        if attribute.length.is_some() {
            return Err(ValidationError::UnexpectedLength { type_name });
        }
    } else {
        if attribute.length.is_some() {
            return Err(ValidationError::UnexpectedLength { type_name });
        }
        if attribute.precision.is_some() || attribute.scale.is_some() {
            return Err(ValidationError::UnexpectedPrecision { type_name });
        }
    }
    Ok(())
}

/// Full save-time check for an entity draft: name rules, every attribute's
/// name and figures, and the exactly-one-primary-key invariant.
pub fn validate_entity(
    name: &str,
    attributes: &[Attribute],
    existing: &[Entity],
    editing_id: Option<&str>,
) -> Result<(), ValidationError> {
    validate_entity_name(name, existing, editing_id)?;

    for (index, attribute) in attributes.iter().enumerate() {
        validate_attribute_name(&attribute.name, &attributes[..index])?;
        validate_attribute(attribute)?;
    }

    let primary_keys = attributes.iter().filter(|a| a.is_primary_key).count();
    match primary_keys {
        0 => Err(ValidationError::MissingPrimaryKey),
        1 => Ok(()),
        _ => Err(ValidationError::MultiplePrimaryKeys),
    }
}
