//! Identifier validation for table and column names spliced into statement text.
//!
//! The token table name is configurable and ends up inside every statement the
//! engine runs. Unlike data values it cannot be bound as a parameter, and the
//! statements use it unquoted so each backend applies its own case folding
//! (`IDN_OAUTH2_ACCESS_TOKEN` on Oracle and DB2, `idn_oauth2_access_token` on
//! PostgreSQL). Quoting is therefore not an option, and validation is strict:
//!
//! 1. Reject empty names, null bytes, and names longer than any backend allows
//! 2. Allow only ASCII letters, digits and underscores
//! 3. Allow at most one `.` separating a schema from the table

use crate::error::{MigrateError, Result};

/// Maximum identifier length (conservative limit across databases).
/// - PostgreSQL: 63 bytes
/// - SQL Server: 128 characters
/// - MySQL: 64 characters
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate a single unquoted identifier part.
///
/// # Errors
///
/// Returns `MigrateError::Config` for invalid identifiers with a descriptive message.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MigrateError::Config(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(MigrateError::Config(format!(
            "SECURITY: Identifier contains null byte (possible injection attempt): {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(MigrateError::Config(format!(
            "SECURITY: Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(MigrateError::Config(format!(
            "Identifier cannot start with a digit: {:?}",
            name
        )));
    }

    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
    {
        return Err(MigrateError::Config(format!(
            "SECURITY: Identifier contains unsupported character {:?}: {:?}",
            bad, name
        )));
    }

    Ok(())
}

/// Validate a table name, optionally qualified as `schema.table`.
pub fn validate_table_name(name: &str) -> Result<()> {
    let mut parts = name.split('.');
    let first = parts.next().unwrap_or_default();
    let second = parts.next();

    if parts.next().is_some() {
        return Err(MigrateError::Config(format!(
            "Table name may have at most one schema qualifier: {:?}",
            name
        )));
    }

    validate_identifier(first)?;
    if let Some(table) = second {
        validate_identifier(table)?;
    }

    Ok(())
}
