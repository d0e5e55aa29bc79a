//! Configuration validation.

use super::Config;
use crate::core::identifier::validate_table_name;
use crate::error::{MigrateError, Result};

/// URL schemes sqlx's `Any` driver can open.
const SUPPORTED_SCHEMES: &[&str] = &["mysql", "mariadb", "postgres", "postgresql", "sqlite"];

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Database validation
    if config.database.url.trim().is_empty() {
        return Err(MigrateError::Config("database.url is required".into()));
    }
    match config.database.scheme() {
        Some(scheme) if SUPPORTED_SCHEMES.contains(&scheme.as_str()) => {}
        _ => {
            return Err(MigrateError::Config(format!(
                "database.url must start with one of {}, got '{}'",
                SUPPORTED_SCHEMES.join(", "),
                config.database.redacted_url()
            )));
        }
    }

    // Table validation
    validate_table_name(&config.table.name)
        .map_err(|e| MigrateError::Config(format!("table.name: {}", e)))?;
    validate_column_type(&config.table.hash_column_type)?;

    // Backfill validation
    if config.backfill.page_size == 0 {
        return Err(MigrateError::Config(
            "backfill.page_size must be at least 1".into(),
        ));
    }

    Ok(())
}

/// A column type is spliced into DDL, so only type-name characters pass.
fn validate_column_type(column_type: &str) -> Result<()> {
    let valid = !column_type.trim().is_empty()
        && column_type
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '(' | ')' | ','));

    if !valid {
        return Err(MigrateError::Config(format!(
            "table.hash_column_type '{}' is not a plain SQL type",
            column_type
        )));
    }
    Ok(())
}
