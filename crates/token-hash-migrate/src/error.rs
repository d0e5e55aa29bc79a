//! Error types for the token hash migration library.

use thiserror::Error;

use crate::engine::WriteMode;

/// Exit code for configuration problems (bad YAML, missing fields).
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for database errors outside a batch write.
pub const EXIT_DATABASE_ERROR: u8 = 2;
/// Exit code for a failed hash column addition.
pub const EXIT_SCHEMA_ERROR: u8 = 3;
/// Exit code for a rolled-back batch write.
pub const EXIT_BATCH_ERROR: u8 = 4;
/// Exit code for records handed to a hash write without hashes.
pub const EXIT_MISSING_HASHES: u8 = 5;
/// Exit code for file and serialization errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for token migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query error, propagated unchanged.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Adding a hash column to the token table failed.
    #[error("Failed to add {column} column to the token table: {source}")]
    SchemaChange {
        column: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// A batch update failed and its transaction was rolled back.
    #[error("SQL error while {}: {source}", .mode.phase())]
    BatchWrite {
        mode: WriteMode,
        #[source]
        source: sqlx::Error,
    },

    /// A record reached a hash write without computed hashes.
    #[error("Token {token_id} has no computed hashes; nothing in the batch was written")]
    MissingHashes { token_id: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a SchemaChange error for the named column.
    pub fn schema_change(column: &'static str, source: sqlx::Error) -> Self {
        MigrateError::SchemaChange { column, source }
    }

    /// Create a BatchWrite error for the given write mode.
    pub fn batch_write(mode: WriteMode, source: sqlx::Error) -> Self {
        MigrateError::BatchWrite { mode, source }
    }

    /// Process exit code for this error class.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) => EXIT_CONFIG_ERROR,
            MigrateError::Database(_) => EXIT_DATABASE_ERROR,
            MigrateError::SchemaChange { .. } => EXIT_SCHEMA_ERROR,
            MigrateError::BatchWrite { .. } => EXIT_BATCH_ERROR,
            MigrateError::MissingHashes { .. } => EXIT_MISSING_HASHES,
            MigrateError::Io(_) | MigrateError::Json(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
