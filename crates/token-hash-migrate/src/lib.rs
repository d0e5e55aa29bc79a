//! # token-hash-migrate
//!
//! Hash column backfill for OAuth2 access token tables.
//!
//! This library prepares a token table for hashed lookups and rewrites its
//! rows in place, with support for:
//!
//! - **Dialect resolution** from connection metadata (MySQL/H2, DB2, MSSQL,
//!   PostgreSQL, Informix, SQLite, Oracle-compatible default)
//! - **Schema probing** that reports missing hash columns as a normal outcome
//! - **Paged reads** with the per-dialect limit/offset binding order
//! - **All-or-nothing batch writes** in encrypted and plain-text-hash modes
//!
//! ## Example
//!
//! ```rust,no_run
//! use token_hash_migrate::engine::{connect, connection_metadata};
//! use token_hash_migrate::{Config, Sha256TokenHasher, TokenBackfill, WriteMode};
//!
//! #[tokio::main]
//! async fn main() -> token_hash_migrate::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let mut conn = connect(&config.database).await?;
//!     let metadata = connection_metadata(&conn, &config.database);
//!
//!     let backfill = TokenBackfill::new(&config, WriteMode::PlainTextHash, Sha256TokenHasher)?;
//!     let result = backfill.run(&mut conn, &metadata, false).await?;
//!     println!("Hashed {} tokens", result.tokens_updated);
//!     Ok(())
//! }
//! ```

pub mod backfill;
pub mod config;
pub mod core;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod transform;

// Re-exports for convenient access
pub use backfill::{BackfillResult, ProbeReport, TokenBackfill};
pub use config::{BackfillConfig, Config, DatabaseConfig, TableConfig};
pub use core::{TokenHashes, TokenRecord, TokenTransform};
pub use dialect::{resolve_dialect, Backend, ConnectionMetadata, DialectProfile, PageBinding};
pub use engine::{ProbeOutcome, TokenHashEngine, WriteMode};
pub use error::{MigrateError, Result};
pub use transform::Sha256TokenHasher;
