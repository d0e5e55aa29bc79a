//! All-or-nothing batch updates.
//!
//! A batch moves through `not started -> transaction open -> queued ->
//! committed`, or ends rolled back. The transaction is a scoped
//! [`sqlx::Transaction`]: auto-commit is off while it lives, and it rolls
//! back on drop, so every exit path (including a panic or a dropped future)
//! leaves the connection back in auto-commit mode with nothing from the
//! batch applied.

use serde::{Deserialize, Serialize};
use sqlx::any::{Any, AnyArguments};
use sqlx::query::Query;
use sqlx::{AnyConnection, Connection};
use std::fmt;
use tracing::{debug, warn};

use super::TokenHashEngine;
use crate::core::TokenRecord;
use crate::error::{MigrateError, Result};

/// Which update statement a batch uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Rewrite both token values and both hashes.
    Encrypted,
    /// Write only the two hashes.
    PlainTextHash,
}

impl WriteMode {
    /// Human-readable phase, used in error messages.
    pub fn phase(self) -> &'static str {
        match self {
            WriteMode::Encrypted => "updating new encrypted tokens",
            WriteMode::PlainTextHash => "updating plain text token hashes",
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Encrypted => f.write_str("encrypted"),
            WriteMode::PlainTextHash => f.write_str("plain-text-hash"),
        }
    }
}

impl TokenHashEngine {
    /// Write token values and hashes for every record in one transaction.
    ///
    /// Binds `(access_token, refresh_token, access_token_hash,
    /// refresh_token_hash, token_id)`. `None` tokens are written as `NULL`, and
    /// records without hashes write `NULL` to both hash columns.
    pub async fn write_encrypted_tokens(
        &self,
        conn: &mut AnyConnection,
        records: &[TokenRecord],
    ) -> Result<()> {
        self.write_batch(conn, WriteMode::Encrypted, records).await
    }

    /// Write hashes for every record in one transaction.
    ///
    /// Binds `(access_token_hash, refresh_token_hash, token_id)`. Every record
    /// must carry hashes; otherwise nothing is written.
    pub async fn write_plain_text_hashes(
        &self,
        conn: &mut AnyConnection,
        records: &[TokenRecord],
    ) -> Result<()> {
        self.write_batch(conn, WriteMode::PlainTextHash, records).await
    }

    /// Queue one update per record and apply them as a single transaction.
    pub async fn write_batch(
        &self,
        conn: &mut AnyConnection,
        mode: WriteMode,
        records: &[TokenRecord],
    ) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        if mode == WriteMode::PlainTextHash {
            if let Some(unhashed) = records.iter().find(|r| r.hashes().is_none()) {
                return Err(MigrateError::MissingHashes {
                    token_id: unhashed.token_id().to_string(),
                });
            }
        }

        let sql = self.sql(conn, self.update_statement(mode));
        let queued: Vec<_> = records
            .iter()
            .map(|record| bind_update(mode, &sql, record))
            .collect();

        let mut tx = conn
            .begin()
            .await
            .map_err(|e| MigrateError::batch_write(mode, e))?;
        debug!("Queued {} {} updates", queued.len(), mode);

        for (query, record) in queued.into_iter().zip(records) {
            if let Err(e) = query.execute(&mut *tx).await {
                warn!(
                    "Update of token {} failed, rolling back batch of {}: {}",
                    record.token_id(),
                    records.len(),
                    e
                );
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("Rollback failed: {}", rollback_err);
                }
                return Err(MigrateError::batch_write(mode, e));
            }
        }

        tx.commit()
            .await
            .map_err(|e| MigrateError::batch_write(mode, e))?;

        debug!("Committed {} {} updates", records.len(), mode);
        Ok(())
    }

    fn update_statement(&self, mode: WriteMode) -> &str {
        match mode {
            WriteMode::Encrypted => &self.statements.update_encrypted_tokens,
            WriteMode::PlainTextHash => &self.statements.update_plain_text_hashes,
        }
    }
}

fn bind_update<'q>(
    mode: WriteMode,
    sql: &'q str,
    record: &'q TokenRecord,
) -> Query<'q, Any, AnyArguments<'q>> {
    let query = sqlx::query(sql);
    match mode {
        WriteMode::Encrypted => query
            .bind(record.access_token.as_deref())
            .bind(record.refresh_token.as_deref())
            .bind(record.access_token_hash())
            .bind(record.refresh_token_hash())
            .bind(record.token_id()),
        WriteMode::PlainTextHash => query
            .bind(record.access_token_hash())
            .bind(record.refresh_token_hash())
            .bind(record.token_id()),
    }
}
